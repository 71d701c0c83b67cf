pub mod transaction;

pub use transaction::{
    cache_key, truncate_description, ExchangeRateQuote, NewTransaction, Transaction,
    TransactionView, CACHE_TTL, DESCRIPTION_MAX_LEN,
};
