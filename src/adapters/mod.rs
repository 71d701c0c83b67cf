//! Adapters implementing the traits in `crate::ports`.

pub mod memory;
pub mod postgres_transaction_store;
pub mod redis_cache;

pub use memory::{InMemoryTransactionStore, InMemoryViewCache};
pub use postgres_transaction_store::PostgresTransactionStore;
pub use redis_cache::RedisViewCache;
