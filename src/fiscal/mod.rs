pub mod client;

pub use client::{FiscalDataClient, FiscalDataError, RateRecord, RatesOfExchangeResponse};
