use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::FiscalDataConfig;
use crate::domain::ExchangeRateQuote;
use crate::ports::ExchangeRateClient;
use crate::utils::dates;

const RATES_OF_EXCHANGE_PATH: &str = "v1/accounting/od/rates_of_exchange";
const QUOTE_FIELDS: &str = "country_currency_desc,exchange_rate,record_date";
const NEWEST_FIRST: &str = "-record_date";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Quotes older than this, relative to the purchase date, are never used.
pub const LOOKBACK_MONTHS: u32 = 6;

#[derive(Error, Debug)]
pub enum FiscalDataError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Fiscal Data returned status {0}")]
    UnexpectedStatus(u16),
    #[error("Invalid response from Fiscal Data: {0}")]
    InvalidResponse(String),
}

/// Envelope returned by the rates-of-exchange endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesOfExchangeResponse {
    pub data: Vec<RateRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRecord {
    pub country_currency_desc: String,
    /// Decimal encoded as a string, e.g. `"1.363"`.
    pub exchange_rate: String,
    pub record_date: String,
}

impl RateRecord {
    fn into_quote(self) -> Result<ExchangeRateQuote, FiscalDataError> {
        let rate = BigDecimal::from_str(self.exchange_rate.trim()).map_err(|e| {
            FiscalDataError::InvalidResponse(format!(
                "exchange_rate {:?} is not a decimal: {}",
                self.exchange_rate, e
            ))
        })?;
        let quote_date = dates::parse_date(&self.record_date).map_err(|e| {
            FiscalDataError::InvalidResponse(format!(
                "record_date {:?} is not a date: {}",
                self.record_date, e
            ))
        })?;

        Ok(ExchangeRateQuote {
            currency_label: self.country_currency_desc,
            rate,
            quote_date,
        })
    }
}

/// HTTP client for the US Treasury Fiscal Data rates-of-exchange series
#[derive(Clone)]
pub struct FiscalDataClient {
    client: Client,
    base_url: String,
}

impl FiscalDataClient {
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        FiscalDataClient { client, base_url }
    }

    pub fn from_config(config: &FiscalDataConfig) -> Self {
        Self::with_timeout(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn rates_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            RATES_OF_EXCHANGE_PATH
        )
    }

    /// Fetches every quote for `currency_label` in the lookback window ending at
    /// `reference_date`, newest first.
    pub async fn get_rates(
        &self,
        currency_label: &str,
        reference_date: NaiveDate,
    ) -> Result<RatesOfExchangeResponse, FiscalDataError> {
        let window_start = dates::months_before(reference_date, LOOKBACK_MONTHS);
        let filter = format!(
            "country_currency_desc:eq:{},record_date:lte:{},record_date:gte:{}",
            currency_label,
            dates::format_date(reference_date),
            dates::format_date(window_start),
        );

        let response = self
            .client
            .get(self.rates_url())
            .query(&[
                ("fields", QUOTE_FIELDS),
                ("filter", filter.as_str()),
                ("sort", NEWEST_FIRST),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FiscalDataError::UnexpectedStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str::<RatesOfExchangeResponse>(&body)
            .map_err(|e| FiscalDataError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ExchangeRateClient for FiscalDataClient {
    async fn quote(
        &self,
        currency_label: &str,
        reference_date: NaiveDate,
    ) -> Result<Option<ExchangeRateQuote>, FiscalDataError> {
        let rates = self.get_rates(currency_label, reference_date).await?;

        match rates.data.into_iter().next() {
            Some(record) => record.into_quote().map(Some),
            None => {
                tracing::debug!(
                    currency = currency_label,
                    %reference_date,
                    "no exchange rate inside lookback window"
                );
                Ok(None)
            }
        }
    }
}
