//! Transaction domain entities.
//! Framework-agnostic representation of a purchase and its enriched read-side view.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::utils::dates;
use crate::utils::round2;

/// Descriptions are cut to this many characters before they are persisted.
pub const DESCRIPTION_MAX_LEN: usize = 50;

/// Lifetime of a cached [`TransactionView`].
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Purchase as supplied by a caller, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewTransaction {
    #[schema(value_type = String, example = "23.70")]
    pub purchase_amount: BigDecimal,
    pub description: String,
    /// `YYYY-MM-DD`; the current UTC date when absent
    #[serde(default)]
    #[schema(example = "2023-10-15")]
    pub purchase_date: Option<String>,
}

/// Write-side purchase record. `id` is assigned by the store and is `None`
/// until the record has been inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub purchase_amount: BigDecimal,
    pub description: String,
    pub purchase_date: NaiveDate,
    pub created_at: i64,
}

impl NewTransaction {
    /// Derives `purchase_date` and `created_at`.
    ///
    /// Without a purchase date both come from `now`; otherwise `created_at` is
    /// midnight UTC of the given date.
    pub fn normalize(self, now: DateTime<Utc>) -> Result<Transaction, chrono::ParseError> {
        let (purchase_date, created_at) = match self.purchase_date.as_deref() {
            None | Some("") => (dates::utc_date(now), now.timestamp()),
            Some(raw) => {
                let date = dates::parse_date(raw)?;
                (date, dates::midnight_epoch(date))
            }
        };

        Ok(Transaction {
            id: None,
            purchase_amount: self.purchase_amount,
            description: self.description,
            purchase_date,
            created_at,
        })
    }
}

/// Read-side projection of a stored transaction, converted into a target currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: String,
    pub purchase_amount: BigDecimal,
    pub description: String,
    pub purchase_date: NaiveDate,
    pub created_at: i64,
    pub exchange_rate: BigDecimal,
    pub converted_purchase_amount: BigDecimal,
}

impl TransactionView {
    /// Applies `quote` to a stored record. The converted amount is computed from
    /// the rounded purchase amount and the unrounded rate, then rounded.
    pub fn enrich(tx: Transaction, quote: &ExchangeRateQuote) -> Self {
        let purchase_amount = round2(&tx.purchase_amount);
        let converted_purchase_amount = round2(&(&purchase_amount * &quote.rate));

        Self {
            id: tx.id.unwrap_or_default(),
            purchase_amount,
            description: tx.description,
            purchase_date: tx.purchase_date,
            created_at: tx.created_at,
            exchange_rate: round2(&quote.rate),
            converted_purchase_amount,
        }
    }
}

/// Most recent provider rate at or before a reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateQuote {
    pub currency_label: String,
    pub rate: BigDecimal,
    pub quote_date: NaiveDate,
}

/// Cache key of a view: `{id}:transaction:{currency}`.
pub fn cache_key(id: &str, currency: &str) -> String {
    format!("{}:transaction:{}", id, currency)
}

/// Cuts a description to [`DESCRIPTION_MAX_LEN`] characters; shorter input is returned as is.
pub fn truncate_description(description: &str) -> String {
    match description.char_indices().nth(DESCRIPTION_MAX_LEN) {
        Some((byte_idx, _)) => description[..byte_idx].to_string(),
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn new_tx(purchase_date: Option<&str>) -> NewTransaction {
        NewTransaction {
            purchase_amount: dec("23.70"),
            description: "Test".to_string(),
            purchase_date: purchase_date.map(str::to_string),
        }
    }

    #[test]
    fn normalize_with_date_uses_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let tx = new_tx(Some("2023-10-15")).normalize(now).unwrap();

        assert_eq!(tx.purchase_date, NaiveDate::from_ymd_opt(2023, 10, 15).unwrap());
        assert_eq!(tx.created_at, 1_697_328_000);
        assert!(tx.id.is_none());
    }

    #[test]
    fn normalize_without_date_uses_now() {
        let now = Utc.with_ymd_and_hms(2023, 10, 15, 18, 30, 5).unwrap();
        let tx = new_tx(None).normalize(now).unwrap();

        assert_eq!(tx.purchase_date, NaiveDate::from_ymd_opt(2023, 10, 15).unwrap());
        assert_eq!(tx.created_at, now.timestamp());
        assert_eq!(dates::utc_date(Utc.timestamp_opt(tx.created_at, 0).unwrap()), tx.purchase_date);
    }

    #[test]
    fn normalize_treats_empty_date_as_absent() {
        let now = Utc.with_ymd_and_hms(2023, 10, 15, 0, 0, 1).unwrap();
        let tx = new_tx(Some("")).normalize(now).unwrap();
        assert_eq!(tx.created_at, now.timestamp());
    }

    #[test]
    fn normalize_rejects_malformed_date() {
        assert!(new_tx(Some("2023/10/15")).normalize(Utc::now()).is_err());
    }

    #[test]
    fn truncates_long_descriptions_to_exactly_fifty() {
        let long = "x".repeat(80);
        assert_eq!(truncate_description(&long).chars().count(), DESCRIPTION_MAX_LEN);

        let exact = "y".repeat(DESCRIPTION_MAX_LEN);
        assert_eq!(truncate_description(&exact), exact);
        assert_eq!(truncate_description("short"), "short");
    }

    #[test]
    fn truncation_never_splits_characters() {
        let accented = "é".repeat(60);
        let cut = truncate_description(&accented);
        assert_eq!(cut.chars().count(), DESCRIPTION_MAX_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn enrich_rounds_every_monetary_field() {
        let tx = Transaction {
            id: Some("abc".to_string()),
            purchase_amount: dec("23.7049"),
            description: "Test".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
            created_at: 1_697_328_000,
        };
        let quote = ExchangeRateQuote {
            currency_label: "Canada-Dollar".to_string(),
            rate: dec("1.348"),
            quote_date: NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
        };

        let view = TransactionView::enrich(tx, &quote);

        assert_eq!(view.id, "abc");
        assert_eq!(view.purchase_amount, dec("23.70"));
        assert_eq!(view.exchange_rate, dec("1.35"));
        // 23.70 * 1.348 = 31.9476
        assert_eq!(view.converted_purchase_amount, dec("31.95"));
    }

    #[test]
    fn cache_key_format() {
        assert_eq!(cache_key("id-1", "Canada-Dollar"), "id-1:transaction:Canada-Dollar");
    }

    #[test]
    fn view_survives_json_round_trip() {
        let view = TransactionView {
            id: "abc".to_string(),
            purchase_amount: dec("23.70"),
            description: "Test".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
            created_at: 1_697_328_000,
            exchange_rate: dec("1.35"),
            converted_purchase_amount: dec("32.00"),
        };
        let json = serde_json::to_string(&view).unwrap();
        let back: TransactionView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
