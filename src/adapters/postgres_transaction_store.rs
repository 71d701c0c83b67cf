//! Postgres implementation of TransactionStore.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{truncate_description, Transaction};
use crate::ports::{StoreError, StoreResult, TransactionStore};

const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (purchase_amount, description, purchase_date, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id
"#;

/// Postgres-backed transaction store.
#[derive(Clone)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn insert(&self, tx: &Transaction) -> StoreResult<String> {
        let id = sqlx::query_scalar::<_, Uuid>(INSERT_TRANSACTION)
            .bind(&tx.purchase_amount)
            .bind(truncate_description(&tx.description))
            .bind(tx.purchase_date)
            .bind(tx.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)?;

        Ok(id.to_string())
    }

    async fn insert_batch(&self, txs: &[Transaction]) -> StoreResult<Vec<String>> {
        let mut db_tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(txs.len());

        for tx in txs {
            let id = sqlx::query_scalar::<_, Uuid>(INSERT_TRANSACTION)
                .bind(&tx.purchase_amount)
                .bind(truncate_description(&tx.description))
                .bind(tx.purchase_date)
                .bind(tx.created_at)
                .fetch_one(&mut *db_tx)
                .await?;
            ids.push(id.to_string());
        }

        // Dropping db_tx on an early return rolls the batch back.
        db_tx.commit().await?;
        Ok(ids)
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<Transaction>> {
        let uuids = ids
            .iter()
            .map(|id| Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.clone())))
            .collect::<StoreResult<Vec<Uuid>>>()?;

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, purchase_amount, description, purchase_date, created_at
            FROM transactions
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    async fn get_by_date_range(&self, start: i64, end: i64) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, purchase_amount, description, purchase_date, created_at
            FROM transactions
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at, id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    purchase_amount: BigDecimal,
    description: String,
    purchase_date: NaiveDate,
    created_at: i64,
}

impl TransactionRow {
    fn into_domain(self) -> Transaction {
        Transaction {
            id: Some(self.id.to_string()),
            purchase_amount: self.purchase_amount,
            description: self.description,
            purchase_date: self.purchase_date,
            created_at: self.created_at,
        }
    }
}
