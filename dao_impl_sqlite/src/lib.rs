use std::sync::Arc;

use async_trait::async_trait;
use dao::{BasicDao, DaoError, Transaction, TransactionDao};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

pub mod absence;
pub mod holiday;
pub mod overtime_correction;
pub mod overtime_month;
pub mod overtime_transaction;
pub mod time_entry;
pub mod user;
pub mod vacation_balance;

mod row;

pub use row::SCHEMA_SQL;

pub trait ResultDbErrorExt<T, E> {
    fn map_db_error(self) -> Result<T, DaoError>;
}
impl<T, E: std::error::Error + Send + Sync + 'static> ResultDbErrorExt<T, E> for Result<T, E> {
    fn map_db_error(self) -> Result<T, DaoError> {
        self.map_err(|err| DaoError::DatabaseQueryError(Box::new(err)))
    }
}

/// Creates the schema when missing.  All statements are idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), DaoError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_db_error()?;
    Ok(())
}

/// The engine refuses to serve without foreign-key enforcement and WAL
/// journaling; the derived tables depend on both.
pub async fn verify_integrity(pool: &SqlitePool) -> Result<(), DaoError> {
    let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await
        .map_db_error()?;
    if foreign_keys != 1 {
        return Err(DaoError::IntegrityCheckFailed(
            "foreign key enforcement is off".into(),
        ));
    }
    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(pool)
        .await
        .map_db_error()?;
    if !journal_mode.eq_ignore_ascii_case("wal") && !journal_mode.eq_ignore_ascii_case("memory") {
        return Err(DaoError::IntegrityCheckFailed(
            format!("journal mode is {journal_mode}, not WAL").into(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct TransactionImpl {
    tx: Arc<Mutex<sqlx::Transaction<'static, sqlx::Sqlite>>>,
}

impl Transaction for TransactionImpl {}

impl TransactionImpl {
    pub(crate) async fn lock(
        &self,
    ) -> tokio::sync::MutexGuard<'_, sqlx::Transaction<'static, sqlx::Sqlite>> {
        self.tx.lock().await
    }
}

pub struct TransactionDaoImpl {
    pool: Arc<SqlitePool>,
}
impl TransactionDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}
#[async_trait]
impl TransactionDao for TransactionDaoImpl {
    type Transaction = TransactionImpl;

    async fn new_transaction(&self) -> Result<Self::Transaction, DaoError> {
        let tx = self.pool.begin().await.map_db_error()?;
        Ok(TransactionImpl {
            tx: Arc::new(tx.into()),
        })
    }

    async fn use_transaction(
        &self,
        tx: Option<Self::Transaction>,
    ) -> Result<Self::Transaction, DaoError> {
        match tx {
            Some(tx) => Ok(tx),
            None => self.new_transaction().await,
        }
    }

    async fn commit(&self, transaction: Self::Transaction) -> Result<(), DaoError> {
        if let Some(tx) = Arc::into_inner(transaction.tx) {
            tx.into_inner().commit().await.map_db_error()?;
        }
        Ok(())
    }
}

pub struct BasicDaoImpl {
    pool: Arc<SqlitePool>,
}
impl BasicDaoImpl {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasicDao for BasicDaoImpl {
    async fn clear_all(&self) -> Result<(), DaoError> {
        sqlx::raw_sql(
            r"
                DELETE FROM overtime_transaction;
                DELETE FROM overtime_month;
                DELETE FROM vacation_balance;
                DELETE FROM overtime_correction;
                DELETE FROM absence_request;
                DELETE FROM time_entry;
                DELETE FROM holiday;
                DELETE FROM user;
                ",
        )
        .execute(self.pool.as_ref())
        .await
        .map_db_error()?;
        Ok(())
    }
}
