use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub mod absence;
pub mod holiday;
pub mod overtime_correction;
pub mod overtime_month;
pub mod overtime_transaction;
pub mod time_entry;
pub mod user;
pub mod vacation_balance;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Enum value not found: {0}")]
    EnumValueNotFound(Arc<str>),

    #[error("Invalid day of week: {0}")]
    InvalidDayOfWeek(u8),

    #[error("Invalid uuid: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Cannot parse persisted date: {0}")]
    DateParseError(#[from] time::error::Parse),

    #[error("Cannot format date: {0}")]
    DateFormatError(#[from] time::error::Format),

    #[error("Invalid month key: {0}")]
    InvalidMonthKey(Arc<str>),

    #[error("Integrity check failed: {0}")]
    IntegrityCheckFailed(Arc<str>),
}

/// Handle to a running store transaction.  Cloning hands the same
/// underlying transaction to another DAO call.
pub trait Transaction: Clone + Debug + Send + Sync + 'static {}

/// Transaction stand-in for mockall based unit tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockTransaction;
impl Transaction for MockTransaction {}

#[automock(type Transaction = MockTransaction;)]
#[async_trait]
pub trait TransactionDao {
    type Transaction: Transaction;

    async fn new_transaction(&self) -> Result<Self::Transaction, DaoError>;
    async fn use_transaction(
        &self,
        tx: Option<Self::Transaction>,
    ) -> Result<Self::Transaction, DaoError>;
    async fn commit(&self, tx: Self::Transaction) -> Result<(), DaoError>;
}

/// Test support: wipe all derived and source rows.
#[automock]
#[async_trait]
pub trait BasicDao {
    async fn clear_all(&self) -> Result<(), DaoError>;
}
