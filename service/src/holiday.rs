use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use zeitkonto_utils::derive_from_reference;

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Debug, PartialEq)]
pub struct Holiday {
    pub date: time::Date,
    pub name: Arc<str>,
    pub federal: bool,
}

impl From<&dao::holiday::HolidayEntity> for Holiday {
    fn from(entity: &dao::holiday::HolidayEntity) -> Self {
        Self {
            date: entity.date,
            name: entity.name.clone(),
            federal: entity.federal,
        }
    }
}
derive_from_reference!(dao::holiday::HolidayEntity, Holiday);

impl From<&Holiday> for dao::holiday::HolidayEntity {
    fn from(holiday: &Holiday) -> Self {
        Self {
            date: holiday.date,
            name: holiday.name.clone(),
            federal: holiday.federal,
        }
    }
}

/// External holiday source.  Implementations may hit the network; the
/// engine treats every failure as non-fatal.
#[automock]
#[async_trait]
pub trait HolidayOracle {
    async fn load_year(&self, year: i32) -> Result<Arc<[Holiday]>, ServiceError>;
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait HolidayService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn get_by_year(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Holiday]>, ServiceError>;

    async fn get_in_range(
        &self,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Holiday]>, ServiceError>;

    async fn create(
        &self,
        holiday: &Holiday,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Holiday, ServiceError>;

    async fn delete(
        &self,
        date: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    /// Pulls the year from the oracle and upserts the result.  Oracle
    /// failures are logged and reported as zero loaded holidays.
    async fn load_year(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u32, ServiceError>;
}
