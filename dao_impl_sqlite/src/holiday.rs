use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    holiday::{HolidayDao, HolidayEntity},
    DaoError,
};
use sqlx::FromRow;

use crate::row::{format_date, parse_date};
use crate::{ResultDbErrorExt, TransactionImpl};

#[derive(FromRow)]
struct HolidayDb {
    date: String,
    name: String,
    federal: i64,
}

impl TryFrom<&HolidayDb> for HolidayEntity {
    type Error = DaoError;

    fn try_from(holiday: &HolidayDb) -> Result<Self, DaoError> {
        Ok(Self {
            date: parse_date(&holiday.date)?,
            name: holiday.name.as_str().into(),
            federal: holiday.federal != 0,
        })
    }
}

pub struct HolidayDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl HolidayDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayDao for HolidayDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_date(
        &self,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<HolidayEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, HolidayDb>("SELECT date, name, federal FROM holiday WHERE date = ?")
            .bind(format_date(date)?)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(HolidayEntity::try_from)
            .transpose()
    }

    async fn find_in_range(
        &self,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[HolidayEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, HolidayDb>(
            "SELECT date, name, federal FROM holiday WHERE date >= ? AND date <= ? ORDER BY date",
        )
        .bind(format_date(from)?)
        .bind(format_date(to)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(HolidayEntity::try_from)
        .collect()
    }

    async fn upsert(
        &self,
        entity: &HolidayEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO holiday (date, name, federal, update_process) VALUES (?, ?, ?, ?)
              ON CONFLICT (date) DO UPDATE
                  SET name = excluded.name, federal = excluded.federal,
                      update_process = excluded.update_process",
        )
        .bind(format_date(entity.date)?)
        .bind(entity.name.as_ref())
        .bind(entity.federal as i64)
        .bind(process)
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn delete(
        &self,
        date: time::Date,
        _process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query("DELETE FROM holiday WHERE date = ?")
            .bind(format_date(date)?)
            .execute(&mut **tx)
            .await
            .map_db_error()?;
        Ok(())
    }
}
