use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    overtime_month::{OvertimeMonthDao, OvertimeMonthEntity},
    DaoError,
};
use sqlx::FromRow;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

use crate::row::{parse_uuid, uuid_blob};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT user_id, month, target_hours, actual_hours, overtime,
    carryover_from_previous_year FROM overtime_month";

#[derive(FromRow)]
struct OvertimeMonthDb {
    user_id: Vec<u8>,
    month: String,
    target_hours: f64,
    actual_hours: f64,
    overtime: f64,
    carryover_from_previous_year: f64,
}

impl TryFrom<&OvertimeMonthDb> for OvertimeMonthEntity {
    type Error = DaoError;

    fn try_from(row: &OvertimeMonthDb) -> Result<Self, DaoError> {
        Ok(Self {
            user_id: parse_uuid(&row.user_id)?,
            month: KontoMonth::parse(&row.month)
                .map_err(|_| DaoError::InvalidMonthKey(row.month.as_str().into()))?,
            target_hours: row.target_hours as f32,
            actual_hours: row.actual_hours as f32,
            overtime: row.overtime as f32,
            carryover_from_previous_year: row.carryover_from_previous_year as f32,
        })
    }
}

pub struct OvertimeMonthDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl OvertimeMonthDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OvertimeMonthDao for OvertimeMonthDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_user_and_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeMonthEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeMonthDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND month = ?"
        ))
        .bind(uuid_blob(user_id))
        .bind(month.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_db_error()?
        .as_ref()
        .map(OvertimeMonthEntity::try_from)
        .transpose()
    }

    async fn find_by_user_and_year(
        &self,
        user_id: Uuid,
        year: i32,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeMonthEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeMonthDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND month LIKE ? ORDER BY month"
        ))
        .bind(uuid_blob(user_id))
        .bind(format!("{year:04}-%"))
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(OvertimeMonthEntity::try_from)
        .collect()
    }

    async fn upsert(
        &self,
        entity: &OvertimeMonthEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO overtime_month (user_id, month, target_hours, actual_hours,
                overtime, carryover_from_previous_year, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT (user_id, month) DO UPDATE
                  SET target_hours = excluded.target_hours,
                      actual_hours = excluded.actual_hours,
                      overtime = excluded.overtime,
                      update_process = excluded.update_process",
        )
        .bind(uuid_blob(entity.user_id))
        .bind(entity.month.to_string())
        .bind(entity.target_hours as f64)
        .bind(entity.actual_hours as f64)
        .bind(entity.overtime as f64)
        .bind(entity.carryover_from_previous_year as f64)
        .bind(process)
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn set_carryover(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        carryover: f32,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO overtime_month (user_id, month, target_hours, actual_hours,
                overtime, carryover_from_previous_year, update_process)
              VALUES (?, ?, 0, 0, 0, ?, ?)
              ON CONFLICT (user_id, month) DO UPDATE
                  SET carryover_from_previous_year = excluded.carryover_from_previous_year,
                      update_process = excluded.update_process",
        )
        .bind(uuid_blob(user_id))
        .bind(month.to_string())
        .bind(carryover as f64)
        .bind(process)
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }
}
