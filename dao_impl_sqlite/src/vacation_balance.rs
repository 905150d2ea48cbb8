use async_trait::async_trait;
use dao::{
    vacation_balance::{VacationBalanceDao, VacationBalanceEntity},
    DaoError,
};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

use crate::row::{parse_uuid, uuid_blob};
use crate::{ResultDbErrorExt, TransactionImpl};

#[derive(FromRow)]
struct VacationBalanceDb {
    user_id: Vec<u8>,
    year: i64,
    entitlement: f64,
    carryover: f64,
}

impl TryFrom<&VacationBalanceDb> for VacationBalanceEntity {
    type Error = DaoError;

    fn try_from(row: &VacationBalanceDb) -> Result<Self, DaoError> {
        Ok(Self {
            user_id: parse_uuid(&row.user_id)?,
            year: row.year as i32,
            entitlement: row.entitlement as f32,
            carryover: row.carryover as f32,
        })
    }
}

pub struct VacationBalanceDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl VacationBalanceDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VacationBalanceDao for VacationBalanceDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_user_and_year(
        &self,
        user_id: Uuid,
        year: i32,
        tx: Self::Transaction,
    ) -> Result<Option<VacationBalanceEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, VacationBalanceDb>(
            "SELECT user_id, year, entitlement, carryover FROM vacation_balance
                WHERE user_id = ? AND year = ?",
        )
        .bind(uuid_blob(user_id))
        .bind(year as i64)
        .fetch_optional(&mut **tx)
        .await
        .map_db_error()?
        .as_ref()
        .map(VacationBalanceEntity::try_from)
        .transpose()
    }

    async fn upsert(
        &self,
        entity: &VacationBalanceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO vacation_balance (user_id, year, entitlement, carryover, update_process)
              VALUES (?, ?, ?, ?, ?)
              ON CONFLICT (user_id, year) DO UPDATE
                  SET entitlement = excluded.entitlement,
                      carryover = excluded.carryover,
                      update_process = excluded.update_process",
        )
        .bind(uuid_blob(entity.user_id))
        .bind(entity.year as i64)
        .bind(entity.entitlement as f64)
        .bind(entity.carryover as f64)
        .bind(process)
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }
}
