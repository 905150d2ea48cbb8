use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    overtime_transaction::{
        OvertimeTransactionDao, OvertimeTransactionEntity, TransactionTypeEntity,
    },
    DaoError,
};
use sqlx::{FromRow, Row};
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

use crate::row::{format_date, format_datetime, parse_date, parse_datetime, parse_uuid, uuid_blob};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT id, user_id, date, transaction_type, hours,
    balance_before, balance_after, description, reference_type, reference_id, created
    FROM overtime_transaction";

#[derive(FromRow)]
struct OvertimeTransactionDb {
    id: i64,
    user_id: Vec<u8>,
    date: String,
    transaction_type: String,
    hours: f64,
    balance_before: f64,
    balance_after: f64,
    description: String,
    reference_type: Option<String>,
    reference_id: Option<Vec<u8>>,
    created: String,
}

impl TryFrom<&OvertimeTransactionDb> for OvertimeTransactionEntity {
    type Error = DaoError;

    fn try_from(row: &OvertimeTransactionDb) -> Result<Self, DaoError> {
        Ok(Self {
            id: row.id,
            user_id: parse_uuid(&row.user_id)?,
            date: parse_date(&row.date)?,
            transaction_type: match row.transaction_type.as_str() {
                "earned" => TransactionTypeEntity::Earned,
                "vacation_credit" => TransactionTypeEntity::VacationCredit,
                "sick_credit" => TransactionTypeEntity::SickCredit,
                "overtime_comp_credit" => TransactionTypeEntity::OvertimeCompCredit,
                "unpaid_adjustment" => TransactionTypeEntity::UnpaidAdjustment,
                "correction" => TransactionTypeEntity::Correction,
                "compensation" => TransactionTypeEntity::Compensation,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            hours: row.hours as f32,
            balance_before: row.balance_before as f32,
            balance_after: row.balance_after as f32,
            description: row.description.as_str().into(),
            reference_type: row.reference_type.as_deref().map(Into::into),
            reference_id: row.reference_id.as_deref().map(parse_uuid).transpose()?,
            created: parse_datetime(&row.created)?,
        })
    }
}

fn transaction_type_text(transaction_type: &TransactionTypeEntity) -> &'static str {
    match transaction_type {
        TransactionTypeEntity::Earned => "earned",
        TransactionTypeEntity::VacationCredit => "vacation_credit",
        TransactionTypeEntity::SickCredit => "sick_credit",
        TransactionTypeEntity::OvertimeCompCredit => "overtime_comp_credit",
        TransactionTypeEntity::UnpaidAdjustment => "unpaid_adjustment",
        TransactionTypeEntity::Correction => "correction",
        TransactionTypeEntity::Compensation => "compensation",
    }
}

pub struct OvertimeTransactionDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl OvertimeTransactionDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OvertimeTransactionDao for OvertimeTransactionDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeTransactionEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeTransactionDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date, id"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(from)?)
        .bind(format_date(to)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(OvertimeTransactionEntity::try_from)
        .collect()
    }

    async fn find_latest_on_or_before(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeTransactionDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date <= ? ORDER BY date DESC, id DESC LIMIT 1"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(date)?)
        .fetch_optional(&mut **tx)
        .await
        .map_db_error()?
        .as_ref()
        .map(OvertimeTransactionEntity::try_from)
        .transpose()
    }

    async fn find_latest_before(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeTransactionDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date < ? ORDER BY date DESC, id DESC LIMIT 1"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(date)?)
        .fetch_optional(&mut **tx)
        .await
        .map_db_error()?
        .as_ref()
        .map(OvertimeTransactionEntity::try_from)
        .transpose()
    }

    async fn find_latest(
        &self,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeTransactionDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT 1"
        ))
        .bind(uuid_blob(user_id))
        .fetch_optional(&mut **tx)
        .await
        .map_db_error()?
        .as_ref()
        .map(OvertimeTransactionEntity::try_from)
        .transpose()
    }

    async fn delete_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query("DELETE FROM overtime_transaction WHERE user_id = ? AND date >= ? AND date <= ?")
            .bind(uuid_blob(user_id))
            .bind(format_date(month.first_day())?)
            .bind(format_date(month.last_day())?)
            .execute(&mut **tx)
            .await
            .map_db_error()?;
        Ok(())
    }

    async fn create(
        &self,
        entity: &OvertimeTransactionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<i64, DaoError> {
        let mut tx = tx.lock().await;
        let row = sqlx::query(
            r"INSERT INTO overtime_transaction (user_id, date, transaction_type, hours,
                balance_before, balance_after, description, reference_type, reference_id,
                created, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
              RETURNING id",
        )
        .bind(uuid_blob(entity.user_id))
        .bind(format_date(entity.date)?)
        .bind(transaction_type_text(&entity.transaction_type))
        .bind(entity.hours as f64)
        .bind(entity.balance_before as f64)
        .bind(entity.balance_after as f64)
        .bind(entity.description.as_ref())
        .bind(entity.reference_type.as_deref())
        .bind(entity.reference_id.map(uuid_blob))
        .bind(format_datetime(entity.created)?)
        .bind(process)
        .fetch_one(&mut **tx)
        .await
        .map_db_error()?;
        row.try_get::<i64, _>("id").map_db_error()
    }
}
