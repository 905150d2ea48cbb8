use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    overtime_correction::{CorrectionTypeEntity, OvertimeCorrectionDao, OvertimeCorrectionEntity},
    DaoError,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::row::{
    format_date, format_datetime, format_opt_datetime, parse_date, parse_datetime,
    parse_opt_datetime, parse_uuid, uuid_blob,
};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT id, user_id, date, hours, reason, correction_type,
    created_by, created, deleted, update_version FROM overtime_correction";

#[derive(FromRow)]
struct OvertimeCorrectionDb {
    id: Vec<u8>,
    user_id: Vec<u8>,
    date: String,
    hours: f64,
    reason: String,
    correction_type: String,
    created_by: Vec<u8>,
    created: String,
    deleted: Option<String>,
    update_version: Vec<u8>,
}

impl TryFrom<&OvertimeCorrectionDb> for OvertimeCorrectionEntity {
    type Error = DaoError;

    fn try_from(correction: &OvertimeCorrectionDb) -> Result<Self, DaoError> {
        Ok(Self {
            id: parse_uuid(&correction.id)?,
            user_id: parse_uuid(&correction.user_id)?,
            date: parse_date(&correction.date)?,
            hours: correction.hours as f32,
            reason: correction.reason.as_str().into(),
            correction_type: match correction.correction_type.as_str() {
                "system_error" => CorrectionTypeEntity::SystemError,
                "absence_credit" => CorrectionTypeEntity::AbsenceCredit,
                "migration" => CorrectionTypeEntity::Migration,
                "manual" => CorrectionTypeEntity::Manual,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            created_by: parse_uuid(&correction.created_by)?,
            created: parse_datetime(&correction.created)?,
            deleted: parse_opt_datetime(correction.deleted.as_deref())?,
            version: parse_uuid(&correction.update_version)?,
        })
    }
}

fn correction_type_text(correction_type: &CorrectionTypeEntity) -> &'static str {
    match correction_type {
        CorrectionTypeEntity::SystemError => "system_error",
        CorrectionTypeEntity::AbsenceCredit => "absence_credit",
        CorrectionTypeEntity::Migration => "migration",
        CorrectionTypeEntity::Manual => "manual",
    }
}

pub struct OvertimeCorrectionDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl OvertimeCorrectionDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OvertimeCorrectionDao for OvertimeCorrectionDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeCorrectionEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeCorrectionDb>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(uuid_blob(id))
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(OvertimeCorrectionEntity::try_from)
            .transpose()
    }

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeCorrectionEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, OvertimeCorrectionDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date, id"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(from)?)
        .bind(format_date(to)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(OvertimeCorrectionEntity::try_from)
        .collect()
    }

    async fn create(
        &self,
        entity: &OvertimeCorrectionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO overtime_correction (id, user_id, date, hours, reason,
                correction_type, created_by, created, deleted, update_version, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_blob(entity.id))
        .bind(uuid_blob(entity.user_id))
        .bind(format_date(entity.date)?)
        .bind(entity.hours as f64)
        .bind(entity.reason.as_ref())
        .bind(correction_type_text(&entity.correction_type))
        .bind(uuid_blob(entity.created_by))
        .bind(format_datetime(entity.created)?)
        .bind(format_opt_datetime(entity.deleted)?)
        .bind(uuid_blob(entity.version))
        .bind(process)
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }

    async fn update(
        &self,
        entity: &OvertimeCorrectionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"UPDATE overtime_correction SET deleted = ?, update_version = ?, update_process = ?
              WHERE id = ?",
        )
        .bind(format_opt_datetime(entity.deleted)?)
        .bind(uuid_blob(entity.version))
        .bind(process)
        .bind(uuid_blob(entity.id))
        .execute(&mut **tx)
        .await
        .map_db_error()?;
        Ok(())
    }
}
