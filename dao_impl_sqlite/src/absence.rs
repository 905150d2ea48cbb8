use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    absence::{AbsenceDao, AbsenceEntity, AbsenceStatusEntity, AbsenceTypeEntity},
    DaoError,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::row::{
    format_date, format_datetime, format_opt_datetime, parse_date, parse_datetime,
    parse_opt_datetime, parse_uuid, uuid_blob,
};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT id, user_id, absence_type, start_date, end_date, days,
    status, approved_by, approved_at, reason, created, deleted, update_version
    FROM absence_request";

#[derive(FromRow)]
struct AbsenceDb {
    id: Vec<u8>,
    user_id: Vec<u8>,
    absence_type: String,
    start_date: String,
    end_date: String,
    days: f64,
    status: String,
    approved_by: Option<Vec<u8>>,
    approved_at: Option<String>,
    reason: Option<String>,
    created: String,
    deleted: Option<String>,
    update_version: Vec<u8>,
}

impl TryFrom<&AbsenceDb> for AbsenceEntity {
    type Error = DaoError;

    fn try_from(absence: &AbsenceDb) -> Result<Self, DaoError> {
        Ok(Self {
            id: parse_uuid(&absence.id)?,
            user_id: parse_uuid(&absence.user_id)?,
            absence_type: match absence.absence_type.as_str() {
                "vacation" => AbsenceTypeEntity::Vacation,
                "sick" => AbsenceTypeEntity::Sick,
                "unpaid" => AbsenceTypeEntity::Unpaid,
                "overtime_comp" => AbsenceTypeEntity::OvertimeComp,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            start_date: parse_date(&absence.start_date)?,
            end_date: parse_date(&absence.end_date)?,
            days: absence.days as f32,
            status: match absence.status.as_str() {
                "pending" => AbsenceStatusEntity::Pending,
                "approved" => AbsenceStatusEntity::Approved,
                "rejected" => AbsenceStatusEntity::Rejected,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            approved_by: absence
                .approved_by
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            approved_at: parse_opt_datetime(absence.approved_at.as_deref())?,
            reason: absence.reason.as_deref().map(Into::into),
            created: parse_datetime(&absence.created)?,
            deleted: parse_opt_datetime(absence.deleted.as_deref())?,
            version: parse_uuid(&absence.update_version)?,
        })
    }
}

fn absence_type_text(absence_type: &AbsenceTypeEntity) -> &'static str {
    match absence_type {
        AbsenceTypeEntity::Vacation => "vacation",
        AbsenceTypeEntity::Sick => "sick",
        AbsenceTypeEntity::Unpaid => "unpaid",
        AbsenceTypeEntity::OvertimeComp => "overtime_comp",
    }
}

fn status_text(status: &AbsenceStatusEntity) -> &'static str {
    match status {
        AbsenceStatusEntity::Pending => "pending",
        AbsenceStatusEntity::Approved => "approved",
        AbsenceStatusEntity::Rejected => "rejected",
    }
}

pub struct AbsenceDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl AbsenceDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AbsenceDao for AbsenceDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<AbsenceEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, AbsenceDb>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(uuid_blob(id))
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(AbsenceEntity::try_from)
            .transpose()
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, AbsenceDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY start_date"
        ))
        .bind(uuid_blob(user_id))
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(AbsenceEntity::try_from)
        .collect()
    }

    async fn find_overlapping(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, AbsenceDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status != 'rejected'
                AND start_date <= ? AND end_date >= ? ORDER BY start_date"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(to)?)
        .bind(format_date(from)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(AbsenceEntity::try_from)
        .collect()
    }

    async fn find_approved_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, AbsenceDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status = 'approved'
                AND start_date <= ? AND end_date >= ? ORDER BY start_date"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(to)?)
        .bind(format_date(from)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(AbsenceEntity::try_from)
        .collect()
    }

    async fn create(
        &self,
        entity: &AbsenceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO absence_request (id, user_id, absence_type, start_date, end_date,
                days, status, approved_by, approved_at, reason, created, deleted,
                update_version, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_blob(entity.id))
        .bind(uuid_blob(entity.user_id))
        .bind(absence_type_text(&entity.absence_type))
        .bind(format_date(entity.start_date)?)
        .bind(format_date(entity.end_date)?)
        .bind(entity.days as f64)
        .bind(status_text(&entity.status))
        .bind(entity.approved_by.map(uuid_blob))
        .bind(format_opt_datetime(entity.approved_at)?)
        .bind(entity.reason.as_deref())
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
        entity: &AbsenceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"UPDATE absence_request SET absence_type = ?, start_date = ?, end_date = ?,
                days = ?, status = ?, approved_by = ?, approved_at = ?, reason = ?,
                deleted = ?, update_version = ?, update_process = ?
              WHERE id = ?",
        )
        .bind(absence_type_text(&entity.absence_type))
        .bind(format_date(entity.start_date)?)
        .bind(format_date(entity.end_date)?)
        .bind(entity.days as f64)
        .bind(status_text(&entity.status))
        .bind(entity.approved_by.map(uuid_blob))
        .bind(format_opt_datetime(entity.approved_at)?)
        .bind(entity.reason.as_deref())
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
