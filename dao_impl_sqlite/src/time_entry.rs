use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    time_entry::{TimeEntryDao, TimeEntryEntity, WorkLocationEntity},
    DaoError,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::row::{
    format_date, format_datetime, format_opt_datetime, format_time, parse_date, parse_datetime,
    parse_opt_datetime, parse_time, parse_uuid, uuid_blob,
};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT id, user_id, date, hours, break_minutes, start_time,
    end_time, location, created, deleted, update_version FROM time_entry";

#[derive(FromRow)]
struct TimeEntryDb {
    id: Vec<u8>,
    user_id: Vec<u8>,
    date: String,
    hours: f64,
    break_minutes: i64,
    start_time: Option<String>,
    end_time: Option<String>,
    location: String,
    created: String,
    deleted: Option<String>,
    update_version: Vec<u8>,
}

impl TryFrom<&TimeEntryDb> for TimeEntryEntity {
    type Error = DaoError;

    fn try_from(entry: &TimeEntryDb) -> Result<Self, DaoError> {
        Ok(Self {
            id: parse_uuid(&entry.id)?,
            user_id: parse_uuid(&entry.user_id)?,
            date: parse_date(&entry.date)?,
            hours: entry.hours as f32,
            break_minutes: entry.break_minutes as u32,
            start_time: entry.start_time.as_deref().map(parse_time).transpose()?,
            end_time: entry.end_time.as_deref().map(parse_time).transpose()?,
            location: match entry.location.as_str() {
                "office" => WorkLocationEntity::Office,
                "homeoffice" => WorkLocationEntity::HomeOffice,
                "field" => WorkLocationEntity::Field,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            created: parse_datetime(&entry.created)?,
            deleted: parse_opt_datetime(entry.deleted.as_deref())?,
            version: parse_uuid(&entry.update_version)?,
        })
    }
}

fn location_text(location: &WorkLocationEntity) -> &'static str {
    match location {
        WorkLocationEntity::Office => "office",
        WorkLocationEntity::HomeOffice => "homeoffice",
        WorkLocationEntity::Field => "field",
    }
}

pub struct TimeEntryDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl TimeEntryDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimeEntryDao for TimeEntryDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<TimeEntryEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, TimeEntryDb>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(uuid_blob(id))
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(TimeEntryEntity::try_from)
            .transpose()
    }

    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[TimeEntryEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, TimeEntryDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date = ? ORDER BY date, id"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(date)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(TimeEntryEntity::try_from)
        .collect()
    }

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[TimeEntryEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, TimeEntryDb>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date, id"
        ))
        .bind(uuid_blob(user_id))
        .bind(format_date(from)?)
        .bind(format_date(to)?)
        .fetch_all(&mut **tx)
        .await
        .map_db_error()?
        .iter()
        .map(TimeEntryEntity::try_from)
        .collect()
    }

    async fn create(
        &self,
        entity: &TimeEntryEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO time_entry (id, user_id, date, hours, break_minutes, start_time,
                end_time, location, created, deleted, update_version, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_blob(entity.id))
        .bind(uuid_blob(entity.user_id))
        .bind(format_date(entity.date)?)
        .bind(entity.hours as f64)
        .bind(entity.break_minutes as i64)
        .bind(entity.start_time.map(format_time).transpose()?)
        .bind(entity.end_time.map(format_time).transpose()?)
        .bind(location_text(&entity.location))
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
        entity: &TimeEntryEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query(
            r"UPDATE time_entry SET date = ?, hours = ?, break_minutes = ?, start_time = ?,
                end_time = ?, location = ?, deleted = ?, update_version = ?, update_process = ?
              WHERE id = ?",
        )
        .bind(format_date(entity.date)?)
        .bind(entity.hours as f64)
        .bind(entity.break_minutes as i64)
        .bind(entity.start_time.map(format_time).transpose()?)
        .bind(entity.end_time.map(format_time).transpose()?)
        .bind(location_text(&entity.location))
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
