use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    user::{UserDao, UserEntity, UserRoleEntity, UserStatusEntity, WeekScheduleEntity},
    DaoError,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::row::{
    format_date, format_datetime, format_opt_datetime, parse_date, parse_datetime, parse_opt_datetime,
    parse_uuid, uuid_blob,
};
use crate::{ResultDbErrorExt, TransactionImpl};

const SELECT_COLUMNS: &str = r"SELECT id, username, email, first_name, last_name, role, status,
    weekly_hours, work_schedule, vacation_days_per_year, hire_date, end_date,
    created, deleted, update_version FROM user";

#[derive(FromRow)]
struct UserDb {
    id: Vec<u8>,
    username: String,
    email: Option<String>,
    first_name: String,
    last_name: String,
    role: String,
    status: String,
    weekly_hours: f64,
    work_schedule: Option<String>,
    vacation_days_per_year: i64,
    hire_date: String,
    end_date: Option<String>,
    created: String,
    deleted: Option<String>,
    update_version: Vec<u8>,
}

impl TryFrom<&UserDb> for UserEntity {
    type Error = DaoError;

    fn try_from(user: &UserDb) -> Result<Self, DaoError> {
        Ok(Self {
            id: parse_uuid(&user.id)?,
            username: user.username.as_str().into(),
            email: user.email.as_deref().map(Into::into),
            first_name: user.first_name.as_str().into(),
            last_name: user.last_name.as_str().into(),
            role: match user.role.as_str() {
                "admin" => UserRoleEntity::Admin,
                "employee" => UserRoleEntity::Employee,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            status: match user.status.as_str() {
                "active" => UserStatusEntity::Active,
                "inactive" => UserStatusEntity::Inactive,
                value => return Err(DaoError::EnumValueNotFound(value.into())),
            },
            weekly_hours: user.weekly_hours as f32,
            work_schedule: user
                .work_schedule
                .as_deref()
                .map(serde_json::from_str::<WeekScheduleEntity>)
                .transpose()
                .map_db_error()?,
            vacation_days_per_year: user.vacation_days_per_year as u32,
            hire_date: parse_date(&user.hire_date)?,
            end_date: user.end_date.as_deref().map(parse_date).transpose()?,
            created: parse_datetime(&user.created)?,
            deleted: parse_opt_datetime(user.deleted.as_deref())?,
            version: parse_uuid(&user.update_version)?,
        })
    }
}

fn role_text(role: &UserRoleEntity) -> &'static str {
    match role {
        UserRoleEntity::Admin => "admin",
        UserRoleEntity::Employee => "employee",
    }
}

fn status_text(status: &UserStatusEntity) -> &'static str {
    match status {
        UserStatusEntity::Active => "active",
        UserStatusEntity::Inactive => "inactive",
    }
}

pub struct UserDaoImpl {
    pub pool: Arc<sqlx::SqlitePool>,
}
impl UserDaoImpl {
    pub fn new(pool: Arc<sqlx::SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDao for UserDaoImpl {
    type Transaction = TransactionImpl;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<UserEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, UserDb>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(uuid_blob(id))
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(UserEntity::try_from)
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
        tx: Self::Transaction,
    ) -> Result<Option<UserEntity>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, UserDb>(&format!("{SELECT_COLUMNS} WHERE username = ?"))
            .bind(username)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error()?
            .as_ref()
            .map(UserEntity::try_from)
            .transpose()
    }

    async fn all(&self, tx: Self::Transaction) -> Result<Arc<[UserEntity]>, DaoError> {
        let mut tx = tx.lock().await;
        sqlx::query_as::<_, UserDb>(&format!("{SELECT_COLUMNS} ORDER BY username"))
            .fetch_all(&mut **tx)
            .await
            .map_db_error()?
            .iter()
            .map(UserEntity::try_from)
            .collect()
    }

    async fn create(
        &self,
        entity: &UserEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let work_schedule = entity
            .work_schedule
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_db_error()?;
        let mut tx = tx.lock().await;
        sqlx::query(
            r"INSERT INTO user (id, username, email, first_name, last_name, role, status,
                weekly_hours, work_schedule, vacation_days_per_year, hire_date, end_date,
                created, deleted, update_version, update_process)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_blob(entity.id))
        .bind(entity.username.as_ref())
        .bind(entity.email.as_deref())
        .bind(entity.first_name.as_ref())
        .bind(entity.last_name.as_ref())
        .bind(role_text(&entity.role))
        .bind(status_text(&entity.status))
        .bind(entity.weekly_hours as f64)
        .bind(work_schedule)
        .bind(entity.vacation_days_per_year as i64)
        .bind(format_date(entity.hire_date)?)
        .bind(entity.end_date.map(format_date).transpose()?)
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
        entity: &UserEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), DaoError> {
        let work_schedule = entity
            .work_schedule
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_db_error()?;
        let mut tx = tx.lock().await;
        sqlx::query(
            r"UPDATE user SET username = ?, email = ?, first_name = ?, last_name = ?,
                role = ?, status = ?, weekly_hours = ?, work_schedule = ?,
                vacation_days_per_year = ?, hire_date = ?, end_date = ?, deleted = ?,
                update_version = ?, update_process = ?
              WHERE id = ?",
        )
        .bind(entity.username.as_ref())
        .bind(entity.email.as_deref())
        .bind(entity.first_name.as_ref())
        .bind(entity.last_name.as_ref())
        .bind(role_text(&entity.role))
        .bind(status_text(&entity.status))
        .bind(entity.weekly_hours as f64)
        .bind(work_schedule)
        .bind(entity.vacation_days_per_year as i64)
        .bind(format_date(entity.hire_date)?)
        .bind(entity.end_date.map(format_date).transpose()?)
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
