use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeitkonto_utils::DayOfWeek;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRoleEntity {
    Admin,
    Employee,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserStatusEntity {
    Active,
    Inactive,
}

/// Contracted hours per weekday.  Persisted as a JSON object with lowercase
/// weekday keys; absent days count as zero hours.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WeekScheduleEntity {
    pub monday: f32,
    pub tuesday: f32,
    pub wednesday: f32,
    pub thursday: f32,
    pub friday: f32,
    pub saturday: f32,
    pub sunday: f32,
}

impl WeekScheduleEntity {
    pub fn hours_for(&self, day: DayOfWeek) -> f32 {
        match day {
            DayOfWeek::Monday => self.monday,
            DayOfWeek::Tuesday => self.tuesday,
            DayOfWeek::Wednesday => self.wednesday,
            DayOfWeek::Thursday => self.thursday,
            DayOfWeek::Friday => self.friday,
            DayOfWeek::Saturday => self.saturday,
            DayOfWeek::Sunday => self.sunday,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: Arc<str>,
    pub email: Option<Arc<str>>,
    pub first_name: Arc<str>,
    pub last_name: Arc<str>,
    pub role: UserRoleEntity,
    pub status: UserStatusEntity,
    pub weekly_hours: f32,
    pub work_schedule: Option<WeekScheduleEntity>,
    pub vacation_days_per_year: u32,
    pub hire_date: time::Date,
    pub end_date: Option<time::Date>,
    pub created: time::PrimitiveDateTime,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait UserDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<UserEntity>, crate::DaoError>;
    async fn find_by_username(
        &self,
        username: &str,
        tx: Self::Transaction,
    ) -> Result<Option<UserEntity>, crate::DaoError>;
    async fn all(&self, tx: Self::Transaction) -> Result<Arc<[UserEntity]>, crate::DaoError>;
    async fn create(
        &self,
        entity: &UserEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn update(
        &self,
        entity: &UserEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}
