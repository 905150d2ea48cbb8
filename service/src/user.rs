use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::{derive_from_reference, DayOfWeek};

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Employee,
}
impl From<&dao::user::UserRoleEntity> for UserRole {
    fn from(role: &dao::user::UserRoleEntity) -> Self {
        match role {
            dao::user::UserRoleEntity::Admin => Self::Admin,
            dao::user::UserRoleEntity::Employee => Self::Employee,
        }
    }
}
impl From<&UserRole> for dao::user::UserRoleEntity {
    fn from(role: &UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Employee => Self::Employee,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}
impl From<&dao::user::UserStatusEntity> for UserStatus {
    fn from(status: &dao::user::UserStatusEntity) -> Self {
        match status {
            dao::user::UserStatusEntity::Active => Self::Active,
            dao::user::UserStatusEntity::Inactive => Self::Inactive,
        }
    }
}
impl From<&UserStatus> for dao::user::UserStatusEntity {
    fn from(status: &UserStatus) -> Self {
        match status {
            UserStatus::Active => Self::Active,
            UserStatus::Inactive => Self::Inactive,
        }
    }
}

/// Explicit contracted hours per weekday.  When present on a user it fully
/// replaces the `weekly_hours / 5` default.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WeekSchedule {
    pub monday: f32,
    pub tuesday: f32,
    pub wednesday: f32,
    pub thursday: f32,
    pub friday: f32,
    pub saturday: f32,
    pub sunday: f32,
}

impl WeekSchedule {
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

    /// Weekdays with contracted hours above zero.
    pub fn active_days(&self) -> impl Iterator<Item = DayOfWeek> + '_ {
        DayOfWeek::ALL
            .into_iter()
            .filter(move |day| self.hours_for(*day) > 0.0)
    }

    pub fn has_negative_hours(&self) -> bool {
        DayOfWeek::ALL.into_iter().any(|day| self.hours_for(day) < 0.0)
    }
}

impl From<&dao::user::WeekScheduleEntity> for WeekSchedule {
    fn from(entity: &dao::user::WeekScheduleEntity) -> Self {
        Self {
            monday: entity.monday,
            tuesday: entity.tuesday,
            wednesday: entity.wednesday,
            thursday: entity.thursday,
            friday: entity.friday,
            saturday: entity.saturday,
            sunday: entity.sunday,
        }
    }
}
impl From<&WeekSchedule> for dao::user::WeekScheduleEntity {
    fn from(schedule: &WeekSchedule) -> Self {
        Self {
            monday: schedule.monday,
            tuesday: schedule.tuesday,
            wednesday: schedule.wednesday,
            thursday: schedule.thursday,
            friday: schedule.friday,
            saturday: schedule.saturday,
            sunday: schedule.sunday,
        }
    }
}
derive_from_reference!(dao::user::WeekScheduleEntity, WeekSchedule);

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: Arc<str>,
    pub email: Option<Arc<str>>,
    pub first_name: Arc<str>,
    pub last_name: Arc<str>,
    pub role: UserRole,
    pub status: UserStatus,
    pub weekly_hours: f32,
    pub work_schedule: Option<WeekSchedule>,
    pub vacation_days_per_year: u32,
    pub hire_date: time::Date,
    pub end_date: Option<time::Date>,
    pub created: Option<time::PrimitiveDateTime>,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl User {
    /// Whether `date` falls into the employment window.
    pub fn is_employed_on(&self, date: time::Date) -> bool {
        date >= self.hire_date && self.end_date.is_none_or(|end| date <= end)
    }
}

impl From<&dao::user::UserEntity> for User {
    fn from(entity: &dao::user::UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username.clone(),
            email: entity.email.clone(),
            first_name: entity.first_name.clone(),
            last_name: entity.last_name.clone(),
            role: (&entity.role).into(),
            status: (&entity.status).into(),
            weekly_hours: entity.weekly_hours,
            work_schedule: entity.work_schedule.as_ref().map(WeekSchedule::from),
            vacation_days_per_year: entity.vacation_days_per_year,
            hire_date: entity.hire_date,
            end_date: entity.end_date,
            created: Some(entity.created),
            deleted: entity.deleted,
            version: entity.version,
        }
    }
}
impl TryFrom<&User> for dao::user::UserEntity {
    type Error = ServiceError;
    fn try_from(user: &User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: (&user.role).into(),
            status: (&user.status).into(),
            weekly_hours: user.weekly_hours,
            work_schedule: user
                .work_schedule
                .as_ref()
                .map(dao::user::WeekScheduleEntity::from),
            vacation_days_per_year: user.vacation_days_per_year,
            hire_date: user.hire_date,
            end_date: user.end_date,
            created: user.created.ok_or(ServiceError::InternalError)?,
            deleted: user.deleted,
            version: user.version,
        })
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait UserService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError>;

    async fn get_all(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[User]>, ServiceError>;

    async fn create(
        &self,
        user: &User,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError>;

    /// Persists the change and rebuilds every month whose target hours the
    /// change can affect.
    async fn update(
        &self,
        user: &User,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError>;

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    /// Ok when the authenticated caller is the user itself.
    async fn verify_user_is(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}
