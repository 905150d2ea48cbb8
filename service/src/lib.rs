use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

pub mod absence;
pub mod audit;
pub mod clock;
pub mod config;
pub mod holiday;
pub mod identity;
pub mod notification;
pub mod overtime;
pub mod overtime_correction;
pub mod permission;
pub mod rollover;
pub mod scheduler;
pub mod time_entry;
pub mod user;
pub mod uuid_service;
pub mod vacation;
pub mod working_time;

pub use permission::PermissionService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] dao::DaoError),

    #[error("Forbidden")]
    Forbidden,

    #[error("Entity {0} not found")]
    EntityNotFound(Uuid),

    #[error("Entity not found: {0}")]
    EntityNotFoundGeneric(Arc<str>),

    #[error("Validation error: {0}")]
    ValidationError(Arc<str>),

    #[error("Id must not be set on create")]
    IdSetOnCreate,

    #[error("Version must not be set on create")]
    VersionSetOnCreate,

    #[error("End date must not lie before start date")]
    DateOrderWrong,

    #[error("Reason must have at least 10 characters")]
    ReasonTooShort,

    #[error("Hours must not be zero")]
    ZeroHours,

    #[error("Hours must not be negative")]
    NegativeHours,

    #[error("Date lies before the hire date")]
    BeforeHireDate,

    #[error("Date lies after the contract end date")]
    AfterEndDate,

    #[error("Overlaps an existing pending or approved absence")]
    OverlappingAbsence,

    #[error("Time entries exist on {} day(s) in the requested range", .0.len())]
    TimeEntriesInRange(Arc<[time::Date]>),

    #[error("An approved absence covers {0}")]
    AbsenceCoversDate(time::Date),

    #[error("Insufficient overtime balance: required {required}, available {available}")]
    InsufficientOvertime { required: f32, available: f32 },

    #[error("Insufficient vacation days: required {required}, available {available}")]
    InsufficientVacation { required: f32, available: f32 },

    #[error("The requested range contains no working days")]
    NoWorkingDays,

    #[error("Invalid status transition: {0}")]
    InvalidStatusTransition(Arc<str>),

    #[error("Upstream provider failure: {0}")]
    UpstreamFailure(Arc<str>),

    #[error("Internal error")]
    InternalError,
}
