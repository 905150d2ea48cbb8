use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    absence::{AbsenceDao, AbsenceStatusEntity},
    holiday::HolidayDao,
    time_entry::TimeEntryDao,
    user::UserDao,
    TransactionDao,
};
use serde_json::json;
use service::{
    absence::{Absence, AbsenceService, AbsenceStatus, AbsenceType},
    audit::AuditService,
    clock::ClockService,
    config::{AbsenceConflictPolicy, ConfigService},
    notification::{NotificationKind, Notifier},
    overtime::OvertimeService,
    permission::{Authentication, ADMIN_PRIVILEGE},
    user::{User, UserService},
    uuid_service::UuidService,
    vacation::VacationService,
    working_time::{business_days, credit_hours, HolidayCalendar},
    PermissionService, ServiceError,
};
use tokio::join;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

gen_service_impl! {
    struct AbsenceServiceImpl: AbsenceService = AbsenceServiceDeps {
        AbsenceDao: AbsenceDao<Transaction = Self::Transaction> = absence_dao,
        TimeEntryDao: TimeEntryDao<Transaction = Self::Transaction> = time_entry_dao,
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        HolidayDao: HolidayDao<Transaction = Self::Transaction> = holiday_dao,
        UserService: UserService<Context = Self::Context, Transaction = Self::Transaction> = user_service,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        VacationService: VacationService<Context = Self::Context, Transaction = Self::Transaction> = vacation_service,
        ConfigService: ConfigService = config_service,
        ClockService: ClockService = clock_service,
        UuidService: UuidService = uuid_service,
        Notifier: Notifier = notifier,
        AuditService: AuditService = audit_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

impl<Deps: AbsenceServiceDeps> AbsenceServiceImpl<Deps> {
    async fn check_admin_or_self(
        &self,
        user_id: Uuid,
        context: Authentication<Deps::Context>,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let (admin_permission, self_permission) = join!(
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context.clone()),
            self.user_service
                .verify_user_is(user_id, context, tx.clone().into()),
        );
        admin_permission.or(self_permission)
    }

    async fn calendar_for(
        &self,
        from: time::Date,
        to: time::Date,
        tx: Deps::Transaction,
    ) -> Result<HolidayCalendar, ServiceError> {
        Ok(self
            .holiday_dao
            .find_in_range(from, to, tx)
            .await?
            .iter()
            .map(|holiday| holiday.date)
            .collect())
    }

    async fn current_user_id(
        &self,
        context: Authentication<Deps::Context>,
        tx: Deps::Transaction,
    ) -> Result<Option<Uuid>, ServiceError> {
        let Some(username) = self.permission_service.current_username(context).await? else {
            return Ok(None);
        };
        Ok(self
            .user_dao
            .find_by_username(username.as_ref(), tx)
            .await?
            .map(|user| user.id))
    }

    async fn check_no_overlap(
        &self,
        absence: &Absence,
        exclude: Option<Uuid>,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let overlapping = self
            .absence_dao
            .find_overlapping(absence.user_id, absence.start_date, absence.end_date, tx)
            .await?
            .iter()
            .filter(|other| other.deleted.is_none())
            .filter(|other| other.status != AbsenceStatusEntity::Rejected)
            .any(|other| exclude != Some(other.id));
        if overlapping {
            Err(ServiceError::OverlappingAbsence)
        } else {
            Ok(())
        }
    }

    /// Distinct dates of live time entries within the absence range.
    async fn conflicting_entry_dates(
        &self,
        absence: &Absence,
        tx: Deps::Transaction,
    ) -> Result<Vec<time::Date>, ServiceError> {
        let mut dates: Vec<time::Date> = self
            .time_entry_dao
            .find_by_user_in_range(absence.user_id, absence.start_date, absence.end_date, tx)
            .await?
            .iter()
            .filter(|entry| entry.deleted.is_none())
            .map(|entry| entry.date)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    async fn rebuild_overlapping_months(
        &self,
        absence: &Absence,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        self.overtime_service
            .rebuild_months(
                absence.user_id,
                KontoMonth::from_date(absence.start_date),
                KontoMonth::from_date(absence.end_date),
                Authentication::Full,
                tx.into(),
            )
            .await
    }

    /// Balance gate for overtime compensation: the live balance must cover
    /// the schedule-aware hours of the whole range.
    async fn check_overtime_comp_balance(
        &self,
        user: &User,
        absence: &Absence,
        calendar: &HolidayCalendar,
        tx: Deps::Transaction,
    ) -> Result<f32, ServiceError> {
        let required = credit_hours(
            user,
            absence.start_date,
            absence.end_date,
            AbsenceType::OvertimeComp,
            calendar,
        );
        let available = self
            .overtime_service
            .balance(user.id, Authentication::Full, tx.into())
            .await?;
        if available < required {
            return Err(ServiceError::InsufficientOvertime {
                required,
                available,
            });
        }
        Ok(required)
    }

    /// Guards shared by create and update: date order, hire window, overlap,
    /// entry conflicts, day count and the type-specific balance gates.
    /// Returns the schedule-aware day count.
    async fn run_request_guards(
        &self,
        absence: &Absence,
        user: &User,
        exclude: Option<Uuid>,
        tx: Deps::Transaction,
    ) -> Result<u32, ServiceError> {
        if absence.start_date > absence.end_date {
            return Err(ServiceError::DateOrderWrong);
        }
        if absence.start_date < user.hire_date {
            return Err(ServiceError::BeforeHireDate);
        }

        self.check_no_overlap(absence, exclude, tx.clone()).await?;

        if absence.absence_type.excludes_time_entries() {
            let conflicts = self.conflicting_entry_dates(absence, tx.clone()).await?;
            if !conflicts.is_empty() {
                return Err(ServiceError::TimeEntriesInRange(conflicts.into()));
            }
        }

        let calendar = self
            .calendar_for(absence.start_date, absence.end_date, tx.clone())
            .await?;
        let days = business_days(
            user,
            absence.start_date,
            absence.end_date,
            absence.absence_type,
            &calendar,
        );
        if days == 0 {
            return Err(ServiceError::NoWorkingDays);
        }

        match absence.absence_type {
            AbsenceType::Vacation => {
                let balance = self
                    .vacation_service
                    .balance_for_year(
                        absence.user_id,
                        absence.start_date.year(),
                        Authentication::Full,
                        tx.clone().into(),
                    )
                    .await?;
                if balance.remaining() < days as f32 {
                    return Err(ServiceError::InsufficientVacation {
                        required: days as f32,
                        available: balance.remaining(),
                    });
                }
            }
            AbsenceType::OvertimeComp => {
                self.check_overtime_comp_balance(user, absence, &calendar, tx.clone())
                    .await?;
            }
            AbsenceType::Sick | AbsenceType::Unpaid => {}
        }
        Ok(days)
    }

    /// Applies the configured conflict policy, returning the dates whose
    /// entries were deleted.
    async fn resolve_entry_conflicts(
        &self,
        absence: &Absence,
        tx: Deps::Transaction,
    ) -> Result<Vec<time::Date>, ServiceError> {
        if !absence.absence_type.excludes_time_entries() {
            return Ok(Vec::new());
        }
        let dates = self.conflicting_entry_dates(absence, tx.clone()).await?;
        if dates.is_empty() {
            return Ok(dates);
        }
        match self.config_service.get_config().await?.absence_conflict_policy {
            AbsenceConflictPolicy::RejectApproval => {
                Err(ServiceError::TimeEntriesInRange(dates.into()))
            }
            AbsenceConflictPolicy::DeleteTimeEntries => {
                let now = self.clock_service.date_time_now();
                for entry in self
                    .time_entry_dao
                    .find_by_user_in_range(
                        absence.user_id,
                        absence.start_date,
                        absence.end_date,
                        tx.clone(),
                    )
                    .await?
                    .iter()
                    .filter(|entry| entry.deleted.is_none())
                {
                    let mut entry = entry.clone();
                    entry.deleted = Some(now);
                    self.time_entry_dao
                        .update(&entry, "absence_service::approve", tx.clone())
                        .await?;
                }
                self.notifier
                    .emit(
                        absence.user_id,
                        NotificationKind::TimeEntriesDeleted,
                        json!({
                            "absenceId": absence.id.to_string(),
                            "dates": dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                        }),
                    )
                    .await;
                Ok(dates)
            }
        }
    }
}

#[async_trait]
impl<Deps: AbsenceServiceDeps> AbsenceService for AbsenceServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .absence_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        self.check_admin_or_self(entity.user_id, context, tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(Absence::from(&entity))
    }

    async fn get_all_for_user(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Absence]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let absences: Arc<[Absence]> = self
            .absence_dao
            .find_by_user(user_id, tx.clone())
            .await?
            .iter()
            .filter(|entity| entity.deleted.is_none())
            .map(Absence::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(absences)
    }

    async fn find_approved_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Absence]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let absences: Arc<[Absence]> = self
            .absence_dao
            .find_approved_in_range(user_id, from, to, tx.clone())
            .await?
            .iter()
            .filter(|entity| entity.deleted.is_none())
            .map(Absence::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(absences)
    }

    async fn create(
        &self,
        absence: &Absence,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(absence.user_id, context.clone(), tx.clone())
            .await?;
        if !absence.id.is_nil() {
            return Err(ServiceError::IdSetOnCreate);
        }
        if !absence.version.is_nil() {
            return Err(ServiceError::VersionSetOnCreate);
        }

        let user = self
            .user_service
            .get(absence.user_id, Authentication::Full, tx.clone().into())
            .await?;
        let days = self
            .run_request_guards(absence, &user, None, tx.clone())
            .await?;

        let now = self.clock_service.date_time_now();
        let mut absence = absence.to_owned();
        absence.id = self.uuid_service.new_uuid("absence_service::create id");
        absence.version = self.uuid_service.new_uuid("absence_service::create version");
        absence.created = Some(now);
        absence.days = days as f32;
        if absence.absence_type.auto_approves() {
            absence.status = AbsenceStatus::Approved;
            absence.approved_at = Some(now);
            absence.approved_by = None;
        } else {
            absence.status = AbsenceStatus::Pending;
            absence.approved_at = None;
            absence.approved_by = None;
        }

        let entity = dao::absence::AbsenceEntity::try_from(&absence)?;
        self.absence_dao
            .create(&entity, "absence_service::create", tx.clone())
            .await?;

        if absence.status == AbsenceStatus::Approved {
            self.rebuild_overlapping_months(&absence, tx.clone()).await?;
        }

        let actor = self.current_user_id(context, tx.clone()).await?;
        self.audit_service
            .record(
                actor,
                "absence.create",
                "absence",
                absence.id.to_string().into(),
                json!({ "status": format!("{:?}", absence.status), "days": absence.days }),
            )
            .await;

        self.transaction_dao.commit(tx).await?;
        Ok(absence)
    }

    async fn update(
        &self,
        absence: &Absence,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let existing = self
            .absence_dao
            .find_by_id(absence.id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(absence.id))?;
        self.check_admin_or_self(existing.user_id, context.clone(), tx.clone())
            .await?;
        if existing.status != AbsenceStatusEntity::Pending {
            return Err(ServiceError::InvalidStatusTransition(
                "only pending requests can be edited".into(),
            ));
        }
        if absence.user_id != existing.user_id {
            return Err(ServiceError::ValidationError(
                "absences cannot move between users".into(),
            ));
        }

        let user = self
            .user_service
            .get(existing.user_id, Authentication::Full, tx.clone().into())
            .await?;
        let days = self
            .run_request_guards(absence, &user, Some(existing.id), tx.clone())
            .await?;

        let mut absence = absence.to_owned();
        absence.days = days as f32;
        absence.status = AbsenceStatus::Pending;
        absence.approved_by = None;
        absence.approved_at = None;
        absence.created = Some(existing.created);
        absence.version = self.uuid_service.new_uuid("absence_service::update version");

        let entity = dao::absence::AbsenceEntity::try_from(&absence)?;
        self.absence_dao
            .update(&entity, "absence_service::update", tx.clone())
            .await?;

        let actor = self.current_user_id(context, tx.clone()).await?;
        self.audit_service
            .record(
                actor,
                "absence.update",
                "absence",
                absence.id.to_string().into(),
                json!({ "days": absence.days }),
            )
            .await;

        self.transaction_dao.commit(tx).await?;
        Ok(absence)
    }

    async fn approve(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context.clone())
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .absence_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        let mut absence = Absence::from(&entity);
        if absence.status == AbsenceStatus::Approved {
            return Err(ServiceError::InvalidStatusTransition("approved".into()));
        }

        let user = self
            .user_service
            .get(absence.user_id, Authentication::Full, tx.clone().into())
            .await?;

        // Re-approval runs the full guard set from scratch.
        self.check_no_overlap(&absence, Some(absence.id), tx.clone())
            .await?;
        let calendar = self
            .calendar_for(absence.start_date, absence.end_date, tx.clone())
            .await?;
        if absence.absence_type == AbsenceType::OvertimeComp {
            self.check_overtime_comp_balance(&user, &absence, &calendar, tx.clone())
                .await?;
        }

        let deleted_dates = self.resolve_entry_conflicts(&absence, tx.clone()).await?;

        absence.status = AbsenceStatus::Approved;
        absence.approved_at = Some(self.clock_service.date_time_now());
        absence.approved_by = self.current_user_id(context.clone(), tx.clone()).await?;
        absence.version = self.uuid_service.new_uuid("absence_service::approve version");

        let entity = dao::absence::AbsenceEntity::try_from(&absence)?;
        self.absence_dao
            .update(&entity, "absence_service::approve", tx.clone())
            .await?;

        // Entry deletions and the status flip share this transaction, so one
        // rebuild per month covers both.
        self.rebuild_overlapping_months(&absence, tx.clone()).await?;

        self.notifier
            .emit(
                absence.user_id,
                NotificationKind::AbsenceApproved,
                json!({
                    "absenceId": absence.id.to_string(),
                    "deletedEntryDates": deleted_dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                }),
            )
            .await;
        let actor = self.current_user_id(context, tx.clone()).await?;
        self.audit_service
            .record(
                actor,
                "absence.approve",
                "absence",
                absence.id.to_string().into(),
                json!({ "from": "pending|rejected", "to": "approved" }),
            )
            .await;

        self.transaction_dao.commit(tx).await?;
        Ok(absence)
    }

    async fn reject(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context.clone())
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .absence_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        let mut absence = Absence::from(&entity);
        if absence.status == AbsenceStatus::Rejected {
            return Err(ServiceError::InvalidStatusTransition("rejected".into()));
        }
        let was_approved = absence.status == AbsenceStatus::Approved;

        absence.status = AbsenceStatus::Rejected;
        absence.version = self.uuid_service.new_uuid("absence_service::reject version");

        let entity = dao::absence::AbsenceEntity::try_from(&absence)?;
        self.absence_dao
            .update(&entity, "absence_service::reject", tx.clone())
            .await?;

        // Dropping the approval removes the credit and compensation rows on
        // the next rebuild; they only come back via a fresh approval.
        if was_approved {
            self.rebuild_overlapping_months(&absence, tx.clone()).await?;
        }

        self.notifier
            .emit(
                absence.user_id,
                NotificationKind::AbsenceRejected,
                json!({ "absenceId": absence.id.to_string() }),
            )
            .await;
        let actor = self.current_user_id(context, tx.clone()).await?;
        self.audit_service
            .record(
                actor,
                "absence.reject",
                "absence",
                absence.id.to_string().into(),
                json!({ "to": "rejected", "wasApproved": was_approved }),
            )
            .await;

        self.transaction_dao.commit(tx).await?;
        Ok(absence)
    }

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .absence_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        let absence = Absence::from(&entity);

        let admin_permission = self
            .permission_service
            .check_permission(ADMIN_PRIVILEGE, context.clone())
            .await;
        if admin_permission.is_err() {
            // Employees may only withdraw their own pending requests.
            self.user_service
                .verify_user_is(absence.user_id, context.clone(), tx.clone().into())
                .await?;
            if absence.status != AbsenceStatus::Pending {
                return Err(ServiceError::Forbidden);
            }
        }

        let mut entity = entity;
        entity.deleted = Some(self.clock_service.date_time_now());
        self.absence_dao
            .update(&entity, "absence_service::delete", tx.clone())
            .await?;

        if absence.status == AbsenceStatus::Approved {
            self.rebuild_overlapping_months(&absence, tx.clone()).await?;
        }

        let actor = self.current_user_id(context, tx.clone()).await?;
        self.audit_service
            .record(
                actor,
                "absence.delete",
                "absence",
                absence.id.to_string().into(),
                json!({ "status": format!("{:?}", absence.status) }),
            )
            .await;

        self.transaction_dao.commit(tx).await?;
        Ok(())
    }
}
