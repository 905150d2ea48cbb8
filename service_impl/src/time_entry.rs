use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{absence::AbsenceDao, time_entry::TimeEntryDao, TransactionDao};
use service::{
    absence::AbsenceType,
    clock::ClockService,
    overtime::OvertimeService,
    permission::{Authentication, ADMIN_PRIVILEGE},
    time_entry::{TimeEntry, TimeEntryService},
    user::UserService,
    uuid_service::UuidService,
    PermissionService, ServiceError,
};
use tokio::join;
use uuid::Uuid;

gen_service_impl! {
    struct TimeEntryServiceImpl: TimeEntryService = TimeEntryServiceDeps {
        TimeEntryDao: TimeEntryDao<Transaction = Self::Transaction> = time_entry_dao,
        AbsenceDao: AbsenceDao<Transaction = Self::Transaction> = absence_dao,
        UserService: UserService<Context = Self::Context, Transaction = Self::Transaction> = user_service,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        ClockService: ClockService = clock_service,
        UuidService: UuidService = uuid_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

impl<Deps: TimeEntryServiceDeps> TimeEntryServiceImpl<Deps> {
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

    /// Entry validation shared by create and update.
    async fn validate_entry(
        &self,
        entry: &TimeEntry,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        if entry.hours < 0.0 {
            return Err(ServiceError::NegativeHours);
        }
        let user = self
            .user_service
            .get(entry.user_id, Authentication::Full, tx.clone().into())
            .await?;
        if entry.date < user.hire_date {
            return Err(ServiceError::BeforeHireDate);
        }
        if user.end_date.is_some_and(|end| entry.date > end) {
            return Err(ServiceError::AfterEndDate);
        }

        let blocking = self
            .absence_dao
            .find_approved_in_range(entry.user_id, entry.date, entry.date, tx)
            .await?
            .iter()
            .filter(|absence| absence.deleted.is_none())
            .any(|absence| AbsenceType::from(&absence.absence_type).excludes_time_entries());
        if blocking {
            return Err(ServiceError::AbsenceCoversDate(entry.date));
        }
        Ok(())
    }
}

#[async_trait]
impl<Deps: TimeEntryServiceDeps> TimeEntryService for TimeEntryServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[TimeEntry]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let entries: Arc<[TimeEntry]> = self
            .time_entry_dao
            .find_by_user_in_range(user_id, from, to, tx.clone())
            .await?
            .iter()
            .filter(|entry| entry.deleted.is_none())
            .map(TimeEntry::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(entries)
    }

    async fn create(
        &self,
        entry: &TimeEntry,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<TimeEntry, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(entry.user_id, context, tx.clone())
            .await?;
        if !entry.id.is_nil() {
            return Err(ServiceError::IdSetOnCreate);
        }
        if !entry.version.is_nil() {
            return Err(ServiceError::VersionSetOnCreate);
        }
        self.validate_entry(entry, tx.clone()).await?;

        let mut entry = entry.to_owned();
        entry.id = self.uuid_service.new_uuid("time_entry_service::create id");
        entry.version = self
            .uuid_service
            .new_uuid("time_entry_service::create version");
        entry.created = Some(self.clock_service.date_time_now());

        let entity = dao::time_entry::TimeEntryEntity::try_from(&entry)?;
        self.time_entry_dao
            .create(&entity, "time_entry_service::create", tx.clone())
            .await?;

        self.overtime_service
            .rebuild_month(
                entry.user_id,
                entry.as_month(),
                Authentication::Full,
                tx.clone().into(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(entry)
    }

    async fn update(
        &self,
        entry: &TimeEntry,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<TimeEntry, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let existing = self
            .time_entry_dao
            .find_by_id(entry.id, tx.clone())
            .await?
            .filter(|existing| existing.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(entry.id))?;
        self.check_admin_or_self(existing.user_id, context, tx.clone())
            .await?;
        if entry.user_id != existing.user_id {
            return Err(ServiceError::ValidationError(
                "time entries cannot move between users".into(),
            ));
        }
        self.validate_entry(entry, tx.clone()).await?;

        let mut entry = entry.to_owned();
        entry.version = self
            .uuid_service
            .new_uuid("time_entry_service::update version");
        entry.created = Some(existing.created);

        let entity = dao::time_entry::TimeEntryEntity::try_from(&entry)?;
        self.time_entry_dao
            .update(&entity, "time_entry_service::update", tx.clone())
            .await?;

        self.overtime_service
            .rebuild_month(
                entry.user_id,
                existing.as_month(),
                Authentication::Full,
                tx.clone().into(),
            )
            .await?;
        if entry.as_month() != existing.as_month() {
            self.overtime_service
                .rebuild_month(
                    entry.user_id,
                    entry.as_month(),
                    Authentication::Full,
                    tx.clone().into(),
                )
                .await?;
        }

        self.transaction_dao.commit(tx).await?;
        Ok(entry)
    }

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let mut entity = self
            .time_entry_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        self.check_admin_or_self(entity.user_id, context, tx.clone())
            .await?;

        entity.deleted = Some(self.clock_service.date_time_now());
        self.time_entry_dao
            .update(&entity, "time_entry_service::delete", tx.clone())
            .await?;

        self.overtime_service
            .rebuild_month(
                entity.user_id,
                entity.as_month(),
                Authentication::Full,
                tx.clone().into(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(())
    }
}
