use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{user::UserDao, TransactionDao};
use service::{
    clock::ClockService,
    overtime::OvertimeService,
    permission::{Authentication, ADMIN_PRIVILEGE},
    user::{User, UserService},
    uuid_service::UuidService,
    PermissionService, ServiceError,
};
use tokio::join;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

gen_service_impl! {
    struct UserServiceImpl: UserService = UserServiceDeps {
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        ClockService: ClockService = clock_service,
        UuidService: UuidService = uuid_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

fn validate_user(user: &User) -> Result<(), ServiceError> {
    if user.username.is_empty() {
        return Err(ServiceError::ValidationError("username must not be empty".into()));
    }
    if user.weekly_hours < 0.0 {
        return Err(ServiceError::NegativeHours);
    }
    if user
        .work_schedule
        .as_ref()
        .is_some_and(|schedule| schedule.has_negative_hours())
    {
        return Err(ServiceError::NegativeHours);
    }
    if user.end_date.is_some_and(|end| end < user.hire_date) {
        return Err(ServiceError::DateOrderWrong);
    }
    Ok(())
}

/// Whether an update can change target hours of already accounted days.
fn affects_target_hours(before: &User, after: &User) -> bool {
    before.weekly_hours != after.weekly_hours
        || before.work_schedule != after.work_schedule
        || before.hire_date != after.hire_date
        || before.end_date != after.end_date
}

#[async_trait]
impl<Deps: UserServiceDeps> UserService for UserServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .user_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|user| user.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        let user = User::from(&entity);

        let (admin_permission, self_permission) = join!(
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context.clone()),
            self.permission_service
                .check_user(user.username.as_ref(), context),
        );
        admin_permission.or(self_permission)?;

        self.transaction_dao.commit(tx).await?;
        Ok(user)
    }

    async fn get_all(
        &self,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[User]>, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let users: Arc<[User]> = self
            .user_dao
            .all(tx.clone())
            .await?
            .iter()
            .filter(|user| user.deleted.is_none())
            .map(User::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(users)
    }

    async fn create(
        &self,
        user: &User,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        if !user.id.is_nil() {
            return Err(ServiceError::IdSetOnCreate);
        }
        if !user.version.is_nil() {
            return Err(ServiceError::VersionSetOnCreate);
        }
        validate_user(user)?;

        let mut user = user.to_owned();
        user.id = self.uuid_service.new_uuid("user_service::create id");
        user.version = self.uuid_service.new_uuid("user_service::create version");
        user.created = Some(self.clock_service.date_time_now());

        let tx = self.transaction_dao.use_transaction(tx).await?;
        if self
            .user_dao
            .find_by_username(user.username.as_ref(), tx.clone())
            .await?
            .is_some()
        {
            return Err(ServiceError::ValidationError("username already taken".into()));
        }
        let entity = dao::user::UserEntity::try_from(&user)?;
        self.user_dao
            .create(&entity, "user_service::create", tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(user)
    }

    async fn update(
        &self,
        user: &User,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<User, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        validate_user(user)?;

        let tx = self.transaction_dao.use_transaction(tx).await?;
        let existing = self
            .user_dao
            .find_by_id(user.id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(user.id))?;
        let before = User::from(&existing);

        let mut user = user.to_owned();
        user.version = self.uuid_service.new_uuid("user_service::update version");
        user.created = before.created;
        let entity = dao::user::UserEntity::try_from(&user)?;
        self.user_dao
            .update(&entity, "user_service::update", tx.clone())
            .await?;

        if affects_target_hours(&before, &user) {
            let earliest_hire = before.hire_date.min(user.hire_date);
            let from = KontoMonth::from_date(earliest_hire);
            let to = KontoMonth::from_date(self.clock_service.today());
            if from <= to {
                self.overtime_service
                    .rebuild_months(user.id, from, to, Authentication::Full, tx.clone().into())
                    .await?;
            }
        }

        self.transaction_dao.commit(tx).await?;
        Ok(user)
    }

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let mut entity = self
            .user_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;
        entity.deleted = Some(self.clock_service.date_time_now());
        self.user_dao
            .update(&entity, "user_service::delete", tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(())
    }

    async fn verify_user_is(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entity = self
            .user_dao
            .find_by_id(user_id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(user_id))?;
        self.transaction_dao.commit(tx).await?;
        self.permission_service
            .check_user(entity.username.as_ref(), context)
            .await
    }
}
