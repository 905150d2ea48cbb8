use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    user::{UserDao, UserRoleEntity, UserStatusEntity},
    TransactionDao,
};
use service::{
    identity::IdentityService,
    permission::{Authentication, PermissionService, ADMIN_PRIVILEGE, EMPLOYEE_PRIVILEGE},
    ServiceError,
};

gen_service_impl! {
    struct PermissionServiceImpl: PermissionService = PermissionServiceDeps {
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        IdentityService: IdentityService = identity_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

impl<Deps: PermissionServiceDeps> PermissionServiceImpl<Deps> {
    async fn find_current_user(
        &self,
        tx: Deps::Transaction,
    ) -> Result<Option<dao::user::UserEntity>, ServiceError> {
        let username = self.identity_service.current_username().await?;
        Ok(self
            .user_dao
            .find_by_username(username.as_ref(), tx)
            .await?
            .filter(|user| user.deleted.is_none()))
    }
}

#[async_trait]
impl<Deps: PermissionServiceDeps> PermissionService for PermissionServiceImpl<Deps> {
    type Context = Deps::Context;

    async fn current_username(
        &self,
        context: Authentication<Self::Context>,
    ) -> Result<Option<Arc<str>>, ServiceError> {
        match context {
            Authentication::Full => Ok(None),
            Authentication::Context(_) => Ok(Some(self.identity_service.current_username().await?)),
        }
    }

    async fn check_permission(
        &self,
        privilege: &str,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError> {
        if matches!(context, Authentication::Full) {
            return Ok(());
        }
        let tx = self.transaction_dao.use_transaction(None).await?;
        let user = self
            .find_current_user(tx.clone())
            .await?
            .ok_or(ServiceError::Forbidden)?;
        self.transaction_dao.commit(tx).await?;

        if user.status != UserStatusEntity::Active {
            return Err(ServiceError::Forbidden);
        }
        match privilege {
            ADMIN_PRIVILEGE if user.role == UserRoleEntity::Admin => Ok(()),
            EMPLOYEE_PRIVILEGE => Ok(()),
            _ => Err(ServiceError::Forbidden),
        }
    }

    async fn check_only_full_authentication(
        &self,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError> {
        if matches!(context, Authentication::Full) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    async fn check_user(
        &self,
        username: &str,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError> {
        match self.current_username(context).await? {
            None => Ok(()),
            Some(current) if current.as_ref() == username => Ok(()),
            Some(_) => Err(ServiceError::Forbidden),
        }
    }
}
