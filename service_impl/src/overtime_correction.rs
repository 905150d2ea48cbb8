use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{overtime_correction::OvertimeCorrectionDao, TransactionDao};
use service::{
    clock::ClockService,
    overtime::OvertimeService,
    overtime_correction::{OvertimeCorrection, OvertimeCorrectionService, MIN_REASON_LEN},
    permission::{Authentication, ADMIN_PRIVILEGE},
    user::UserService,
    uuid_service::UuidService,
    PermissionService, ServiceError,
};
use tokio::join;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

gen_service_impl! {
    struct OvertimeCorrectionServiceImpl: OvertimeCorrectionService = OvertimeCorrectionServiceDeps {
        OvertimeCorrectionDao: OvertimeCorrectionDao<Transaction = Self::Transaction> = overtime_correction_dao,
        UserService: UserService<Context = Self::Context, Transaction = Self::Transaction> = user_service,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        ClockService: ClockService = clock_service,
        UuidService: UuidService = uuid_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

#[async_trait]
impl<Deps: OvertimeCorrectionServiceDeps> OvertimeCorrectionService
    for OvertimeCorrectionServiceImpl<Deps>
{
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeCorrection]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let (admin_permission, self_permission) = join!(
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context.clone()),
            self.user_service
                .verify_user_is(user_id, context, tx.clone().into()),
        );
        admin_permission.or(self_permission)?;

        let corrections: Arc<[OvertimeCorrection]> = self
            .overtime_correction_dao
            .find_by_user_in_range(user_id, from, to, tx.clone())
            .await?
            .iter()
            .filter(|correction| correction.deleted.is_none())
            .map(OvertimeCorrection::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(corrections)
    }

    async fn create(
        &self,
        correction: &OvertimeCorrection,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<OvertimeCorrection, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context.clone())
            .await?;
        if !correction.id.is_nil() {
            return Err(ServiceError::IdSetOnCreate);
        }
        if !correction.version.is_nil() {
            return Err(ServiceError::VersionSetOnCreate);
        }
        if correction.hours == 0.0 {
            return Err(ServiceError::ZeroHours);
        }
        if correction.reason.trim().len() < MIN_REASON_LEN {
            return Err(ServiceError::ReasonTooShort);
        }

        let tx = self.transaction_dao.use_transaction(tx).await?;
        // The target user must exist; EntityNotFound surfaces otherwise.
        self.user_service
            .get(correction.user_id, Authentication::Full, tx.clone().into())
            .await?;

        let mut correction = correction.to_owned();
        correction.id = self
            .uuid_service
            .new_uuid("overtime_correction_service::create id");
        correction.version = self
            .uuid_service
            .new_uuid("overtime_correction_service::create version");
        correction.created = Some(self.clock_service.date_time_now());

        let entity = dao::overtime_correction::OvertimeCorrectionEntity::try_from(&correction)?;
        self.overtime_correction_dao
            .create(&entity, "overtime_correction_service::create", tx.clone())
            .await?;

        self.overtime_service
            .rebuild_month(
                correction.user_id,
                KontoMonth::from_date(correction.date),
                Authentication::Full,
                tx.clone().into(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(correction)
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
            .overtime_correction_dao
            .find_by_id(id, tx.clone())
            .await?
            .filter(|entity| entity.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(id))?;

        entity.deleted = Some(self.clock_service.date_time_now());
        self.overtime_correction_dao
            .update(&entity, "overtime_correction_service::delete", tx.clone())
            .await?;

        self.overtime_service
            .rebuild_month(
                entity.user_id,
                KontoMonth::from_date(entity.date),
                Authentication::Full,
                tx.clone().into(),
            )
            .await?;

        self.transaction_dao.commit(tx).await?;
        Ok(())
    }
}
