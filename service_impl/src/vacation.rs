use crate::gen_service_impl;

use async_trait::async_trait;
use dao::{
    absence::{AbsenceDao, AbsenceStatusEntity, AbsenceTypeEntity},
    user::UserDao,
    vacation_balance::{VacationBalanceDao, VacationBalanceEntity},
    TransactionDao,
};
use service::{
    config::{ConfigService, VacationCarryoverPolicy},
    permission::{Authentication, ADMIN_PRIVILEGE},
    user::UserService,
    vacation::{VacationBalance, VacationService},
    PermissionService, ServiceError,
};
use tokio::join;
use uuid::Uuid;

gen_service_impl! {
    struct VacationServiceImpl: VacationService = VacationServiceDeps {
        VacationBalanceDao: VacationBalanceDao<Transaction = Self::Transaction> = vacation_balance_dao,
        AbsenceDao: AbsenceDao<Transaction = Self::Transaction> = absence_dao,
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        UserService: UserService<Context = Self::Context, Transaction = Self::Transaction> = user_service,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        ConfigService: ConfigService = config_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

/// Vacation days of a year in the given status, summed over absence rows.
fn vacation_days_in_year(
    absences: &[dao::absence::AbsenceEntity],
    year: i32,
    status: AbsenceStatusEntity,
) -> f32 {
    absences
        .iter()
        .filter(|absence| absence.deleted.is_none())
        .filter(|absence| absence.absence_type == AbsenceTypeEntity::Vacation)
        .filter(|absence| absence.status == status)
        .filter(|absence| absence.start_date.year() == year)
        .map(|absence| absence.days)
        .sum()
}

impl<Deps: VacationServiceDeps> VacationServiceImpl<Deps> {
    async fn load_or_init(
        &self,
        user: &dao::user::UserEntity,
        year: i32,
        tx: Deps::Transaction,
    ) -> Result<VacationBalanceEntity, ServiceError> {
        if let Some(stored) = self
            .vacation_balance_dao
            .find_by_user_and_year(user.id, year, tx.clone())
            .await?
        {
            return Ok(stored);
        }

        let carryover = match self
            .vacation_balance_dao
            .find_by_user_and_year(user.id, year - 1, tx.clone())
            .await?
        {
            Some(previous) => {
                let taken = vacation_days_in_year(
                    &self.absence_dao.find_by_user(user.id, tx.clone()).await?,
                    year - 1,
                    AbsenceStatusEntity::Approved,
                );
                let remaining = (previous.entitlement + previous.carryover - taken).max(0.0);
                match self.config_service.get_config().await?.vacation_carryover_policy {
                    VacationCarryoverPolicy::Capped5 => remaining.min(5.0),
                    VacationCarryoverPolicy::Unlimited => remaining,
                }
            }
            None => 0.0,
        };

        let entity = VacationBalanceEntity {
            user_id: user.id,
            year,
            entitlement: user.vacation_days_per_year as f32,
            carryover,
        };
        self.vacation_balance_dao
            .upsert(&entity, "vacation_service::init", tx)
            .await?;
        Ok(entity)
    }
}

#[async_trait]
impl<Deps: VacationServiceDeps> VacationService for VacationServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn balance_for_year(
        &self,
        user_id: Uuid,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<VacationBalance, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let (admin_permission, self_permission) = join!(
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context.clone()),
            self.user_service
                .verify_user_is(user_id, context, tx.clone().into()),
        );
        admin_permission.or(self_permission)?;

        let user = self
            .user_dao
            .find_by_id(user_id, tx.clone())
            .await?
            .filter(|user| user.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(user_id))?;

        let stored = self.load_or_init(&user, year, tx.clone()).await?;
        let absences = self.absence_dao.find_by_user(user_id, tx.clone()).await?;
        let taken = vacation_days_in_year(&absences, year, AbsenceStatusEntity::Approved);
        let pending = vacation_days_in_year(&absences, year, AbsenceStatusEntity::Pending);

        self.transaction_dao.commit(tx).await?;
        Ok(VacationBalance {
            user_id,
            year,
            entitlement: stored.entitlement,
            carryover: stored.carryover,
            taken,
            pending,
        })
    }

    async fn set_carryover(
        &self,
        user_id: Uuid,
        year: i32,
        carryover: f32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        let (full, admin_permission) = join!(
            self.permission_service
                .check_only_full_authentication(context.clone()),
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context),
        );
        full.or(admin_permission)?;

        let tx = self.transaction_dao.use_transaction(tx).await?;
        let user = self
            .user_dao
            .find_by_id(user_id, tx.clone())
            .await?
            .filter(|user| user.deleted.is_none())
            .ok_or(ServiceError::EntityNotFound(user_id))?;
        let entitlement = self
            .vacation_balance_dao
            .find_by_user_and_year(user_id, year, tx.clone())
            .await?
            .map(|stored| stored.entitlement)
            .unwrap_or(user.vacation_days_per_year as f32);
        self.vacation_balance_dao
            .upsert(
                &VacationBalanceEntity {
                    user_id,
                    year,
                    entitlement,
                    carryover,
                },
                "vacation_service::set_carryover",
                tx.clone(),
            )
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(())
    }
}
