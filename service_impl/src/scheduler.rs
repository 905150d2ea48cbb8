use crate::gen_service_impl;
use async_trait::async_trait;
use chrono::Utc;
use service::{
    clock::ClockService, permission::Authentication, rollover::RolloverService,
    scheduler::SchedulerService, ServiceError,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron::{Job, Scheduler};
use tracing::{error, info};

gen_service_impl! {
    struct SchedulerServiceImpl: service::scheduler::SchedulerService = SchedulerServiceDeps {
        RolloverService: service::rollover::RolloverService = rollover_service,
        ClockService: service::clock::ClockService = clock_service,
    }
    ; custom_fields {
        scheduler: Arc<Mutex<Scheduler<Utc>>> = scheduler,
        last_rollover_year: Arc<Mutex<Option<i32>>> = last_rollover_year
    }
}

impl<Deps: SchedulerServiceDeps> SchedulerServiceImpl<Deps> {
    pub fn new(
        rollover_service: Arc<Deps::RolloverService>,
        clock_service: Arc<Deps::ClockService>,
    ) -> Self {
        let scheduler = Arc::new(Mutex::new(Scheduler::utc()));

        Self {
            scheduler,
            last_rollover_year: Arc::new(Mutex::new(None)),
            rollover_service,
            clock_service,
        }
    }

    /// The cron ticks once per UTC hour; the injected clock decides in the
    /// configured zone whether the night of January 1 has arrived.
    async fn schedule_year_end_rollover(&self, cron: &'static str) -> Result<(), ServiceError>
    where
        Deps::RolloverService: 'static,
        Deps::ClockService: 'static,
    {
        let mut sched = self.scheduler.lock().await;

        let rollover_service = self.rollover_service.clone();
        let clock_service = self.clock_service.clone();
        let last_rollover_year = self.last_rollover_year.clone();

        sched.add(Job::new(cron, move || {
            let rollover_service = rollover_service.clone();
            let clock_service = clock_service.clone();
            let last_rollover_year = last_rollover_year.clone();
            async move {
                let now = clock_service.date_time_now();
                if now.month() != time::Month::January || now.day() != 1 || now.hour() != 0 {
                    return;
                }
                let closed_year = now.year() - 1;
                if *last_rollover_year.lock().await == Some(closed_year) {
                    return;
                }
                match rollover_service
                    .perform(closed_year, Authentication::Full, None)
                    .await
                {
                    Err(e) => error!("Year-end rollover for {closed_year} failed: {e:?}"),
                    Ok(entries) => {
                        *last_rollover_year.lock().await = Some(closed_year);
                        info!(
                            "Year-end rollover for {closed_year} wrote carry-overs for {} users",
                            entries.len()
                        )
                    }
                }
            }
        }));

        info!("Scheduled year-end rollover with cron expression: {cron}");
        Ok(())
    }
}

#[async_trait]
impl<Deps: SchedulerServiceDeps> SchedulerService for SchedulerServiceImpl<Deps>
where
    Deps::RolloverService: 'static,
    Deps::ClockService: 'static,
{
    type Context = Deps::Context;

    async fn start(&self) -> Result<(), ServiceError> {
        // Minute 5 of every UTC hour; only the tick falling into hour zero
        // of January 1 in the configured zone performs the rollover.
        self.schedule_year_end_rollover("0 5 * * * *").await?;
        Ok(())
    }
}
