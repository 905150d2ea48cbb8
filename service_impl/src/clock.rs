use service::clock::ClockService;
use time::OffsetDateTime;
use time_tz::{timezones, OffsetDateTimeExt, Tz};

/// Clock resolving "now" in the configured civil time zone.
pub struct ClockServiceImpl {
    timezone: &'static Tz,
}

impl ClockServiceImpl {
    pub fn new(timezone_name: &str) -> Option<Self> {
        timezones::get_by_name(timezone_name).map(|timezone| Self { timezone })
    }

    pub fn utc() -> Self {
        Self {
            timezone: timezones::db::UTC,
        }
    }
}

impl ClockService for ClockServiceImpl {
    fn today(&self) -> time::Date {
        OffsetDateTime::now_utc().to_timezone(self.timezone).date()
    }

    fn date_time_now(&self) -> time::PrimitiveDateTime {
        let now = OffsetDateTime::now_utc().to_timezone(self.timezone);
        time::PrimitiveDateTime::new(now.date(), now.time())
    }
}
