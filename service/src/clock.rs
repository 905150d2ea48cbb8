use mockall::automock;

/// Injectable time source.  `today` resolves the civil date in the
/// configured time zone, which bounds current-month rebuild windows.
#[automock]
pub trait ClockService {
    fn today(&self) -> time::Date;
    fn date_time_now(&self) -> time::PrimitiveDateTime;
}
