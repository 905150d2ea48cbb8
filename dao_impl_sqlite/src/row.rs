//! Shared column codecs: uuids as 16-byte blobs, dates and timestamps as
//! ISO-8601 text.

use dao::DaoError;
use time::format_description::well_known::Iso8601;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use uuid::Uuid;

pub const SCHEMA_SQL: &str = include_str!("schema.sql");

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

pub(crate) fn uuid_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

pub(crate) fn parse_uuid(blob: &[u8]) -> Result<Uuid, DaoError> {
    Ok(Uuid::from_slice(blob)?)
}

pub(crate) fn format_date(date: time::Date) -> Result<String, DaoError> {
    Ok(date.format(DATE_FORMAT)?)
}

pub(crate) fn parse_date(text: &str) -> Result<time::Date, DaoError> {
    Ok(time::Date::parse(text, DATE_FORMAT)?)
}

pub(crate) fn format_time(time: time::Time) -> Result<String, DaoError> {
    Ok(time.format(TIME_FORMAT)?)
}

pub(crate) fn parse_time(text: &str) -> Result<time::Time, DaoError> {
    Ok(time::Time::parse(text, TIME_FORMAT)?)
}

pub(crate) fn format_datetime(date_time: time::PrimitiveDateTime) -> Result<String, DaoError> {
    Ok(date_time.format(&Iso8601::DATE_TIME)?)
}

pub(crate) fn parse_datetime(text: &str) -> Result<time::PrimitiveDateTime, DaoError> {
    Ok(time::PrimitiveDateTime::parse(text, &Iso8601::DATE_TIME)?)
}

pub(crate) fn format_opt_datetime(
    date_time: Option<time::PrimitiveDateTime>,
) -> Result<Option<String>, DaoError> {
    date_time.map(format_datetime).transpose()
}

pub(crate) fn parse_opt_datetime(
    text: Option<&str>,
) -> Result<Option<time::PrimitiveDateTime>, DaoError> {
    text.map(parse_datetime).transpose()
}
