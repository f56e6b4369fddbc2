use chrono::{DateTime, Duration, NaiveDate, NaiveTime, ParseResult, TimeZone, Utc};

/// Parse a date string and ensure it is in UTC. Accepts full RFC 3339
/// timestamps as well as bare `YYYY-MM-DD` dates.
pub fn parse_to_utc(date_string: &str) -> ParseResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_string) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(date_string, "%Y-%m-%d")?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Zero out the time-of-day component.
pub fn midnight(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.date_naive().and_time(NaiveTime::MIN))
}

/// The last representable second of the given calendar day (23:59:59).
pub fn end_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    midnight(date) + Duration::seconds(86_399)
}

pub fn today_utc() -> DateTime<Utc> {
    midnight(Utc::now())
}

/// Every calendar day from `start_date` to `end_date` inclusive, normalized
/// to midnight. An inverted range yields no days.
pub fn date_range(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let start = midnight(start_date);
    let end = midnight(end_date);

    let num_days = (end - start).num_days();
    if num_days < 0 {
        return Vec::new();
    }
    (0..=num_days).map(|x| start + Duration::days(x)).collect()
}
