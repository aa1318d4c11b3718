use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};

/// Number of cells in a month grid: six
/// full weeks, always.
pub const MONTH_GRID_DAYS: i64 = 42;
pub const WEEK_DAYS: i64 = 7;

pub const DATETIME_LOCAL_FORMAT: &str =
  "%Y-%m-%dT%H:%M";

#[must_use]
pub fn now_local() -> NaiveDateTime {
  Local::now().naive_local()
}

#[must_use]
pub fn today() -> NaiveDate {
  now_local().date()
}

/// Compares the wall-clock calendar
/// fields only; time of day is ignored.
#[must_use]
pub fn is_same_day<A, B>(
  a: &A,
  b: &B
) -> bool
where
  A: Datelike,
  B: Datelike
{
  a.year() == b.year()
    && a.month() == b.month()
    && a.day() == b.day()
}

#[must_use]
pub fn is_today<D: Datelike>(
  d: &D
) -> bool {
  is_same_day(d, &now_local())
}

/// The 42-day month grid for the month
/// containing `anchor`. Starts on the
/// Sunday on or before the 1st.
#[must_use]
pub fn calendar_grid<D: Datelike>(
  anchor: &D
) -> Vec<NaiveDate> {
  let first = first_day_of_month(
    anchor.year(),
    anchor.month()
  );
  let grid_start = start_of_week(first);
  (0..MONTH_GRID_DAYS)
    .map(|offset| {
      add_days(grid_start, offset)
    })
    .collect()
}

#[must_use]
pub fn to_datetime_local(
  dt: &NaiveDateTime
) -> String {
  dt.format(DATETIME_LOCAL_FORMAT)
    .to_string()
}

/// Parses `YYYY-MM-DDTHH:mm`. A missing
/// time part means midnight, a missing
/// minute means `:00`.
pub fn parse_datetime_local(
  raw: &str
) -> anyhow::Result<NaiveDateTime> {
  let trimmed = raw.trim();
  let (date_part, time_part) =
    match trimmed.split_once('T') {
      | Some((date, time))
        if !time.trim().is_empty() =>
      {
        (date, time)
      }
      | Some((date, _)) => {
        (date, "00:00")
      }
      | None => (trimmed, "00:00")
    };

  let mut date_fields =
    date_part.split('-');
  let year = parse_field::<i32>(
    date_fields.next(),
    "year",
    raw
  )?;
  let month = parse_field::<u32>(
    date_fields.next(),
    "month",
    raw
  )?;
  let day = parse_field::<u32>(
    date_fields.next(),
    "day",
    raw
  )?;
  if date_fields.next().is_some() {
    return Err(anyhow!(
      "unexpected trailing date field \
       in {raw:?}"
    ));
  }

  let mut time_fields =
    time_part.split(':');
  let hour = parse_field::<u32>(
    time_fields.next(),
    "hour",
    raw
  )?;
  let minute = match time_fields.next()
  {
    | Some(value) => {
      parse_field::<u32>(
        Some(value),
        "minute",
        raw
      )?
    }
    | None => 0
  };

  let date = NaiveDate::from_ymd_opt(
    year, month, day
  )
  .ok_or_else(|| {
    anyhow!(
      "no such calendar date in \
       {raw:?}"
    )
  })?;
  let time = NaiveTime::from_hms_opt(
    hour, minute, 0
  )
  .ok_or_else(|| {
    anyhow!(
      "no such wall-clock time in \
       {raw:?}"
    )
  })?;

  Ok(date.and_time(time))
}

/// Accepts `YYYY-MM-DD` as well as the
/// full date-time form and keeps the
/// date.
pub fn parse_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  parse_datetime_local(raw)
    .map(|dt| dt.date())
}

fn parse_field<T>(
  raw: Option<&str>,
  name: &str,
  input: &str
) -> anyhow::Result<T>
where
  T: std::str::FromStr,
  T::Err: std::error::Error
    + Send
    + Sync
    + 'static
{
  let value = raw
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .ok_or_else(|| {
      anyhow!(
        "missing {name} in {input:?}"
      )
    })?;
  value.parse::<T>().with_context(
    || {
      format!(
        "invalid {name} {value:?} in \
         {input:?}"
      )
    }
  )
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

/// First day of the month `months` away
/// from the month containing `date`.
#[must_use]
pub fn first_day_of_shifted_month(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  first_day_of_month(
    year,
    month as u32
  )
}

#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

/// Sunday on or before `day`.
#[must_use]
pub fn start_of_week(
  day: NaiveDate
) -> NaiveDate {
  let offset = day
    .weekday()
    .num_days_from_sunday()
    as i64;
  add_days(day, -offset)
}

/// Persisted form of event date-times:
/// naive local `YYYY-MM-DDTHH:MM:SS`
/// with optional fraction. Offset-bearing
/// RFC 3339 strings written by older
/// hosts are read back as local time.
pub mod local_datetime_serde {
  use chrono::NaiveDateTime;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  const FORMAT: &str =
    "%Y-%m-%dT%H:%M:%S%.f";

  pub fn serialize<S>(
    dt: &NaiveDateTime,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &dt.format(FORMAT).to_string()
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDateTime, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_persisted(&raw)
      .map_err(serde::de::Error::custom)
  }
}

fn parse_persisted(
  raw: &str
) -> anyhow::Result<NaiveDateTime> {
  if let Ok(naive) =
    NaiveDateTime::parse_from_str(
      raw,
      "%Y-%m-%dT%H:%M:%S%.f"
    )
  {
    return Ok(naive);
  }

  if let Ok(with_offset) =
    DateTime::parse_from_rfc3339(raw)
  {
    return Ok(
      with_offset
        .with_timezone(&Local)
        .naive_local()
    );
  }

  parse_datetime_local(raw).with_context(
    || {
      format!(
        "unrecognised persisted \
         date-time {raw:?}"
      )
    }
  )
}
