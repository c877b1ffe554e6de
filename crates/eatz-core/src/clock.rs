use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::anyhow;
use chrono::{
  DateTime,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::Config;
use crate::error::ParseError;

const TIMEZONE_CONFIG_FILE: &str =
  "eatz-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "EATZ_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "EATZ_TIME_CONFIG";
const LOCAL_ZONE: &str = "local";

/// Events carry no offset; their wall
/// times are read in this zone unless
/// configured otherwise.
pub const DEFAULT_TIMEZONE: &str =
  "America/New_York";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// A wall-clock time on the 24-hour
/// clock.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct ClockTime {
  pub hour:   u32,
  pub minute: u32
}

impl ClockTime {
  /// `H:MM AM|PM`, the form stored in
  /// event records.
  #[must_use]
  pub fn to_12h_string(&self) -> String {
    let (hour, modifier) =
      match self.hour {
        | 0 => (12, "AM"),
        | 1..=11 => (self.hour, "AM"),
        | 12 => (12, "PM"),
        | _ => (self.hour - 12, "PM")
      };
    format!(
      "{hour}:{:02} {modifier}",
      self.minute
    )
  }
}

/// Parses `"<h>:<mm> <AM|PM>"` with `h`
/// in 1..=12.
pub fn parse_clock_time(
  input: &str
) -> Result<ClockTime, ParseError> {
  let token = input.trim();
  if token.is_empty() {
    return Err(ParseError::Empty);
  }

  let Some((time, modifier)) = token
    .split_once(char::is_whitespace)
  else {
    return Err(
      ParseError::MissingModifier(
        token.to_string()
      )
    );
  };

  let modifier = modifier.trim();
  let is_pm = match modifier
    .to_ascii_uppercase()
    .as_str()
  {
    | "AM" => false,
    | "PM" => true,
    | _ => {
      return Err(
        ParseError::UnknownModifier {
          input:    token.to_string(),
          modifier: modifier.to_string()
        }
      );
    }
  };

  let (raw_hour, raw_minute) = time
    .split_once(':')
    .ok_or_else(|| {
      ParseError::MissingColon(
        token.to_string()
      )
    })?;

  if raw_hour.is_empty()
    || raw_hour.len() > 2
    || !raw_hour
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    return Err(ParseError::InvalidHour(
      token.to_string()
    ));
  }
  let hour: u32 =
    raw_hour.parse().map_err(|_| {
      ParseError::InvalidHour(
        token.to_string()
      )
    })?;

  if raw_minute.len() != 2
    || !raw_minute
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    return Err(
      ParseError::InvalidMinute(
        token.to_string()
      )
    );
  }
  let minute: u32 =
    raw_minute.parse().map_err(|_| {
      ParseError::InvalidMinute(
        token.to_string()
      )
    })?;
  if minute > 59 {
    return Err(
      ParseError::InvalidMinute(
        token.to_string()
      )
    );
  }

  if !(1..=12).contains(&hour) {
    return Err(
      ParseError::HourOutOfRange {
        input: token.to_string(),
        hour
      }
    );
  }

  let hour = match (hour, is_pm) {
    | (12, false) => 0,
    | (12, true) => 12,
    | (h, true) => h + 12,
    | (h, false) => h
  };

  Ok(ClockTime {
    hour,
    minute
  })
}

pub fn parse_event_date(
  input: &str
) -> Result<NaiveDate, ParseError> {
  NaiveDate::parse_from_str(
    input.trim(),
    "%Y-%m-%d"
  )
  .map_err(|_| {
    ParseError::InvalidDate(
      input.to_string()
    )
  })
}

/// Combines an event date and clock
/// string into an instant, reading the
/// wall time in `tz`.
#[tracing::instrument(skip(tz), fields(zone = tz.name()))]
pub fn make_instant(
  date: &str,
  time: &str,
  tz: &Tz
) -> Result<DateTime<Tz>, ParseError> {
  let day = parse_event_date(date)?;
  let clock = parse_clock_time(time)?;
  let naive = day
    .and_hms_opt(
      clock.hour,
      clock.minute,
      0
    )
    .ok_or_else(|| {
      ParseError::InvalidMinute(
        time.to_string()
      )
    })?;

  match tz.from_local_datetime(&naive)
  {
    | LocalResult::Single(dt) => Ok(dt),
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        first = %first,
        second = %second,
        "ambiguous local event time; using earliest"
      );
      Ok(first.min(second))
    }
    | LocalResult::None => {
      Err(
        ParseError::NonexistentLocalTime {
          date: date.to_string(),
          time: time.to_string(),
          zone: tz.name().to_string()
        }
      )
    }
  }
}

/// Local midnight of `now`'s day, or the
/// first valid wall time after it when
/// midnight falls in a DST gap.
#[must_use]
pub fn start_of_day(
  now: &DateTime<Tz>
) -> Option<DateTime<Tz>> {
  let tz = now.timezone();
  let day = now.date_naive();
  (0..3).find_map(|hour| {
    let naive =
      day.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive)
      .earliest()
  })
}

/// Resolves the `--now` override:
/// `now`, RFC3339, or a wall time
/// `YYYY-MM-DD HH:MM` in `tz`.
#[tracing::instrument(skip(tz))]
pub fn parse_now(
  input: &str,
  tz: &Tz
) -> anyhow::Result<DateTime<Tz>> {
  let token = input.trim();
  if token.eq_ignore_ascii_case("now") {
    return Ok(
      Utc::now().with_timezone(tz)
    );
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(tz));
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| {
          anyhow!(
            "{token} does not exist \
             in timezone {}",
            tz.name()
          )
        });
    }
  }

  Err(anyhow!(
    "unrecognized --now value: \
     {input} (expected now, RFC3339, \
     YYYY-MM-DD HH:MM or \
     YYYY-MM-DDTHH:MM)"
  ))
}

/// Picks the zone event wall times are
/// read in: `EATZ_TIMEZONE`, the rc
/// `timezone` key, a TOML time config
/// file, then [`DEFAULT_TIMEZONE`].
pub fn resolve_timezone(
  cfg: &Config
) -> Tz {
  pick_timezone(
    std::env::var(TIMEZONE_ENV_VAR)
      .ok(),
    cfg.get("timezone"),
    timezone_config_path()
  )
}

fn pick_timezone(
  env_value: Option<String>,
  cfg_value: Option<String>,
  file: Option<PathBuf>
) -> Tz {
  if let Some(raw) = env_value
    && let Some(tz) =
      parse_timezone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(raw) = cfg_value
    && let Some(tz) =
      parse_timezone(&raw, "rc.timezone")
  {
    return tz;
  }

  if let Some(path) = file
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "DEFAULT_TIMEZONE"
  )
  .unwrap_or_else(|| {
    tracing::error!(
      "failed to parse fallback \
       timezone; using UTC"
    );
    chrono_tz::UTC
  })
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  if trimmed
    .eq_ignore_ascii_case(LOCAL_ZONE)
  {
    return host_timezone(source);
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured event timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn host_timezone(
  source: &str
) -> Option<Tz> {
  match iana_time_zone::get_timezone()
  {
    | Ok(name) => {
      match name.parse::<Tz>() {
        | Ok(tz) => {
          tracing::info!(
            source,
            timezone = %name,
            "using host timezone"
          );
          Some(tz)
        }
        | Err(err) => {
          tracing::error!(
            source,
            timezone = %name,
            error = %err,
            "host timezone is not a known IANA id; using UTC"
          );
          Some(chrono_tz::UTC)
        }
      }
    }
    | Err(err) => {
      tracing::error!(
        source,
        error = %err,
        "failed to read host timezone; using UTC"
      );
      Some(chrono_tz::UTC)
    }
  }
}
