//! Rollover timing
//!
//! Everything here is pure: given the current instant and the sink's
//! [`RotationState`], decide whether a rollover is due and when the next one
//! happens. Midnight and weekday rollovers follow the wall clock of the
//! configured zone, including DST transitions.

use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Rollover unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum When {
    Seconds,
    Minutes,
    Hours,
    Days,
    /// Roll over at local midnight
    #[default]
    Midnight,
    /// Roll over at the local midnight that ends the given weekday (0 = Monday)
    Weekday(u8),
}

impl When {
    /// Length of one unit in seconds
    pub fn unit_seconds(&self) -> i64 {
        match self {
            When::Seconds => 1,
            When::Minutes => 60,
            When::Hours => 60 * 60,
            When::Days | When::Midnight => SECONDS_PER_DAY,
            When::Weekday(_) => 7 * SECONDS_PER_DAY,
        }
    }

    /// strftime format used to name historical files for this unit
    pub fn date_format(&self) -> &'static str {
        match self {
            When::Seconds => "%Y-%m-%d_%H-%M-%S",
            When::Minutes => "%Y-%m-%d_%H-%M",
            When::Hours => "%Y-%m-%d_%H",
            When::Days | When::Midnight | When::Weekday(_) => "%Y-%m-%d",
        }
    }

    /// Whether the boundary follows the local wall clock
    pub fn is_calendar(&self) -> bool {
        matches!(self, When::Midnight | When::Weekday(_))
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            When::Seconds => f.write_str("S"),
            When::Minutes => f.write_str("M"),
            When::Hours => f.write_str("H"),
            When::Days => f.write_str("D"),
            When::Midnight => f.write_str("MIDNIGHT"),
            When::Weekday(day) => write!(f, "W{}", day),
        }
    }
}

impl FromStr for When {
    type Err = LoggerError;

    /// Accepts `S`, `M`, `H`, `D`, `MIDNIGHT` and `W0`..`W6`, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "S" => Ok(When::Seconds),
            "M" => Ok(When::Minutes),
            "H" => Ok(When::Hours),
            "D" => Ok(When::Days),
            "MIDNIGHT" => Ok(When::Midnight),
            other => match other.strip_prefix('W').map(str::parse::<u8>) {
                Some(Ok(day)) if day <= 6 => Ok(When::Weekday(day)),
                _ => Err(LoggerError::config(
                    "when",
                    format!("invalid rollover unit '{}'", s),
                )),
            },
        }
    }
}

/// Zone used for wall clock boundaries and historical file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationZone {
    #[default]
    Local,
    Utc,
    Named(Tz),
}

impl RotationZone {
    /// Offset from UTC in seconds at the given instant
    pub fn utc_offset(&self, at: DateTime<Utc>) -> i64 {
        let naive = at.naive_utc();
        let seconds = match self {
            RotationZone::Utc => 0,
            RotationZone::Local => chrono::Local
                .offset_from_utc_datetime(&naive)
                .fix()
                .local_minus_utc(),
            RotationZone::Named(tz) => tz.offset_from_utc_datetime(&naive).fix().local_minus_utc(),
        };
        i64::from(seconds)
    }

    /// Wall clock time in this zone
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.naive_utc() + TimeDelta::seconds(self.utc_offset(at))
    }

    pub fn format(&self, at: DateTime<Utc>, format: &str) -> String {
        self.local_time(at).format(format).to_string()
    }

    /// First instant of `date` on this zone's wall clock
    ///
    /// An ambiguous midnight resolves to its earlier occurrence. A midnight
    /// skipped by a DST gap resolves to the instant the gap starts, which is
    /// the first valid wall time after it (01:00 for a one-hour gap).
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self {
            RotationZone::Utc => Utc.from_utc_datetime(&midnight),
            RotationZone::Local => resolve_wall_time(&chrono::Local, midnight),
            RotationZone::Named(tz) => resolve_wall_time(tz, midnight),
        }
    }
}

fn resolve_wall_time<Z: TimeZone>(zone: &Z, wall: NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(&wall).earliest() {
        Some(at) => at.with_timezone(&Utc),
        None => {
            // inside a gap: read the wall time with the offset in force before it
            let before = zone
                .offset_from_utc_datetime(&(wall - TimeDelta::days(1)))
                .fix()
                .local_minus_utc();
            Utc.from_utc_datetime(&(wall - TimeDelta::seconds(i64::from(before))))
        }
    }
}

impl FromStr for RotationZone {
    type Err = LoggerError;

    /// `local`, `utc`, or an IANA zone name such as `Europe/Berlin`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            z if z.eq_ignore_ascii_case("local") => Ok(RotationZone::Local),
            z if z.eq_ignore_ascii_case("utc") => Ok(RotationZone::Utc),
            name => name
                .parse::<Tz>()
                .map(RotationZone::Named)
                .map_err(|e| LoggerError::config("zone", e.to_string())),
        }
    }
}

/// Mutable rollover bookkeeping owned by one file sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    /// Canonical path of the active file
    pub current_file: PathBuf,
    pub next_rollover_at: DateTime<Utc>,
    /// Boundary at which the active file was opened; names it once archived
    pub period_start: DateTime<Utc>,
    /// Historical files to keep, 0 keeps everything
    pub backup_count: usize,
}

impl RotationState {
    pub fn new(current_file: impl Into<PathBuf>, now: DateTime<Utc>, backup_count: usize) -> Self {
        Self {
            current_file: current_file.into(),
            next_rollover_at: now,
            period_start: now,
            backup_count,
        }
    }
}

/// When to roll over
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use rust_rotating_logger::rotation::{RotationPolicy, RotationState, RotationZone, When};
///
/// let policy = RotationPolicy::new(When::Midnight).with_zone(RotationZone::Utc);
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap();
/// let state = RotationState::new("./log/app.txt", now, 7);
///
/// assert!(policy.is_due(now, &state));
/// let next = policy.compute_next(now, &state);
/// assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub when: When,
    pub interval: u32,
    pub zone: RotationZone,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(When::Midnight)
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new(when: When) -> Self {
        Self {
            when,
            interval: 1,
            zone: RotationZone::Local,
        }
    }

    /// Multiplier for the unit; 0 is treated as 1
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_zone(mut self, zone: RotationZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn interval(&self) -> TimeDelta {
        TimeDelta::seconds(self.when.unit_seconds() * i64::from(self.interval.max(1)))
    }

    pub fn date_format(&self) -> &'static str {
        self.when.date_format()
    }

    /// Historical-name prefix for a period that started at `at`
    pub fn format_period(&self, at: DateTime<Utc>) -> String {
        self.zone.format(at, self.date_format())
    }

    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>, state: &RotationState) -> bool {
        now >= state.next_rollover_at
    }

    /// Next rollover instant, always strictly after `now` and never before
    /// the current `next_rollover_at`
    pub fn compute_next(&self, now: DateTime<Utc>, state: &RotationState) -> DateTime<Utc> {
        let interval = self.interval();

        let next = if self.when.is_calendar() {
            self.next_calendar_boundary(now)
        } else {
            let previous = state.next_rollover_at;
            let candidate = previous + interval;
            if candidate > now {
                candidate
            } else {
                let step = interval.num_seconds();
                let missed = (now - previous).num_seconds() / step + 1;
                step.checked_mul(missed)
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|skip| previous.checked_add_signed(skip))
                    .unwrap_or(now + interval)
            }
        };

        next.max(state.next_rollover_at)
    }

    /// Start of the first qualifying local day after `now`'s local date
    fn next_calendar_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.zone.local_time(now).date();
        let mut days_ahead = 1;

        if let When::Weekday(target) = self.when {
            let weekday = u64::from(today.weekday().num_days_from_monday());
            let target = u64::from(target % 7);
            days_ahead += if weekday < target {
                target - weekday
            } else if weekday > target {
                6 - weekday + target + 1
            } else {
                0
            };
        }

        let period_days = if matches!(self.when, When::Weekday(_)) { 7 } else { 1 };
        let step = period_days * u64::from(self.interval.max(1));
        loop {
            let Some(date) = today.checked_add_days(Days::new(days_ahead)) else {
                return now + self.interval();
            };
            let candidate = self.zone.start_of_day(date);
            if candidate > now {
                return candidate;
            }
            days_ahead += step;
        }
    }
}
