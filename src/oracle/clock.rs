//! Shanghai Gold Exchange trading calendar
//!
//! Pure classification of an instant as open or closed. The current time is
//! read through [`TimeSource`] so tests can pin arbitrary instants.
//!
//! Weekly schedule (Asia/Shanghai):
//! - Day session 09:00-11:30 and 13:30-15:30
//! - Night session 20:00 until 02:30 of the next day
//! - No night session rolls into Monday; Friday's night session ends Saturday 02:30
//!
//! All window edges use strict comparisons: 02:30:00 itself is still open,
//! as is 11:30:00 and 15:30:00.

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::{Asia::Shanghai, Tz};
use std::fmt;

/// Provides "now" in the exchange timezone
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&Shanghai)
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedTime(pub DateTime<Tz>);

impl FixedTime {
    /// Pin a local Shanghai wall-clock time
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Shanghai
            .with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}

/// Why the exchange is closed at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    /// Sunday, or Saturday after the Friday night session
    Weekend,
    /// Monday before the day session
    MondayPreOpen,
    /// Between the night session close and the day session open
    OvernightGap,
    /// 11:30-13:30
    MiddayBreak,
    /// 15:30-20:00
    EveningGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    Closed(ClosedReason),
}

impl MarketStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, MarketStatus::Closed(_))
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Open => write!(f, "open"),
            MarketStatus::Closed(reason) => write!(f, "closed ({:?})", reason),
        }
    }
}

fn hm(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap_or_default()
}

fn between(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    time > start && time < end
}

/// Classify a local Shanghai weekday and time of day
pub fn classify(weekday: Weekday, time: NaiveTime) -> MarketStatus {
    match weekday {
        Weekday::Sun => return MarketStatus::Closed(ClosedReason::Weekend),
        Weekday::Sat => {
            return if time > hm(2, 30) {
                MarketStatus::Closed(ClosedReason::Weekend)
            } else {
                MarketStatus::Open
            };
        }
        Weekday::Mon => {
            if time < hm(9, 0) {
                return MarketStatus::Closed(ClosedReason::MondayPreOpen);
            }
        }
        _ => {
            if between(time, hm(2, 30), hm(9, 0)) {
                return MarketStatus::Closed(ClosedReason::OvernightGap);
            }
        }
    }

    if between(time, hm(11, 30), hm(13, 30)) {
        return MarketStatus::Closed(ClosedReason::MiddayBreak);
    }
    if between(time, hm(15, 30), hm(20, 0)) {
        return MarketStatus::Closed(ClosedReason::EveningGap);
    }
    MarketStatus::Open
}

/// Market calendar bound to a time source
pub struct MarketClock {
    source: Box<dyn TimeSource>,
}

impl MarketClock {
    pub fn new(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    pub fn system() -> Self {
        Self::new(SystemTime)
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.source.now()
    }

    /// Status of `now`, converted to Shanghai local time first
    pub fn status_at<Z: TimeZone>(now: &DateTime<Z>) -> MarketStatus {
        let local = now.with_timezone(&Shanghai);
        classify(local.weekday(), local.time())
    }

    pub fn is_closed_at<Z: TimeZone>(now: &DateTime<Z>) -> bool {
        Self::status_at(now).is_closed()
    }

    pub fn status(&self) -> MarketStatus {
        Self::status_at(&self.now())
    }

    pub fn is_closed(&self) -> bool {
        self.status().is_closed()
    }
}

impl Default for MarketClock {
    fn default() -> Self {
        Self::system()
    }
}
