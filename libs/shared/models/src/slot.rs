use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of one bookable slot.
pub const SLOT_MINUTES: u32 = 30;

const TIME_LABEL_FORMAT: &str = "%I:%M %p";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("Invalid slot date: {0}")]
    InvalidDate(String),

    #[error("Invalid slot time: {0}")]
    InvalidTime(String),

    #[error("Invalid working window: {0}")]
    InvalidWindow(String),
}

// ==============================================================================
// SLOT DATE
// ==============================================================================

/// Calendar date of a slot. Rendered as `day_month_year` without padding,
/// e.g. `5_6_2024`, which is the key format of a doctor's booked-slots map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotDate(NaiveDate);

impl SlotDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Human form used on receipts, e.g. `5 Jun 2024`.
    pub fn human(&self) -> String {
        self.0.format("%-d %b %Y").to_string()
    }
}

impl From<NaiveDate> for SlotDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for SlotDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.0.day(), self.0.month(), self.0.year())
    }
}

impl FromStr for SlotDate {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotParseError::InvalidDate(s.to_string());

        let mut parts = s.trim().split('_');
        let (Some(day), Some(month), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let day: u32 = day.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        Self::from_ymd(year, month, day).ok_or_else(invalid)
    }
}

impl Serialize for SlotDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ==============================================================================
// SLOT TIME
// ==============================================================================

/// Start time of a slot. Rendered as a 12-hour label, e.g. `10:00 AM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Builds a time from minutes since midnight; `None` at or past 24:00.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::from_hm(minutes / 60, minutes % 60)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn is_slot_aligned(&self) -> bool {
        self.0.second() == 0
            && self.0.nanosecond() == 0
            && self.0.minute() % SLOT_MINUTES == 0
    }
}

impl From<NaiveTime> for SlotTime {
    fn from(time: NaiveTime) -> Self {
        Self(time)
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_LABEL_FORMAT))
    }
}

impl FromStr for SlotTime {
    type Err = SlotParseError;

    /// Accepts the canonical `10:00 AM` label (any case) and 24-hour `14:30`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, TIME_LABEL_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map(Self)
            .map_err(|_| SlotParseError::InvalidTime(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ==============================================================================
// WORKING WINDOW
// ==============================================================================

/// Daily bounds for slot generation: `[start, end)`, both on slot boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkingWindow")]
pub struct WorkingWindow {
    start: SlotTime,
    end: SlotTime,
}

#[derive(Deserialize)]
struct RawWorkingWindow {
    start: SlotTime,
    end: SlotTime,
}

impl TryFrom<RawWorkingWindow> for WorkingWindow {
    type Error = SlotParseError;

    fn try_from(raw: RawWorkingWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl WorkingWindow {
    pub fn new(start: SlotTime, end: SlotTime) -> Result<Self, SlotParseError> {
        if !start.is_slot_aligned() || !end.is_slot_aligned() {
            return Err(SlotParseError::InvalidWindow(format!(
                "{} - {} is not on {}-minute boundaries",
                start, end, SLOT_MINUTES
            )));
        }
        if start >= end {
            return Err(SlotParseError::InvalidWindow(format!(
                "start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> SlotTime {
        self.start
    }

    pub fn end(&self) -> SlotTime {
        self.end
    }

    pub fn contains(&self, time: SlotTime) -> bool {
        self.start <= time && time < self.end
    }

    /// True when `time` is a valid slot start inside the window.
    pub fn admits(&self, time: SlotTime) -> bool {
        time.is_slot_aligned() && self.contains(time)
    }
}

impl Default for WorkingWindow {
    fn default() -> Self {
        Self {
            start: SlotTime(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()),
            end: SlotTime(NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default()),
        }
    }
}
