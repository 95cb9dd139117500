use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seconds since the start of the service day.
///
/// Transit feeds describe service that runs past midnight with hours beyond 23
/// (`25:10:00` is 1:10 AM on the following calendar day but still belongs to the
/// same service day), so this is never a calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockTime(u32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock value {0:?}, expected HH:MM:SS")]
pub struct ClockParseError(pub String);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_seconds(seconds: u32) -> Self {
        ClockTime(seconds)
    }

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        ClockTime(hours * 3600 + minutes * 60 + seconds)
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn hours(self) -> u32 {
        self.0 / 3600
    }

    pub fn minutes(self) -> u32 {
        self.0 % 3600 / 60
    }

    pub fn parse(s: &str) -> Result<Self, ClockParseError> {
        let err = || ClockParseError(s.to_owned());
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        if h.is_empty() || m.len() != 2 || sec.len() != 2 {
            return Err(err());
        }
        let all_digits = |x: &str| x.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(h) || !all_digits(m) || !all_digits(sec) {
            return Err(err());
        }
        let hours: u32 = h.parse().map_err(|_| err())?;
        let minutes: u32 = m.parse().map_err(|_| err())?;
        let seconds: u32 = sec.parse().map_err(|_| err())?;
        if minutes >= 60 || seconds >= 60 {
            return Err(err());
        }
        hours
            .checked_mul(3600)
            .and_then(|x| x.checked_add(minutes * 60 + seconds))
            .map(ClockTime)
            .ok_or_else(err)
    }

    /// Formats as `H:MM AM/PM`. Service past midnight wraps around, so `25:10:00`
    /// shows as `1:10 AM`.
    pub fn to_am_pm(self) -> String {
        let within_day = self.0 % 86_400;
        match chrono::NaiveTime::from_num_seconds_from_midnight_opt(within_day, 0) {
            Some(time) => time.format("%-I:%M %p").to_string(),
            // Unreachable after the modulo above.
            None => self.to_string(),
        }
    }
}

/// Always `HH:MM:SS` with at least two hour digits, so that string order matches
/// numeric order for every hour below 100.
impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            self.0 % 3600 / 60,
            self.0 % 60
        )
    }
}

impl std::str::FromStr for ClockTime {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClockTime::parse(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Blank or missing cells are `None`; anything else must be a valid clock value.
pub fn deserialize_optional_clock<'de, D>(deserializer: D) -> Result<Option<ClockTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => ClockTime::parse(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
