use crate::RecordError;
use chrono::{NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// A duration expressed as hours/minutes/seconds/microseconds.
///
/// Overflowing microseconds, seconds and minutes normalize into the next
/// larger unit; hours are unbounded. The bounded wall-clock counterpart is
/// [`crate::Time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSpan {
    hours: u64,
    minutes: u32,
    seconds: u32,
    microseconds: u32,
}

impl TimeSpan {
    pub fn new(hours: u64, minutes: u64, seconds: u64, microseconds: u64) -> Self {
        let mut hours = hours;
        let mut minutes = minutes;
        let mut seconds = seconds;
        let mut microseconds = microseconds;

        if microseconds > 999_999 {
            seconds += microseconds / 1_000_000;
            microseconds %= 1_000_000;
        }

        if seconds > 59 {
            minutes += seconds / 60;
            seconds %= 60;
        }

        if minutes > 59 {
            hours += minutes / 60;
            minutes %= 60;
        }

        Self {
            hours,
            minutes: minutes as u32,
            seconds: seconds as u32,
            microseconds: microseconds as u32,
        }
    }

    pub fn from_secs(seconds: u64) -> Self {
        Self::new(0, 0, seconds, 0)
    }

    /// Fractional seconds keep microsecond precision.
    pub fn from_secs_f64(seconds: f64) -> Result<Self, RecordError> {
        if !seconds.is_finite() {
            return Err(RecordError::invalid_format("seconds must be a finite number"));
        }

        if seconds < 0.0 {
            return Err(RecordError::out_of_range("seconds must be greater than or equal to zero"));
        }

        let whole = seconds.trunc() as u64;
        let microseconds = (seconds.fract() * 1_000_000.0) as u64;

        Ok(Self::new(0, 0, whole, microseconds))
    }

    pub fn from_micros(microseconds: u64) -> Self {
        Self::new(0, 0, 0, microseconds)
    }

    /// Extracts the hour/minute/second components only.
    pub fn from_date_time(date_time: &NaiveDateTime) -> Self {
        Self::new(
            u64::from(date_time.hour()),
            u64::from(date_time.minute()),
            u64::from(date_time.second()),
            0,
        )
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn microseconds(&self) -> u32 {
        self.microseconds
    }

    pub fn total_minutes(&self) -> u64 {
        self.hours * 60 + u64::from(self.minutes)
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn total_micros(&self) -> u64 {
        self.total_seconds() * 1_000_000 + u64::from(self.microseconds)
    }
}

/// Parses `H[:MM[:SS[.ffffff]]]`; every component is a run of decimal digits.
impl FromStr for TimeSpan {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::invalid_format(format!("failed to parse '{s}' as a time span"));

        let (clock, fraction) = match s.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (s, None),
        };

        let mut parts = [0u64; 3];
        let mut count = 0;

        for part in clock.split(':') {
            if count == 3 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }

            parts[count] = part.parse().map_err(|_| invalid())?;
            count += 1;
        }

        let microseconds = match fraction {
            Some(digits) => {
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }

                parse_fraction_micros(digits)
            }
            None => 0,
        };

        Ok(Self::new(parts[0], parts[1], parts[2], microseconds))
    }
}

/// Interprets the digits as a decimal fraction of a second, truncated to
/// microsecond precision.
fn parse_fraction_micros(digits: &str) -> u64 {
    let mut micros = 0u64;

    for (i, b) in digits.bytes().take(6).enumerate() {
        micros += u64::from(b - b'0') * 10u64.pow(5 - i as u32);
    }

    micros
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:06}",
            self.hours, self.minutes, self.seconds, self.microseconds
        )
    }
}
