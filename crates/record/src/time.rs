use crate::RecordError;
use chrono::{NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// A wall-clock time of day. Unlike [`crate::TimeSpan`], every component is
/// bounded: hours 0-23, minutes and seconds 0-59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Time {
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, RecordError> {
        if hours > 23 {
            return Err(RecordError::out_of_range("hours must be in the range 0 - 23"));
        }

        if minutes > 59 {
            return Err(RecordError::out_of_range("minutes must be in the range 0 - 59"));
        }

        if seconds > 59 {
            return Err(RecordError::out_of_range("seconds must be in the range 0 - 59"));
        }

        Ok(Self { hours, minutes, seconds })
    }

    pub fn from_secs(total_seconds: u32) -> Result<Self, RecordError> {
        if total_seconds > 86_399 {
            return Err(RecordError::out_of_range("seconds must be in the range 0 - 86399"));
        }

        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        Self::new(hours as u8, minutes as u8, seconds as u8)
    }

    pub fn from_date_time(date_time: &NaiveDateTime) -> Self {
        Self {
            hours: date_time.hour() as u8,
            minutes: date_time.minute() as u8,
            seconds: date_time.second() as u8,
        }
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn total_seconds(&self) -> u32 {
        u32::from(self.hours) * 3600 + u32::from(self.minutes) * 60 + u32::from(self.seconds)
    }
}

/// Parses `H[:MM[:SS]]`; each component is one or two decimal digits.
impl FromStr for Time {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::invalid_format(format!("failed to parse '{s}' as a time"));

        let mut parts = [0u8; 3];
        let mut count = 0;

        for part in s.split(':') {
            if count == 3
                || part.is_empty()
                || part.len() > 2
                || !part.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }

            parts[count] = part.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Self::new(parts[0], parts[1], parts[2])
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_components() {
        assert!(Time::new(24, 0, 0).is_err());
        assert!(Time::new(0, 60, 0).is_err());
        assert!(Time::new(0, 0, 60).is_err());
        assert!(Time::new(23, 59, 59).is_ok());
    }

    #[test]
    fn from_secs_splits_components() {
        let time = Time::from_secs(3723).unwrap();

        assert_eq!((time.hours(), time.minutes(), time.seconds()), (1, 2, 3));
        assert_eq!(time.total_seconds(), 3723);
    }

    #[test]
    fn from_secs_rejects_more_than_a_day() {
        assert!(Time::from_secs(86_400).is_err());
        assert!(Time::from_secs(86_399).is_ok());
    }

    #[test]
    fn parses_partial_forms() {
        assert_eq!("9".parse::<Time>().unwrap(), Time::new(9, 0, 0).unwrap());
        assert_eq!("09:30".parse::<Time>().unwrap(), Time::new(9, 30, 0).unwrap());
        assert_eq!("23:59:59".parse::<Time>().unwrap(), Time::new(23, 59, 59).unwrap());
    }

    #[test]
    fn rejects_long_or_unbounded_fields() {
        assert!("123".parse::<Time>().is_err());
        assert!("25".parse::<Time>().is_err());
        assert!("1:75".parse::<Time>().is_err());
    }

    #[test]
    fn displays_zero_padded() {
        assert_eq!(Time::new(7, 5, 3).unwrap().to_string(), "07:05:03");
    }
}
