use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Day;

/// A bookable start time. Ordering is chronological, so "9:00" sorts before "10:00".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid time: {0}")]
pub struct InvalidTime(pub String);

impl TimeSlot {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeSlot)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = InvalidTime;

    /// Accepts `9:00`, `09:00`, `9am`, `2:30 PM` and `2 pm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTime(s.to_string());

        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect::<String>()
            .to_lowercase();

        let (clock, meridiem) = if let Some(rest) = compact.strip_suffix("am") {
            (rest, Some(false))
        } else if let Some(rest) = compact.strip_suffix("pm") {
            (rest, Some(true))
        } else {
            (compact.as_str(), None)
        };

        let (hour, minute): (u32, u32) = match clock.split_once(':') {
            Some((h, m)) => {
                if m.len() != 2 {
                    return Err(invalid());
                }
                (
                    h.parse().map_err(|_| invalid())?,
                    m.parse().map_err(|_| invalid())?,
                )
            }
            // A bare hour is only unambiguous with an am/pm marker.
            None if meridiem.is_some() => (clock.parse().map_err(|_| invalid())?, 0),
            None => return Err(invalid()),
        };

        let hour = match meridiem {
            Some(pm) => {
                if !(1..=12).contains(&hour) {
                    return Err(invalid());
                }
                if pm {
                    hour % 12 + 12
                } else {
                    hour % 12
                }
            }
            None => hour,
        };

        TimeSlot::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The fixed weekly grid every day's inventory is seeded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    times: BTreeSet<TimeSlot>,
}

const DEFAULT_TIMES: [(u32, u32); 6] = [(9, 0), (10, 0), (11, 0), (14, 0), (15, 0), (16, 0)];

impl Default for Schedule {
    fn default() -> Self {
        Self {
            times: DEFAULT_TIMES
                .iter()
                .filter_map(|&(h, m)| TimeSlot::new(h, m))
                .collect(),
        }
    }
}

impl Schedule {
    pub fn new(times: impl IntoIterator<Item = TimeSlot>) -> Self {
        Self {
            times: times.into_iter().collect(),
        }
    }

    /// Parses a comma separated list such as `09:00,10:00,14:00`.
    pub fn parse_list(s: &str) -> Result<Self, InvalidTime> {
        let times = s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<TimeSlot>, _>>()?;
        if times.is_empty() {
            return Err(InvalidTime(s.to_string()));
        }
        Ok(Self { times })
    }

    pub fn days(&self) -> &'static [Day] {
        &Day::ALL
    }

    pub fn times(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.times.iter().copied()
    }

    pub fn contains(&self, time: TimeSlot) -> bool {
        self.times.contains(&time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeSlot {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_24h_forms() {
        assert_eq!(t("09:00"), TimeSlot::new(9, 0).unwrap());
        assert_eq!(t("9:00"), TimeSlot::new(9, 0).unwrap());
        assert_eq!(t("16:30"), TimeSlot::new(16, 30).unwrap());
    }

    #[test]
    fn test_parse_12h_forms() {
        assert_eq!(t("9am"), TimeSlot::new(9, 0).unwrap());
        assert_eq!(t("2 PM"), TimeSlot::new(14, 0).unwrap());
        assert_eq!(t("2:00 p.m."), TimeSlot::new(14, 0).unwrap());
        assert_eq!(t("12pm"), TimeSlot::new(12, 0).unwrap());
        assert_eq!(t("12am"), TimeSlot::new(0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("25:00".parse::<TimeSlot>().is_err());
        assert!("9".parse::<TimeSlot>().is_err());
        assert!("13pm".parse::<TimeSlot>().is_err());
        assert!("9:5".parse::<TimeSlot>().is_err());
        assert!("noon".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(t("9:00").to_string(), "09:00");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut slots = vec![t("10:00"), t("9:00"), t("16:00"), t("14:00")];
        slots.sort();
        let rendered: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
        assert_eq!(rendered, vec!["09:00", "10:00", "14:00", "16:00"]);
    }

    #[test]
    fn test_default_schedule() {
        let schedule = Schedule::default();
        assert_eq!(schedule.times().count(), 6);
        assert!(schedule.contains(t("09:00")));
        assert!(!schedule.contains(t("12:00")));
    }

    #[test]
    fn test_parse_schedule_list() {
        let schedule = Schedule::parse_list("14:00, 9:00,").unwrap();
        let times: Vec<String> = schedule.times().map(|t| t.to_string()).collect();
        assert_eq!(times, vec!["09:00", "14:00"]);
        assert!(Schedule::parse_list("").is_err());
        assert!(Schedule::parse_list("9:00,late").is_err());
    }
}
