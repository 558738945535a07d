use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Office days. The practice is closed on weekends, so the set is closed too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown day: {0}")]
pub struct UnknownDay(pub String);

impl FromStr for Day {
    type Err = UnknownDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Day::Monday),
            "tuesday" | "tue" | "tues" => Ok(Day::Tuesday),
            "wednesday" | "wed" => Ok(Day::Wednesday),
            "thursday" | "thu" | "thur" | "thurs" => Ok(Day::Thursday),
            "friday" | "fri" => Ok(Day::Friday),
            _ => Err(UnknownDay(s.to_string())),
        }
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_and_short_names() {
        assert_eq!("Monday".parse::<Day>().unwrap(), Day::Monday);
        assert_eq!("tue".parse::<Day>().unwrap(), Day::Tuesday);
        assert_eq!(" FRIDAY ".parse::<Day>().unwrap(), Day::Friday);
        assert_eq!("Thurs".parse::<Day>().unwrap(), Day::Thursday);
    }

    #[test]
    fn test_parse_weekend_rejected() {
        assert!("Saturday".parse::<Day>().is_err());
        assert!("sun".parse::<Day>().is_err());
        assert!("".parse::<Day>().is_err());
    }

    #[test]
    fn test_days_order_through_the_week() {
        let mut days = vec![Day::Friday, Day::Monday, Day::Wednesday];
        days.sort();
        assert_eq!(days, vec![Day::Monday, Day::Wednesday, Day::Friday]);
    }

    #[test]
    fn test_serde_uses_full_name() {
        assert_eq!(serde_json::to_string(&Day::Wednesday).unwrap(), "\"Wednesday\"");
        let day: Day = serde_json::from_str("\"wed\"").unwrap();
        assert_eq!(day, Day::Wednesday);
    }
}
