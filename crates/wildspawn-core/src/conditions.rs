//! Weather and time-of-day conditions used by spawn triggers.

use serde::{Deserialize, Serialize};

/// Weather reported by the world's weather oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherKind {
    /// Clear skies.
    #[default]
    Clear,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Storm with heavy rain and wind.
    Storm,
    /// Snowfall.
    Snow,
    /// Fog.
    Fog,
}

impl WeatherKind {
    /// Check if anything is falling from the sky.
    #[must_use]
    pub const fn is_precipitation(self) -> bool {
        matches!(self, Self::Rain | Self::Storm | Self::Snow)
    }
}

/// Weather condition attached to a spawn source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeatherTrigger {
    /// Never triggers.
    #[default]
    None,
    /// Rain or storm.
    Rain,
    /// Storm only.
    Storm,
    /// Snow.
    Snow,
    /// Fog.
    Fog,
    /// Any rain, storm or snow.
    AnyPrecipitation,
}

impl WeatherTrigger {
    /// Whether the trigger fires for the given weather.
    #[must_use]
    pub const fn matches(self, weather: WeatherKind) -> bool {
        match self {
            Self::None => false,
            Self::Rain => matches!(weather, WeatherKind::Rain | WeatherKind::Storm),
            Self::Storm => matches!(weather, WeatherKind::Storm),
            Self::Snow => matches!(weather, WeatherKind::Snow),
            Self::Fog => matches!(weather, WeatherKind::Fog),
            Self::AnyPrecipitation => weather.is_precipitation(),
        }
    }
}

/// One of the eight fixed hour buckets that partition a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HourBucket {
    /// 00:00 - 02:00
    Midnight,
    /// 02:00 - 05:00
    Night,
    /// 05:00 - 07:00
    Dawn,
    /// 07:00 - 11:00
    Morning,
    /// 11:00 - 13:00
    Noon,
    /// 13:00 - 17:00
    Afternoon,
    /// 17:00 - 20:00
    Dusk,
    /// 20:00 - 24:00
    Evening,
}

impl HourBucket {
    /// All buckets in chronological order.
    pub const ALL: [Self; 8] = [
        Self::Midnight,
        Self::Night,
        Self::Dawn,
        Self::Morning,
        Self::Noon,
        Self::Afternoon,
        Self::Dusk,
        Self::Evening,
    ];

    /// Start hour (inclusive) and end hour (exclusive).
    #[must_use]
    pub const fn hours(self) -> (u8, u8) {
        match self {
            Self::Midnight => (0, 2),
            Self::Night => (2, 5),
            Self::Dawn => (5, 7),
            Self::Morning => (7, 11),
            Self::Noon => (11, 13),
            Self::Afternoon => (13, 17),
            Self::Dusk => (17, 20),
            Self::Evening => (20, 24),
        }
    }

    /// Bucket containing the given hour. Hours wrap modulo 24.
    #[must_use]
    pub fn from_hour(hour: u8) -> Self {
        let hour = hour % 24;
        Self::ALL
            .into_iter()
            .find(|bucket| {
                let (start, end) = bucket.hours();
                (start..end).contains(&hour)
            })
            .unwrap_or(Self::Evening)
    }
}

/// Time-of-day condition attached to a spawn source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeTrigger {
    /// Never triggers.
    #[default]
    None,
    /// Fires while the clock is inside the bucket.
    During(HourBucket),
}

impl TimeTrigger {
    /// Whether the trigger fires at the given hour.
    #[must_use]
    pub fn matches(self, hour: u8) -> bool {
        match self {
            Self::None => false,
            Self::During(bucket) => HourBucket::from_hour(hour) == bucket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_cover_day_without_gaps() {
        let mut covered = [false; 24];
        for bucket in HourBucket::ALL {
            let (start, end) = bucket.hours();
            assert!((1..=4).contains(&(end - start)), "{bucket:?}");
            for hour in start..end {
                assert!(!covered[hour as usize], "hour {hour} covered twice");
                covered[hour as usize] = true;
            }
        }
        assert!(covered.iter().all(|c| *c));
    }

    #[test]
    fn test_from_hour() {
        assert_eq!(HourBucket::from_hour(0), HourBucket::Midnight);
        assert_eq!(HourBucket::from_hour(6), HourBucket::Dawn);
        assert_eq!(HourBucket::from_hour(12), HourBucket::Noon);
        assert_eq!(HourBucket::from_hour(23), HourBucket::Evening);
        assert_eq!(HourBucket::from_hour(26), HourBucket::Night);
    }

    #[test]
    fn test_weather_trigger_matches() {
        assert!(WeatherTrigger::Rain.matches(WeatherKind::Storm));
        assert!(!WeatherTrigger::Storm.matches(WeatherKind::Rain));
        assert!(WeatherTrigger::AnyPrecipitation.matches(WeatherKind::Snow));
        assert!(!WeatherTrigger::None.matches(WeatherKind::Rain));
    }

    #[test]
    fn test_time_trigger_matches() {
        let trigger = TimeTrigger::During(HourBucket::Dusk);
        assert!(trigger.matches(18));
        assert!(!trigger.matches(21));
        assert!(!TimeTrigger::None.matches(18));
    }
}
