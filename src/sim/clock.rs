use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::LoadError;

/// Simulated minutes advanced by one step.
pub const TICK_MINUTES: u32 = 15;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Time of day with minute resolution, written as `"HH:MM"`.
///
/// # Examples
///
/// ```
/// use microgrid_sim::sim::clock::TimeOfDay;
///
/// let t: TimeOfDay = "23:45".parse().unwrap();
/// assert_eq!(t.advanced(15).to_string(), "00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct TimeOfDay {
    minutes: u32,
}

impl TimeOfDay {
    /// Builds a time from hours and minutes, wrapping past midnight.
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self::from_minutes(hours * 60 + minutes)
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        self.minutes
    }

    /// Fraction of the day elapsed, in `[0, 1)`.
    pub fn day_fraction(self) -> f32 {
        self.minutes as f32 / MINUTES_PER_DAY as f32
    }

    /// Returns the time `minutes` later, wrapping at midnight.
    pub fn advanced(self, minutes: u32) -> Self {
        Self::from_minutes(self.minutes + minutes % MINUTES_PER_DAY)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LoadError::InvalidTimeLabel(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hours: u32 = h.parse().map_err(|_| invalid())?;
        let minutes: u32 = m.parse().map_err(|_| invalid())?;
        if hours >= 24 || minutes >= 60 {
            return Err(invalid());
        }
        Ok(Self::new(hours, minutes))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = LoadError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A simulation clock that advances a fixed 15 simulated minutes per step,
/// independent of how often the driver calls it.
///
/// # Examples
///
/// ```
/// use microgrid_sim::sim::clock::{SimClock, TimeOfDay};
///
/// let mut clock = SimClock::new(TimeOfDay::new(8, 0));
/// assert_eq!(clock.tick().to_string(), "08:00");
/// assert_eq!(clock.now().to_string(), "08:15");
/// assert_eq!(clock.steps(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Current simulated time of day
    now: TimeOfDay,
    /// Steps taken since the clock was created
    steps: usize,
}

impl SimClock {
    pub fn new(start: TimeOfDay) -> Self {
        Self {
            now: start,
            steps: 0,
        }
    }

    pub fn now(&self) -> TimeOfDay {
        self.now
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// The time of day before advancing.
    pub fn tick(&mut self) -> TimeOfDay {
        let current = self.now;
        self.now = current.advanced(TICK_MINUTES);
        self.steps += 1;
        current
    }
}
