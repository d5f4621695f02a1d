//! Run settings and the bounds every startup input must satisfy.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::DEFAULT_SPEED;
use crate::error::ConfigError;

/// Allowed waiter pool sizes.
pub const WAITERS: RangeInclusive<u64> = 1..=15;
/// Allowed chef pool sizes.
pub const CHEFS: RangeInclusive<u64> = 1..=10;
/// Allowed upper bounds for dishes in one order.
pub const MAX_DISHES_PER_ORDER: RangeInclusive<u64> = 1..=5;
/// Allowed table counts; tables are numbered from 1.
pub const TABLES: RangeInclusive<u64> = 1..=20;
/// Business-day length in virtual minutes (11:00 to 22:00 at most).
pub const DURATION_MINUTES: RangeInclusive<u64> = 1..=660;
/// Allowed queue capacities; 0 means rendezvous.
pub const QUEUE_CAPACITY: RangeInclusive<u64> = 0..=10_000;

/// Everything one simulated day needs, checked by [`Settings::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Waiter threads.
    pub waiters: usize,
    /// Chef threads.
    pub chefs: usize,
    /// Each order carries between 1 and this many dishes.
    pub max_dishes_per_order: usize,
    /// Tables are numbered `1..=tables`.
    pub tables: u32,
    /// Virtual length of the business day.
    pub duration: Duration,
    /// Stop generating after this many orders even if time remains.
    pub order_limit: Option<u64>,
    /// Virtual pause between two generated orders, inclusive bounds.
    pub order_interval_min: Duration,
    pub order_interval_max: Duration,
    /// Buffered orders between generator and waiters.
    pub order_queue_capacity: usize,
    /// Buffered dishes between waiters and chefs.
    pub dish_queue_capacity: usize,
    /// Fixed virtual/real scale factor.
    pub speed: u32,
    /// Seed for reproducible runs; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Real interval between periodic reports; `None` disables them.
    pub report_every: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            waiters: 3,
            chefs: 2,
            max_dishes_per_order: 3,
            tables: 10,
            duration: Duration::from_secs(660 * 60),
            order_limit: None,
            order_interval_min: Duration::from_secs(60),
            order_interval_max: Duration::from_secs(5 * 60),
            order_queue_capacity: 100,
            dish_queue_capacity: 100,
            speed: DEFAULT_SPEED,
            seed: None,
            report_every: None,
        }
    }
}

fn check_range(
    field: &'static str,
    value: u64,
    range: &RangeInclusive<u64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl Settings {
    /// Reject any out-of-range input; values are never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("waiters", self.waiters as u64, &WAITERS)?;
        check_range("chefs", self.chefs as u64, &CHEFS)?;
        check_range(
            "max dishes per order",
            self.max_dishes_per_order as u64,
            &MAX_DISHES_PER_ORDER,
        )?;
        check_range("tables", u64::from(self.tables), &TABLES)?;
        check_range(
            "duration minutes",
            self.duration.as_secs().div_ceil(60),
            &DURATION_MINUTES,
        )?;
        check_range(
            "order queue capacity",
            self.order_queue_capacity as u64,
            &QUEUE_CAPACITY,
        )?;
        check_range(
            "dish queue capacity",
            self.dish_queue_capacity as u64,
            &QUEUE_CAPACITY,
        )?;
        if self.order_interval_min > self.order_interval_max {
            return Err(ConfigError::InvertedInterval {
                min: self.order_interval_min,
                max: self.order_interval_max,
            });
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        Ok(())
    }

    /// Set the day length in virtual minutes, rejecting anything outside
    /// [`DURATION_MINUTES`] before it is converted.
    pub fn with_duration_minutes(mut self, minutes: u64) -> Result<Self, ConfigError> {
        check_range("duration minutes", minutes, &DURATION_MINUTES)?;
        self.duration = Duration::from_secs(minutes * 60);
        Ok(self)
    }

    /// Independent random stream for one component. Seeded runs derive every
    /// stream from the seed, so the same seed replays the same choices.
    pub fn rng_for(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
            }
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn out_of_range_values_are_rejected_not_clamped() {
        let settings = Settings {
            waiters: 16,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::OutOfRange {
                field: "waiters",
                value: 16,
                min: 1,
                max: 15,
            })
        );
        assert_eq!(settings.waiters, 16);

        let no_chefs = Settings {
            chefs: 0,
            ..Settings::default()
        };
        assert!(matches!(
            no_chefs.validate(),
            Err(ConfigError::OutOfRange { field: "chefs", .. })
        ));

        let too_many_tables = Settings {
            tables: 21,
            ..Settings::default()
        };
        assert!(too_many_tables.validate().is_err());
    }

    #[test]
    fn duration_must_fit_the_business_day() {
        for minutes in [0, 661] {
            assert!(matches!(
                Settings::default().with_duration_minutes(minutes),
                Err(ConfigError::OutOfRange { field: "duration minutes", .. })
            ));
        }
        let full_day = Settings::default().with_duration_minutes(660).expect("660 minutes");
        assert_eq!(full_day.duration, Duration::from_secs(660 * 60));
        assert!(full_day.validate().is_ok());

        let too_long = Settings {
            duration: Duration::from_secs(661 * 60),
            ..Settings::default()
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn huge_minute_counts_are_rejected_not_wrapped() {
        // 2^62 + 10 minutes wraps to 600 seconds if multiplied unchecked.
        for minutes in [u64::MAX, (1u64 << 62) + 10] {
            assert_eq!(
                Settings::default().with_duration_minutes(minutes),
                Err(ConfigError::OutOfRange {
                    field: "duration minutes",
                    value: minutes,
                    min: 1,
                    max: 660,
                })
            );
        }
    }

    #[test]
    fn unbuffered_queues_are_allowed() {
        let settings = Settings {
            order_queue_capacity: 0,
            dish_queue_capacity: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let settings = Settings {
            order_interval_min: Duration::from_secs(10),
            order_interval_max: Duration::from_secs(1),
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvertedInterval { .. })
        ));
    }

    #[test]
    fn seeded_streams_replay() {
        let settings = Settings {
            seed: Some(42),
            ..Settings::default()
        };
        let a: Vec<u32> = (0..8).map(|_| settings.rng_for(3).gen_range(0..1000)).collect();
        let mut first = settings.rng_for(3);
        let mut second = settings.rng_for(3);
        let mut other = settings.rng_for(4);
        let x: Vec<u32> = (0..8).map(|_| first.gen_range(0..1_000_000)).collect();
        let y: Vec<u32> = (0..8).map(|_| second.gen_range(0..1_000_000)).collect();
        let z: Vec<u32> = (0..8).map(|_| other.gen_range(0..1_000_000)).collect();
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert!(a.iter().all(|&v| v == a[0]));
    }
}
