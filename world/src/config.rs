//! Tuning knobs for a harvesting round.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Aggregated configuration applied when a round is set up.
///
/// Every field falls back to its default when omitted from a deserialised
/// document, so partial TOML files are accepted.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Side length of a square tile measured in world units.
    pub tile_length: f32,
    /// Maximum amount the harvester can carry before it must unload.
    pub harvester_capacity: u32,
    /// Spore travel speed in world units per millisecond.
    pub spore_speed: f32,
    /// Seed for the generator driving growth jitter and spontaneous outbreaks.
    pub rng_seed: u64,
    /// Controls how plants become infested.
    pub infestation: InfestationTuning,
    /// Controls how long harvester moves take.
    pub motion: MotionTuning,
    /// Controls the per-plant growth speed multiplier.
    pub growth_pace: GrowthPace,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            tile_length: 32.0,
            harvester_capacity: 100,
            spore_speed: 0.1,
            rng_seed: 0x5eed_0f_b1a5_7ed,
            infestation: InfestationTuning::default(),
            motion: MotionTuning::default(),
            growth_pace: GrowthPace::default(),
        }
    }
}

impl RoundConfig {
    /// Returns a copy of the configuration using the provided seed.
    #[must_use]
    pub fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }
}

/// Infestation parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfestationTuning {
    /// Probability that an eligible stage transition infests the plant on its own.
    pub spontaneous_chance: f64,
    /// Timer applied to a plant the moment it becomes infested, in milliseconds.
    pub reseed_ms: u64,
}

impl InfestationTuning {
    /// Timer applied to freshly infested plants.
    #[must_use]
    pub const fn reseed(&self) -> Duration {
        Duration::from_millis(self.reseed_ms)
    }

    pub(crate) fn roll<R>(&self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        let chance = self.spontaneous_chance;
        if chance.is_nan() || chance <= 0.0 {
            return false;
        }
        rng.gen_bool(chance.min(1.0))
    }
}

impl Default for InfestationTuning {
    fn default() -> Self {
        Self {
            spontaneous_chance: 1.0 / 150.0,
            reseed_ms: 8_000,
        }
    }
}

/// Harvester motion timings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Time spent turning before a move when the heading changes, in milliseconds.
    pub rotation_ms: u64,
    /// Time spent travelling between two cell centres, in milliseconds.
    pub translation_ms: u64,
    /// Smallest heading change, in degrees, that triggers a rotation phase.
    pub rotation_threshold_degrees: f32,
}

impl MotionTuning {
    /// Duration of the rotation phase.
    #[must_use]
    pub const fn rotation(&self) -> Duration {
        Duration::from_millis(self.rotation_ms)
    }

    /// Duration of the translation phase.
    #[must_use]
    pub const fn translation(&self) -> Duration {
        Duration::from_millis(self.translation_ms)
    }
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            rotation_ms: 200,
            translation_ms: 500,
            rotation_threshold_degrees: 1.0,
        }
    }
}

/// Largest growth pace multiplier a round accepts.
pub const MAX_GROWTH_PACE: f32 = 1_000.0;

/// Range from which each plant draws its growth pace multiplier.
///
/// A pace of `1.2` stretches every stage of that plant by twenty percent.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GrowthPace {
    /// Inclusive lower bound of the multiplier.
    pub min: f32,
    /// Exclusive upper bound of the multiplier.
    pub max: f32,
}

impl GrowthPace {
    /// A range that always yields exactly `1.0`.
    #[must_use]
    pub const fn fixed() -> Self {
        Self { min: 1.0, max: 1.0 }
    }

    /// Reports whether both bounds are finite, positive, ordered and no
    /// larger than [`MAX_GROWTH_PACE`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let within = |pace: f32| pace.is_finite() && pace > 0.0 && pace <= MAX_GROWTH_PACE;
        within(self.min) && within(self.max) && self.min <= self.max
    }

    pub(crate) fn sample<R>(&self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        let min = sanitize_pace(self.min);
        let max = sanitize_pace(self.max);
        if max > min {
            rng.gen_range(min..max)
        } else {
            min
        }
    }
}

impl Default for GrowthPace {
    fn default() -> Self {
        Self { min: 1.1, max: 1.3 }
    }
}

pub(crate) fn sanitize_pace(pace: f32) -> f32 {
    if pace.is_finite() && pace > 0.0 {
        pace
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: RoundConfig = toml::from_str(
            r#"
            harvester_capacity = 40

            [infestation]
            reseed_ms = 2500
            "#,
        )
        .expect("config parses");

        assert_eq!(config.harvester_capacity, 40);
        assert_eq!(config.infestation.reseed(), Duration::from_millis(2_500));
        assert!((config.infestation.spontaneous_chance - 1.0 / 150.0).abs() < f64::EPSILON);
        assert_eq!(config.motion, MotionTuning::default());
        assert!((config.tile_length - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn growth_pace_samples_within_range() {
        let pace = GrowthPace::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..256 {
            let sample = pace.sample(&mut rng);
            assert!((1.1..1.3).contains(&sample), "sample {sample} out of range");
        }
    }

    #[test]
    fn degenerate_pace_falls_back_to_unit() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pace = GrowthPace {
            min: f32::NAN,
            max: -2.0,
        };
        assert!((pace.sample(&mut rng) - 1.0).abs() < f32::EPSILON);
        assert!((GrowthPace::fixed().sample(&mut rng) - 1.0).abs() < f32::EPSILON);
        assert!(!pace.is_valid());
    }

    #[test]
    fn growth_pace_bounds_are_checked() {
        assert!(GrowthPace::default().is_valid());
        assert!(GrowthPace::fixed().is_valid());
        assert!(!GrowthPace { min: 1.3, max: 1.1 }.is_valid());
        assert!(!GrowthPace {
            min: 1.0,
            max: MAX_GROWTH_PACE * 2.0,
        }
        .is_valid());
    }

    #[test]
    fn infestation_roll_honours_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let never = InfestationTuning {
            spontaneous_chance: 0.0,
            reseed_ms: 0,
        };
        let always = InfestationTuning {
            spontaneous_chance: 4.0,
            reseed_ms: 0,
        };
        assert!(!never.roll(&mut rng));
        assert!(always.roll(&mut rng));
    }
}
