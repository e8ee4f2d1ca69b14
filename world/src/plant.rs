//! Per-tile plant growth and infestation automaton.

use std::{sync::Arc, time::Duration};

use meat_harvest_core::{Frame, Stage, StageTable, FALLBACK_FRAME};
use rand::Rng;

use crate::config::{sanitize_pace, InfestationTuning};

/// A single organism bound to a grid cell.
///
/// The stage table is shared with every other plant of the same kind; all
/// mutable growth state is owned by the plant itself.
#[derive(Clone, Debug)]
pub struct Plant {
    table: Arc<StageTable>,
    pace: f32,
    stage_index: usize,
    timer: Duration,
    infested: bool,
    maturation_cycles: u32,
}

/// Summary of what changed during [`Plant::advance`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlantAdvance {
    /// The plant moved on to another stage.
    pub grew: bool,
    /// The plant became infested on its own during the transition.
    pub infested: bool,
    /// The plant is infested and reached its final stage, so it releases spores.
    pub emits_spores: bool,
}

impl Plant {
    /// Creates a fresh plant at its first stage growing at the table's own pace.
    #[must_use]
    pub fn new(table: Arc<StageTable>) -> Self {
        Self::with_pace(table, 1.0)
    }

    /// Creates a fresh plant whose stage durations are scaled by `pace`.
    ///
    /// Non-positive or non-finite paces are replaced with `1.0`.
    #[must_use]
    pub fn with_pace(table: Arc<StageTable>, pace: f32) -> Self {
        let mut plant = Self {
            table,
            pace: sanitize_pace(pace),
            stage_index: 0,
            timer: Duration::ZERO,
            infested: false,
            maturation_cycles: 0,
        };
        plant.timer = plant.stage_duration(0);
        plant
    }

    /// Advances the growth timer by `dt`.
    ///
    /// At most one stage transition happens per call. Terminal stages never
    /// advance on their own.
    pub fn advance<R>(
        &mut self,
        dt: Duration,
        tuning: &InfestationTuning,
        rng: &mut R,
    ) -> PlantAdvance
    where
        R: Rng + ?Sized,
    {
        let mut report = PlantAdvance::default();
        if self.stage().is_terminal() {
            return report;
        }

        self.timer = self.timer.saturating_sub(dt);
        if !self.timer.is_zero() {
            return report;
        }

        let next = (self.stage_index + 1).min(self.table.last_index());
        self.stage_index = next;
        self.timer = self.stage_duration(next);
        report.grew = true;

        if self.can_infest() {
            self.maturation_cycles = self.maturation_cycles.saturating_add(1);
        }

        if !self.infested && self.can_infest() && tuning.roll(rng) {
            report.infested = self.infest(tuning.reseed());
        } else if self.infested && self.is_last_stage() {
            report.emits_spores = true;
        }

        report
    }

    /// Reports whether the current stage can be infested.
    #[must_use]
    pub fn can_infest(&self) -> bool {
        self.stage().is_infestable()
    }

    /// Reports whether any stage of this plant's table can be infested.
    #[must_use]
    pub fn ever_infestable(&self) -> bool {
        self.table.has_infestable_stage()
    }

    /// Infests the plant and restarts its timer with `reseed`.
    ///
    /// Returns `false` without touching the plant when the current stage is
    /// not infestable.
    pub fn infest(&mut self, reseed: Duration) -> bool {
        if !self.can_infest() {
            return false;
        }
        self.infested = true;
        self.timer = reseed;
        true
    }

    /// Harvests the plant, returning its yield and restarting growth.
    ///
    /// Infested plants yield nothing but are cured by the harvest.
    pub fn harvest(&mut self) -> u32 {
        let value = if self.infested {
            0
        } else {
            self.stage().value()
        };
        self.stage_index = 0;
        self.timer = self.stage_duration(0);
        self.infested = false;
        value
    }

    /// Reports whether the plant is free of infestation.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        !self.infested
    }

    /// Reports whether the plant is infested.
    #[must_use]
    pub const fn is_infested(&self) -> bool {
        self.infested
    }

    /// Reports whether the plant sits in the final stage of its table.
    #[must_use]
    pub fn is_last_stage(&self) -> bool {
        self.stage_index == self.table.last_index()
    }

    /// Index of the current stage.
    #[must_use]
    pub const fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Time left before the next stage transition.
    #[must_use]
    pub const fn timer(&self) -> Duration {
        self.timer
    }

    /// Number of transitions into infestable stages since the plant was created.
    #[must_use]
    pub const fn maturation_cycles(&self) -> u32 {
        self.maturation_cycles
    }

    /// Growth pace multiplier applied to every stage duration.
    #[must_use]
    pub const fn pace(&self) -> f32 {
        self.pace
    }

    /// The stage the plant is currently in.
    #[must_use]
    pub fn stage(&self) -> &Stage {
        self.table.stage(self.stage_index)
    }

    /// Frame the renderer should show for the plant.
    #[must_use]
    pub fn current_frame(&self) -> Frame {
        let stage = self.stage();
        let frames = if self.infested && stage.is_infestable() {
            stage.infested_frames()
        } else {
            stage.frames()
        };
        frames.first().copied().unwrap_or(FALLBACK_FRAME)
    }

    fn stage_duration(&self, index: usize) -> Duration {
        let base = self.table.stage(index).duration();
        if self.pace == 1.0 {
            base
        } else {
            Duration::try_from_secs_f32(base.as_secs_f32() * self.pace)
                .unwrap_or(Duration::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn calm() -> InfestationTuning {
        InfestationTuning {
            spontaneous_chance: 0.0,
            reseed_ms: 8_000,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0x9a7e)
    }

    fn two_stage_table() -> Arc<StageTable> {
        Arc::new(StageTable::with_first(
            Stage::new(vec![Frame::new(0)], ms(1_000), 1),
            vec![Stage::new(vec![Frame::new(1)], ms(1_000), 2).terminal()],
        ))
    }

    fn blighted_table() -> Arc<StageTable> {
        Arc::new(StageTable::with_first(
            Stage::new(vec![Frame::new(0)], ms(1_000), 1),
            vec![
                Stage::new(vec![Frame::new(1)], ms(1_000), 5)
                    .with_infested_frames(vec![Frame::new(9)]),
                Stage::new(vec![Frame::new(2)], ms(0), 0)
                    .with_infested_frames(vec![Frame::new(8)])
                    .terminal(),
            ],
        ))
    }

    #[test]
    fn terminal_stage_absorbs_growth() {
        let mut plant = Plant::new(two_stage_table());
        let mut rng = rng();

        let first = plant.advance(ms(1_000), &calm(), &mut rng);
        assert!(first.grew);
        assert_eq!(plant.stage_index(), 1);
        assert_eq!(plant.timer(), ms(1_000));

        let second = plant.advance(ms(1_000), &calm(), &mut rng);
        assert_eq!(second, PlantAdvance::default());
        assert_eq!(plant.stage_index(), 1);
    }

    #[test]
    fn partial_advance_only_burns_timer() {
        let mut plant = Plant::new(two_stage_table());
        let report = plant.advance(ms(400), &calm(), &mut rng());
        assert!(!report.grew);
        assert_eq!(plant.stage_index(), 0);
        assert_eq!(plant.timer(), ms(600));
    }

    #[test]
    fn oversized_dt_moves_a_single_stage() {
        let mut plant = Plant::new(blighted_table());
        let report = plant.advance(ms(60_000), &calm(), &mut rng());
        assert!(report.grew);
        assert_eq!(plant.stage_index(), 1);
        assert_eq!(plant.timer(), ms(1_000));
    }

    #[test]
    fn stage_index_stays_in_bounds_without_terminal_stage() {
        let table = Arc::new(StageTable::with_first(
            Stage::new(vec![Frame::new(0)], ms(10), 1),
            vec![Stage::new(vec![Frame::new(1)], ms(10), 2)],
        ));
        let mut plant = Plant::new(table);
        let mut rng = rng();
        for _ in 0..50 {
            let _ = plant.advance(ms(25), &calm(), &mut rng);
            assert!(plant.stage_index() < 2);
        }
        assert_eq!(plant.stage_index(), 1);
    }

    #[test]
    fn pace_scales_stage_durations() {
        let plant = Plant::with_pace(two_stage_table(), 1.5);
        assert_eq!(plant.timer(), ms(1_500));
        assert!((Plant::with_pace(two_stage_table(), -3.0).pace() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn overflowing_pace_saturates_the_timer() {
        let mut plant = Plant::with_pace(two_stage_table(), 1e30);
        assert_eq!(plant.timer(), Duration::MAX);

        let report = plant.advance(ms(1_000), &calm(), &mut rng());
        assert!(!report.grew);
        assert_eq!(plant.stage_index(), 0);
    }

    #[test]
    fn harvest_returns_value_and_resets() {
        let mut plant = Plant::new(blighted_table());
        let _ = plant.advance(ms(1_000), &calm(), &mut rng());
        assert_eq!(plant.harvest(), 5);
        assert_eq!(plant.stage_index(), 0);
        assert_eq!(plant.timer(), ms(1_000));
        assert!(plant.is_healthy());
    }

    #[test]
    fn infested_harvest_yields_nothing_and_cures() {
        let mut plant = Plant::new(blighted_table());
        let _ = plant.advance(ms(1_000), &calm(), &mut rng());
        assert!(plant.infest(ms(8_000)));
        assert_eq!(plant.timer(), ms(8_000));
        assert_eq!(plant.current_frame(), Frame::new(9));

        assert_eq!(plant.harvest(), 0);
        assert_eq!(plant.stage_index(), 0);
        assert!(!plant.is_infested());
        assert_eq!(plant.current_frame(), Frame::new(0));
    }

    #[test]
    fn young_plants_resist_infestation() {
        let mut plant = Plant::new(blighted_table());
        assert!(!plant.can_infest());
        assert!(!plant.infest(ms(8_000)));
        assert!(plant.is_healthy());
        assert_eq!(plant.timer(), ms(1_000));
        assert!(plant.ever_infestable());
    }

    #[test]
    fn infested_plant_reaching_last_stage_emits_spores() {
        let mut plant = Plant::new(blighted_table());
        let mut rng = rng();
        let _ = plant.advance(ms(1_000), &calm(), &mut rng);
        assert!(plant.infest(ms(8_000)));

        let waiting = plant.advance(ms(7_999), &calm(), &mut rng);
        assert!(!waiting.emits_spores);

        let report = plant.advance(ms(1), &calm(), &mut rng);
        assert!(report.grew);
        assert!(report.emits_spores);
        assert!(plant.is_last_stage());
        assert_eq!(plant.current_frame(), Frame::new(8));
    }

    #[test]
    fn healthy_plant_reaching_last_stage_stays_quiet() {
        let mut plant = Plant::new(blighted_table());
        let mut rng = rng();
        let _ = plant.advance(ms(1_000), &calm(), &mut rng);
        let report = plant.advance(ms(1_000), &calm(), &mut rng);
        assert!(report.grew);
        assert!(!report.emits_spores);
    }

    #[test]
    fn certain_spontaneous_infestation_triggers_on_eligible_transition() {
        let tuning = InfestationTuning {
            spontaneous_chance: 1.0,
            reseed_ms: 8_000,
        };
        let mut plant = Plant::new(blighted_table());
        let report = plant.advance(ms(1_000), &tuning, &mut rng());
        assert!(report.infested);
        assert!(plant.is_infested());
        assert_eq!(plant.timer(), ms(8_000));
    }

    #[test]
    fn maturation_cycles_count_infestable_transitions() {
        let mut plant = Plant::new(blighted_table());
        let mut rng = rng();
        let _ = plant.advance(ms(1_000), &calm(), &mut rng);
        let _ = plant.advance(ms(1_000), &calm(), &mut rng);
        assert_eq!(plant.maturation_cycles(), 2);

        let _ = plant.harvest();
        let _ = plant.advance(ms(1_000), &calm(), &mut rng);
        assert_eq!(plant.maturation_cycles(), 3);
    }
}
