//! Player-controlled harvester: motion plan, hold and cell tracking.

use std::time::Duration;

use meat_harvest_core::{CellCoord, HarvestOutcome, HarvesterSnapshot, WorldPoint};

use crate::config::MotionTuning;

/// Progress reported when an in-flight motion is advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MotionProgress {
    /// No motion was in flight.
    Idle,
    /// The motion continues.
    InFlight,
    /// The motion finished; the harvester rests on `cell`.
    Completed { cell: CellCoord },
}

/// A single accepted move: an optional rotation followed by a translation.
#[derive(Clone, Debug)]
struct Motion {
    from: WorldPoint,
    to: WorldPoint,
    to_cell: CellCoord,
    start_angle: f32,
    end_angle: f32,
    rotation: Duration,
    translation: Duration,
    elapsed: Duration,
}

impl Motion {
    fn total(&self) -> Duration {
        self.rotation.saturating_add(self.translation)
    }

    fn pose(&self) -> (WorldPoint, f32) {
        let angle = if self.elapsed >= self.rotation {
            self.end_angle
        } else {
            let t = self.elapsed.as_secs_f32() / self.rotation.as_secs_f32();
            self.start_angle + (self.end_angle - self.start_angle) * t
        };

        let travelled = self.elapsed.saturating_sub(self.rotation);
        let position = if travelled >= self.translation {
            self.to
        } else {
            let t = travelled.as_secs_f32() / self.translation.as_secs_f32();
            self.from.lerp(self.to, t)
        };

        (position, angle)
    }
}

/// The harvester's authoritative state.
#[derive(Clone, Debug)]
pub(crate) struct Harvester {
    cell: CellCoord,
    position: WorldPoint,
    angle_degrees: f32,
    motion: Option<Motion>,
    carrying: u32,
    capacity: u32,
}

impl Harvester {
    /// Places an idle, empty harvester at the centre of `cell`, facing east.
    pub(crate) fn at(cell: CellCoord, tile_length: f32, capacity: u32) -> Self {
        Self {
            cell,
            position: WorldPoint::cell_center(cell, tile_length),
            angle_degrees: 0.0,
            motion: None,
            carrying: 0,
            capacity,
        }
    }

    pub(crate) const fn cell(&self) -> CellCoord {
        self.cell
    }

    pub(crate) const fn is_busy(&self) -> bool {
        self.motion.is_some()
    }

    /// Cell under the harvester's current position.
    pub(crate) fn resting_cell(&self, tile_length: f32) -> CellCoord {
        self.position.containing_cell(tile_length).unwrap_or(self.cell)
    }

    /// Starts a move toward the centre of `to` facing `heading`.
    ///
    /// Returns whether a rotation phase precedes the translation.
    pub(crate) fn begin_motion(
        &mut self,
        to: CellCoord,
        heading: f32,
        tuning: &MotionTuning,
        tile_length: f32,
    ) -> bool {
        let shortest = shortest_between(heading, self.angle_degrees);
        let rotates = shortest.abs() >= tuning.rotation_threshold_degrees;
        let end_angle = self.angle_degrees - shortest;
        let rotation = if rotates {
            tuning.rotation()
        } else {
            Duration::ZERO
        };

        if !rotates {
            self.angle_degrees = end_angle;
        }

        self.motion = Some(Motion {
            from: self.position,
            to: WorldPoint::cell_center(to, tile_length),
            to_cell: to,
            start_angle: self.angle_degrees,
            end_angle,
            rotation,
            translation: tuning.translation(),
            elapsed: Duration::ZERO,
        });
        rotates
    }

    /// Advances the in-flight motion, updating the pose.
    pub(crate) fn advance_motion(&mut self, dt: Duration) -> MotionProgress {
        let Some(motion) = self.motion.as_mut() else {
            return MotionProgress::Idle;
        };

        motion.elapsed = motion.elapsed.saturating_add(dt);
        let (position, angle) = motion.pose();
        self.position = position;
        self.angle_degrees = angle;

        if motion.elapsed < motion.total() {
            return MotionProgress::InFlight;
        }

        let cell = motion.to_cell;
        self.angle_degrees = wrap_degrees(self.angle_degrees);
        self.motion = None;
        MotionProgress::Completed { cell }
    }

    /// Recomputes the cell under the harvester.
    ///
    /// Returns the previous and new cell when they differ.
    pub(crate) fn sync_cell(
        &mut self,
        tile_length: f32,
        columns: u32,
        rows: u32,
    ) -> Option<(CellCoord, CellCoord)> {
        let cell = self
            .position
            .containing_cell(tile_length)
            .filter(|cell| cell.column() < columns && cell.row() < rows)?;
        if cell == self.cell {
            return None;
        }
        let previous = self.cell;
        self.cell = cell;
        Some((previous, cell))
    }

    /// Adds as much of `raw` as fits into the hold.
    pub(crate) fn load(&mut self, raw: u32) -> HarvestOutcome {
        let outcome = HarvestOutcome::resolve(raw, self.carrying, self.capacity);
        self.carrying = self
            .carrying
            .saturating_add(outcome.added())
            .min(self.capacity);
        outcome
    }

    /// Empties the hold, returning what it contained.
    pub(crate) fn unload(&mut self) -> u32 {
        std::mem::take(&mut self.carrying)
    }

    pub(crate) fn snapshot(&self) -> HarvesterSnapshot {
        HarvesterSnapshot {
            cell: self.cell,
            position: self.position,
            angle_degrees: self.angle_degrees,
            motion_busy: self.is_busy(),
            carrying: self.carrying,
            capacity: self.capacity,
        }
    }
}

/// Signed shortest rotation from `target` to `current`, in `[-180, 180)`.
fn shortest_between(target: f32, current: f32) -> f32 {
    wrap_degrees(current - target)
}

fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use meat_harvest_core::Direction;

    const TILE: f32 = 100.0;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn harvester(capacity: u32) -> Harvester {
        Harvester::at(CellCoord::new(1, 1), TILE, capacity)
    }

    #[test]
    fn partial_fill_discards_excess() {
        let mut harvester = harvester(100);
        harvester.carrying = 90;
        let outcome = harvester.load(30);
        assert_eq!(
            outcome,
            HarvestOutcome::Partial {
                added: 10,
                discarded: 20,
            }
        );
        assert_eq!(harvester.snapshot().carrying, 100);
    }

    #[test]
    fn full_hold_gains_nothing() {
        let mut harvester = harvester(100);
        harvester.carrying = 100;
        let outcome = harvester.load(50);
        assert!(outcome.was_full());
        assert_eq!(harvester.snapshot().carrying, 100);
    }

    #[test]
    fn carrying_never_exceeds_capacity() {
        let mut harvester = harvester(37);
        for raw in [5, 0, 100, 13, 1, 250] {
            let _ = harvester.load(raw);
            assert!(harvester.snapshot().carrying <= 37);
        }
        assert_eq!(harvester.unload(), 37);
        assert_eq!(harvester.snapshot().carrying, 0);
    }

    #[test]
    fn straight_move_skips_rotation() {
        let mut harvester = harvester(10);
        let rotates = harvester.begin_motion(
            CellCoord::new(2, 1),
            Direction::East.heading_degrees(),
            &MotionTuning::default(),
            TILE,
        );
        assert!(!rotates);
        assert!(harvester.is_busy());

        assert_eq!(harvester.advance_motion(ms(250)), MotionProgress::InFlight);
        assert_eq!(harvester.snapshot().position, WorldPoint::new(200.0, 150.0));

        assert_eq!(
            harvester.advance_motion(ms(250)),
            MotionProgress::Completed {
                cell: CellCoord::new(2, 1)
            }
        );
        assert!(!harvester.is_busy());
        assert_eq!(harvester.snapshot().position, WorldPoint::new(250.0, 150.0));
        assert_eq!(harvester.advance_motion(ms(16)), MotionProgress::Idle);
    }

    #[test]
    fn turning_move_rotates_before_translating() {
        let mut harvester = harvester(10);
        let rotates = harvester.begin_motion(
            CellCoord::new(1, 2),
            Direction::South.heading_degrees(),
            &MotionTuning::default(),
            TILE,
        );
        assert!(rotates);

        assert_eq!(harvester.advance_motion(ms(100)), MotionProgress::InFlight);
        let halfway = harvester.snapshot();
        assert_eq!(halfway.position, WorldPoint::new(150.0, 150.0));
        assert!((halfway.angle_degrees - 45.0).abs() < 1e-3);

        assert_eq!(harvester.advance_motion(ms(100)), MotionProgress::InFlight);
        let turned = harvester.snapshot();
        assert_eq!(turned.position, WorldPoint::new(150.0, 150.0));
        assert!((turned.angle_degrees - 90.0).abs() < 1e-3);

        assert_eq!(
            harvester.advance_motion(ms(500)),
            MotionProgress::Completed {
                cell: CellCoord::new(1, 2)
            }
        );
    }

    #[test]
    fn rotation_takes_the_short_way_round() {
        assert!((shortest_between(-90.0, 180.0) - (-90.0)).abs() < 1e-3);
        assert!((shortest_between(180.0, -90.0) - 90.0).abs() < 1e-3);
        assert!(shortest_between(0.0, 0.5).abs() < 1.0);
        assert!((wrap_degrees(270.0) - (-90.0)).abs() < 1e-3);
    }

    #[test]
    fn sync_cell_reports_transitions_once() {
        let mut harvester = harvester(10);
        assert_eq!(harvester.sync_cell(TILE, 4, 4), None);
        let _ = harvester.begin_motion(CellCoord::new(2, 1), 0.0, &MotionTuning::default(), TILE);
        let _ = harvester.advance_motion(ms(300));
        assert_eq!(
            harvester.sync_cell(TILE, 4, 4),
            Some((CellCoord::new(1, 1), CellCoord::new(2, 1)))
        );
        assert_eq!(harvester.sync_cell(TILE, 4, 4), None);
    }

    #[test]
    fn resting_cell_leads_the_recorded_cell() {
        let mut harvester = harvester(10);
        let _ = harvester.begin_motion(CellCoord::new(2, 1), 0.0, &MotionTuning::default(), TILE);
        let _ = harvester.advance_motion(ms(500));
        assert_eq!(harvester.cell(), CellCoord::new(1, 1));
        assert_eq!(harvester.resting_cell(TILE), CellCoord::new(2, 1));
    }
}
