#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure steering system translating directional input into harvester commands.

use meat_harvest_core::{Command, Direction, Event, RoundStatus};

/// Input snapshot distilled from adapter-provided frame input data.
///
/// Each flag reports whether the control is currently held; the snapshot is
/// sampled once per frame rather than queued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SteeringInput {
    /// The player requests a move toward row zero.
    pub up: bool,
    /// The player requests a move away from row zero.
    pub down: bool,
    /// The player requests a move toward column zero.
    pub left: bool,
    /// The player requests a move away from column zero.
    pub right: bool,
    /// The player requests a debug spore burst at the harvester.
    pub test_spore: bool,
}

impl SteeringInput {
    /// Creates an input snapshot holding only `direction`.
    #[must_use]
    pub const fn toward(direction: Direction) -> Self {
        Self {
            up: matches!(direction, Direction::North),
            down: matches!(direction, Direction::South),
            left: matches!(direction, Direction::West),
            right: matches!(direction, Direction::East),
            test_spore: false,
        }
    }

    /// Direction the harvester should take, if any control is held.
    ///
    /// When several are held, right wins over left, left over down and down
    /// over up.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        if self.right {
            Some(Direction::East)
        } else if self.left {
            Some(Direction::West)
        } else if self.down {
            Some(Direction::South)
        } else if self.up {
            Some(Direction::North)
        } else {
            None
        }
    }
}

/// Steering system that follows the round lifecycle and emits steering commands.
#[derive(Debug, Clone)]
pub struct Steering {
    status: RoundStatus,
}

impl Default for Steering {
    fn default() -> Self {
        Self::new()
    }
}

impl Steering {
    /// Creates a steering system for a running round.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: RoundStatus::Running,
        }
    }

    /// Consumes world events and the current input snapshot to emit commands.
    pub fn handle(&mut self, events: &[Event], input: SteeringInput, out: &mut Vec<Command>) {
        if events
            .iter()
            .any(|event| matches!(event, Event::RoundTerminated { .. }))
        {
            self.status = RoundStatus::Terminated;
        }

        if self.status == RoundStatus::Terminated {
            return;
        }

        if let Some(direction) = input.direction() {
            out.push(Command::SteerHarvester { direction });
        }
        if input.test_spore {
            out.push(Command::EmitTestSpore);
        }
    }

    /// Lifecycle state observed so far.
    #[must_use]
    pub const fn status(&self) -> RoundStatus {
        self.status
    }
}
