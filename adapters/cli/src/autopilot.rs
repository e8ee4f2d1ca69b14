//! Scripted driver that replays a move string against the harvester.

use anyhow::{bail, Result};
use meat_harvest_core::{Direction, Event};
use meat_harvest_rendering::FrameInput;

/// Cycles through a scripted list of moves, one per completed motion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Autopilot {
    script: Vec<Direction>,
    cursor: usize,
    waiting: bool,
}

impl Autopilot {
    /// Parses a script of `U`, `D`, `L` and `R` characters.
    ///
    /// Whitespace and commas are ignored and letters are case-insensitive.
    pub(crate) fn parse(script: &str) -> Result<Self> {
        let mut moves = Vec::new();
        for (index, code) in script.chars().enumerate() {
            let direction = match code.to_ascii_uppercase() {
                'U' => Direction::North,
                'D' => Direction::South,
                'L' => Direction::West,
                'R' => Direction::East,
                ',' => continue,
                c if c.is_whitespace() => continue,
                other => bail!("unknown move '{other}' at position {index}; expected U, D, L or R"),
            };
            moves.push(direction);
        }
        Ok(Self {
            script: moves,
            cursor: 0,
            waiting: false,
        })
    }

    /// Input to feed the steering system on this frame.
    pub(crate) fn input(&mut self) -> FrameInput {
        if self.waiting {
            return FrameInput::default();
        }
        let Some(direction) = self.script.get(self.cursor).copied() else {
            return FrameInput::default();
        };
        self.waiting = true;
        FrameInput {
            up: direction == Direction::North,
            down: direction == Direction::South,
            left: direction == Direction::West,
            right: direction == Direction::East,
            test_spore: false,
        }
    }

    /// Moves on to the next scripted step once the world resolved the last one.
    pub(crate) fn observe(&mut self, events: &[Event]) {
        for event in events {
            if matches!(
                event,
                Event::HarvesterMotionCompleted { .. } | Event::HarvesterMoveRejected { .. }
            ) {
                self.advance();
            }
        }
    }

    fn advance(&mut self) {
        self.waiting = false;
        if !self.script.is_empty() {
            self.cursor = (self.cursor + 1) % self.script.len();
        }
    }
}
