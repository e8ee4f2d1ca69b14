#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoreboard system folding world events into HUD text and audio cues.

use std::time::Duration;

use meat_harvest_core::{CellCoord, Event, HarvestOutcome, RoundSnapshot};
use tracing::trace;

/// How long a flash text stays visible.
pub const FLASH_LIFETIME: Duration = Duration::from_millis(1_000);

/// Sound effects the presentation layer should play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Something was added to the hold.
    Harvest,
    /// The harvester reached a plant with a full hold.
    HoldFull,
    /// Cargo was sold at the barn.
    Deposit,
    /// A plant became infested.
    Infestation,
    /// An infested plant burst into spores.
    SporeBurst,
    /// The round ended.
    GameOver,
}

/// Short-lived text shown over the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    /// Text to draw.
    pub text: String,
    /// Cell the text is anchored to.
    pub cell: CellCoord,
    /// Time left before the text disappears.
    pub remaining: Duration,
}

/// Scoreboard system that tracks round totals from the event stream.
#[derive(Debug, Default)]
pub struct Scoreboard {
    carrying: u32,
    sold: u64,
    healthy_plants: usize,
    game_over: bool,
    barn: Option<CellCoord>,
    flashes: Vec<Flash>,
}

impl Scoreboard {
    /// Creates a scoreboard seeded from the round's opening totals.
    #[must_use]
    pub fn new(round: RoundSnapshot, barn: CellCoord) -> Self {
        Self {
            sold: round.sold,
            healthy_plants: round.healthy_plants,
            barn: Some(barn),
            ..Self::default()
        }
    }

    /// Consumes world events, updating totals and flashes and emitting cues.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Cue>) {
        let mut burst_cells: Vec<CellCoord> = Vec::new();

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.age_flashes(*dt),
                Event::PlantHarvested { cell, outcome, .. } => {
                    self.carrying = self.carrying.saturating_add(outcome.added());
                    match outcome {
                        HarvestOutcome::Full { .. } => {
                            self.flash("Hold full!".to_owned(), *cell);
                            out.push(Cue::HoldFull);
                        }
                        HarvestOutcome::Collected { added }
                        | HarvestOutcome::Partial { added, .. } => {
                            self.flash(format!("+{added}"), *cell);
                            out.push(Cue::Harvest);
                        }
                    }
                }
                Event::BarnDeposit { amount, sold } => {
                    self.carrying = 0;
                    self.sold = *sold;
                    if *amount > 0 {
                        if let Some(barn) = self.barn {
                            self.flash(format!("Sold {amount} tons!"), barn);
                        }
                        out.push(Cue::Deposit);
                    }
                }
                Event::PlantInfested { .. } => out.push(Cue::Infestation),
                Event::SporeEmitted { cell, .. } => {
                    if !burst_cells.contains(cell) {
                        burst_cells.push(*cell);
                        out.push(Cue::SporeBurst);
                    }
                }
                Event::HealthyPlantsChanged { count } => self.healthy_plants = *count,
                Event::RoundTerminated { sold } => {
                    self.sold = *sold;
                    if !self.game_over {
                        self.game_over = true;
                        out.push(Cue::GameOver);
                    }
                }
                _ => {}
            }
        }
    }

    /// HUD lines in display order.
    #[must_use]
    pub fn hud_lines(&self) -> [String; 3] {
        [
            format!("Hauling {} tons of meat", self.carrying),
            format!("Sold {} tons of meat", self.sold),
            format!("{} healthy plants remain", self.healthy_plants),
        ]
    }

    /// Flash texts that are still visible.
    #[must_use]
    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    /// Reports whether the round has ended.
    #[must_use]
    pub const fn game_over(&self) -> bool {
        self.game_over
    }

    /// Amount the harvester is carrying.
    #[must_use]
    pub const fn carrying(&self) -> u32 {
        self.carrying
    }

    /// Total sold at the barn.
    #[must_use]
    pub const fn sold(&self) -> u64 {
        self.sold
    }

    fn flash(&mut self, text: String, cell: CellCoord) {
        trace!(%text, column = cell.column(), row = cell.row(), "flash");
        self.flashes.push(Flash {
            text,
            cell,
            remaining: FLASH_LIFETIME,
        });
    }

    fn age_flashes(&mut self, dt: Duration) {
        self.flashes.retain_mut(|flash| {
            flash.remaining = flash.remaining.saturating_sub(dt);
            !flash.remaining.is_zero()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meat_harvest_core::RoundStatus;

    fn opening() -> Scoreboard {
        Scoreboard::new(
            RoundSnapshot {
                status: RoundStatus::Running,
                sold: 0,
                healthy_plants: 4,
            },
            CellCoord::new(1, 1),
        )
    }

    #[test]
    fn flashes_expire_after_their_lifetime() {
        let mut scoreboard = opening();
        scoreboard.flash("+5".to_owned(), CellCoord::new(2, 2));

        let mut cues = Vec::new();
        scoreboard.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(600),
            }],
            &mut cues,
        );
        assert_eq!(scoreboard.flashes().len(), 1);
        assert_eq!(
            scoreboard.flashes()[0].remaining,
            Duration::from_millis(400)
        );

        scoreboard.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(400),
            }],
            &mut cues,
        );
        assert!(scoreboard.flashes().is_empty());
        assert!(cues.is_empty());
    }
}
