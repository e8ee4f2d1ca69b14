#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Meat Harvest.
//!
//! The world owns the grid, the active spores and the harvester. Every
//! mutation goes through [`apply`]; [`Command::Tick`] integrates plants,
//! spores and the harvester in a fixed order and evaluates the terminal
//! condition.

mod config;
mod grid;
mod harvester;
mod plant;
mod spores;

use std::time::Duration;

use meat_harvest_core::{
    CellCoord, Command, Direction, Event, InfestationCause, RoundStatus, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};

pub use config::{GrowthPace, InfestationTuning, MotionTuning, RoundConfig, MAX_GROWTH_PACE};
pub use grid::{
    meat_stages, Grid, LayoutError, Tile, TileFactory, TilePalette, BARN_FRAME, DEFAULT_LAYOUT,
    IMPASSABLE_FRAME,
};
pub use plant::{Plant, PlantAdvance};

use harvester::{Harvester, MotionProgress};
use spores::{Flight, SporeField};

/// Reasons a round cannot be set up.
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    /// The layout could not be turned into a grid.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// The harvester could not carry anything.
    #[error("harvester capacity must be positive")]
    ZeroCapacity,
    /// Tiles would have no usable size.
    #[error("tile length must be a positive finite number, got {0}")]
    InvalidTileLength(f32),
    /// Plants would grow at an unusable pace.
    #[error("growth pace must lie within (0, {max_pace}] with min <= max, got {min}..{max}")]
    InvalidGrowthPace {
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
        /// Largest accepted multiplier.
        max_pace: f32,
    },
}

/// Represents the authoritative Meat Harvest world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: RoundConfig,
    grid: Grid,
    spores: SporeField,
    harvester: Harvester,
    pending_steer: Option<Direction>,
    pending_test_spore: bool,
    rng: ChaCha8Rng,
    sold: u64,
    healthy_plants: usize,
    status: RoundStatus,
    tick_index: u64,
}

impl World {
    /// Creates a round on the default meat farm layout.
    pub fn new(config: RoundConfig) -> Result<Self, SetupError> {
        Self::from_layout(DEFAULT_LAYOUT, &TilePalette::meat_farm(), config)
    }

    /// Creates a round from a textual layout and the palette that decodes it.
    pub fn from_layout(
        layout: &str,
        palette: &TilePalette,
        config: RoundConfig,
    ) -> Result<Self, SetupError> {
        if config.harvester_capacity == 0 {
            return Err(SetupError::ZeroCapacity);
        }
        if !(config.tile_length.is_finite() && config.tile_length > 0.0) {
            return Err(SetupError::InvalidTileLength(config.tile_length));
        }
        if !config.growth_pace.is_valid() {
            return Err(SetupError::InvalidGrowthPace {
                min: config.growth_pace.min,
                max: config.growth_pace.max,
                max_pace: MAX_GROWTH_PACE,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let grid = Grid::from_layout(layout, palette, &config.growth_pace, &mut rng)?;
        let harvester = Harvester::at(grid.barn(), config.tile_length, config.harvester_capacity);
        let healthy_plants = grid.healthy_plants();
        debug!(
            healthy_plants,
            capacity = config.harvester_capacity,
            seed = config.rng_seed,
            "round set up"
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            config,
            grid,
            spores: SporeField::default(),
            harvester,
            pending_steer: None,
            pending_test_spore: false,
            rng,
            sold: 0,
            healthy_plants,
            status: RoundStatus::Running,
            tick_index: 0,
        })
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.status == RoundStatus::Terminated {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let mut changed = false;

        let mut spore_sources: Vec<CellCoord> = Vec::new();
        for (cell, plant) in self.grid.plants_mut() {
            let report = plant.advance(dt, &self.config.infestation, &mut self.rng);
            if report.grew {
                changed = true;
                out_events.push(Event::PlantGrew {
                    cell,
                    stage: plant.stage_index(),
                });
            }
            if report.infested {
                out_events.push(Event::PlantInfested {
                    cell,
                    cause: InfestationCause::Spontaneous,
                });
            }
            if report.emits_spores {
                spore_sources.push(cell);
            }
        }

        let flight = Flight {
            speed: self.config.spore_speed,
            tile_length: self.config.tile_length,
            reseed: self.config.infestation.reseed(),
        };
        if self.spores.advance(dt, flight, &mut self.grid, out_events) {
            changed = true;
        }
        if std::mem::take(&mut self.pending_test_spore) {
            spore_sources.push(self.harvester.cell());
        }
        for cell in spore_sources {
            self.spores.burst(cell, self.config.tile_length, out_events);
        }

        if let MotionProgress::Completed { cell } = self.harvester.advance_motion(dt) {
            out_events.push(Event::HarvesterMotionCompleted { cell });
        }
        if let Some(direction) = self.pending_steer.take() {
            self.steer(direction, out_events);
        }

        if let Some((from, to)) = self.harvester.sync_cell(
            self.config.tile_length,
            self.grid.columns(),
            self.grid.rows(),
        ) {
            changed = true;
            out_events.push(Event::HarvesterEnteredCell { from, to });
            self.interact(to, out_events);
        }

        if changed {
            let count = self.grid.healthy_plants();
            if count != self.healthy_plants {
                self.healthy_plants = count;
                out_events.push(Event::HealthyPlantsChanged { count });
            }
        }

        self.check_terminal(out_events);
    }

    fn steer(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        if self.harvester.is_busy() {
            return;
        }

        // The recorded cell lags a motion that completed this tick.
        let from = self.harvester.resting_cell(self.config.tile_length);
        match self.grid.destination(from, direction) {
            Ok(to) => {
                let rotates = self.harvester.begin_motion(
                    to,
                    direction.heading_degrees(),
                    &self.config.motion,
                    self.config.tile_length,
                );
                out_events.push(Event::HarvesterMotionStarted {
                    from,
                    to,
                    direction,
                    rotates,
                });
            }
            Err(reason) => {
                debug!(?direction, ?reason, "harvester move rejected");
                out_events.push(Event::HarvesterMoveRejected { direction, reason });
            }
        }
    }

    fn interact(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        match self.grid.tile_mut(cell) {
            Some(Tile::Barn { .. }) => {
                let amount = self.harvester.unload();
                self.sold = self.sold.saturating_add(u64::from(amount));
                out_events.push(Event::BarnDeposit {
                    amount,
                    sold: self.sold,
                });
            }
            Some(Tile::Plant(plant)) => {
                let value = plant.harvest();
                let outcome = self.harvester.load(value);
                out_events.push(Event::PlantHarvested {
                    cell,
                    value,
                    outcome,
                });
            }
            Some(Tile::Impassable { .. }) | None => {}
        }
    }

    fn check_terminal(&mut self, out_events: &mut Vec<Event>) {
        if self.healthy_plants != 0 || self.status == RoundStatus::Terminated {
            return;
        }
        self.status = RoundStatus::Terminated;
        info!(
            sold = self.sold,
            ticks = self.tick_index,
            "no healthy plants remain; round over"
        );
        out_events.push(Event::RoundTerminated { sold: self.sold });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SteerHarvester { direction } => {
            if world.status == RoundStatus::Running && world.pending_steer.is_none() {
                world.pending_steer = Some(direction);
            }
        }
        Command::EmitTestSpore => {
            if world.status == RoundStatus::Running {
                world.pending_test_spore = true;
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Grid, RoundConfig, World};
    use meat_harvest_core::{
        CellCoord, Frame, HarvesterSnapshot, RoundSnapshot, RoundStatus, SporeView, TileSnapshot,
    };
    use std::time::Duration;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the round configuration.
    #[must_use]
    pub fn config(world: &World) -> &RoundConfig {
        &world.config
    }

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Current frame of every tile in row-major order.
    #[must_use]
    pub fn tile_frames(world: &World) -> Vec<Frame> {
        world
            .grid
            .iter()
            .map(|(_, tile)| tile.current_frame())
            .collect()
    }

    /// Captures every tile for presentation in row-major order.
    #[must_use]
    pub fn tiles(world: &World) -> Vec<TileSnapshot> {
        world.grid.snapshots()
    }

    /// Captures a read-only view of the plant hosted at `cell`.
    #[must_use]
    pub fn plant(world: &World, cell: CellCoord) -> Option<PlantSnapshot> {
        let plant = world.grid.tile(cell)?.as_plant()?;
        Some(PlantSnapshot {
            cell,
            stage: plant.stage_index(),
            timer: plant.timer(),
            infested: plant.is_infested(),
            maturation_cycles: plant.maturation_cycles(),
            frame: plant.current_frame(),
        })
    }

    /// Captures the harvester's state.
    #[must_use]
    pub fn harvester(world: &World) -> HarvesterSnapshot {
        world.harvester.snapshot()
    }

    /// Captures a read-only view of the active spores.
    #[must_use]
    pub fn spore_view(world: &World) -> SporeView {
        world.spores.view()
    }

    /// Captures round-level totals.
    #[must_use]
    pub fn round(world: &World) -> RoundSnapshot {
        RoundSnapshot {
            status: world.status,
            sold: world.sold,
            healthy_plants: world.healthy_plants,
        }
    }

    /// Current lifecycle state of the round.
    #[must_use]
    pub fn status(world: &World) -> RoundStatus {
        world.status
    }

    /// Number of ticks processed while the round was running.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Immutable representation of a single plant used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PlantSnapshot {
        /// Cell hosting the plant.
        pub cell: CellCoord,
        /// Index of the current stage.
        pub stage: usize,
        /// Time left in the current stage.
        pub timer: Duration,
        /// Whether the plant is infested.
        pub infested: bool,
        /// Transitions into infestable stages so far.
        pub maturation_cycles: u32,
        /// Frame the renderer should show.
        pub frame: Frame,
    }
}
