#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Meat Harvest engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that systems and
//! presentation layers react to. Stage tables live here as well because they
//! are immutable configuration shared by every plant of a kind.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Meat Harvest.";

/// Frame shown when a stage or tile carries no frame of its own.
pub const FALLBACK_FRAME: Frame = Frame::new(0);

/// Lifecycle of a single harvesting round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Plants grow, spores fly and the harvester accepts steering.
    Running,
    /// No healthy plant remains; the round is frozen.
    Terminated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the harvester move a single cell in the given direction.
    ///
    /// At most one request is honoured per tick; requests arriving while the
    /// harvester is moving are dropped.
    SteerHarvester {
        /// Direction of travel for the requested move.
        direction: Direction,
    },
    /// Releases a burst of spores from the harvester's current cell.
    EmitTestSpore,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that a plant moved on to another growth stage.
    PlantGrew {
        /// Cell hosting the plant.
        cell: CellCoord,
        /// Index of the stage the plant entered.
        stage: usize,
    },
    /// Reports that a plant became infested.
    PlantInfested {
        /// Cell hosting the plant.
        cell: CellCoord,
        /// What caused the infestation.
        cause: InfestationCause,
    },
    /// Confirms that a spore entered the active set.
    SporeEmitted {
        /// Identifier allocated to the spore.
        spore: SporeId,
        /// Cell whose centre the spore was released from.
        cell: CellCoord,
        /// Direction the spore travels in.
        direction: Direction,
    },
    /// Confirms that a spore left the active set.
    SporeDestroyed {
        /// Identifier of the spore.
        spore: SporeId,
        /// Cell the spore collided with, if it was still inside the grid.
        cell: Option<CellCoord>,
        /// Outcome of the collision.
        impact: SporeImpact,
    },
    /// Confirms that the harvester accepted a move.
    HarvesterMotionStarted {
        /// Cell the harvester occupied when the move was accepted.
        from: CellCoord,
        /// Destination cell of the move.
        to: CellCoord,
        /// Direction of travel.
        direction: Direction,
        /// Whether a rotation phase precedes the translation.
        rotates: bool,
    },
    /// Signals that the harvester finished its move and is idle again.
    HarvesterMotionCompleted {
        /// Cell the harvester rests on.
        cell: CellCoord,
    },
    /// Reports that a steering request named an illegal destination.
    HarvesterMoveRejected {
        /// Direction of the rejected move.
        direction: Direction,
        /// Specific reason the move was refused.
        reason: MoveRejection,
    },
    /// Announces that the harvester's authoritative cell changed.
    HarvesterEnteredCell {
        /// Cell previously recorded for the harvester.
        from: CellCoord,
        /// Cell the harvester now occupies.
        to: CellCoord,
    },
    /// Reports that the harvester harvested a plant.
    PlantHarvested {
        /// Cell hosting the plant.
        cell: CellCoord,
        /// Raw yield produced by the plant.
        value: u32,
        /// How much of the yield ended up in the harvester.
        outcome: HarvestOutcome,
    },
    /// Reports that the harvester unloaded at the barn.
    BarnDeposit {
        /// Amount transferred from the harvester.
        amount: u32,
        /// Running total sold during the round.
        sold: u64,
    },
    /// Reports that the number of healthy plants changed.
    HealthyPlantsChanged {
        /// Healthy plants remaining on the grid.
        count: usize,
    },
    /// Announces that the round ended because no healthy plant remains.
    RoundTerminated {
        /// Total sold over the round.
        sold: u64,
    },
}

/// Cause attached to a [`Event::PlantInfested`] notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InfestationCause {
    /// The plant turned on its own while changing stage.
    Spontaneous,
    /// A spore landed on the plant.
    Spore {
        /// Spore that carried the infestation.
        spore: SporeId,
    },
}

/// Resolution of a spore collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SporeImpact {
    /// The spore infested the plant it landed on.
    Infested,
    /// The spore hit a surface it cannot infest.
    Blocked,
    /// The spore drifted outside the grid.
    LeftGrid,
}

/// Reasons a steering request may be refused by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The destination lies outside the grid.
    OutOfBounds,
    /// The destination is an impassable tile.
    Impassable,
}

/// Portion of a harvest yield that reached the harvester's hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarvestOutcome {
    /// The entire yield fit into the hold.
    Collected {
        /// Amount added to the hold.
        added: u32,
    },
    /// The hold filled up; the excess was discarded.
    Partial {
        /// Amount added to the hold.
        added: u32,
        /// Amount that did not fit and was lost.
        discarded: u32,
    },
    /// The hold was already full; the whole yield was lost.
    Full {
        /// Amount that was lost.
        discarded: u32,
    },
}

impl HarvestOutcome {
    /// Resolves the outcome of adding `raw` to a hold carrying `carrying` of `capacity`.
    #[must_use]
    pub fn resolve(raw: u32, carrying: u32, capacity: u32) -> Self {
        if carrying >= capacity {
            return Self::Full { discarded: raw };
        }

        let room = capacity - carrying;
        if raw <= room {
            Self::Collected { added: raw }
        } else {
            Self::Partial {
                added: room,
                discarded: raw - room,
            }
        }
    }

    /// Amount that was added to the hold.
    #[must_use]
    pub const fn added(&self) -> u32 {
        match self {
            Self::Collected { added } | Self::Partial { added, .. } => *added,
            Self::Full { .. } => 0,
        }
    }

    /// Reports whether the hold was already full before harvesting.
    #[must_use]
    pub const fn was_full(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}

/// Cardinal movement directions available to the harvester and spores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every cardinal direction in clockwise order starting north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Heading in degrees, measured clockwise from east with y pointing down.
    #[must_use]
    pub const fn heading_degrees(self) -> f32 {
        match self {
            Self::East => 0.0,
            Self::South => 90.0,
            Self::West => 180.0,
            Self::North => -90.0,
        }
    }

    /// Unit vector in world space (y grows downward).
    #[must_use]
    pub const fn unit_vector(self) -> (f32, f32) {
        match self {
            Self::North => (0.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }
}

/// Unique identifier assigned to a spore.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SporeId(u32);

impl SporeId {
    /// Creates a new spore identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into a tile sheet used by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame(u32);

impl Frame {
    /// Creates a new frame index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying frame index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the neighbouring cell one step away, if it lies inside `columns x rows`.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (Some(self.column), self.row.checked_sub(1)),
            Direction::South => (Some(self.column), self.row.checked_add(1)),
            Direction::West => (self.column.checked_sub(1), Some(self.row)),
            Direction::East => (self.column.checked_add(1), Some(self.row)),
        };
        let (column, row) = (column?, row?);
        (column < columns && row < rows).then(|| CellCoord::new(column, row))
    }
}

/// Continuous position measured in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate, growing downward.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Centre of the provided cell for tiles of `tile_length` world units.
    #[must_use]
    pub fn cell_center(cell: CellCoord, tile_length: f32) -> Self {
        Self {
            x: (cell.column() as f32 + 0.5) * tile_length,
            y: (cell.row() as f32 + 0.5) * tile_length,
        }
    }

    /// Cell containing the point, or `None` when it lies at negative coordinates.
    ///
    /// The caller is responsible for checking the upper grid bounds.
    #[must_use]
    pub fn containing_cell(self, tile_length: f32) -> Option<CellCoord> {
        if tile_length <= 0.0 || !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        let column = (self.x / tile_length).floor();
        let row = (self.y / tile_length).floor();
        if column < 0.0 || row < 0.0 || column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Linear interpolation between two points with `t` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, other: WorldPoint, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Translates the point by `distance` along `direction`.
    #[must_use]
    pub fn offset(self, direction: Direction, distance: f32) -> Self {
        let (dx, dy) = direction.unit_vector();
        Self {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
        }
    }
}

/// One step in a plant's fixed growth sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    frames: Vec<Frame>,
    #[serde(default)]
    infested_frames: Vec<Frame>,
    duration_ms: u64,
    value: u32,
    #[serde(default)]
    terminal: bool,
}

impl Stage {
    /// Creates a non-terminal, non-infestable stage.
    #[must_use]
    pub fn new(frames: Vec<Frame>, duration: Duration, value: u32) -> Self {
        Self {
            frames,
            infested_frames: Vec::new(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            value,
            terminal: false,
        }
    }

    /// Attaches the frames shown while infested, making the stage infestable.
    #[must_use]
    pub fn with_infested_frames(mut self, infested_frames: Vec<Frame>) -> Self {
        self.infested_frames = infested_frames;
        self
    }

    /// Marks the stage as terminal so natural growth stops there.
    #[must_use]
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Frames shown while the plant is healthy.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frames shown while the plant is infested.
    #[must_use]
    pub fn infested_frames(&self) -> &[Frame] {
        &self.infested_frames
    }

    /// Time spent in the stage before moving on.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Yield produced when a healthy plant is harvested in this stage.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Whether natural growth halts at this stage.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Whether a plant in this stage can become infested.
    #[must_use]
    pub fn is_infestable(&self) -> bool {
        !self.infested_frames.is_empty()
    }
}

/// Ordered, non-empty list of stages shared by every plant of a kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    /// Creates a stage table, rejecting empty stage lists.
    pub fn new(stages: Vec<Stage>) -> Result<Self, StageTableError> {
        if stages.is_empty() {
            return Err(StageTableError::Empty);
        }
        Ok(Self { stages })
    }

    /// Creates a stage table from a guaranteed first stage and any followers.
    #[must_use]
    pub fn with_first(first: Stage, rest: Vec<Stage>) -> Self {
        let mut stages = Vec::with_capacity(rest.len() + 1);
        stages.push(first);
        stages.extend(rest);
        Self { stages }
    }

    /// Number of stages in the table. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Index of the final stage.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.stages.len() - 1
    }

    /// Stage at `index`, clamped to the final stage when out of range.
    #[must_use]
    pub fn stage(&self, index: usize) -> &Stage {
        &self.stages[index.min(self.last_index())]
    }

    /// Iterator over the stages in growth order.
    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// Whether any stage of the table can be infested.
    #[must_use]
    pub fn has_infestable_stage(&self) -> bool {
        self.stages.iter().any(Stage::is_infestable)
    }
}

impl TryFrom<Vec<Stage>> for StageTable {
    type Error = StageTableError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<StageTable> for Vec<Stage> {
    fn from(table: StageTable) -> Self {
        table.stages
    }
}

/// Reasons a stage table cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StageTableError {
    /// The table contained no stages.
    #[error("a stage table must contain at least one stage")]
    Empty,
}

/// Immutable representation of the harvester used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarvesterSnapshot {
    /// Authoritative cell derived from the world position.
    pub cell: CellCoord,
    /// Continuous world position.
    pub position: WorldPoint,
    /// Facing angle in degrees.
    pub angle_degrees: f32,
    /// Indicates whether a move is in flight.
    pub motion_busy: bool,
    /// Amount currently held.
    pub carrying: u32,
    /// Maximum amount the hold accepts.
    pub capacity: u32,
}

/// Immutable representation of a single spore used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SporeSnapshot {
    /// Identifier allocated to the spore.
    pub id: SporeId,
    /// Continuous world position.
    pub position: WorldPoint,
    /// Direction of travel.
    pub direction: Direction,
}

/// Read-only snapshot describing every active spore.
#[derive(Clone, Debug, Default)]
pub struct SporeView {
    snapshots: Vec<SporeSnapshot>,
}

impl SporeView {
    /// Creates a new spore view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SporeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured spore snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SporeSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured spores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no spore is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SporeSnapshot> {
        self.snapshots
    }
}

/// Variant of a grid tile as seen by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// A plant together with its growth state.
    Plant {
        /// Index of the plant's current stage.
        stage: usize,
        /// Whether the plant is infested.
        infested: bool,
    },
    /// The collection point.
    Barn,
    /// A tile nothing can enter.
    Impassable,
}

/// Immutable representation of a single tile used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSnapshot {
    /// Cell occupied by the tile.
    pub cell: CellCoord,
    /// Variant of the tile.
    pub kind: TileKind,
    /// Frame the renderer should show.
    pub frame: Frame,
}

/// Round-level totals exposed to HUD collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Current lifecycle state.
    pub status: RoundStatus,
    /// Total sold at the barn.
    pub sold: u64,
    /// Healthy plants remaining.
    pub healthy_plants: usize,
}
