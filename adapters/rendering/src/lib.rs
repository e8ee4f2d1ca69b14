#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Meat Harvest adapters.

mod ascii;

use anyhow::Result as AnyResult;
use glam::Vec2;
use meat_harvest_core::{
    CellCoord, HarvesterSnapshot, SporeSnapshot, TileKind, TileSnapshot, WorldPoint,
};
use std::{error::Error, fmt, time::Duration};

pub use ascii::{render_ascii, HeadlessBackend};

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the up control is held.
    pub up: bool,
    /// Whether the down control is held.
    pub down: bool,
    /// Whether the left control is held.
    pub left: bool,
    /// Whether the right control is held.
    pub right: bool,
    /// Whether the debug spore control was pressed on this frame.
    pub test_spore: bool,
}

/// Describes a square tile grid that can be rendered by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
    ) -> std::result::Result<Self, RenderingError> {
        if !(tile_length.is_finite() && tile_length > 0.0) {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Cell under a world-space position, or `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        let cell = WorldPoint::new(position.x, position.y).containing_cell(self.tile_length)?;
        (cell.column() < self.columns && cell.row() < self.rows).then_some(cell)
    }
}

/// A single tile as it should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePresentation {
    /// Cell occupied by the tile.
    pub cell: CellCoord,
    /// Variant of the tile.
    pub kind: TileKind,
}

impl From<TileSnapshot> for TilePresentation {
    fn from(snapshot: TileSnapshot) -> Self {
        Self {
            cell: snapshot.cell,
            kind: snapshot.kind,
        }
    }
}

/// Harvester pose and cargo as it should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarvesterPresentation {
    /// World-space position of the harvester centre.
    pub position: Vec2,
    /// Facing angle in degrees; zero faces east and positive turns clockwise.
    pub angle_degrees: f32,
}

impl From<HarvesterSnapshot> for HarvesterPresentation {
    fn from(snapshot: HarvesterSnapshot) -> Self {
        Self {
            position: Vec2::new(snapshot.position.x, snapshot.position.y),
            angle_degrees: snapshot.angle_degrees,
        }
    }
}

/// An airborne spore as it should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SporePresentation {
    /// World-space position of the spore.
    pub position: Vec2,
}

impl From<SporeSnapshot> for SporePresentation {
    fn from(snapshot: SporeSnapshot) -> Self {
        Self {
            position: Vec2::new(snapshot.position.x, snapshot.position.y),
        }
    }
}

/// Scene description combining the tile grid, the harvester and spores.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// Every tile in row-major order.
    pub tiles: Vec<TilePresentation>,
    /// The harvester.
    pub harvester: HarvesterPresentation,
    /// Spores currently in flight.
    pub spores: Vec<SporePresentation>,
    /// HUD lines drawn above the grid.
    pub hud_lines: Vec<String>,
    /// Whether the round has ended.
    pub game_over: bool,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        tile_grid: TileGridPresentation,
        tiles: Vec<TilePresentation>,
        harvester: HarvesterPresentation,
        spores: Vec<SporePresentation>,
    ) -> Self {
        Self {
            tile_grid,
            tiles,
            harvester,
            spores,
            hud_lines: Vec::new(),
            game_over: false,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub window_title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Meat Harvest scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta
    /// and per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive size.
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid_creation_rejects_degenerate_tiles() {
        for tile_length in [0.0, -4.0, f32::NAN] {
            let error = TileGridPresentation::new(4, 4, tile_length)
                .expect_err("degenerate tile length must be rejected");
            assert!(matches!(error, RenderingError::InvalidTileLength { .. }));
        }
    }

    #[test]
    fn cell_at_maps_world_positions() {
        let grid = TileGridPresentation::new(5, 4, 32.0).expect("valid grid");

        assert_eq!(
            grid.cell_at(Vec2::new(40.0, 10.0)),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(grid.cell_at(Vec2::new(170.0, 10.0)), None);
        assert_eq!(grid.cell_at(Vec2::new(-1.0, 10.0)), None);
    }

    #[test]
    fn scene_new_starts_without_hud() {
        let grid = TileGridPresentation::new(1, 1, 32.0).expect("valid grid");
        let harvester = HarvesterPresentation {
            position: Vec2::new(16.0, 16.0),
            angle_degrees: 0.0,
        };
        let scene = Scene::new(grid, Vec::new(), harvester, Vec::new());

        assert!(scene.hud_lines.is_empty());
        assert!(!scene.game_over);
        assert_eq!(scene.harvester, harvester);
    }
}
