//! Tile grid, tile variants and the layout builder.

use std::{collections::HashMap, sync::Arc, time::Duration};

use meat_harvest_core::{
    CellCoord, Direction, Frame, MoveRejection, Stage, StageTable, TileKind, TileSnapshot,
};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::{config::GrowthPace, plant::Plant};

/// Frame shown for the barn tile.
pub const BARN_FRAME: Frame = Frame::new(6);
/// Frame shown for impassable tiles.
pub const IMPASSABLE_FRAME: Frame = Frame::new(7);

/// Default round layout: `x` impassable, `g` meat plant, `b` barn.
pub const DEFAULT_LAYOUT: &str = "
    xxxxxxxxxxxxxxxxxxxxxx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xggggggggggxxggggggggx
    xbgggggggggxxggggggggx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xggggggggggggggggggggx
    xxxxxxxxxxxxxxxxxxxxxx
";

/// Builds the stage table of the default meat plant.
///
/// Young stages cannot be infested. Once ripe, a plant shows its blighted
/// frame while infested, and the expired final stage is where infested plants
/// burst into spores.
#[must_use]
pub fn meat_stages() -> StageTable {
    let ms = Duration::from_millis;
    StageTable::with_first(
        Stage::new(vec![Frame::new(0)], ms(1_000), 1),
        vec![
            Stage::new(vec![Frame::new(1)], ms(1_000), 2),
            Stage::new(vec![Frame::new(2)], ms(1_000), 5)
                .with_infested_frames(vec![Frame::new(9)]),
            Stage::new(vec![Frame::new(3)], ms(1_000), 10)
                .with_infested_frames(vec![Frame::new(10)]),
            // prime cut
            Stage::new(vec![Frame::new(4)], ms(5_000), 100)
                .with_infested_frames(vec![Frame::new(11)]),
            // expired
            Stage::new(vec![Frame::new(5)], ms(0), 0)
                .with_infested_frames(vec![Frame::new(8)])
                .terminal(),
        ],
    )
}

/// One cell of the grid.
#[derive(Clone, Debug)]
pub enum Tile {
    /// A growing organism.
    Plant(Plant),
    /// The collection point.
    Barn {
        /// Frame shown for the tile.
        frame: Frame,
    },
    /// A tile the harvester cannot enter and spores cannot cross.
    Impassable {
        /// Frame shown for the tile.
        frame: Frame,
    },
}

impl Tile {
    /// Frame the renderer should show for the tile.
    #[must_use]
    pub fn current_frame(&self) -> Frame {
        match self {
            Self::Plant(plant) => plant.current_frame(),
            Self::Barn { frame } | Self::Impassable { frame } => *frame,
        }
    }

    /// Reports whether the harvester may enter the tile.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        matches!(self, Self::Plant(_) | Self::Barn { .. })
    }

    /// Returns the hosted plant, if any.
    #[must_use]
    pub const fn as_plant(&self) -> Option<&Plant> {
        match self {
            Self::Plant(plant) => Some(plant),
            _ => None,
        }
    }

    /// Variant descriptor exposed to presentation layers.
    #[must_use]
    pub fn kind(&self) -> TileKind {
        match self {
            Self::Plant(plant) => TileKind::Plant {
                stage: plant.stage_index(),
                infested: plant.is_infested(),
            },
            Self::Barn { .. } => TileKind::Barn,
            Self::Impassable { .. } => TileKind::Impassable,
        }
    }
}

/// Recipe for creating the tile bound to a layout code.
#[derive(Clone, Debug)]
pub enum TileFactory {
    /// Creates a fresh plant from the shared stage table.
    Plant {
        /// Stage table shared by every plant built from this factory.
        table: Arc<StageTable>,
    },
    /// Creates the barn.
    Barn {
        /// Frame shown for the barn.
        frame: Frame,
    },
    /// Creates an impassable tile.
    Impassable {
        /// Frame shown for the tile.
        frame: Frame,
    },
}

impl TileFactory {
    fn build<R>(&self, pace: &GrowthPace, rng: &mut R) -> Tile
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Plant { table } => {
                Tile::Plant(Plant::with_pace(Arc::clone(table), pace.sample(rng)))
            }
            Self::Barn { frame } => Tile::Barn { frame: *frame },
            Self::Impassable { frame } => Tile::Impassable { frame: *frame },
        }
    }
}

/// Mapping from layout characters to tile factories.
#[derive(Clone, Debug, Default)]
pub struct TilePalette {
    factories: HashMap<char, TileFactory>,
}

impl TilePalette {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette understood by [`DEFAULT_LAYOUT`].
    #[must_use]
    pub fn meat_farm() -> Self {
        Self::new()
            .with(
                'g',
                TileFactory::Plant {
                    table: Arc::new(meat_stages()),
                },
            )
            .with('b', TileFactory::Barn { frame: BARN_FRAME })
            .with(
                'x',
                TileFactory::Impassable {
                    frame: IMPASSABLE_FRAME,
                },
            )
    }

    /// Binds `code` to `factory`, replacing any previous binding.
    #[must_use]
    pub fn with(mut self, code: char, factory: TileFactory) -> Self {
        let _ = self.factories.insert(code, factory);
        self
    }

    /// Factory bound to `code`, if any.
    #[must_use]
    pub fn get(&self, code: char) -> Option<&TileFactory> {
        self.factories.get(&code)
    }
}

/// Reasons a layout cannot be turned into a grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contained no non-blank rows.
    #[error("layout contains no rows")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} cells but the first row has {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Length of the first row.
        expected: u32,
        /// Length of the offending row.
        found: u32,
    },
    /// A character has no factory in the palette.
    #[error("unknown cell code '{code}' at column {column}, row {row}")]
    UnknownCode {
        /// The unmapped character.
        code: char,
        /// Column of the character.
        column: u32,
        /// Row of the character.
        row: u32,
    },
    /// No barn tile was found.
    #[error("layout has no barn")]
    MissingBarn,
    /// More than one barn tile was found.
    #[error("layout has a second barn at {second:?}; the first is at {first:?}")]
    DuplicateBarn {
        /// First barn in row-major order.
        first: CellCoord,
        /// The extra barn.
        second: CellCoord,
    },
}

/// Fixed-size rectangular arrangement of tiles.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
    barn: CellCoord,
}

impl Grid {
    /// Builds a grid from a textual layout.
    ///
    /// Blank lines and whitespace inside rows are ignored; every remaining
    /// character must be bound in `palette`. Plants draw their growth pace
    /// from `pace` using `rng`.
    pub fn from_layout<R>(
        layout: &str,
        palette: &TilePalette,
        pace: &GrowthPace,
        rng: &mut R,
    ) -> Result<Self, LayoutError>
    where
        R: Rng + ?Sized,
    {
        let rows: Vec<Vec<char>> = layout
            .lines()
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        let expected = rows.first().map(Vec::len).ok_or(LayoutError::Empty)?;
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(LayoutError::RaggedRow {
                    row: to_u32(index),
                    expected: to_u32(expected),
                    found: to_u32(row.len()),
                });
            }
        }

        let mut tiles = Vec::with_capacity(expected * rows.len());
        let mut barn: Option<CellCoord> = None;
        for (row_index, row) in rows.iter().enumerate() {
            for (column_index, code) in row.iter().copied().enumerate() {
                let cell = CellCoord::new(to_u32(column_index), to_u32(row_index));
                let factory = palette.get(code).ok_or(LayoutError::UnknownCode {
                    code,
                    column: cell.column(),
                    row: cell.row(),
                })?;
                let tile = factory.build(pace, rng);
                if matches!(tile, Tile::Barn { .. }) {
                    if let Some(first) = barn {
                        return Err(LayoutError::DuplicateBarn {
                            first,
                            second: cell,
                        });
                    }
                    barn = Some(cell);
                }
                tiles.push(tile);
            }
        }

        let barn = barn.ok_or(LayoutError::MissingBarn)?;
        let grid = Self {
            columns: to_u32(expected),
            rows: to_u32(rows.len()),
            tiles,
            barn,
        };
        debug!(
            columns = grid.columns,
            rows = grid.rows,
            barn_column = barn.column(),
            barn_row = barn.row(),
            "built grid from layout"
        );
        Ok(grid)
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Cell hosting the barn.
    #[must_use]
    pub const fn barn(&self) -> CellCoord {
        self.barn
    }

    /// Tile at `cell`, or `None` outside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        self.index(cell).and_then(|index| self.tiles.get(index))
    }

    /// Iterator over every tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &Tile)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = to_u32(index);
            (CellCoord::new(index % columns, index / columns), tile)
        })
    }

    /// Number of plants that are not infested.
    #[must_use]
    pub fn healthy_plants(&self) -> usize {
        self.tiles
            .iter()
            .filter_map(Tile::as_plant)
            .filter(|plant| plant.is_healthy())
            .count()
    }

    /// Resolves the cell one step from `from`, refusing illegal destinations.
    pub fn destination(
        &self,
        from: CellCoord,
        direction: Direction,
    ) -> Result<CellCoord, MoveRejection> {
        let to = from
            .step(direction, self.columns, self.rows)
            .ok_or(MoveRejection::OutOfBounds)?;
        match self.tile(to) {
            Some(tile) if tile.is_passable() => Ok(to),
            Some(_) => Err(MoveRejection::Impassable),
            None => Err(MoveRejection::OutOfBounds),
        }
    }

    /// Captures every tile for presentation.
    #[must_use]
    pub fn snapshots(&self) -> Vec<TileSnapshot> {
        self.iter()
            .map(|(cell, tile)| TileSnapshot {
                cell,
                kind: tile.kind(),
                frame: tile.current_frame(),
            })
            .collect()
    }

    pub(crate) fn tile_mut(&mut self, cell: CellCoord) -> Option<&mut Tile> {
        let index = self.index(cell)?;
        self.tiles.get_mut(index)
    }

    pub(crate) fn plants_mut(&mut self) -> impl Iterator<Item = (CellCoord, &mut Plant)> + '_ {
        let columns = self.columns.max(1);
        self.tiles
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, tile)| match tile {
                Tile::Plant(plant) => {
                    let index = to_u32(index);
                    Some((CellCoord::new(index % columns, index / columns), plant))
                }
                _ => None,
            })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
