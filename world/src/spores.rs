//! Airborne spores that carry infestation between cells.

use std::time::Duration;

use meat_harvest_core::{
    CellCoord, Direction, Event, InfestationCause, SporeId, SporeImpact, SporeSnapshot, SporeView,
    WorldPoint,
};
use tracing::debug;

use crate::grid::{Grid, Tile};

#[derive(Clone, Debug)]
struct Spore {
    id: SporeId,
    source: CellCoord,
    position: WorldPoint,
    direction: Direction,
}

/// Parameters shared by every spore during a tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Flight {
    pub(crate) speed: f32,
    pub(crate) tile_length: f32,
    pub(crate) reseed: Duration,
}

/// Active spore set owned by the world.
#[derive(Clone, Debug, Default)]
pub(crate) struct SporeField {
    spores: Vec<Spore>,
    next_id: u32,
}

impl SporeField {
    /// Releases one spore per cardinal direction from the centre of `cell`.
    pub(crate) fn burst(
        &mut self,
        cell: CellCoord,
        tile_length: f32,
        out_events: &mut Vec<Event>,
    ) {
        let origin = WorldPoint::cell_center(cell, tile_length);
        for direction in Direction::ALL {
            let id = SporeId::new(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            self.spores.push(Spore {
                id,
                source: cell,
                position: origin,
                direction,
            });
            out_events.push(Event::SporeEmitted {
                spore: id,
                cell,
                direction,
            });
        }
        debug!(column = cell.column(), row = cell.row(), "spore burst");
    }

    /// Moves every spore and resolves the cell it lands in.
    ///
    /// A spore never collides with the cell it was released from.
    ///
    /// Returns `true` when any plant became infested.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        flight: Flight,
        grid: &mut Grid,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let distance = flight.speed * dt.as_secs_f32() * 1_000.0;
        let mut infested_any = false;

        self.spores.retain_mut(|spore| {
            spore.position = spore.position.offset(spore.direction, distance);
            let cell = spore.position.containing_cell(flight.tile_length);
            if cell == Some(spore.source) {
                return true;
            }
            let tile = cell.and_then(|cell| grid.tile_mut(cell));
            let impact = match tile {
                None => Some(SporeImpact::LeftGrid),
                Some(Tile::Barn { .. } | Tile::Impassable { .. }) => Some(SporeImpact::Blocked),
                Some(Tile::Plant(plant)) => {
                    if plant.is_infested() {
                        None
                    } else if plant.can_infest() {
                        let _ = plant.infest(flight.reseed);
                        Some(SporeImpact::Infested)
                    } else if plant.ever_infestable() {
                        None
                    } else {
                        Some(SporeImpact::Blocked)
                    }
                }
            };

            let Some(impact) = impact else {
                return true;
            };

            let cell = if impact == SporeImpact::LeftGrid {
                None
            } else {
                cell
            };
            if let (SporeImpact::Infested, Some(cell)) = (impact, cell) {
                infested_any = true;
                out_events.push(Event::PlantInfested {
                    cell,
                    cause: InfestationCause::Spore { spore: spore.id },
                });
            }
            out_events.push(Event::SporeDestroyed {
                spore: spore.id,
                cell,
                impact,
            });
            false
        });

        infested_any
    }

    pub(crate) fn view(&self) -> SporeView {
        SporeView::from_snapshots(
            self.spores
                .iter()
                .map(|spore| SporeSnapshot {
                    id: spore.id,
                    position: spore.position,
                    direction: spore.direction,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GrowthPace,
        grid::{TileFactory, TilePalette},
        plant::Plant,
    };
    use meat_harvest_core::{Frame, Stage, StageTable};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    const TILE: f32 = 100.0;
    const SECOND: Duration = Duration::from_secs(1);
    const FRAME: Duration = Duration::from_millis(16);

    fn flight() -> Flight {
        Flight {
            speed: 0.1,
            tile_length: TILE,
            reseed: Duration::from_millis(8_000),
        }
    }

    fn palette() -> TilePalette {
        let ripe = StageTable::with_first(
            Stage::new(vec![Frame::new(4)], Duration::from_secs(100), 10)
                .with_infested_frames(vec![Frame::new(8)]),
            Vec::new(),
        );
        let sprout = StageTable::with_first(
            Stage::new(vec![Frame::new(0)], Duration::from_secs(100), 1),
            vec![
                Stage::new(vec![Frame::new(1)], Duration::from_secs(1), 2)
                    .with_infested_frames(vec![Frame::new(8)]),
            ],
        );
        let stone = StageTable::with_first(
            Stage::new(vec![Frame::new(12)], Duration::from_secs(100), 0),
            Vec::new(),
        );
        TilePalette::meat_farm()
            .with(
                'r',
                TileFactory::Plant {
                    table: Arc::new(ripe),
                },
            )
            .with(
                's',
                TileFactory::Plant {
                    table: Arc::new(sprout),
                },
            )
            .with(
                'n',
                TileFactory::Plant {
                    table: Arc::new(stone),
                },
            )
    }

    fn grid(layout: &str) -> Grid {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        Grid::from_layout(layout, &palette(), &GrowthPace::fixed(), &mut rng).expect("layout")
    }

    fn plant_at(grid: &Grid, column: u32, row: u32) -> &Plant {
        grid.tile(CellCoord::new(column, row))
            .and_then(Tile::as_plant)
            .expect("plant tile")
    }

    fn east_only(field: &mut SporeField, cell: CellCoord) {
        let mut events = Vec::new();
        field.burst(cell, TILE, &mut events);
        field.spores.retain(|spore| spore.direction == Direction::East);
    }

    #[test]
    fn burst_emits_one_spore_per_direction() {
        let mut field = SporeField::default();
        let mut events = Vec::new();
        field.burst(CellCoord::new(1, 1), TILE, &mut events);

        let view = field.view();
        assert_eq!(view.len(), 4);
        for snapshot in view.iter() {
            assert_eq!(snapshot.position, WorldPoint::new(150.0, 150.0));
        }
        let directions: Vec<Direction> = events
            .iter()
            .filter_map(|event| match event {
                Event::SporeEmitted { direction, .. } => Some(*direction),
                _ => None,
            })
            .collect();
        assert_eq!(directions, Direction::ALL.to_vec());
    }

    #[test]
    fn spore_infests_ripe_neighbour() {
        let mut grid = grid("brr");
        let mut field = SporeField::default();
        east_only(&mut field, CellCoord::new(0, 0));

        let mut events = Vec::new();
        assert!(field.advance(SECOND, flight(), &mut grid, &mut events));
        assert!(plant_at(&grid, 1, 0).is_infested());
        assert!(!plant_at(&grid, 2, 0).is_infested());
        assert!(field.view().is_empty());
        assert!(events.contains(&Event::SporeDestroyed {
            spore: SporeId::new(1),
            cell: Some(CellCoord::new(1, 0)),
            impact: SporeImpact::Infested,
        }));
    }

    #[test]
    fn spore_drifts_over_sprouts_and_infested_plants() {
        let mut grid = grid("bsr");
        let mut field = SporeField::default();
        east_only(&mut field, CellCoord::new(0, 0));

        let mut events = Vec::new();
        assert!(!field.advance(SECOND, flight(), &mut grid, &mut events));
        assert!(events.is_empty());
        assert_eq!(field.view().len(), 1);

        assert!(field.advance(SECOND, flight(), &mut grid, &mut events));
        assert!(plant_at(&grid, 2, 0).is_infested());
        assert!(plant_at(&grid, 1, 0).is_healthy());
    }

    #[test]
    fn never_infestable_plants_block_spores() {
        let mut grid = grid("bnr");
        let mut field = SporeField::default();
        east_only(&mut field, CellCoord::new(0, 0));

        let mut events = Vec::new();
        assert!(!field.advance(SECOND, flight(), &mut grid, &mut events));
        assert!(field.view().is_empty());
        assert!(matches!(
            events.as_slice(),
            [Event::SporeDestroyed {
                impact: SporeImpact::Blocked,
                ..
            }]
        ));
        assert!(plant_at(&grid, 2, 0).is_healthy());
    }

    #[test]
    fn spores_leaving_the_grid_are_lost() {
        let mut grid = grid("rb");
        let mut field = SporeField::default();
        east_only(&mut field, CellCoord::new(1, 0));

        let mut events = Vec::new();
        let _ = field.advance(SECOND, flight(), &mut grid, &mut events);
        assert_eq!(
            events,
            vec![Event::SporeDestroyed {
                spore: SporeId::new(1),
                cell: None,
                impact: SporeImpact::LeftGrid,
            }]
        );
    }

    #[test]
    fn spores_stop_at_walls_and_barn() {
        let mut grid = grid("xrb");
        let mut field = SporeField::default();
        let mut events = Vec::new();
        field.burst(CellCoord::new(1, 0), TILE, &mut events);
        field
            .spores
            .retain(|spore| matches!(spore.direction, Direction::East | Direction::West));

        events.clear();
        let _ = field.advance(SECOND, flight(), &mut grid, &mut events);
        let blocked = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::SporeDestroyed {
                        impact: SporeImpact::Blocked,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(blocked, 2);
        assert!(plant_at(&grid, 1, 0).is_healthy());
    }

    #[test]
    fn spores_clear_their_source_cell_before_colliding() {
        let mut grid = grid("rbr");
        let mut field = SporeField::default();
        let mut events = Vec::new();
        field.burst(CellCoord::new(1, 0), TILE, &mut events);

        events.clear();
        assert!(!field.advance(FRAME, flight(), &mut grid, &mut events));
        assert!(events.is_empty());
        assert_eq!(field.view().len(), 4);

        assert!(field.advance(SECOND, flight(), &mut grid, &mut events));
        assert!(plant_at(&grid, 0, 0).is_infested());
        assert!(plant_at(&grid, 2, 0).is_infested());
        assert!(field.view().is_empty());
    }
}
