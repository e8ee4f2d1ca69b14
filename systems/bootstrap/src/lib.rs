#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Meat Harvest experience.

use meat_harvest_core::{HarvesterSnapshot, RoundSnapshot};
use meat_harvest_world::{query, Grid, World};

/// Produces data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner(&self, world: &World) -> &'static str {
        query::welcome_banner(world)
    }

    /// Exposes the grid required for rendering.
    #[must_use]
    pub fn grid<'world>(&self, world: &'world World) -> &'world Grid {
        query::grid(world)
    }

    /// Exposes the harvester as it stands when the round opens.
    #[must_use]
    pub fn harvester(&self, world: &World) -> HarvesterSnapshot {
        query::harvester(world)
    }

    /// Exposes the opening round totals.
    #[must_use]
    pub fn round(&self, world: &World) -> RoundSnapshot {
        query::round(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meat_harvest_world::RoundConfig;

    #[test]
    fn opening_state_places_harvester_on_barn() {
        let world = World::new(RoundConfig::default()).expect("default round");
        let bootstrap = Bootstrap;

        assert_eq!(bootstrap.welcome_banner(&world), "Welcome to Meat Harvest.");
        let grid = bootstrap.grid(&world);
        assert_eq!(bootstrap.harvester(&world).cell, grid.barn());
        let round = bootstrap.round(&world);
        assert_eq!(round.sold, 0);
        assert_eq!(round.healthy_plants, grid.healthy_plants());
    }
}
