#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Homestead field for presentation.

use homestead_core::{CellCoord, CellState, GridLayout};
use homestead_world::{query, VisualTable, World};

/// Produces data required to greet the player and lay out the field.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the grid layout required for rendering the field.
    #[must_use]
    pub fn layout<'world>(&self, world: &'world World) -> &'world GridLayout {
        query::layout(world)
    }

    /// Exposes the state-to-visual table so adapters can validate their palettes.
    #[must_use]
    pub fn visuals<'world>(&self, world: &'world World) -> &'world VisualTable {
        query::visuals(world)
    }

    /// Lists the cells that already hold a non-empty state.
    #[must_use]
    pub fn occupied_cells(&self, world: &World) -> Vec<(CellCoord, CellState)> {
        query::occupied_cells(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use homestead_core::Command;

    #[test]
    fn exposes_world_configuration() {
        let layout = GridLayout::new(4, 2, 0.5, Vec3::new(1.0, 0.0, -1.0));
        let world = World::new(layout, VisualTable::standard());
        let bootstrap = Bootstrap;

        assert_eq!(bootstrap.welcome_banner(&world), "Welcome to Homestead.");
        assert_eq!(bootstrap.layout(&world), &layout);
        assert_eq!(bootstrap.visuals(&world).len(), 4);
        assert!(bootstrap.occupied_cells(&world).is_empty());
    }

    #[test]
    fn reports_cells_seeded_before_start() {
        let mut world = World::new(
            GridLayout::new(3, 3, 1.0, Vec3::ZERO),
            VisualTable::standard(),
        );
        let mut events = Vec::new();
        homestead_world::apply(
            &mut world,
            Command::SetState {
                cell: CellCoord::new(2, 0),
                state: CellState::Path,
            },
            &mut events,
        );

        assert_eq!(
            Bootstrap.occupied_cells(&world),
            vec![(CellCoord::new(2, 0), CellState::Path)]
        );
    }
}
