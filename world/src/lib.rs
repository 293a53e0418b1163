#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative field state management for Homestead.
//!
//! The world owns every cell state, the overlay instance attached to each
//! cell, and the shared highlight cursor. It never decides whether a state
//! change is legal: any in-bounds [`Command::SetState`] is stored as-is, and
//! transition policy lives with the systems that emit commands.

mod overlays;

use std::collections::BTreeMap;

use glam::Vec3;
use homestead_core::{
    CellCoord, CellState, Command, Event, GridLayout, VisualKey, HIGHLIGHT_LIFT, OVERLAY_LIFT,
    WELCOME_BANNER,
};
use log::{debug, trace};

use self::overlays::{HandleAllocator, HighlightInstance, OverlayInstance};

/// Mapping from cell state to the visual asset presenting it.
///
/// States without an entry are stored normally but never receive a visible
/// overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisualTable {
    entries: BTreeMap<CellState, VisualKey>,
}

impl VisualTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table registering a visual named after every non-empty state.
    #[must_use]
    pub fn standard() -> Self {
        CellState::ALL
            .into_iter()
            .filter(|state| !state.is_empty())
            .fold(Self::new(), |table, state| {
                table.with(state, VisualKey::new(state.name().to_ascii_lowercase()))
            })
    }

    /// Returns the table with `visual` registered for `state`.
    #[must_use]
    pub fn with(mut self, state: CellState, visual: VisualKey) -> Self {
        self.register(state, visual);
        self
    }

    /// Registers `visual` for `state`, replacing any previous entry.
    pub fn register(&mut self, state: CellState, visual: VisualKey) {
        let _ = self.entries.insert(state, visual);
    }

    /// Visual registered for `state`, if any.
    #[must_use]
    pub fn get(&self, state: CellState) -> Option<&VisualKey> {
        self.entries.get(&state)
    }

    /// Iterates the registered entries in state order.
    pub fn iter(&self) -> impl Iterator<Item = (CellState, &VisualKey)> + '_ {
        self.entries.iter().map(|(state, visual)| (*state, visual))
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no visual is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
struct CellRecord {
    state: CellState,
    overlay: Option<OverlayInstance>,
}

/// Represents the authoritative Homestead field state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    layout: GridLayout,
    visuals: VisualTable,
    cells: Vec<CellRecord>,
    highlight: Option<HighlightInstance>,
    handles: HandleAllocator,
}

impl World {
    /// Creates a field with fixed dimensions where every cell is empty.
    #[must_use]
    pub fn new(layout: GridLayout, visuals: VisualTable) -> Self {
        debug!(
            "creating {}x{} field with cell size {} at {:?}",
            layout.width(),
            layout.height(),
            layout.cell_size(),
            layout.origin()
        );
        Self {
            banner: WELCOME_BANNER,
            cells: vec![CellRecord::default(); layout.cell_count()],
            layout,
            visuals,
            highlight: None,
            handles: HandleAllocator::new(),
        }
    }

    fn set_state(&mut self, cell: CellCoord, state: CellState, out_events: &mut Vec<Event>) {
        let Some(index) = self.layout.index(cell) else {
            trace!("ignoring state {state} for out-of-bounds cell {cell}");
            return;
        };

        let record = &mut self.cells[index];
        if record.state == state {
            return;
        }

        let from = record.state;
        record.state = state;
        out_events.push(Event::CellStateChanged {
            cell,
            from,
            to: state,
        });
        self.refresh_overlay(index, cell, out_events);
    }

    fn refresh_overlay(&mut self, index: usize, cell: CellCoord, out_events: &mut Vec<Event>) {
        let state = self.cells[index].state;
        let visual = if state.is_empty() {
            None
        } else {
            self.visuals.get(state).cloned()
        };

        let Some(visual) = visual else {
            if !state.is_empty() {
                debug!("no visual registered for {state}; overlay at {cell} stays hidden");
            }
            if let Some(overlay) = self.cells[index].overlay.as_mut() {
                if overlay.hide() {
                    out_events.push(Event::OverlayHidden {
                        cell,
                        handle: overlay.handle,
                    });
                }
            }
            return;
        };

        let record = &mut self.cells[index];
        if record.overlay.is_none() {
            let handle = self.handles.allocate();
            record.overlay = Some(OverlayInstance::new(handle));
            out_events.push(Event::OverlayCreated {
                cell,
                handle,
                size: self.layout.cell_size(),
            });
        }
        let Some(overlay) = record.overlay.as_mut() else {
            return;
        };

        overlay.position = self.layout.cell_to_world_center(cell) + Vec3::Y * OVERLAY_LIFT;
        overlay.visual = Some(visual.clone());
        overlay.visible = true;
        out_events.push(Event::OverlayShown {
            cell,
            handle: overlay.handle,
            position: overlay.position,
            visual,
        });
    }

    fn show_highlight(&mut self, cell: CellCoord, show: bool, out_events: &mut Vec<Event>) {
        if !show || !self.layout.contains(cell) {
            if let Some(highlight) = self.highlight.as_mut() {
                if highlight.hide() {
                    out_events.push(Event::HighlightHidden {
                        handle: highlight.handle,
                    });
                }
            }
            return;
        }

        if self.highlight.is_none() {
            let handle = self.handles.allocate();
            self.highlight = Some(HighlightInstance::new(handle));
            out_events.push(Event::HighlightCreated {
                handle,
                size: self.layout.cell_size(),
            });
        }
        let Some(highlight) = self.highlight.as_mut() else {
            return;
        };

        let position = self.layout.cell_to_world_center(cell) + Vec3::Y * HIGHLIGHT_LIFT;
        if highlight.show_at(position) {
            out_events.push(Event::HighlightShown {
                handle: highlight.handle,
                position,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetState { cell, state } => world.set_state(cell, state, out_events),
        Command::ClearState { cell } => world.set_state(cell, CellState::Empty, out_events),
        Command::ShowHighlight { cell, show } => world.show_highlight(cell, show, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use homestead_core::{CellCoord, CellState, GridLayout, VisualHandle, VisualKey};

    use super::{VisualTable, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides the fixed grid layout of the field.
    #[must_use]
    pub fn layout(world: &World) -> &GridLayout {
        &world.layout
    }

    /// Provides the state-to-visual table the world was created with.
    #[must_use]
    pub fn visuals(world: &World) -> &VisualTable {
        &world.visuals
    }

    /// Reports whether `cell` lies inside the field.
    #[must_use]
    pub fn in_bounds(world: &World, cell: CellCoord) -> bool {
        world.layout.contains(cell)
    }

    /// State stored at `cell`; [`CellState::Empty`] for out-of-bounds cells.
    #[must_use]
    pub fn cell_state(world: &World, cell: CellCoord) -> CellState {
        world
            .layout
            .index(cell)
            .map_or(CellState::Empty, |index| world.cells[index].state)
    }

    /// Captures the overlay attached to `cell`, if one was ever created.
    #[must_use]
    pub fn overlay(world: &World, cell: CellCoord) -> Option<OverlaySnapshot> {
        let index = world.layout.index(cell)?;
        world.cells[index]
            .overlay
            .as_ref()
            .map(|overlay| OverlaySnapshot {
                cell,
                handle: overlay.handle,
                position: overlay.position,
                visual: overlay.visual.clone(),
                visible: overlay.visible,
            })
    }

    /// Captures the highlight cursor, if it was ever created.
    #[must_use]
    pub fn highlight(world: &World) -> Option<HighlightSnapshot> {
        world.highlight.as_ref().map(|highlight| HighlightSnapshot {
            handle: highlight.handle,
            position: highlight.position,
            visible: highlight.visible,
        })
    }

    /// Lists every non-empty cell in row-major order.
    #[must_use]
    pub fn occupied_cells(world: &World) -> Vec<(CellCoord, CellState)> {
        world
            .cells
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.state.is_empty())
            .filter_map(|(index, record)| {
                world
                    .layout
                    .cell_at_index(index)
                    .map(|cell| (cell, record.state))
            })
            .collect()
    }

    /// Tallies how many cells hold each state.
    #[must_use]
    pub fn state_counts(world: &World) -> StateCounts {
        let mut counts = StateCounts::default();
        for record in &world.cells {
            counts.record(record.state);
        }
        counts
    }

    /// Immutable representation of a cell overlay.
    #[derive(Clone, Debug, PartialEq)]
    pub struct OverlaySnapshot {
        /// Cell owning the overlay.
        pub cell: CellCoord,
        /// Handle announced when the overlay was created.
        pub handle: VisualHandle,
        /// World position of the overlay center.
        pub position: Vec3,
        /// Visual assigned most recently.
        pub visual: Option<VisualKey>,
        /// Whether the overlay is displayed.
        pub visible: bool,
    }

    /// Immutable representation of the highlight cursor.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct HighlightSnapshot {
        /// Handle announced when the highlight was created.
        pub handle: VisualHandle,
        /// World position of the highlight center.
        pub position: Vec3,
        /// Whether the highlight is displayed.
        pub visible: bool,
    }

    /// Number of cells holding each state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct StateCounts {
        counts: [usize; CellState::ALL.len()],
    }

    impl StateCounts {
        fn record(&mut self, state: CellState) {
            if let Some(slot) = CellState::ALL
                .iter()
                .position(|candidate| *candidate == state)
                .and_then(|position| self.counts.get_mut(position))
            {
                *slot += 1;
            }
        }

        /// Number of cells holding `state`.
        #[must_use]
        pub fn get(&self, state: CellState) -> usize {
            CellState::ALL
                .iter()
                .position(|candidate| *candidate == state)
                .and_then(|position| self.counts.get(position).copied())
                .unwrap_or(0)
        }

        /// Iterates `(state, count)` pairs in declaration order.
        pub fn iter(&self) -> impl Iterator<Item = (CellState, usize)> + '_ {
            CellState::ALL.into_iter().zip(self.counts.iter().copied())
        }
    }
}
