#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Homestead engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative field world, and pure systems. Systems submit [`Command`]
//! values describing desired cell or highlight mutations, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values that presentation adapters mirror into visual instances. Systems
//! read the field through [`GridLayout`] and immutable state queries and
//! respond exclusively with new command batches.

use std::{fmt, str::FromStr};

use glam::{Vec2, Vec3};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Homestead.";

/// Vertical offset applied to cell overlays so they do not z-fight the ground.
pub const OVERLAY_LIFT: f32 = 0.01;

/// Vertical offset applied to the highlight cursor, kept above overlays.
pub const HIGHLIGHT_LIFT: f32 = 0.02;

/// Farming state stored for a single field cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellState {
    /// Untouched ground showing only the base surface.
    #[default]
    Empty,
    /// Tilled soil ready for watering.
    Soil,
    /// Tilled soil that has been watered.
    Watered,
    /// Walkway laid over the ground.
    Path,
    /// Cell occupied by a building or building zone.
    Building,
}

impl CellState {
    /// Every cell state in declaration order.
    pub const ALL: [CellState; 5] = [
        CellState::Empty,
        CellState::Soil,
        CellState::Watered,
        CellState::Path,
        CellState::Building,
    ];

    /// Reports whether the state is the default empty ground.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Stable name used by configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Soil => "Soil",
            Self::Watered => "Watered",
            Self::Path => "Path",
            Self::Building => "Building",
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string does not name a [`CellState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownCellState(pub String);

impl fmt::Display for UnknownCellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cell state `{}`", self.0)
    }
}

impl std::error::Error for UnknownCellState {}

impl FromStr for CellState {
    type Err = UnknownCellState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCellState(trimmed.to_owned()))
    }
}

/// Interaction mode determining which transition a confirm action triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    /// Tills empty ground or paths into soil.
    Hoe,
    /// Waters tilled soil.
    Water,
    /// Marks a cell as occupied by a building.
    Build,
    /// Resets a cell to empty ground.
    Clear,
}

impl Tool {
    /// Every tool in selection-slot order.
    pub const ALL: [Tool; 4] = [Tool::Hoe, Tool::Water, Tool::Build, Tool::Clear];
}

/// Edge-triggered tool slot presses observed during a single step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ToolPresses {
    /// Hoe slot pressed this step.
    pub hoe: bool,
    /// Watering slot pressed this step.
    pub water: bool,
    /// Build slot pressed this step.
    pub build: bool,
    /// Clear slot pressed this step.
    pub clear: bool,
}

impl ToolPresses {
    /// Creates a press set containing only the provided tool.
    #[must_use]
    pub fn only(tool: Tool) -> Self {
        let mut presses = Self::default();
        match tool {
            Tool::Hoe => presses.hoe = true,
            Tool::Water => presses.water = true,
            Tool::Build => presses.build = true,
            Tool::Clear => presses.clear = true,
        }
        presses
    }

    /// Reports whether the slot for `tool` was pressed.
    #[must_use]
    pub const fn contains(&self, tool: Tool) -> bool {
        match tool {
            Tool::Hoe => self.hoe,
            Tool::Water => self.water,
            Tool::Build => self.build,
            Tool::Clear => self.clear,
        }
    }

    /// Iterates the pressed tools in slot order.
    pub fn iter(self) -> impl Iterator<Item = Tool> {
        Tool::ALL
            .into_iter()
            .filter(move |tool| self.contains(*tool))
    }

    /// Reports whether no slot was pressed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.hoe || self.water || self.build || self.clear)
    }
}

/// Location of a single field cell expressed as signed grid indices.
///
/// Coordinates are signed so that aim points left of or behind the field map
/// to representable cells; such cells simply fail [`GridLayout::contains`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column index, growing along world +X.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index, growing along world +Z.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Opaque identifier of a visual instance owned by the world.
///
/// Overlays and the highlight cursor share one identifier space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u32);

impl VisualHandle {
    /// Creates a new handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Name of a visual asset registered for a cell state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualKey(String);

impl VisualKey {
    /// Creates a visual key from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrowed name of the visual asset.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed geometry of the field grid and its mapping to world space.
///
/// The ground plane is X/Z; Y is vertical. Grid column `x` runs along world
/// X and grid row `y` runs along world Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    width: u32,
    height: u32,
    cell_size: f32,
    origin: Vec3,
}

impl GridLayout {
    /// Creates a layout whose (0, 0) corner sits at `origin`.
    #[must_use]
    pub const fn new(width: u32, height: u32, cell_size: f32, origin: Vec3) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin,
        }
    }

    /// Creates a layout centered on the world origin.
    #[must_use]
    pub fn centered(width: u32, height: u32, cell_size: f32) -> Self {
        let origin = Vec3::new(
            -(width as f32) * cell_size * 0.5,
            0.0,
            -(height as f32) * cell_size * 0.5,
        );
        Self::new(width, height, cell_size, origin)
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Edge length of a single square cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the grid's (0, 0) corner.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.height);
        usize::try_from(count).unwrap_or(0)
    }

    /// Size of the field on the ground plane (X, Z) in world units.
    #[must_use]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    /// Reports whether `cell` lies inside `[0, width) × [0, height)`.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x() >= 0
            && cell.y() >= 0
            && i64::from(cell.x()) < i64::from(self.width)
            && i64::from(cell.y()) < i64::from(self.height)
    }

    /// Row-major storage index of `cell`, or `None` when out of bounds.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    /// Inverse of [`GridLayout::index`].
    #[must_use]
    pub fn cell_at_index(&self, index: usize) -> Option<CellCoord> {
        let width = usize::try_from(self.width).ok().filter(|width| *width > 0)?;
        if index >= self.cell_count() {
            return None;
        }
        let x = i32::try_from(index % width).ok()?;
        let y = i32::try_from(index / width).ok()?;
        Some(CellCoord::new(x, y))
    }

    /// Maps a world position to the cell containing it.
    ///
    /// Both ground axes are floored, so the mapping has no rounding asymmetry
    /// across zero. The result may lie outside the grid.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec3) -> CellCoord {
        let local = position - self.origin;
        let x = (local.x / self.cell_size).floor() as i32;
        let y = (local.z / self.cell_size).floor() as i32;
        CellCoord::new(x, y)
    }

    /// World position of the center of `cell`, on the origin's vertical level.
    #[must_use]
    pub fn cell_to_world_center(&self, cell: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                (cell.x() as f32 + 0.5) * self.cell_size,
                0.0,
                (cell.y() as f32 + 0.5) * self.cell_size,
            )
    }

    /// Clamps the ground components of `position` into the field extent.
    ///
    /// `padding` shrinks the extent on every side; when it exceeds half the
    /// extent along an axis, that axis collapses to the extent's center. The
    /// vertical component is left untouched.
    #[must_use]
    pub fn clamp_to_extent(&self, position: Vec3, padding: f32) -> Vec3 {
        let size = self.world_size();
        let padding = padding.max(0.0);
        let x = clamp_axis(position.x, self.origin.x, size.x, padding);
        let z = clamp_axis(position.z, self.origin.z, size.y, padding);
        Vec3::new(x, position.y, z)
    }
}

fn clamp_axis(value: f32, min: f32, length: f32, padding: f32) -> f32 {
    let low = min + padding;
    let high = min + length - padding;
    if high < low {
        return min + length * 0.5;
    }
    value.clamp(low, high)
}

/// Commands that express all permissible field mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Assigns a new state to a cell, refreshing its overlay.
    SetState {
        /// Cell whose state should change.
        cell: CellCoord,
        /// State to store.
        state: CellState,
    },
    /// Resets a cell to [`CellState::Empty`].
    ClearState {
        /// Cell to reset.
        cell: CellCoord,
    },
    /// Shows the shared highlight cursor on a cell, or hides it.
    ShowHighlight {
        /// Cell the highlight should mark.
        cell: CellCoord,
        /// Whether the highlight should be visible.
        show: bool,
    },
}

/// Events broadcast by the world after processing commands.
///
/// Overlay and highlight events form the presentation contract: a renderer
/// that mirrors them reproduces every visual instance the world owns.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a cell's stored state changed.
    CellStateChanged {
        /// Cell whose state changed.
        cell: CellCoord,
        /// State before the change.
        from: CellState,
        /// State after the change.
        to: CellState,
    },
    /// Announces that a new overlay instance was created for a cell.
    OverlayCreated {
        /// Cell owning the overlay.
        cell: CellCoord,
        /// Handle allocated for the overlay.
        handle: VisualHandle,
        /// Edge length of the overlay quad in world units.
        size: f32,
    },
    /// Positions an overlay, assigns its visual and makes it visible.
    OverlayShown {
        /// Cell owning the overlay.
        cell: CellCoord,
        /// Handle of the overlay.
        handle: VisualHandle,
        /// World position of the overlay center.
        position: Vec3,
        /// Visual asset to display.
        visual: VisualKey,
    },
    /// Hides an overlay without destroying it.
    OverlayHidden {
        /// Cell owning the overlay.
        cell: CellCoord,
        /// Handle of the overlay.
        handle: VisualHandle,
    },
    /// Announces that the shared highlight cursor was created.
    HighlightCreated {
        /// Handle allocated for the highlight.
        handle: VisualHandle,
        /// Edge length of the highlight quad in world units.
        size: f32,
    },
    /// Moves the highlight cursor and makes it visible.
    HighlightShown {
        /// Handle of the highlight.
        handle: VisualHandle,
        /// World position of the highlight center.
        position: Vec3,
    },
    /// Hides the highlight cursor.
    HighlightHidden {
        /// Handle of the highlight.
        handle: VisualHandle,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_layout() -> GridLayout {
        GridLayout::new(3, 3, 1.0, Vec3::ZERO)
    }

    #[test]
    fn contains_rejects_negative_and_overflowing_cells() {
        let layout = unit_layout();
        assert!(layout.contains(CellCoord::new(0, 0)));
        assert!(layout.contains(CellCoord::new(2, 2)));
        assert!(!layout.contains(CellCoord::new(-1, 0)));
        assert!(!layout.contains(CellCoord::new(0, -1)));
        assert!(!layout.contains(CellCoord::new(3, 0)));
        assert!(!layout.contains(CellCoord::new(5, 5)));
    }

    #[test]
    fn world_to_cell_floors_negative_offsets() {
        let layout = unit_layout();
        assert_eq!(
            layout.world_to_cell(Vec3::new(-0.25, 0.0, 0.5)),
            CellCoord::new(-1, 0)
        );
        assert_eq!(
            layout.world_to_cell(Vec3::new(1.5, 7.0, 2.1)),
            CellCoord::new(1, 2)
        );
    }

    #[test]
    fn cell_center_round_trips_for_every_cell() {
        let layout = GridLayout::new(7, 4, 0.75, Vec3::new(-3.0, 0.0, 12.5));
        for index in 0..layout.cell_count() {
            let cell = layout.cell_at_index(index).expect("index inside grid");
            let center = layout.cell_to_world_center(cell);
            let mapped = layout.world_to_cell(center);
            assert!(layout.contains(mapped));
            assert_eq!(mapped, cell);
        }
    }

    #[test]
    fn world_to_cell_center_stays_within_one_cell() {
        let layout = GridLayout::new(4, 4, 2.0, Vec3::new(1.0, 0.0, -3.0));
        let samples = [
            Vec3::new(1.0, 0.0, -3.0),
            Vec3::new(8.99, 0.0, 4.99),
            Vec3::new(4.2, 0.0, 0.1),
            Vec3::new(3.0, 0.0, -1.0),
        ];
        for sample in samples {
            let center = layout.cell_to_world_center(layout.world_to_cell(sample));
            let distance = Vec2::new(center.x - sample.x, center.z - sample.z).length();
            assert!(distance <= layout.cell_size(), "{sample:?} drifted {distance}");
        }
    }

    #[test]
    fn cell_center_has_no_vertical_offset() {
        let layout = unit_layout();
        let center = layout.cell_to_world_center(CellCoord::new(1, 2));
        assert_eq!(center, Vec3::new(1.5, 0.0, 2.5));
    }

    #[test]
    fn index_and_cell_at_index_agree() {
        let layout = GridLayout::new(5, 2, 1.0, Vec3::ZERO);
        assert_eq!(layout.index(CellCoord::new(3, 1)), Some(8));
        assert_eq!(layout.cell_at_index(8), Some(CellCoord::new(3, 1)));
        assert_eq!(layout.index(CellCoord::new(5, 0)), None);
        assert_eq!(layout.cell_at_index(10), None);
    }

    #[test]
    fn centered_layout_straddles_world_origin() {
        let layout = GridLayout::centered(50, 40, 1.0);
        assert_eq!(layout.origin(), Vec3::new(-25.0, 0.0, -20.0));
        assert_eq!(layout.world_to_cell(Vec3::ZERO), CellCoord::new(25, 20));
    }

    #[test]
    fn clamp_to_extent_respects_padding() {
        let layout = GridLayout::new(4, 2, 1.0, Vec3::ZERO);
        let clamped = layout.clamp_to_extent(Vec3::new(-3.0, 1.5, 9.0), 0.25);
        assert_eq!(clamped, Vec3::new(0.25, 1.5, 1.75));

        let inside = Vec3::new(2.0, 0.0, 1.0);
        assert_eq!(layout.clamp_to_extent(inside, 0.25), inside);
    }

    #[test]
    fn clamp_to_extent_collapses_when_padding_exceeds_extent() {
        let layout = GridLayout::new(1, 1, 1.0, Vec3::ZERO);
        let clamped = layout.clamp_to_extent(Vec3::new(5.0, 0.0, -5.0), 0.8);
        assert_eq!(clamped, Vec3::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn cell_state_parses_case_insensitively() {
        assert_eq!("watered".parse::<CellState>(), Ok(CellState::Watered));
        assert_eq!(" Building ".parse::<CellState>(), Ok(CellState::Building));
        assert_eq!(
            "mud".parse::<CellState>(),
            Err(UnknownCellState("mud".to_owned()))
        );
    }

    #[test]
    fn tool_presses_iterate_in_slot_order() {
        let presses = ToolPresses {
            clear: true,
            hoe: true,
            ..ToolPresses::default()
        };
        assert_eq!(presses.iter().collect::<Vec<_>>(), vec![Tool::Hoe, Tool::Clear]);
        assert!(ToolPresses::default().is_empty());
        assert!(ToolPresses::only(Tool::Build).contains(Tool::Build));
    }
}
