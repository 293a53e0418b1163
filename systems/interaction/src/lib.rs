#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure tool-interaction system that turns aim and input edges into field commands.
//!
//! Each step the system resolves tool-selection edges, projects the agent's
//! aim onto the field, asks the world to move or hide the highlight cursor,
//! and on a confirm edge emits the state-gated transition for the active
//! tool. The system never mutates the world directly and owns no grid data.

use glam::{Vec2, Vec3};
use homestead_core::{CellCoord, CellState, Command, GridLayout, Tool, ToolPresses};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Squared length below which a projected forward vector counts as degenerate.
const DEGENERATE_FORWARD_EPSILON: f32 = 1e-4;

/// How re-selecting the already active tool is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Selecting the active tool again deselects it.
    #[default]
    Toggle,
    /// Selecting the active tool again keeps it selected.
    Reselect,
}

/// Tuning constants fixed when the system is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    /// Distance ahead of the agent where the aim point is placed.
    pub ahead_distance: f32,
    /// Maximum ground distance between aim point and cell center for a valid target.
    pub max_snap_distance: f32,
    /// Interpretation of repeated tool selection.
    pub selection: SelectionPolicy,
    /// Whether the build slot is available.
    pub build_tool: bool,
}

impl InteractionConfig {
    /// Default distance ahead of the agent where the aim point is placed.
    pub const DEFAULT_AHEAD_DISTANCE: f32 = 0.6;

    /// Default snap tolerance around cell centers.
    pub const DEFAULT_MAX_SNAP_DISTANCE: f32 = 1.2;

    /// Checks that both distances are finite and non-negative.
    pub fn validate(&self) -> Result<(), TuningError> {
        check_distance("ahead_distance", self.ahead_distance)?;
        check_distance("max_snap_distance", self.max_snap_distance)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            ahead_distance: Self::DEFAULT_AHEAD_DISTANCE,
            max_snap_distance: Self::DEFAULT_MAX_SNAP_DISTANCE,
            selection: SelectionPolicy::Toggle,
            build_tool: true,
        }
    }
}

fn check_distance(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::InvalidDistance { name, value })
    }
}

/// Errors reported when validating [`InteractionConfig`].
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TuningError {
    /// A distance constant was negative or not finite.
    #[error("{name} must be a finite, non-negative distance (received {value})")]
    InvalidDistance {
        /// Name of the offending setting.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Position and facing of the interacting agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimPose {
    /// World position of the agent.
    pub position: Vec3,
    /// Direction the agent faces; need not be normalized.
    pub forward: Vec3,
}

impl AimPose {
    /// Creates a new aim pose.
    #[must_use]
    pub const fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

/// Input edges distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InteractionInput {
    /// Tool slots pressed this step.
    pub tools: ToolPresses,
    /// Whether the deselect control was pressed this step.
    pub deselect: bool,
    /// Whether an action confirmation fired this step.
    pub confirm: bool,
}

impl InteractionInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(tools: ToolPresses, deselect: bool, confirm: bool) -> Self {
        Self {
            tools,
            deselect,
            confirm,
        }
    }
}

/// Cell targeted by the most recent step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetCell {
    /// Cell containing the aim point.
    pub cell: CellCoord,
    /// World center of that cell.
    pub center: Vec3,
    /// Aim point the cell was derived from.
    pub aim_point: Vec3,
    /// Whether the cell is in bounds and within snap tolerance.
    pub valid: bool,
}

/// Tool-interaction system that translates input edges into field commands.
#[derive(Clone, Debug, Default)]
pub struct ToolInteraction {
    config: InteractionConfig,
    current_tool: Option<Tool>,
    last_target: Option<TargetCell>,
}

impl ToolInteraction {
    /// Creates a new interaction system with no tool selected.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            current_tool: None,
            last_target: None,
        }
    }

    /// Tuning constants the system was created with.
    #[must_use]
    pub const fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Currently selected tool, if any.
    #[must_use]
    pub const fn current_tool(&self) -> Option<Tool> {
        self.current_tool
    }

    /// Target resolved by the most recent step that had an aim source.
    #[must_use]
    pub const fn last_target(&self) -> Option<TargetCell> {
        self.last_target
    }

    /// Applies a tool selection according to the configured policy.
    ///
    /// Selecting the build tool is ignored when it is disabled.
    pub fn select(&mut self, tool: Tool) {
        if tool == Tool::Build && !self.config.build_tool {
            trace!("build tool disabled; ignoring selection");
            return;
        }

        let next = match self.config.selection {
            SelectionPolicy::Toggle if self.current_tool == Some(tool) => None,
            SelectionPolicy::Toggle | SelectionPolicy::Reselect => Some(tool),
        };
        self.set_tool(next);
    }

    /// Drops the current tool selection.
    pub fn deselect(&mut self) {
        self.set_tool(None);
    }

    /// Runs one interaction step and emits the resulting commands.
    ///
    /// `aim` is `None` when no aim source is wired, which turns the whole
    /// step into a no-op. The `state_at` closure should mirror the world's
    /// `query::cell_state` helper so transitions can be gated on the current
    /// state of the targeted cell.
    pub fn handle<F>(
        &mut self,
        input: InteractionInput,
        aim: Option<AimPose>,
        layout: &GridLayout,
        mut state_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> CellState,
    {
        let Some(aim) = aim else {
            trace!("no aim source; skipping interaction step");
            return;
        };

        for tool in input.tools.iter() {
            self.select(tool);
        }
        if input.deselect {
            self.deselect();
        }

        let target = resolve_target(aim, layout, &self.config);
        self.last_target = Some(target);

        let active_tool = self.current_tool.filter(|_| target.valid);
        out.push(Command::ShowHighlight {
            cell: target.cell,
            show: active_tool.is_some(),
        });

        let Some(tool) = active_tool else {
            return;
        };
        if !input.confirm {
            return;
        }

        let current = state_at(target.cell);
        match transition(tool, current) {
            Some(CellState::Empty) => out.push(Command::ClearState { cell: target.cell }),
            Some(state) => out.push(Command::SetState {
                cell: target.cell,
                state,
            }),
            None => trace!("{tool:?} cannot act on {current} at {}", target.cell),
        }
    }

    fn set_tool(&mut self, tool: Option<Tool>) {
        if self.current_tool != tool {
            debug!("tool changed from {:?} to {:?}", self.current_tool, tool);
            self.current_tool = tool;
        }
    }
}

/// Projects the agent's facing onto the ground and advances `ahead_distance` along it.
///
/// A forward vector pointing straight up or down falls back to world +Z.
#[must_use]
pub fn aim_point(pose: AimPose, ahead_distance: f32) -> Vec3 {
    let flat = Vec3::new(pose.forward.x, 0.0, pose.forward.z);
    let direction = if flat.is_finite() && flat.length_squared() >= DEGENERATE_FORWARD_EPSILON {
        flat.normalize()
    } else {
        Vec3::Z
    };
    pose.position + direction * ahead_distance
}

/// Resolves the cell under the aim point and whether it is a valid target.
#[must_use]
pub fn resolve_target(pose: AimPose, layout: &GridLayout, config: &InteractionConfig) -> TargetCell {
    let aim_point = aim_point(pose, config.ahead_distance);
    let cell = layout.world_to_cell(aim_point);
    let center = layout.cell_to_world_center(cell);
    let ground_distance = Vec2::new(center.x - aim_point.x, center.z - aim_point.z).length();
    let valid = layout.contains(cell) && ground_distance <= config.max_snap_distance;

    TargetCell {
        cell,
        center,
        aim_point,
        valid,
    }
}

/// State produced when `tool` acts on a cell holding `current`.
///
/// Returns `None` when the tool cannot act on that state.
#[must_use]
pub fn transition(tool: Tool, current: CellState) -> Option<CellState> {
    match (tool, current) {
        (Tool::Hoe, CellState::Empty | CellState::Path) => Some(CellState::Soil),
        (Tool::Water, CellState::Soil | CellState::Watered) => Some(CellState::Watered),
        (Tool::Build, state) if state != CellState::Building => Some(CellState::Building),
        (Tool::Clear, _) => Some(CellState::Empty),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_tool_rules() {
        use CellState::{Building, Empty, Path, Soil, Watered};

        let expectations = [
            (Tool::Hoe, Empty, Some(Soil)),
            (Tool::Hoe, Soil, None),
            (Tool::Hoe, Watered, None),
            (Tool::Hoe, Path, Some(Soil)),
            (Tool::Hoe, Building, None),
            (Tool::Water, Empty, None),
            (Tool::Water, Soil, Some(Watered)),
            (Tool::Water, Watered, Some(Watered)),
            (Tool::Water, Path, None),
            (Tool::Water, Building, None),
            (Tool::Build, Empty, Some(Building)),
            (Tool::Build, Soil, Some(Building)),
            (Tool::Build, Watered, Some(Building)),
            (Tool::Build, Path, Some(Building)),
            (Tool::Build, Building, None),
            (Tool::Clear, Empty, Some(Empty)),
            (Tool::Clear, Soil, Some(Empty)),
            (Tool::Clear, Watered, Some(Empty)),
            (Tool::Clear, Path, Some(Empty)),
            (Tool::Clear, Building, Some(Empty)),
        ];

        for (tool, current, expected) in expectations {
            assert_eq!(
                transition(tool, current),
                expected,
                "{tool:?} acting on {current:?}"
            );
        }
    }

    #[test]
    fn aim_point_projects_forward_onto_ground() {
        let pose = AimPose::new(Vec3::new(1.0, 2.0, 1.0), Vec3::new(3.0, -5.0, 0.0));
        assert_eq!(aim_point(pose, 0.5), Vec3::new(1.5, 2.0, 1.0));
    }

    #[test]
    fn aim_point_falls_back_to_positive_z_when_facing_vertically() {
        let up = AimPose::new(Vec3::ZERO, Vec3::Y);
        let down = AimPose::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.001));
        let broken = AimPose::new(Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 1.0));

        assert_eq!(aim_point(up, 2.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(aim_point(down, 2.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(aim_point(broken, 2.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn toggle_policy_deselects_on_repeat() {
        let mut interaction = ToolInteraction::default();
        interaction.select(Tool::Hoe);
        assert_eq!(interaction.current_tool(), Some(Tool::Hoe));
        interaction.select(Tool::Hoe);
        assert_eq!(interaction.current_tool(), None);
    }

    #[test]
    fn reselect_policy_keeps_tool_on_repeat() {
        let mut interaction = ToolInteraction::new(InteractionConfig {
            selection: SelectionPolicy::Reselect,
            ..InteractionConfig::default()
        });
        interaction.select(Tool::Water);
        interaction.select(Tool::Water);
        assert_eq!(interaction.current_tool(), Some(Tool::Water));
    }

    #[test]
    fn disabled_build_tool_cannot_be_selected() {
        let mut interaction = ToolInteraction::new(InteractionConfig {
            build_tool: false,
            ..InteractionConfig::default()
        });
        interaction.select(Tool::Clear);
        interaction.select(Tool::Build);
        assert_eq!(interaction.current_tool(), Some(Tool::Clear));
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_distances() {
        assert!(InteractionConfig::default().validate().is_ok());

        let negative = InteractionConfig {
            ahead_distance: -0.1,
            ..InteractionConfig::default()
        };
        assert_eq!(
            negative.validate(),
            Err(TuningError::InvalidDistance {
                name: "ahead_distance",
                value: -0.1,
            })
        );

        let infinite = InteractionConfig {
            max_snap_distance: f32::INFINITY,
            ..InteractionConfig::default()
        };
        assert!(infinite.validate().is_err());
    }
}
