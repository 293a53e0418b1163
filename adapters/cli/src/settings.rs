//! Settings file parsing and validation.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use glam::Vec3;
use homestead_core::{CellState, GridLayout, UnknownCellState, VisualKey};
use homestead_rendering::{Color, Palette};
use homestead_system_interaction::{InteractionConfig, TuningError};
use homestead_world::VisualTable;
use serde::Deserialize;
use thiserror::Error;

/// Location of the settings file used when `--config` is not supplied.
pub(crate) const DEFAULT_SETTINGS_PATH: &str = "assets/homestead.toml";

const DEFAULT_GRID_SIDE: u32 = 50;
const DEFAULT_CELL_SIZE: f32 = 1.0;
const DEFAULT_AGENT_RADIUS: f32 = 0.3;
const DEFAULT_AGENT_SPEED: f32 = 3.0;

/// Largest number of cells a field may contain.
const MAX_GRID_CELLS: u64 = 1 << 24;

/// Errors raised while loading the settings file.
#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {}", path.display())]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The settings file is not valid TOML for the expected schema.
    #[error("failed to parse settings toml")]
    Parse(#[from] toml::de::Error),
    /// The grid must contain at least one cell.
    #[error("grid must contain at least one cell (received {width}x{height})")]
    EmptyGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// The grid exceeds the addressable cell range.
    #[error("grid {width}x{height} exceeds the limit of {max} cells", max = MAX_GRID_CELLS)]
    GridTooLarge {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// Cells must have a positive finite size.
    #[error("cell_size must be positive and finite (received {0})")]
    InvalidCellSize(f32),
    /// The grid origin contains a non-finite component.
    #[error("grid origin must be finite")]
    InvalidOrigin,
    /// A visual table entry names a state that does not exist.
    #[error("invalid [grid.visuals] entry")]
    UnknownState(#[from] UnknownCellState),
    /// Interaction tuning failed validation.
    #[error("invalid [interaction] settings")]
    Tuning(#[from] TuningError),
    /// Agent settings failed validation.
    #[error("agent {name} must be positive and finite (received {value})")]
    InvalidAgent {
        /// Name of the offending setting.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Command-line overrides applied before validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct GridOverrides {
    /// Replacement grid width.
    pub(crate) width: Option<u32>,
    /// Replacement grid height.
    pub(crate) height: Option<u32>,
}

/// Movement parameters of the walking agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AgentSettings {
    /// Footprint radius used when keeping the agent inside the field.
    pub(crate) radius: f32,
    /// Walking speed in world units per second.
    pub(crate) speed: f32,
}

/// Validated settings consumed by the session and the renderer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) layout: GridLayout,
    pub(crate) visuals: VisualTable,
    pub(crate) interaction: InteractionConfig,
    pub(crate) palette: Palette,
    pub(crate) agent: AgentSettings,
}

impl Settings {
    /// Reads and validates the settings file at `path`.
    pub(crate) fn load(path: &Path, overrides: GridOverrides) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, overrides)
    }

    /// Parses and validates settings from TOML text.
    pub(crate) fn parse(contents: &str, overrides: GridOverrides) -> Result<Self, SettingsError> {
        let raw: RawSettings = toml::from_str(contents)?;
        raw.resolve(overrides)
    }

    /// Built-in settings used when no settings file exists.
    pub(crate) fn defaults(overrides: GridOverrides) -> Result<Self, SettingsError> {
        RawSettings::default().resolve(overrides)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    grid: RawGrid,
    interaction: InteractionConfig,
    agent: RawAgent,
    palette: BTreeMap<String, [u8; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawGrid {
    width: u32,
    height: u32,
    cell_size: f32,
    origin: Option<[f32; 3]>,
    visuals: Option<BTreeMap<String, String>>,
}

impl Default for RawGrid {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_SIDE,
            height: DEFAULT_GRID_SIDE,
            cell_size: DEFAULT_CELL_SIZE,
            origin: None,
            visuals: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawAgent {
    radius: f32,
    speed: f32,
}

impl Default for RawAgent {
    fn default() -> Self {
        Self {
            radius: DEFAULT_AGENT_RADIUS,
            speed: DEFAULT_AGENT_SPEED,
        }
    }
}

impl RawSettings {
    fn resolve(self, overrides: GridOverrides) -> Result<Settings, SettingsError> {
        let Self {
            grid,
            interaction,
            agent,
            palette,
        } = self;

        let width = overrides.width.unwrap_or(grid.width);
        let height = overrides.height.unwrap_or(grid.height);
        if width == 0 || height == 0 {
            return Err(SettingsError::EmptyGrid { width, height });
        }
        if u64::from(width) * u64::from(height) > MAX_GRID_CELLS {
            return Err(SettingsError::GridTooLarge { width, height });
        }
        if !grid.cell_size.is_finite() || grid.cell_size <= 0.0 {
            return Err(SettingsError::InvalidCellSize(grid.cell_size));
        }
        let layout = match grid.origin {
            Some(origin) => {
                let origin = Vec3::from_array(origin);
                if !origin.is_finite() {
                    return Err(SettingsError::InvalidOrigin);
                }
                GridLayout::new(width, height, grid.cell_size, origin)
            }
            None => GridLayout::centered(width, height, grid.cell_size),
        };

        let visuals = match grid.visuals {
            Some(entries) => {
                let mut table = VisualTable::new();
                for (state, visual) in entries {
                    let state: CellState = state.parse()?;
                    table.register(state, VisualKey::new(visual));
                }
                table
            }
            None => VisualTable::standard(),
        };

        interaction.validate()?;
        check_agent("radius", agent.radius)?;
        check_agent("speed", agent.speed)?;

        let mut resolved_palette = Palette::standard();
        for (key, [red, green, blue]) in palette {
            resolved_palette.insert(VisualKey::new(key), Color::from_rgb_u8(red, green, blue));
        }

        Ok(Settings {
            layout,
            visuals,
            interaction,
            palette: resolved_palette,
            agent: AgentSettings {
                radius: agent.radius,
                speed: agent.speed,
            },
        })
    }
}

fn check_agent(name: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidAgent { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_system_interaction::SelectionPolicy;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse("", GridOverrides::default()).expect("defaults are valid");

        assert_eq!(settings.layout, GridLayout::centered(50, 50, 1.0));
        assert_eq!(settings.visuals, VisualTable::standard());
        assert_eq!(settings.interaction, InteractionConfig::default());
        assert_eq!(settings.agent.radius, DEFAULT_AGENT_RADIUS);
        assert_eq!(
            settings,
            Settings::defaults(GridOverrides::default()).expect("defaults are valid")
        );
    }

    #[test]
    fn parses_every_section() {
        let settings = Settings::parse(
            r#"
            [grid]
            width = 8
            height = 4
            cell_size = 0.5
            origin = [1.0, 0.0, -2.0]

            [grid.visuals]
            Soil = "tilled"
            watered = "wet"

            [interaction]
            max_snap_distance = 0.9
            selection = "reselect"
            build_tool = false

            [agent]
            speed = 5.0

            [palette]
            tilled = [10, 20, 30]
            "#,
            GridOverrides::default(),
        )
        .expect("valid settings");

        assert_eq!(
            settings.layout,
            GridLayout::new(8, 4, 0.5, Vec3::new(1.0, 0.0, -2.0))
        );
        assert_eq!(
            settings.visuals.get(CellState::Soil),
            Some(&VisualKey::new("tilled"))
        );
        assert_eq!(
            settings.visuals.get(CellState::Watered),
            Some(&VisualKey::new("wet"))
        );
        assert_eq!(settings.visuals.get(CellState::Building), None);
        assert_eq!(settings.interaction.selection, SelectionPolicy::Reselect);
        assert!(!settings.interaction.build_tool);
        assert_eq!(settings.agent.speed, 5.0);
        assert_eq!(
            settings.palette.color_for(&VisualKey::new("tilled")),
            Color::from_rgb_u8(10, 20, 30)
        );
        assert!(settings.palette.contains(&VisualKey::new("soil")));
    }

    #[test]
    fn overrides_recenter_implicit_origin() {
        let settings = Settings::parse(
            "[grid]\nwidth = 10\n",
            GridOverrides {
                width: Some(6),
                height: Some(2),
            },
        )
        .expect("valid settings");

        assert_eq!(settings.layout, GridLayout::centered(6, 2, 1.0));
    }

    #[test]
    fn rejects_invalid_grids() {
        assert!(matches!(
            Settings::parse("[grid]\nwidth = 0\n", GridOverrides::default()),
            Err(SettingsError::EmptyGrid {
                width: 0,
                height: 50
            })
        ));
        assert!(matches!(
            Settings::parse("[grid]\ncell_size = -1.0\n", GridOverrides::default()),
            Err(SettingsError::InvalidCellSize(_))
        ));
        assert!(matches!(
            Settings::parse("[grid]\ncell_size = nan\n", GridOverrides::default()),
            Err(SettingsError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn rejects_grids_beyond_cell_limit() {
        let oversized = |width, height| {
            Settings::parse(
                "",
                GridOverrides {
                    width: Some(width),
                    height: Some(height),
                },
            )
        };

        assert!(matches!(
            oversized(u32::MAX, u32::MAX),
            Err(SettingsError::GridTooLarge { .. })
        ));
        assert!(matches!(
            oversized(3_000_000_000, 1),
            Err(SettingsError::GridTooLarge {
                width: 3_000_000_000,
                height: 1
            })
        ));
        assert!(matches!(
            oversized(4097, 4096),
            Err(SettingsError::GridTooLarge { .. })
        ));
        let largest = oversized(4096, 4096).expect("limit is inclusive");
        assert_eq!(largest.layout.cell_count(), 1 << 24);
    }

    #[test]
    fn rejects_unknown_states_and_bad_tuning() {
        assert!(matches!(
            Settings::parse("[grid.visuals]\nmud = \"mud\"\n", GridOverrides::default()),
            Err(SettingsError::UnknownState(_))
        ));
        assert!(matches!(
            Settings::parse(
                "[interaction]\nahead_distance = -1.0\n",
                GridOverrides::default()
            ),
            Err(SettingsError::Tuning(_))
        ));
        assert!(matches!(
            Settings::parse("[agent]\nradius = 0.0\n", GridOverrides::default()),
            Err(SettingsError::InvalidAgent { name: "radius", .. })
        ));
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!(matches!(
            Settings::parse("[weather]\nrain = true\n", GridOverrides::default()),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("definitely/not/here.toml");
        let error = Settings::load(path, GridOverrides::default()).expect_err("missing file");

        assert!(error.to_string().contains("definitely/not/here.toml"));
    }
}
