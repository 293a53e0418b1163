#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Homestead adapters.
//!
//! The [`Scene`] is a mirror of the visual instances owned by the world. It is
//! kept current by feeding it the world's events through
//! [`Scene::apply_events`], so backends never query the world directly.

use anyhow::Result as AnyResult;
use glam::{Vec2, Vec3};
use homestead_core::{CellCoord, Event, GridLayout, Tool, ToolPresses, VisualHandle, VisualKey};
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a replaced alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Maps visual keys announced by the world to fill colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: BTreeMap<VisualKey, Color>,
    fallback: Color,
}

impl Palette {
    /// Creates an empty palette that paints unknown visuals with `fallback`.
    #[must_use]
    pub fn new(fallback: Color) -> Self {
        Self {
            colors: BTreeMap::new(),
            fallback,
        }
    }

    /// Palette covering the visual keys of the standard visual table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Color::from_rgb_u8(255, 0, 255))
            .with(VisualKey::new("soil"), Color::from_rgb_u8(120, 85, 50))
            .with(VisualKey::new("watered"), Color::from_rgb_u8(70, 50, 35))
            .with(VisualKey::new("path"), Color::from_rgb_u8(190, 170, 130))
            .with(VisualKey::new("building"), Color::from_rgb_u8(150, 60, 50))
    }

    /// Returns the palette with an additional color assignment.
    #[must_use]
    pub fn with(mut self, key: VisualKey, color: Color) -> Self {
        self.insert(key, color);
        self
    }

    /// Assigns `color` to `key`, replacing any previous assignment.
    pub fn insert(&mut self, key: VisualKey, color: Color) {
        let _ = self.colors.insert(key, color);
    }

    /// Color used for `key`, or the fallback when the key is unknown.
    #[must_use]
    pub fn color_for(&self, key: &VisualKey) -> Color {
        self.colors.get(key).copied().unwrap_or(self.fallback)
    }

    /// Reports whether `key` has an explicit color.
    #[must_use]
    pub fn contains(&self, key: &VisualKey) -> bool {
        self.colors.contains_key(key)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Requested movement on the ground plane; `x` maps to world X and `y` to world Z.
    pub movement: Vec2,
    /// Tool slots pressed on this frame.
    pub tools: ToolPresses,
    /// Whether the deselect control was pressed on this frame.
    pub deselect: bool,
    /// Whether any action confirmation fired on this frame.
    pub confirm: bool,
}

/// Describes the rectangular field drawn beneath the overlays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPresentation {
    /// Number of cells along world X.
    pub columns: u32,
    /// Number of cells along world Z.
    pub rows: u32,
    /// Edge length of a single cell in world units.
    pub cell_size: f32,
    /// Ground-plane position of the field's minimum corner (world X, world Z).
    pub origin: Vec2,
    /// Color used to fill the ground.
    pub ground_color: Color,
    /// Color used when drawing cell lines.
    pub line_color: Color,
    /// Color used for the highlight cursor.
    pub highlight_color: Color,
}

impl FieldPresentation {
    /// Creates a new field descriptor.
    ///
    /// Returns an error when the field has no area or the cell size is not
    /// a positive finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: f32,
        origin: Vec2,
        ground_color: Color,
        line_color: Color,
        highlight_color: Color,
    ) -> Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyField { columns, rows });
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            origin,
            ground_color,
            line_color,
            highlight_color,
        })
    }

    /// Creates a field descriptor matching a world grid layout.
    pub fn from_layout(
        layout: &GridLayout,
        ground_color: Color,
        line_color: Color,
        highlight_color: Color,
    ) -> Result<Self, RenderingError> {
        let origin = layout.origin();
        Self::new(
            layout.width(),
            layout.height(),
            layout.cell_size(),
            Vec2::new(origin.x, origin.z),
            ground_color,
            line_color,
            highlight_color,
        )
    }

    /// Total extent along world X.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Total extent along world Z.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Converts a world position to field-local ground coordinates.
    #[must_use]
    pub fn to_local(&self, position: Vec3) -> Vec2 {
        Vec2::new(position.x, position.z) - self.origin
    }
}

/// Mirrored state of a single cell overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPresentation {
    /// Cell owning the overlay.
    pub cell: CellCoord,
    /// Edge length of the overlay quad.
    pub size: f32,
    /// World position of the overlay center.
    pub position: Vec3,
    /// Visual assigned most recently.
    pub visual: Option<VisualKey>,
    /// Whether the overlay is displayed.
    pub visible: bool,
}

/// Mirrored state of the highlight cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightPresentation {
    /// Handle announced by the world.
    pub handle: VisualHandle,
    /// Edge length of the highlight quad.
    pub size: f32,
    /// World position of the highlight center.
    pub position: Vec3,
    /// Whether the highlight is displayed.
    pub visible: bool,
}

/// The agent walking across the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentPresentation {
    /// World position of the agent.
    pub position: Vec3,
    /// Facing direction of the agent.
    pub forward: Vec3,
    /// Radius of the agent's footprint.
    pub radius: f32,
    /// Fill color of the agent.
    pub color: Color,
}

impl AgentPresentation {
    /// Creates a new agent descriptor.
    #[must_use]
    pub const fn new(position: Vec3, forward: Vec3, radius: f32, color: Color) -> Self {
        Self {
            position,
            forward,
            radius,
            color,
        }
    }
}

/// Heads-up information drawn over the field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HudPresentation {
    /// Banner shown at the top of the screen.
    pub banner: String,
    /// Tool currently selected, if any.
    pub tool: Option<Tool>,
    /// Cell currently targeted, if any.
    pub target: Option<CellCoord>,
    /// Whether the targeted cell is actionable.
    pub target_valid: bool,
}

impl HudPresentation {
    /// Creates a HUD that only shows the banner.
    #[must_use]
    pub fn new<T>(banner: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            banner: banner.into(),
            ..Self::default()
        }
    }

    /// Line describing the selected tool and target.
    #[must_use]
    pub fn status_line(&self) -> String {
        let tool = self
            .tool
            .map_or_else(|| "none".to_owned(), |tool| format!("{tool:?}"));
        match self.target {
            Some(cell) if self.target_valid => format!("tool: {tool} | target: {cell}"),
            Some(cell) => format!("tool: {tool} | target: {cell} (out of reach)"),
            None => format!("tool: {tool}"),
        }
    }
}

/// Scene description combining the field, mirrored visuals, the agent and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Field drawn beneath every other element.
    pub field: FieldPresentation,
    /// Colors used for overlay visuals.
    pub palette: Palette,
    /// Agent walking across the field.
    pub agent: AgentPresentation,
    /// Heads-up display content.
    pub hud: HudPresentation,
    overlays: BTreeMap<VisualHandle, OverlayPresentation>,
    highlight: Option<HighlightPresentation>,
}

impl Scene {
    /// Creates a new scene without any mirrored visuals.
    #[must_use]
    pub fn new(
        field: FieldPresentation,
        palette: Palette,
        agent: AgentPresentation,
        hud: HudPresentation,
    ) -> Self {
        Self {
            field,
            palette,
            agent,
            hud,
            overlays: BTreeMap::new(),
            highlight: None,
        }
    }

    /// Mirrors a single world event.
    ///
    /// Applying the same event twice leaves the scene unchanged. Show events
    /// for instances the scene has not seen yet create them on the fly.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::CellStateChanged { .. } => {}
            Event::OverlayCreated { cell, handle, size } => {
                let _ = self
                    .overlays
                    .entry(*handle)
                    .or_insert_with(|| OverlayPresentation {
                        cell: *cell,
                        size: *size,
                        position: Vec3::ZERO,
                        visual: None,
                        visible: false,
                    });
            }
            Event::OverlayShown {
                cell,
                handle,
                position,
                visual,
            } => {
                let size = self.field.cell_size;
                let overlay = self
                    .overlays
                    .entry(*handle)
                    .or_insert_with(|| OverlayPresentation {
                        cell: *cell,
                        size,
                        position: *position,
                        visual: None,
                        visible: false,
                    });
                overlay.position = *position;
                overlay.visual = Some(visual.clone());
                overlay.visible = true;
            }
            Event::OverlayHidden { handle, .. } => {
                if let Some(overlay) = self.overlays.get_mut(handle) {
                    overlay.visible = false;
                }
            }
            Event::HighlightCreated { handle, size } => {
                if self.highlight.is_none() {
                    self.highlight = Some(HighlightPresentation {
                        handle: *handle,
                        size: *size,
                        position: Vec3::ZERO,
                        visible: false,
                    });
                }
            }
            Event::HighlightShown { handle, position } => {
                let size = self.field.cell_size;
                let highlight = self.highlight.get_or_insert(HighlightPresentation {
                    handle: *handle,
                    size,
                    position: *position,
                    visible: false,
                });
                highlight.position = *position;
                highlight.visible = true;
            }
            Event::HighlightHidden { .. } => {
                if let Some(highlight) = self.highlight.as_mut() {
                    highlight.visible = false;
                }
            }
        }
    }

    /// Mirrors a batch of world events in order.
    pub fn apply_events<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.apply_event(event);
        }
    }

    /// Iterates every mirrored overlay in handle order.
    pub fn overlays(&self) -> impl Iterator<Item = &OverlayPresentation> + '_ {
        self.overlays.values()
    }

    /// Iterates the overlays that should be drawn along with their fill color.
    pub fn visible_overlays(&self) -> impl Iterator<Item = (&OverlayPresentation, Color)> + '_ {
        self.overlays.values().filter_map(|overlay| {
            let visual = overlay.visual.as_ref().filter(|_| overlay.visible)?;
            Some((overlay, self.palette.color_for(visual)))
        })
    }

    /// Mirrored highlight cursor, if it was ever created.
    #[must_use]
    pub const fn highlight(&self) -> Option<&HighlightPresentation> {
        self.highlight.as_ref()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Homestead scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum RenderingError {
    /// The field must contain at least one cell.
    #[error("field must contain at least one cell (received {columns}x{rows})")]
    EmptyField {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
    /// Cells must have a positive finite size.
    #[error("cell_size must be positive and finite (received {cell_size})")]
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
}
