#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Homestead.
//!
//! Macroquad is built without its `audio` feature; nothing here plays sound.
//!
//! The field is drawn top-down: world X runs to the right and world +Z runs
//! up the screen.

use anyhow::Result;
use glam::Vec2;
use homestead_core::ToolPresses;
use homestead_rendering::{
    Color, FieldPresentation, FrameInput, Presentation, RenderingBackend, Scene,
};
use macroquad::input::{
    is_key_down, is_key_pressed, is_mouse_button_pressed, KeyCode, MouseButton,
};
use std::time::Duration;

/// Vertical space reserved above the field for the HUD, in pixels.
const HUD_HEIGHT: f32 = 48.0;
const HUD_FONT_SIZE: f32 = 22.0;

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 960,
            window_height: 960,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let observation = ControlObservation::poll();
                if observation.quit {
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                update_scene(frame_dt, observation.frame_input(), &mut scene);

                let metrics = SceneMetrics::from_field(
                    &scene.field,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                draw_field(&scene.field, &metrics);
                draw_overlays(&scene, &metrics);
                draw_highlight(&scene, &metrics);
                draw_agent(&scene, &metrics);
                draw_hud(&scene);

                if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                    if show_fps {
                        println!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Raw control state sampled from macroquad on a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ControlObservation {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    tools: ToolPresses,
    deselect: bool,
    confirm_key: bool,
    confirm_click: bool,
    quit: bool,
}

impl ControlObservation {
    fn poll() -> Self {
        Self {
            up: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            tools: ToolPresses {
                hoe: is_key_pressed(KeyCode::Key1),
                water: is_key_pressed(KeyCode::Key2),
                build: is_key_pressed(KeyCode::Key3),
                clear: is_key_pressed(KeyCode::R),
            },
            deselect: is_key_pressed(KeyCode::Key0) || is_key_pressed(KeyCode::Escape),
            confirm_key: is_key_pressed(KeyCode::F) || is_key_pressed(KeyCode::E),
            confirm_click: is_mouse_button_pressed(MouseButton::Left),
            quit: is_key_pressed(KeyCode::Q),
        }
    }

    /// Converts the sampled controls into the backend-agnostic frame input.
    fn frame_input(self) -> FrameInput {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        let movement = Vec2::new(axis(self.right, self.left), axis(self.up, self.down));

        FrameInput {
            movement: movement.normalize_or_zero(),
            tools: self.tools,
            deselect: self.deselect,
            confirm: self.confirm_key || self.confirm_click,
        }
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the average rate once a second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

/// Screen-space placement of the field.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    field_height: f32,
}

impl SceneMetrics {
    fn from_field(field: &FieldPresentation, screen_width: f32, screen_height: f32) -> Self {
        let world_width = field.width();
        let world_height = field.height();
        let available_height = (screen_height - HUD_HEIGHT).max(0.0);
        let scale = if world_width <= f32::EPSILON || world_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world_width).min(available_height / world_height)
        };

        let offset_x = ((screen_width - world_width * scale) * 0.5).max(0.0);
        let offset_y = HUD_HEIGHT + ((available_height - world_height * scale) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            field_height: world_height,
        }
    }

    /// Maps field-local ground coordinates to screen pixels, flipping the vertical axis.
    fn to_screen(&self, local: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + local.x * self.scale,
            self.offset_y + (self.field_height - local.y) * self.scale,
        )
    }

    /// Top-left screen corner of a square of `size` centered at `local`.
    fn square_corner(&self, local: Vec2, size: f32) -> Vec2 {
        let half = size * 0.5;
        self.to_screen(Vec2::new(local.x - half, local.y + half))
    }
}

fn draw_field(field: &FieldPresentation, metrics: &SceneMetrics) {
    let corner = metrics.to_screen(Vec2::new(0.0, field.height()));
    let width = field.width() * metrics.scale;
    let height = field.height() * metrics.scale;
    macroquad::shapes::draw_rectangle(
        corner.x,
        corner.y,
        width,
        height,
        to_macroquad_color(field.ground_color),
    );

    let line_color = to_macroquad_color(field.line_color);
    let step = field.cell_size * metrics.scale;
    for column in 0..=field.columns {
        let x = corner.x + column as f32 * step;
        macroquad::shapes::draw_line(x, corner.y, x, corner.y + height, 1.0, line_color);
    }
    for row in 0..=field.rows {
        let y = corner.y + row as f32 * step;
        macroquad::shapes::draw_line(corner.x, y, corner.x + width, y, 1.0, line_color);
    }
}

fn draw_overlays(scene: &Scene, metrics: &SceneMetrics) {
    for (overlay, color) in scene.visible_overlays() {
        let local = scene.field.to_local(overlay.position);
        let corner = metrics.square_corner(local, overlay.size);
        let size = overlay.size * metrics.scale;
        macroquad::shapes::draw_rectangle(
            corner.x,
            corner.y,
            size,
            size,
            to_macroquad_color(color),
        );
    }
}

fn draw_highlight(scene: &Scene, metrics: &SceneMetrics) {
    let Some(highlight) = scene.highlight().filter(|highlight| highlight.visible) else {
        return;
    };

    let local = scene.field.to_local(highlight.position);
    let corner = metrics.square_corner(local, highlight.size);
    let size = highlight.size * metrics.scale;
    let color = scene.field.highlight_color;
    macroquad::shapes::draw_rectangle(
        corner.x,
        corner.y,
        size,
        size,
        to_macroquad_color(color.with_alpha(0.25)),
    );
    macroquad::shapes::draw_rectangle_lines(
        corner.x,
        corner.y,
        size,
        size,
        2.0,
        to_macroquad_color(color),
    );
}

fn draw_agent(scene: &Scene, metrics: &SceneMetrics) {
    let agent = scene.agent;
    let center = metrics.to_screen(scene.field.to_local(agent.position));
    let radius = agent.radius * metrics.scale;
    let color = to_macroquad_color(agent.color);
    macroquad::shapes::draw_circle(center.x, center.y, radius, color);

    let facing = Vec2::new(agent.forward.x, agent.forward.z).normalize_or_zero();
    let tip = metrics.to_screen(
        scene.field.to_local(agent.position) + facing * agent.radius * 1.8,
    );
    macroquad::shapes::draw_line(
        center.x,
        center.y,
        tip.x,
        tip.y,
        2.0,
        to_macroquad_color(agent.color.lighten(0.5)),
    );
}

fn draw_hud(scene: &Scene) {
    let color = macroquad::color::WHITE;
    let _ = macroquad::text::draw_text(&scene.hud.banner, 12.0, 20.0, HUD_FONT_SIZE, color);
    let _ = macroquad::text::draw_text(
        &scene.hud.status_line(),
        12.0,
        40.0,
        HUD_FONT_SIZE,
        color,
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
