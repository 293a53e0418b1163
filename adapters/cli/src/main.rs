#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Homestead experience.

mod session;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use homestead_core::{CellState, Event, VisualKey};
use homestead_rendering::{
    AgentPresentation, Color, FieldPresentation, HudPresentation, Palette, Presentation,
    RenderingBackend, Scene,
};
use homestead_rendering_macroquad::MacroquadBackend;
use homestead_system_bootstrap::Bootstrap;
use homestead_world::{query, VisualTable};
use log::{info, warn};

use self::{
    session::{scripted_input, Session},
    settings::{GridOverrides, Settings, DEFAULT_SETTINGS_PATH},
};

const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);

/// Command-line arguments accepted by the Homestead binary.
#[derive(Debug, Parser)]
#[command(name = "homestead", about = "Walk a field and work its cells with farming tools.")]
struct CliArgs {
    /// Settings file to load instead of the default `assets/homestead.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides the number of cells along world X.
    #[arg(long, value_name = "CELLS")]
    width: Option<u32>,
    /// Overrides the number of cells along world Z.
    #[arg(long, value_name = "CELLS")]
    height: Option<u32>,
    /// Renders as fast as possible instead of synchronising with the display.
    #[arg(long)]
    no_vsync: bool,
    /// Prints the frame rate once per second.
    #[arg(long)]
    show_fps: bool,
    /// Runs the scripted walk for the given number of steps without opening a window.
    #[arg(long, value_name = "STEPS")]
    headless: Option<u32>,
}

/// Entry point for the Homestead command-line interface.
fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let settings = load_settings(&args)?;
    let session = Session::new(&settings);
    let visuals = Bootstrap.visuals(session.world());
    for (state, visual) in unpainted_visuals(visuals, &settings.palette) {
        warn!("no palette color for visual `{visual}` of {state}; using the fallback color");
    }

    match args.headless {
        Some(steps) => {
            run_headless(session, steps);
            Ok(())
        }
        None => run_windowed(session, &settings, &args),
    }
}

fn load_settings(args: &CliArgs) -> Result<Settings> {
    let overrides = GridOverrides {
        width: args.width,
        height: args.height,
    };

    match &args.config {
        Some(path) => Settings::load(path, overrides)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => {
            let default_path = PathBuf::from(DEFAULT_SETTINGS_PATH);
            if default_path.exists() {
                Settings::load(&default_path, overrides).with_context(|| {
                    format!("failed to load settings from {}", default_path.display())
                })
            } else {
                info!("{DEFAULT_SETTINGS_PATH} not found; using built-in settings");
                Settings::defaults(overrides).context("built-in settings are invalid")
            }
        }
    }
}

fn unpainted_visuals<'a>(
    visuals: &'a VisualTable,
    palette: &'a Palette,
) -> impl Iterator<Item = (CellState, &'a VisualKey)> + 'a {
    visuals
        .iter()
        .filter(move |(_, visual)| !palette.contains(visual))
}

fn run_headless(mut session: Session, steps: u32) {
    let bootstrap = Bootstrap;
    println!("{}", bootstrap.welcome_banner(session.world()));

    let mut changes = 0usize;
    for step in 0..steps {
        let events = session.step(HEADLESS_FRAME, &scripted_input(step));
        changes += events
            .iter()
            .filter(|event| matches!(event, Event::CellStateChanged { .. }))
            .count();
    }
    info!("headless run finished after {steps} steps with {changes} state changes");

    let counts = query::state_counts(session.world());
    for (state, count) in counts.iter() {
        println!("{state}: {count}");
    }
    let worked = bootstrap.occupied_cells(session.world()).len();
    let watered = counts.get(CellState::Watered);
    println!("worked cells: {worked} (watered: {watered})");
}

fn run_windowed(mut session: Session, settings: &Settings, args: &CliArgs) -> Result<()> {
    let bootstrap = Bootstrap;
    let layout = *bootstrap.layout(session.world());
    let field = FieldPresentation::from_layout(
        &layout,
        Color::from_rgb_u8(86, 125, 70),
        Color::from_rgb_u8(70, 104, 57),
        Color::from_rgb_u8(250, 240, 160),
    )
    .context("field layout cannot be presented")?;

    let pose = session.pose();
    let agent = AgentPresentation::new(
        pose.position,
        pose.forward,
        settings.agent.radius,
        Color::from_rgb_u8(60, 90, 200),
    );
    let hud = HudPresentation::new(bootstrap.welcome_banner(session.world()));
    let scene = Scene::new(field, settings.palette.clone(), agent, hud);
    let presentation = Presentation::new("Homestead", Color::from_rgb_u8(24, 30, 22), scene);

    MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_show_fps(args.show_fps)
        .run(presentation, move |dt, input, scene| {
            let events = session.step(dt, &input);
            scene.apply_events(events);

            let pose = session.pose();
            scene.agent.position = pose.position;
            scene.agent.forward = pose.forward;

            let interaction = session.interaction();
            let target = interaction.last_target();
            scene.hud.tool = interaction.current_tool();
            scene.hud.target = target.map(|target| target.cell);
            scene.hud.target_valid = target.is_some_and(|target| target.valid);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_overrides_and_flags() {
        let args = CliArgs::try_parse_from([
            "homestead",
            "--width",
            "12",
            "--height",
            "7",
            "--no-vsync",
            "--headless",
            "30",
        ])
        .expect("valid arguments");

        assert_eq!(args.width, Some(12));
        assert_eq!(args.height, Some(7));
        assert!(args.no_vsync);
        assert!(!args.show_fps);
        assert_eq!(args.headless, Some(30));
        assert!(args.config.is_none());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = CliArgs::try_parse_from(["homestead", "--config", "missing/homestead.toml"])
            .expect("valid arguments");

        assert!(load_settings(&args).is_err());
    }

    #[test]
    fn reports_visuals_missing_from_palette() {
        let palette = Palette::standard();
        assert_eq!(
            unpainted_visuals(&VisualTable::standard(), &palette).count(),
            0
        );

        let visuals = VisualTable::standard().with(CellState::Path, VisualKey::new("gravel"));
        let missing: Vec<_> = unpainted_visuals(&visuals, &palette).collect();
        assert_eq!(missing, vec![(CellState::Path, &VisualKey::new("gravel"))]);
    }
}
