//! Step-driven session that ties the walking agent, the interaction system and the world together.

use std::time::Duration;

use glam::{Vec2, Vec3};
use homestead_core::{Command, Event, Tool, ToolPresses};
use homestead_rendering::FrameInput;
use homestead_system_interaction::{AimPose, InteractionInput, ToolInteraction};
use homestead_world::{self as world, query, World};

use crate::settings::{AgentSettings, Settings};

/// Extra clearance kept between the agent's footprint and the field edge.
const EDGE_CLEARANCE: f32 = 0.02;

/// Number of steps the scripted walk spends on each lane.
const SCRIPT_LANE_STEPS: u32 = 60;

/// Mutable simulation state advanced once per frame.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    interaction: ToolInteraction,
    agent: AgentSettings,
    pose: AimPose,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl Session {
    /// Creates a session with the agent standing at the field center facing +Z.
    pub(crate) fn new(settings: &Settings) -> Self {
        let layout = settings.layout;
        let size = layout.world_size();
        let center = layout.origin() + Vec3::new(size.x * 0.5, 0.0, size.y * 0.5);

        Self {
            world: World::new(layout, settings.visuals.clone()),
            interaction: ToolInteraction::new(settings.interaction),
            agent: settings.agent,
            pose: AimPose::new(center, Vec3::Z),
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Authoritative world owned by the session.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Interaction system owned by the session.
    pub(crate) fn interaction(&self) -> &ToolInteraction {
        &self.interaction
    }

    /// Current agent pose.
    pub(crate) fn pose(&self) -> AimPose {
        self.pose
    }

    /// Advances the session by one frame and returns the world events it produced.
    pub(crate) fn step(&mut self, dt: Duration, input: &FrameInput) -> &[Event] {
        self.move_agent(dt, input.movement);

        let layout = *query::layout(&self.world);
        let world_view = &self.world;
        self.commands.clear();
        self.interaction.handle(
            InteractionInput::new(input.tools, input.deselect, input.confirm),
            Some(self.pose),
            &layout,
            |cell| query::cell_state(world_view, cell),
            &mut self.commands,
        );

        self.events.clear();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        &self.events
    }

    fn move_agent(&mut self, dt: Duration, movement: Vec2) {
        let direction = Vec3::new(movement.x, 0.0, movement.y);
        if direction.length_squared() > 0.0 {
            let direction = direction.normalize();
            self.pose.forward = direction;
            self.pose.position += direction * self.agent.speed * dt.as_secs_f32();
        }

        let layout = query::layout(&self.world);
        self.pose.position =
            layout.clamp_to_extent(self.pose.position, self.agent.radius + EDGE_CLEARANCE);
    }
}

/// Deterministic input used by headless runs.
///
/// The agent walks back and forth along one lane, hoeing on the way out and
/// watering on the way back, confirming every third step.
pub(crate) fn scripted_input(step: u32) -> FrameInput {
    let lane = step / SCRIPT_LANE_STEPS;
    let phase = step % SCRIPT_LANE_STEPS;
    let outbound = lane % 2 == 0;

    let tools = if phase == 0 {
        ToolPresses::only(if outbound { Tool::Hoe } else { Tool::Water })
    } else {
        ToolPresses::default()
    };

    FrameInput {
        movement: if outbound { Vec2::X } else { Vec2::NEG_X },
        tools,
        deselect: false,
        confirm: phase % 3 == 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GridOverrides;
    use homestead_core::{CellCoord, CellState};

    const FRAME: Duration = Duration::from_millis(100);

    fn settings() -> Settings {
        Settings::parse(
            r#"
            [grid]
            width = 5
            height = 5
            origin = [0.0, 0.0, 0.0]

            [agent]
            radius = 0.3
            speed = 1.0
            "#,
            GridOverrides::default(),
        )
        .expect("valid settings")
    }

    #[test]
    fn agent_starts_centered_facing_depth_axis() {
        let session = Session::new(&settings());

        assert_eq!(session.pose().position, Vec3::new(2.5, 0.0, 2.5));
        assert_eq!(session.pose().forward, Vec3::Z);
    }

    #[test]
    fn agent_is_kept_inside_the_field() {
        let mut session = Session::new(&settings());
        let input = FrameInput {
            movement: Vec2::new(-1.0, 0.0),
            ..FrameInput::default()
        };

        for _ in 0..30 {
            let _ = session.step(FRAME, &input);
        }

        let position = session.pose().position;
        assert!((position.x - 0.32).abs() <= 1e-5);
        assert_eq!(session.pose().forward, Vec3::NEG_X);
    }

    #[test]
    fn confirm_tills_the_cell_ahead() {
        let mut session = Session::new(&settings());
        let input = FrameInput {
            tools: ToolPresses::only(Tool::Hoe),
            confirm: true,
            ..FrameInput::default()
        };

        let events = session.step(FRAME, &input).to_vec();

        let target = CellCoord::new(2, 3);
        assert!(events.contains(&Event::CellStateChanged {
            cell: target,
            from: CellState::Empty,
            to: CellState::Soil,
        }));
        assert_eq!(query::cell_state(session.world(), target), CellState::Soil);
        assert_eq!(session.interaction().current_tool(), Some(Tool::Hoe));
    }

    #[test]
    fn scripted_walk_is_deterministic() {
        let run = || {
            let mut session = Session::new(&settings());
            for step in 0..240 {
                let _ = session.step(FRAME, &scripted_input(step));
            }
            (
                query::occupied_cells(session.world()),
                session.pose().position,
            )
        };

        let first = run();
        assert_eq!(first, run());
        assert!(!first.0.is_empty(), "scripted walk should work the field");
    }

    #[test]
    fn scripted_walk_alternates_tools_per_lane() {
        assert_eq!(scripted_input(0).tools, ToolPresses::only(Tool::Hoe));
        assert_eq!(scripted_input(1).tools, ToolPresses::default());
        assert!(scripted_input(1).confirm);
        assert_eq!(
            scripted_input(SCRIPT_LANE_STEPS).tools,
            ToolPresses::only(Tool::Water)
        );
        assert_eq!(scripted_input(SCRIPT_LANE_STEPS).movement, Vec2::NEG_X);
    }
}
