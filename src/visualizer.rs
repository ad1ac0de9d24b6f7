//! 2D visualization.
//!
//! Everything is drawn with gizmos through the domain's debug draw hooks, so the picture shows
//! exactly what the quadtree and the sensors see.

use bevy::prelude::*;

use sensor_sim::domain::{self, DebugRenderer, DrawLayer, Position, ScenarioConfig};

use crate::{
    controller::Pilot,
    resource::{ScenarioRes, WorldRes},
};

pub struct Visualizer;

impl Plugin for Visualizer {
    fn build(&self, app: &mut App) {
        let scenario = ScenarioConfig::default();
        app.add_systems(Startup, set_up)
            .add_systems(Update, (update_text, handle_keyboard_input, draw))
            .insert_resource(create_world(&scenario))
            .insert_resource(ScenarioRes::from(scenario))
            .init_resource::<Scene>();
    }
}

#[derive(Resource)]
pub struct Scene {
    show_tree: bool,
    show_sensors: bool,
    show_text: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            show_tree: true,
            show_sensors: true,
            show_text: true,
        }
    }
}

impl Scene {
    fn shows(&self, layer: DrawLayer) -> bool {
        match layer {
            DrawLayer::QuadTree => self.show_tree,
            DrawLayer::Sensor | DrawLayer::ActiveSensor => self.show_sensors,
            DrawLayer::Entity | DrawLayer::Agent => true,
        }
    }
}

#[derive(Component)]
struct Hud;

fn create_world(scenario: &ScenarioConfig) -> WorldRes {
    let world = match domain::generate(scenario) {
        Ok(world) => world,
        Err(err) => {
            error!(%err, "falling back to an empty world");
            domain::World::new(scenario.width, scenario.height)
        }
    };
    world.into()
}

fn set_up(mut commands: Commands, world: Res<WorldRes>) {
    let center = world.tree().region().center();
    commands.spawn(Camera2dBundle {
        transform: Transform::from_xyz(center.x() as f32, center.y() as f32, 999.9),
        ..default()
    });
    create_text(&mut commands);
}

fn create_text(commands: &mut Commands) {
    let text_style = TextStyle {
        font_size: 18.0,
        ..default()
    };
    commands.spawn((
        TextBundle::from_sections(vec![TextSection::new("", text_style)]).with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
        Hud,
    ));
}

struct GizmoRenderer<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    scene: &'a Scene,
}

impl DebugRenderer for GizmoRenderer<'_, '_, '_> {
    fn line(&mut self, start: Position, end: Position, layer: DrawLayer) {
        if self.scene.shows(layer) {
            self.gizmos
                .line_2d(to_bevy_position(start), to_bevy_position(end), color(layer));
        }
    }
}

fn color(layer: DrawLayer) -> Color {
    match layer {
        DrawLayer::QuadTree => Color::rgba(0.4, 0.4, 0.4, 0.5),
        DrawLayer::Entity => Color::ANTIQUE_WHITE,
        DrawLayer::Agent => Color::CYAN,
        DrawLayer::Sensor => Color::rgb(0.2, 0.6, 0.2),
        DrawLayer::ActiveSensor => Color::ORANGE_RED,
    }
}

fn draw(mut gizmos: Gizmos, world: Res<WorldRes>, scene: Res<Scene>) {
    world.debug_draw(&mut GizmoRenderer {
        gizmos: &mut gizmos,
        scene: &scene,
    });
}

fn update_text(
    mut text: Query<&mut Text, With<Hud>>,
    scene: Res<Scene>,
    world: Res<WorldRes>,
    pilot: Res<Pilot>,
) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    text.sections[0].value = match world.agent(0) {
        Some(agent) if scene.show_text => {
            let stats = world.stats();
            let activations = agent
                .activations()
                .iter()
                .map(|a| format!("{a:4.2}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "{}   COL: {}   NODES: {} ({} leaves, depth {})   ACT: {activations}",
                if pilot.is_manual() { "MANUAL" } else { "AUTO" },
                agent.collisions(),
                stats.node_count,
                stats.leaf_count,
                stats.max_depth,
            )
        }
        _ => String::new(),
    };
}

fn handle_keyboard_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut scene: ResMut<Scene>,
    mut scenario: ResMut<ScenarioRes>,
    mut world: ResMut<WorldRes>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        scenario.seed = scenario.seed.wrapping_add(1);
        *world = create_world(&scenario);
    }

    if keys.just_pressed(KeyCode::KeyQ) {
        scene.show_tree = !scene.show_tree;
    }

    if keys.just_pressed(KeyCode::KeyS) {
        scene.show_sensors = !scene.show_sensors;
    }

    if keys.just_pressed(KeyCode::KeyT) {
        scene.show_text = !scene.show_text;
    }
}

fn to_bevy_position(position: Position) -> Vec2 {
    Vec2::new(position.x() as f32, position.y() as f32)
}
