use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::math::primitives::Circle;

use crate::visualization::replay::{MassClass, TraceFrame};

#[derive(Component)]
struct ParticleIndex(pub usize);

/// Frames of a recorded trace plus the playback cursor
#[derive(Resource)]
struct Replay {
    frames: Vec<TraceFrame>,
    current: usize,
    timer: Timer,
}

const SCALE: f32 = 800.0; // unit torus -> pixels
const FRAME_SECONDS: f32 = 1.0;

fn class_color(class: MassClass) -> Color {
    match class {
        MassClass::Heavy => Color::RED,
        MassClass::Large => Color::YELLOW,
        MassClass::Medium => Color::WHITE,
        MassClass::Small => Color::GREEN,
    }
}

// torus centred on the origin
fn to_screen(x: f64, y: f64) -> Vec2 {
    Vec2::new((x as f32 - 0.5) * SCALE, (y as f32 - 0.5) * SCALE)
}

/// Play back `frames` one iteration per second
pub fn run_replay(frames: Vec<TraceFrame>) {
    if frames.is_empty() {
        tracing::warn!("trace has no frames, nothing to show");
        return;
    }
    println!("run_replay: {} iterations, {} particles", frames.len(), frames[0].masses.len());

    App::new()
        .insert_resource(Replay {
            frames,
            current: 0,
            timer: Timer::from_seconds(FRAME_SECONDS, TimerMode::Repeating),
        })
        .insert_resource(ClearColor(Color::BLACK))
        .add_plugins(DefaultPlugins)
        .add_systems(Startup, setup_particles_system)
        .add_systems(Update, (advance_frame_system, sync_transforms_system).chain())
        .run();
}

fn setup_particles_system(mut commands: Commands, replay: Res<Replay>, mut meshes: ResMut<Assets<Mesh>>, mut materials: ResMut<Assets<ColorMaterial>>) {
    // 2D camera
    commands.spawn(Camera2dBundle::default());

    let first = &replay.frames[0];
    for (i, (&m, x)) in first.masses.iter().zip(&first.positions).enumerate() {
        let class = MassClass::of(m);
        let p = to_screen(x.x, x.y);

        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Circle::new(class.radius()))),
                material: materials.add(ColorMaterial::from(class_color(class))),
                transform: Transform::from_xyz(p.x, p.y, 0.0),
                ..Default::default()
            },
            ParticleIndex(i),
        ));
    }
}

fn advance_frame_system(time: Res<Time>, mut replay: ResMut<Replay>) {
    if !replay.timer.tick(time.delta()).just_finished() {
        return;
    }
    // hold the last frame
    if replay.current + 1 < replay.frames.len() {
        replay.current += 1;
        tracing::debug!(iteration = replay.frames[replay.current].iteration, "frame");
    }
}

fn sync_transforms_system(replay: Res<Replay>, mut query: Query<(&ParticleIndex, &mut Transform)>) {
    let frame = &replay.frames[replay.current];
    for (ParticleIndex(i), mut transform) in &mut query {
        if let Some(x) = frame.positions.get(*i) {
            let p = to_screen(x.x, x.y);
            transform.translation.x = p.x;
            transform.translation.y = p.y;
        }
    }
}
