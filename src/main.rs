#![cfg(not(target_arch = "wasm32"))]

use anyhow::Context;
use folio_physics::{
    layout, lifecycle, BallController, MoveDirection, PhysicsWorld, Respawnable, Scene, SceneGraph,
    WorldConfig,
};
use log::{info, LevelFilter};

const FRAMES: u32 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    setup_diagnostics();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => WorldConfig::default(),
    };

    info!("Starting folio-physics (headless)...");

    let mut scene = Scene::new();
    let mut world = PhysicsWorld::with_config(config.physics.clone());
    world.initialize_default()?;
    let factory = *world.factory();

    let scenery = layout::portfolio_scene(&config.bricks);
    lifecycle::spawn_all(&mut world, &mut scene, &factory, &scenery)?;
    let mut ball = Respawnable::spawn(
        &mut world,
        &mut scene,
        &factory,
        layout::player_ball(&config.gameplay),
        config.gameplay.fall_threshold,
    )?;
    info!("Scene ready: {} objects, {} bodies", scene.len(), world.len());

    let controller = BallController::new(config.gameplay.movement.clone());
    for frame in 0..FRAMES {
        let input = scripted_input(frame);
        if let Some(obj) = ball.current().and_then(|id| scene.object(id)) {
            controller.drive(&mut world, obj, &input);
        }

        let stats = world.step(&mut scene, FRAME_DT);
        ball.update(&mut world, &mut scene, &factory)?;

        if frame % 60 == 0 {
            if let Some(obj) = ball.current().and_then(|id| scene.object(id)) {
                info!(
                    "frame {frame:4}: ball at {:.2} ({} synced, {} skipped)",
                    obj.position, stats.synced, stats.skipped
                );
            }
        }
    }

    info!("Finished {FRAMES} frames, {} respawns", ball.respawns());
    world.dispose(&mut scene);
    Ok(())
}

/// Roll right for two seconds, then forward for two, then coast.
fn scripted_input(frame: u32) -> MoveDirection {
    match frame {
        0..=119 => MoveDirection::default(),
        120..=239 => MoveDirection { right: 1.0, ..MoveDirection::default() },
        240..=359 => MoveDirection { forward: 1.0, ..MoveDirection::default() },
        _ => MoveDirection::default(),
    }
}

fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();
}
