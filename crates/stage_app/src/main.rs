//! # stage_app — demo host
//!
//! Drives the stagehand runtime through a full lifecycle: register attribute
//! kinds, populate a handful of actors, run a few ticks with both sync and
//! parallel behaviors, snapshot the world to a file, and restore it.
//!
//! Phase ordering is the host's job: `init()` once, `update()` + `draw()`
//! per tick, `end()` once.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stage_actor::{Attribute, AttributeSet};
use stage_runtime::{Manager, ManagerConfig, Phase};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Position {
    x: f32,
    y: f32,
}

impl Attribute for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Velocity {
    dx: f32,
    dy: f32,
}

impl Attribute for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Health {
    current: u32,
}

impl Attribute for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stage_app=info".parse()?))
        .init();

    info!("stagehand demo starting");

    let mut manager = Manager::with_config(ManagerConfig::default());
    manager.register_attribute::<Position>();
    manager.register_attribute::<Velocity>();
    manager.register_attribute::<Health>();

    manager.with_world_mut(|world| {
        world.spawn(
            AttributeSet::new()
                .with(Position { x: 0.0, y: 0.0 })
                .with(Velocity { dx: 1.0, dy: 0.5 })
                .with(Health { current: 100 }),
        );
        world.spawn(
            AttributeSet::new()
                .with(Position { x: 10.0, y: -3.0 })
                .with(Velocity { dx: -0.25, dy: 0.0 }),
        );
        world.spawn(AttributeSet::new().with(Health { current: 30 }));
    });

    // Movement integrates velocity into position on the driver.
    manager.add_behavior(Phase::Update, |world| {
        for actor in world.actors_with(&[Position::tag(), Velocity::tag()]) {
            let velocity = match world.get_attribute::<Velocity>(actor) {
                Ok(Some(v)) => *v,
                _ => continue,
            };
            if let Ok(Some(position)) = world.get_attribute_mut::<Position>(actor) {
                position.x += velocity.dx;
                position.y += velocity.dy;
            }
        }
    });

    // Decay drains health off the driver and defers its writes.
    manager.add_parallel_behavior(Phase::PostUpdate, |world, buffer| {
        for actor in world.actors_with(&[Health::tag()]) {
            if let Ok(Some(health)) = world.get_attribute::<Health>(actor) {
                match health.current.checked_sub(10) {
                    Some(current) => buffer.add_attribute(actor, Health { current }),
                    None => buffer.despawn(actor),
                }
            }
        }
    });

    manager.add_behavior(Phase::Draw, |world| {
        for actor in world.actors_with(&[Position::tag()]) {
            if let Ok(Some(position)) = world.get_attribute::<Position>(actor) {
                info!(%actor, x = position.x, y = position.y, "draw");
            }
        }
    });

    manager.init()?;
    for tick in 0..3u32 {
        info!(tick, "tick");
        manager.update()?;
        manager.draw()?;
    }

    // Snapshot round trip through a file.
    let path = std::env::temp_dir().join("stage_app_snapshot.json");
    manager.save_to_file(&path)?;
    info!(path = %path.display(), "snapshot saved");
    manager.load_from_file(&path)?;
    info!(
        actors = manager.with_world(|w| w.actor_count()),
        "snapshot restored"
    );
    std::fs::remove_file(&path).ok();

    manager.end()?;
    info!("stagehand demo shut down");
    Ok(())
}
