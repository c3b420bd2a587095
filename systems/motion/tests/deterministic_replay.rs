use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use drover_core::{
    AgentId, CategoryConfig, CategoryId, Command, Event, GroundSample, MotionTuning, PathAnchor,
    PlayerId, SurfaceMask,
};
use drover_system_motion::Motion;
use drover_system_spawning::Spawning;
use drover_world::{self as world, query, World};
use glam::Vec3;

/// Deterministic synthetic terrain: height varies with horizontal position.
struct RollingGround;

impl GroundSample for RollingGround {
    fn sample_height(
        &self,
        position: Vec3,
        _probe_height: f32,
        _mask: SurfaceMask,
        _exclude: Option<AgentId>,
    ) -> Option<f32> {
        Some((position.x * 0.25).sin() * 0.5)
    }
}

fn scripted_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();

    let caravan = CategoryConfig {
        spawn_interval: Duration::from_millis(750),
        max_active: 3,
        owner: PlayerId::new(1),
        cargo_value: 20,
        tuning: MotionTuning {
            move_speed: 3.0,
            hover_height: 0.5,
            ..MotionTuning::default()
        },
    };
    world::apply(
        &mut world,
        Command::ConfigureCategory {
            category: CategoryId::new(0),
            config: caravan,
            anchors: vec![
                PathAnchor::at(Vec3::new(0.0, 0.0, 0.0)),
                PathAnchor::at(Vec3::new(6.0, 0.0, 0.0)),
                PathAnchor::at(Vec3::new(6.0, 0.0, 6.0)),
            ],
        },
        &mut events,
    );

    let patrol = CategoryConfig {
        spawn_interval: Duration::from_millis(1250),
        max_active: 2,
        owner: PlayerId::new(2),
        cargo_value: 0,
        tuning: MotionTuning {
            move_speed: 2.0,
            hover_height: 1.0,
            loop_at_end: true,
            ..MotionTuning::default()
        },
    };
    world::apply(
        &mut world,
        Command::ConfigureCategory {
            category: CategoryId::new(1),
            config: patrol,
            anchors: vec![
                PathAnchor::at(Vec3::new(-4.0, 0.0, 0.0)),
                PathAnchor::with_bounds_top(Vec3::new(-4.0, 0.0, 5.0), 1.5),
            ],
        },
        &mut events,
    );

    world
}

fn replay(ticks: usize) -> u64 {
    let mut world = scripted_world();
    let mut spawning = Spawning::new();
    let mut motion = Motion::new();
    let sampler = RollingGround;

    let mut hasher = DefaultHasher::new();

    for _ in 0..ticks {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );

        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        spawning.handle(&events, &categories, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        let agents = query::agent_view(&world);
        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        motion.handle(&events, &agents, &categories, &sampler, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        for event in &events {
            fingerprint_event(event, &mut hasher);
        }
    }

    for agent in query::agent_view(&world).iter() {
        agent.id.hash(&mut hasher);
        agent.waypoint_index.hash(&mut hasher);
        hash_vec3(agent.position, &mut hasher);
    }

    hasher.finish()
}

fn fingerprint_event(event: &Event, hasher: &mut DefaultHasher) {
    match event {
        Event::AgentSpawned { agent, category, position, .. } => {
            0u8.hash(hasher);
            agent.hash(hasher);
            category.hash(hasher);
            hash_vec3(*position, hasher);
        }
        Event::AgentDespawned { agent, cause, .. } => {
            1u8.hash(hasher);
            agent.hash(hasher);
            cause.hash(hasher);
        }
        Event::CargoDelivered { owner, amount, .. } => {
            2u8.hash(hasher);
            owner.hash(hasher);
            amount.hash(hasher);
        }
        _ => {}
    }
}

fn hash_vec3(value: Vec3, hasher: &mut DefaultHasher) {
    value.x.to_bits().hash(hasher);
    value.y.to_bits().hash(hasher);
    value.z.to_bits().hash(hasher);
}

#[test]
fn replay_produces_identical_fingerprints() {
    let first = replay(400);
    let second = replay(400);
    assert_eq!(first, second, "replay diverged between runs");
}

#[test]
fn replay_spawns_and_completes_deliveries() {
    let mut world = scripted_world();
    let mut spawning = Spawning::new();
    let mut motion = Motion::new();
    let sampler = RollingGround;

    let mut deliveries = 0;
    let mut despawns = 0;
    for _ in 0..400 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );

        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        spawning.handle(&events, &categories, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        let agents = query::agent_view(&world);
        let categories = query::category_view(&world);
        let mut commands = Vec::new();
        motion.handle(&events, &agents, &categories, &sampler, &mut commands);
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }

        for event in events {
            match event {
                Event::CargoDelivered { .. } => deliveries += 1,
                Event::AgentDespawned { .. } => despawns += 1,
                _ => {}
            }
        }

        let view = query::category_view(&world);
        for category in view.iter() {
            assert!(
                category.active <= category.max_active,
                "category {} exceeded its cap",
                category.id.get()
            );
        }
    }

    assert!(deliveries > 0, "caravan agents never delivered");
    assert_eq!(deliveries, despawns, "looping patrol must never despawn");
    let patrol_active = query::category_view(&world)
        .get(CategoryId::new(1))
        .expect("patrol category")
        .active;
    assert_eq!(patrol_active, 2, "patrol should saturate its cap and loop");
}
