#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic motion controller advancing agents along their paths.
//!
//! The controller consumes immutable snapshots and a ground sampler, then
//! emits one pose command per live agent plus despawn commands for agents
//! passing the end of a non-looping path. Horizontal steps are capped at
//! `speed * dt` and never overshoot the target waypoint; vertical motion
//! follows sampled ground at a capped rate; yaw turns toward the travel
//! heading at a capped angular rate.

use std::collections::BTreeSet;

use drover_core::{
    rotate_yaw_toward, yaw_from_direction, AgentId, AgentSnapshot, AgentView, CategorySnapshot,
    CategoryView, Command, DespawnCause, Event, GroundSample,
};
use glam::Vec3;

/// Horizontal distances below this count as arrival at the waypoint.
const ARRIVAL_EPSILON: f32 = 1e-4;

/// Pure system that reacts to world events and emits motion commands.
#[derive(Debug, Default)]
pub struct Motion;

impl Motion {
    /// Creates a new motion controller.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consumes events and immutable views to emit motion commands.
    ///
    /// Agents spawned within the current event batch receive an uncapped
    /// vertical snap onto the sampled ground, so a spawn never shows the
    /// gradual height follow-up.
    pub fn handle<S: GroundSample>(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        categories: &CategoryView,
        sampler: &S,
        out: &mut Vec<Command>,
    ) {
        let mut dt = 0.0_f32;
        let mut spawned_now: BTreeSet<AgentId> = BTreeSet::new();
        for event in events {
            match event {
                Event::TimeAdvanced { dt: elapsed } => dt += elapsed.as_secs_f32(),
                Event::AgentSpawned { agent, .. } => {
                    let _ = spawned_now.insert(*agent);
                }
                _ => {}
            }
        }

        if dt <= 0.0 && spawned_now.is_empty() {
            return;
        }

        for agent in agents.iter() {
            let Some(category) = categories.get(agent.category) else {
                continue;
            };
            let snap = spawned_now.contains(&agent.id);

            if dt <= 0.0 {
                if snap {
                    self.snap_to_ground(agent, category, sampler, out);
                }
                continue;
            }

            self.advance(agent, category, sampler, dt, snap, out);
        }
    }

    /// Settles a freshly spawned agent onto the ground without moving it
    /// horizontally. Used when a spawn arrives in a batch with no tick.
    fn snap_to_ground<S: GroundSample>(
        &self,
        agent: &AgentSnapshot,
        category: &CategorySnapshot,
        sampler: &S,
        out: &mut Vec<Command>,
    ) {
        let tuning = &category.tuning;
        let Some(height) = sampler.sample_height(
            agent.position,
            tuning.probe_height,
            tuning.ground_mask,
            Some(agent.id),
        ) else {
            return;
        };

        let mut position = agent.position;
        position.y = height + tuning.hover_height;
        out.push(Command::MoveAgent {
            agent: agent.id,
            position,
            yaw: agent.yaw,
            waypoint_index: agent.waypoint_index,
        });
    }

    fn advance<S: GroundSample>(
        &self,
        agent: &AgentSnapshot,
        category: &CategorySnapshot,
        sampler: &S,
        dt: f32,
        snap: bool,
        out: &mut Vec<Command>,
    ) {
        let tuning = &category.tuning;
        let waypoints = &category.waypoints;
        if waypoints.is_empty() {
            return;
        }

        // Clamp before indexing; the path may have shrunk mid-flight.
        let mut index = agent.waypoint_index.min(waypoints.len() - 1);
        let mut position = agent.position;
        let mut yaw = agent.yaw;

        let mut target = waypoints[index];
        let mut distance = horizontal_distance(position, target);

        if distance <= ARRIVAL_EPSILON {
            position.x = target.x;
            position.z = target.z;
            index += 1;

            if index >= waypoints.len() {
                if tuning.loop_at_end {
                    index = 0;
                } else {
                    out.push(Command::DespawnAgent {
                        agent: agent.id,
                        cause: DespawnCause::PathComplete,
                    });
                    return;
                }
            }

            target = waypoints[index];
            distance = horizontal_distance(position, target);
            if distance <= ARRIVAL_EPSILON {
                // Coincident waypoints; commit the snap and retry next tick.
                out.push(Command::MoveAgent {
                    agent: agent.id,
                    position,
                    yaw,
                    waypoint_index: index,
                });
                return;
            }
        }

        let direction = Vec3::new(target.x - position.x, 0.0, target.z - position.z) / distance;
        let step = tuning.move_speed * dt;
        if step >= distance {
            position.x = target.x;
            position.z = target.z;
        } else {
            position.x += direction.x * step;
            position.z += direction.z * step;
        }

        let desired_height = sampler
            .sample_height(
                position,
                tuning.probe_height,
                tuning.ground_mask,
                Some(agent.id),
            )
            .map_or(position.y, |height| height + tuning.hover_height);
        let vertical_cap = if snap {
            f32::INFINITY
        } else {
            tuning.height_follow_speed * dt
        };
        position.y = move_toward(position.y, desired_height, vertical_cap);

        if let Some(heading) = yaw_from_direction(direction) {
            yaw = rotate_yaw_toward(yaw, heading, tuning.turn_speed * dt);
        }

        out.push(Command::MoveAgent {
            agent: agent.id,
            position,
            yaw,
            waypoint_index: index,
        });
    }
}

fn horizontal_distance(from: Vec3, to: Vec3) -> f32 {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    (dx * dx + dz * dz).sqrt()
}

/// Moves `current` toward `target` by at most `max_delta`, landing exactly
/// on the target once within range.
fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta * delta.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::{horizontal_distance, move_toward};
    use glam::Vec3;

    #[test]
    fn move_toward_caps_the_step() {
        assert_eq!(move_toward(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_toward(0.0, -1.0, 0.25), -0.25);
    }

    #[test]
    fn move_toward_lands_exactly_on_target() {
        assert_eq!(move_toward(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_toward(1.0, 1.0, 0.25), 1.0);
    }

    #[test]
    fn move_toward_snaps_with_unbounded_cap() {
        assert_eq!(move_toward(-40.0, 3.0, f32::INFINITY), 3.0);
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let from = Vec3::new(0.0, 10.0, 0.0);
        let to = Vec3::new(3.0, -4.0, 4.0);
        assert_eq!(horizontal_distance(from, to), 5.0);
    }
}
