#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the drover simulator.
//!
//! The world owns the agent registry, the category table, and the body pool.
//! All mutation flows through [`apply`]; systems observe the world through
//! the read-only [`query`] module and the events emitted by `apply`.

use std::{collections::VecDeque, time::Duration};

use drover_core::{
    yaw_from_direction, AgentId, BodyId, CategoryConfig, CategoryId, Command, DespawnCause, Event,
    SpawnError,
};
use drover_system_pathing::build_waypoints;
use glam::Vec3;

/// Bounded number of trail samples retained per body.
const TRAIL_CAPACITY: usize = 32;

/// Represents the authoritative drover world state.
#[derive(Debug, Default)]
pub struct World {
    categories: Vec<Category>,
    agents: Vec<Agent>,
    pool: AgentPool,
    next_agent_id: u32,
    tick_dt: Duration,
}

impl World {
    /// Creates a new world with no categories and an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    fn category_mut(&mut self, id: CategoryId) -> Option<&mut Category> {
        self.categories
            .iter_mut()
            .find(|category| category.id == id)
    }

    fn agent_index(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|agent| agent.id == id)
    }

    fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        id
    }

    fn clamp_agent_indices(&mut self, category: CategoryId, waypoint_count: usize) {
        let last_valid = waypoint_count.saturating_sub(1);
        for agent in self
            .agents
            .iter_mut()
            .filter(|agent| agent.category == category)
        {
            agent.waypoint_index = agent.waypoint_index.min(last_valid);
        }
    }

    fn spawn_agent(&mut self, category_id: CategoryId, out_events: &mut Vec<Event>) {
        let Some(category) = self.category(category_id) else {
            out_events.push(Event::SpawnRejected {
                category: category_id,
                reason: SpawnError::UnknownCategory,
            });
            return;
        };

        if category.waypoints.len() < 2 {
            out_events.push(Event::SpawnRejected {
                category: category_id,
                reason: SpawnError::PathTooShort,
            });
            return;
        }

        if category.active >= category.config.max_active {
            out_events.push(Event::SpawnRejected {
                category: category_id,
                reason: SpawnError::AtCapacity,
            });
            return;
        }

        let start = category.waypoints[0];
        let next = category.waypoints[1];
        // Face the second waypoint on the ground plane; +Z when they coincide.
        let yaw = yaw_from_direction(next - start).unwrap_or(0.0);

        let body = self.pool.acquire();
        {
            let slot = self.pool.body_mut(body);
            slot.position = start;
            slot.yaw = yaw;
        }

        let agent = self.allocate_agent_id();
        self.agents.push(Agent {
            id: agent,
            category: category_id,
            body,
            waypoint_index: 1,
        });

        if let Some(category) = self.category_mut(category_id) {
            category.active = category.active.saturating_add(1);
        }

        out_events.push(Event::AgentSpawned {
            agent,
            category: category_id,
            position: start,
            yaw,
        });
    }

    fn move_agent(
        &mut self,
        agent_id: AgentId,
        position: Vec3,
        yaw: f32,
        waypoint_index: usize,
        out_events: &mut Vec<Event>,
    ) {
        let Some(index) = self.agent_index(agent_id) else {
            log::debug!("move ignored for unknown agent {}", agent_id.get());
            return;
        };

        let dt = self.tick_dt.as_secs_f32();
        let category = self.agents[index].category;
        let waypoint_count = self
            .category(category)
            .map_or(0, |category| category.waypoints.len());
        let clamped = waypoint_index.min(waypoint_count.saturating_sub(1));

        let agent = &mut self.agents[index];
        agent.waypoint_index = clamped;

        let body = self.pool.body_mut(agent.body);
        let from = body.position;
        body.position = position;
        body.yaw = yaw;
        // Average velocity over the tick that produced the move.
        body.velocity = if dt > 0.0 {
            (position - from) / dt
        } else {
            Vec3::ZERO
        };
        body.record_trail(position);

        out_events.push(Event::AgentMoved {
            agent: agent_id,
            from,
            to: position,
        });
    }

    fn despawn_agent(&mut self, agent_id: AgentId, cause: DespawnCause, out_events: &mut Vec<Event>) {
        let Some(index) = self.agent_index(agent_id) else {
            log::debug!("despawn ignored for unknown agent {}", agent_id.get());
            return;
        };

        let agent = self.agents.remove(index);
        self.pool.release(agent.body);

        let mut delivery = None;
        if let Some(category) = self.category_mut(agent.category) {
            category.active = category.active.saturating_sub(1);
            if cause == DespawnCause::PathComplete && category.config.cargo_value > 0 {
                delivery = Some((category.config.owner, category.config.cargo_value));
            }
        }

        out_events.push(Event::AgentDespawned {
            agent: agent_id,
            category: agent.category,
            cause,
        });

        if let Some((owner, amount)) = delivery {
            out_events.push(Event::CargoDelivered {
                category: agent.category,
                owner,
                amount,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureCategory {
            category,
            config,
            anchors,
        } => {
            let waypoints = build_waypoints(&anchors, config.tuning.hover_height);
            let waypoint_count = waypoints.len();

            if let Some(existing) = world.category_mut(category) {
                existing.config = config;
                existing.waypoints = waypoints;
            } else {
                world.categories.push(Category {
                    id: category,
                    config,
                    waypoints,
                    active: 0,
                });
            }

            world.clamp_agent_indices(category, waypoint_count);
            out_events.push(Event::CategoryConfigured {
                category,
                waypoint_count,
            });
        }
        Command::RebuildPath { category, anchors } => {
            let Some(hover_height) = world
                .category(category)
                .map(|existing| existing.config.tuning.hover_height)
            else {
                log::debug!("path rebuild ignored for unknown category {}", category.get());
                return;
            };

            let waypoints = build_waypoints(&anchors, hover_height);
            let waypoint_count = waypoints.len();
            if let Some(existing) = world.category_mut(category) {
                // Replaced wholesale so no agent ever observes a partial path.
                existing.waypoints = waypoints;
            }

            world.clamp_agent_indices(category, waypoint_count);
            out_events.push(Event::PathRebuilt {
                category,
                waypoint_count,
            });
        }
        Command::Tick { dt } => {
            world.tick_dt = dt;
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnAgent { category } => {
            world.spawn_agent(category, out_events);
        }
        Command::MoveAgent {
            agent,
            position,
            yaw,
            waypoint_index,
        } => {
            world.move_agent(agent, position, yaw, waypoint_index, out_events);
        }
        Command::DespawnAgent { agent, cause } => {
            world.despawn_agent(agent, cause, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{PoolStats, World};
    use drover_core::{
        AgentId, AgentSnapshot, AgentView, CategorySnapshot, CategoryView,
    };
    use glam::Vec3;

    /// Captures a read-only view of all live agents in id order.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let snapshots: Vec<AgentSnapshot> = world
            .agents
            .iter()
            .map(|agent| {
                let body = world.pool.body(agent.body);
                AgentSnapshot {
                    id: agent.id,
                    category: agent.category,
                    body: agent.body,
                    position: body.position,
                    yaw: body.yaw,
                    velocity: body.velocity,
                    waypoint_index: agent.waypoint_index,
                }
            })
            .collect();
        AgentView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all configured categories in id order.
    #[must_use]
    pub fn category_view(world: &World) -> CategoryView {
        let snapshots: Vec<CategorySnapshot> = world
            .categories
            .iter()
            .map(|category| CategorySnapshot {
                id: category.id,
                owner: category.config.owner,
                spawn_interval: category.config.spawn_interval,
                max_active: category.config.max_active,
                active: category.active,
                cargo_value: category.config.cargo_value,
                tuning: category.config.tuning,
                waypoints: category.waypoints.clone(),
            })
            .collect();
        CategoryView::from_snapshots(snapshots)
    }

    /// Reports the pool's slot and free-list occupancy.
    #[must_use]
    pub fn pool_stats(world: &World) -> PoolStats {
        world.pool.stats()
    }

    /// Retrieves the bounded trail history recorded for a live agent.
    #[must_use]
    pub fn agent_trail(world: &World, agent: AgentId) -> Option<&[Vec3]> {
        let entry = world.agents.iter().find(|candidate| candidate.id == agent)?;
        Some(world.pool.body(entry.body).trail())
    }
}

#[derive(Debug)]
struct Category {
    id: CategoryId,
    config: CategoryConfig,
    waypoints: Vec<Vec3>,
    active: u32,
}

#[derive(Debug)]
struct Agent {
    id: AgentId,
    category: CategoryId,
    body: BodyId,
    waypoint_index: usize,
}

/// Occupancy statistics of the body pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of body slots ever constructed.
    pub slots: usize,
    /// Number of slots currently waiting on the free list.
    pub free: usize,
}

/// Reusable body slot carrying the transient, per-use state of one agent.
#[derive(Clone, Debug, Default)]
struct AgentBody {
    position: Vec3,
    yaw: f32,
    velocity: Vec3,
    trail: Vec<Vec3>,
}

impl AgentBody {
    fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.yaw = 0.0;
        self.velocity = Vec3::ZERO;
        self.trail.clear();
    }

    fn record_trail(&mut self, position: Vec3) {
        if self.trail.len() == TRAIL_CAPACITY {
            let _ = self.trail.remove(0);
        }
        self.trail.push(position);
    }

    fn trail(&self) -> &[Vec3] {
        &self.trail
    }
}

/// Grow-only pool recycling agent bodies through a FIFO free list.
///
/// The pool never inspects agent-specific state beyond the activity flag;
/// `acquire` clears the trail and zeroes pose and velocity so callers always
/// receive a body free of its previous use.
#[derive(Debug, Default)]
struct AgentPool {
    slots: Vec<Slot>,
    free: VecDeque<BodyId>,
}

#[derive(Clone, Debug)]
struct Slot {
    body: AgentBody,
    active: bool,
}

impl AgentPool {
    fn acquire(&mut self) -> BodyId {
        if let Some(id) = self.free.pop_front() {
            let slot = &mut self.slots[id.get() as usize];
            debug_assert!(!slot.active, "free list held an active body");
            slot.active = true;
            slot.body.reset();
            return id;
        }

        let id = BodyId::new(self.slots.len() as u32);
        self.slots.push(Slot {
            body: AgentBody::default(),
            active: true,
        });
        id
    }

    fn release(&mut self, id: BodyId) {
        let slot = &mut self.slots[id.get() as usize];
        debug_assert!(slot.active, "released a body twice");
        slot.active = false;
        self.free.push_back(id);
    }

    fn body(&self, id: BodyId) -> &AgentBody {
        &self.slots[id.get() as usize].body
    }

    fn body_mut(&mut self, id: BodyId) -> &mut AgentBody {
        &mut self.slots[id.get() as usize].body
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            slots: self.slots.len(),
            free: self.free.len(),
        }
    }
}
