#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the drover simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Unique identifier assigned to a live agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an agent category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(u32);

impl CategoryId {
    /// Creates a new category identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a pooled agent body slot.
///
/// The handle is an identity, not ownership: the pool owns the body's
/// lifecycle and the registry entry merely references it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Creates a new body handle with the provided slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot index of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of the player credited for a category's deliveries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Bitmask selecting which surfaces count as ground for a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceMask(u32);

impl SurfaceMask {
    /// Mask that matches every surface.
    #[must_use]
    pub const fn all() -> Self {
        Self(u32::MAX)
    }

    /// Mask that matches no surface at all.
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Retrieves the raw bit representation of the mask.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Reports whether the mask shares at least one layer with `other`.
    #[must_use]
    pub const fn intersects(&self, other: SurfaceMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for SurfaceMask {
    fn default() -> Self {
        Self::all()
    }
}

/// Scene anchor from which one path waypoint is derived.
///
/// Anchors that carry renderable or collidable bounds report the top of
/// those bounds so the derived waypoint clears the anchor's geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathAnchor {
    /// World-space position of the anchor.
    pub position: Vec3,
    /// Top height of the anchor's bounds, when the anchor has any.
    pub bounds_top: Option<f32>,
}

impl PathAnchor {
    /// Creates an anchor without bounds at the provided position.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            bounds_top: None,
        }
    }

    /// Creates an anchor whose bounds extend up to `top`.
    #[must_use]
    pub const fn with_bounds_top(position: Vec3, top: f32) -> Self {
        Self {
            position,
            bounds_top: Some(top),
        }
    }

    /// Nominal height used when deriving a waypoint from the anchor.
    #[must_use]
    pub fn nominal_height(&self) -> f32 {
        self.bounds_top.unwrap_or(self.position.y)
    }
}

/// Movement tuning shared by every agent of a category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    /// Horizontal travel speed in world units per second.
    pub move_speed: f32,
    /// Maximum yaw change in degrees per second.
    pub turn_speed: f32,
    /// Desired hover height above the sampled ground surface.
    pub hover_height: f32,
    /// Maximum vertical adjustment speed in world units per second.
    pub height_follow_speed: f32,
    /// The downward probe starts this far above the agent.
    pub probe_height: f32,
    /// Surfaces considered ground for this category.
    pub ground_mask: SurfaceMask,
    /// Whether agents restart the path instead of despawning at its end.
    pub loop_at_end: bool,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            move_speed: 2.5,
            turn_speed: 360.0,
            hover_height: 0.5,
            height_follow_speed: 5.0,
            probe_height: 2.0,
            ground_mask: SurfaceMask::all(),
            loop_at_end: false,
        }
    }
}

/// Immutable configuration of one agent category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryConfig {
    /// Simulated time between successive spawn attempts.
    pub spawn_interval: Duration,
    /// Upper bound on concurrently active agents of the category.
    pub max_active: u32,
    /// Player credited when an agent of the category delivers cargo.
    pub owner: PlayerId,
    /// Cargo amount delivered when an agent completes a non-looping path.
    pub cargo_value: u32,
    /// Movement tuning applied to every agent of the category.
    pub tuning: MotionTuning,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Installs or replaces a category's configuration and path anchors.
    ConfigureCategory {
        /// Identifier of the category being configured.
        category: CategoryId,
        /// Configuration the category should adopt.
        config: CategoryConfig,
        /// Ordered anchors from which the path is derived.
        anchors: Vec<PathAnchor>,
    },
    /// Rebuilds a category's waypoint path from a new anchor set.
    RebuildPath {
        /// Identifier of the category whose path is rebuilt.
        category: CategoryId,
        /// Ordered anchors from which the new path is derived.
        anchors: Vec<PathAnchor>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that one agent of the category be spawned onto its path.
    SpawnAgent {
        /// Identifier of the category attempting to spawn.
        category: CategoryId,
    },
    /// Moves an agent to the provided pose and waypoint target.
    MoveAgent {
        /// Identifier of the agent being moved.
        agent: AgentId,
        /// World-space position the agent should adopt.
        position: Vec3,
        /// Yaw heading in degrees the agent should adopt.
        yaw: f32,
        /// Index of the waypoint the agent targets next.
        waypoint_index: usize,
    },
    /// Removes an agent from the simulation, releasing its pooled body.
    DespawnAgent {
        /// Identifier of the agent being removed.
        agent: AgentId,
        /// Why the agent is leaving the simulation.
        cause: DespawnCause,
    },
}

/// Why an agent left the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnCause {
    /// The agent passed the final waypoint of a non-looping path.
    PathComplete,
    /// An external collaborator reported the agent defeated.
    Defeated,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// No category with the provided identifier exists.
    UnknownCategory,
    /// The category's path holds fewer than two waypoints.
    PathTooShort,
    /// The category already runs at its configured active cap.
    AtCapacity,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a category adopted a new configuration.
    CategoryConfigured {
        /// Identifier of the configured category.
        category: CategoryId,
        /// Number of waypoints derived from the provided anchors.
        waypoint_count: usize,
    },
    /// Confirms that a category's path was rebuilt.
    PathRebuilt {
        /// Identifier of the category whose path changed.
        category: CategoryId,
        /// Number of waypoints in the replacement path.
        waypoint_count: usize,
    },
    /// Confirms that an agent entered the simulation.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Category the agent belongs to.
        category: CategoryId,
        /// World-space position the agent starts from.
        position: Vec3,
        /// Initial yaw heading in degrees.
        yaw: f32,
    },
    /// Confirms that an agent moved to a new pose.
    AgentMoved {
        /// Identifier of the agent that moved.
        agent: AgentId,
        /// Position the agent occupied before the move.
        from: Vec3,
        /// Position the agent occupies after the move.
        to: Vec3,
    },
    /// Confirms that an agent left the simulation.
    AgentDespawned {
        /// Identifier of the removed agent.
        agent: AgentId,
        /// Category the agent belonged to.
        category: CategoryId,
        /// Why the agent was removed.
        cause: DespawnCause,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Category whose spawn request failed.
        category: CategoryId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Announces a completed delivery for the external currency ledger.
    CargoDelivered {
        /// Category whose agent completed the delivery.
        category: CategoryId,
        /// Player credited with the delivery.
        owner: PlayerId,
        /// Quantity handed to the ledger.
        amount: u32,
    },
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Category the agent belongs to.
    pub category: CategoryId,
    /// Pooled body slot backing the agent.
    pub body: BodyId,
    /// World-space position of the agent.
    pub position: Vec3,
    /// Yaw heading of the agent in degrees.
    pub yaw: f32,
    /// Average velocity over the move that produced the current pose.
    pub velocity: Vec3,
    /// Index of the waypoint the agent currently targets.
    pub waypoint_index: usize,
}

/// Read-only snapshot describing all live agents.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live agents captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no agents at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single category's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CategorySnapshot {
    /// Identifier of the category.
    pub id: CategoryId,
    /// Player credited for the category's deliveries.
    pub owner: PlayerId,
    /// Simulated time between successive spawn attempts.
    pub spawn_interval: Duration,
    /// Upper bound on concurrently active agents.
    pub max_active: u32,
    /// Number of currently active agents.
    pub active: u32,
    /// Cargo amount delivered per completed path.
    pub cargo_value: u32,
    /// Movement tuning applied to the category's agents.
    pub tuning: MotionTuning,
    /// Waypoints of the category's path in traversal order.
    pub waypoints: Vec<Vec3>,
}

/// Read-only snapshot describing all configured categories.
#[derive(Clone, Debug, Default)]
pub struct CategoryView {
    snapshots: Vec<CategorySnapshot>,
}

impl CategoryView {
    /// Creates a new category view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CategorySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured category snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CategorySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided category, if configured.
    #[must_use]
    pub fn get(&self, category: CategoryId) -> Option<&CategorySnapshot> {
        self.snapshots
            .binary_search_by_key(&category, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CategorySnapshot> {
        self.snapshots
    }
}

/// One intersection reported by a [`RayCaster`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    /// Distance from the probe origin along the probe direction.
    pub distance: f32,
    /// World-space point where the probe met the surface.
    pub point: Vec3,
    /// Agent that owns the intersected surface, if any.
    pub owner: Option<AgentId>,
    /// Whether the surface is trigger-only and never counts as ground.
    pub trigger: bool,
}

/// Abstract ray probe service supplied by the hosting environment.
///
/// Implementations may query a physics engine, a heightmap, a BVH, or a test
/// double. Hits may be returned in any order; callers select the nearest
/// themselves.
pub trait RayCaster {
    /// Casts a ray and returns every intersection within `max_distance`
    /// whose surface layers intersect `mask`.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: SurfaceMask)
        -> Vec<GroundHit>;
}

/// Nearest-surface height query honoring the self-exclusion contract.
pub trait GroundSample {
    /// Samples the ground height beneath `position`, skipping trigger-only
    /// surfaces and any surface owned by `exclude`. Returns `None` when no
    /// qualifying surface exists, in which case callers hold their previous
    /// height steady.
    fn sample_height(
        &self,
        position: Vec3,
        probe_height: f32,
        mask: SurfaceMask,
        exclude: Option<AgentId>,
    ) -> Option<f32>;
}

/// Yaw heading in degrees for travel along `direction`, projected onto the
/// ground plane. Returns `None` when the horizontal component is negligible.
#[must_use]
pub fn yaw_from_direction(direction: Vec3) -> Option<f32> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-8 {
        return None;
    }
    Some(flat.x.atan2(flat.z).to_degrees())
}

/// Wraps an angle in degrees into the `[-180, 180)` range.
#[must_use]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Rotates `current` toward `target` by at most `max_step` degrees, taking
/// the shorter way around the circle.
#[must_use]
pub fn rotate_yaw_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = wrap_degrees(target - current);
    if delta.abs() <= max_step {
        wrap_degrees(target)
    } else {
        wrap_degrees(current + delta.signum() * max_step)
    }
}
