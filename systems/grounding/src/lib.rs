#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ground sampling over an abstract ray probe service.
//!
//! The sampler casts a single downward probe and selects the nearest
//! qualifying intersection. Intersections owned by the querying agent are
//! excluded; without that exclusion an agent re-detects its own collision
//! volume as ground and drifts upward indefinitely.

use drover_core::{AgentId, GroundSample, RayCaster, SurfaceMask};
use glam::Vec3;

/// Nearest-hit ground sampler backed by any [`RayCaster`] implementation.
#[derive(Clone, Copy, Debug)]
pub struct GroundSampler<R> {
    caster: R,
}

impl<R> GroundSampler<R> {
    /// Creates a sampler over the provided ray probe service.
    #[must_use]
    pub const fn new(caster: R) -> Self {
        Self { caster }
    }
}

impl<R: RayCaster> GroundSample for GroundSampler<R> {
    fn sample_height(
        &self,
        position: Vec3,
        probe_height: f32,
        mask: SurfaceMask,
        exclude: Option<AgentId>,
    ) -> Option<f32> {
        let origin = Vec3::new(position.x, position.y + probe_height, position.z);
        let probe_length = probe_height * 2.0;
        let hits = self.caster.cast(origin, Vec3::NEG_Y, probe_length, mask);

        let mut nearest: Option<(f32, f32)> = None;
        for hit in hits {
            if hit.trigger {
                continue;
            }
            if hit.owner.is_some() && hit.owner == exclude {
                continue;
            }
            match nearest {
                Some((distance, _)) if distance <= hit.distance => {}
                _ => nearest = Some((hit.distance, hit.point.y)),
            }
        }

        nearest.map(|(_, height)| height)
    }
}
