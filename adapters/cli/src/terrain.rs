//! Built-in heightfield terrain backing the driver's ray probes.

use drover_core::{GroundHit, RayCaster, SurfaceMask};
use drover_system_bootstrap::Terrain;
use glam::Vec3;

/// Ray-castable terrain assembled from a scenario description.
///
/// Heights come from an optional row-major grid; anywhere the grid does not
/// cover falls back to a flat plane at the base height.
pub(crate) struct HeightField {
    base_height: f32,
    grid: Option<Grid>,
}

struct Grid {
    origin_x: f32,
    origin_z: f32,
    cell_size: f32,
    rows: Vec<Vec<f32>>,
}

impl HeightField {
    pub(crate) fn from_scenario(terrain: &Terrain) -> Self {
        Self {
            base_height: terrain.base_height,
            grid: terrain.grid.as_ref().map(|grid| Grid {
                origin_x: grid.origin_x,
                origin_z: grid.origin_z,
                cell_size: grid.cell_size,
                rows: grid.rows.clone(),
            }),
        }
    }

    fn height_at(&self, x: f32, z: f32) -> f32 {
        let Some(grid) = &self.grid else {
            return self.base_height;
        };
        let column = (x - grid.origin_x) / grid.cell_size;
        let row = (z - grid.origin_z) / grid.cell_size;
        if column < 0.0 || row < 0.0 {
            return self.base_height;
        }
        grid.rows
            .get(row as usize)
            .and_then(|cells| cells.get(column as usize))
            .copied()
            .unwrap_or(self.base_height)
    }
}

impl RayCaster for HeightField {
    fn cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        _mask: SurfaceMask,
    ) -> Vec<GroundHit> {
        // Ground probes travel straight down; other rays never hit terrain.
        if direction.y >= 0.0 {
            return Vec::new();
        }
        let height = self.height_at(origin.x, origin.z);
        let distance = origin.y - height;
        if distance < 0.0 || distance > max_distance {
            return Vec::new();
        }
        vec![GroundHit {
            distance,
            point: Vec3::new(origin.x, height, origin.z),
            owner: None,
            trigger: false,
        }]
    }
}
