#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Declarative scenario loading that seeds a world before the first tick.
//!
//! A [`Scenario`] is deserialized from configuration (the CLI adapter uses
//! TOML), validated once, and translated into the configuration command
//! batch the driver applies before ticking.

use std::time::Duration;

use drover_core::{CategoryConfig, CategoryId, Command, MotionTuning, PathAnchor, PlayerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Complete declarative description of one simulation run.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Scenario {
    /// Terrain description consumed by the driver's ray caster.
    #[serde(default)]
    pub terrain: Terrain,
    /// Agent categories in declaration order; ids are assigned by position.
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryScenario>,
}

/// Terrain the driver's built-in heightfield ray caster reproduces.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Terrain {
    /// Ground height everywhere the grid does not cover.
    #[serde(default)]
    pub base_height: f32,
    /// Optional sampled height grid overriding the base height.
    #[serde(default)]
    pub grid: Option<TerrainGrid>,
}

/// Row-major grid of sampled ground heights.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TerrainGrid {
    /// World-space X coordinate of the first column.
    pub origin_x: f32,
    /// World-space Z coordinate of the first row.
    pub origin_z: f32,
    /// Edge length of one square grid cell.
    pub cell_size: f32,
    /// Sampled heights, one row per entry.
    pub rows: Vec<Vec<f32>>,
}

/// One agent category as declared by the scenario author.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CategoryScenario {
    /// Human-readable name used in driver output.
    pub name: String,
    /// Player credited for the category's deliveries.
    pub owner: u8,
    /// Seconds between successive spawns.
    pub spawn_interval_secs: f32,
    /// Upper bound on concurrently active agents.
    pub max_active: u32,
    /// Cargo amount delivered per completed path.
    #[serde(default)]
    pub cargo_value: u32,
    /// Movement tuning; omitted fields fall back to the defaults.
    #[serde(default)]
    pub tuning: MotionTuning,
    /// Ordered path anchors the waypoints are derived from.
    pub anchors: Vec<PathAnchor>,
}

/// Reasons a scenario is rejected before any command is generated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    /// The scenario declares no categories at all.
    #[error("scenario declares no categories")]
    NoCategories,
    /// Two categories share the same name.
    #[error("category name `{0}` is declared twice")]
    DuplicateName(String),
    /// A spawn interval is not a positive, finite duration.
    #[error("category `{0}` lacks a positive, finite spawn interval")]
    InvalidInterval(String),
    /// A grid terrain declares no rows or a non-positive cell size.
    #[error("terrain grid is degenerate")]
    DegenerateGrid,
}

impl Scenario {
    /// Validates the scenario without mutating it.
    ///
    /// Categories with fewer than two anchors are accepted: such categories
    /// stay idle at runtime rather than failing configuration.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.categories.is_empty() {
            return Err(ScenarioError::NoCategories);
        }

        for (index, category) in self.categories.iter().enumerate() {
            if self.categories[..index]
                .iter()
                .any(|earlier| earlier.name == category.name)
            {
                return Err(ScenarioError::DuplicateName(category.name.clone()));
            }
            // try_from_secs_f32 covers NaN, infinities, negatives and overflow.
            let interval_valid = Duration::try_from_secs_f32(category.spawn_interval_secs)
                .is_ok_and(|interval| !interval.is_zero());
            if !interval_valid {
                return Err(ScenarioError::InvalidInterval(category.name.clone()));
            }
        }

        if let Some(grid) = &self.terrain.grid {
            if grid.rows.is_empty()
                || grid.rows.iter().any(Vec::is_empty)
                || !(grid.cell_size > 0.0)
            {
                return Err(ScenarioError::DegenerateGrid);
            }
        }

        Ok(())
    }

    /// Translates the scenario into the configuration command batch.
    ///
    /// Category identifiers are assigned by declaration order, matching
    /// [`Scenario::category_id`].
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.categories
            .iter()
            .enumerate()
            .map(|(index, category)| Command::ConfigureCategory {
                category: CategoryId::new(index as u32),
                config: CategoryConfig {
                    spawn_interval: Duration::from_secs_f32(category.spawn_interval_secs),
                    max_active: category.max_active,
                    owner: PlayerId::new(category.owner),
                    cargo_value: category.cargo_value,
                    tuning: category.tuning,
                },
                anchors: category.anchors.clone(),
            })
            .collect()
    }

    /// Identifier assigned to the named category, if declared.
    #[must_use]
    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .position(|category| category.name == name)
            .map(|index| CategoryId::new(index as u32))
    }

    /// Name of the category holding the provided identifier.
    #[must_use]
    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .get(id.get() as usize)
            .map(|category| category.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Scenario, ScenarioError};
    use drover_core::{CategoryId, Command};

    const SAMPLE: &str = r#"
        [terrain]
        base_height = 0.5

        [[category]]
        name = "caravan"
        owner = 1
        spawn_interval_secs = 2.0
        max_active = 6
        cargo_value = 20
        anchors = [
            { position = [0.0, 0.0, 0.0] },
            { position = [4.0, 0.0, 0.0], bounds_top = 1.5 },
        ]

        [[category]]
        name = "patrol"
        owner = 2
        spawn_interval_secs = 3.5
        max_active = 2
        anchors = [
            { position = [0.0, 0.0, 4.0] },
            { position = [4.0, 0.0, 4.0] },
        ]

        [category.tuning]
        move_speed = 4.0
        turn_speed = 180.0
        hover_height = 1.0
        height_follow_speed = 5.0
        probe_height = 2.0
        ground_mask = 4294967295
        loop_at_end = true
    "#;

    #[test]
    fn sample_scenario_parses_and_validates() {
        let scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        scenario.validate().expect("validate");

        assert_eq!(scenario.categories.len(), 2);
        assert_eq!(scenario.terrain.base_height, 0.5);
        assert_eq!(scenario.category_id("patrol"), Some(CategoryId::new(1)));
        assert_eq!(scenario.category_name(CategoryId::new(0)), Some("caravan"));
        assert!(scenario.categories[1].tuning.loop_at_end);
        assert_eq!(scenario.categories[1].tuning.move_speed, 4.0);
        assert_eq!(scenario.categories[0].anchors[1].bounds_top, Some(1.5));
    }

    #[test]
    fn commands_assign_ids_by_declaration_order() {
        let scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        let commands = scenario.commands();

        assert_eq!(commands.len(), 2);
        let Command::ConfigureCategory { category, config, anchors } = &commands[1] else {
            panic!("expected configuration command, got {:?}", commands[1]);
        };
        assert_eq!(*category, CategoryId::new(1));
        assert_eq!(config.max_active, 2);
        assert_eq!(config.cargo_value, 0);
        assert_eq!(anchors.len(), 2);
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let scenario: Scenario = toml::from_str("").expect("parse");
        assert_eq!(scenario.validate(), Err(ScenarioError::NoCategories));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        scenario.categories[1].name = "caravan".to_owned();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::DuplicateName("caravan".to_owned()))
        );
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        let mut scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        scenario.categories[0].spawn_interval_secs = 0.0;
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::InvalidInterval("caravan".to_owned()))
        );
    }

    #[test]
    fn non_finite_interval_is_rejected() {
        let mut scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        for bad in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN, -1.0] {
            scenario.categories[0].spawn_interval_secs = bad;
            assert_eq!(
                scenario.validate(),
                Err(ScenarioError::InvalidInterval("caravan".to_owned())),
                "interval {bad} must be rejected"
            );
        }
    }

    #[test]
    fn degenerate_grid_is_rejected() {
        let mut scenario: Scenario = toml::from_str(SAMPLE).expect("parse");
        scenario.terrain.grid = Some(super::TerrainGrid {
            origin_x: 0.0,
            origin_z: 0.0,
            cell_size: 1.0,
            rows: Vec::new(),
        });
        assert_eq!(scenario.validate(), Err(ScenarioError::DegenerateGrid));
    }
}
