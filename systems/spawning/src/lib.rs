#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn scheduler emitting agent spawn commands per category.
//!
//! Every category accumulates elapsed time independently. Blocked categories
//! (short path, cap reached) keep accumulating so a transient block never
//! causes timer drift; only an actual spawn emission resets the accumulator.

use std::time::Duration;

use drover_core::{CategoryId, CategoryView, Command, Event};

/// Pure system that emits at most one spawn command per category per tick.
#[derive(Debug, Default)]
pub struct Spawning {
    clocks: Vec<CategoryClock>,
}

#[derive(Debug)]
struct CategoryClock {
    category: CategoryId,
    accumulator: Duration,
    reported_gap: bool,
}

impl Spawning {
    /// Creates a new scheduler with no per-category state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes events and the category view to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], categories: &CategoryView, out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() {
            return;
        }

        for snapshot in categories.iter() {
            let clock_index = self.clock_index(snapshot.id);
            let clock = &mut self.clocks[clock_index];
            clock.accumulator = clock.accumulator.saturating_add(elapsed);

            if snapshot.waypoints.len() < 2 {
                if !clock.reported_gap {
                    clock.reported_gap = true;
                    log::debug!(
                        "category {} stays idle: path holds {} waypoint(s)",
                        snapshot.id.get(),
                        snapshot.waypoints.len()
                    );
                }
                continue;
            }
            clock.reported_gap = false;

            if snapshot.active >= snapshot.max_active {
                continue;
            }

            // A zero interval is satisfied by any elapsed time at all.
            if clock.accumulator < snapshot.spawn_interval {
                continue;
            }

            clock.accumulator = Duration::ZERO;
            out.push(Command::SpawnAgent {
                category: snapshot.id,
            });
        }
    }

    fn clock_index(&mut self, category: CategoryId) -> usize {
        if let Some(index) = self
            .clocks
            .iter()
            .position(|clock| clock.category == category)
        {
            return index;
        }

        self.clocks.push(CategoryClock {
            category,
            accumulator: Duration::ZERO,
            reported_gap: false,
        });
        self.clocks.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::Spawning;
    use std::time::Duration;

    #[test]
    fn no_time_means_no_clock_allocation() {
        let mut spawning = Spawning::new();
        let mut out = Vec::new();
        spawning.handle(&[], &drover_core::CategoryView::default(), &mut out);
        assert!(out.is_empty());
        assert!(spawning.clocks.is_empty());
    }

    #[test]
    fn clock_index_is_stable_per_category() {
        let mut spawning = Spawning::new();
        let first = spawning.clock_index(drover_core::CategoryId::new(3));
        let second = spawning.clock_index(drover_core::CategoryId::new(5));
        assert_eq!(spawning.clock_index(drover_core::CategoryId::new(3)), first);
        assert_eq!(spawning.clock_index(drover_core::CategoryId::new(5)), second);
        spawning.clocks[first].accumulator = Duration::from_secs(2);
        assert_eq!(
            spawning.clocks[spawning.clocks.len() - 2].accumulator,
            Duration::from_secs(2)
        );
    }
}
