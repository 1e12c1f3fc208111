use rand::RngCore;

use super::context::TickContext;
use super::system::SimSystem;
use crate::model::World;

/// Configuration for a game.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub start_year: i32,
    pub seed: u64,
    /// Estates go to a living spouse, else are split evenly among children.
    /// Otherwise the eldest son inherits.
    pub fair_inheritance: bool,
    /// Age of a freshly created player character.
    pub player_start_age: u32,
}

impl SimConfig {
    pub fn new(start_year: i32, seed: u64) -> Self {
        Self {
            start_year,
            seed,
            ..Self::default()
        }
    }

    pub fn with_fair_inheritance(mut self) -> Self {
        self.fair_inheritance = true;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_year: 0,
            seed: 0,
            fair_inheritance: false,
            player_start_age: 18,
        }
    }
}

/// Run every phase once, in registration order.
///
/// Stops early once the game has ended, so nothing happens after the
/// player's line dies out.
pub fn dispatch_systems(
    world: &mut World,
    systems: &mut [Box<dyn SimSystem>],
    rng: &mut dyn RngCore,
    config: &SimConfig,
) {
    for system in systems.iter_mut() {
        if !world.running {
            tracing::debug!(system = system.name(), "game over, skipping remaining phases");
            break;
        }
        tracing::debug!(system = system.name(), year = world.year, "dispatching");
        let mut ctx = TickContext {
            world: &mut *world,
            rng: &mut *rng,
            config,
        };
        system.tick(&mut ctx);
    }
}
