pub mod career;
mod context;
pub mod economy;
mod engine;
pub mod events;
pub mod family;
pub mod health;
mod helpers;
mod names;
pub mod npc;
pub mod politics;
pub mod rates;
mod runner;
mod system;
pub mod turn;

pub use career::Unlock;
pub use context::TickContext;
pub use engine::GameEngine;
pub use names::generate_person_name;
pub use runner::{SimConfig, dispatch_systems};
pub use system::SimSystem;
pub use turn::turn_phases;
