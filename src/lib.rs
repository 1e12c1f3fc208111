pub mod catalog;
pub mod error;
pub mod handle;
pub mod id;
pub mod model;
pub mod sim;
pub mod testutil;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use handle::EngineHandle;
pub use id::{IdGenerator, PersonId};
pub use model::{
    Affiliation, Event, Gender, Injury, Job, JobType, Location, Person, PlayerNotice, Rate,
    RateKind, Resource, World,
};
pub use sim::{GameEngine, SimConfig};
