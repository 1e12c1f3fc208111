#[macro_use]
mod macros;

pub mod affiliation;
pub mod event;
pub mod injury;
pub mod job;
pub mod location;
pub mod name;
pub mod npc;
pub mod person;
pub mod rate;
pub mod resource;
pub mod social_class;
pub mod window;
pub mod world;

pub use affiliation::Affiliation;
pub use event::{
    ActiveEvent, AgeRelocation, Displacement, DisplacementKind, Event, EventKey, JobRelocation,
    RulerChange,
};
pub use injury::{Cure, Injury};
pub use job::{Job, JobType};
pub use location::{County, Location, Region, Town};
pub use name::NameEntry;
pub use npc::NewNpcSpec;
pub use person::{Gender, Person};
pub use rate::{AgeBand, Rate, RateKind, RateValue};
pub use resource::{COIN, Inventory, Resource, ResourceDef, ResourceLot};
pub use social_class::SocialClass;
pub use window::YearWindow;
pub use world::{PlayerNotice, World};
