//! Fixtures shared by unit and integration tests.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::catalog::Catalog;
use crate::id::PersonId;
use crate::model::*;
use crate::sim::{GameEngine, SimConfig, TickContext};

/// Run `f` against `world` with a seeded RNG and the given config.
pub fn with_ctx<T>(
    world: &mut World,
    config: &SimConfig,
    seed: u64,
    f: impl FnOnce(&mut TickContext) -> T,
) -> T {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ctx = TickContext {
        world,
        rng: &mut rng,
        config,
    };
    f(&mut ctx)
}

/// An engine starting in `year` with a fixed seed.
pub fn engine_at(catalog: Catalog, year: i32) -> GameEngine {
    GameEngine::new(catalog, SimConfig::new(year, 42))
}

/// Kent around the Roman invasion: Canterbury held by the Cantiaci until
/// the Romans take it in 43, with Dover nearby.
pub fn kent() -> Catalog {
    let mut catalog = Catalog::default();
    catalog
        .add_affiliation(Affiliation::new("Cantiaci").with_capital("Canterbury"))
        .add_affiliation(Affiliation {
            conversion: Some("Romano British".into()),
            ..Affiliation::new("Roman").disliking("Cantiaci")
        })
        .add_affiliation(Affiliation::new("Romano British"));

    let mut canterbury = Town::new("Canterbury").in_county("Kent");
    canterbury.ruler = Some("Cantiaci".into());
    canterbury.rulers.insert(43, "Roman".into());
    catalog
        .add_location(canterbury)
        .add_location(Town::new("Dover").in_county("Kent"));
    catalog
}

/// A market town with a labourer and a swordsmith trade.
pub fn market() -> Catalog {
    let mut catalog = Catalog::default();
    let mut sword = ResourceDef::new("Sword");
    sword.required_resources.insert("Labour".into(), 1);
    sword.required_resources.insert("Iron".into(), 1);

    let mut smith = Job::new("Swordsmith");
    smith.kind = JobType::Trade;
    smith.produce_resource.insert("Sword".into(), 1);

    let mut labourer = Job::new("Labourer");
    labourer.produce_resource.insert("Labour".into(), 2);

    catalog
        .add_location(Town::new("York"))
        .add_resource(ResourceDef::new(COIN))
        .add_resource(ResourceDef::new("Iron"))
        .add_resource(ResourceDef::new("Labour"))
        .add_resource(sword)
        .add_job(smith)
        .add_job(labourer)
        .add_rate(Rate::exchange("Iron", COIN, 2.0))
        .add_rate(Rate::exchange("Labour", COIN, 1.0))
        .add_rate(Rate::exchange("Sword", COIN, 6.0));
    catalog
}

/// Add a living person at `location`.
pub fn person_at(
    world: &mut World,
    name: &str,
    gender: Gender,
    birth_year: i32,
    location: &str,
) -> PersonId {
    world.add_person(Person::new(name, gender, birth_year).at(location))
}

/// Give a person `count` units of `resource`, optionally on offer.
pub fn give(world: &mut World, id: PersonId, resource: &str, count: u32, for_sale: bool) {
    if let Some(p) = world.person_mut(id) {
        p.add_resource(Resource::new(resource).for_sale(for_sale), count);
    }
}
