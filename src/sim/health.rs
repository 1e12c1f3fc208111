use tracing::debug;

use super::context::TickContext;
use super::family;
use super::helpers::{roll, uniform};
use crate::id::PersonId;
use crate::model::{Injury, World};

/// Knock up to `rate` off the person's health. They die when health runs
/// out or the rate is certain. Returns whether they died.
pub fn apply_mortality(ctx: &mut TickContext, id: PersonId, rate: f64, cause: &str) -> bool {
    if rate <= 0.0 {
        return false;
    }
    let hit = uniform(ctx.rng, 0.0, rate);
    let Some(person) = ctx.world.person_mut(id) else {
        return false;
    };
    if !person.is_alive() {
        return false;
    }
    person.health = (person.health - hit).max(0.0);
    if person.health <= 0.0 || rate >= 1.0 {
        family::dies(ctx, id, cause);
        return true;
    }
    false
}

/// Roll for each active injury that can reach the person.
pub fn contract_injuries(ctx: &mut TickContext, id: PersonId) {
    let world = &*ctx.world;
    let Some(person) = world.person(id) else {
        return;
    };
    let job_type = person
        .job
        .as_ref()
        .and_then(|j| world.catalog.jobs.get(j))
        .map(|j| j.kind);
    let exposures: Vec<(String, f64)> = world
        .active_injuries
        .values()
        .filter(|i| !person.injuries.contains(&i.name) && !person.treated_injuries.contains(&i.name))
        .filter(|i| i.applies_to(person.location.as_deref(), job_type))
        .map(|i| (i.name.clone(), i.likelihood))
        .collect();

    for (name, chance) in exposures {
        if roll(ctx.rng, chance) {
            debug!(person = id, injury = %name, "injured");
            if let Some(person) = ctx.world.person_mut(id) {
                person.injuries.insert(name);
            }
        }
    }
}

/// Apply the mortality of every injury the person carries.
pub fn suffer_injuries(ctx: &mut TickContext, id: PersonId) {
    let world = &*ctx.world;
    let Some(person) = world.person(id) else {
        return;
    };
    let age = person.age;
    let untreated = person.injuries.iter().filter_map(|name| {
        let rate = world.injury(name)?.untreated_mortality.as_ref()?;
        Some((name.clone(), rate.value_for(age)))
    });
    let treated = person.treated_injuries.iter().filter_map(|name| {
        let rate = world.injury(name)?.treated_mortality.as_ref()?;
        Some((name.clone(), rate.value_for(age)))
    });
    let hits: Vec<(String, f64)> = untreated.chain(treated).collect();

    for (name, rate) in hits {
        if apply_mortality(ctx, id, rate, &name) {
            break;
        }
    }
}

/// Treat injuries that have a cure on offer where the person is. Runs every turn.
pub fn seek_cures(world: &mut World, id: PersonId) -> Vec<String> {
    treat_where(world, id, |injury, location, year| {
        injury.cure.is_some() && injury.treatable(location, year)
    })
}

/// Treat every injury that can be treated here, including those with no
/// specific cure.
pub fn treat_injuries(world: &mut World, id: PersonId) -> Vec<String> {
    treat_where(world, id, |injury, location, year| {
        injury.treatable(location, year)
    })
}

fn treat_where(
    world: &mut World,
    id: PersonId,
    can_treat: impl Fn(&Injury, Option<&str>, i32) -> bool,
) -> Vec<String> {
    let year = world.year;
    let Some(person) = world.person(id) else {
        return Vec::new();
    };
    let location = person.location.as_deref();
    let treated: Vec<String> = person
        .injuries
        .iter()
        .filter(|name| world.injury(name).is_some_and(|i| can_treat(i, location, year)))
        .cloned()
        .collect();

    if let Some(person) = world.person_mut(id) {
        for name in &treated {
            person.injuries.remove(name);
            person.treated_injuries.insert(name.clone());
        }
    }
    treated
}
