use std::collections::BTreeSet;

use rand::{Rng, RngCore};
use tracing::debug;

use super::context::TickContext;
use super::economy;
use super::helpers::{pick, roll, uniform};
use super::names::pick_name;
use crate::id::PersonId;
use crate::model::{COIN, Gender, Job, NewNpcSpec, Person, Resource, World};

/// Spread applied to a spec's head count.
pub const COUNT_JITTER: (f64, f64) = (0.8, 1.2);

/// Create the people an NPC spec describes. They are placed in one of
/// `locations`, or a random active town when none are given, and start
/// ready to work the job they drew.
pub fn spawn_npcs(
    ctx: &mut TickContext,
    spec: &NewNpcSpec,
    locations: &BTreeSet<String>,
) -> Vec<PersonId> {
    let count = (f64::from(spec.count) * uniform(ctx.rng, COUNT_JITTER.0, COUNT_JITTER.1)).round() as u32;
    let places: Vec<String> = if locations.is_empty() {
        ctx.world.active_towns()
    } else {
        locations.iter().cloned().collect()
    };
    let (min_age, max_age) = (spec.min_age.min(spec.max_age), spec.max_age.max(spec.min_age));
    let affiliations: BTreeSet<String> = spec.affiliation.iter().cloned().collect();

    let mut spawned = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let age = ctx.rng.random_range(min_age..=max_age);
        let gender = if roll(ctx.rng, spec.male_share()) {
            Gender::Male
        } else {
            Gender::Female
        };
        let name = pick_name(ctx.world, ctx.rng, gender, &affiliations);
        let mut person = Person::new(name, gender, ctx.world.year - age as i32);
        person.age = age;
        person.affiliations = affiliations.clone();
        person.location = pick(ctx.rng, &places).cloned();
        let id = ctx.world.add_person(person);

        if let Some(job) = draw_job(ctx.world, ctx.rng, spec, age, gender) {
            employ(ctx, id, &job);
        }
        spawned.push(id);
    }
    debug!(count = spawned.len(), affiliation = ?spec.affiliation, "spawned npcs");
    spawned
}

/// Weighted draw over the spec's jobs, heaviest first. A draw landing on a
/// job the person can't do falls through to the next bucket.
pub fn draw_job(
    world: &World,
    rng: &mut dyn RngCore,
    spec: &NewNpcSpec,
    age: u32,
    gender: Gender,
) -> Option<Job> {
    let weights = spec.weighted_jobs();
    let total: f64 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let draw = rng.random::<f64>();
    let mut counter = 0.0;
    for (name, weight) in weights {
        let share = weight.max(0.0) / total;
        let fits = world
            .active_job(name)
            .filter(|job| job.admits_age(age) && job.admits_gender(gender));
        if let Some(job) = fits
            && draw < counter + share
        {
            return Some(job.clone());
        }
        counter += share;
    }
    None
}

/// Give a fresh NPC the job, backdating the start, and preload what it
/// takes to hold it.
fn employ(ctx: &mut TickContext, id: PersonId, job: &Job) {
    let year = ctx.world.year;
    let Some(age) = ctx.world.person(id).map(|p| p.age) else {
        return;
    };
    let experience = age.saturating_sub(job.min_age.unwrap_or(0));
    let backdate = ctx.rng.random_range(0..=experience) as i32;
    if let Some(person) = ctx.world.person_mut(id) {
        person.job = Some(job.name.clone());
        person.job_start_year = Some(year - backdate);
    }
    preload(ctx.world, id, job);
    economy::produce(ctx.world, id, job);
}

/// Hand a new NPC the skills, resources, affiliation and coin their job
/// asks for.
pub fn preload(world: &mut World, id: PersonId, job: &Job) {
    let floor = job
        .social_class
        .as_ref()
        .and_then(|c| world.catalog.social_classes.get(c))
        .map(|c| c.wealth);
    let resources: Vec<Resource> = job
        .required_resources
        .iter()
        .map(|r| world.catalog.resource_def(r).instance())
        .collect();
    let Some(person) = world.person_mut(id) else {
        return;
    };
    person.skills.extend(job.required_skills.iter().cloned());
    for resource in resources {
        person.add_resource(resource, 1);
    }
    if !job.affiliations.is_empty()
        && job.affiliations.is_disjoint(&person.affiliations)
        && let Some(first) = job.affiliations.iter().next()
    {
        person.affiliations.insert(first.clone());
    }

    if let Some(floor) = floor {
        let wealth = world.wealth(id);
        if wealth <= floor {
            let coins = (floor - wealth).floor() as u32 + 1;
            if let Some(person) = world.person_mut(id) {
                person.add_resource(Resource::new(COIN), coins);
            }
        }
    }
}

/// Remove NPCs holding `job`, each with probability `chance`. The player
/// and their family stay.
pub fn remove_npcs(ctx: &mut TickContext, job: &str, chance: f64) -> usize {
    let holders: Vec<PersonId> = ctx
        .world
        .living()
        .filter(|p| p.job.as_deref() == Some(job) && !p.is_in_player_family())
        .map(|p| p.id)
        .collect();
    let mut removed = 0;
    for id in holders {
        if chance >= 1.0 || roll(ctx.rng, chance) {
            ctx.world.remove_person(id);
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(job, removed, "npcs removed");
    }
    removed
}
