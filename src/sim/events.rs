use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use tracing::{debug, info, warn};

use super::context::TickContext;
use super::family;
use super::helpers::{pick, pick_many, roll};
use super::npc;
use super::politics;
use crate::id::PersonId;
use crate::model::{ActiveEvent, Displacement, DisplacementKind, Event, RateKind, World};

/// Return chance for people sent away for work.
pub const JOB_RETURN_CHANCE: f64 = 0.8;

/// Catalog events triggering this year that haven't been applied yet.
pub fn due_events(world: &World) -> Vec<Event> {
    world
        .catalog
        .events_triggered_in(world.year)
        .into_iter()
        .filter(|e| !world.applied_events.contains(&e.key()))
        .collect()
}

/// Active events whose last year was the previous one.
pub fn expiring_events(world: &World) -> Vec<Event> {
    world
        .active_events
        .iter()
        .filter(|a| a.event.ends_in(world.year - 1))
        .map(|a| a.event.clone())
        .collect()
}

/// Put an event into effect. Each event applies once; later calls return
/// `false`.
pub fn apply_event(ctx: &mut TickContext, event: &Event) -> bool {
    if !ctx.world.applied_events.insert(event.key()) {
        return false;
    }
    info!(event = %event.name, year = ctx.world.year, "event applied");

    let world = &mut *ctx.world;
    for name in &event.injuries_added {
        match world.catalog.injuries.get(name) {
            Some(injury) => {
                let injury = injury.clone();
                world.activate_injury(injury, &event.locations);
            }
            None => warn!(event = %event.name, injury = %name, "unknown injury"),
        }
    }
    for name in &event.injuries_removed {
        withdraw_injury(world, name, &event.locations);
    }
    for name in &event.affiliations_added {
        if world.catalog.affiliations.contains_key(name) {
            world.active_affiliations.insert(name.clone());
        } else {
            warn!(event = %event.name, affiliation = %name, "unknown affiliation");
        }
    }
    for name in &event.affiliations_removed {
        world.active_affiliations.remove(name);
    }
    for name in &event.jobs_added {
        if world.catalog.jobs.contains_key(name) {
            world.active_jobs.insert(name.clone());
        } else {
            warn!(event = %event.name, job = %name, "unknown job");
        }
    }
    for name in &event.jobs_removed {
        world.active_jobs.remove(name);
    }

    for spec in &event.new_npcs {
        npc::spawn_npcs(ctx, spec, &event.locations);
    }
    let displaced = relocate(ctx, event);
    found_locations(ctx, event);
    abandon_locations(ctx, event);
    if let Some(change) = &event.ruler_change {
        politics::apply_ruler_change(ctx.world, change);
    }

    ctx.world.active_events.push(ActiveEvent {
        event: event.clone(),
        displaced,
    });
    true
}

/// End an active event. Returns `false` if it isn't active, so an event
/// expires at most once.
pub fn expire_event(ctx: &mut TickContext, event: &Event) -> bool {
    let key = event.key();
    let Some(index) = ctx
        .world
        .active_events
        .iter()
        .position(|a| a.event.key() == key)
    else {
        return false;
    };
    let active = ctx.world.active_events.remove(index);
    info!(event = %event.name, year = ctx.world.year, "event expired");

    for name in &event.injuries_added {
        withdraw_injury(ctx.world, name, &event.locations);
    }
    if event.return_on_end {
        return_displaced(ctx, &active.displaced);
    }
    convert_affiliations(ctx.world, &event.convert_affiliation);
    for (job, chance) in &event.remove_npcs {
        npc::remove_npcs(ctx, job, *chance);
    }
    true
}

/// Undo the activation an event made over `scope`.
pub fn withdraw_injury(world: &mut World, name: &str, scope: &BTreeSet<String>) {
    if world.active_injuries.contains_key(name) && !world.withdraw_injury(name, scope) {
        debug!(injury = name, "injury no longer active");
    }
}

/// Forced moves by age and by job type. Movers go alone.
pub fn relocate(ctx: &mut TickContext, event: &Event) -> Vec<Displacement> {
    let mut displaced = Vec::new();
    for rule in &event.age_relocation {
        let movers: Vec<PersonId> = ctx
            .world
            .living_at(&rule.from)
            .into_iter()
            .filter(|&id| ctx.world.person(id).is_some_and(|p| p.age <= rule.max_age))
            .collect();
        for id in movers {
            family::moves(ctx.world, id, &rule.to, false);
            displaced.push(Displacement {
                person: id,
                from: Some(rule.from.clone()),
                to: rule.to.clone(),
                kind: DisplacementKind::Age,
            });
        }
    }

    for rule in &event.job_relocation {
        let world = &*ctx.world;
        let candidates: Vec<(PersonId, Option<String>, f64)> = world
            .living()
            .filter(|p| p.affiliations.contains(&rule.affiliation))
            .filter_map(|p| {
                let kind = world.catalog.jobs.get(p.job.as_ref()?)?.kind;
                let chance = *rule.job_types.get(&kind)?;
                Some((p.id, p.location.clone(), chance))
            })
            .collect();
        for (id, from, chance) in candidates {
            if roll(ctx.rng, chance) {
                family::moves(ctx.world, id, &rule.to, false);
                displaced.push(Displacement {
                    person: id,
                    from,
                    to: rule.to.clone(),
                    kind: DisplacementKind::Job,
                });
            }
        }
    }
    displaced
}

/// Send displaced people home. Those moved by age go back on the
/// "Return To Pre-Event Location" rate, never without one. Those sent away
/// for work go to a living spouse, else an affiliation capital, else where
/// they came from.
pub fn return_displaced(ctx: &mut TickContext, displaced: &[Displacement]) {
    for d in displaced {
        let world = &*ctx.world;
        let Some(person) = world.person(d.person).filter(|p| p.is_alive()) else {
            continue;
        };
        if person.location.as_deref() != Some(d.to.as_str()) {
            continue;
        }
        let (chance, home) = match d.kind {
            DisplacementKind::Age => (
                world
                    .catalog
                    .rate(RateKind::ReturnToPreEventLocation, world.year)
                    .map_or(0.0, |r| r.value_for(person.age)),
                d.from.clone(),
            ),
            DisplacementKind::Job => {
                let home = world
                    .living_spouse(d.person)
                    .and_then(|s| world.person(s))
                    .and_then(|s| s.location.clone())
                    .or_else(|| {
                        person
                            .affiliations
                            .iter()
                            .find_map(|a| world.capital_of(a))
                            .map(str::to_string)
                    })
                    .or_else(|| d.from.clone());
                (JOB_RETURN_CHANCE, home)
            }
        };
        let Some(home) = home else {
            continue;
        };
        if roll(ctx.rng, chance) {
            family::moves(ctx.world, d.person, &home, false);
        }
    }
}

/// Activate founded locations and move some of the founding affiliation in.
pub fn found_locations(ctx: &mut TickContext, event: &Event) {
    for name in &event.locations_added {
        let Some(location) = ctx.world.catalog.locations.get(name).cloned() else {
            warn!(event = %event.name, location = %name, "unknown location");
            continue;
        };
        let founder = location.as_town().and_then(|t| t.founded_by.clone());
        ctx.world.activate_location(location);

        let Some(founder) = founder else {
            continue;
        };
        let founders: Vec<PersonId> = ctx
            .world
            .living()
            .filter(|p| p.affiliations.contains(&founder))
            .map(|p| p.id)
            .collect();
        if founders.len() > 2 {
            let n = ctx.rng.random_range(1..=founders.len() / 2);
            for id in pick_many(ctx.rng, &founders, n) {
                family::moves(ctx.world, id, name, false);
            }
            debug!(town = %name, settlers = n, "town founded");
        }
    }
}

/// Deactivate abandoned locations. Their inhabitants scatter over the
/// remaining towns.
pub fn abandon_locations(ctx: &mut TickContext, event: &Event) {
    for name in &event.locations_removed {
        ctx.world.active_locations.remove(name);
        let inhabitants = ctx.world.living_at(name);
        if inhabitants.is_empty() {
            continue;
        }
        let targets = ctx.world.active_towns();
        if targets.is_empty() {
            warn!(town = %name, "abandoned with nowhere to go");
            continue;
        }
        for id in inhabitants {
            if let Some(to) = pick(ctx.rng, &targets) {
                family::moves(ctx.world, id, to, false);
            }
        }
    }
}

/// Give every living holder of a source affiliation its target as well.
pub fn convert_affiliations(world: &mut World, conversions: &BTreeMap<String, String>) {
    for (from, to) in conversions {
        if from == to {
            continue;
        }
        let mut converted = 0;
        for person in world.persons.values_mut().filter(|p| p.is_alive()) {
            if person.affiliations.contains(from) && person.affiliations.insert(to.clone()) {
                converted += 1;
            }
        }
        if converted > 0 {
            info!(%from, %to, converted, "affiliation converted");
        }
    }
}
