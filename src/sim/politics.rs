use std::collections::BTreeMap;

use tracing::{debug, info};

use super::context::TickContext;
use super::helpers::{pick, roll};
use crate::model::{
    Event, Injury, JobRelocation, JobType, Rate, RateKind, RulerChange, Town, World,
};

pub const KILLED_IN_BATTLE: &str = "Killed In Battle";

/// Chance per turn of falling in a battle zone when content doesn't define
/// the injury itself.
const BATTLE_LIKELIHOOD: f64 = 0.2;

/// Register a lethal default battle injury if content lacks one.
fn ensure_battle_injury(world: &mut World) {
    world
        .catalog
        .injuries
        .entry(KILLED_IN_BATTLE.to_string())
        .or_insert_with(|| Injury {
            likelihood: BATTLE_LIKELIHOOD,
            untreated_mortality: Some(Rate::flat(RateKind::Mortality, 1.0)),
            ..Injury::new(KILLED_IN_BATTLE)
        });
}

fn hostile(world: &World, a: &str, b: &str) -> bool {
    let affiliations = &world.catalog.affiliations;
    match (affiliations.get(a), affiliations.get(b)) {
        (Some(a), Some(b)) => a.is_hostile_to(b),
        (Some(a), None) => a.dislikes(b),
        (None, Some(b)) => b.dislikes(a),
        (None, None) => false,
    }
}

/// The event for `town` changing hands in `year`, if its timeline says so.
pub fn conquest_event(world: &World, town: &Town, year: i32) -> Option<Event> {
    let ruler = town.rulers.get(&year)?;
    let name = format!("{ruler} conquers {}", town.name);
    let mut event = Event::new(name.clone(), year);
    event.description = name;
    event.end_year = Some(year);
    event.locations.insert(town.name.clone());
    event.ruler_change = Some(RulerChange {
        town: town.name.clone(),
        previous: town.ruler.clone(),
        ruler: ruler.clone(),
    });

    if let Some(previous) = town.ruler.as_deref().filter(|p| *p != ruler.as_str()) {
        if hostile(world, previous, ruler) {
            event.injuries_added.insert(KILLED_IN_BATTLE.to_string());
        }
        let target = world
            .catalog
            .affiliations
            .get(ruler)
            .map_or(ruler.as_str(), |aff| aff.conversion_target());
        event
            .convert_affiliation
            .insert(previous.to_string(), target.to_string());
    }
    Some(event)
}

/// Synthesise this year's ruler changes for every active town and add them
/// to the catalog. Returns the events added.
pub fn create_ruler_events(world: &mut World, year: i32) -> Vec<Event> {
    let events: Vec<Event> = world
        .catalog
        .towns()
        .filter(|t| world.active_locations.contains(&t.name))
        .filter_map(|t| conquest_event(world, t, year))
        .collect();
    let mut added = Vec::new();
    for event in events {
        if !event.injuries_added.is_empty() {
            ensure_battle_injury(world);
        }
        if world.catalog.add_event(event.clone()) {
            added.push(event);
        }
    }
    added
}

/// Hand the town to its new ruler and end hostility between old and new.
pub fn apply_ruler_change(world: &mut World, change: &RulerChange) {
    if let Some(town) = world.catalog.town_mut(&change.town) {
        town.ruler = Some(change.ruler.clone());
    }
    if let Some(previous) = &change.previous {
        for (a, b) in [(&change.ruler, previous), (previous, &change.ruler)] {
            if let Some(aff) = world.catalog.affiliations.get_mut(a) {
                aff.disliked.remove(b);
            }
        }
    }
    info!(town = %change.town, ruler = %change.ruler, previous = ?change.previous, "conquest");
}

/// A battle next year between `attacker` and a random disliked affiliation
/// that has a capital. The attacker's military marches on that capital and
/// comes home when it ends.
pub fn generate_battle_event(ctx: &mut TickContext, attacker: &str) -> Option<Event> {
    let world = &*ctx.world;
    let aff = world.catalog.affiliations.get(attacker)?;
    let defenders: Vec<(&str, &str)> = aff
        .disliked
        .iter()
        .filter(|d| d.as_str() != attacker && world.active_affiliations.contains(*d))
        .filter_map(|d| Some((d.as_str(), world.capital_of(d)?)))
        .collect();
    let (defender, capital) = pick(ctx.rng, &defenders).map(|(d, c)| (d.to_string(), c.to_string()))?;

    let year = world.year + 1;
    let mut event = Event::new(format!("Battle of {capital}"), year);
    event.description = format!("{attacker} attack {defender}");
    event.end_year = Some(year);
    event.locations.insert(capital.clone());
    event.injuries_added.insert(KILLED_IN_BATTLE.to_string());
    event.job_relocation.push(JobRelocation {
        affiliation: attacker.to_string(),
        job_types: BTreeMap::from([(JobType::Military, 1.0)]),
        to: capital,
    });
    event.return_on_end = true;

    ensure_battle_injury(ctx.world);
    if ctx.world.catalog.add_event(event.clone()) {
        debug!(%attacker, %defender, year, "battle planned");
        Some(event)
    } else {
        None
    }
}

/// Roll the "Inter-Tribe Battle" rate for every active affiliation with an
/// enemy.
pub fn roll_battles(ctx: &mut TickContext) -> Vec<Event> {
    let world = &*ctx.world;
    let Some(chance) = world
        .catalog
        .rate(RateKind::InterTribeBattle, world.year)
        .map(|r| r.value_for(0))
    else {
        return Vec::new();
    };
    let attackers: Vec<String> = world
        .active_affiliations
        .iter()
        .filter(|name| {
            world
                .catalog
                .affiliations
                .get(*name)
                .is_some_and(|a| !a.disliked.is_empty())
        })
        .cloned()
        .collect();

    let mut battles = Vec::new();
    for attacker in attackers {
        if roll(ctx.rng, chance)
            && let Some(event) = generate_battle_event(ctx, &attacker)
        {
            battles.push(event);
        }
    }
    battles
}

/// "Founding of" and "Abandonment of" events for every town with those
/// years set. Returns how many were added to the catalog.
pub fn generate_location_events(world: &mut World) -> usize {
    let mut events = Vec::new();
    for town in world.catalog.towns() {
        if let Some(year) = town.founded {
            let mut event = Event::new(format!("Founding of {}", town.name), year);
            event.description = format!("{} is founded", town.name);
            event.end_year = Some(year);
            event.locations_added.insert(town.name.clone());
            events.push(event);
        }
        if let Some(year) = town.abandoned {
            let mut event = Event::new(format!("Abandonment of {}", town.name), year);
            event.description = format!("{} is abandoned", town.name);
            event.end_year = Some(year);
            event.locations_removed.insert(town.name.clone());
            events.push(event);
        }
    }
    events
        .into_iter()
        .filter(|e| world.catalog.add_event(e.clone()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Affiliation;
    use crate::sim::SimConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn kent() -> World {
        let mut world = World::new(43);
        world
            .catalog
            .add_affiliation(Affiliation::new("Cantiaci"))
            .add_affiliation(Affiliation {
                conversion: Some("Romano British".into()),
                ..Affiliation::new("Roman").disliking("Cantiaci")
            })
            .add_affiliation(Affiliation::new("Romano British"));
        let mut canterbury = Town::new("Canterbury").in_county("Kent");
        canterbury.ruler = Some("Cantiaci".into());
        canterbury.rulers.insert(43, "Roman".into());
        world.activate_location(canterbury.into());
        world
    }

    #[test]
    fn hostile_conquest_is_deadly_and_converts() {
        let mut world = kent();
        let events = create_ruler_events(&mut world, 43);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.name, "Roman conquers Canterbury");
        assert!(event.injuries_added.contains(KILLED_IN_BATTLE));
        assert_eq!(
            event.convert_affiliation.get("Cantiaci").map(String::as_str),
            Some("Romano British")
        );
        assert!(world.catalog.injuries.contains_key(KILLED_IN_BATTLE));
        assert!(create_ruler_events(&mut world, 43).is_empty());
        assert!(create_ruler_events(&mut world, 44).is_empty());
    }

    #[test]
    fn friendly_conquest_adds_no_injury() {
        let mut world = kent();
        world.catalog.affiliations.get_mut("Roman").unwrap().disliked.clear();
        let events = create_ruler_events(&mut world, 43);
        assert!(events[0].injuries_added.is_empty());
    }

    #[test]
    fn ruler_change_ends_hostility() {
        let mut world = kent();
        apply_ruler_change(
            &mut world,
            &RulerChange {
                town: "Canterbury".into(),
                previous: Some("Cantiaci".into()),
                ruler: "Roman".into(),
            },
        );
        assert_eq!(world.catalog.town("Canterbury").unwrap().ruler.as_deref(), Some("Roman"));
        assert!(!world.catalog.affiliations["Roman"].dislikes("Cantiaci"));
    }

    #[test]
    fn battle_targets_the_enemy_capital() {
        let mut world = World::new(60);
        world
            .catalog
            .add_affiliation(Affiliation::new("Iceni").disliking("Roman"))
            .add_affiliation(Affiliation::new("Roman").with_capital("Camulodunum"));
        world.active_affiliations.extend(["Iceni".to_string(), "Roman".to_string()]);

        let mut rng = SmallRng::seed_from_u64(60);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        let battle = generate_battle_event(&mut ctx, "Iceni").unwrap();
        assert_eq!(battle.trigger_year, 61);
        assert_eq!(battle.end_year, Some(61));
        assert!(battle.return_on_end);
        assert!(battle.locations.contains("Camulodunum"));
        assert_eq!(battle.job_relocation[0].to, "Camulodunum");
        assert!(generate_battle_event(&mut ctx, "Roman").is_none());
    }

    #[test]
    fn founding_and_abandonment_events() {
        let mut world = World::new(1000);
        let mut town = Town::new("Old Sarum").in_county("Wiltshire");
        town.founded = Some(1075);
        town.abandoned = Some(1220);
        world.catalog.add_location(town);
        assert_eq!(generate_location_events(&mut world), 2);
        assert_eq!(generate_location_events(&mut world), 0);
        assert_eq!(world.catalog.events_triggered_in(1220)[0].name, "Abandonment of Old Sarum");
    }
}
