use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, info};

use super::career::{self, Unlock};
use super::context::TickContext;
use super::helpers::{roll, shuffle};
use super::names::pick_name;
use crate::id::PersonId;
use crate::model::{Gender, Person, PlayerNotice, RateKind, ResourceLot, World};

/// Marry `joiner` to `other`. The joiner takes the other's affiliations and
/// location. Rejected when either is dead, already has a living spouse, or
/// the pair share a gender.
pub fn marries(world: &mut World, joiner: PersonId, other: PersonId) -> bool {
    if joiner == other || !world.is_alive(joiner) || !world.is_alive(other) {
        return false;
    }
    if world.living_spouse(joiner).is_some() || world.living_spouse(other).is_some() {
        return false;
    }
    let (Some(j), Some(o)) = (world.person(joiner), world.person(other)) else {
        return false;
    };
    if j.gender == o.gender {
        return false;
    }
    let affiliations = o.affiliations.clone();
    let location = o.location.clone();
    let family = j.is_in_player_family() || o.is_in_player_family();
    let generation = world.generation_of(joiner).or(world.generation_of(other));
    let year = world.year;

    for (id, spouse) in [(joiner, other), (other, joiner)] {
        if let Some(p) = world.person_mut(id) {
            p.spouse = Some(spouse);
            p.marriage_year = Some(year);
            p.trying_for_family = true;
            if family && !p.is_the_player {
                p.related_to_the_player = true;
            }
        }
    }
    if let Some(p) = world.person_mut(joiner) {
        p.affiliations = affiliations;
        p.location = location;
    }
    if let Some(generation) = generation {
        world.place_in_tree(joiner, generation);
        world.place_in_tree(other, generation);
    }
    if let Some(player) = world.active_person {
        if player == joiner {
            world.notify(PlayerNotice::Married { spouse: other });
        } else if player == other {
            world.notify(PlayerNotice::Married { spouse: joiner });
        }
    }
    debug!(joiner, other, year, "married");
    true
}

/// Clear both sides of a marriage.
pub fn undo_marriage(world: &mut World, id: PersonId) {
    let Some(spouse) = world.person_mut(id).and_then(|p| p.spouse.take()) else {
        return;
    };
    if let Some(p) = world.person_mut(id) {
        p.trying_for_family = false;
    }
    if let Some(s) = world.person_mut(spouse)
        && s.spouse == Some(id)
    {
        s.spouse = None;
        s.trying_for_family = false;
    }
}

fn close_kin(a: &Person, b: &Person) -> bool {
    a.parents.contains(&b.id)
        || b.parents.contains(&a.id)
        || a.descendants.contains(&b.id)
        || b.descendants.contains(&a.id)
        || !a.parents.is_disjoint(&b.parents)
}

fn at_odds(world: &World, a: &Person, b: &Person) -> bool {
    let dislikes = |from: &Person, to: &Person| {
        from.affiliations.iter().any(|name| {
            world
                .catalog
                .affiliations
                .get(name)
                .is_some_and(|aff| to.affiliations.iter().any(|other| aff.dislikes(other)))
        })
    };
    dislikes(a, b) || dislikes(b, a)
}

/// Look for someone for `id` to marry at their location. The wife joins the
/// husband. Returns the new spouse.
pub fn find_spouse(ctx: &mut TickContext, id: PersonId, min_age: u32) -> Option<PersonId> {
    let world = &*ctx.world;
    let person = world.person(id).filter(|p| p.is_alive())?;
    if person.age < min_age || world.living_spouse(id).is_some() {
        return None;
    }
    let mut candidates: Vec<PersonId> = world
        .living()
        .filter(|c| c.id != id && c.gender != person.gender && c.age >= min_age)
        .filter(|c| c.location == person.location)
        .filter(|c| world.living_spouse(c.id).is_none())
        .filter(|c| !close_kin(person, c) && !at_odds(world, person, c))
        .map(|c| c.id)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let mixing = world
        .catalog
        .rate(RateKind::ClassMixing, world.year)
        .map_or(0.0, |r| r.value_for(person.age));
    let own_class = world.social_class(id).map(|c| c.name.clone());
    let classes: BTreeMap<PersonId, Option<String>> = candidates
        .iter()
        .map(|&c| (c, world.social_class(c).map(|class| class.name.clone())))
        .collect();
    let gender = person.gender;

    shuffle(ctx.rng, &mut candidates);
    let chosen = candidates.into_iter().find(|c| {
        let same_class = classes.get(c).is_some_and(|class| *class == own_class);
        same_class || !roll(ctx.rng, mixing)
    })?;

    let (wife, husband) = match gender {
        Gender::Female => (id, chosen),
        Gender::Male => (chosen, id),
    };
    marries(ctx.world, wife, husband).then_some(chosen)
}

/// `mother` has a child with her living husband. Returns the child.
pub fn has_child(ctx: &mut TickContext, mother: PersonId) -> Option<PersonId> {
    let world = &*ctx.world;
    let mum = world.person(mother).filter(|p| p.is_alive())?;
    if mum.gender != Gender::Female {
        return None;
    }
    let father = world.living_spouse(mother)?;
    let dad = world.person(father)?;

    let gender = if ctx.rng.random_bool(0.5) {
        Gender::Male
    } else {
        Gender::Female
    };
    let job_type = |p: &Person| {
        p.job
            .as_ref()
            .and_then(|j| world.catalog.jobs.get(j))
            .map(|j| j.kind)
    };
    let name = pick_name(world, ctx.rng, gender, &mum.affiliations);
    let mut child = Person::new(name, gender, world.year);
    child.location = mum.location.clone();
    child.affiliations = mum.affiliations.clone();
    child.family_business = job_type(dad).or_else(|| job_type(mum));
    child.parents = [mother, father].into();
    child.related_to_the_player = mum.is_in_player_family() || dad.is_in_player_family();
    let generation = world
        .generation_of(mother)
        .or(world.generation_of(father))
        .map(|g| g + 1);

    let world = &mut *ctx.world;
    let child = world.add_person(child);
    for parent in [mother, father] {
        if let Some(p) = world.person_mut(parent) {
            p.descendants.insert(child);
        }
    }
    if let Some(generation) = generation {
        world.place_in_tree(child, generation);
    }
    if world
        .active_person
        .is_some_and(|player| player == mother || player == father)
    {
        world.notify(PlayerNotice::ChildBorn { child });
    }
    debug!(mother, father, child, year = world.year, "child born");
    Some(child)
}

/// Take in someone else's child. Both the parent and a living spouse gain
/// them as a descendant.
pub fn adopt_child(world: &mut World, parent: PersonId, child: PersonId) -> bool {
    if parent == child || !world.is_alive(parent) || !world.is_alive(child) {
        return false;
    }
    let Some(p) = world.person(parent) else {
        return false;
    };
    if p.descendants.contains(&child) || p.parents.contains(&child) {
        return false;
    }
    let family = p.is_in_player_family();
    let spouse = world.living_spouse(parent);
    let generation = world.generation_of(parent).map(|g| g + 1);

    let mut parents = vec![parent];
    parents.extend(spouse);
    for &id in &parents {
        if let Some(p) = world.person_mut(id) {
            p.descendants.insert(child);
        }
    }
    if let Some(c) = world.person_mut(child) {
        c.parents = parents.into_iter().collect();
        c.related_to_the_player |= family;
    }
    if let Some(generation) = generation {
        world.place_in_tree(child, generation);
    }
    true
}

/// Move a person. With family, a spouse and descendants who lived with them
/// come along.
pub fn moves(world: &mut World, id: PersonId, to: &str, with_family: bool) {
    let Some(person) = world.person(id) else {
        return;
    };
    let from = person.location.clone();
    let mut movers = vec![id];
    if with_family {
        let household = world
            .living_spouse(id)
            .into_iter()
            .chain(world.living_descendants(id));
        movers.extend(household.filter(|&m| {
            world.person(m).is_some_and(|p| p.location == from)
        }));
    }
    for m in movers {
        if let Some(p) = world.person_mut(m) {
            p.location = Some(to.to_string());
        }
    }
}

/// Death of a person: record it, hand on their estate and, when the player
/// leaves no one behind, end the game.
pub fn dies(ctx: &mut TickContext, id: PersonId, cause: &str) {
    let year = ctx.world.year;
    let Some(person) = ctx.world.person_mut(id).filter(|p| p.is_alive()) else {
        return;
    };
    person.death_year = Some(year);
    person.cause_of_death = Some(cause.to_string());
    person.health = 0.0;
    person.trying_for_family = false;
    person.wanted_resources.clear();
    let in_family = person.is_in_player_family();
    let is_player = person.is_the_player;
    let name = person.name.clone();

    for other in ctx.world.persons.values_mut() {
        other.resources.clear_matches(id);
    }
    if in_family {
        info!(person = id, %name, cause, year, "family member died");
        ctx.world.notify(PlayerNotice::Died {
            person: id,
            cause: cause.to_string(),
        });
    } else {
        debug!(person = id, cause, year, "died");
    }

    bequeath(ctx, id);

    if is_player && ctx.world.living_descendants(id).is_empty() {
        info!(year, "player died without heirs; game over");
        ctx.world.running = false;
        ctx.world.notify(PlayerNotice::GameOver);
    }
}

/// Hand a dead person's inheritable resources on. Non-inheritable ones are
/// lost.
fn bequeath(ctx: &mut TickContext, id: PersonId) {
    let world = &mut *ctx.world;
    let lots: Vec<ResourceLot> = match world.person_mut(id) {
        Some(p) => p.resources.drain(),
        None => return,
    };
    let lots: Vec<ResourceLot> = lots.into_iter().filter(|l| l.resource.inheritable).collect();
    if lots.is_empty() {
        return;
    }

    let spouse = world.living_spouse(id);
    let mut children: Vec<&Person> = world
        .living_descendants(id)
        .into_iter()
        .filter_map(|c| world.person(c))
        .collect();
    children.sort_by_key(|c| (c.birth_year, c.id));

    let shares: Vec<(PersonId, ResourceLot)> = if ctx.config.fair_inheritance {
        match spouse {
            Some(s) => lots.into_iter().map(|l| (s, l)).collect(),
            None => {
                let heirs: Vec<PersonId> = children.iter().map(|c| c.id).collect();
                share_out(&lots, &heirs)
            }
        }
    } else {
        let eldest_son = children
            .iter()
            .find(|c| c.gender == Gender::Male)
            .or(children.first())
            .map(|c| c.id);
        match eldest_son.or(spouse) {
            Some(heir) => lots.into_iter().map(|l| (heir, l)).collect(),
            None => Vec::new(),
        }
    };

    let mut upgrades: Vec<(PersonId, String)> = Vec::new();
    for (heir, mut lot) in shares {
        let Some(h) = world.person(heir) else {
            continue;
        };
        let needed = h
            .job
            .as_ref()
            .and_then(|j| world.catalog.jobs.get(j))
            .is_some_and(|job| job.requires_resource(&lot.resource.name));
        let npc = !h.is_the_player;
        lot.resource.for_sale = !needed;
        lot.resource.matched_buyer = None;
        let name = lot.resource.name.clone();
        if let Some(h) = world.person_mut(heir) {
            h.add_resource(lot.resource, lot.count);
        }
        debug!(from = id, heir, resource = %name, count = lot.count, "inherited");
        if npc && !upgrades.contains(&(heir, name.clone())) {
            upgrades.push((heir, name));
        }
    }
    for (heir, name) in upgrades {
        career::upgrade_job(ctx, heir, Unlock::Resource(name));
    }
}

/// Deal the lots out one unit at a time across the heirs, eldest first.
/// Lots of the same resource continue the rotation where the last one
/// stopped.
fn share_out(lots: &[ResourceLot], heirs: &[PersonId]) -> Vec<(PersonId, ResourceLot)> {
    if heirs.is_empty() {
        return Vec::new();
    }
    let n = heirs.len() as u32;
    let mut dealt: BTreeMap<&str, u32> = BTreeMap::new();
    let mut shares = Vec::new();
    for lot in lots {
        let next = dealt.entry(lot.resource.name.as_str()).or_default();
        let offset = *next % n;
        for (i, &heir) in heirs.iter().enumerate() {
            let first = (i as u32 + n - offset) % n;
            let count = lot.count / n + u32::from(first < lot.count % n);
            if count > 0 {
                shares.push((
                    heir,
                    ResourceLot {
                        resource: lot.resource.clone(),
                        count,
                    },
                ));
            }
        }
        *next += lot.count;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::model::{Affiliation, COIN, Resource};
    use crate::sim::SimConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn couple(world: &mut World) -> (PersonId, PersonId) {
        let fred = world.add_person(Person::new("Fred", Gender::Male, 1970).at("London"));
        let wilma = world.add_person(Person::new("Wilma", Gender::Female, 1972).at("London"));
        (fred, wilma)
    }

    #[test]
    fn marriage_is_symmetric_and_undoable() {
        let mut world = World::new(2000);
        let (fred, wilma) = couple(&mut world);
        assert!(marries(&mut world, wilma, fred));
        assert_eq!(world.person(fred).unwrap().spouse, Some(wilma));
        assert_eq!(world.person(wilma).unwrap().spouse, Some(fred));

        let barney = world.add_person(Person::new("Barney", Gender::Male, 1971));
        assert!(!marries(&mut world, wilma, barney));

        undo_marriage(&mut world, fred);
        assert_eq!(world.person(fred).unwrap().spouse, None);
        assert_eq!(world.person(wilma).unwrap().spouse, None);
    }

    #[test]
    fn joiner_takes_spouses_affiliations_and_home() {
        let mut world = World::new(2000);
        let fred = world.add_person(
            Person::new("Fred", Gender::Male, 1970)
                .with_affiliation("Saxon")
                .at("Winchester"),
        );
        let ada = world.add_person(
            Person::new("Ada", Gender::Female, 1975)
                .with_affiliation("Briton")
                .at("Bath"),
        );
        assert!(marries(&mut world, ada, fred));
        let ada = world.person(ada).unwrap();
        assert!(ada.affiliations.contains("Saxon"));
        assert!(!ada.affiliations.contains("Briton"));
        assert_eq!(ada.location.as_deref(), Some("Winchester"));
    }

    #[test]
    fn spouse_search_respects_dislikes() {
        let mut world = World::new(2000);
        world
            .catalog
            .add_affiliation(Affiliation::new("Roman").disliking("Iceni"))
            .add_affiliation(Affiliation::new("Iceni"));
        let marcus = world.add_person(
            Person::new("Marcus", Gender::Male, 1975)
                .with_affiliation("Roman")
                .at("Colchester"),
        );
        world.add_person(
            Person::new("Boudica", Gender::Female, 1976)
                .with_affiliation("Iceni")
                .at("Colchester"),
        );
        let mut rng = SmallRng::seed_from_u64(4);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        assert_eq!(find_spouse(&mut ctx, marcus, 16), None);

        let livia = ctx.world.add_person(
            Person::new("Livia", Gender::Female, 1978)
                .with_affiliation("Roman")
                .at("Colchester"),
        );
        assert_eq!(find_spouse(&mut ctx, marcus, 16), Some(livia));
    }

    #[test]
    fn children_join_the_family() {
        let mut world = World::new(2000);
        let (fred, wilma) = couple(&mut world);
        marries(&mut world, wilma, fred);
        world.place_in_tree(fred, 0);
        world.person_mut(fred).unwrap().is_the_player = true;
        world.active_person = Some(fred);

        let mut rng = SmallRng::seed_from_u64(8);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        assert_eq!(has_child(&mut ctx, fred), None);
        let pebbles = has_child(&mut ctx, wilma).unwrap();

        let child = world.person(pebbles).unwrap();
        assert_eq!(child.parents, BTreeSet::from([fred, wilma]));
        assert!(child.related_to_the_player);
        assert_eq!(child.location.as_deref(), Some("London"));
        assert!(world.person(fred).unwrap().descendants.contains(&pebbles));
        assert_eq!(world.generation_of(pebbles), Some(1));
        assert_eq!(world.notices.back(), Some(&PlayerNotice::ChildBorn { child: pebbles }));
    }

    fn location(world: &World, id: PersonId) -> &str {
        world.person(id).unwrap().location.as_deref().unwrap()
    }

    #[test]
    fn moving_with_family_leaves_grown_children() {
        let mut world = World::new(2000);
        let (fred, wilma) = couple(&mut world);
        marries(&mut world, wilma, fred);
        let son = world.add_person(Person::new("Son", Gender::Male, 1995).at("London"));
        let daughter = world.add_person(Person::new("Daughter", Gender::Female, 1990).at("Liverpool"));
        for child in [son, daughter] {
            adopt_child(&mut world, fred, child);
        }
        moves(&mut world, fred, "Manchester", true);
        assert_eq!(location(&world, wilma), "Manchester");
        assert_eq!(location(&world, son), "Manchester");
        assert_eq!(location(&world, daughter), "Liverpool");

        moves(&mut world, fred, "London", false);
        assert_eq!(location(&world, fred), "London");
        assert_eq!(location(&world, wilma), "Manchester");
    }

    #[test]
    fn strict_inheritance_goes_to_the_eldest_son() {
        let mut world = World::new(2000);
        let john = world.add_person(Person::new("John", Gender::Male, 1940));
        let elder_daughter = world.add_person(Person::new("Ann", Gender::Female, 1965));
        let son = world.add_person(Person::new("Tom", Gender::Male, 1968));
        for child in [elder_daughter, son] {
            adopt_child(&mut world, john, child);
        }
        world.person_mut(john).unwrap().add_resource(Resource::new(COIN), 120);
        world
            .person_mut(john)
            .unwrap()
            .add_resource(Resource { inheritable: false, ..Resource::new("Title") }, 1);

        let mut rng = SmallRng::seed_from_u64(1);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        dies(&mut ctx, john, "Old Age");
        assert_eq!(world.person(son).unwrap().count_of(COIN), 120);
        assert_eq!(world.person(elder_daughter).unwrap().count_of(COIN), 0);
        assert_eq!(world.person(son).unwrap().count_of("Title"), 0);
        assert!(world.person(john).unwrap().resources.is_empty());
    }

    #[test]
    fn fair_shares_round_robin() {
        let lots = vec![ResourceLot {
            resource: Resource::new(COIN),
            count: 7,
        }];
        let shares = share_out(&lots, &[1, 2, 3]);
        let counts: Vec<(PersonId, u32)> = shares.iter().map(|(h, l)| (*h, l.count)).collect();
        assert_eq!(counts, vec![(1, 3), (2, 2), (3, 2)]);
    }

    #[test]
    fn split_lots_share_one_rotation() {
        let kept = ResourceLot {
            resource: Resource::new(COIN),
            count: 2,
        };
        let mut on_sale = kept.clone();
        on_sale.resource.for_sale = true;

        let shares = share_out(&[kept, on_sale], &[1, 2, 3]);
        let mut totals = BTreeMap::new();
        for (heir, lot) in &shares {
            *totals.entry(*heir).or_insert(0) += lot.count;
        }
        assert_eq!(totals, BTreeMap::from([(1, 2), (2, 1), (3, 1)]));
    }

    #[test]
    fn player_without_heirs_ends_the_game() {
        let mut world = World::new(2000);
        let player = world.add_person(Person::new("Solo", Gender::Male, 1950));
        world.person_mut(player).unwrap().is_the_player = true;
        world.active_person = Some(player);
        let mut rng = SmallRng::seed_from_u64(1);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        dies(&mut ctx, player, "Plague");
        assert!(!world.running);
        assert_eq!(world.notices.back(), Some(&PlayerNotice::GameOver));
    }
}
