use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

use super::career::{self, Unlock};
use super::context::TickContext;
use super::economy;
use super::events::{self, apply_event};
use super::family;
use super::health;
use super::politics;
use super::runner::{SimConfig, dispatch_systems};
use super::system::SimSystem;
use super::turn::{npc_pass, turn_phases};
use crate::catalog::Catalog;
use crate::id::PersonId;
use crate::model::{
    ActiveEvent, Event, Gender, Injury, Person, PlayerNotice, SocialClass, World,
};

/// A game in progress: the world, its random source and the turn phases.
pub struct GameEngine {
    world: World,
    rng: SmallRng,
    config: SimConfig,
    systems: Vec<Box<dyn SimSystem>>,
}

impl GameEngine {
    pub fn new(catalog: Catalog, config: SimConfig) -> Self {
        Self {
            world: World::with_catalog(catalog, config.start_year),
            rng: SmallRng::seed_from_u64(config.seed),
            config,
            systems: turn_phases(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn year(&self) -> i32 {
        self.world.year
    }

    pub fn is_running(&self) -> bool {
        self.world.running
    }

    fn ctx(&mut self) -> TickContext<'_> {
        TickContext {
            world: &mut self.world,
            rng: &mut self.rng,
            config: &self.config,
        }
    }

    // -- Turn and lifecycle -------------------------------------------------

    /// Advance one year and run every phase. Does nothing once the game is over.
    pub fn end_turn(&mut self) {
        if !self.world.running {
            return;
        }
        self.world.year += 1;
        dispatch_systems(&mut self.world, &mut self.systems, &mut self.rng, &self.config);
    }

    /// Create the player, born `player_start_age` years ago at their
    /// affiliation's capital, as generation 0 of the family tree.
    pub fn init_player(&mut self, name: &str, gender: Gender, affiliation: &str) -> PersonId {
        let birth_year = self.world.year - self.config.player_start_age as i32;
        let mut player = Person::new(name, gender, birth_year);
        player.age = self.config.player_start_age;
        if !affiliation.is_empty() {
            player.affiliations.insert(affiliation.to_string());
            if self.world.catalog.affiliations.contains_key(affiliation) {
                self.world.active_affiliations.insert(affiliation.to_string());
            } else {
                warn!(affiliation, "player affiliation not in catalog");
            }
        }
        let year = self.world.year;
        player.location = self
            .world
            .capital_of(affiliation)
            .map(str::to_string)
            .or_else(|| self.world.active_towns().into_iter().next())
            .or_else(|| {
                self.world
                    .catalog
                    .towns()
                    .find(|t| t.exists_in(year))
                    .map(|t| t.name.clone())
            });
        player.is_the_player = true;

        let id = self.world.add_person(player);
        self.world.active_person = Some(id);
        self.world.generation = 0;
        self.world.place_in_tree(id, 0);
        info!(player = id, name, year, "player created");
        id
    }

    /// Hand play to another person, usually an heir. The previous player
    /// stays in the family.
    pub fn set_active_person(&mut self, id: PersonId) -> bool {
        if self.world.person(id).is_none() {
            return false;
        }
        if let Some(previous) = self.world.active_person
            && let Some(p) = self.world.person_mut(previous)
        {
            p.is_the_player = false;
            p.related_to_the_player = true;
        }
        if let Some(p) = self.world.person_mut(id) {
            p.is_the_player = true;
            p.related_to_the_player = true;
        }
        self.world.active_person = Some(id);

        if self.world.tree.is_empty() {
            self.world.generation = 0;
            self.world.place_in_tree(id, 0);
        } else if let Some(generation) = self.world.generation_of(id) {
            self.world.generation = generation;
        } else {
            self.world.generation += 1;
            let generation = self.world.generation;
            self.world.place_in_tree(id, generation);
        }
        true
    }

    /// Prepare the world for the first turn: synthesise town events, fill
    /// the active pools, apply this year's events and run one NPC pass.
    pub fn init_game(&mut self) {
        let location_events = politics::generate_location_events(&mut self.world);
        seed_pools(&mut self.world);
        let year = self.world.year;
        let mut ctx = self.ctx();
        for event in events::due_events(ctx.world) {
            apply_event(&mut ctx, &event);
        }
        npc_pass(&mut ctx);
        info!(
            year,
            location_events,
            population = self.world.persons.len(),
            "game initialised"
        );
    }

    pub fn pop_notice(&mut self) -> Option<PlayerNotice> {
        self.world.notices.pop_front()
    }

    // -- Queries -----------------------------------------------------------

    pub fn active_person(&self) -> Option<&Person> {
        self.world.active_person()
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.world.person(id)
    }

    pub fn population(&self) -> Vec<&Person> {
        self.world.living().collect()
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.world.active_events
    }

    pub fn active_injuries(&self) -> &BTreeMap<String, Injury> {
        &self.world.active_injuries
    }

    pub fn wealth(&self, id: PersonId) -> f64 {
        self.world.wealth(id)
    }

    pub fn social_class(&self, id: PersonId) -> Option<&SocialClass> {
        self.world.social_class(id)
    }

    pub fn meets_requirements(&self, id: PersonId, job: &str) -> bool {
        match (self.world.person(id), self.world.catalog.jobs.get(job)) {
            (Some(person), Some(job)) => career::meets_requirements(&self.world, person, job),
            _ => false,
        }
    }

    // -- Events ------------------------------------------------------------

    /// Add an event to the catalog. Returns `false` if it is already listed.
    pub fn add_event(&mut self, event: Event) -> bool {
        self.world.catalog.add_event(event)
    }

    pub fn apply_event(&mut self, event: &Event) -> bool {
        apply_event(&mut self.ctx(), event)
    }

    pub fn expire_event(&mut self, event: &Event) -> bool {
        events::expire_event(&mut self.ctx(), event)
    }

    // -- People ------------------------------------------------------------

    pub fn add_person(&mut self, person: Person) -> PersonId {
        self.world.add_person(person)
    }

    pub fn marries(&mut self, joiner: PersonId, other: PersonId) -> bool {
        family::marries(&mut self.world, joiner, other)
    }

    pub fn undo_marriage(&mut self, id: PersonId) {
        family::undo_marriage(&mut self.world, id);
    }

    pub fn find_spouse(&mut self, id: PersonId, min_age: u32) -> Option<PersonId> {
        family::find_spouse(&mut self.ctx(), id, min_age)
    }

    pub fn has_child(&mut self, mother: PersonId) -> Option<PersonId> {
        family::has_child(&mut self.ctx(), mother)
    }

    pub fn adopt_child(&mut self, parent: PersonId, child: PersonId) -> bool {
        family::adopt_child(&mut self.world, parent, child)
    }

    pub fn moves(&mut self, id: PersonId, to: &str, with_family: bool) {
        family::moves(&mut self.world, id, to, with_family);
    }

    pub fn dies(&mut self, id: PersonId, cause: &str) {
        family::dies(&mut self.ctx(), id, cause);
    }

    pub fn treat_injuries(&mut self, id: PersonId) -> Vec<String> {
        health::treat_injuries(&mut self.world, id)
    }

    // -- Work and trade ----------------------------------------------------

    pub fn seek_job(&mut self, id: PersonId) -> Option<String> {
        career::seek_job(&mut self.ctx(), id)
    }

    pub fn take_job(&mut self, id: PersonId, job: &str) -> bool {
        career::take_job(&mut self.world, id, job)
    }

    pub fn upgrade_job(&mut self, id: PersonId, unlock: Unlock) -> bool {
        career::upgrade_job(&mut self.ctx(), id, unlock)
    }

    pub fn wants_to_buy(&mut self, id: PersonId, resource: &str, count: u32) {
        if let Some(person) = self.world.person_mut(id) {
            person.wants_to_buy(resource, count);
        }
    }

    pub fn trade_matching(&mut self, buyer: PersonId) -> u32 {
        economy::trade_matching(&mut self.ctx(), buyer)
    }

    pub fn make_trades(&mut self, buyer: PersonId, seller: Option<PersonId>) -> bool {
        economy::make_trades(&mut self.ctx(), buyer, seller)
    }
}

/// Fill the active pools for the starting year. Affiliations and jobs that
/// a later event introduces wait for it.
fn seed_pools(world: &mut World) {
    let year = world.year;
    let mut later_affiliations = BTreeSet::new();
    let mut later_jobs = BTreeSet::new();
    for event in world.catalog.events.iter().filter(|e| e.trigger_year > year) {
        later_affiliations.extend(event.affiliations_added.iter().cloned());
        later_jobs.extend(event.jobs_added.iter().cloned());
    }

    let affiliations: Vec<String> = world
        .catalog
        .affiliations
        .values()
        .filter(|a| a.window.contains(year) && !later_affiliations.contains(&a.name))
        .map(|a| a.name.clone())
        .collect();
    let jobs: Vec<String> = world
        .catalog
        .jobs
        .keys()
        .filter(|j| !later_jobs.contains(*j))
        .cloned()
        .collect();
    let locations: Vec<String> = world
        .catalog
        .locations
        .values()
        .filter(|l| l.exists_in(year))
        .map(|l| l.name().to_string())
        .collect();

    world.active_affiliations.extend(affiliations);
    world.active_jobs.extend(jobs);
    world.active_locations.extend(locations);
}
