use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::event::{ActiveEvent, EventKey};
use super::injury::Injury;
use super::job::Job;
use super::person::Person;
use super::rate::RateKind;
use super::resource::COIN;
use super::social_class::{SocialClass, classify};
use crate::catalog::Catalog;
use crate::id::{IdGenerator, PersonId};

/// Something the player should be told about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerNotice {
    Married { spouse: PersonId },
    ChildBorn { child: PersonId },
    SkillLearned { skill: String },
    JobChanged { job: String },
    Died { person: PersonId, cause: String },
    GameOver,
}

/// All mutable simulation state: the population arena, the content catalog,
/// the engine-owned active pools and the clock.
#[derive(Debug)]
pub struct World {
    pub year: i32,
    pub persons: BTreeMap<PersonId, Person>,
    pub id_gen: IdGenerator,
    pub catalog: Catalog,
    pub active_injuries: BTreeMap<String, Injury>,
    /// Scope of every activation behind each active injury. An empty scope
    /// reaches wherever the injury itself does.
    pub injury_activations: BTreeMap<String, Vec<BTreeSet<String>>>,
    pub active_affiliations: BTreeSet<String>,
    pub active_jobs: BTreeSet<String>,
    pub active_locations: BTreeSet<String>,
    pub active_events: Vec<ActiveEvent>,
    /// Every event applied so far, so none is applied twice.
    pub applied_events: BTreeSet<EventKey>,
    pub active_person: Option<PersonId>,
    pub running: bool,
    pub generation: u32,
    /// Generation -> members of the player's family tree.
    pub tree: BTreeMap<u32, BTreeSet<PersonId>>,
    pub notices: VecDeque<PlayerNotice>,
}

impl World {
    pub fn new(year: i32) -> Self {
        Self::with_catalog(Catalog::default(), year)
    }

    pub fn with_catalog(catalog: Catalog, year: i32) -> Self {
        Self {
            year,
            persons: BTreeMap::new(),
            id_gen: IdGenerator::new(),
            catalog,
            active_injuries: BTreeMap::new(),
            injury_activations: BTreeMap::new(),
            active_affiliations: BTreeSet::new(),
            active_jobs: BTreeSet::new(),
            active_locations: BTreeSet::new(),
            active_events: Vec::new(),
            applied_events: BTreeSet::new(),
            active_person: None,
            running: true,
            generation: 0,
            tree: BTreeMap::new(),
            notices: VecDeque::new(),
        }
    }

    // -- Population ---------------------------------------------------------

    /// Add a person to the pool, assigning their id and current age.
    pub fn add_person(&mut self, mut person: Person) -> PersonId {
        let id = self.id_gen.next_id();
        person.id = id;
        person.age = person.age_in(self.year);
        self.persons.insert(id, person);
        id
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(&id)
    }

    pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.persons.get_mut(&id)
    }

    pub fn is_alive(&self, id: PersonId) -> bool {
        self.person(id).is_some_and(Person::is_alive)
    }

    pub fn living(&self) -> impl Iterator<Item = &Person> {
        self.persons.values().filter(|p| p.is_alive())
    }

    pub fn living_ids(&self) -> Vec<PersonId> {
        self.living().map(|p| p.id).collect()
    }

    pub fn living_at(&self, location: &str) -> Vec<PersonId> {
        self.living()
            .filter(|p| p.location.as_deref() == Some(location))
            .map(|p| p.id)
            .collect()
    }

    pub fn living_spouse(&self, id: PersonId) -> Option<PersonId> {
        self.person(id)?.spouse.filter(|&s| self.is_alive(s))
    }

    pub fn living_descendants(&self, id: PersonId) -> Vec<PersonId> {
        self.person(id)
            .map(|p| {
                p.descendants
                    .iter()
                    .copied()
                    .filter(|&d| self.is_alive(d))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Take a person out of the pool and scrub every reference to them.
    pub fn remove_person(&mut self, id: PersonId) -> Option<Person> {
        let removed = self.persons.remove(&id)?;
        for other in self.persons.values_mut() {
            if other.spouse == Some(id) {
                other.spouse = None;
            }
            other.descendants.remove(&id);
            other.parents.remove(&id);
            other.resources.clear_matches(id);
        }
        for members in self.tree.values_mut() {
            members.remove(&id);
        }
        if self.active_person == Some(id) {
            self.active_person = None;
        }
        Some(removed)
    }

    pub fn active_person(&self) -> Option<&Person> {
        self.active_person.and_then(|id| self.person(id))
    }

    // -- Family tree ---------------------------------------------------------

    pub fn generation_of(&self, id: PersonId) -> Option<u32> {
        self.tree
            .iter()
            .find(|(_, members)| members.contains(&id))
            .map(|(generation, _)| *generation)
    }

    pub fn place_in_tree(&mut self, id: PersonId, generation: u32) {
        if self.generation_of(id).is_none() {
            self.tree.entry(generation).or_default().insert(id);
        }
    }

    pub fn notify(&mut self, notice: PlayerNotice) {
        self.notices.push_back(notice);
    }

    // -- Active pools --------------------------------------------------------

    /// Put a job into the catalog and make it available.
    pub fn activate_job(&mut self, job: Job) {
        self.active_jobs.insert(job.name.clone());
        self.catalog.jobs.insert(job.name.clone(), job);
    }

    /// Put an injury into the catalog and activate it over `scope`. Each
    /// activation is kept so that withdrawing one leaves the others alone.
    pub fn activate_injury(&mut self, injury: Injury, scope: &BTreeSet<String>) {
        let name = injury.name.clone();
        self.catalog
            .injuries
            .entry(name.clone())
            .or_insert(injury);
        self.injury_activations
            .entry(name.clone())
            .or_default()
            .push(scope.clone());
        self.refresh_injury(&name);
    }

    /// Withdraw one activation of an injury. An empty scope undoes an
    /// unscoped activation, or every activation when there is none. Any other
    /// scope undoes the activation made over it, else is taken out of the
    /// scoped ones. Returns `true` while the injury is still active.
    pub fn withdraw_injury(&mut self, name: &str, scope: &BTreeSet<String>) -> bool {
        let Some(scopes) = self.injury_activations.get_mut(name) else {
            return false;
        };
        if let Some(i) = scopes.iter().position(|s| s == scope) {
            scopes.remove(i);
        } else if scope.is_empty() {
            scopes.clear();
        } else {
            scopes.retain_mut(|s| {
                if s.is_empty() {
                    return true;
                }
                s.retain(|loc| !scope.contains(loc));
                !s.is_empty()
            });
        }
        self.refresh_injury(name)
    }

    fn refresh_injury(&mut self, name: &str) -> bool {
        let scopes = self.injury_activations.get(name).filter(|s| !s.is_empty());
        let (Some(scopes), Some(base)) = (scopes, self.catalog.injuries.get(name)) else {
            self.injury_activations.remove(name);
            self.active_injuries.remove(name);
            return false;
        };
        let active = if scopes.iter().any(BTreeSet::is_empty) {
            base.clone()
        } else {
            let reach: BTreeSet<String> = scopes.iter().flatten().cloned().collect();
            base.scoped(&reach)
        };
        self.active_injuries.insert(name.to_string(), active);
        true
    }

    pub fn activate_location(&mut self, location: super::Location) {
        self.active_locations.insert(location.name().to_string());
        self.catalog
            .locations
            .insert(location.name().to_string(), location);
    }

    /// A job that can currently be taken.
    pub fn active_job(&self, name: &str) -> Option<&Job> {
        if self.active_jobs.contains(name) {
            self.catalog.jobs.get(name)
        } else {
            None
        }
    }

    /// Injury definition, preferring the scoped activation in the pool.
    pub fn injury(&self, name: &str) -> Option<&Injury> {
        self.active_injuries
            .get(name)
            .or_else(|| self.catalog.injuries.get(name))
    }

    /// Active towns, in name order.
    pub fn active_towns(&self) -> Vec<String> {
        self.active_locations
            .iter()
            .filter(|name| {
                self.catalog
                    .locations
                    .get(*name)
                    .is_some_and(|l| l.as_town().is_some())
            })
            .cloned()
            .collect()
    }

    pub fn capital_of(&self, affiliation: &str) -> Option<&str> {
        self.catalog.affiliations.get(affiliation)?.capital.as_deref()
    }

    // -- Wealth and class ----------------------------------------------------

    /// Coin value of what the person holds.
    pub fn own_wealth(&self, person: &Person) -> f64 {
        person
            .resources
            .lots()
            .iter()
            .map(|lot| {
                let unit = if lot.resource.name == COIN {
                    1.0
                } else {
                    self.catalog
                        .price_of(&lot.resource.name, self.year)
                        .filter(|(sell, _)| *sell == COIN)
                        .map_or(0.0, |(_, ratio)| ratio)
                };
                unit * f64::from(lot.count)
            })
            .sum()
    }

    /// Household wealth: the person's plus a living spouse's.
    pub fn wealth(&self, id: PersonId) -> f64 {
        let Some(person) = self.person(id) else {
            return 0.0;
        };
        let spouse = self
            .living_spouse(id)
            .and_then(|s| self.person(s))
            .map_or(0.0, |s| self.own_wealth(s));
        self.own_wealth(person) + spouse
    }

    pub fn social_class(&self, id: PersonId) -> Option<&SocialClass> {
        let person = self.person(id)?;
        classify(
            self.catalog.social_classes.values(),
            &person.affiliations,
            self.wealth(id),
            self.year,
        )
    }

    /// First rate of `kind` in effect this year.
    pub fn rate_value(&self, kind: RateKind, age: u32) -> Option<f64> {
        self.catalog
            .rate(kind, self.year)
            .map(|rate| rate.value_for(age))
    }
}
