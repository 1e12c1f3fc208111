use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::resource::{Inventory, Resource};
use super::job::JobType;
use crate::id::PersonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gender {
    Male,
    Female,
}

content_enum!(Gender {
    Male => "male",
    Female => "female",
});

impl Gender {
    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Someone living, or once living, in the simulation.
///
/// Family links are ids into the population arena. A person owns only their
/// inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub birth_year: i32,
    pub death_year: Option<i32>,
    pub cause_of_death: Option<String>,
    pub marriage_year: Option<i32>,
    pub job_start_year: Option<i32>,
    /// 1.0 is full health; death at 0.
    pub health: f64,
    pub age: u32,
    pub affiliations: BTreeSet<String>,
    pub location: Option<String>,
    pub injuries: BTreeSet<String>,
    pub treated_injuries: BTreeSet<String>,
    pub job: Option<String>,
    pub skills: BTreeSet<String>,
    pub resources: Inventory,
    pub wanted_resources: BTreeMap<String, u32>,
    pub spouse: Option<PersonId>,
    pub parents: BTreeSet<PersonId>,
    pub descendants: BTreeSet<PersonId>,
    pub is_the_player: bool,
    pub related_to_the_player: bool,
    pub trying_for_family: bool,
    /// Trade of the parent, which the person leans towards when job hunting.
    pub family_business: Option<JobType>,
}

impl Person {
    /// A new person outside the population. The id is assigned when the
    /// person is added to a [`World`](super::World).
    pub fn new(name: impl Into<String>, gender: Gender, birth_year: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            gender,
            birth_year,
            death_year: None,
            cause_of_death: None,
            marriage_year: None,
            job_start_year: None,
            health: 1.0,
            age: 0,
            affiliations: BTreeSet::new(),
            location: None,
            injuries: BTreeSet::new(),
            treated_injuries: BTreeSet::new(),
            job: None,
            skills: BTreeSet::new(),
            resources: Inventory::new(),
            wanted_resources: BTreeMap::new(),
            spouse: None,
            parents: BTreeSet::new(),
            descendants: BTreeSet::new(),
            is_the_player: false,
            related_to_the_player: false,
            trying_for_family: false,
            family_business: None,
        }
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliations.insert(affiliation.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_alive(&self) -> bool {
        self.death_year.is_none()
    }

    pub fn age_in(&self, year: i32) -> u32 {
        u32::try_from(year - self.birth_year).unwrap_or(0)
    }

    /// Whole years in the current job.
    pub fn tenure(&self, year: i32) -> u32 {
        self.job_start_year
            .and_then(|start| u32::try_from(year - start).ok())
            .unwrap_or(0)
    }

    pub fn is_in_player_family(&self) -> bool {
        self.is_the_player || self.related_to_the_player
    }

    pub fn count_of(&self, resource: &str) -> u32 {
        self.resources.count(resource)
    }

    /// Receive resources, settling any matching want.
    pub fn add_resource(&mut self, resource: Resource, count: u32) {
        if let Some(wanted) = self.wanted_resources.get_mut(&resource.name) {
            *wanted = wanted.saturating_sub(count);
            if *wanted == 0 {
                self.wanted_resources.remove(&resource.name);
            }
        }
        self.resources.add(resource, count);
    }

    /// Register demand. Repeated shortfalls don't pile up; the larger one wins.
    pub fn wants_to_buy(&mut self, resource: &str, count: u32) {
        if count == 0 {
            return;
        }
        let wanted = self.wanted_resources.entry(resource.to_string()).or_insert(0);
        *wanted = (*wanted).max(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::COIN;

    #[test]
    fn ages_and_tenure() {
        let mut john = Person::new("John", Gender::Male, 1980);
        assert_eq!(john.age_in(2000), 20);
        assert_eq!(john.age_in(1970), 0);
        assert_eq!(john.tenure(2000), 0);
        john.job_start_year = Some(2010);
        assert_eq!(john.tenure(2015), 5);
    }

    #[test]
    fn receiving_settles_wants() {
        let mut joe = Person::new("Joe", Gender::Male, 1990);
        joe.wants_to_buy("Land", 1);
        joe.wants_to_buy("Labour", 2);
        joe.wants_to_buy("Labour", 1);
        assert_eq!(joe.wanted_resources.get("Labour"), Some(&2));

        joe.add_resource(Resource::new("Land"), 1);
        assert!(!joe.wanted_resources.contains_key("Land"));
        joe.add_resource(Resource::new(COIN), 3);
        assert_eq!(joe.count_of(COIN), 3);
    }
}
