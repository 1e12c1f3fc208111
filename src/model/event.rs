use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::job::JobType;
use super::npc::NewNpcSpec;
use crate::id::PersonId;

/// Everyone at `from` aged `max_age` or younger is sent to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRelocation {
    pub from: String,
    pub max_age: u32,
    pub to: String,
}

/// Members of `affiliation` working a listed job type go to `to` with the
/// given chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRelocation {
    pub affiliation: String,
    pub job_types: BTreeMap<JobType, f64>,
    pub to: String,
}

/// A town changing hands, carried by synthesised conquest events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulerChange {
    pub town: String,
    pub previous: Option<String>,
    pub ruler: String,
}

/// A scripted or synthesised happening. Identity is name, trigger year and
/// description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger_year: i32,
    /// Last year the event is in force. `None` keeps it in force indefinitely.
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub trigger_order: Option<i32>,
    #[serde(default)]
    pub injuries_added: BTreeSet<String>,
    #[serde(default)]
    pub injuries_removed: BTreeSet<String>,
    #[serde(default)]
    pub affiliations_added: BTreeSet<String>,
    #[serde(default)]
    pub affiliations_removed: BTreeSet<String>,
    #[serde(default)]
    pub jobs_added: BTreeSet<String>,
    #[serde(default)]
    pub jobs_removed: BTreeSet<String>,
    /// Where the event happens; scopes its injuries and new people.
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default)]
    pub locations_added: BTreeSet<String>,
    #[serde(default)]
    pub locations_removed: BTreeSet<String>,
    /// Old affiliation -> new affiliation, applied when the event ends.
    #[serde(default)]
    pub convert_affiliation: BTreeMap<String, String>,
    #[serde(default)]
    pub age_relocation: Vec<AgeRelocation>,
    #[serde(default)]
    pub job_relocation: Vec<JobRelocation>,
    #[serde(default)]
    pub new_npcs: Vec<NewNpcSpec>,
    /// Job name -> chance each holder is removed when the event ends.
    #[serde(default)]
    pub remove_npcs: BTreeMap<String, f64>,
    #[serde(default)]
    pub return_on_end: bool,
    #[serde(default)]
    pub ruler_change: Option<RulerChange>,
}

impl Event {
    pub fn new(name: impl Into<String>, trigger_year: i32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            trigger_year,
            end_year: None,
            trigger_order: None,
            injuries_added: BTreeSet::new(),
            injuries_removed: BTreeSet::new(),
            affiliations_added: BTreeSet::new(),
            affiliations_removed: BTreeSet::new(),
            jobs_added: BTreeSet::new(),
            jobs_removed: BTreeSet::new(),
            locations: BTreeSet::new(),
            locations_added: BTreeSet::new(),
            locations_removed: BTreeSet::new(),
            convert_affiliation: BTreeMap::new(),
            age_relocation: Vec::new(),
            job_relocation: Vec::new(),
            new_npcs: Vec::new(),
            remove_npcs: BTreeMap::new(),
            return_on_end: false,
            ruler_change: None,
        }
    }

    /// Whether the event ends with `year`. Events without an end year stay
    /// in force until something removes what they added.
    pub fn ends_in(&self, year: i32) -> bool {
        self.end_year == Some(year)
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            name: self.name.clone(),
            trigger_year: self.trigger_year,
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub name: String,
    pub trigger_year: i32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplacementKind {
    Age,
    Job,
}

/// Someone an event moved, remembered so they can be sent back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub person: PersonId,
    pub from: Option<String>,
    pub to: String,
    pub kind: DisplacementKind,
}

/// An applied event waiting to expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub event: Event,
    pub displaced: Vec<Displacement>,
}

/// Stable order for events sharing a trigger year: explicit trigger order
/// first, then the order they were given in.
pub fn trigger_sorted(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by_key(|e| (e.trigger_order.is_none(), e.trigger_order));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_events_never_end() {
        let mut event = Event::new("Black Death", 1346);
        assert!(!event.ends_in(1346));
        event.end_year = Some(1351);
        assert!(event.ends_in(1351));
        assert!(!event.ends_in(1352));
    }

    #[test]
    fn identity_includes_description() {
        let a = Event::new("Battle", 100);
        let mut b = Event::new("Battle", 100);
        assert_eq!(a.key(), b.key());
        b.description = "Iceni attack Cantiaci".to_string();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn explicit_order_first_then_given_order() {
        let mut second = Event::new("Second", 10);
        second.trigger_order = Some(2);
        let mut first = Event::new("First", 10);
        first.trigger_order = Some(1);
        let unordered_a = Event::new("A", 10);
        let unordered_b = Event::new("B", 10);
        let sorted = trigger_sorted(vec![unordered_a, second, unordered_b, first]);
        let names: Vec<&str> = sorted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "A", "B"]);
    }

    #[test]
    fn minimal_json() {
        let event: Event = serde_json::from_str(
            r#"{"name":"Great Fire","triggerYear":1666,"locations":["London"],
                "jobRelocation":[{"affiliation":"Iceni","jobTypes":{"military":1.0},"to":"Canterbury"}]}"#,
        )
        .unwrap();
        assert_eq!(event.locations.len(), 1);
        assert_eq!(
            event.job_relocation[0].job_types.get(&JobType::Military),
            Some(&1.0)
        );
    }
}
