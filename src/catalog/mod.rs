//! Named game content the engine consults: affiliations, places, jobs,
//! resources, injuries, classes, rates, names and the master event list.
//!
//! Cross-references are plain names. [`Catalog::validate`] checks once that
//! every name resolves, so runtime lookups can treat a miss as "nothing to do".

mod load;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use load::CatalogSource;

use crate::model::event::trigger_sorted;
use crate::model::{
    Affiliation, Event, Injury, Job, Location, NameEntry, Rate, RateKind, ResourceDef,
    SocialClass, Town,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub affiliations: BTreeMap<String, Affiliation>,
    pub locations: BTreeMap<String, Location>,
    pub jobs: BTreeMap<String, Job>,
    pub resources: BTreeMap<String, ResourceDef>,
    pub injuries: BTreeMap<String, Injury>,
    pub social_classes: BTreeMap<String, SocialClass>,
    pub rates: Vec<Rate>,
    pub names: Vec<NameEntry>,
    /// Master event list in content order. Synthesised events are appended.
    pub events: Vec<Event>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_affiliation(&mut self, affiliation: Affiliation) -> &mut Self {
        self.affiliations
            .insert(affiliation.name.clone(), affiliation);
        self
    }

    pub fn add_location(&mut self, location: impl Into<Location>) -> &mut Self {
        let location = location.into();
        self.locations.insert(location.name().to_string(), location);
        self
    }

    pub fn add_job(&mut self, job: Job) -> &mut Self {
        self.jobs.insert(job.name.clone(), job);
        self
    }

    pub fn add_resource(&mut self, resource: ResourceDef) -> &mut Self {
        self.resources.insert(resource.name.clone(), resource);
        self
    }

    pub fn add_injury(&mut self, injury: Injury) -> &mut Self {
        self.injuries.insert(injury.name.clone(), injury);
        self
    }

    pub fn add_social_class(&mut self, class: SocialClass) -> &mut Self {
        self.social_classes.insert(class.name.clone(), class);
        self
    }

    pub fn add_rate(&mut self, rate: Rate) -> &mut Self {
        self.rates.push(rate);
        self
    }

    pub fn add_name(&mut self, name: NameEntry) -> &mut Self {
        self.names.push(name);
        self
    }

    /// Append an event unless one with the same identity is already listed.
    /// Returns whether it was added.
    pub fn add_event(&mut self, event: Event) -> bool {
        let key = event.key();
        if self.events.iter().any(|e| e.key() == key) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn town(&self, name: &str) -> Option<&Town> {
        self.locations.get(name)?.as_town()
    }

    pub fn town_mut(&mut self, name: &str) -> Option<&mut Town> {
        self.locations.get_mut(name)?.as_town_mut()
    }

    pub fn towns(&self) -> impl Iterator<Item = &Town> {
        self.locations.values().filter_map(Location::as_town)
    }

    /// Definition for `name`, or a plain immortal inheritable resource if the
    /// content never described it.
    pub fn resource_def(&self, name: &str) -> ResourceDef {
        self.resources
            .get(name)
            .cloned()
            .unwrap_or_else(|| ResourceDef::new(name))
    }

    pub fn rates_of(&self, kind: RateKind, year: i32) -> impl Iterator<Item = &Rate> {
        self.rates
            .iter()
            .filter(move |r| r.kind == kind && r.is_active(year))
    }

    pub fn rate(&self, kind: RateKind, year: i32) -> Option<&Rate> {
        self.rates_of(kind, year).next()
    }

    /// `(sell resource, ratio)` of the exchange rate buying `name` this year.
    pub fn price_of(&self, name: &str, year: i32) -> Option<(&str, f64)> {
        self.rates_of(RateKind::ExchangeRate, year)
            .find_map(|r| r.price_of(name))
    }

    /// Events triggering in `year`, explicit trigger order first.
    pub fn events_triggered_in(&self, year: i32) -> Vec<Event> {
        trigger_sorted(
            self.events
                .iter()
                .filter(|e| e.trigger_year == year)
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::COIN;

    #[test]
    fn duplicate_events_are_ignored() {
        let mut catalog = Catalog::new();
        assert!(catalog.add_event(Event::new("Great Fire", 1666)));
        assert!(!catalog.add_event(Event::new("Great Fire", 1666)));
        assert!(catalog.add_event(Event::new("Great Fire", 1212)));
        assert_eq!(catalog.events.len(), 2);
    }

    #[test]
    fn exchange_lookup_respects_window() {
        let mut catalog = Catalog::new();
        catalog.add_rate(
            Rate::exchange("Sword", COIN, 5.0).during(crate::model::YearWindow::between(0, 100)),
        );
        assert_eq!(catalog.price_of("Sword", 50), Some((COIN, 5.0)));
        assert_eq!(catalog.price_of("Sword", 150), None);
    }

    #[test]
    fn unknown_resource_gets_plain_definition() {
        let catalog = Catalog::new();
        let def = catalog.resource_def("Wheat");
        assert!(def.inheritable);
        assert_eq!(def.lifespan, 0);
    }
}
