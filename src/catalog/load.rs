use std::path::Path;

use serde::Deserialize;

use super::Catalog;
use crate::error::CatalogError;
use crate::model::{
    Affiliation, COIN, Event, Injury, Job, Location, NameEntry, Rate, RateValue, ResourceDef,
    SocialClass,
};

/// On-disk shape of a catalog: one JSON document of named tables.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSource {
    #[serde(default)]
    pub affiliations: Vec<Affiliation>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    #[serde(default)]
    pub injuries: Vec<Injury>,
    #[serde(default)]
    pub social_classes: Vec<SocialClass>,
    #[serde(default)]
    pub rates: Vec<Rate>,
    #[serde(default)]
    pub names: Vec<NameEntry>,
    #[serde(default)]
    pub events: Vec<Event>,
}

fn insert_unique<T>(
    table: &mut std::collections::BTreeMap<String, T>,
    kind: &'static str,
    name: String,
    value: T,
) -> Result<(), CatalogError> {
    if table.contains_key(&name) {
        return Err(CatalogError::Duplicate { kind, name });
    }
    table.insert(name, value);
    Ok(())
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Catalog, CatalogError> {
        let source: CatalogSource = serde_json::from_str(json)?;
        Catalog::from_source(source)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Catalog::from_json_str(&text)
    }

    /// Build and validate a catalog. Fails on duplicate names or on any
    /// reference that does not resolve.
    pub fn from_source(source: CatalogSource) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::new();
        for a in source.affiliations {
            insert_unique(&mut catalog.affiliations, "affiliation", a.name.clone(), a)?;
        }
        for l in source.locations {
            insert_unique(&mut catalog.locations, "location", l.name().to_string(), l)?;
        }
        for j in source.jobs {
            insert_unique(&mut catalog.jobs, "job", j.name.clone(), j)?;
        }
        for r in source.resources {
            insert_unique(&mut catalog.resources, "resource", r.name.clone(), r)?;
        }
        for i in source.injuries {
            insert_unique(&mut catalog.injuries, "injury", i.name.clone(), i)?;
        }
        for c in source.social_classes {
            insert_unique(&mut catalog.social_classes, "social class", c.name.clone(), c)?;
        }
        catalog.rates = source.rates;
        catalog.names = source.names;
        for event in source.events {
            catalog.add_event(event);
        }
        catalog.validate()?;
        tracing::debug!(
            affiliations = catalog.affiliations.len(),
            jobs = catalog.jobs.len(),
            events = catalog.events.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Check that every name the content mentions is defined.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for a in self.affiliations.values() {
            let by = format!("affiliation `{}`", a.name);
            for other in a.liked.iter().chain(&a.disliked) {
                self.need_affiliation(other, &by)?;
            }
            if let Some(capital) = &a.capital {
                self.need_location(capital, &by)?;
            }
            if let Some(conversion) = &a.conversion {
                self.need_affiliation(conversion, &by)?;
            }
        }

        for location in self.locations.values() {
            let by = format!("location `{}`", location.name());
            match location {
                Location::Region(_) => {}
                Location::County(county) => {
                    if let Some(region) = &county.region {
                        self.need_location(region, &by)?;
                    }
                }
                Location::Town(town) => {
                    if let Some(county) = &town.county {
                        self.need_location(county, &by)?;
                    }
                    for a in town.founded_by.iter().chain(town.ruler.iter()).chain(town.rulers.values()) {
                        self.need_affiliation(a, &by)?;
                    }
                }
            }
        }

        for job in self.jobs.values() {
            let by = format!("job `{}`", job.name);
            for a in job
                .affiliations
                .iter()
                .chain(&job.blocked_affiliations)
                .chain(&job.earn_affiliations)
            {
                self.need_affiliation(a, &by)?;
            }
            for r in job.required_resources.iter().chain(job.produce_resource.keys()) {
                self.need_resource(r, &by)?;
            }
            if let Some(class) = &job.social_class {
                self.need_social_class(class, &by)?;
            }
        }

        for resource in self.resources.values() {
            let by = format!("resource `{}`", resource.name);
            for r in resource.required_resources.keys() {
                self.need_resource(r, &by)?;
            }
        }

        for injury in self.injuries.values() {
            let by = format!("injury `{}`", injury.name);
            let cure_locations = injury.cure.iter().flat_map(|c| c.locations.iter());
            for l in injury.locations.iter().flatten().chain(cure_locations) {
                self.need_location(l, &by)?;
            }
        }

        for class in self.social_classes.values() {
            let by = format!("social class `{}`", class.name);
            for a in &class.affiliations {
                self.need_affiliation(a, &by)?;
            }
        }

        for rate in &self.rates {
            if let RateValue::Exchange { buy, sell, .. } = &rate.value {
                let by = format!("exchange rate {buy}/{sell}");
                self.need_resource(buy, &by)?;
                self.need_resource(sell, &by)?;
            }
        }

        for name in &self.names {
            if let Some(a) = &name.affiliation {
                self.need_affiliation(a, &format!("name `{}`", name.name))?;
            }
        }

        for event in &self.events {
            self.validate_event(event)?;
        }
        Ok(())
    }

    fn validate_event(&self, event: &Event) -> Result<(), CatalogError> {
        let by = format!("event `{}` ({})", event.name, event.trigger_year);
        for i in event.injuries_added.iter().chain(&event.injuries_removed) {
            if !self.injuries.contains_key(i) {
                return Err(CatalogError::unresolved("injury", i, by));
            }
        }
        for a in event
            .affiliations_added
            .iter()
            .chain(&event.affiliations_removed)
            .chain(event.convert_affiliation.keys())
            .chain(event.convert_affiliation.values())
        {
            self.need_affiliation(a, &by)?;
        }
        for j in event
            .jobs_added
            .iter()
            .chain(&event.jobs_removed)
            .chain(event.remove_npcs.keys())
        {
            self.need_job(j, &by)?;
        }
        for l in event
            .locations
            .iter()
            .chain(&event.locations_added)
            .chain(&event.locations_removed)
        {
            self.need_location(l, &by)?;
        }
        for r in &event.age_relocation {
            self.need_location(&r.from, &by)?;
            self.need_location(&r.to, &by)?;
        }
        for r in &event.job_relocation {
            self.need_affiliation(&r.affiliation, &by)?;
            self.need_location(&r.to, &by)?;
        }
        for spec in &event.new_npcs {
            if let Some(a) = &spec.affiliation {
                self.need_affiliation(a, &by)?;
            }
            for j in spec.job_distribution.keys() {
                self.need_job(j, &by)?;
            }
        }
        if let Some(change) = &event.ruler_change {
            self.need_location(&change.town, &by)?;
            self.need_affiliation(&change.ruler, &by)?;
        }
        Ok(())
    }

    fn need_affiliation(&self, name: &str, by: &str) -> Result<(), CatalogError> {
        if self.affiliations.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::unresolved("affiliation", name, by))
        }
    }

    fn need_location(&self, name: &str, by: &str) -> Result<(), CatalogError> {
        if self.locations.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::unresolved("location", name, by))
        }
    }

    fn need_job(&self, name: &str, by: &str) -> Result<(), CatalogError> {
        if self.jobs.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::unresolved("job", name, by))
        }
    }

    /// Coin is built in and needs no definition.
    fn need_resource(&self, name: &str, by: &str) -> Result<(), CatalogError> {
        if name == COIN || self.resources.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::unresolved("resource", name, by))
        }
    }

    fn need_social_class(&self, name: &str, by: &str) -> Result<(), CatalogError> {
        if self.social_classes.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::unresolved("social class", name, by))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRITAIN: &str = r#"{
        "affiliations": [
            {"name": "Roman", "capital": "Londinium"},
            {"name": "Cantiaci", "capital": "Canterbury", "disliked": ["Roman"]}
        ],
        "locations": [
            {"kind": "region", "name": "Britannia"},
            {"kind": "county", "name": "Kent", "region": "Britannia"},
            {"kind": "town", "name": "Canterbury", "county": "Kent", "ruler": "Cantiaci",
             "rulers": {"43": "Roman"}},
            {"kind": "town", "name": "Londinium", "county": "Kent", "founded": 47}
        ],
        "resources": [{"name": "Sword", "lifespan": 10}],
        "jobs": [{"name": "Smith", "type": "trade", "produceResource": {"Sword": 1}}],
        "rates": [{"type": "Exchange Rate", "value": {"exchange": {"buy": "Sword", "sell": "Coin", "ratio": 5}}}],
        "events": [{"name": "Smiths Arrive", "triggerYear": 50, "jobsAdded": ["Smith"]}]
    }"#;

    #[test]
    fn loads_and_resolves() {
        let catalog = Catalog::from_json_str(BRITAIN).unwrap();
        assert_eq!(catalog.affiliations.len(), 2);
        assert_eq!(catalog.towns().count(), 2);
        assert_eq!(catalog.price_of("Sword", 60), Some((COIN, 5.0)));
        assert_eq!(catalog.events_triggered_in(50).len(), 1);
    }

    #[test]
    fn missing_reference_is_fatal() {
        let json = r#"{"events": [{"name": "Plague", "triggerYear": 1346, "injuriesAdded": ["Bubonic Plague"]}]}"#;
        match Catalog::from_json_str(json) {
            Err(CatalogError::Unresolved { kind, name, .. }) => {
                assert_eq!(kind, "injury");
                assert_eq!(name, "Bubonic Plague");
            }
            other => panic!("expected unresolved injury, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_fatal() {
        let json = r#"{"jobs": [{"name": "Smith"}, {"name": "Smith"}]}"#;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::Duplicate { kind: "job", .. })
        ));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
    }
}
