use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::job::JobType;
use super::rate::Rate;
use super::window::YearWindow;

/// Treatment for an injury. No locations means it can be had anywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cure {
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(flatten)]
    pub window: YearWindow,
}

impl Cure {
    pub fn available(&self, location: Option<&str>, year: i32) -> bool {
        let here = self.locations.is_empty()
            || location.is_some_and(|loc| self.locations.contains(loc));
        here && self.window.contains(year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injury {
    pub name: String,
    #[serde(default)]
    pub cure: Option<Cure>,
    /// Places the injury strikes. `None` is everywhere.
    #[serde(default)]
    pub locations: Option<BTreeSet<String>>,
    /// Job types exposed to it. Empty is everyone.
    #[serde(default)]
    pub impacted_jobs: BTreeSet<JobType>,
    /// Chance per turn of catching it.
    #[serde(default)]
    pub likelihood: f64,
    #[serde(default)]
    pub untreated_mortality: Option<Rate>,
    #[serde(default)]
    pub treated_mortality: Option<Rate>,
}

impl Injury {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cure: None,
            locations: None,
            impacted_jobs: BTreeSet::new(),
            likelihood: 0.0,
            untreated_mortality: None,
            treated_mortality: None,
        }
    }

    pub fn applies_to(&self, location: Option<&str>, job: Option<JobType>) -> bool {
        let place = match &self.locations {
            None => true,
            Some(scope) => location.is_some_and(|loc| scope.contains(loc)),
        };
        let trade = self.impacted_jobs.is_empty()
            || job.is_some_and(|kind| self.impacted_jobs.contains(&kind));
        place && trade
    }

    pub fn treatable(&self, location: Option<&str>, year: i32) -> bool {
        self.cure
            .as_ref()
            .is_none_or(|cure| cure.available(location, year))
    }

    /// Copy of the injury restricted to `scope` on top of its own locations.
    /// An empty scope leaves it as it is.
    pub fn scoped(&self, scope: &BTreeSet<String>) -> Injury {
        let mut scoped = self.clone();
        if !scope.is_empty() {
            let mut locations = self.locations.clone().unwrap_or_default();
            locations.extend(scope.iter().cloned());
            scoped.locations = Some(locations);
        }
        scoped
    }
}
