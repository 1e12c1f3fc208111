use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::person::Gender;
use super::window::YearWindow;

/// A given name content can hand out to newborns and generated people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameEntry {
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(flatten)]
    pub window: YearWindow,
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl NameEntry {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender: Some(gender),
            window: YearWindow::ALWAYS,
            affiliation: None,
        }
    }

    pub fn fits(&self, gender: Gender, affiliations: &BTreeSet<String>, year: i32) -> bool {
        self.gender.is_none_or(|g| g == gender)
            && self.window.contains(year)
            && self
                .affiliation
                .as_ref()
                .is_none_or(|a| affiliations.contains(a))
    }
}
