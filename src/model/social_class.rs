use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::window::YearWindow;

fn no_floor() -> f64 {
    -1.0
}

/// A rung of society, reached through wealth and sometimes restricted to
/// members of certain affiliations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialClass {
    pub name: String,
    #[serde(flatten)]
    pub window: YearWindow,
    #[serde(default)]
    pub affiliations: BTreeSet<String>,
    /// Minimum wealth in coin. Negative means anyone qualifies.
    #[serde(default = "no_floor")]
    pub wealth: f64,
}

impl SocialClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            window: YearWindow::ALWAYS,
            affiliations: BTreeSet::new(),
            wealth: no_floor(),
        }
    }

    pub fn admits(&self, affiliations: &BTreeSet<String>, wealth: f64, year: i32) -> bool {
        self.window.contains(year)
            && (self.affiliations.is_empty() || !self.affiliations.is_disjoint(affiliations))
            && self.wealth <= wealth
    }
}

/// The class someone belongs to: the richest one they qualify for, preferring
/// affiliation-restricted classes on a tie.
pub fn classify<'a>(
    classes: impl IntoIterator<Item = &'a SocialClass>,
    affiliations: &BTreeSet<String>,
    wealth: f64,
    year: i32,
) -> Option<&'a SocialClass> {
    classes
        .into_iter()
        .filter(|c| c.admits(affiliations, wealth, year))
        .max_by(|a, b| {
            a.wealth
                .total_cmp(&b.wealth)
                .then_with(|| (!a.affiliations.is_empty()).cmp(&!b.affiliations.is_empty()))
        })
}
