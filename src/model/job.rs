use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::person::Gender;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum JobType {
    Military,
    Trade,
    Agriculture,
    #[default]
    General,
    Commerce,
    Civil,
    Academic,
    Art,
    Hospitality,
    Medicine,
    Religion,
    Construction,
}

content_enum!(JobType {
    Military => "military",
    Trade => "trade",
    Agriculture => "agriculture",
    General => "general",
    Commerce => "commerce",
    Civil => "civil",
    Academic => "academic",
    Art => "art",
    Hospitality => "hospitality",
    Medicine => "medicine",
    Religion => "religion",
    Construction => "construction",
});

/// An occupation and everything needed to hold it.
///
/// Empty sets and `None` mean "no restriction" on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: JobType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub allowed_genders: BTreeSet<Gender>,
    /// The holder must have at least one of these.
    #[serde(default)]
    pub affiliations: BTreeSet<String>,
    #[serde(default)]
    pub blocked_affiliations: BTreeSet<String>,
    /// Granted on taking the job.
    #[serde(default)]
    pub earn_affiliations: BTreeSet<String>,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    /// Skill -> years of tenure before it is learnt.
    #[serde(default)]
    pub learn_skills: BTreeMap<String, u32>,
    #[serde(default)]
    pub required_resources: BTreeSet<String>,
    /// Resource -> units produced per turn.
    #[serde(default)]
    pub produce_resource: BTreeMap<String, u32>,
    #[serde(default)]
    pub max_count: Option<u32>,
    #[serde(default)]
    pub travels: bool,
    #[serde(default)]
    pub social_class: Option<String>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: JobType::General,
            description: String::new(),
            min_age: None,
            max_age: None,
            allowed_genders: BTreeSet::new(),
            affiliations: BTreeSet::new(),
            blocked_affiliations: BTreeSet::new(),
            earn_affiliations: BTreeSet::new(),
            required_skills: BTreeSet::new(),
            learn_skills: BTreeMap::new(),
            required_resources: BTreeSet::new(),
            produce_resource: BTreeMap::new(),
            max_count: None,
            travels: false,
            social_class: None,
        }
    }

    pub fn admits_age(&self, age: u32) -> bool {
        self.min_age.is_none_or(|min| age >= min) && self.max_age.is_none_or(|max| age <= max)
    }

    pub fn admits_gender(&self, gender: Gender) -> bool {
        self.allowed_genders.is_empty() || self.allowed_genders.contains(&gender)
    }

    /// Affiliation allow and deny lists.
    pub fn admits_affiliations(&self, held: &BTreeSet<String>) -> bool {
        (self.affiliations.is_empty() || !self.affiliations.is_disjoint(held))
            && self.blocked_affiliations.is_disjoint(held)
    }

    pub fn requires_resource(&self, name: &str) -> bool {
        self.required_resources.contains(name)
    }

    pub fn requires_skill(&self, name: &str) -> bool {
        self.required_skills.contains(name)
    }

    /// How demanding the job is; used to rank upgrades.
    pub fn requirement_count(&self) -> usize {
        self.required_skills.len()
            + self.required_resources.len()
            + usize::from(self.social_class.is_some())
    }
}
