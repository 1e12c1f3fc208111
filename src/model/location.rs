use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Places people can live in. Only towns are inhabited; regions and counties
/// group them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Region(Region),
    County(County),
    Town(Town),
}

impl Location {
    pub fn name(&self) -> &str {
        match self {
            Location::Region(r) => &r.name,
            Location::County(c) => &c.name,
            Location::Town(t) => &t.name,
        }
    }

    pub fn as_town(&self) -> Option<&Town> {
        match self {
            Location::Town(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_town_mut(&mut self) -> Option<&mut Town> {
        match self {
            Location::Town(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the place exists in `year`. Regions and counties always do.
    pub fn exists_in(&self, year: i32) -> bool {
        match self {
            Location::Town(t) => t.exists_in(year),
            _ => true,
        }
    }
}

impl From<Town> for Location {
    fn from(town: Town) -> Self {
        Location::Town(town)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct County {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Town {
    pub name: String,
    #[serde(default)]
    pub founded: Option<i32>,
    #[serde(default)]
    pub county: Option<String>,
    /// Affiliation whose people settle the town when it is founded.
    #[serde(default)]
    pub founded_by: Option<String>,
    #[serde(default)]
    pub abandoned: Option<i32>,
    /// Year -> affiliation taking control in that year.
    #[serde(default)]
    pub rulers: BTreeMap<i32, String>,
    #[serde(default)]
    pub ruler: Option<String>,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
}

impl Town {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            founded: None,
            county: None,
            founded_by: None,
            abandoned: None,
            rulers: BTreeMap::new(),
            ruler: None,
            longitude: 0.0,
            latitude: 0.0,
        }
    }

    pub fn in_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn exists_in(&self, year: i32) -> bool {
        self.founded.is_none_or(|f| f <= year) && self.abandoned.is_none_or(|a| a > year)
    }
}
