use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::window::YearWindow;

/// Light grey, used when content gives an affiliation no colour.
pub const DEFAULT_COLOUR: u32 = 0xD3D3D3;

fn default_colour() -> u32 {
    DEFAULT_COLOUR
}

/// A political or cultural faction people belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    pub name: String,
    #[serde(default)]
    pub liked: BTreeSet<String>,
    #[serde(default)]
    pub disliked: BTreeSet<String>,
    /// Town that acts as the faction's seat.
    #[serde(default)]
    pub capital: Option<String>,
    /// Affiliation granted to the conquered when this faction takes a town.
    #[serde(default)]
    pub conversion: Option<String>,
    #[serde(flatten)]
    pub window: YearWindow,
    #[serde(default = "default_colour")]
    pub colour: u32,
}

impl Affiliation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            liked: BTreeSet::new(),
            disliked: BTreeSet::new(),
            capital: None,
            conversion: None,
            window: YearWindow::ALWAYS,
            colour: DEFAULT_COLOUR,
        }
    }

    pub fn with_capital(mut self, town: impl Into<String>) -> Self {
        self.capital = Some(town.into());
        self
    }

    pub fn disliking(mut self, other: impl Into<String>) -> Self {
        self.disliked.insert(other.into());
        self
    }

    pub fn dislikes(&self, other: &str) -> bool {
        self.disliked.contains(other)
    }

    /// Hostility is symmetric even when only one side declares it.
    pub fn is_hostile_to(&self, other: &Affiliation) -> bool {
        self.dislikes(&other.name) || other.dislikes(&self.name)
    }

    /// Affiliation the conquered population is converted to.
    pub fn conversion_target(&self) -> &str {
        self.conversion.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostility_is_symmetric() {
        let celtic = Affiliation::new("Celtic").disliking("Norman");
        let norman = Affiliation::new("Norman");
        assert!(celtic.is_hostile_to(&norman));
        assert!(norman.is_hostile_to(&celtic));
        assert!(!norman.dislikes("Celtic"));
    }

    #[test]
    fn conversion_defaults_to_self() {
        let mut roman = Affiliation::new("Roman");
        assert_eq!(roman.conversion_target(), "Roman");
        roman.conversion = Some("Romano-British".to_string());
        assert_eq!(roman.conversion_target(), "Romano-British");
    }

    #[test]
    fn deserializes_with_defaults() {
        let roman: Affiliation =
            serde_json::from_str(r#"{"name":"Roman","capital":"Rome","startYear":-753}"#).unwrap();
        assert_eq!(roman.capital.as_deref(), Some("Rome"));
        assert_eq!(roman.window.start_year, Some(-753));
        assert_eq!(roman.colour, DEFAULT_COLOUR);
    }
}
