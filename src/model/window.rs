use serde::{Deserialize, Serialize};

/// Inclusive span of years during which a piece of content is in effect.
/// A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
}

impl YearWindow {
    pub const ALWAYS: YearWindow = YearWindow {
        start_year: None,
        end_year: None,
    };

    pub fn between(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year: Some(start_year),
            end_year: Some(end_year),
        }
    }

    pub fn from_year(start_year: i32) -> Self {
        Self {
            start_year: Some(start_year),
            end_year: None,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start_year.is_none_or(|s| year >= s) && self.end_year.is_none_or(|e| year <= e)
    }
}
