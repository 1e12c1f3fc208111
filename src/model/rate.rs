use serde::{Deserialize, Serialize};

use super::window::YearWindow;

/// What a rate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RateKind {
    Fertility,
    Mortality,
    Marriage,
    FamilySize,
    InheritJob,
    ClassMixing,
    ReturnToPreEventLocation,
    InterTribeBattle,
    ExchangeRate,
}

content_enum!(RateKind {
    Fertility => "Fertility",
    Mortality => "Mortality",
    Marriage => "Marriage",
    FamilySize => "Family Size",
    InheritJob => "Inherit Job",
    ClassMixing => "Class Mixing",
    ReturnToPreEventLocation => "Return To Pre-Event Location",
    InterTribeBattle => "Inter-Tribe Battle",
    ExchangeRate => "Exchange Rate",
});

fn open_end() -> u32 {
    u32::MAX
}

/// Rate for an inclusive span of ages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBand {
    #[serde(default)]
    pub start_age: u32,
    #[serde(default = "open_end")]
    pub end_age: u32,
    pub rate: f64,
}

impl AgeBand {
    pub fn new(start_age: u32, end_age: u32, rate: f64) -> Self {
        Self {
            start_age,
            end_age,
            rate,
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        self.start_age <= age && age <= self.end_age
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateValue {
    AgeBased(Vec<AgeBand>),
    Flat(f64),
    /// `ratio` units of `sell` buy one unit of `buy`.
    Exchange {
        buy: String,
        sell: String,
        ratio: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(rename = "type")]
    pub kind: RateKind,
    #[serde(flatten)]
    pub window: YearWindow,
    pub value: RateValue,
}

impl Rate {
    pub fn age_based(kind: RateKind, bands: Vec<AgeBand>) -> Self {
        Self {
            kind,
            window: YearWindow::ALWAYS,
            value: RateValue::AgeBased(bands),
        }
    }

    pub fn flat(kind: RateKind, value: f64) -> Self {
        Self {
            kind,
            window: YearWindow::ALWAYS,
            value: RateValue::Flat(value),
        }
    }

    pub fn exchange(buy: impl Into<String>, sell: impl Into<String>, ratio: f64) -> Self {
        Self {
            kind: RateKind::ExchangeRate,
            window: YearWindow::ALWAYS,
            value: RateValue::Exchange {
                buy: buy.into(),
                sell: sell.into(),
                ratio,
            },
        }
    }

    pub fn during(mut self, window: YearWindow) -> Self {
        self.window = window;
        self
    }

    pub fn is_active(&self, year: i32) -> bool {
        self.window.contains(year)
    }

    /// Value for someone of `age`. Age-based rates give 0 outside every band;
    /// the first matching band wins.
    pub fn value_for(&self, age: u32) -> f64 {
        match &self.value {
            RateValue::AgeBased(bands) => bands
                .iter()
                .find(|b| b.contains(age))
                .map_or(0.0, |b| b.rate),
            RateValue::Flat(v) => *v,
            RateValue::Exchange { ratio, .. } => *ratio,
        }
    }

    /// Lowest age any band covers.
    pub fn min_age(&self) -> u32 {
        match &self.value {
            RateValue::AgeBased(bands) => bands.iter().map(|b| b.start_age).min().unwrap_or(0),
            _ => 0,
        }
    }

    /// `(sell, ratio)` if this is an exchange rate buying `name`.
    pub fn price_of(&self, name: &str) -> Option<(&str, f64)> {
        match &self.value {
            RateValue::Exchange { buy, sell, ratio } if buy == name => Some((sell, *ratio)),
            _ => None,
        }
    }
}
