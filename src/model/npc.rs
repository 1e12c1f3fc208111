use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::person::Gender;

/// Template for a batch of generated non-player characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNpcSpec {
    pub count: u32,
    #[serde(default)]
    pub min_age: u32,
    #[serde(default)]
    pub max_age: u32,
    #[serde(default)]
    pub affiliation: Option<String>,
    /// Job -> relative weight.
    #[serde(default)]
    pub job_distribution: BTreeMap<String, f64>,
    /// Gender -> share. Missing genders fall back to an even split.
    #[serde(default)]
    pub gender_distribution: BTreeMap<Gender, f64>,
}

impl NewNpcSpec {
    pub fn new(count: u32, min_age: u32, max_age: u32) -> Self {
        Self {
            count,
            min_age,
            max_age,
            affiliation: None,
            job_distribution: BTreeMap::new(),
            gender_distribution: BTreeMap::new(),
        }
    }

    pub fn male_share(&self) -> f64 {
        match (
            self.gender_distribution.get(&Gender::Male),
            self.gender_distribution.get(&Gender::Female),
        ) {
            (Some(male), _) => *male,
            (None, Some(female)) => 1.0 - female,
            (None, None) => 0.5,
        }
    }

    /// Job weights heaviest first, ties by name.
    pub fn weighted_jobs(&self) -> Vec<(&str, f64)> {
        let mut jobs: Vec<(&str, f64)> = self
            .job_distribution
            .iter()
            .map(|(name, w)| (name.as_str(), *w))
            .collect();
        jobs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_share_fallbacks() {
        let mut spec = NewNpcSpec::new(10, 20, 40);
        assert_eq!(spec.male_share(), 0.5);
        spec.gender_distribution.insert(Gender::Female, 0.25);
        assert_eq!(spec.male_share(), 0.75);
        spec.gender_distribution.insert(Gender::Male, 1.0);
        assert_eq!(spec.male_share(), 1.0);
    }

    #[test]
    fn weighted_jobs_heaviest_first() {
        let mut spec = NewNpcSpec::new(10, 20, 40);
        spec.job_distribution.insert("Farmer".into(), 0.2);
        spec.job_distribution.insert("Spearman".into(), 0.8);
        let jobs = spec.weighted_jobs();
        assert_eq!(jobs[0].0, "Spearman");
        assert_eq!(jobs[1].0, "Farmer");
    }
}
