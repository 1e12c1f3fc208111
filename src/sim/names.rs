use std::collections::BTreeSet;

use rand::{Rng, RngCore};

use super::helpers::pick;
use crate::model::{Gender, World};

const STEMS: &[&str] = &[
    "Aed", "Alf", "Ber", "Bran", "Cad", "Cyn", "Dun", "Ead", "Ed", "Eg", "Ethel", "God",
    "Har", "Her", "Os", "Sig", "Tam", "Wil", "Wulf", "Aud",
];

const MALE_ENDINGS: &[&str] = &["ric", "win", "mund", "wald", "red", "bert", "stan", "ulf"];

const FEMALE_ENDINGS: &[&str] = &["gyth", "flaed", "wyn", "burh", "hild", "swith", "ith", "a"];

/// Made-up name for when content offers nothing suitable.
pub fn generate_person_name(rng: &mut dyn RngCore, gender: Gender) -> String {
    let endings = match gender {
        Gender::Male => MALE_ENDINGS,
        Gender::Female => FEMALE_ENDINGS,
    };
    let stem = STEMS[rng.random_range(0..STEMS.len())];
    let ending = endings[rng.random_range(0..endings.len())];
    format!("{stem}{ending}")
}

/// A name from the catalog that suits the gender, year and affiliations,
/// falling back to a generated one.
pub fn pick_name(
    world: &World,
    rng: &mut dyn RngCore,
    gender: Gender,
    affiliations: &BTreeSet<String>,
) -> String {
    let fitting: Vec<&str> = world
        .catalog
        .names
        .iter()
        .filter(|n| n.fits(gender, affiliations, world.year))
        .map(|n| n.name.as_str())
        .collect();
    match pick(rng, &fitting) {
        Some(name) => (*name).to_string(),
        None => generate_person_name(rng, gender),
    }
}
