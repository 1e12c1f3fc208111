use tracing::debug;

use super::context::TickContext;
use super::family;
use super::health;
use super::helpers::roll;
use crate::id::PersonId;
use crate::model::{Gender, Rate, RateKind, World};

pub const NATURAL_CAUSES: &str = "Natural Causes";

/// Chance that a couple who reached their family size stop trying.
pub const FAMILY_COMPLETE_CHANCE: f64 = 0.5;

const PERSONAL_KINDS: [RateKind; 4] = [
    RateKind::Fertility,
    RateKind::Mortality,
    RateKind::Marriage,
    RateKind::FamilySize,
];

/// Rates applied to each person every turn, in effect this year.
pub fn personal_rates(world: &World) -> Vec<Rate> {
    world
        .catalog
        .rates
        .iter()
        .filter(|r| PERSONAL_KINDS.contains(&r.kind) && r.is_active(world.year))
        .cloned()
        .collect()
}

/// Apply one rate to a person. Rates outside their window, and those
/// consulted elsewhere (inherit job, class mixing, exchange), do nothing.
pub fn apply_rate(ctx: &mut TickContext, id: PersonId, rate: &Rate) {
    if !rate.is_active(ctx.world.year) {
        return;
    }
    let Some(person) = ctx.world.person(id).filter(|p| p.is_alive()) else {
        return;
    };
    let chance = rate.value_for(person.age);

    match rate.kind {
        RateKind::Fertility => {
            let eligible = person.gender == Gender::Female
                && person.trying_for_family
                && ctx
                    .world
                    .living_spouse(id)
                    .and_then(|s| ctx.world.person(s))
                    .is_some_and(|s| s.trying_for_family);
            if eligible && roll(ctx.rng, chance) {
                family::has_child(ctx, id);
            }
        }
        RateKind::Mortality => {
            health::apply_mortality(ctx, id, chance, NATURAL_CAUSES);
        }
        RateKind::Marriage => {
            if ctx.world.living_spouse(id).is_none() && roll(ctx.rng, chance) {
                family::find_spouse(ctx, id, rate.min_age());
            }
        }
        RateKind::FamilySize => family_size(ctx, id, chance),
        RateKind::InheritJob
        | RateKind::ClassMixing
        | RateKind::ReturnToPreEventLocation
        | RateKind::InterTribeBattle
        | RateKind::ExchangeRate => {}
    }
}

fn family_size(ctx: &mut TickContext, id: PersonId, size: f64) {
    let Some(person) = ctx.world.person(id) else {
        return;
    };
    if !person.trying_for_family || (ctx.world.living_descendants(id).len() as f64) < size {
        return;
    }
    if roll(ctx.rng, FAMILY_COMPLETE_CHANCE) {
        let spouse = ctx.world.living_spouse(id);
        for p in std::iter::once(id).chain(spouse) {
            if let Some(p) = ctx.world.person_mut(p) {
                p.trying_for_family = false;
            }
        }
        debug!(person = id, "family complete");
    }
}
