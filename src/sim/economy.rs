use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::career::{self, Unlock};
use super::context::TickContext;
use super::helpers::pick_many;
use crate::id::PersonId;
use crate::model::{Job, World};

/// Sellers approached for each wanted resource.
pub const MAX_CANDIDATE_SELLERS: usize = 3;

/// Run a job's production for the turn. Each unit consumes its recipe; the
/// first unit that can't be made registers the shortfall as wanted and
/// stops that resource.
pub fn produce(world: &mut World, id: PersonId, job: &Job) -> BTreeMap<String, u32> {
    let mut made = BTreeMap::new();
    for (name, &quantity) in &job.produce_resource {
        let def = world.catalog.resource_def(name);
        let Some(person) = world.person_mut(id) else {
            break;
        };
        for unit in 0..quantity {
            let remaining = quantity - unit;
            let shortfall: Vec<(String, u32)> = def
                .required_resources
                .iter()
                .filter_map(|(part, &per_unit)| {
                    let held = person.count_of(part);
                    (held < per_unit).then(|| (part.clone(), per_unit * remaining - held))
                })
                .collect();
            if !shortfall.is_empty() {
                for (part, count) in shortfall {
                    person.wants_to_buy(&part, count);
                }
                break;
            }
            let consumed = def
                .required_resources
                .iter()
                .all(|(part, &per_unit)| person.resources.take(part, per_unit).is_some());
            if !consumed {
                warn!(person = id, resource = %name, "recipe parts went missing");
                break;
            }
            person.add_resource(def.instance().for_sale(true), 1);
            *made.entry(name.clone()).or_insert(0) += 1;
        }
    }
    if !made.is_empty() {
        debug!(person = id, job = %job.name, ?made, "produced");
    }
    made
}

/// Tag for-sale units from up to three random sellers for each resource
/// `buyer` wants. Returns how many units were tagged.
pub fn trade_matching(ctx: &mut TickContext, buyer: PersonId) -> u32 {
    let Some(wants) = ctx
        .world
        .person(buyer)
        .filter(|p| p.is_alive())
        .map(|p| p.wanted_resources.clone())
    else {
        return 0;
    };
    let mut tagged = 0;
    for (name, wanted) in wants {
        let already: u32 = ctx
            .world
            .persons
            .values()
            .map(|p| p.resources.matched_to(buyer, &name))
            .sum();
        let mut remaining = wanted.saturating_sub(already);
        if remaining == 0 {
            continue;
        }
        let sellers: Vec<PersonId> = ctx
            .world
            .living()
            .filter(|p| p.id != buyer && p.resources.offered(&name) > 0)
            .map(|p| p.id)
            .collect();
        for seller in pick_many(ctx.rng, &sellers, MAX_CANDIDATE_SELLERS) {
            if remaining == 0 {
                break;
            }
            if let Some(s) = ctx.world.person_mut(seller) {
                let n = s.resources.tag_for_buyer(&name, buyer, remaining);
                remaining -= n;
                tagged += n;
            }
        }
    }
    tagged
}

/// Settle every unit matched to `buyer`, from one seller or from anyone.
/// A shortfall abandons all of the buyer's matches and returns `false`.
pub fn make_trades(ctx: &mut TickContext, buyer: PersonId, seller: Option<PersonId>) -> bool {
    if !ctx.world.is_alive(buyer) {
        return false;
    }
    let matched: Vec<(PersonId, String, u32)> = ctx
        .world
        .persons
        .values()
        .filter(|p| p.id != buyer && seller.is_none_or(|s| s == p.id))
        .flat_map(|p| {
            p.resources
                .names()
                .into_iter()
                .map(|name| {
                    let n = p.resources.matched_to(buyer, &name);
                    (p.id, name, n)
                })
                .collect::<Vec<_>>()
        })
        .filter(|(_, _, n)| *n > 0)
        .collect();

    let mut bought: Vec<String> = Vec::new();
    for (from, name, count) in matched {
        for _ in 0..count {
            if !settle_one(ctx.world, buyer, from, &name) {
                let cleared: u32 = ctx
                    .world
                    .persons
                    .values_mut()
                    .map(|p| p.resources.clear_matches(buyer))
                    .sum();
                debug!(buyer, seller = from, resource = %name, cleared, "trade failed");
                return false;
            }
        }
        if !bought.contains(&name) {
            bought.push(name);
        }
    }

    let is_player = ctx.world.person(buyer).is_some_and(|p| p.is_the_player);
    if !is_player {
        for name in bought {
            career::upgrade_job(ctx, buyer, Unlock::Resource(name));
        }
    }
    true
}

/// Move one matched unit of `name` from `seller` to `buyer` for its
/// exchange-rate price. Nothing changes hands on failure.
fn settle_one(world: &mut World, buyer: PersonId, seller: PersonId, name: &str) -> bool {
    let Some((currency, ratio)) = world
        .catalog
        .price_of(name, world.year)
        .map(|(sell, ratio)| (sell.to_string(), ratio))
    else {
        return false;
    };
    let cost = ratio.max(0.0).ceil() as u32;
    let (Some(b), Some(s)) = (world.person(buyer), world.person(seller)) else {
        return false;
    };
    if b.count_of(&currency) < cost || s.resources.matched_to(buyer, name) == 0 {
        return false;
    }

    let Some(payment) = world.person_mut(buyer).and_then(|b| b.resources.take(&currency, cost))
    else {
        return false;
    };
    let Some(mut unit) = world
        .person_mut(seller)
        .and_then(|s| s.resources.take_matched(buyer, name))
    else {
        return false;
    };
    if let Some(s) = world.person_mut(seller) {
        for mut lot in payment {
            lot.resource.for_sale = false;
            lot.resource.matched_buyer = None;
            s.add_resource(lot.resource, lot.count);
        }
    }
    unit.for_sale = false;
    unit.matched_buyer = None;
    if let Some(b) = world.person_mut(buyer) {
        b.add_resource(unit, 1);
    }
    debug!(buyer, seller, resource = name, cost, %currency, "traded");
    true
}

/// Age every perishable unit the person holds, dropping the spent ones.
pub fn age_resources(world: &mut World, id: PersonId) -> u32 {
    world
        .person_mut(id)
        .map_or(0, |p| p.resources.age_one_turn())
}
