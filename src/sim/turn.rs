use tracing::{debug, warn};

use super::career;
use super::context::TickContext;
use super::economy;
use super::events::{apply_event, due_events, expire_event, expiring_events};
use super::health;
use super::politics;
use super::rates::{apply_rate, personal_rates};
use super::system::SimSystem;
use crate::id::PersonId;
use crate::model::{Rate, World};

/// Drop the dead who have no tie to the player.
pub struct PurgeSystem;

impl SimSystem for PurgeSystem {
    fn name(&self) -> &str {
        "purge"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let purged = purge_dead(ctx.world);
        if purged > 0 {
            debug!(purged, "purged the dead");
        }
    }
}

fn purge_dead(world: &mut World) -> usize {
    let dead: Vec<PersonId> = world
        .persons
        .values()
        .filter(|p| !p.is_alive() && !p.is_in_player_family())
        .map(|p| p.id)
        .collect();
    for &id in &dead {
        world.remove_person(id);
    }
    dead.len()
}

pub struct BattleSystem;

impl SimSystem for BattleSystem {
    fn name(&self) -> &str {
        "battles"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        politics::roll_battles(ctx);
    }
}

/// Expire events whose last year has just passed.
pub struct EventExpirySystem;

impl SimSystem for EventExpirySystem {
    fn name(&self) -> &str {
        "event_expiry"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        for event in expiring_events(ctx.world) {
            expire_event(ctx, &event);
        }
    }
}

/// Towns changing hands this year.
pub struct RulerSystem;

impl SimSystem for RulerSystem {
    fn name(&self) -> &str {
        "rulers"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let year = ctx.world.year;
        for event in politics::create_ruler_events(ctx.world, year) {
            apply_event(ctx, &event);
        }
    }
}

pub struct EventTriggerSystem;

impl SimSystem for EventTriggerSystem {
    fn name(&self) -> &str {
        "event_trigger"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        for event in due_events(ctx.world) {
            apply_event(ctx, &event);
        }
    }
}

/// The active person's year. Their job is run but never chosen for them.
pub struct PlayerSystem;

impl SimSystem for PlayerSystem {
    fn name(&self) -> &str {
        "player"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let Some(player) = ctx.world.active_person.filter(|&id| ctx.world.is_alive(id)) else {
            warn!(year = ctx.world.year, "no living active person");
            return;
        };
        let rates = personal_rates(ctx.world);
        personal_phase(ctx, player, &rates);
        if ctx.world.is_alive(player) {
            career::do_job(ctx, player);
            economy::age_resources(ctx.world, player);
        }
    }
}

/// Everyone else's year.
pub struct NpcSystem;

impl SimSystem for NpcSystem {
    fn name(&self) -> &str {
        "npcs"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        npc_pass(ctx);
    }
}

/// Run the NPC year for every living person other than the active one.
pub(crate) fn npc_pass(ctx: &mut TickContext) {
    let rates = personal_rates(ctx.world);
    let player = ctx.world.active_person;
    for id in ctx.world.living_ids() {
        if Some(id) == player {
            continue;
        }
        personal_phase(ctx, id, &rates);
        if !ctx.world.is_alive(id) {
            continue;
        }
        trading_phase(ctx, id);
        career_phase(ctx, id);
        economy::age_resources(ctx.world, id);
    }
}

/// Ageing, rates and injuries.
fn personal_phase(ctx: &mut TickContext, id: PersonId, rates: &[Rate]) {
    let year = ctx.world.year;
    if let Some(person) = ctx.world.person_mut(id) {
        person.age = person.age_in(year);
    }
    for rate in rates {
        if !ctx.world.is_alive(id) {
            return;
        }
        apply_rate(ctx, id, rate);
    }
    if !ctx.world.is_alive(id) {
        return;
    }
    health::contract_injuries(ctx, id);
    health::seek_cures(ctx.world, id);
    health::suffer_injuries(ctx, id);
}

/// Buy what the person has been wanting.
fn trading_phase(ctx: &mut TickContext, id: PersonId) {
    let wants = ctx
        .world
        .person(id)
        .is_some_and(|p| !p.wanted_resources.is_empty());
    if wants && economy::trade_matching(ctx, id) > 0 {
        economy::make_trades(ctx, id, None);
    }
}

/// Keep or find a job, then work it.
fn career_phase(ctx: &mut TickContext, id: PersonId) {
    career::vacate_inactive_job(ctx.world, id);
    let unemployed = ctx.world.person(id).is_some_and(|p| p.job.is_none());
    if unemployed {
        career::seek_job(ctx, id);
    }
    career::do_job(ctx, id);
}

/// The phases of a turn in the order they run.
pub fn turn_phases() -> Vec<Box<dyn SimSystem>> {
    vec![
        Box::new(PurgeSystem),
        Box::new(BattleSystem),
        Box::new(EventExpirySystem),
        Box::new(RulerSystem),
        Box::new(EventTriggerSystem),
        Box::new(PlayerSystem),
        Box::new(NpcSystem),
    ]
}
