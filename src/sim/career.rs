use tracing::debug;

use super::context::TickContext;
use super::economy;
use super::family;
use super::helpers::{pick, roll};
use crate::id::PersonId;
use crate::model::{Job, Person, PlayerNotice, RateKind, World};

/// What a person just gained that might open up a better job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unlock {
    Skill(String),
    Resource(String),
}

impl Unlock {
    fn opens(&self, job: &Job) -> bool {
        match self {
            Unlock::Skill(skill) => job.requires_skill(skill),
            Unlock::Resource(resource) => job.requires_resource(resource),
        }
    }
}

fn household_wealth(world: &World, person: &Person) -> f64 {
    let spouse = world
        .living_spouse(person.id)
        .and_then(|s| world.person(s))
        .map_or(0.0, |s| world.own_wealth(s));
    world.own_wealth(person) + spouse
}

/// Everything but the resource requirement.
fn meets_personal_requirements(world: &World, person: &Person, job: &Job) -> bool {
    job.admits_age(person.age)
        && job.admits_gender(person.gender)
        && job.admits_affiliations(&person.affiliations)
        && job.required_skills.is_subset(&person.skills)
        && job.social_class.as_ref().is_none_or(|class| {
            world
                .catalog
                .social_classes
                .get(class)
                .is_none_or(|c| household_wealth(world, person) >= c.wealth)
        })
}

pub fn meets_requirements(world: &World, person: &Person, job: &Job) -> bool {
    meets_personal_requirements(world, person, job) && missing_resources(person, job).is_empty()
}

pub fn missing_resources(person: &Person, job: &Job) -> Vec<String> {
    job.required_resources
        .iter()
        .filter(|r| person.count_of(r) == 0)
        .cloned()
        .collect()
}

/// Whether the job's head count is reached among living holders who share
/// an affiliation with `id`.
pub fn at_capacity(world: &World, id: PersonId, job: &Job) -> bool {
    let Some(max) = job.max_count else {
        return false;
    };
    let Some(seeker) = world.person(id) else {
        return true;
    };
    let holders = world
        .living()
        .filter(|p| p.id != id && p.job.as_deref() == Some(job.name.as_str()))
        .filter(|p| {
            (p.affiliations.is_empty() && seeker.affiliations.is_empty())
                || !p.affiliations.is_disjoint(&seeker.affiliations)
        })
        .count();
    holders >= max as usize
}

fn open_jobs(world: &World, id: PersonId, filter: impl Fn(&Job) -> bool) -> Vec<String> {
    let Some(person) = world.person(id) else {
        return Vec::new();
    };
    world
        .active_jobs
        .iter()
        .filter_map(|name| world.catalog.jobs.get(name))
        .filter(|&job| filter(job))
        .filter(|job| meets_requirements(world, person, job) && !at_capacity(world, id, job))
        .map(|job| job.name.clone())
        .collect()
}

/// Find a job for `id`. Leans towards the family trade when "Inherit Job"
/// says so. Returns the job taken.
pub fn seek_job(ctx: &mut TickContext, id: PersonId) -> Option<String> {
    let world = &*ctx.world;
    let person = world.person(id).filter(|p| p.is_alive())?;
    let mut candidates = open_jobs(world, id, |_| true);
    if candidates.is_empty() {
        return None;
    }
    if let Some(trade) = person.family_business {
        let inherit = world
            .catalog
            .rate(RateKind::InheritJob, world.year)
            .map_or(0.0, |r| r.value_for(person.age));
        let family_jobs: Vec<String> = candidates
            .iter()
            .filter(|name| world.catalog.jobs.get(*name).is_some_and(|j| j.kind == trade))
            .cloned()
            .collect();
        if !family_jobs.is_empty() && roll(ctx.rng, inherit) {
            candidates = family_jobs;
        }
    }
    let chosen = pick(ctx.rng, &candidates)?.clone();
    take_job(ctx.world, id, &chosen).then_some(chosen)
}

/// Start `job` this year. Earned affiliations are granted and the job's
/// required resources come off the market.
pub fn take_job(world: &mut World, id: PersonId, job: &str) -> bool {
    let Some(def) = world.active_job(job).cloned() else {
        return false;
    };
    let year = world.year;
    let is_player = world.active_person == Some(id);
    let Some(person) = world.person_mut(id).filter(|p| p.is_alive()) else {
        return false;
    };
    person.job = Some(def.name.clone());
    person.job_start_year = Some(year);
    person.affiliations.extend(def.earn_affiliations.iter().cloned());
    for resource in &def.required_resources {
        person.resources.set_for_sale(resource, false);
    }
    debug!(person = id, job = %def.name, year, "took job");
    if is_player {
        world.notify(PlayerNotice::JobChanged { job: def.name });
    }
    true
}

/// Switch to a more demanding job that `unlock` just made reachable. If a
/// new skill only leaves a resource missing, that resource is wanted instead.
pub fn upgrade_job(ctx: &mut TickContext, id: PersonId, unlock: Unlock) -> bool {
    let world = &*ctx.world;
    let Some(person) = world.person(id).filter(|p| p.is_alive()) else {
        return false;
    };
    let current = person
        .job
        .as_ref()
        .and_then(|j| world.catalog.jobs.get(j))
        .map_or(0, Job::requirement_count);
    let better = |job: &Job| unlock.opens(job) && job.requirement_count() > current;

    let upgrades = open_jobs(world, id, better);
    let best = upgrades
        .iter()
        .filter_map(|name| world.catalog.jobs.get(name))
        .max_by_key(|job| job.requirement_count())
        .map(|job| job.name.clone());
    if let Some(best) = best {
        return take_job(ctx.world, id, &best);
    }

    if let Unlock::Skill(_) = unlock {
        let wanted: Option<Vec<String>> = world
            .active_jobs
            .iter()
            .filter_map(|name| world.catalog.jobs.get(name))
            .filter(|&job| better(job) && !at_capacity(world, id, job))
            .filter(|job| meets_personal_requirements(world, person, job))
            .map(|job| missing_resources(person, job))
            .find(|missing| !missing.is_empty());
        if let Some(wanted) = wanted
            && let Some(person) = ctx.world.person_mut(id)
        {
            for resource in wanted {
                person.wants_to_buy(&resource, 1);
            }
        }
    }
    false
}

/// Grant skills whose learning period the person has served. NPCs look
/// for a better job straight away; the player is told.
pub fn learn_skills(ctx: &mut TickContext, id: PersonId) -> Vec<String> {
    let world = &*ctx.world;
    let Some(person) = world.person(id) else {
        return Vec::new();
    };
    let Some(job) = person.job.as_ref().and_then(|j| world.catalog.jobs.get(j)) else {
        return Vec::new();
    };
    let tenure = person.tenure(world.year);
    let learnt: Vec<String> = job
        .learn_skills
        .iter()
        .filter(|(skill, period)| tenure >= **period && !person.skills.contains(*skill))
        .map(|(skill, _)| skill.clone())
        .collect();
    let is_player = person.is_the_player;

    for skill in &learnt {
        if let Some(p) = ctx.world.person_mut(id) {
            p.skills.insert(skill.clone());
        }
        debug!(person = id, skill = %skill, "learnt skill");
        if is_player {
            ctx.world.notify(PlayerNotice::SkillLearned {
                skill: skill.clone(),
            });
        } else {
            upgrade_job(ctx, id, Unlock::Skill(skill.clone()));
        }
    }
    learnt
}

/// A year's work: produce, learn, and for travelling jobs move on.
pub fn do_job(ctx: &mut TickContext, id: PersonId) {
    let Some(job) = ctx
        .world
        .person(id)
        .and_then(|p| p.job.as_ref())
        .and_then(|j| ctx.world.active_job(j))
        .cloned()
    else {
        return;
    };
    economy::produce(ctx.world, id, &job);
    learn_skills(ctx, id);
    if job.travels {
        let towns = ctx.world.active_towns();
        if let Some(town) = pick(ctx.rng, &towns) {
            family::moves(ctx.world, id, town, false);
        }
    }
}

/// Drop a job that has left the active pool.
pub fn vacate_inactive_job(world: &mut World, id: PersonId) -> bool {
    let Some(job) = world.person(id).and_then(|p| p.job.clone()) else {
        return false;
    };
    if world.active_jobs.contains(&job) {
        return false;
    }
    if let Some(person) = world.person_mut(id) {
        person.job = None;
        person.job_start_year = None;
    }
    debug!(person = id, %job, "job no longer available");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{COIN, Gender, JobType, Rate, Resource, SocialClass};
    use crate::sim::SimConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn blacksmith() -> Job {
        Job {
            required_resources: ["Forge".to_string()].into(),
            required_skills: ["Smithing".to_string()].into(),
            min_age: Some(16),
            kind: JobType::Trade,
            ..Job::new("Blacksmith")
        }
    }

    #[test]
    fn every_axis_must_pass() {
        let world = World::new(1200);
        let mut john = Person::new("John", Gender::Male, 1170);
        john.age = 30;
        let job = blacksmith();
        assert!(!meets_requirements(&world, &john, &job));
        john.skills.insert("Smithing".into());
        assert_eq!(missing_resources(&john, &job), vec!["Forge".to_string()]);
        john.add_resource(Resource::new("Forge"), 1);
        assert!(meets_requirements(&world, &john, &job));
        john.age = 12;
        assert!(!meets_requirements(&world, &john, &job));
    }

    #[test]
    fn class_floor_uses_household_wealth() {
        let mut world = World::new(1200);
        world.catalog.add_social_class(SocialClass {
            wealth: 100.0,
            ..SocialClass::new("Gentry")
        });
        let job = Job {
            social_class: Some("Gentry".into()),
            ..Job::new("Steward")
        };
        let mut lord = Person::new("Lord", Gender::Male, 1170);
        lord.add_resource(Resource::new(COIN), 99);
        let lord = world.add_person(lord);
        assert!(!meets_requirements(&world, world.person(lord).unwrap(), &job));
        world.person_mut(lord).unwrap().add_resource(Resource::new(COIN), 1);
        assert!(meets_requirements(&world, world.person(lord).unwrap(), &job));
    }

    #[test]
    fn capacity_counts_fellow_affiliates() {
        let mut world = World::new(1200);
        let job = Job {
            max_count: Some(1),
            ..Job::new("Bishop")
        };
        world.activate_job(job.clone());
        let holder = world.add_person(Person::new("Odo", Gender::Male, 1150).with_affiliation("Norman"));
        world.person_mut(holder).unwrap().job = Some("Bishop".into());
        let saxon = world.add_person(Person::new("Wulf", Gender::Male, 1160).with_affiliation("Saxon"));
        let norman = world.add_person(Person::new("Lanfranc", Gender::Male, 1160).with_affiliation("Norman"));
        assert!(!at_capacity(&world, saxon, &job));
        assert!(at_capacity(&world, norman, &job));
    }

    #[test]
    fn family_trade_wins_when_inherited() {
        let mut world = World::new(1200);
        world.activate_job(Job {
            kind: JobType::Agriculture,
            ..Job::new("Farmer")
        });
        world.activate_job(Job {
            kind: JobType::Trade,
            ..Job::new("Merchant")
        });
        world.catalog.add_rate(Rate::flat(RateKind::InheritJob, 1.0));
        let mut heir = Person::new("Heir", Gender::Male, 1180);
        heir.family_business = Some(JobType::Trade);
        let heir = world.add_person(heir);

        let mut rng = SmallRng::seed_from_u64(21);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        assert_eq!(seek_job(&mut ctx, heir).as_deref(), Some("Merchant"));
        assert_eq!(world.person(heir).unwrap().job_start_year, Some(1200));
    }

    #[test]
    fn skill_upgrade_or_want() {
        let mut world = World::new(1200);
        world.activate_job(Job::new("Labourer"));
        world.activate_job(blacksmith());
        let mut john = Person::new("John", Gender::Male, 1170);
        john.job = Some("Labourer".into());
        john.job_start_year = Some(1190);
        let john = world.add_person(john);
        world.person_mut(john).unwrap().skills.insert("Smithing".into());

        let mut rng = SmallRng::seed_from_u64(2);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        assert!(!upgrade_job(&mut ctx, john, Unlock::Skill("Smithing".into())));
        assert_eq!(ctx.world.person(john).unwrap().wanted_resources.get("Forge"), Some(&1));

        ctx.world.person_mut(john).unwrap().add_resource(Resource::new("Forge"), 1);
        assert!(upgrade_job(&mut ctx, john, Unlock::Resource("Forge".into())));
        let john = world.person(john).unwrap();
        assert_eq!(john.job.as_deref(), Some("Blacksmith"));
        assert!(john.wanted_resources.is_empty());
        assert!(!john.resources.lots()[0].resource.for_sale);
    }

    #[test]
    fn skills_learnt_after_tenure() {
        let mut world = World::new(1200);
        world.activate_job(Job {
            learn_skills: [("Smithing".to_string(), 3)].into(),
            ..Job::new("Apprentice")
        });
        let mut boy = Person::new("Boy", Gender::Male, 1185);
        boy.job = Some("Apprentice".into());
        boy.job_start_year = Some(1198);
        let boy = world.add_person(boy);

        let mut rng = SmallRng::seed_from_u64(2);
        let config = SimConfig::default();
        let mut ctx = TickContext {
            world: &mut world,
            rng: &mut rng,
            config: &config,
        };
        assert!(learn_skills(&mut ctx, boy).is_empty());
        ctx.world.year = 1201;
        assert_eq!(learn_skills(&mut ctx, boy), vec!["Smithing".to_string()]);
        assert!(learn_skills(&mut ctx, boy).is_empty());
    }

    #[test]
    fn removed_jobs_are_vacated() {
        let mut world = World::new(1200);
        world.activate_job(Job::new("Monk"));
        let mut brother = Person::new("Brother", Gender::Male, 1170);
        brother.job = Some("Monk".into());
        let brother = world.add_person(brother);
        assert!(!vacate_inactive_job(&mut world, brother));
        world.active_jobs.remove("Monk");
        assert!(vacate_inactive_job(&mut world, brother));
        assert_eq!(world.person(brother).unwrap().job, None);
    }
}
