use std::collections::BTreeSet;

use family_tree_engine::testutil::{give, market, person_at};
use family_tree_engine::{GameEngine, Gender, Job, SimConfig};
use proptest::prelude::*;

const SKILLS: [&str; 4] = ["Smithing", "Letters", "Riding", "Husbandry"];
const TOOLS: [&str; 3] = ["Iron", "Labour", "Sword"];

fn pick<'a>(names: &[&'a str], mask: u8) -> BTreeSet<String> {
    names
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, n)| n.to_string())
        .collect()
}

proptest! {
    #[test]
    fn gaining_a_skill_or_tool_never_disqualifies(
        needed_skills in 0_u8..16,
        needed_tools in 0_u8..8,
        held_skills in 0_u8..16,
        held_tools in 0_u8..8,
        gain in 0_usize..7,
    ) {
        let mut catalog = market();
        let mut job = Job::new("Guildsman");
        job.required_skills = pick(&SKILLS, needed_skills);
        job.required_resources = pick(&TOOLS, needed_tools);
        catalog.add_job(job);

        let mut engine = GameEngine::new(catalog, SimConfig::new(1450, 3));
        let world = engine.world_mut();
        let id = person_at(world, "Alice", Gender::Female, 1420, "York");
        world.person_mut(id).unwrap().age = 30;
        world.person_mut(id).unwrap().skills = pick(&SKILLS, held_skills);
        for tool in pick(&TOOLS, held_tools) {
            give(world, id, &tool, 1, false);
        }

        let before = engine.meets_requirements(id, "Guildsman");
        let world = engine.world_mut();
        if gain < SKILLS.len() {
            world.person_mut(id).unwrap().skills.insert(SKILLS[gain].to_string());
        } else {
            give(world, id, TOOLS[gain - SKILLS.len()], 1, false);
        }
        let after = engine.meets_requirements(id, "Guildsman");
        prop_assert!(!before || after);
    }
}

#[test]
fn every_requirement_axis_counts() {
    let mut catalog = market();
    let mut job = Job::new("Abbess");
    job.min_age = Some(30);
    job.allowed_genders.insert(Gender::Female);
    job.affiliations.insert("Church".into());
    job.required_skills.insert("Letters".into());
    catalog.add_job(job);

    let mut engine = GameEngine::new(catalog, SimConfig::new(1200, 5));
    let world = engine.world_mut();
    let hild = person_at(world, "Hild", Gender::Female, 1160, "York");
    {
        let p = world.person_mut(hild).unwrap();
        p.age = 40;
        p.affiliations.insert("Church".into());
        p.skills.insert("Letters".into());
    }
    assert!(engine.meets_requirements(hild, "Abbess"));

    engine.world_mut().person_mut(hild).unwrap().age = 25;
    assert!(!engine.meets_requirements(hild, "Abbess"));
    engine.world_mut().person_mut(hild).unwrap().age = 40;

    engine.world_mut().person_mut(hild).unwrap().skills.clear();
    assert!(!engine.meets_requirements(hild, "Abbess"));
    engine.world_mut().person_mut(hild).unwrap().skills.insert("Letters".into());

    engine.world_mut().person_mut(hild).unwrap().affiliations.clear();
    assert!(!engine.meets_requirements(hild, "Abbess"));

    let world = engine.world_mut();
    let bede = person_at(world, "Bede", Gender::Male, 1160, "York");
    let p = world.person_mut(bede).unwrap();
    p.age = 40;
    p.affiliations.insert("Church".into());
    p.skills.insert("Letters".into());
    assert!(!engine.meets_requirements(bede, "Abbess"));
    assert!(!engine.meets_requirements(bede, "No Such Job"));
}
