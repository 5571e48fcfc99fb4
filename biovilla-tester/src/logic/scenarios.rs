use anyhow::{Context, Result, ensure};
use biovilla_game::{
    BossPhase, GameEvent, Gesture, Input, Point, Screen, Size, TouchPoints, ZoneStatus,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::game_tester::PlaySession;

pub type ScenarioFn = fn(&mut PlaySession) -> Result<()>;

/// A named check run once per seed and iteration.
#[derive(Debug, Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario {
            key: "smoke",
            name: "Smoke",
            description: "Start a game and reach the village map",
            run: smoke,
        },
        TestScenario {
            key: "full-playthrough",
            name: "Full Playthrough",
            description: "Clear every zone, defeat the boss and restart",
            run: full_playthrough,
        },
        TestScenario {
            key: "gating",
            name: "Zone Gating",
            description: "Locked zones only show advisories",
            run: gating,
        },
        TestScenario {
            key: "game-over",
            name: "Game Over",
            description: "Wrong answers drain lives and reset the run",
            run: game_over,
        },
        TestScenario {
            key: "boss-retry",
            name: "Boss Retry",
            description: "A missed boss question comes back",
            run: boss_retry,
        },
        TestScenario {
            key: "viewport-clamp",
            name: "Viewport Clamp",
            description: "Random drags, zooms and flings stay inside the map",
            run: viewport_clamp,
        },
        TestScenario {
            key: "stale-timers",
            name: "Stale Timers",
            description: "Leaving a conversation early never leaks its timers",
            run: stale_timers,
        },
        TestScenario {
            key: "monkey",
            name: "Random Input",
            description: "Random inputs and ticks keep progress within bounds",
            run: monkey,
        },
    ]
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    catalog().into_iter().find(|scenario| scenario.key == key)
}

fn smoke(session: &mut PlaySession) -> Result<()> {
    session.to_map()?;
    let map = session.game.view().map.context("map view missing")?;
    let guide = map.zones.first().context("no zone markers")?;
    ensure!(
        guide.status == ZoneStatus::Unlocked,
        "guide marker should start unlocked"
    );
    ensure!(
        map.zones[1..]
            .iter()
            .all(|marker| marker.status == ZoneStatus::Locked),
        "story zones should start locked"
    );
    ensure!(session.game.viewport().is_active(), "map input is disabled");
    Ok(())
}

fn full_playthrough(session: &mut PlaySession) -> Result<()> {
    session.clear_all_zones()?;
    let progress = session.game.progress();
    ensure!(
        progress.resource == progress.resource_max,
        "resource {} after every zone, expected {}",
        progress.resource,
        progress.resource_max
    );
    session.face_boss()?;
    session.defeat_boss()?;
    ensure!(
        session.count(&GameEvent::BossCutscene) <= 1,
        "cutscene played more than once"
    );
    ensure!(session.count(&GameEvent::Victory) == 1, "no victory event");
    session.input(Input::Restart);
    session.expect_screen(Screen::Start)?;
    ensure!(
        session.game.progress().completed_zones.is_empty(),
        "restart kept completed zones"
    );
    Ok(())
}

fn gating(session: &mut PlaySession) -> Result<()> {
    session.to_map()?;
    let order = session.game.content().zone_order.clone();
    let first = order.first().context("no story zones")?.clone();

    session.input(Input::EnterZone(first.clone()));
    session.expect_screen(Screen::Map)?;
    ensure!(
        session.game.view().advisory.is_some(),
        "locked zone entry showed no advisory"
    );

    session.talk_to_guide()?;
    if let Some(second) = order.get(1) {
        session.input(Input::EnterZone(second.clone()));
        session.expect_screen(Screen::Map)?;
    }

    let danger = session.game.content().danger_zone.clone();
    let before = session.game.progress().clone();
    session.input(Input::EnterZone(danger));
    session.expect_screen(Screen::Map)?;
    ensure!(
        session.game.progress() == &before,
        "premature danger entry changed progress"
    );

    session.clear_zone(&first)?;
    ensure!(
        order
            .get(1)
            .is_none_or(|second| session.game.progress().is_unlocked(second)),
        "completing {first} did not unlock the next zone"
    );
    Ok(())
}

fn game_over(session: &mut PlaySession) -> Result<()> {
    session.to_map()?;
    session.talk_to_guide()?;
    let first = session.game.content().zone_order[0].clone();
    session.input(Input::EnterZone(first));
    session.finish_dialogue()?;
    let lives = session.game.progress().lives_max;
    let retry = session.game.config().timing.quiz_retry_delay_ms;
    for remaining in (0..lives).rev() {
        session.expect_screen(Screen::Quiz)?;
        let position = session.wrong_position()?;
        session.input(Input::SelectOption(position));
        if remaining > 0 {
            ensure!(
                session.game.progress().lives == remaining,
                "expected {remaining} lives, have {}",
                session.game.progress().lives
            );
            session.tick(retry);
        }
    }
    session.expect_screen(Screen::Start)?;
    ensure!(session.count(&GameEvent::GameOver) == 1, "no game over event");
    ensure!(
        session.game.progress().lives == lives,
        "lives were not restored"
    );
    session.tick(60_000);
    session.expect_screen(Screen::Start)
}

fn boss_retry(session: &mut PlaySession) -> Result<()> {
    session.clear_all_zones()?;
    session.face_boss()?;
    let title = session
        .game
        .active_question()
        .context("no boss question")?
        .card()
        .title
        .clone();
    let hp = session.game.progress().boss_hp;
    let position = session.wrong_position()?;
    session.input(Input::SelectOption(position));
    ensure!(session.game.progress().boss_hp == hp, "a miss damaged the boss");
    let delay = session.game.config().timing.boss_miss_delay_ms;
    session.tick(delay);
    ensure!(
        session.boss_phase() == Some(BossPhase::Question { index: 0 }),
        "boss moved on after a miss: {:?}",
        session.boss_phase()
    );
    let question = session.game.active_question().context("no boss question")?;
    ensure!(question.card().title == title, "a different question came up");
    ensure!(question.accepts_answers(), "retried question is locked");
    Ok(())
}

fn viewport_clamp(session: &mut PlaySession) -> Result<()> {
    session.to_map()?;
    let mut rng = ChaCha20Rng::seed_from_u64(session.seed);
    session.input(Input::Gesture(Gesture::Resize {
        size: Size::new(rng.gen_range(320.0..1_200.0), rng.gen_range(320.0..900.0)),
    }));
    for _ in 0..40 {
        let at = Point::new(rng.gen_range(-500.0..1_500.0), rng.gen_range(-500.0..1_500.0));
        match rng.gen_range(0..4) {
            0 => {
                session.input(Input::Gesture(Gesture::PointerDown { at, target: None }));
                let to = Point::new(
                    rng.gen_range(-3_000.0..3_000.0),
                    rng.gen_range(-3_000.0..3_000.0),
                );
                session.input(Input::Gesture(Gesture::PointerMove { at: to }));
                session.input(Input::Gesture(Gesture::PointerUp));
            }
            1 => session.input(Input::Gesture(Gesture::Wheel {
                at,
                delta_y: if rng.gen_bool(0.5) { -1.0 } else { 1.0 },
            })),
            2 => {
                let other = Point::new(at.x + rng.gen_range(10.0..200.0), at.y);
                session.input(Input::Gesture(Gesture::TouchStart {
                    touches: TouchPoints::from_slice(&[at, other]),
                    target: None,
                }));
                let spread = Point::new(other.x + rng.gen_range(-100.0..300.0), other.y);
                session.input(Input::Gesture(Gesture::TouchMove {
                    touches: TouchPoints::from_slice(&[at, spread]),
                }));
                session.input(Input::Gesture(Gesture::TouchEnd { remaining: 0 }));
            }
            _ => session.input(Input::ZoomButton(rng.gen_range(-0.5..0.5))),
        }
        for _ in 0..200 {
            check_viewport(session)?;
            if !session.game.animation_frame() {
                break;
            }
        }
        check_viewport(session)?;
    }
    Ok(())
}

fn check_viewport(session: &PlaySession) -> Result<()> {
    let viewport = session.game.viewport();
    let config = &session.game.config().viewport;
    let offset = viewport.offset();
    let min = viewport.min_offset();
    let zoom = viewport.zoom();
    ensure!(
        (config.zoom_min..=config.zoom_max).contains(&zoom),
        "zoom {zoom} outside bounds"
    );
    ensure!(
        offset.x <= 0.0 && offset.x >= min.x - 1e-9,
        "offset x {} outside [{}, 0]",
        offset.x,
        min.x
    );
    ensure!(
        offset.y <= 0.0 && offset.y >= min.y - 1e-9,
        "offset y {} outside [{}, 0]",
        offset.y,
        min.y
    );
    Ok(())
}

fn stale_timers(session: &mut PlaySession) -> Result<()> {
    session.to_map()?;
    let guide = session.game.content().guide.id.clone();
    session.input(Input::EnterZone(guide.clone()));
    session.tick(5);
    session.finish_dialogue()?;
    session.expect_screen(Screen::Map)?;

    session.input(Input::EnterZone(guide));
    let first_line = session
        .game
        .content()
        .guide
        .dialogue
        .first()
        .map(|line| line.text.clone())
        .context("guide has no lines")?;
    session.tick(60_000);
    session.expect_screen(Screen::Dialogue)?;
    let view = session
        .game
        .view()
        .dialogue
        .context("no dialogue on screen")?;
    ensure!(view.line == 0, "stale timers moved the dialogue to line {}", view.line);
    ensure!(
        view.text == first_line,
        "unexpected text {:?}, wanted {first_line:?}",
        view.text
    );
    Ok(())
}

fn monkey(session: &mut PlaySession) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(session.seed ^ 0x5EED);
    let mut zones = session.game.content().zone_order.clone();
    zones.push(session.game.content().guide.id.clone());
    zones.push(session.game.content().danger_zone.clone());
    let villagers: Vec<String> = session
        .game
        .content()
        .villagers
        .iter()
        .map(|villager| villager.id.clone())
        .collect();

    for step in 0..400 {
        let input = match rng.gen_range(0..8) {
            0 => Input::Begin,
            1 | 2 => Input::Advance,
            3 => Input::SelectOption(rng.gen_range(0..5)),
            4 => Input::EnterZone(zones[rng.gen_range(0..zones.len())].clone()),
            5 if !villagers.is_empty() => {
                Input::TapVillager(villagers[rng.gen_range(0..villagers.len())].clone())
            }
            6 => Input::Restart,
            _ => Input::ZoomButton(0.12),
        };
        session.input(input);
        session.tick(rng.gen_range(0..4_000));
        check_progress(session).with_context(|| format!("after step {step}"))?;
    }
    for event in &session.events {
        if let GameEvent::ScreenChanged { from, to } = event {
            ensure!(from.allows(*to), "illegal transition {from} -> {to}");
        }
    }
    Ok(())
}

fn check_progress(session: &PlaySession) -> Result<()> {
    let progress = session.game.progress();
    ensure!(
        (0..=progress.resource_max).contains(&progress.resource),
        "resource {} outside [0, {}]",
        progress.resource,
        progress.resource_max
    );
    ensure!(
        progress.lives >= 1 && progress.lives <= progress.lives_max,
        "lives {} outside [1, {}]",
        progress.lives,
        progress.lives_max
    );
    serde_json::to_string(&session.game.view()).context("view failed to serialize")?;
    Ok(())
}
