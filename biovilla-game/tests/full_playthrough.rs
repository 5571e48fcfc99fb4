use biovilla_game::{
    BossPhase, EmbeddedContent, Game, GameConfig, GameEngine, GameEvent, Gesture, Input,
    MapTarget, Point, Screen, Size, TouchPoints, ZoneId,
};

const SEEDS: [u64; 3] = [1, 7, 0x00C0_FFEE];

fn new_game(seed: u64) -> Game {
    GameEngine::embedded().unwrap().create_game(seed)
}

fn finish_dialogue(game: &mut Game) {
    for _ in 0..64 {
        if !matches!(game.screen(), Screen::Intro | Screen::Dialogue) {
            return;
        }
        game.handle(Input::Advance);
    }
    panic!("dialogue never finished on {}", game.screen());
}

fn to_map(game: &mut Game) {
    game.handle(Input::Begin);
    finish_dialogue(game);
    assert_eq!(game.screen(), Screen::Map);
}

fn talk_to_guide(game: &mut Game) {
    let guide = game.content().guide.id.clone();
    game.handle(Input::EnterZone(guide));
    finish_dialogue(game);
    assert!(game.progress().guide_seen);
}

fn correct_position(game: &Game) -> usize {
    let quiz = game.active_question().expect("a question on screen");
    let id = quiz.card().correct_option().unwrap().id;
    quiz.position_of(id).unwrap()
}

fn wrong_position(game: &Game) -> usize {
    usize::from(correct_position(game) == 0)
}

fn clear_zone(game: &mut Game, zone: &ZoneId) {
    game.handle(Input::EnterZone(zone.clone()));
    assert_eq!(game.screen(), Screen::Dialogue, "{zone} should open");
    finish_dialogue(game);
    assert_eq!(game.screen(), Screen::Quiz);
    let position = correct_position(game);
    game.handle(Input::SelectOption(position));
    game.tick(game.config().timing.quiz_success_delay_ms);
    assert_eq!(game.screen(), Screen::Map);
    assert!(game.progress().is_completed(zone));
}

fn clear_all_zones(game: &mut Game) {
    to_map(game);
    talk_to_guide(game);
    let order = game.content().zone_order.clone();
    for zone in &order {
        clear_zone(game, zone);
    }
}

fn skip_boss_intro(game: &mut Game) {
    for _ in 0..16 {
        if game.boss().map(|boss| boss.phase()) != Some(BossPhase::Intro) {
            return;
        }
        game.handle(Input::Advance);
    }
}

fn boss_phase(game: &Game) -> Option<BossPhase> {
    game.boss().map(|boss| boss.phase())
}

#[test]
fn full_playthrough_reaches_victory() {
    for seed in SEEDS {
        let mut game = new_game(seed);
        clear_all_zones(&mut game);
        assert_eq!(game.progress().resource, 100, "seed {seed}");
        assert!(game.progress().all_zones_completed());

        game.tick(400);
        assert_eq!(
            game.view().advisory.as_deref(),
            Some("DANGER ZONE unlocked! Go face the boss!")
        );

        let danger = game.content().danger_zone.clone();
        game.drain_events();
        game.handle(Input::EnterZone(danger));
        assert_eq!(game.screen(), Screen::Boss);
        assert_eq!(game.progress().boss_hp, 3);
        skip_boss_intro(&mut game);
        assert_eq!(boss_phase(&game), Some(BossPhase::Question { index: 0 }));

        let position = correct_position(&game);
        game.handle(Input::SelectOption(position));
        assert_eq!(game.progress().boss_hp, 2);
        assert_eq!(game.progress().resource, 100, "bonus stays clamped");
        game.tick(2_800);
        assert_eq!(boss_phase(&game), Some(BossPhase::Cutscene { next: 1 }));
        game.tick(2_500);
        assert_eq!(boss_phase(&game), Some(BossPhase::Question { index: 1 }));

        let position = correct_position(&game);
        game.handle(Input::SelectOption(position));
        game.tick(2_800);
        assert_eq!(boss_phase(&game), Some(BossPhase::Question { index: 2 }));
        assert!(game.boss().unwrap().cutscene_played());

        let position = correct_position(&game);
        game.handle(Input::SelectOption(position));
        assert_eq!(game.progress().boss_hp, 0);
        game.tick(2_800);
        assert_eq!(boss_phase(&game), Some(BossPhase::Victory));
        assert_eq!(game.screen(), Screen::Boss);

        let line = game.content().boss.victory_line.clone();
        let reveal = u64::try_from(line.chars().count()).unwrap() * 20 + 1_000;
        game.tick(reveal - 1);
        assert_eq!(game.screen(), Screen::Boss);
        game.tick(1);
        assert_eq!(game.screen(), Screen::Victory);
        let victory = game.view().victory.unwrap();
        assert_eq!(victory.line, line);
        assert!(!victory.text.is_empty());

        let events = game.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == GameEvent::BossCutscene).count(),
            1
        );
        assert!(events.contains(&GameEvent::BossDefeated));
        assert!(events.contains(&GameEvent::Victory));

        game.handle(Input::Restart);
        assert_eq!(game.screen(), Screen::Start);
        assert_eq!(game.progress().resource, 0);
        assert!(game.progress().completed_zones.is_empty());
    }
}

#[test]
fn zones_unlock_in_order() {
    let mut game = new_game(3);
    to_map(&mut game);
    let order = game.content().zone_order.clone();

    game.handle(Input::EnterZone(order[0].clone()));
    assert_eq!(game.screen(), Screen::Map);
    assert_eq!(
        game.view().advisory.as_deref(),
        Some("Talk to the guide first.")
    );

    talk_to_guide(&mut game);
    game.handle(Input::EnterZone(order[1].clone()));
    assert_eq!(game.screen(), Screen::Map);
    let expected = format!("Complete {} first.", game.content().label_for(&order[0]));
    assert_eq!(game.view().advisory.as_deref(), Some(expected.as_str()));

    clear_zone(&mut game, &order[0]);
    let danger = game.content().danger_zone.clone();
    let before = game.progress().clone();
    game.handle(Input::EnterZone(danger));
    assert_eq!(game.screen(), Screen::Map);
    assert_eq!(game.progress(), &before);
    assert_eq!(
        game.view().advisory.as_deref(),
        Some("Complete every zone first.")
    );
}

#[test]
fn boss_requires_a_full_resource_bar() {
    let mut config = GameConfig::default();
    config.progress.resource_max = 120;
    let engine = GameEngine::new(&EmbeddedContent, config).unwrap();
    let mut game = engine.create_game(11);
    clear_all_zones(&mut game);
    assert_eq!(game.progress().resource, 100);

    let danger = game.content().danger_zone.clone();
    game.handle(Input::EnterZone(danger));
    assert_eq!(game.screen(), Screen::Map);
    assert_eq!(
        game.view().advisory.as_deref(),
        Some("You need 120 ATP to face the boss.")
    );
}

#[test]
fn boss_miss_presents_the_same_question_again() {
    let mut game = new_game(5);
    clear_all_zones(&mut game);
    let danger = game.content().danger_zone.clone();
    game.handle(Input::EnterZone(danger));
    skip_boss_intro(&mut game);

    let title = game.active_question().unwrap().card().title.clone();
    let position = wrong_position(&game);
    game.handle(Input::SelectOption(position));
    assert_eq!(game.progress().lives, 2);
    assert_eq!(game.progress().boss_hp, 3);
    assert!(game.view().boss.unwrap().question.unwrap().feedback.is_some());

    game.tick(3_000);
    assert_eq!(boss_phase(&game), Some(BossPhase::Question { index: 0 }));
    let question = game.active_question().unwrap();
    assert_eq!(question.card().title, title);
    assert!(question.accepts_answers());
}

#[test]
fn losing_every_life_in_the_boss_fight_ends_the_game() {
    let mut game = new_game(9);
    clear_all_zones(&mut game);
    let danger = game.content().danger_zone.clone();
    game.handle(Input::EnterZone(danger));
    skip_boss_intro(&mut game);
    game.drain_events();

    for _ in 0..2 {
        let position = wrong_position(&game);
        game.handle(Input::SelectOption(position));
        game.tick(3_000);
    }
    let position = wrong_position(&game);
    game.handle(Input::SelectOption(position));

    assert_eq!(game.screen(), Screen::Start);
    assert!(game.drain_events().contains(&GameEvent::GameOver));
    assert_eq!(game.progress().lives, 3);
    assert!(!game.progress().guide_seen);
    assert!(game.boss().is_none());

    game.tick(60_000);
    assert_eq!(game.screen(), Screen::Start);
    assert!(game.drain_events().is_empty());
}

#[test]
fn dragging_never_leaves_the_world() {
    let mut game = new_game(2);
    to_map(&mut game);
    game.handle(Input::Gesture(Gesture::Resize {
        size: Size::new(800.0, 600.0),
    }));

    game.handle(Input::Gesture(Gesture::PointerDown {
        at: Point::new(400.0, 300.0),
        target: None,
    }));
    game.handle(Input::Gesture(Gesture::PointerMove {
        at: Point::new(-5_000.0, -5_000.0),
    }));
    let min = game.viewport().min_offset();
    assert_eq!(game.viewport().offset(), min);

    game.handle(Input::Gesture(Gesture::PointerMove {
        at: Point::new(5_000.0, 5_000.0),
    }));
    assert_eq!(game.viewport().offset(), Point::new(0.0, 0.0));

    game.handle(Input::Gesture(Gesture::PointerMove {
        at: Point::new(4_900.0, 4_950.0),
    }));
    game.handle(Input::Gesture(Gesture::PointerUp));
    assert!(game.viewport().inertia_running());
    let mut frames = 0;
    while game.animation_frame() {
        frames += 1;
        let offset = game.viewport().offset();
        let min = game.viewport().min_offset();
        assert!(offset.x <= 0.0 && offset.x >= min.x);
        assert!(offset.y <= 0.0 && offset.y >= min.y);
        assert!(frames < 1_000, "inertia never settled");
    }
    assert!(!game.viewport().inertia_running());
}

#[test]
fn tapping_a_zone_marker_enters_it() {
    let mut game = new_game(4);
    to_map(&mut game);
    let guide = game.content().guide.id.clone();
    game.handle(Input::Gesture(Gesture::TouchStart {
        touches: TouchPoints::from_slice(&[Point::new(100.0, 100.0)]),
        target: Some(MapTarget::Zone(guide)),
    }));
    game.tick(120);
    game.handle(Input::Gesture(Gesture::TouchEnd { remaining: 0 }));
    assert_eq!(game.screen(), Screen::Dialogue);
}

#[test]
fn slow_touch_is_not_a_tap() {
    let mut game = new_game(4);
    to_map(&mut game);
    let guide = game.content().guide.id.clone();
    game.handle(Input::Gesture(Gesture::TouchStart {
        touches: TouchPoints::from_slice(&[Point::new(100.0, 100.0)]),
        target: Some(MapTarget::Zone(guide)),
    }));
    game.tick(300);
    game.handle(Input::Gesture(Gesture::TouchEnd { remaining: 0 }));
    assert_eq!(game.screen(), Screen::Map);
}
