use anyhow::{Context, Result, bail, ensure};
use biovilla_game::{BossPhase, Game, GameEngine, GameEvent, Input, Screen, ZoneId};
use std::sync::Arc;

/// Upper bound on inputs fed to a single dialogue before giving up.
const MAX_DIALOGUE_STEPS: usize = 256;

/// Creates seeded games from one shared engine.
#[derive(Debug, Clone)]
pub struct GameTester {
    engine: Arc<GameEngine>,
    verbose: bool,
}

impl GameTester {
    #[must_use]
    pub const fn new(engine: Arc<GameEngine>, verbose: bool) -> Self {
        Self { engine, verbose }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub fn session(&self, seed: u64) -> PlaySession {
        PlaySession {
            game: self.engine.create_game(seed),
            events: Vec::new(),
            seed,
        }
    }
}

/// One game under test plus every event it produced.
#[derive(Debug)]
pub struct PlaySession {
    pub game: Game,
    pub events: Vec<GameEvent>,
    pub seed: u64,
}

impl PlaySession {
    pub fn input(&mut self, input: Input) {
        self.game.handle(input);
        self.collect();
    }

    pub fn tick(&mut self, elapsed_ms: u64) {
        self.game.tick(elapsed_ms);
        self.collect();
    }

    fn collect(&mut self) {
        self.events.extend(self.game.drain_events());
    }

    #[must_use]
    pub fn count(&self, event: &GameEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn expect_screen(&self, screen: Screen) -> Result<()> {
        let current = self.game.screen();
        ensure!(
            current == screen,
            "expected {screen} screen, found {current} (seed {})",
            self.seed
        );
        Ok(())
    }

    /// Advance through the dialogue on screen until it hands off.
    pub fn finish_dialogue(&mut self) -> Result<()> {
        for _ in 0..MAX_DIALOGUE_STEPS {
            if !matches!(self.game.screen(), Screen::Intro | Screen::Dialogue) {
                return Ok(());
            }
            self.input(Input::Advance);
        }
        bail!("dialogue on {} never finished", self.game.screen())
    }

    pub fn to_map(&mut self) -> Result<()> {
        self.input(Input::Begin);
        self.expect_screen(Screen::Intro)?;
        self.finish_dialogue()?;
        self.expect_screen(Screen::Map)
    }

    pub fn talk_to_guide(&mut self) -> Result<()> {
        let guide = self.game.content().guide.id.clone();
        self.input(Input::EnterZone(guide));
        self.expect_screen(Screen::Dialogue)?;
        self.finish_dialogue()?;
        ensure!(self.game.progress().guide_seen, "guide was not marked as seen");
        Ok(())
    }

    /// Display position of the correct answer to the question on screen.
    pub fn correct_position(&self) -> Result<usize> {
        let quiz = self
            .game
            .active_question()
            .context("no question on screen")?;
        let id = quiz
            .card()
            .correct_option()
            .context("question without a correct option")?
            .id;
        quiz.position_of(id).context("correct option not displayed")
    }

    pub fn wrong_position(&self) -> Result<usize> {
        Ok(usize::from(self.correct_position()? == 0))
    }

    pub fn clear_zone(&mut self, zone: &ZoneId) -> Result<()> {
        self.input(Input::EnterZone(zone.clone()));
        self.expect_screen(Screen::Dialogue)
            .with_context(|| format!("entering {zone}"))?;
        self.finish_dialogue()?;
        self.expect_screen(Screen::Quiz)?;
        let position = self.correct_position()?;
        self.input(Input::SelectOption(position));
        let delay = self.game.config().timing.quiz_success_delay_ms;
        self.tick(delay);
        self.expect_screen(Screen::Map)?;
        ensure!(
            self.game.progress().is_completed(zone),
            "{zone} not completed after a correct answer"
        );
        Ok(())
    }

    pub fn clear_all_zones(&mut self) -> Result<()> {
        self.to_map()?;
        self.talk_to_guide()?;
        let order = self.game.content().zone_order.clone();
        for zone in &order {
            self.clear_zone(zone)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn boss_phase(&self) -> Option<BossPhase> {
        self.game.boss().map(biovilla_game::BossSession::phase)
    }

    /// Enter the danger zone and talk through the boss intro.
    pub fn face_boss(&mut self) -> Result<()> {
        let danger = self.game.content().danger_zone.clone();
        self.input(Input::EnterZone(danger));
        self.expect_screen(Screen::Boss)?;
        for _ in 0..MAX_DIALOGUE_STEPS {
            if self.boss_phase() != Some(BossPhase::Intro) {
                break;
            }
            self.input(Input::Advance);
        }
        ensure!(
            matches!(self.boss_phase(), Some(BossPhase::Question { index: 0 })),
            "boss did not open with its first question: {:?}",
            self.boss_phase()
        );
        Ok(())
    }

    /// Answer every boss question correctly and wait for the victory screen.
    pub fn defeat_boss(&mut self) -> Result<()> {
        let timing = self.game.config().timing.clone();
        for _ in 0..=self.game.content().boss.questions.len() {
            match self.boss_phase() {
                Some(BossPhase::Question { .. }) => {
                    let position = self.correct_position()?;
                    self.input(Input::SelectOption(position));
                    self.tick(timing.boss_hit_delay_ms);
                }
                Some(BossPhase::Cutscene { .. }) => self.tick(timing.boss_cutscene_ms),
                _ => break,
            }
            if matches!(self.boss_phase(), Some(BossPhase::Cutscene { .. })) {
                self.tick(timing.boss_cutscene_ms);
            }
        }
        ensure!(
            self.boss_phase() == Some(BossPhase::Victory),
            "boss still standing: {:?}",
            self.boss_phase()
        );
        let line = self.game.content().boss.victory_line.chars().count();
        let reveal = u64::try_from(line)
            .unwrap_or(u64::MAX)
            .saturating_mul(timing.victory_reveal_ms)
            .saturating_add(timing.victory_pad_ms);
        self.tick(reveal);
        self.expect_screen(Screen::Victory)
    }
}
