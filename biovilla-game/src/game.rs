//! The game controller: single owner of every piece of session state.
//!
//! Hosts feed [`Input`]s, advance time with [`Game::tick`], step the map
//! inertia with [`Game::animation_frame`] and read back [`Game::view`] plus
//! the [`GameEvent`]s accumulated since the last [`Game::drain_events`].
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::boss::{BossPhase, BossSession, BossStep, BossSubmit, BossView};
use crate::config::GameConfig;
use crate::constants::MSG_DANGER_UNLOCKED;
use crate::data::{DialogueLine, GameContent, QuestionCard, ZoneId};
use crate::dialogue::{DialogueContext, DialoguePlayer, DialogueStep, DialogueView};
use crate::progress::{LockReason, ProgressState, UnlockPolicy, ZoneContext, ZoneStatus};
use crate::quiz::{QuizSession, QuizView, SubmitOutcome, ZoneQuiz};
use crate::scheduler::{Scheduler, SessionToken};
use crate::screen::{Screen, ScreenNavigator};
use crate::typewriter::{RevealStep, Typewriter};
use crate::viewport::{Gesture, GestureOutcome, MapTarget, Transform, Viewport};
use crate::villagers::{VillagerBoard, VillagerView};

/// Player and host input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input", content = "value", rename_all = "snake_case")]
pub enum Input {
    /// Start a new game from the title screen.
    Begin,
    /// Continue to the next dialogue line.
    Advance,
    /// Pick the answer shown at this display position.
    SelectOption(usize),
    EnterZone(ZoneId),
    Gesture(Gesture),
    ZoomButton(f64),
    ResetView,
    TapVillager(String),
    /// Return to the title screen after a victory.
    Restart,
}

/// Something observable that happened inside the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ScreenChanged { from: Screen, to: Screen },
    GuideSeen,
    ZoneEntered { zone: ZoneId },
    Advisory { message: String },
    AnswerAccepted { correct: bool },
    ResourceChanged { resource: i32 },
    ZoneCompleted { zone: ZoneId, reward: i32 },
    ZoneUnlocked { zone: ZoneId },
    LifeLost { lives: u32 },
    GameOver,
    BossStarted,
    BossDamaged { hp: i32 },
    BossCutscene,
    BossDefeated,
    Victory,
    VillagerSpoke { villager: String, phrase: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealTarget {
    Dialogue,
    BossIntro,
    Feedback,
    VictoryLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Timer {
    Reveal {
        target: RevealTarget,
        generation: u64,
    },
    QuizSuccess,
    QuizRetry,
    BossFeedback,
    BossCutscene,
    ShowVictory,
    AdvisoryExpire(u64),
    UnlockNotice(ZoneId),
    ResourceNotice {
        have: i32,
        need: i32,
    },
    BubbleExpire {
        villager: String,
        generation: u64,
    },
    VillagerChatter(String),
}

impl Timer {
    /// Session-scoped timers die with the dialogue, quiz or encounter that
    /// scheduled them. The rest belong to the map and outlive sessions.
    const fn is_session_scoped(&self) -> bool {
        matches!(
            self,
            Self::Reveal { .. }
                | Self::QuizSuccess
                | Self::QuizRetry
                | Self::BossFeedback
                | Self::BossCutscene
                | Self::ShowVictory
        )
    }

    const fn is_map_notice(&self) -> bool {
        matches!(
            self,
            Self::AdvisoryExpire(_) | Self::UnlockNotice(_) | Self::ResourceNotice { .. }
        )
    }

    const fn is_villager(&self) -> bool {
        matches!(self, Self::BubbleExpire { .. } | Self::VillagerChatter(_))
    }
}

/// Token for timers that are not tied to a session. Sessions start above it.
const AMBIENT: SessionToken = SessionToken::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudView {
    pub resource: i32,
    pub resource_max: i32,
    pub lives: u32,
    pub lives_max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneMarker {
    pub id: ZoneId,
    pub label: String,
    pub status: ZoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub guide_seen: bool,
    pub zones: Vec<ZoneMarker>,
    pub villagers: Vec<VillagerView>,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VictoryView {
    pub line: String,
    pub text: String,
}

/// Serializable snapshot of everything a UI needs to draw the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    pub screen: Screen,
    pub hud: HudView,
    pub dialogue: Option<DialogueView>,
    pub quiz: Option<QuizView>,
    pub boss: Option<BossView>,
    pub victory: Option<VictoryView>,
    pub map: Option<MapView>,
    pub advisory: Option<String>,
}

#[derive(Debug, Clone)]
struct Advisory {
    message: String,
    generation: u64,
}

#[derive(Debug)]
pub struct Game {
    content: Arc<GameContent>,
    config: GameConfig,
    progress: ProgressState,
    navigator: ScreenNavigator,
    dialogue: Option<DialoguePlayer>,
    quiz: Option<ZoneQuiz>,
    boss: Option<BossSession>,
    feedback: Typewriter,
    victory_line: Typewriter,
    viewport: Viewport,
    villagers: VillagerBoard,
    villagers_started: bool,
    scheduler: Scheduler<Timer>,
    session: SessionToken,
    advisory: Option<Advisory>,
    advisory_generation: u64,
    rng: ChaCha20Rng,
    events: Vec<GameEvent>,
}

impl Game {
    #[must_use]
    pub fn new(content: Arc<GameContent>, config: GameConfig, seed: u64) -> Self {
        let progress = ProgressState::new(UnlockPolicy::from_content(&content), &config.progress);
        let viewport = Viewport::new(&config.viewport);
        let villagers = VillagerBoard::new(&content.villagers);
        Self {
            content,
            config,
            progress,
            navigator: ScreenNavigator::new(),
            dialogue: None,
            quiz: None,
            boss: None,
            feedback: Typewriter::default(),
            victory_line: Typewriter::default(),
            viewport,
            villagers,
            villagers_started: false,
            scheduler: Scheduler::new(),
            session: AMBIENT.next(),
            advisory: None,
            advisory_generation: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn content(&self) -> &GameContent {
        &self.content
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressState {
        &self.progress
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.navigator.current()
    }

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub const fn session(&self) -> SessionToken {
        self.session
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    #[must_use]
    pub const fn dialogue(&self) -> Option<&DialoguePlayer> {
        self.dialogue.as_ref()
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref().map(ZoneQuiz::session)
    }

    #[must_use]
    pub const fn boss(&self) -> Option<&BossSession> {
        self.boss.as_ref()
    }

    /// Question currently on screen, from a zone quiz or the boss.
    #[must_use]
    pub fn active_question(&self) -> Option<&QuizSession> {
        match self.screen() {
            Screen::Quiz => self.quiz(),
            Screen::Boss => self.boss.as_ref().and_then(BossSession::quiz),
            _ => None,
        }
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // Input ----------------------------------------------------------------

    pub fn handle(&mut self, input: Input) {
        let screen = self.screen();
        match input {
            Input::Begin => self.begin(),
            Input::Advance => self.advance(),
            Input::SelectOption(position) => match screen {
                Screen::Quiz => self.answer_quiz(position),
                Screen::Boss => self.answer_boss(position),
                _ => log::debug!("option {position} ignored on {screen}"),
            },
            Input::EnterZone(zone) => self.enter_zone(&zone),
            Input::Gesture(gesture) => {
                let now = self.now_ms();
                if let GestureOutcome::Tap(target) = self.viewport.handle(gesture, now) {
                    self.activate_target(target);
                }
            }
            Input::ZoomButton(delta) => {
                if screen == Screen::Map {
                    self.viewport.zoom_step(delta);
                }
            }
            Input::ResetView => {
                if screen == Screen::Map {
                    self.viewport.reset_view();
                }
            }
            Input::TapVillager(id) => {
                if screen == Screen::Map {
                    self.villager_speak(&id);
                } else {
                    log::debug!("villager {id} tapped off-map");
                }
            }
            Input::Restart => self.restart(),
        }
    }

    fn activate_target(&mut self, target: MapTarget) {
        match target {
            MapTarget::Zone(zone) => self.enter_zone(&zone),
            MapTarget::Villager(id) => self.villager_speak(&id),
        }
    }

    fn begin(&mut self) {
        if self.screen() != Screen::Start {
            log::debug!("begin ignored on {}", self.screen());
            return;
        }
        if !self.navigate(Screen::Intro) {
            return;
        }
        let lines = self.content.intro.clone();
        let interval = self.config.timing.intro_reveal_ms;
        self.start_dialogue(lines, DialogueContext::Intro, interval);
    }

    fn advance(&mut self) {
        match self.screen() {
            Screen::Intro | Screen::Dialogue => {
                let Some(player) = self.dialogue.as_mut() else {
                    return;
                };
                match player.advance() {
                    DialogueStep::Line(_) => self.schedule_reveal(RevealTarget::Dialogue),
                    DialogueStep::Complete(context) => self.finish_dialogue(context),
                }
            }
            Screen::Boss => {
                let Some(boss) = self.boss.as_mut() else {
                    return;
                };
                let step = boss.advance_intro(&mut self.progress, &mut self.rng);
                self.apply_boss_step(step);
            }
            other => log::debug!("advance ignored on {other}"),
        }
    }

    fn enter_zone(&mut self, zone: &ZoneId) {
        if self.screen() != Screen::Map {
            log::debug!("zone {zone} ignored on {}", self.screen());
            return;
        }
        let is_guide = zone == &self.content.guide.id;
        let is_danger = zone == &self.content.danger_zone;
        if !is_guide && !is_danger && self.content.zone(zone).is_none() {
            log::debug!("unknown zone {zone}");
            return;
        }
        if let Some(reason) = self.progress.lock_reason(zone) {
            log::debug!("zone {zone} locked: {reason:?}");
            let message = reason.message(&self.content);
            self.show_advisory(message);
            return;
        }
        if is_danger {
            self.start_boss();
            return;
        }
        let (lines, context) = if is_guide {
            (self.content.guide.dialogue.clone(), ZoneContext::Guide)
        } else {
            let Some(data) = self.content.zone(zone) else {
                return;
            };
            (data.dialogue.clone(), ZoneContext::Zone(zone.clone()))
        };
        if !self.navigate(Screen::Dialogue) {
            return;
        }
        self.events.push(GameEvent::ZoneEntered { zone: zone.clone() });
        let dialogue_context = match &context {
            ZoneContext::Guide => DialogueContext::Guide,
            ZoneContext::Zone(id) => DialogueContext::Zone(id.clone()),
        };
        self.progress.current_zone = Some(context);
        let interval = self.config.timing.dialogue_reveal_ms;
        self.start_dialogue(lines, dialogue_context, interval);
    }

    fn answer_quiz(&mut self, position: usize) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };
        let outcome = quiz.submit(position, &mut self.progress);
        let card = quiz.session().card().clone();
        match outcome {
            SubmitOutcome::Ignored => log::debug!("quiz answer {position} ignored"),
            SubmitOutcome::Correct { .. } => {
                self.events.push(GameEvent::AnswerAccepted { correct: true });
                self.events.push(GameEvent::ResourceChanged {
                    resource: self.progress.resource,
                });
                self.show_feedback(&card.feedback_ok);
                let delay = self.config.timing.quiz_success_delay_ms;
                self.schedule_session(delay, Timer::QuizSuccess);
            }
            SubmitOutcome::Incorrect { game_over, .. } => {
                self.events.push(GameEvent::AnswerAccepted { correct: false });
                self.events.push(GameEvent::LifeLost {
                    lives: self.progress.lives,
                });
                if game_over {
                    self.game_over();
                    return;
                }
                self.show_feedback(&card.feedback_fail);
                let delay = self.config.timing.quiz_retry_delay_ms;
                self.schedule_session(delay, Timer::QuizRetry);
            }
        }
    }

    fn answer_boss(&mut self, position: usize) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let outcome = boss.submit(position, &mut self.progress);
        let card = boss.current_question().map(|question| question.card.clone());
        self.apply_boss_submit(outcome, card.as_ref());
    }

    fn apply_boss_submit(&mut self, outcome: BossSubmit, card: Option<&QuestionCard>) {
        match outcome {
            BossSubmit::Ignored => log::debug!("boss answer ignored"),
            BossSubmit::Hit { hp_left, .. } => {
                self.events.push(GameEvent::AnswerAccepted { correct: true });
                self.events.push(GameEvent::BossDamaged { hp: hp_left });
                self.events.push(GameEvent::ResourceChanged {
                    resource: self.progress.resource,
                });
                if let Some(card) = card {
                    self.show_feedback(&card.feedback_ok);
                }
                let delay = self.config.timing.boss_hit_delay_ms;
                self.schedule_session(delay, Timer::BossFeedback);
            }
            BossSubmit::Miss { game_over, .. } => {
                self.events.push(GameEvent::AnswerAccepted { correct: false });
                self.events.push(GameEvent::LifeLost {
                    lives: self.progress.lives,
                });
                if game_over {
                    self.game_over();
                    return;
                }
                if let Some(card) = card {
                    self.show_feedback(&card.feedback_fail);
                }
                let delay = self.config.timing.boss_miss_delay_ms;
                self.schedule_session(delay, Timer::BossFeedback);
            }
        }
    }

    fn restart(&mut self) {
        if self.screen() != Screen::Victory {
            log::debug!("restart ignored on {}", self.screen());
            return;
        }
        if self.navigate(Screen::Start) {
            self.reset_session_state();
        }
    }

    // Flow -------------------------------------------------------------------

    fn navigate(&mut self, next: Screen) -> bool {
        match self.navigator.go(next) {
            Ok(from) => {
                self.viewport.set_active(next == Screen::Map);
                self.events.push(GameEvent::ScreenChanged { from, to: next });
                true
            }
            Err(_) => false,
        }
    }

    /// Cancel everything the previous session scheduled and open a new one.
    fn begin_session(&mut self) {
        let dropped = self.scheduler.cancel_session(self.session);
        if dropped > 0 {
            log::debug!("{} cancelled {dropped} pending task(s)", self.session);
        }
        self.session = self.session.next();
        self.feedback.clear();
    }

    fn schedule_session(&mut self, delay_ms: u64, timer: Timer) {
        self.scheduler.schedule(delay_ms, self.session, timer);
    }

    fn start_dialogue(
        &mut self,
        lines: Vec<DialogueLine>,
        context: DialogueContext,
        interval_ms: u64,
    ) {
        self.begin_session();
        let player = DialoguePlayer::start(lines, context.clone(), interval_ms);
        let empty = player.is_empty();
        self.dialogue = Some(player);
        if empty {
            self.finish_dialogue(context);
        } else {
            self.schedule_reveal(RevealTarget::Dialogue);
        }
    }

    fn finish_dialogue(&mut self, context: DialogueContext) {
        self.dialogue = None;
        match context {
            DialogueContext::Intro => {
                if self.navigate(Screen::Map) {
                    self.viewport.reset_view();
                    self.start_villagers();
                }
            }
            DialogueContext::Guide => {
                self.progress.current_zone = None;
                if self.progress.mark_guide_seen() {
                    self.events.push(GameEvent::GuideSeen);
                    let guide = self.content.guide.id.clone();
                    if let Some(next) = self.progress.next_zone_after(&guide) {
                        self.schedule_unlock_notice(next);
                    }
                }
                self.navigate(Screen::Map);
            }
            DialogueContext::Zone(zone) => {
                if self.progress.is_completed(&zone) {
                    self.progress.current_zone = None;
                    self.navigate(Screen::Map);
                } else {
                    self.start_quiz(&zone);
                }
            }
            DialogueContext::BossIntro => {}
        }
    }

    fn start_quiz(&mut self, zone: &ZoneId) {
        let Some(data) = self.content.zone(zone) else {
            log::debug!("no quiz for {zone}");
            self.navigate(Screen::Map);
            return;
        };
        let card = data.quiz.card.clone();
        let reward = data.quiz.reward;
        if !self.navigate(Screen::Quiz) {
            return;
        }
        self.begin_session();
        let session = QuizSession::present(card, &mut self.rng);
        self.quiz = Some(ZoneQuiz::new(zone.clone(), reward, session));
    }

    fn complete_quiz(&mut self) {
        let Some(mut quiz) = self.quiz.take() else {
            return;
        };
        quiz.session_mut().resolve();
        let zone = quiz.zone().clone();
        self.progress.current_zone = None;
        if self.progress.complete_zone(&zone) {
            log::info!("zone {zone} completed");
            let reward = self
                .content
                .zone(&zone)
                .map_or(0, |data| data.quiz.reward);
            self.events.push(GameEvent::ZoneCompleted {
                zone: zone.clone(),
                reward,
            });
            if let Some(next) = self.progress.next_zone_after(&zone) {
                match self.progress.lock_reason(&next) {
                    None => self.schedule_unlock_notice(next),
                    Some(LockReason::ResourceShort { have, need }) => {
                        self.schedule_notice(Timer::ResourceNotice { have, need });
                    }
                    Some(_) => {}
                }
            }
        }
        self.begin_session();
        self.navigate(Screen::Map);
    }

    fn start_boss(&mut self) {
        if !self.navigate(Screen::Boss) {
            return;
        }
        self.begin_session();
        self.events.push(GameEvent::BossStarted);
        let boss = BossSession::start(
            &self.content.boss,
            &mut self.progress,
            self.config.timing.boss_reveal_ms,
            self.config.progress.boss_hit_bonus,
        );
        let empty = boss.intro_is_empty();
        self.boss = Some(boss);
        if empty {
            let step = match self.boss.as_mut() {
                Some(boss) => boss.begin_questions(&mut self.progress, &mut self.rng),
                None => BossStep::Ignored,
            };
            self.apply_boss_step(step);
        } else {
            self.schedule_reveal(RevealTarget::BossIntro);
        }
    }

    fn apply_boss_step(&mut self, step: BossStep) {
        match step {
            BossStep::Ignored => {}
            BossStep::IntroLine(_) => self.schedule_reveal(RevealTarget::BossIntro),
            BossStep::Question(index) => {
                self.feedback.clear();
                log::debug!("boss question {index}");
            }
            BossStep::Cutscene { next } => {
                self.feedback.clear();
                log::debug!("boss cutscene before question {next}");
                self.events.push(GameEvent::BossCutscene);
                let delay = self.config.timing.boss_cutscene_ms;
                self.schedule_session(delay, Timer::BossCutscene);
            }
            BossStep::Victory => self.start_victory(),
        }
    }

    fn start_victory(&mut self) {
        log::info!("boss defeated");
        self.events.push(GameEvent::BossDefeated);
        self.feedback.clear();
        let line = self.content.boss.victory_line.clone();
        self.victory_line.restart(&line, self.config.timing.victory_reveal_ms);
        self.schedule_reveal(RevealTarget::VictoryLine);
        let delay = self
            .victory_line
            .full_duration_ms()
            .saturating_add(self.config.timing.victory_pad_ms);
        self.schedule_session(delay, Timer::ShowVictory);
    }

    fn show_victory(&mut self) {
        if self.navigate(Screen::Victory) {
            log::info!("victory");
            self.boss = None;
            self.events.push(GameEvent::Victory);
        }
    }

    /// Zero lives: wipe progress and return to the title screen.
    fn game_over(&mut self) {
        if !self.navigate(Screen::Start) {
            return;
        }
        log::info!("game over");
        self.events.push(GameEvent::GameOver);
        self.reset_session_state();
    }

    fn reset_session_state(&mut self) {
        self.begin_session();
        self.progress.reset();
        self.dialogue = None;
        self.quiz = None;
        self.boss = None;
        self.victory_line.clear();
        self.scheduler.cancel_where(|timer| timer.is_map_notice() || timer.is_villager());
        self.advisory = None;
        self.villagers.clear_bubbles();
        self.villagers_started = false;
    }

    // Map notices and villagers ---------------------------------------------

    fn show_advisory(&mut self, message: String) {
        self.advisory_generation = self.advisory_generation.wrapping_add(1);
        let generation = self.advisory_generation;
        self.events.push(GameEvent::Advisory {
            message: message.clone(),
        });
        self.advisory = Some(Advisory {
            message,
            generation,
        });
        let delay = self.config.timing.advisory_ms;
        self.scheduler.schedule(delay, AMBIENT, Timer::AdvisoryExpire(generation));
    }

    fn schedule_unlock_notice(&mut self, zone: ZoneId) {
        self.schedule_notice(Timer::UnlockNotice(zone));
    }

    fn schedule_notice(&mut self, notice: Timer) {
        let delay = self.config.timing.unlock_notice_delay_ms;
        self.scheduler.schedule(delay, AMBIENT, notice);
    }

    fn unlock_notice(&mut self, zone: ZoneId) {
        let message = if zone == self.content.danger_zone {
            MSG_DANGER_UNLOCKED.to_string()
        } else {
            format!("{} unlocked!", self.content.label_for(&zone))
        };
        self.events.push(GameEvent::ZoneUnlocked { zone });
        self.show_advisory(message);
    }

    fn start_villagers(&mut self) {
        if self.villagers_started {
            return;
        }
        self.villagers_started = true;
        let jitter = self.config.timing.villager_chatter_jitter_ms;
        let ids: Vec<String> = self.villagers.talkative().map(str::to_string).collect();
        for id in ids {
            if let Some(delay) = self.villagers.chatter_delay(&id, jitter, &mut self.rng) {
                self.scheduler.schedule(delay, AMBIENT, Timer::VillagerChatter(id));
            }
        }
    }

    fn villager_speak(&mut self, id: &str) {
        let Some(speech) = self.villagers.speak(id) else {
            log::debug!("villager {id} has nothing to say");
            return;
        };
        let delay = self.config.timing.villager_bubble_ms;
        self.scheduler.schedule(
            delay,
            AMBIENT,
            Timer::BubbleExpire {
                villager: speech.villager.clone(),
                generation: speech.generation,
            },
        );
        self.events.push(GameEvent::VillagerSpoke {
            villager: speech.villager,
            phrase: speech.phrase,
        });
    }

    // Time -------------------------------------------------------------------

    /// Advance the clock by `elapsed_ms`, firing every timer that comes due.
    pub fn tick(&mut self, elapsed_ms: u64) {
        let deadline = self.scheduler.now().saturating_add(elapsed_ms);
        while let Some(fired) = self.scheduler.pop_due(deadline) {
            if fired.payload.is_session_scoped() && fired.session != self.session {
                log::debug!("dropping stale timer from {}", fired.session);
                continue;
            }
            self.fire(fired.payload);
        }
        self.scheduler.advance_to(deadline);
    }

    /// Step map inertia by one display frame. Returns whether it is still moving.
    pub fn animation_frame(&mut self) -> bool {
        if self.screen() != Screen::Map {
            return false;
        }
        self.viewport.inertia_frame()
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::Reveal { target, generation } => self.reveal_step(target, generation),
            Timer::QuizSuccess => self.complete_quiz(),
            Timer::QuizRetry => {
                if let Some(quiz) = self.quiz.as_mut() {
                    if quiz.session_mut().retry() {
                        self.feedback.clear();
                    }
                }
            }
            Timer::BossFeedback => {
                let step = match self.boss.as_mut() {
                    Some(boss) => boss.feedback_elapsed(&mut self.progress, &mut self.rng),
                    None => BossStep::Ignored,
                };
                self.apply_boss_step(step);
            }
            Timer::BossCutscene => {
                let step = match self.boss.as_mut() {
                    Some(boss) => boss.cutscene_elapsed(&mut self.progress, &mut self.rng),
                    None => BossStep::Ignored,
                };
                self.apply_boss_step(step);
            }
            Timer::ShowVictory => self.show_victory(),
            Timer::AdvisoryExpire(generation) => {
                if self
                    .advisory
                    .as_ref()
                    .is_some_and(|advisory| advisory.generation == generation)
                {
                    self.advisory = None;
                }
            }
            Timer::UnlockNotice(zone) => self.unlock_notice(zone),
            Timer::ResourceNotice { have, need } => {
                self.show_advisory(format!("ATP {have}/{need}. Keep going!"));
            }
            Timer::BubbleExpire {
                villager,
                generation,
            } => {
                self.villagers.expire_bubble(&villager, generation);
            }
            Timer::VillagerChatter(id) => {
                if self.screen() == Screen::Map {
                    self.villager_speak(&id);
                }
                let jitter = self.config.timing.villager_chatter_jitter_ms;
                if let Some(delay) = self.villagers.chatter_delay(&id, jitter, &mut self.rng) {
                    self.scheduler.schedule(delay, AMBIENT, Timer::VillagerChatter(id));
                }
            }
        }
    }

    fn writer_mut(&mut self, target: RevealTarget) -> Option<&mut Typewriter> {
        match target {
            RevealTarget::Dialogue => self.dialogue.as_mut().map(DialoguePlayer::writer_mut),
            RevealTarget::BossIntro => self
                .boss
                .as_mut()
                .map(|boss| boss.intro_mut().writer_mut()),
            RevealTarget::Feedback => Some(&mut self.feedback),
            RevealTarget::VictoryLine => Some(&mut self.victory_line),
        }
    }

    fn schedule_reveal(&mut self, target: RevealTarget) {
        let Some(writer) = self.writer_mut(target) else {
            return;
        };
        if writer.is_done() {
            return;
        }
        let delay = writer.interval_ms();
        let generation = writer.generation();
        self.schedule_session(delay, Timer::Reveal { target, generation });
    }

    fn reveal_step(&mut self, target: RevealTarget, generation: u64) {
        let Some(writer) = self.writer_mut(target) else {
            return;
        };
        if writer.step(generation) == RevealStep::Continue {
            let delay = writer.interval_ms();
            self.schedule_session(delay, Timer::Reveal { target, generation });
        }
    }

    fn show_feedback(&mut self, text: &str) {
        self.feedback.restart(text, self.config.timing.feedback_reveal_ms);
        self.schedule_reveal(RevealTarget::Feedback);
    }

    // View -------------------------------------------------------------------

    fn feedback_text(&self) -> Option<&str> {
        let text = self.feedback.visible();
        (!self.feedback.text().is_empty()).then_some(text)
    }

    #[must_use]
    pub fn view(&self) -> GameView {
        let screen = self.screen();
        let hud = HudView {
            resource: self.progress.resource,
            resource_max: self.progress.resource_max,
            lives: self.progress.lives,
            lives_max: self.progress.lives_max,
        };
        let dialogue = match screen {
            Screen::Intro | Screen::Dialogue => {
                self.dialogue.as_ref().and_then(DialoguePlayer::view)
            }
            _ => None,
        };
        let quiz = match screen {
            Screen::Quiz => self
                .quiz
                .as_ref()
                .map(|quiz| quiz.session().view(self.feedback_text())),
            _ => None,
        };
        let boss = match screen {
            Screen::Boss => self
                .boss
                .as_ref()
                .map(|boss| boss.view(&self.progress, self.feedback_text())),
            _ => None,
        };
        let victory = match screen {
            Screen::Victory => Some(VictoryView {
                line: self.victory_line.visible().to_string(),
                text: self.content.boss.victory_text.clone(),
            }),
            Screen::Boss
                if self
                    .boss
                    .as_ref()
                    .is_some_and(|boss| boss.phase() == BossPhase::Victory) =>
            {
                Some(VictoryView {
                    line: self.victory_line.visible().to_string(),
                    text: String::new(),
                })
            }
            _ => None,
        };
        let map = (screen == Screen::Map).then(|| self.map_view());
        GameView {
            screen,
            hud,
            dialogue,
            quiz,
            boss,
            victory,
            map,
            advisory: self.advisory.as_ref().map(|advisory| advisory.message.clone()),
        }
    }

    fn map_view(&self) -> MapView {
        let guide = &self.content.guide;
        let mut zones = Vec::with_capacity(self.content.zone_order.len() + 2);
        zones.push(ZoneMarker {
            id: guide.id.clone(),
            label: guide.label.clone(),
            status: if self.progress.guide_seen {
                ZoneStatus::Completed
            } else {
                ZoneStatus::Unlocked
            },
        });
        for id in self
            .content
            .zone_order
            .iter()
            .chain(std::iter::once(&self.content.danger_zone))
        {
            zones.push(ZoneMarker {
                id: id.clone(),
                label: self.content.label_for(id),
                status: self.progress.zone_status(id),
            });
        }
        MapView {
            guide_seen: self.progress.guide_seen,
            zones,
            villagers: self.villagers.view(),
            transform: self.viewport.transform(),
        }
    }
}
