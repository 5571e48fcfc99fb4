//! Boss encounter: an intro conversation followed by a gauntlet of questions
//! against a hit-point pool.
//!
//! The session only changes state on input or when its owner reports that a
//! feedback or cutscene delay elapsed. Delays themselves are scheduled by the
//! game controller.
use rand::Rng;
use serde::Serialize;

use crate::data::{BossEncounter, BossQuestion, OptionId};
use crate::dialogue::{DialogueContext, DialoguePlayer, DialogueStep, DialogueView};
use crate::progress::ProgressState;
use crate::quiz::{QuizSession, QuizView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BossPhase {
    Intro,
    Question { index: usize },
    Cutscene { next: usize },
    Victory,
    Defeated,
}

/// What the owner should do after a boss transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossStep {
    Ignored,
    IntroLine(usize),
    Question(usize),
    Cutscene { next: usize },
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossSubmit {
    Ignored,
    Hit { damage: i32, hp_left: i32, bonus: i32 },
    Miss { correct: OptionId, game_over: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BossView {
    pub name: String,
    pub portrait: String,
    pub hp: i32,
    pub hp_total: i32,
    pub enraged: bool,
    pub phase: BossPhase,
    pub intro: Option<DialogueView>,
    pub question: Option<QuizView>,
}

#[derive(Debug, Clone)]
pub struct BossSession {
    name: String,
    portrait: String,
    hp_total: i32,
    hit_bonus: i32,
    intro: DialoguePlayer,
    questions: Vec<BossQuestion>,
    phase: BossPhase,
    quiz: Option<QuizSession>,
    last_correct: Option<bool>,
    cutscene_played: bool,
}

impl BossSession {
    /// Begin the encounter, resetting boss health on `progress`.
    pub fn start(
        encounter: &BossEncounter,
        progress: &mut ProgressState,
        reveal_ms: u64,
        hit_bonus: i32,
    ) -> Self {
        progress.boss_hp = encounter.hp_total;
        progress.boss_phase = 0;
        Self {
            name: encounter.name.clone(),
            portrait: encounter.portrait.clone(),
            hp_total: encounter.hp_total,
            hit_bonus,
            intro: DialoguePlayer::start(
                encounter.intro.clone(),
                DialogueContext::BossIntro,
                reveal_ms,
            ),
            questions: encounter.questions.clone(),
            phase: BossPhase::Intro,
            quiz: None,
            last_correct: None,
            cutscene_played: false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> BossPhase {
        self.phase
    }

    #[must_use]
    pub const fn intro(&self) -> &DialoguePlayer {
        &self.intro
    }

    pub fn intro_mut(&mut self) -> &mut DialoguePlayer {
        &mut self.intro
    }

    #[must_use]
    pub const fn quiz(&self) -> Option<&QuizSession> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&BossQuestion> {
        match self.phase {
            BossPhase::Question { index } => self.questions.get(index),
            _ => None,
        }
    }

    #[must_use]
    pub const fn cutscene_played(&self) -> bool {
        self.cutscene_played
    }

    /// Whether the intro has no lines and questioning can begin right away.
    #[must_use]
    pub fn intro_is_empty(&self) -> bool {
        self.intro.is_empty()
    }

    /// Advance the intro conversation. The last line leads into the first question.
    pub fn advance_intro<R: Rng + ?Sized>(
        &mut self,
        progress: &mut ProgressState,
        rng: &mut R,
    ) -> BossStep {
        if self.phase != BossPhase::Intro {
            return BossStep::Ignored;
        }
        match self.intro.advance() {
            DialogueStep::Line(idx) => BossStep::IntroLine(idx),
            DialogueStep::Complete(_) => self.present(0, progress, rng),
        }
    }

    /// Skip straight to questioning when there is nothing to say.
    pub fn begin_questions<R: Rng + ?Sized>(
        &mut self,
        progress: &mut ProgressState,
        rng: &mut R,
    ) -> BossStep {
        if self.phase != BossPhase::Intro {
            return BossStep::Ignored;
        }
        self.present(0, progress, rng)
    }

    fn present<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        progress: &mut ProgressState,
        rng: &mut R,
    ) -> BossStep {
        let Some(question) = self.questions.get(index) else {
            return self.win();
        };
        self.quiz = Some(QuizSession::present(question.card.clone(), rng));
        self.phase = BossPhase::Question { index };
        self.last_correct = None;
        progress.boss_phase = index;
        BossStep::Question(index)
    }

    fn win(&mut self) -> BossStep {
        self.phase = BossPhase::Victory;
        self.quiz = None;
        BossStep::Victory
    }

    /// Answer the current question with the option at `position`.
    pub fn submit(&mut self, position: usize, progress: &mut ProgressState) -> BossSubmit {
        let BossPhase::Question { index } = self.phase else {
            return BossSubmit::Ignored;
        };
        let Some(damage) = self.questions.get(index).map(|question| question.damage) else {
            return BossSubmit::Ignored;
        };
        let Some(answer) = self.quiz.as_mut().and_then(|quiz| quiz.submit(position)) else {
            return BossSubmit::Ignored;
        };
        self.last_correct = Some(answer.correct);
        if answer.correct {
            progress.boss_hp = progress.boss_hp.saturating_sub(damage).max(0);
            progress.add_resource(self.hit_bonus);
            return BossSubmit::Hit {
                damage,
                hp_left: progress.boss_hp,
                bonus: self.hit_bonus,
            };
        }
        let game_over = progress.lose_life();
        if game_over {
            self.phase = BossPhase::Defeated;
            if let Some(quiz) = self.quiz.as_mut() {
                quiz.end_in_game_over();
            }
        }
        BossSubmit::Miss {
            correct: answer.correct_option,
            game_over,
        }
    }

    /// The feedback delay after an answer elapsed.
    ///
    /// After a hit the boss either falls or the next question (possibly behind
    /// the one-time cutscene) comes up. After a miss the same question is
    /// shown again with a fresh option order.
    pub fn feedback_elapsed<R: Rng + ?Sized>(
        &mut self,
        progress: &mut ProgressState,
        rng: &mut R,
    ) -> BossStep {
        let BossPhase::Question { index } = self.phase else {
            return BossStep::Ignored;
        };
        match self.last_correct.take() {
            Some(true) => {
                if progress.boss_hp <= 0 {
                    return self.win();
                }
                let next = index + 1;
                if next >= self.questions.len() {
                    return self.win();
                }
                let cutscene_at = self.questions.len().saturating_sub(2);
                if next == cutscene_at && next > 0 && !self.cutscene_played {
                    self.cutscene_played = true;
                    self.quiz = None;
                    self.phase = BossPhase::Cutscene { next };
                    return BossStep::Cutscene { next };
                }
                self.present(next, progress, rng)
            }
            Some(false) => self.present(index, progress, rng),
            None => BossStep::Ignored,
        }
    }

    /// The cutscene finished. Resumes questioning exactly once.
    pub fn cutscene_elapsed<R: Rng + ?Sized>(
        &mut self,
        progress: &mut ProgressState,
        rng: &mut R,
    ) -> BossStep {
        match self.phase {
            BossPhase::Cutscene { next } => self.present(next, progress, rng),
            _ => BossStep::Ignored,
        }
    }

    #[must_use]
    pub fn view(&self, progress: &ProgressState, feedback: Option<&str>) -> BossView {
        BossView {
            name: self.name.clone(),
            portrait: self.portrait.clone(),
            hp: progress.boss_hp,
            hp_total: self.hp_total,
            enraged: self.cutscene_played,
            phase: self.phase,
            intro: match self.phase {
                BossPhase::Intro => self.intro.view(),
                _ => None,
            },
            question: self.quiz.as_ref().map(|quiz| quiz.view(feedback)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgressLimits;
    use crate::data::tests::fixture;
    use crate::progress::UnlockPolicy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct Harness {
        boss: BossSession,
        progress: ProgressState,
        rng: ChaCha20Rng,
    }

    impl Harness {
        fn new() -> Self {
            let content = fixture();
            let mut progress = ProgressState::new(
                UnlockPolicy::from_content(&content),
                &ProgressLimits::default(),
            );
            let boss = BossSession::start(&content.boss, &mut progress, 25, 30);
            Self {
                boss,
                progress,
                rng: ChaCha20Rng::seed_from_u64(11),
            }
        }

        fn skip_intro(&mut self) -> BossStep {
            loop {
                match self.boss.advance_intro(&mut self.progress, &mut self.rng) {
                    BossStep::IntroLine(_) => {}
                    other => return other,
                }
            }
        }

        fn position(&self, correct: bool) -> usize {
            let quiz = self.boss.quiz().unwrap();
            let right = quiz.card().correct_option().unwrap().id;
            (0..quiz.order().len())
                .find(|pos| (quiz.order()[*pos] == right) == correct)
                .unwrap()
        }

        fn answer(&mut self, correct: bool) -> BossSubmit {
            let pos = self.position(correct);
            self.boss.submit(pos, &mut self.progress)
        }

        fn feedback(&mut self) -> BossStep {
            self.boss.feedback_elapsed(&mut self.progress, &mut self.rng)
        }

        fn cutscene(&mut self) -> BossStep {
            self.boss.cutscene_elapsed(&mut self.progress, &mut self.rng)
        }
    }

    #[test]
    fn start_resets_health() {
        let h = Harness::new();
        assert_eq!(h.progress.boss_hp, 3);
        assert_eq!(h.progress.boss_phase, 0);
        assert_eq!(h.boss.phase(), BossPhase::Intro);
    }

    #[test]
    fn intro_leads_into_first_question() {
        let mut h = Harness::new();
        assert_eq!(h.skip_intro(), BossStep::Question(0));
        assert_eq!(h.boss.phase(), BossPhase::Question { index: 0 });
    }

    #[test]
    fn three_hits_defeat_the_boss_with_one_cutscene() {
        let mut h = Harness::new();
        h.skip_intro();
        assert!(matches!(h.answer(true), BossSubmit::Hit { hp_left: 2, .. }));
        assert_eq!(h.feedback(), BossStep::Cutscene { next: 1 });
        assert!(h.boss.quiz().is_none());
        assert_eq!(h.cutscene(), BossStep::Question(1));
        assert_eq!(h.cutscene(), BossStep::Ignored);
        assert!(matches!(h.answer(true), BossSubmit::Hit { hp_left: 1, .. }));
        assert_eq!(h.feedback(), BossStep::Question(2));
        assert!(matches!(h.answer(true), BossSubmit::Hit { hp_left: 0, .. }));
        assert_eq!(h.feedback(), BossStep::Victory);
        assert_eq!(h.progress.boss_hp, 0);
        assert_eq!(h.progress.resource, 90);
    }

    #[test]
    fn miss_keeps_health_and_repeats_the_question() {
        let mut h = Harness::new();
        h.skip_intro();
        assert!(matches!(
            h.answer(false),
            BossSubmit::Miss {
                game_over: false,
                ..
            }
        ));
        assert_eq!(h.progress.boss_hp, 3);
        assert_eq!(h.progress.lives, 2);
        assert_eq!(h.answer(true), BossSubmit::Ignored);
        assert_eq!(h.feedback(), BossStep::Question(0));
        assert!(h.boss.quiz().unwrap().accepts_answers());
    }

    #[test]
    fn cutscene_plays_only_once() {
        let mut h = Harness::new();
        h.skip_intro();
        h.answer(true);
        h.feedback();
        h.cutscene();
        h.answer(false);
        assert_eq!(h.feedback(), BossStep::Question(1));
        assert!(h.boss.cutscene_played());
    }

    #[test]
    fn losing_every_life_defeats_the_player() {
        let mut h = Harness::new();
        h.skip_intro();
        h.answer(false);
        h.feedback();
        h.answer(false);
        h.feedback();
        assert!(matches!(
            h.answer(false),
            BossSubmit::Miss {
                game_over: true,
                ..
            }
        ));
        assert_eq!(h.boss.phase(), BossPhase::Defeated);
        assert_eq!(h.feedback(), BossStep::Ignored);
        assert_eq!(h.answer_any(), BossSubmit::Ignored);
    }

    #[test]
    fn running_out_of_questions_is_a_victory() {
        let content = fixture();
        let mut encounter = content.boss.clone();
        encounter.hp_total = 10;
        let mut progress = ProgressState::new(
            UnlockPolicy::from_content(&content),
            &ProgressLimits::default(),
        );
        let mut h = Harness {
            boss: BossSession::start(&encounter, &mut progress, 25, 30),
            progress,
            rng: ChaCha20Rng::seed_from_u64(3),
        };
        h.skip_intro();
        h.answer(true);
        h.feedback();
        h.cutscene();
        h.answer(true);
        h.feedback();
        h.answer(true);
        assert_eq!(h.feedback(), BossStep::Victory);
        assert_eq!(h.progress.boss_hp, 7);
    }

    #[test]
    fn no_cutscene_for_two_question_gauntlets() {
        let content = fixture();
        let mut encounter = content.boss.clone();
        encounter.questions.truncate(2);
        encounter.hp_total = 2;
        let mut progress = ProgressState::new(
            UnlockPolicy::from_content(&content),
            &ProgressLimits::default(),
        );
        let mut h = Harness {
            boss: BossSession::start(&encounter, &mut progress, 25, 30),
            progress,
            rng: ChaCha20Rng::seed_from_u64(3),
        };
        h.skip_intro();
        h.answer(true);
        assert_eq!(h.feedback(), BossStep::Question(1));
        assert!(!h.boss.cutscene_played());
    }

    impl Harness {
        fn answer_any(&mut self) -> BossSubmit {
            self.boss.submit(0, &mut self.progress)
        }
    }
}
