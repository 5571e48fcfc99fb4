//! Multiple-choice question engine shared by zone quizzes and boss attacks.
//!
//! Options are shuffled for display but always matched by their stable
//! [`OptionId`]. A session accepts exactly one answer per presentation; any
//! further submission is ignored until the owner calls [`QuizSession::retry`].
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::data::{OptionId, QuestionCard, ZoneId};
use crate::progress::ProgressState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum QuizPhase {
    Presenting,
    Answered { chosen: OptionId, correct: bool },
    Resolved,
    GameOver,
}

/// Outcome of a single accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub chosen: OptionId,
    pub correct: bool,
    pub correct_option: OptionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMark {
    Neutral,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub position: usize,
    pub id: OptionId,
    pub text: String,
    pub enabled: bool,
    pub mark: OptionMark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizView {
    pub icon: String,
    pub title: String,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub feedback: Option<String>,
    pub phase: QuizPhase,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    card: QuestionCard,
    order: Vec<OptionId>,
    phase: QuizPhase,
}

impl QuizSession {
    /// Present `card` with a freshly shuffled option order.
    pub fn present<R: Rng + ?Sized>(card: QuestionCard, rng: &mut R) -> Self {
        let mut order: Vec<OptionId> = card.options.iter().map(|option| option.id).collect();
        order.shuffle(rng);
        Self {
            card,
            order,
            phase: QuizPhase::Presenting,
        }
    }

    #[must_use]
    pub const fn card(&self) -> &QuestionCard {
        &self.card
    }

    #[must_use]
    pub const fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// Display order as option ids.
    #[must_use]
    pub fn order(&self) -> &[OptionId] {
        &self.order
    }

    #[must_use]
    pub const fn accepts_answers(&self) -> bool {
        matches!(self.phase, QuizPhase::Presenting)
    }

    /// Display position of the option with `id`.
    #[must_use]
    pub fn position_of(&self, id: OptionId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Answer with the option shown at `position`.
    ///
    /// Returns `None` when the session is not accepting answers or the
    /// position is out of range.
    pub fn submit(&mut self, position: usize) -> Option<Answer> {
        if !self.accepts_answers() {
            return None;
        }
        let chosen = *self.order.get(position)?;
        let correct_option = self.card.correct_option()?.id;
        let correct = chosen == correct_option;
        self.phase = QuizPhase::Answered { chosen, correct };
        Some(Answer {
            chosen,
            correct,
            correct_option,
        })
    }

    /// Re-enable the same question after a wrong answer. The display order is kept.
    pub fn retry(&mut self) -> bool {
        if matches!(self.phase, QuizPhase::Answered { correct: false, .. }) {
            self.phase = QuizPhase::Presenting;
            true
        } else {
            false
        }
    }

    pub fn resolve(&mut self) {
        self.phase = QuizPhase::Resolved;
    }

    pub fn end_in_game_over(&mut self) {
        self.phase = QuizPhase::GameOver;
    }

    fn mark_for(&self, id: OptionId) -> OptionMark {
        let QuizPhase::Answered { chosen, correct } = self.phase else {
            return OptionMark::Neutral;
        };
        let is_correct = self
            .card
            .option(id)
            .is_some_and(|option| option.correct);
        if id == chosen {
            if correct {
                OptionMark::Correct
            } else {
                OptionMark::Incorrect
            }
        } else if is_correct {
            OptionMark::Correct
        } else {
            OptionMark::Neutral
        }
    }

    /// Snapshot for presentation. Correctness stays hidden until answered.
    #[must_use]
    pub fn view(&self, feedback: Option<&str>) -> QuizView {
        let enabled = self.accepts_answers();
        let options = self
            .order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| {
                let option = self.card.option(*id)?;
                Some(OptionView {
                    position,
                    id: *id,
                    text: option.text.clone(),
                    enabled,
                    mark: self.mark_for(*id),
                })
            })
            .collect();
        QuizView {
            icon: self.card.icon.clone(),
            title: self.card.title.clone(),
            prompt: self.card.prompt.clone(),
            options,
            feedback: feedback.map(str::to_string),
            phase: self.phase,
        }
    }
}

/// What happened to progress after a zone quiz answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Correct { reward: i32 },
    Incorrect { correct: OptionId, game_over: bool },
}

/// A quiz bound to the zone it completes.
#[derive(Debug, Clone)]
pub struct ZoneQuiz {
    zone: ZoneId,
    reward: i32,
    session: QuizSession,
}

impl ZoneQuiz {
    #[must_use]
    pub const fn new(zone: ZoneId, reward: i32, session: QuizSession) -> Self {
        Self {
            zone,
            reward,
            session,
        }
    }

    #[must_use]
    pub const fn zone(&self) -> &ZoneId {
        &self.zone
    }

    #[must_use]
    pub const fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// Answer and apply the reward or life penalty.
    pub fn submit(&mut self, position: usize, progress: &mut ProgressState) -> SubmitOutcome {
        let Some(answer) = self.session.submit(position) else {
            return SubmitOutcome::Ignored;
        };
        if answer.correct {
            progress.add_resource(self.reward);
            SubmitOutcome::Correct {
                reward: self.reward,
            }
        } else {
            let game_over = progress.lose_life();
            if game_over {
                self.session.end_in_game_over();
            }
            SubmitOutcome::Incorrect {
                correct: answer.correct_option,
                game_over,
            }
        }
    }
}
