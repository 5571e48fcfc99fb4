//! Static game content: dialogue scripts, zone quizzes, the boss gauntlet and
//! map villagers.
//!
//! Content is authored as JSON and validated once at load time. After loading
//! it is immutable and shared behind an `Arc` by the game controller.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::constants::DEFAULT_QUIZ_REWARD;

const DEFAULT_CONTENT_DATA: &str = include_str!("../data/content.json");

/// Stable identifier of a map zone (`"nucleus"`, `"guide"`, `"danger"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    /// Construct an id from a string slice, trimming whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of an answer option, fixed to its authored position when the
/// content is loaded. Display order is shuffled; ids never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(pub usize);

/// One line of a scripted conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: String,
    #[serde(default)]
    pub portrait: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    #[serde(default)]
    pub id: OptionId,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// The presentable part of a question, shared by zone quizzes and boss attacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCard {
    #[serde(default)]
    pub icon: String,
    pub title: String,
    pub prompt: String,
    pub options: Vec<QuizOption>,
    pub feedback_ok: String,
    pub feedback_fail: String,
}

impl QuestionCard {
    fn assign_option_ids(&mut self) {
        for (idx, option) in self.options.iter_mut().enumerate() {
            option.id = OptionId(idx);
        }
    }

    /// The single correct option. Validated content always has one.
    #[must_use]
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|option| option.correct)
    }

    #[must_use]
    pub fn option(&self, id: OptionId) -> Option<&QuizOption> {
        self.options.get(id.0)
    }

    fn validate(&self) -> Result<(), ContentError> {
        if self.options.len() < 2 {
            return Err(ContentError::TooFewOptions {
                question: self.title.clone(),
            });
        }
        match self.options.iter().filter(|option| option.correct).count() {
            0 => Err(ContentError::NoCorrectOption {
                question: self.title.clone(),
            }),
            1 => Ok(()),
            count => Err(ContentError::MultipleCorrectOptions {
                question: self.title.clone(),
                count,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(flatten)]
    pub card: QuestionCard,
    #[serde(default = "default_reward")]
    pub reward: i32,
}

const fn default_reward() -> i32 {
    DEFAULT_QUIZ_REWARD
}

/// A story zone on the map: a conversation followed by one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub label: String,
    #[serde(default)]
    pub background: String,
    pub dialogue: Vec<DialogueLine>,
    pub quiz: Quiz,
}

/// The always-available guide character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideContent {
    pub id: ZoneId,
    pub label: String,
    pub dialogue: Vec<DialogueLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossQuestion {
    #[serde(flatten)]
    pub card: QuestionCard,
    pub damage: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossEncounter {
    pub name: String,
    #[serde(default)]
    pub portrait: String,
    pub hp_total: i32,
    pub intro: Vec<DialogueLine>,
    pub questions: Vec<BossQuestion>,
    pub victory_line: String,
    pub victory_text: String,
}

/// Position on the world map in percent of the world size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

/// A static villager standing on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Villager {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub position: MapPoint,
    pub phrase_interval_ms: u64,
    #[serde(default)]
    pub phrases: Vec<String>,
}

/// Errors raised when authored content violates its invariants.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question '{question}' needs at least two options")]
    TooFewOptions { question: String },
    #[error("question '{question}' has no correct option")]
    NoCorrectOption { question: String },
    #[error("question '{question}' has {count} correct options (expected exactly one)")]
    MultipleCorrectOptions { question: String, count: usize },
    #[error("zone order is empty")]
    EmptyZoneOrder,
    #[error("zone order references undefined zone '{0}'")]
    UnknownZoneInOrder(ZoneId),
    #[error("zone '{0}' is defined more than once")]
    DuplicateZone(ZoneId),
    #[error("zone id '{0}' is reserved for the guide or the danger zone")]
    ReservedZoneId(ZoneId),
    #[error("boss must start with positive hit points (got {0})")]
    BossWithoutHp(i32),
    #[error("boss question '{question}' must deal positive damage (got {damage})")]
    NonPositiveDamage { question: String, damage: i32 },
    #[error("villager '{0}' is defined more than once")]
    DuplicateVillager(String),
    #[error("villager '{0}' has phrases but a zero chatter interval")]
    ZeroChatterInterval(String),
}

/// Container for all static content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameContent {
    pub intro: Vec<DialogueLine>,
    pub guide: GuideContent,
    pub zone_order: Vec<ZoneId>,
    pub danger_zone: ZoneId,
    pub zones: Vec<Zone>,
    pub boss: BossEncounter,
    #[serde(default)]
    pub villagers: Vec<Villager>,
}

impl GameContent {
    /// Parse, number and validate content from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates a content invariant.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let mut content: Self = serde_json::from_str(json)?;
        content.assign_option_ids();
        content.validate()?;
        Ok(content)
    }

    /// Load the content shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded content fails validation.
    pub fn embedded() -> Result<Self, ContentError> {
        Self::from_json(DEFAULT_CONTENT_DATA)
    }

    fn assign_option_ids(&mut self) {
        for zone in &mut self.zones {
            zone.quiz.card.assign_option_ids();
        }
        for question in &mut self.boss.questions {
            question.card.assign_option_ids();
        }
    }

    /// Check every content invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if zone.id == self.guide.id || zone.id == self.danger_zone {
                return Err(ContentError::ReservedZoneId(zone.id.clone()));
            }
            if !seen.insert(&zone.id) {
                return Err(ContentError::DuplicateZone(zone.id.clone()));
            }
            zone.quiz.card.validate()?;
        }
        if self.guide.id == self.danger_zone {
            return Err(ContentError::ReservedZoneId(self.danger_zone.clone()));
        }
        if self.zone_order.is_empty() {
            return Err(ContentError::EmptyZoneOrder);
        }
        if let Some(missing) = self.zone_order.iter().find(|id| !seen.contains(id)) {
            return Err(ContentError::UnknownZoneInOrder(missing.clone()));
        }

        if self.boss.hp_total <= 0 {
            return Err(ContentError::BossWithoutHp(self.boss.hp_total));
        }
        for question in &self.boss.questions {
            question.card.validate()?;
            if question.damage <= 0 {
                return Err(ContentError::NonPositiveDamage {
                    question: question.card.title.clone(),
                    damage: question.damage,
                });
            }
        }

        let mut villagers = HashSet::new();
        for villager in &self.villagers {
            if !villagers.insert(villager.id.as_str()) {
                return Err(ContentError::DuplicateVillager(villager.id.clone()));
            }
            if villager.phrase_interval_ms == 0 && !villager.phrases.is_empty() {
                return Err(ContentError::ZeroChatterInterval(villager.id.clone()));
            }
        }
        Ok(())
    }

    /// Look up a story zone. Unknown ids yield `None`, never a panic.
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| &zone.id == id)
    }

    #[must_use]
    pub fn villager(&self, id: &str) -> Option<&Villager> {
        self.villagers.iter().find(|villager| villager.id == id)
    }

    /// Display label for any addressable zone, including the guide and danger zone.
    #[must_use]
    pub fn label_for(&self, id: &ZoneId) -> String {
        if id == &self.guide.id {
            return self.guide.label.clone();
        }
        if id == &self.danger_zone {
            return self.boss.name.clone();
        }
        self.zone(id)
            .map_or_else(|| id.to_string(), |zone| zone.label.clone())
    }
}
