//! BioVilla Game Engine
//!
//! Platform-agnostic core of the BioVilla bioenergetics adventure: screen
//! navigation, zone unlocking, dialogue, quizzes, the boss encounter, the map
//! viewport and the timer sequencer that drives them. This crate has no UI or
//! platform dependencies; hosts feed inputs and time and render the views it
//! produces.

pub mod boss;
pub mod config;
pub mod constants;
pub mod data;
pub mod dialogue;
pub mod game;
pub mod progress;
pub mod quiz;
pub mod scheduler;
pub mod screen;
pub mod typewriter;
pub mod viewport;
pub mod villagers;

use std::sync::Arc;

// Re-export commonly used types
pub use boss::{BossPhase, BossSession, BossStep, BossSubmit, BossView};
pub use config::{ConfigError, GameConfig, ProgressLimits, TimingConfig, ViewportConfig};
pub use data::{
    BossEncounter, BossQuestion, ContentError, DialogueLine, GameContent, GuideContent, MapPoint,
    OptionId, QuestionCard, Quiz, QuizOption, Villager, Zone, ZoneId,
};
pub use dialogue::{DialogueContext, DialoguePlayer, DialogueStep, DialogueView};
pub use game::{Game, GameEvent, GameView, HudView, Input, MapView, VictoryView, ZoneMarker};
pub use progress::{LockReason, ProgressState, UnlockPolicy, ZoneContext, ZoneStatus};
pub use quiz::{
    Answer, OptionMark, OptionView, QuizPhase, QuizSession, QuizView, SubmitOutcome, ZoneQuiz,
};
pub use scheduler::{Fired, Scheduler, SessionToken, TaskId};
pub use screen::{NavigationError, Screen, ScreenNavigator};
pub use typewriter::{RevealStep, Typewriter};
pub use viewport::{
    Gesture, GestureOutcome, MapTarget, Point, Size, TouchPoints, Transform, Viewport,
};
pub use villagers::{Speech, VillagerBoard, VillagerView};

/// Trait for abstracting where game content comes from.
/// Platform-specific implementations may read files, fetch over the network
/// or embed the data at compile time.
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the full content set.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read or fails validation.
    fn load_content(&self) -> Result<GameContent, Self::Error>;
}

/// Content compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedContent;

impl ContentLoader for EmbeddedContent {
    type Error = ContentError;

    fn load_content(&self) -> Result<GameContent, Self::Error> {
        GameContent::embedded()
    }
}

/// Content supplied as a JSON string, e.g. read from disk by a host.
#[derive(Debug, Clone)]
pub struct JsonContent {
    json: String,
}

impl JsonContent {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl ContentLoader for JsonContent {
    type Error = ContentError;

    fn load_content(&self) -> Result<GameContent, Self::Error> {
        GameContent::from_json(&self.json)
    }
}

/// Main game engine for creating game instances that share one content set.
#[derive(Debug, Clone)]
pub struct GameEngine {
    content: Arc<GameContent>,
    config: GameConfig,
}

impl GameEngine {
    /// Load content through `loader` once.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if content cannot be loaded.
    pub fn new<L: ContentLoader>(loader: &L, config: GameConfig) -> Result<Self, L::Error> {
        let content = loader.load_content()?;
        Ok(Self {
            content: Arc::new(content),
            config,
        })
    }

    /// Engine over the embedded content and default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded content fails validation.
    pub fn embedded() -> Result<Self, ContentError> {
        Self::new(&EmbeddedContent, GameConfig::default())
    }

    #[must_use]
    pub fn content(&self) -> &GameContent {
        &self.content
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Create a new game on the title screen. The seed fixes option shuffles
    /// and villager chatter timing.
    #[must_use]
    pub fn create_game(&self, seed: u64) -> Game {
        Game::new(Arc::clone(&self.content), self.config.clone(), seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_engine_creates_games_on_the_start_screen() {
        let engine = GameEngine::embedded().unwrap();
        let game = engine.create_game(1);
        assert_eq!(game.screen(), Screen::Start);
        assert_eq!(game.progress().lives, engine.config().progress.lives_max);
        assert_eq!(engine.content().zone_order.len(), 3);
    }

    #[test]
    fn json_loader_reports_validation_errors() {
        let err = GameEngine::new(&JsonContent::new("{}"), GameConfig::default()).unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }

    #[test]
    fn games_share_one_content_set() {
        let engine = GameEngine::embedded().unwrap();
        let a = engine.create_game(1);
        let b = engine.create_game(2);
        assert!(std::ptr::eq(a.content(), b.content()));
    }
}
