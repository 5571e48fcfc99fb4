//! Screen navigator: exactly one screen is current and only listed
//! transitions are allowed.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Start,
    Intro,
    Map,
    Dialogue,
    Quiz,
    Boss,
    Victory,
}

impl Screen {
    pub const ALL: [Self; 7] = [
        Self::Start,
        Self::Intro,
        Self::Map,
        Self::Dialogue,
        Self::Quiz,
        Self::Boss,
        Self::Victory,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Intro => "intro",
            Self::Map => "map",
            Self::Dialogue => "dialogue",
            Self::Quiz => "quiz",
            Self::Boss => "boss",
            Self::Victory => "victory",
        }
    }

    /// Screens reachable from `self` in one step.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Start => &[Self::Intro],
            Self::Intro => &[Self::Map],
            Self::Map => &[Self::Dialogue, Self::Boss],
            Self::Dialogue => &[Self::Quiz, Self::Map],
            Self::Quiz => &[Self::Map, Self::Start],
            Self::Boss => &[Self::Victory, Self::Start],
            Self::Victory => &[Self::Start],
        }
    }

    #[must_use]
    pub fn allows(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("transition from {from} to {to} is not allowed")]
    Forbidden { from: Screen, to: Screen },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenNavigator {
    current: Screen,
}

impl ScreenNavigator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Screen::Start,
        }
    }

    #[must_use]
    pub const fn current(&self) -> Screen {
        self.current
    }

    /// Move to `next`, returning the screen that was left.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Forbidden` when the transition is not listed;
    /// the current screen is left unchanged.
    pub fn go(&mut self, next: Screen) -> Result<Screen, NavigationError> {
        let from = self.current;
        if !from.allows(next) {
            log::warn!("rejected screen transition {from} -> {next}");
            return Err(NavigationError::Forbidden { from, to: next });
        }
        log::debug!("screen {from} -> {next}");
        self.current = next;
        Ok(from)
    }
}
