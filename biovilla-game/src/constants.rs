//! Centralized balance, timing and viewport constants for BioVilla game logic.
//!
//! These are the defaults behind [`crate::config::GameConfig`]. Hosts may
//! override them through configuration, but the values here are what the
//! shipped game plays with.

// Progress ----------------------------------------------------------------
pub(crate) const RESOURCE_MAX: i32 = 100;
pub(crate) const LIVES_MAX: u32 = 3;
pub(crate) const DEFAULT_QUIZ_REWARD: i32 = 20;
pub(crate) const BOSS_HIT_BONUS: i32 = 30;

// Timing (milliseconds) ---------------------------------------------------
pub(crate) const INTRO_REVEAL_INTERVAL_MS: u64 = 22;
pub(crate) const DIALOGUE_REVEAL_INTERVAL_MS: u64 = 18;
pub(crate) const BOSS_REVEAL_INTERVAL_MS: u64 = 25;
pub(crate) const FEEDBACK_REVEAL_INTERVAL_MS: u64 = 15;
pub(crate) const VICTORY_REVEAL_INTERVAL_MS: u64 = 20;
pub(crate) const QUIZ_SUCCESS_DELAY_MS: u64 = 2_500;
pub(crate) const QUIZ_RETRY_DELAY_MS: u64 = 3_000;
pub(crate) const BOSS_HIT_DELAY_MS: u64 = 2_800;
pub(crate) const BOSS_MISS_DELAY_MS: u64 = 3_000;
pub(crate) const BOSS_PHASE_CUTSCENE_MS: u64 = 2_500;
pub(crate) const VICTORY_SCREEN_PAD_MS: u64 = 1_000;
pub(crate) const ADVISORY_DISPLAY_MS: u64 = 3_000;
pub(crate) const UNLOCK_NOTICE_DELAY_MS: u64 = 400;
pub(crate) const VILLAGER_BUBBLE_MS: u64 = 3_500;
pub(crate) const VILLAGER_CHATTER_JITTER_MS: u64 = 3_000;

// Viewport ----------------------------------------------------------------
pub(crate) const WORLD_WIDTH: f64 = 1_400.0;
pub(crate) const WORLD_HEIGHT: f64 = 933.0;
pub(crate) const ZOOM_MIN: f64 = 0.5;
pub(crate) const ZOOM_MAX: f64 = 2.5;
pub(crate) const WHEEL_ZOOM_STEP: f64 = 0.12;
pub(crate) const INERTIA_DECAY: f64 = 0.92;
pub(crate) const INERTIA_STOP_SPEED: f64 = 0.3;
pub(crate) const INERTIA_LAUNCH_SPEED: f64 = 1.0;
pub(crate) const TAP_MAX_TRAVEL_PX: f64 = 8.0;
pub(crate) const TAP_MAX_DURATION_MS: u64 = 300;

// Advisory messages ---------------------------------------------------------
pub(crate) const MSG_TALK_TO_GUIDE: &str = "Talk to the guide first.";
pub(crate) const MSG_COMPLETE_ALL_ZONES: &str = "Complete every zone first.";
pub(crate) const MSG_DANGER_UNLOCKED: &str = "DANGER ZONE unlocked! Go face the boss!";
