//! Character-by-character text reveal.
//!
//! The typewriter holds no timers itself. Its owner schedules one reveal step
//! per interval and passes the typewriter's generation along; restarting bumps
//! the generation so steps scheduled for the previous text are recognised as
//! stale.
use serde::Serialize;

/// Result of applying a scheduled reveal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// The step belonged to an older text and was ignored.
    Stale,
    /// A character was revealed and more remain.
    Continue,
    /// The text is fully visible.
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Typewriter {
    text: String,
    total: usize,
    revealed: usize,
    interval_ms: u64,
    generation: u64,
}

impl Typewriter {
    #[must_use]
    pub fn new(text: &str, interval_ms: u64) -> Self {
        let mut writer = Self::default();
        writer.restart(text, interval_ms);
        writer
    }

    /// Replace the text and start revealing from zero. Returns the new generation.
    pub fn restart(&mut self, text: &str, interval_ms: u64) -> u64 {
        text.clone_into(&mut self.text);
        self.total = text.chars().count();
        self.revealed = 0;
        self.interval_ms = interval_ms;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Reveal one more character. Returns `true` while characters remain.
    pub fn tick(&mut self) -> bool {
        if self.revealed < self.total {
            self.revealed += 1;
        }
        !self.is_done()
    }

    /// Apply a reveal step scheduled for `generation`.
    pub fn step(&mut self, generation: u64) -> RevealStep {
        if generation != self.generation {
            return RevealStep::Stale;
        }
        if self.tick() {
            RevealStep::Continue
        } else {
            RevealStep::Finished
        }
    }

    /// Reveal everything at once.
    pub fn skip(&mut self) {
        self.revealed = self.total;
    }

    /// Drop the text and invalidate pending steps.
    pub fn clear(&mut self) {
        self.restart("", self.interval_ms);
    }

    #[must_use]
    pub fn visible(&self) -> &str {
        let end = self
            .text
            .char_indices()
            .nth(self.revealed)
            .map_or(self.text.len(), |(idx, _)| idx);
        &self.text[..end]
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.revealed >= self.total
    }

    #[must_use]
    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Time needed to reveal the whole text from scratch.
    #[must_use]
    pub fn full_duration_ms(&self) -> u64 {
        u64::try_from(self.total)
            .unwrap_or(u64::MAX)
            .saturating_mul(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_one_character_per_tick() {
        let mut writer = Typewriter::new("abc", 10);
        assert_eq!(writer.visible(), "");
        assert!(writer.tick());
        assert_eq!(writer.visible(), "a");
        assert!(writer.tick());
        assert!(!writer.tick());
        assert_eq!(writer.visible(), "abc");
        assert!(writer.is_done());
        assert!(!writer.tick());
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let mut writer = Typewriter::new("ñá⚡", 5);
        writer.tick();
        writer.tick();
        assert_eq!(writer.visible(), "ñá");
    }

    #[test]
    fn restart_bumps_generation() {
        let mut writer = Typewriter::new("first", 10);
        let before = writer.generation();
        writer.tick();
        let after = writer.restart("second", 20);
        assert_ne!(before, after);
        assert_eq!(writer.visible(), "");
        assert_eq!(writer.text(), "second");
        assert_eq!(writer.interval_ms(), 20);
    }

    #[test]
    fn steps_for_an_old_generation_are_stale() {
        let mut writer = Typewriter::new("ab", 10);
        let old = writer.generation();
        let new = writer.restart("xy", 10);
        assert_eq!(writer.step(old), RevealStep::Stale);
        assert_eq!(writer.visible(), "");
        assert_eq!(writer.step(new), RevealStep::Continue);
        assert_eq!(writer.step(new), RevealStep::Finished);
        assert_eq!(writer.visible(), "xy");
    }

    #[test]
    fn skip_reveals_everything() {
        let mut writer = Typewriter::new("hello", 10);
        writer.skip();
        assert!(writer.is_done());
        assert_eq!(writer.visible(), "hello");
    }

    #[test]
    fn empty_text_is_done_immediately() {
        let writer = Typewriter::new("", 10);
        assert!(writer.is_done());
        assert_eq!(writer.full_duration_ms(), 0);
    }

    #[test]
    fn full_duration_scales_with_length() {
        assert_eq!(Typewriter::new("abcd", 20).full_duration_ms(), 80);
    }
}
