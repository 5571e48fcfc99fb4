//! Scripted conversations played one line at a time.
use serde::Serialize;

use crate::data::{DialogueLine, ZoneId};
use crate::typewriter::Typewriter;

/// What a finished conversation leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "zone", rename_all = "snake_case")]
pub enum DialogueContext {
    Intro,
    Guide,
    Zone(ZoneId),
    BossIntro,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueStep {
    /// A new line started at this index.
    Line(usize),
    Complete(DialogueContext),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueView {
    pub speaker: String,
    pub portrait: String,
    pub text: String,
    pub revealing: bool,
    pub line: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct DialoguePlayer {
    lines: Vec<DialogueLine>,
    index: usize,
    writer: Typewriter,
    context: DialogueContext,
}

impl DialoguePlayer {
    /// Start at line 0 with a fresh reveal.
    #[must_use]
    pub fn start(lines: Vec<DialogueLine>, context: DialogueContext, interval_ms: u64) -> Self {
        let first = lines.first().map_or("", |line| line.text.as_str());
        let writer = Typewriter::new(first, interval_ms);
        Self {
            lines,
            index: 0,
            writer,
            context,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &DialogueContext {
        &self.context
    }

    #[must_use]
    pub fn current(&self) -> Option<&DialogueLine> {
        self.lines.get(self.index)
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn writer(&self) -> &Typewriter {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut Typewriter {
        &mut self.writer
    }

    /// Move to the next line, abandoning any reveal still in progress.
    pub fn advance(&mut self) -> DialogueStep {
        let next = self.index + 1;
        match self.lines.get(next) {
            Some(line) => {
                self.index = next;
                self.writer.restart(&line.text, self.writer.interval_ms());
                DialogueStep::Line(next)
            }
            None => {
                self.writer.clear();
                DialogueStep::Complete(self.context.clone())
            }
        }
    }

    #[must_use]
    pub fn view(&self) -> Option<DialogueView> {
        let line = self.current()?;
        Some(DialogueView {
            speaker: line.speaker.clone(),
            portrait: line.portrait.clone(),
            text: self.writer.visible().to_string(),
            revealing: !self.writer.is_done(),
            line: self.index,
            total: self.lines.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typewriter::RevealStep;

    fn lines(texts: &[&str]) -> Vec<DialogueLine> {
        texts
            .iter()
            .map(|text| DialogueLine {
                speaker: "GUIDE".into(),
                portrait: "guide".into(),
                text: (*text).to_string(),
            })
            .collect()
    }

    #[test]
    fn plays_lines_in_order_then_completes() {
        let mut player = DialoguePlayer::start(lines(&["one", "two"]), DialogueContext::Guide, 18);
        assert_eq!(player.current().unwrap().text, "one");
        assert_eq!(player.advance(), DialogueStep::Line(1));
        assert_eq!(player.current().unwrap().text, "two");
        assert_eq!(
            player.advance(),
            DialogueStep::Complete(DialogueContext::Guide)
        );
    }

    #[test]
    fn advancing_mid_reveal_invalidates_old_steps() {
        let mut player = DialoguePlayer::start(lines(&["abc", "xyz"]), DialogueContext::Intro, 22);
        let first_generation = player.writer().generation();
        player.writer_mut().step(first_generation);
        player.advance();
        assert_eq!(
            player.writer_mut().step(first_generation),
            RevealStep::Stale
        );
        let view = player.view().unwrap();
        assert_eq!(view.text, "");
        assert!(view.revealing);
        assert_eq!(view.line, 1);
    }

    #[test]
    fn empty_script_completes_on_first_advance() {
        let zone = ZoneId::new("a");
        let mut player = DialoguePlayer::start(Vec::new(), DialogueContext::Zone(zone.clone()), 18);
        assert!(player.is_empty());
        assert!(player.view().is_none());
        assert_eq!(
            player.advance(),
            DialogueStep::Complete(DialogueContext::Zone(zone))
        );
    }

    #[test]
    fn view_reports_reveal_progress() {
        let mut player = DialoguePlayer::start(lines(&["hi"]), DialogueContext::Guide, 18);
        let generation = player.writer().generation();
        player.writer_mut().step(generation);
        let partial = player.view().unwrap();
        assert_eq!(partial.text, "h");
        assert!(partial.revealing);
        player.writer_mut().step(generation);
        let full = player.view().unwrap();
        assert_eq!(full.text, "hi");
        assert!(!full.revealing);
        assert_eq!(full.speaker, "GUIDE");
        assert_eq!(full.total, 1);
    }
}
