//! Villagers standing on the map: each cycles through its phrases in a speech
//! bubble, on click or on its own chatter interval.
use rand::Rng;
use serde::Serialize;

use crate::data::{MapPoint, Villager};

/// A phrase that just appeared in a bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speech {
    pub villager: String,
    pub phrase: String,
    /// Bubble generation; an expiry scheduled for an older generation is ignored.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VillagerView {
    pub id: String,
    pub name: String,
    pub sprite: String,
    pub position: MapPoint,
    pub bubble: Option<String>,
}

#[derive(Debug, Clone)]
struct VillagerSlot {
    villager: Villager,
    next_phrase: usize,
    bubble: Option<String>,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct VillagerBoard {
    slots: Vec<VillagerSlot>,
}

impl VillagerBoard {
    #[must_use]
    pub fn new(villagers: &[Villager]) -> Self {
        Self {
            slots: villagers
                .iter()
                .cloned()
                .map(|villager| VillagerSlot {
                    villager,
                    next_phrase: 0,
                    bubble: None,
                    generation: 0,
                })
                .collect(),
        }
    }

    fn slot_mut(&mut self, id: &str) -> Option<&mut VillagerSlot> {
        self.slots.iter_mut().find(|slot| slot.villager.id == id)
    }

    /// Ids of villagers that have something to say.
    pub fn talkative(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| !slot.villager.phrases.is_empty())
            .map(|slot| slot.villager.id.as_str())
    }

    /// Show the villager's next phrase, cycling back to the first after the last.
    pub fn speak(&mut self, id: &str) -> Option<Speech> {
        let slot = self.slot_mut(id)?;
        let phrases = &slot.villager.phrases;
        if phrases.is_empty() {
            return None;
        }
        let phrase = phrases[slot.next_phrase % phrases.len()].clone();
        slot.next_phrase = (slot.next_phrase + 1) % phrases.len();
        slot.bubble = Some(phrase.clone());
        slot.generation = slot.generation.wrapping_add(1);
        Some(Speech {
            villager: slot.villager.id.clone(),
            phrase,
            generation: slot.generation,
        })
    }

    /// Hide the bubble if it still belongs to `generation`.
    pub fn expire_bubble(&mut self, id: &str, generation: u64) -> bool {
        match self.slot_mut(id) {
            Some(slot) if slot.generation == generation && slot.bubble.is_some() => {
                slot.bubble = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear_bubbles(&mut self) {
        for slot in &mut self.slots {
            slot.bubble = None;
            slot.generation = slot.generation.wrapping_add(1);
        }
    }

    /// Delay until the villager's next spontaneous phrase: its interval plus
    /// up to `jitter_ms` of random slack, never below 1 ms.
    pub fn chatter_delay<R: Rng + ?Sized>(
        &self,
        id: &str,
        jitter_ms: u64,
        rng: &mut R,
    ) -> Option<u64> {
        let slot = self.slots.iter().find(|slot| slot.villager.id == id)?;
        let slack = if jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..jitter_ms)
        };
        Some(slot.villager.phrase_interval_ms.saturating_add(slack).max(1))
    }

    #[must_use]
    pub fn view(&self) -> Vec<VillagerView> {
        self.slots
            .iter()
            .map(|slot| VillagerView {
                id: slot.villager.id.clone(),
                name: slot.villager.name.clone(),
                sprite: slot.villager.sprite.clone(),
                position: slot.villager.position,
                bubble: slot.bubble.clone(),
            })
            .collect()
    }
}
