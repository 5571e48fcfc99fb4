//! Session progress: resource counter, lives, completed zones and the unlock
//! policy that gates the map.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::ProgressLimits;
use crate::constants::{MSG_COMPLETE_ALL_ZONES, MSG_TALK_TO_GUIDE};
use crate::data::{GameContent, ZoneId};

/// Where the player currently is while a dialogue or quiz is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "zone", rename_all = "snake_case")]
pub enum ZoneContext {
    Guide,
    Zone(ZoneId),
}

/// Fixed ordering of the story zones plus the two special destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockPolicy {
    order: Vec<ZoneId>,
    guide: ZoneId,
    danger: ZoneId,
}

impl UnlockPolicy {
    #[must_use]
    pub const fn new(order: Vec<ZoneId>, guide: ZoneId, danger: ZoneId) -> Self {
        Self {
            order,
            guide,
            danger,
        }
    }

    #[must_use]
    pub fn from_content(content: &GameContent) -> Self {
        Self::new(
            content.zone_order.clone(),
            content.guide.id.clone(),
            content.danger_zone.clone(),
        )
    }

    #[must_use]
    pub fn order(&self) -> &[ZoneId] {
        &self.order
    }

    #[must_use]
    pub const fn guide(&self) -> &ZoneId {
        &self.guide
    }

    #[must_use]
    pub const fn danger(&self) -> &ZoneId {
        &self.danger
    }

    fn ordinal(&self, zone: &ZoneId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == zone)
    }
}

/// Why a zone cannot be entered yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LockReason {
    GuideNotSeen,
    PreviousIncomplete { previous: ZoneId },
    ZonesIncomplete { missing: Vec<ZoneId> },
    ResourceShort { have: i32, need: i32 },
    UnknownZone,
}

impl LockReason {
    /// Player-facing advisory text for this lock.
    #[must_use]
    pub fn message(&self, content: &GameContent) -> String {
        match self {
            Self::GuideNotSeen => MSG_TALK_TO_GUIDE.to_string(),
            Self::PreviousIncomplete { previous } => {
                format!("Complete {} first.", content.label_for(previous))
            }
            Self::ZonesIncomplete { .. } => MSG_COMPLETE_ALL_ZONES.to_string(),
            Self::ResourceShort { need, .. } => format!("You need {need} ATP to face the boss."),
            Self::UnknownZone => "That place does not exist.".to_string(),
        }
    }
}

/// Marker state shown on the map for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Locked,
    Unlocked,
    Completed,
}

impl ZoneStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub resource: i32,
    pub resource_max: i32,
    pub lives: u32,
    pub lives_max: u32,
    pub completed_zones: BTreeSet<ZoneId>,
    pub guide_seen: bool,
    pub current_zone: Option<ZoneContext>,
    pub boss_hp: i32,
    pub boss_phase: usize,
    #[serde(skip)]
    policy: UnlockPolicy,
}

impl ProgressState {
    #[must_use]
    pub fn new(policy: UnlockPolicy, limits: &ProgressLimits) -> Self {
        Self {
            resource: 0,
            resource_max: limits.resource_max,
            lives: limits.lives_max,
            lives_max: limits.lives_max,
            completed_zones: BTreeSet::new(),
            guide_seen: false,
            current_zone: None,
            boss_hp: 0,
            boss_phase: 0,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &UnlockPolicy {
        &self.policy
    }

    /// Whether the zone can be entered right now.
    #[must_use]
    pub fn is_unlocked(&self, zone: &ZoneId) -> bool {
        self.lock_reason(zone).is_none()
    }

    /// The reason a zone is locked, or `None` when it is accessible.
    #[must_use]
    pub fn lock_reason(&self, zone: &ZoneId) -> Option<LockReason> {
        if zone == self.policy.guide() {
            return None;
        }
        if zone == self.policy.danger() {
            let missing: Vec<ZoneId> = self
                .policy
                .order()
                .iter()
                .filter(|id| !self.completed_zones.contains(*id))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Some(LockReason::ZonesIncomplete { missing });
            }
            if self.resource < self.resource_max {
                return Some(LockReason::ResourceShort {
                    have: self.resource,
                    need: self.resource_max,
                });
            }
            return None;
        }
        match self.policy.ordinal(zone) {
            Some(0) if !self.guide_seen => Some(LockReason::GuideNotSeen),
            Some(0) => None,
            Some(idx) => {
                let previous = &self.policy.order()[idx - 1];
                if self.completed_zones.contains(previous) {
                    None
                } else {
                    Some(LockReason::PreviousIncomplete {
                        previous: previous.clone(),
                    })
                }
            }
            None => Some(LockReason::UnknownZone),
        }
    }

    #[must_use]
    pub fn is_completed(&self, zone: &ZoneId) -> bool {
        self.completed_zones.contains(zone)
    }

    #[must_use]
    pub fn zone_status(&self, zone: &ZoneId) -> ZoneStatus {
        if self.is_completed(zone) {
            ZoneStatus::Completed
        } else if self.is_unlocked(zone) {
            ZoneStatus::Unlocked
        } else {
            ZoneStatus::Locked
        }
    }

    #[must_use]
    pub fn all_zones_completed(&self) -> bool {
        self.policy
            .order()
            .iter()
            .all(|zone| self.completed_zones.contains(zone))
    }

    /// Record a zone as completed. Returns `true` only the first time.
    pub fn complete_zone(&mut self, zone: &ZoneId) -> bool {
        self.completed_zones.insert(zone.clone())
    }

    /// Add (or subtract) resource, saturating at `[0, resource_max]`.
    pub fn add_resource(&mut self, amount: i32) {
        self.resource = self
            .resource
            .saturating_add(amount)
            .clamp(0, self.resource_max);
    }

    /// Remove one life. Returns `true` iff this call brought lives to zero.
    pub fn lose_life(&mut self) -> bool {
        if self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        self.lives == 0
    }

    /// Returns `true` only the first time the guide is seen.
    pub fn mark_guide_seen(&mut self) -> bool {
        !std::mem::replace(&mut self.guide_seen, true)
    }

    /// The zone that completing `zone` may unlock next.
    #[must_use]
    pub fn next_zone_after(&self, zone: &ZoneId) -> Option<ZoneId> {
        let order = self.policy.order();
        if zone == self.policy.guide() {
            return order.first().cloned();
        }
        let idx = self.policy.ordinal(zone)?;
        Some(
            order
                .get(idx + 1)
                .cloned()
                .unwrap_or_else(|| self.policy.danger().clone()),
        )
    }

    /// Restore initial values for a new game or after a game over.
    pub fn reset(&mut self) {
        self.resource = 0;
        self.lives = self.lives_max;
        self.completed_zones.clear();
        self.guide_seen = false;
        self.current_zone = None;
        self.boss_hp = 0;
        self.boss_phase = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: &str) -> ZoneId {
        ZoneId::new(id)
    }

    fn state() -> ProgressState {
        let policy = UnlockPolicy::new(
            vec![zone("a"), zone("b"), zone("c")],
            zone("guide"),
            zone("danger"),
        );
        ProgressState::new(policy, &ProgressLimits::default())
    }

    #[test]
    fn guide_is_always_unlocked() {
        let progress = state();
        assert!(progress.is_unlocked(&zone("guide")));
    }

    #[test]
    fn first_zone_waits_for_guide() {
        let mut progress = state();
        assert_eq!(
            progress.lock_reason(&zone("a")),
            Some(LockReason::GuideNotSeen)
        );
        assert!(progress.mark_guide_seen());
        assert!(progress.is_unlocked(&zone("a")));
        assert!(!progress.mark_guide_seen());
    }

    #[test]
    fn ordinal_gating_ignores_resource_and_lives() {
        let mut progress = state();
        progress.mark_guide_seen();
        progress.add_resource(100);
        progress.lose_life();
        assert!(!progress.is_unlocked(&zone("b")));
        assert_eq!(
            progress.lock_reason(&zone("c")),
            Some(LockReason::PreviousIncomplete {
                previous: zone("b")
            })
        );
        progress.complete_zone(&zone("a"));
        assert!(progress.is_unlocked(&zone("b")));
        assert!(!progress.is_unlocked(&zone("c")));
    }

    #[test]
    fn danger_needs_every_zone_and_full_resource() {
        let mut progress = state();
        progress.mark_guide_seen();
        progress.complete_zone(&zone("a"));
        assert_eq!(
            progress.lock_reason(&zone("danger")),
            Some(LockReason::ZonesIncomplete {
                missing: vec![zone("b"), zone("c")]
            })
        );
        progress.complete_zone(&zone("b"));
        progress.complete_zone(&zone("c"));
        progress.add_resource(99);
        assert_eq!(
            progress.lock_reason(&zone("danger")),
            Some(LockReason::ResourceShort {
                have: 99,
                need: 100
            })
        );
        progress.add_resource(1);
        assert!(progress.is_unlocked(&zone("danger")));
    }

    #[test]
    fn add_resource_saturates_both_ways() {
        let mut progress = state();
        progress.add_resource(70);
        progress.add_resource(70);
        assert_eq!(progress.resource, 100);
        progress.add_resource(-500);
        assert_eq!(progress.resource, 0);
        progress.add_resource(i32::MAX);
        assert_eq!(progress.resource, 100);
    }

    #[test]
    fn complete_zone_is_idempotent() {
        let mut progress = state();
        assert!(progress.complete_zone(&zone("a")));
        assert!(!progress.complete_zone(&zone("a")));
        assert_eq!(progress.completed_zones.len(), 1);
    }

    #[test]
    fn lose_life_reports_zero_once() {
        let mut progress = state();
        assert!(!progress.lose_life());
        assert!(!progress.lose_life());
        assert!(progress.lose_life());
        assert_eq!(progress.lives, 0);
        assert!(!progress.lose_life());
        assert_eq!(progress.lives, 0);
    }

    #[test]
    fn unknown_zone_is_locked_with_reason() {
        let progress = state();
        assert_eq!(
            progress.lock_reason(&zone("moon")),
            Some(LockReason::UnknownZone)
        );
        assert_eq!(progress.zone_status(&zone("moon")), ZoneStatus::Locked);
    }

    #[test]
    fn next_zone_walks_the_order_into_danger() {
        let progress = state();
        assert_eq!(progress.next_zone_after(&zone("guide")), Some(zone("a")));
        assert_eq!(progress.next_zone_after(&zone("a")), Some(zone("b")));
        assert_eq!(progress.next_zone_after(&zone("c")), Some(zone("danger")));
        assert_eq!(progress.next_zone_after(&zone("moon")), None);
    }

    #[test]
    fn zone_status_tracks_progress() {
        let mut progress = state();
        assert_eq!(progress.zone_status(&zone("a")), ZoneStatus::Locked);
        progress.mark_guide_seen();
        assert_eq!(progress.zone_status(&zone("a")), ZoneStatus::Unlocked);
        progress.complete_zone(&zone("a"));
        assert_eq!(progress.zone_status(&zone("a")), ZoneStatus::Completed);
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut progress = state();
        progress.mark_guide_seen();
        progress.complete_zone(&zone("a"));
        progress.add_resource(40);
        progress.lose_life();
        progress.current_zone = Some(ZoneContext::Zone(zone("a")));
        progress.boss_hp = 2;
        progress.boss_phase = 1;
        progress.reset();
        assert_eq!(progress.resource, 0);
        assert_eq!(progress.lives, progress.lives_max);
        assert!(progress.completed_zones.is_empty());
        assert!(!progress.guide_seen);
        assert!(progress.current_zone.is_none());
        assert_eq!((progress.boss_hp, progress.boss_phase), (0, 0));
    }

    #[test]
    fn lock_messages_name_the_previous_zone() {
        let content = crate::data::tests::fixture();
        let reason = LockReason::PreviousIncomplete {
            previous: zone("a"),
        };
        assert_eq!(reason.message(&content), "Complete Zone A first.");
        assert_eq!(
            LockReason::GuideNotSeen.message(&content),
            MSG_TALK_TO_GUIDE
        );
    }
}
