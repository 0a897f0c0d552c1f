//! Quest Shim
//!
//! Presents a quest kind to the host as one of its own quest records, while
//! the real (typed) progress lives in the kind's persisted slot. The host's
//! completion callbacks reach `check_interaction` through the interception
//! layer.

use std::any::Any;
use std::sync::Arc;

use chrono::Weekday;
use tracing::{debug, info, warn};

use super::kind::{QuestKind, QuestKindId};
use super::state::{PersistedQuest, QuestState, StateSlot};
use crate::dedup::MessageDedup;
use crate::host::{
    Cue, GameSession, Host, NativeQuestId, NativeQuestRecord, NpcDialogue, PlayerId, Presentation,
    QuestLog,
};
use crate::item::Item;
use crate::npc::Npc;

/// What the interception layer stores for each owned record.
pub trait InterceptTarget: Any + Send {
    fn record_id(&self) -> NativeQuestId;
    fn player(&self) -> PlayerId;
    fn kind_id(&self) -> QuestKindId;
    fn check_interaction(
        &mut self,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
    ) -> bool;
    /// Recompute the journal objective from persisted progress.
    fn refresh_objective(&self, host: &mut dyn Host);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Live quest instance for one player.
pub struct QuestShim<K: QuestKind> {
    kind: Arc<K>,
    player: PlayerId,
    record: NativeQuestId,
    slot: StateSlot<K::State>,
    /// Set by `spout` during a completion check
    did_npc_talk: bool,
    /// The item held during the current check brings up this quest
    held_item_related: bool,
}

impl<K: QuestKind> QuestShim<K> {
    pub(crate) fn new(
        kind: Arc<K>,
        player: PlayerId,
        record: NativeQuestId,
        slot: StateSlot<K::State>,
    ) -> Self {
        Self {
            kind,
            player,
            record,
            slot,
            did_npc_talk: false,
            held_item_related: false,
        }
    }

    /// Host record for this shim, text filled in for `state`.
    pub(crate) fn build_record(&self, state: &K::State) -> NativeQuestRecord {
        let mut record = NativeQuestRecord::new(self.record);
        record.title = self.kind.title();
        record.description = self.kind.description();
        record.current_objective = self.kind.objective(state);
        record
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn record_id(&self) -> NativeQuestId {
        self.record
    }

    /// Current progress (read through from the persisted slot).
    pub fn state(&self, host: &dyn Host) -> K::State {
        self.slot.load(host).state_or_default()
    }

    pub fn title<'h>(&self, host: &'h dyn Host) -> Option<&'h str> {
        host.quest_record(self.player, self.record)
            .map(|r| r.title.as_str())
    }

    pub fn description<'h>(&self, host: &'h dyn Host) -> Option<&'h str> {
        host.quest_record(self.player, self.record)
            .map(|r| r.description.as_str())
    }

    pub fn current_objective<'h>(&self, host: &'h dyn Host) -> Option<&'h str> {
        host.quest_record(self.player, self.record)
            .map(|r| r.current_objective.as_str())
    }

    pub fn set_display_as_new(&self, host: &mut dyn Host) {
        if let Some(record) = host.quest_record_mut(self.player, self.record) {
            record.show_new = true;
        }
    }

    pub fn mark_as_viewed(&self, host: &mut dyn Host) {
        if let Some(record) = host.quest_record_mut(self.player, self.record) {
            record.show_new = false;
        }
    }

    /// Host completion callback.
    ///
    /// A probe only asks whether the held item is worth offering and changes
    /// nothing. Otherwise the kind's dialogue chain runs and the result is
    /// whether anyone spoke; the host shows "wrong person" when a quest item
    /// gets a `false`.
    pub fn check_interaction(
        &mut self,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
    ) -> bool {
        if probe {
            return npc.is_some() && item.is_some_and(|i| self.kind.is_conversation_piece(i));
        }

        let Some(npc) = npc else {
            return false;
        };

        self.held_item_related = item.is_some_and(|i| self.kind.is_conversation_piece(i));
        self.did_npc_talk = false;

        let kind = Arc::clone(&self.kind);
        let mut ctx = QuestCtx {
            shim: &mut *self,
            host,
            dedup,
        };
        kind.check_if_complete(&mut ctx, npc, item);

        debug!(
            "{} check with {} (holding {:?}): spoke={}",
            self.kind.id(),
            npc,
            item.map(|i| i.id.as_str()),
            self.did_npc_talk
        );
        self.did_npc_talk
    }

    /// Move to `new_state`. A change plays the progress cue, persists, and
    /// refreshes the objective. Stage regressions are refused.
    pub fn advance_state(&mut self, host: &mut dyn Host, new_state: K::State) {
        let current = self.state(host);
        if current == new_state {
            return;
        }
        if new_state.stage() < current.stage() {
            warn!(
                "{} refused to move back from {:?} to {:?}",
                self.kind.id(),
                current.stage(),
                new_state.stage()
            );
            return;
        }

        host.play_cue(Cue::QuestProgress);
        self.slot.store(host, &PersistedQuest::Active(new_state.clone()));
        self.set_objective(host, &new_state);
    }

    fn set_objective(&self, host: &mut dyn Host, state: &K::State) {
        let objective = self.kind.objective(state);
        if let Some(record) = host.quest_record_mut(self.player, self.record) {
            record.current_objective = objective;
        }
    }

    /// Mark the host record done and record completion with the controller's
    /// slot.
    pub fn complete(&mut self, host: &mut dyn Host) {
        if let Some(record) = host.quest_record_mut(self.player, self.record) {
            record.completed = true;
        }
        self.slot.store(host, &PersistedQuest::Complete);
        info!("{} completed for {}", self.kind.id(), self.player);
    }
}

impl<K: QuestKind> InterceptTarget for QuestShim<K> {
    fn record_id(&self) -> NativeQuestId {
        self.record
    }

    fn player(&self) -> PlayerId {
        self.player
    }

    fn kind_id(&self) -> QuestKindId {
        self.kind.id()
    }

    fn check_interaction(
        &mut self,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
    ) -> bool {
        QuestShim::check_interaction(self, npc, item, probe, host, dedup)
    }

    fn refresh_objective(&self, host: &mut dyn Host) {
        let state = self.state(host);
        self.set_objective(host, &state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// Completion-check context
// ============================================================================

/// Handed to `QuestKind::check_if_complete`: the shim plus the host services
/// the dialogue chain may use.
pub struct QuestCtx<'a, K: QuestKind> {
    pub(crate) shim: &'a mut QuestShim<K>,
    pub(crate) host: &'a mut dyn Host,
    pub(crate) dedup: &'a mut MessageDedup,
}

impl<K: QuestKind> QuestCtx<'_, K> {
    pub fn player(&self) -> PlayerId {
        self.shim.player
    }

    pub fn state(&self) -> K::State {
        self.shim.state(&*self.host)
    }

    pub fn set_state(&mut self, new_state: K::State) {
        self.shim.advance_state(&mut *self.host, new_state);
    }

    /// Edit a copy of the current state and advance to it.
    pub fn update_state(&mut self, edit: impl FnOnce(&mut K::State)) {
        let mut state = self.state();
        edit(&mut state);
        self.set_state(state);
    }

    /// True if the held item brought up this quest.
    pub fn held_item_is_conversation_piece(&self) -> bool {
        self.shim.held_item_related
    }

    pub fn weekday(&self) -> Weekday {
        self.host.weekday()
    }

    /// Have `npc` say `message`, unless it was already said this session and
    /// the player isn't pressing the topic with a quest item.
    pub fn spout(&mut self, npc: &Npc, message: &str) {
        if !self
            .dedup
            .should_speak(&npc.name, message, self.shim.held_item_related)
        {
            return;
        }

        self.shim.did_npc_talk = true;

        // Let the NPC pull down its own pending topics first (that marks them
        // seen), then drop them so our line isn't starved.
        let player = self.shim.player;
        self.host.refresh_pending_dialogue(npc, player);
        self.host.clear_dialogue(npc);
        self.host.push_dialogue(npc, message);
        self.host.present_dialogue(npc);
    }

    /// Speakerless dialogue box.
    pub fn show_message(&mut self, message: &str) {
        self.host.show_message(message);
    }
}
