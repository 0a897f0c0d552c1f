//! Quest Controllers
//!
//! One controller per quest kind, alive for the whole process. It knows
//! whether the quest has started or finished, owns the inventory triggers
//! that start and advance it, and creates or removes the shim in the player's
//! journal.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dedup::MessageDedup;
use crate::host::{GameSession, Host, NativeQuestId, PlayerId, PlayerInventory, Presentation};
use crate::interception::InterceptionLayer;
use crate::item::{Item, ItemId};
use crate::quest::{
    OverallQuestState, PersistedQuest, QuestKind, QuestKindId, QuestShim, QuestState, StateSlot,
};

/// Everything a controller touches while handling one event.
pub struct OverlayCtx<'a> {
    pub host: &'a mut dyn Host,
    pub layer: &'a mut InterceptionLayer,
    pub dedup: &'a mut MessageDedup,
}

// ============================================================================
// Inventory triggers
// ============================================================================

/// Items a controller is waiting to see in the master player's inventory,
/// each paired with what to do when it shows up.
#[derive(Debug)]
pub struct InventoryTriggers<A> {
    armed: Vec<(ItemId, A)>,
}

impl<A> Default for InventoryTriggers<A> {
    fn default() -> Self {
        Self { armed: Vec::new() }
    }
}

impl<A: Copy + Debug> InventoryTriggers<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch for `item`. Re-arming an item replaces its action.
    pub fn arm(&mut self, item: &ItemId, action: A) {
        match self.armed.iter_mut().find(|(id, _)| id == item) {
            Some(entry) => entry.1 = action,
            None => self.armed.push((item.clone(), action)),
        }
    }

    pub fn disarm(&mut self, item: &ItemId) {
        self.armed.retain(|(id, _)| id != item);
    }

    pub fn is_armed(&self, item: &ItemId) -> bool {
        self.armed.iter().any(|(id, _)| id == item)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Scan the master player's inventory. Each armed item found fires once
    /// and is disarmed. Remote clients never fire.
    pub fn poll(&mut self, host: &dyn Host) -> Vec<(A, Item)> {
        if !host.is_master_game() {
            return Vec::new();
        }

        let master = host.master_player();
        let mut fired = Vec::new();
        self.armed.retain(|(id, action)| match host.find_item(master, id) {
            Some(item) => {
                debug!("Trigger {:?} fired on {}", action, id);
                fired.push((*action, item));
                false
            }
            None => true,
        });
        fired
    }
}

// ============================================================================
// Generic controller
// ============================================================================

pub struct QuestController<K: QuestKind> {
    kind: Arc<K>,
    slot: StateSlot<K::State>,
}

impl<K: QuestKind> QuestController<K> {
    /// `prefix` namespaces the persisted slot key.
    pub fn new(kind: K, prefix: &str) -> Self {
        let slot = StateSlot::new(prefix, kind.id().as_str());
        Self {
            kind: Arc::new(kind),
            slot,
        }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn kind_id(&self) -> QuestKindId {
        self.kind.id()
    }

    pub fn slot(&self) -> &StateSlot<K::State> {
        &self.slot
    }

    pub fn persisted(&self, host: &dyn Host) -> PersistedQuest<K::State> {
        self.slot.load(host)
    }

    /// Current progress, or the initial stage if the quest isn't running.
    pub fn state(&self, host: &dyn Host) -> K::State {
        self.persisted(host).state_or_default()
    }

    pub fn overall_state(&self, host: &dyn Host, layer: &InterceptionLayer, player: PlayerId) -> OverallQuestState {
        if self.persisted(host).is_complete() {
            OverallQuestState::Complete
        } else if layer.find_by_controller(host, player, self.kind_id()).is_some() {
            OverallQuestState::InProgress
        } else {
            OverallQuestState::NotStarted
        }
    }

    pub fn is_started(&self, host: &dyn Host, layer: &InterceptionLayer, player: PlayerId) -> bool {
        self.overall_state(host, layer, player) != OverallQuestState::NotStarted
    }

    pub fn shim<'l>(&self, layer: &'l InterceptionLayer, host: &dyn Host, player: PlayerId) -> Option<&'l QuestShim<K>> {
        layer.find(host, player, self.kind_id())
    }

    /// Start the quest for `player` at the initial stage.
    pub fn create_quest_instance(&self, ctx: &mut OverlayCtx<'_>, player: PlayerId) -> NativeQuestId {
        let state = K::State::default();
        self.slot.store(ctx.host, &PersistedQuest::Active(state.clone()));

        let id = self.attach(ctx, player, &state, true);
        info!("Started {} for {} as {}", self.kind_id(), player, id);
        id
    }

    /// Put a shim for already-persisted progress into `player`'s log.
    fn attach(&self, ctx: &mut OverlayCtx<'_>, player: PlayerId, state: &K::State, is_new: bool) -> NativeQuestId {
        let id = ctx.layer.new_record_id();
        let shim = QuestShim::new(Arc::clone(&self.kind), player, id, self.slot.clone());
        let mut record = shim.build_record(state);
        record.show_new = is_new;
        ctx.layer.register(ctx.host, record, Box::new(shim));
        id
    }

    /// Advance the live quest for `player`. False if there isn't one.
    pub fn advance_state(&self, ctx: &mut OverlayCtx<'_>, player: PlayerId, new_state: K::State) -> bool {
        let kind_id = self.kind_id();
        let Some(shim) = ctx.layer.find_mut::<K>(&*ctx.host, player, kind_id) else {
            return false;
        };
        shim.advance_state(ctx.host, new_state);
        true
    }

    /// Finish the live quest for `player` and drop it from the journal.
    pub fn complete_quest(&self, ctx: &mut OverlayCtx<'_>, player: PlayerId) -> bool {
        let kind_id = self.kind_id();
        let Some(shim) = ctx.layer.find_mut::<K>(&*ctx.host, player, kind_id) else {
            warn!("No live {} for {} to complete", kind_id, player);
            return false;
        };
        shim.complete(ctx.host);
        let id = shim.record_id();
        ctx.layer.unregister(ctx.host, id);
        true
    }

    /// Error-recovery reset: drop any live shim and forget all progress.
    pub fn remove_quest(&self, ctx: &mut OverlayCtx<'_>, player: PlayerId) {
        warn!("Removing {} for {} and resetting its progress", self.kind_id(), player);
        if let Some(id) = ctx.layer.find_by_controller(&*ctx.host, player, self.kind_id()) {
            ctx.layer.unregister(ctx.host, id);
        }
        self.slot.store(ctx.host, &PersistedQuest::Absent);
    }

    /// Make the local player's journal agree with the persisted slot.
    pub fn reconcile(&self, ctx: &mut OverlayCtx<'_>) {
        let player = ctx.host.local_player();
        let live = ctx.layer.find_by_controller(&*ctx.host, player, self.kind_id());

        match (self.persisted(&*ctx.host), live) {
            (PersistedQuest::Active(state), None) => {
                let id = self.attach(ctx, player, &state, false);
                info!("Restored {} for {} at {:?} as {}", self.kind_id(), player, state.stage(), id);
            }
            (PersistedQuest::Active(_), Some(id)) => {
                if let Some(target) = ctx.layer.get(id) {
                    target.refresh_objective(ctx.host);
                }
            }
            (PersistedQuest::Absent | PersistedQuest::Complete, Some(id)) => {
                warn!("Dropping stale {} ({}) from {}", self.kind_id(), id, player);
                ctx.layer.unregister(ctx.host, id);
            }
            (PersistedQuest::Absent | PersistedQuest::Complete, None) => {}
        }
    }

    /// Dialogue box with no speaker.
    pub fn show_message(&self, host: &mut dyn Host, message: &str) {
        host.show_message(message);
    }
}

// ============================================================================
// Controller registry seam
// ============================================================================

/// What the overlay needs from every controller it manages, whatever the
/// quest kind.
pub trait ManagedController: Send {
    fn kind_id(&self) -> QuestKindId;

    /// Persisted slot key on the master player.
    fn state_key(&self) -> &str;

    fn overall_state(&self, host: &dyn Host, layer: &InterceptionLayer, player: PlayerId) -> OverallQuestState;

    /// Re-arm triggers to match the overall state.
    fn on_state_changed(&mut self, ctx: &mut OverlayCtx<'_>);

    fn reconcile(&mut self, ctx: &mut OverlayCtx<'_>);

    fn on_session_loaded(&mut self, ctx: &mut OverlayCtx<'_>) {
        self.reconcile(ctx);
        self.on_state_changed(ctx);
    }

    fn on_day_started(&mut self, ctx: &mut OverlayCtx<'_>) {
        self.reconcile(ctx);
        self.on_state_changed(ctx);
    }

    /// Remote clients only: the master player's slot for this quest changed.
    fn on_master_state_changed(&mut self, ctx: &mut OverlayCtx<'_>) {
        self.reconcile(ctx);
    }

    /// Check armed inventory triggers.
    fn poll_inventory(&mut self, ctx: &mut OverlayCtx<'_>);

    /// Player used `item` at the quest's destination. True if consumed.
    fn player_in_garage(&mut self, ctx: &mut OverlayCtx<'_>, item: &Item) -> bool;

    fn remove_quest(&mut self, ctx: &mut OverlayCtx<'_>, player: PlayerId);
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::host::{InMemoryHost, ModData, QuestLog};
    use crate::npc::Npc;
    use crate::quest::QuestCtx;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
    enum Step {
        #[default]
        One,
        Two,
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Count {
        step: Step,
    }

    impl QuestState for Count {
        type Stage = Step;

        fn stage(&self) -> Step {
            self.step
        }
    }

    struct Counting;

    impl QuestKind for Counting {
        type State = Count;

        fn id(&self) -> QuestKindId {
            QuestKindId("counting")
        }

        fn title(&self) -> String {
            "Counting".to_string()
        }

        fn description(&self) -> String {
            String::new()
        }

        fn objective(&self, state: &Count) -> String {
            format!("{:?}", state.step)
        }

        fn is_conversation_piece(&self, _item: &Item) -> bool {
            false
        }

        fn check_if_complete(&self, _quest: &mut QuestCtx<'_, Self>, _npc: &Npc, _item: Option<&Item>) {}
    }

    struct Fixture {
        host: InMemoryHost,
        layer: InterceptionLayer,
        dedup: MessageDedup,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: InMemoryHost::new(PlayerId(1)),
                layer: InterceptionLayer::new(),
                dedup: MessageDedup::new(),
            }
        }

        fn ctx(&mut self) -> OverlayCtx<'_> {
            OverlayCtx {
                host: &mut self.host,
                layer: &mut self.layer,
                dedup: &mut self.dedup,
            }
        }
    }

    #[test]
    fn test_triggers_fire_once_then_disarm() {
        let mut host = InMemoryHost::new(PlayerId(1));
        let mut triggers = InventoryTriggers::new();
        triggers.arm(&ItemId::new("broken"), 'b');
        triggers.arm(&ItemId::new("working"), 'w');

        assert!(triggers.poll(&host).is_empty());

        host.add_item(PlayerId(1), Item::new("(O)broken"));
        let fired = triggers.poll(&host);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 'b');
        assert!(!triggers.is_armed(&ItemId::new("broken")));

        // Still in the inventory, but disarmed
        assert!(triggers.poll(&host).is_empty());
        assert_eq!(triggers.armed_count(), 1);
    }

    #[test]
    fn test_rearming_replaces_action() {
        let mut triggers = InventoryTriggers::new();
        triggers.arm(&ItemId::new("716"), 1);
        triggers.arm(&ItemId::new("(O)716"), 2);
        assert_eq!(triggers.armed_count(), 1);

        let mut host = InMemoryHost::new(PlayerId(1));
        host.add_item(PlayerId(1), Item::new("716"));
        assert_eq!(triggers.poll(&host)[0].0, 2);
    }

    #[test]
    fn test_triggers_ignore_remote_clients() {
        let mut host = InMemoryHost::new(PlayerId(1));
        host.add_item(PlayerId(1), Item::new("broken"));
        host.set_local_player(PlayerId(2));
        host.add_item(PlayerId(2), Item::new("broken"));

        let mut triggers = InventoryTriggers::new();
        triggers.arm(&ItemId::new("broken"), ());
        assert!(triggers.poll(&host).is_empty());
        assert!(triggers.is_armed(&ItemId::new("broken")));
    }

    #[test]
    fn test_overall_state_progression() {
        let mut fx = Fixture::new();
        let controller = QuestController::new(Counting, "Test");
        let player = PlayerId(1);

        assert_eq!(controller.overall_state(&fx.host, &fx.layer, player), OverallQuestState::NotStarted);

        controller.create_quest_instance(&mut fx.ctx(), player);
        assert_eq!(controller.overall_state(&fx.host, &fx.layer, player), OverallQuestState::InProgress);
        let shim = controller.shim(&fx.layer, &fx.host, player).unwrap();
        assert!(fx.host.quest_record(player, shim.record_id()).unwrap().show_new);

        assert!(controller.advance_state(&mut fx.ctx(), player, Count { step: Step::Two }));
        assert_eq!(controller.state(&fx.host).step, Step::Two);

        assert!(controller.complete_quest(&mut fx.ctx(), player));
        assert_eq!(controller.overall_state(&fx.host, &fx.layer, player), OverallQuestState::Complete);
        assert!(fx.host.quest_log(player).is_empty());
        assert!(fx.layer.is_empty());

        assert!(!controller.advance_state(&mut fx.ctx(), player, Count { step: Step::Two }));
        assert!(!controller.complete_quest(&mut fx.ctx(), player));
    }

    #[test]
    fn test_reconcile_restores_persisted_progress() {
        let mut fx = Fixture::new();
        let controller = QuestController::new(Counting, "Test");
        let player = PlayerId(1);
        controller
            .slot()
            .store(&mut fx.host, &PersistedQuest::Active(Count { step: Step::Two }));

        controller.reconcile(&mut fx.ctx());
        let shim = controller.shim(&fx.layer, &fx.host, player).unwrap();
        assert_eq!(shim.current_objective(&fx.host), Some("Two"));
        assert!(!fx.host.quest_record(player, shim.record_id()).unwrap().show_new);

        // Idempotent
        controller.reconcile(&mut fx.ctx());
        assert_eq!(fx.host.quest_log(player).len(), 1);
    }

    #[test]
    fn test_reconcile_drops_stale_shim() {
        let mut fx = Fixture::new();
        let controller = QuestController::new(Counting, "Test");
        let player = PlayerId(1);
        controller.create_quest_instance(&mut fx.ctx(), player);

        fx.host.set_mod_data(player, controller.slot().key(), None);
        controller.reconcile(&mut fx.ctx());

        assert!(fx.host.quest_log(player).is_empty());
        assert_eq!(controller.overall_state(&fx.host, &fx.layer, player), OverallQuestState::NotStarted);
    }

    #[test]
    fn test_remove_quest_resets_progress() {
        let mut fx = Fixture::new();
        let controller = QuestController::new(Counting, "Test");
        let player = PlayerId(1);
        controller.create_quest_instance(&mut fx.ctx(), player);
        controller.advance_state(&mut fx.ctx(), player, Count { step: Step::Two });

        controller.remove_quest(&mut fx.ctx(), player);
        assert_eq!(controller.persisted(&fx.host), PersistedQuest::Absent);
        assert_eq!(controller.overall_state(&fx.host, &fx.layer, player), OverallQuestState::NotStarted);
    }
}
