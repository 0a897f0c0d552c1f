//! Part Exchange
//!
//! The shared lifecycle for attachment quests: the player digs up a broken
//! part, which starts the quest; townsfolk dialogue eventually yields a
//! working part; installing that part at the garage finishes it.

use tracing::{debug, info, warn};

use crate::controller::{InventoryTriggers, ManagedController, OverlayCtx, QuestController};
use crate::host::{GameSession, Host, PlayerId, PlayerInventory, Presentation};
use crate::interception::InterceptionLayer;
use crate::item::{Item, ItemId};
use crate::quest::{OverallQuestState, QuestKind, QuestKindId};

/// A quest kind following the broken part -> working part shape.
pub trait PartQuestKind: QuestKind + Sized {
    fn broken_part_id(&self) -> &ItemId;

    fn working_part_id(&self) -> &ItemId;

    /// Shown (without a speaker) once the part is installed.
    fn quest_complete_message(&self) -> String;

    /// Progress after the working part lands in the inventory.
    fn got_working_part(&self, state: &Self::State) -> Self::State;
}

/// Only the broken part starts a conversation. The working part goes straight
/// to the garage.
pub fn is_broken_part<K: PartQuestKind>(kind: &K, item: &Item) -> bool {
    item.is(kind.broken_part_id())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartTrigger {
    BrokenPart,
    WorkingPart,
}

pub struct PartQuestController<K: PartQuestKind> {
    quest: QuestController<K>,
    triggers: InventoryTriggers<PartTrigger>,
}

impl<K: PartQuestKind> PartQuestController<K> {
    pub fn new(kind: K, prefix: &str) -> Self {
        Self {
            quest: QuestController::new(kind, prefix),
            triggers: InventoryTriggers::new(),
        }
    }

    pub fn quest(&self) -> &QuestController<K> {
        &self.quest
    }

    pub fn triggers(&self) -> &InventoryTriggers<PartTrigger> {
        &self.triggers
    }

    fn broken(&self) -> &ItemId {
        self.quest.kind().broken_part_id()
    }

    fn working(&self) -> &ItemId {
        self.quest.kind().working_part_id()
    }

    fn arm_for(&mut self, state: OverallQuestState) {
        let broken = self.broken().clone();
        let working = self.working().clone();
        match state {
            OverallQuestState::NotStarted => {
                self.triggers.arm(&broken, PartTrigger::BrokenPart);
                self.triggers.disarm(&working);
            }
            OverallQuestState::InProgress => {
                self.triggers.disarm(&broken);
                self.triggers.arm(&working, PartTrigger::WorkingPart);
            }
            OverallQuestState::Complete => {
                self.triggers.disarm(&broken);
                self.triggers.disarm(&working);
            }
        }
    }

    fn player_got_broken_part(&mut self, ctx: &mut OverlayCtx<'_>, item: Item) {
        let master = ctx.host.master_player();
        if self.quest.is_started(&*ctx.host, ctx.layer, master) {
            warn!("Found broken part {} while {} is already underway", item.id, self.quest.kind_id());
            return;
        }

        ctx.host.hold_up_item(master, &item);
        self.quest.create_quest_instance(ctx, master);
        self.arm_for(OverallQuestState::InProgress);
    }

    fn player_got_working_part(&mut self, ctx: &mut OverlayCtx<'_>, item: Item) {
        let master = ctx.host.master_player();
        let kind_id = self.quest.kind_id();
        let Some(shim) = ctx.layer.find_mut::<K>(&*ctx.host, master, kind_id) else {
            warn!("Found working part {} but {} is not active", item.id, kind_id);
            return;
        };

        let next = self.quest.kind().got_working_part(&shim.state(&*ctx.host));
        shim.advance_state(ctx.host, next);
        self.triggers.disarm(&item.id);
        debug!("{} now waiting for install", kind_id);
    }
}

impl<K: PartQuestKind> ManagedController for PartQuestController<K> {
    fn kind_id(&self) -> QuestKindId {
        self.quest.kind_id()
    }

    fn state_key(&self) -> &str {
        self.quest.slot().key()
    }

    fn overall_state(&self, host: &dyn Host, layer: &InterceptionLayer, player: PlayerId) -> OverallQuestState {
        self.quest.overall_state(host, layer, player)
    }

    fn on_state_changed(&mut self, ctx: &mut OverlayCtx<'_>) {
        // Reconcile keeps the local player's log in line with the slot, so it
        // is the one to read on remote clients too
        let player = ctx.host.local_player();
        let state = self.quest.overall_state(&*ctx.host, ctx.layer, player);
        self.arm_for(state);
    }

    fn reconcile(&mut self, ctx: &mut OverlayCtx<'_>) {
        self.quest.reconcile(ctx);
    }

    fn poll_inventory(&mut self, ctx: &mut OverlayCtx<'_>) {
        for (trigger, item) in self.triggers.poll(&*ctx.host) {
            match trigger {
                PartTrigger::BrokenPart => self.player_got_broken_part(ctx, item),
                PartTrigger::WorkingPart => self.player_got_working_part(ctx, item),
            }
        }
    }

    fn player_in_garage(&mut self, ctx: &mut OverlayCtx<'_>, item: &Item) -> bool {
        if !item.is(self.working()) {
            return false;
        }
        if !ctx.host.is_master_game() {
            debug!("Only the master game can install {}", item.id);
            return false;
        }

        let master = ctx.host.master_player();
        if !self.quest.complete_quest(ctx, master) {
            return false;
        }

        let working = self.working().clone();
        if !ctx.host.remove_items(master, &working, 1) {
            warn!("Installed {} but none was left to remove", working);
        }
        let message = self.quest.kind().quest_complete_message();
        self.quest.show_message(ctx.host, &message);
        info!("{} installed", working);

        self.on_state_changed(ctx);
        true
    }

    fn remove_quest(&mut self, ctx: &mut OverlayCtx<'_>, player: PlayerId) {
        self.quest.remove_quest(ctx, player);
        self.on_state_changed(ctx);
    }
}
