//! Overlay Service
//!
//! Session-level owner of the interception layer, the dedup registry, the
//! master-data monitor and every quest controller. The host's event loop
//! calls into this type; nothing here blocks.

use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::controller::{ManagedController, OverlayCtx};
use crate::dedup::MessageDedup;
use crate::host::{GameSession, Host, NativeQuestId, PlayerId, QuestLog};
use crate::interception::{Interception, InterceptionLayer};
use crate::item::Item;
use crate::kinds::scythe::ScytheQuest;
use crate::monitor::MasterDataMonitor;
use crate::npc::Npc;
use crate::part_exchange::PartQuestController;
use crate::quest::{OverallQuestState, QuestKindId};

#[derive(Default)]
pub struct Overlay {
    layer: InterceptionLayer,
    dedup: MessageDedup,
    monitor: MasterDataMonitor,
    controllers: Vec<Box<dyn ManagedController>>,
}

impl Overlay {
    /// An overlay with no quests.
    pub fn new() -> Self {
        Self::default()
    }

    /// An overlay carrying every quest kind this crate ships.
    pub fn with_builtin_quests(config: &OverlayConfig) -> Self {
        let mut overlay = Self::new();
        overlay.add_controller(Box::new(PartQuestController::new(
            ScytheQuest::new(config.scythe.clone()),
            &config.state_key_prefix,
        )));
        overlay
    }

    pub fn add_controller(&mut self, controller: Box<dyn ManagedController>) {
        info!("Registered quest controller {}", controller.kind_id());
        self.controllers.push(controller);
    }

    pub fn layer(&self) -> &InterceptionLayer {
        &self.layer
    }

    pub fn dedup(&self) -> &MessageDedup {
        &self.dedup
    }

    pub fn controller(&self, kind: QuestKindId) -> Option<&dyn ManagedController> {
        self.controllers
            .iter()
            .find(|c| c.kind_id() == kind)
            .map(|c| c.as_ref())
    }

    pub fn kinds(&self) -> Vec<QuestKindId> {
        self.controllers.iter().map(|c| c.kind_id()).collect()
    }

    pub fn overall_state(&self, host: &dyn Host, kind: QuestKindId, player: PlayerId) -> Option<OverallQuestState> {
        self.controller(kind)
            .map(|c| c.overall_state(host, &self.layer, player))
    }

    fn split<'a>(
        &'a mut self,
        host: &'a mut dyn Host,
    ) -> (OverlayCtx<'a>, &'a mut Vec<Box<dyn ManagedController>>, &'a mut MasterDataMonitor) {
        let ctx = OverlayCtx {
            host,
            layer: &mut self.layer,
            dedup: &mut self.dedup,
        };
        (ctx, &mut self.controllers, &mut self.monitor)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Save loaded (or joined). Forgets which lines were said and which
    /// records were ours, installs the hooks on first use, and brings every
    /// controller in line with the save.
    pub fn on_session_loaded(&mut self, host: &mut dyn Host) {
        self.dedup.clear();
        let stale = self.layer.clear(host);
        if stale > 0 {
            debug!("Dropped {} quest records from the previous session", stale);
        }
        self.layer.ensure_installed(host);

        let (mut ctx, controllers, monitor) = self.split(host);
        for controller in controllers.iter_mut() {
            controller.on_session_loaded(&mut ctx);
        }
        monitor.prime(&*ctx.host, controllers);
        info!("Session loaded with {} live quest records", ctx.layer.len());
    }

    pub fn on_day_started(&mut self, host: &mut dyn Host) {
        let (mut ctx, controllers, _) = self.split(host);
        for controller in controllers.iter_mut() {
            controller.on_day_started(&mut ctx);
        }
    }

    /// Once-a-second poll: inventory triggers, and master progress on remote
    /// clients.
    pub fn on_one_second_tick(&mut self, host: &mut dyn Host) {
        let (mut ctx, controllers, monitor) = self.split(host);
        monitor.poll(&mut ctx, controllers);
        for controller in controllers.iter_mut() {
            controller.poll_inventory(&mut ctx);
        }
    }

    /// Strip every owned record out of every player's journal so the host
    /// save never contains records it can't load.
    pub fn before_save(&mut self, host: &mut dyn Host) {
        let mut removed = 0;
        for player in host.players() {
            removed += self.layer.remove_all(host, player);
        }
        debug!("Removed {} quest records before save", removed);
    }

    pub fn after_save(&mut self, host: &mut dyn Host) {
        let (mut ctx, controllers, _) = self.split(host);
        for controller in controllers.iter_mut() {
            controller.reconcile(&mut ctx);
            controller.on_state_changed(&mut ctx);
        }
    }

    // ========================================================================
    // Redirected host callbacks
    // ========================================================================

    pub fn on_npc_socialized(
        &mut self,
        host: &mut dyn Host,
        record: NativeQuestId,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
    ) -> Interception {
        self.layer
            .on_npc_socialized(host, &mut self.dedup, record, npc, item, probe)
    }

    pub fn on_item_offered_to_npc(
        &mut self,
        host: &mut dyn Host,
        record: NativeQuestId,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
    ) -> Interception {
        self.layer
            .on_item_offered(host, &mut self.dedup, record, npc, item, probe)
    }

    /// Player talked to `npc`: run the completion check of every record in
    /// the local player's journal, the way the host does. True if any of our
    /// quests had something to say.
    pub fn talk_to(&mut self, host: &mut dyn Host, npc: &Npc, held: Option<&Item>) -> bool {
        let player = host.local_player();
        let mut spoke = false;
        for record in host.quest_log(player) {
            if let Interception::Handled(true) = self.on_npc_socialized(host, record, Some(npc), held, false) {
                spoke = true;
            }
        }
        spoke
    }

    /// Player offered `item` to `npc`. Each record is probed first; only
    /// those that want the item run the real check.
    pub fn offer_item(&mut self, host: &mut dyn Host, npc: &Npc, item: &Item) -> bool {
        let player = host.local_player();
        let mut spoke = false;
        for record in host.quest_log(player) {
            let wanted = self.on_item_offered_to_npc(host, record, Some(npc), Some(item), true);
            if wanted != Interception::Handled(true) {
                continue;
            }
            if let Interception::Handled(true) = self.on_item_offered_to_npc(host, record, Some(npc), Some(item), false) {
                spoke = true;
            }
        }
        spoke
    }

    /// Player used `item` at the garage. True if a quest took it.
    pub fn on_item_installed(&mut self, host: &mut dyn Host, item: &Item) -> bool {
        let (mut ctx, controllers, _) = self.split(host);
        controllers
            .iter_mut()
            .any(|controller| controller.player_in_garage(&mut ctx, item))
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Reset one quest kind for `player`. False if the kind is unknown.
    pub fn remove_quest(&mut self, host: &mut dyn Host, kind: QuestKindId, player: PlayerId) -> bool {
        let (mut ctx, controllers, _) = self.split(host);
        match controllers.iter_mut().find(|c| c.kind_id() == kind) {
            Some(controller) => {
                controller.remove_quest(&mut ctx, player);
                true
            }
            None => false,
        }
    }

    /// Drop every owned record from `player`'s journal without touching
    /// persisted progress.
    pub fn remove_all_quests(&mut self, host: &mut dyn Host, player: PlayerId) -> usize {
        self.layer.remove_all(host, player)
    }
}
