//! Interception Layer
//!
//! Owns the native record -> shim mapping and the prefix redirects on the
//! host's two quest-completion callbacks. Records we own are answered by
//! their shim; everything else falls through to the host untouched.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::dedup::MessageDedup;
use crate::host::{HookInstaller, HookPoint, Host, NativeQuestId, NativeQuestRecord, PlayerId, QuestLog};
use crate::item::Item;
use crate::npc::Npc;
use crate::quest::{InterceptTarget, QuestKind, QuestKindId, QuestShim};

/// First id handed out. Keeps our records visually distinct in host logs.
const FIRST_RECORD_ID: u64 = 0x5100_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallState {
    NotAttempted,
    Installed,
    /// A hook point is missing from the host; the layer stays inert.
    Failed,
}

/// Outcome of a redirected completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Record is ours; the host must use this result and skip its own logic.
    Handled(bool),
    /// Not ours; run the host's original logic.
    Passthrough,
}

pub struct InterceptionLayer {
    install: InstallState,
    next_id: u64,
    targets: HashMap<NativeQuestId, Box<dyn InterceptTarget>>,
}

impl Default for InterceptionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptionLayer {
    pub fn new() -> Self {
        Self {
            install: InstallState::NotAttempted,
            next_id: FIRST_RECORD_ID,
            targets: HashMap::new(),
        }
    }

    // ========================================================================
    // Hook installation
    // ========================================================================

    /// Install both redirects. Runs at most once per process; later calls
    /// just report the outcome of the first.
    pub fn ensure_installed(&mut self, host: &mut dyn Host) -> bool {
        match self.install {
            InstallState::Installed => return true,
            InstallState::Failed => return false,
            InstallState::NotAttempted => {}
        }

        for point in HookPoint::ALL {
            if let Err(e) = host.install_prefix(point) {
                error!("Quest interception unavailable, owned quests will not respond: {}", e);
                self.install = InstallState::Failed;
                return false;
            }
        }

        info!("Installed quest interception on {} hook points", HookPoint::ALL.len());
        self.install = InstallState::Installed;
        true
    }

    pub fn is_active(&self) -> bool {
        self.install == InstallState::Installed
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub fn new_record_id(&mut self) -> NativeQuestId {
        let id = NativeQuestId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Put `record` in the target player's log and map it to `target`.
    pub fn register(&mut self, host: &mut dyn Host, record: NativeQuestRecord, target: Box<dyn InterceptTarget>) {
        let id = target.record_id();
        if record.id != id {
            warn!("Record {} does not belong to shim for {}, not registering", record.id, id);
            return;
        }
        if self.targets.contains_key(&id) {
            warn!("{} is already registered", id);
            return;
        }

        let player = target.player();
        debug!("Registering {} ({}) for {}", id, target.kind_id(), player);
        host.add_to_quest_log(player, record);
        self.targets.insert(id, target);
    }

    /// Drop the mapping for `id` and take the record out of its player's log.
    pub fn unregister(&mut self, host: &mut dyn Host, id: NativeQuestId) -> Option<Box<dyn InterceptTarget>> {
        let target = self.targets.remove(&id)?;
        host.remove_from_quest_log(target.player(), id);
        debug!("Unregistered {} ({})", id, target.kind_id());
        Some(target)
    }

    /// Remove every owned record from `player`'s log. Returns how many went.
    pub fn remove_all(&mut self, host: &mut dyn Host, player: PlayerId) -> usize {
        let owned: Vec<NativeQuestId> = host
            .quest_log(player)
            .into_iter()
            .filter(|id| self.targets.contains_key(id))
            .collect();

        for id in &owned {
            self.unregister(host, *id);
        }
        owned.len()
    }

    /// Forget every mapping, taking each record out of whichever log still
    /// holds it. Returns how many went.
    pub fn clear(&mut self, host: &mut dyn Host) -> usize {
        let ids: Vec<NativeQuestId> = self.targets.keys().copied().collect();
        for id in &ids {
            self.unregister(host, *id);
        }
        ids.len()
    }

    pub fn is_owned(&self, id: NativeQuestId) -> bool {
        self.targets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Owned record for quest kind `kind` in `player`'s log, if any.
    pub fn find_by_controller(&self, host: &dyn Host, player: PlayerId, kind: QuestKindId) -> Option<NativeQuestId> {
        host.quest_log(player).into_iter().find(|id| {
            self.targets
                .get(id)
                .is_some_and(|t| t.kind_id() == kind)
        })
    }

    /// Live shim of kind `K` in `player`'s log.
    pub fn find<K: QuestKind>(&self, host: &dyn Host, player: PlayerId, kind: QuestKindId) -> Option<&QuestShim<K>> {
        let id = self.find_by_controller(host, player, kind)?;
        self.targets.get(&id)?.as_any().downcast_ref()
    }

    pub fn find_mut<K: QuestKind>(
        &mut self,
        host: &dyn Host,
        player: PlayerId,
        kind: QuestKindId,
    ) -> Option<&mut QuestShim<K>> {
        let id = self.find_by_controller(host, player, kind)?;
        self.targets.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    pub fn get(&self, id: NativeQuestId) -> Option<&dyn InterceptTarget> {
        self.targets.get(&id).map(|t| t.as_ref())
    }

    // ========================================================================
    // Redirected host callbacks
    // ========================================================================

    /// Prefix on the host's "NPC socialized" completion check.
    pub fn on_npc_socialized(
        &mut self,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
        record: NativeQuestId,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
    ) -> Interception {
        self.redirect(host, dedup, HookPoint::NpcSocialized, record, npc, item, probe)
    }

    /// Prefix on the host's "item offered to NPC" completion check.
    pub fn on_item_offered(
        &mut self,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
        record: NativeQuestId,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
    ) -> Interception {
        self.redirect(host, dedup, HookPoint::ItemOfferedToNpc, record, npc, item, probe)
    }

    #[allow(clippy::too_many_arguments)]
    fn redirect(
        &mut self,
        host: &mut dyn Host,
        dedup: &mut MessageDedup,
        point: HookPoint,
        record: NativeQuestId,
        npc: Option<&Npc>,
        item: Option<&Item>,
        probe: bool,
    ) -> Interception {
        if !self.is_active() {
            return Interception::Passthrough;
        }
        let Some(target) = self.targets.get_mut(&record) else {
            return Interception::Passthrough;
        };

        let handled = target.check_interaction(npc, item, probe, host, dedup);
        debug!("{} on {} -> {}", point, record, handled);
        Interception::Handled(handled)
    }
}
