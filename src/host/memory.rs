//! In-Memory Host
//!
//! A complete stand-in for the game: players with inventories, quest logs and
//! mod data, NPC dialogue queues, and a transcript of every display side
//! effect. Used by the replay binary and by tests.

use std::collections::{HashMap, HashSet};

use chrono::Weekday;
use tracing::{debug, warn};

use super::{
    Cue, GameSession, HookInstaller, HookPoint, ModData, NativeQuestId, NativeQuestRecord,
    NpcDialogue, PlayerId, PlayerInventory, Presentation, QuestLog,
};
use crate::error::{QuestError, QuestResult};
use crate::item::{Inventory, Item, ItemId};
use crate::npc::Npc;

/// Something the host showed or played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A dialogue box opened for an NPC
    NpcLine { npc: String, text: String },
    /// A speakerless dialogue box
    Message(String),
    Cue(Cue),
    /// Player held an item up for everyone to see
    HeldUp { player: PlayerId, item: ItemId },
    /// Overflow item dropped at the player's feet
    Dropped { player: PlayerId, item: ItemId, count: u32 },
}

#[derive(Debug, Default)]
struct PlayerData {
    inventory: Inventory,
    quest_log: Vec<NativeQuestRecord>,
    mod_data: HashMap<String, String>,
}

pub struct InMemoryHost {
    local: PlayerId,
    master: PlayerId,
    weekday: Weekday,
    /// Insertion order matters for `players()`
    player_order: Vec<PlayerId>,
    players: HashMap<PlayerId, PlayerData>,
    /// Lines an NPC will pull down on its next refresh (conversation topics)
    pending_topics: HashMap<String, Vec<String>>,
    /// Dialogue queued per NPC, top of stack last
    npc_queues: HashMap<String, Vec<String>>,
    missing_hooks: HashSet<HookPoint>,
    installed_hooks: Vec<HookPoint>,
    events: Vec<HostEvent>,
}

impl InMemoryHost {
    /// Single-player session where `master` is also the local player.
    pub fn new(master: PlayerId) -> Self {
        let mut players = HashMap::new();
        players.insert(master, PlayerData::default());
        Self {
            local: master,
            master,
            weekday: Weekday::Mon,
            player_order: vec![master],
            players,
            pending_topics: HashMap::new(),
            npc_queues: HashMap::new(),
            missing_hooks: HashSet::new(),
            installed_hooks: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Add another player to the session.
    pub fn join(&mut self, player: PlayerId) {
        if !self.players.contains_key(&player) {
            self.players.insert(player, PlayerData::default());
            self.player_order.push(player);
        }
    }

    /// Switch which player this machine belongs to (co-op client view).
    pub fn set_local_player(&mut self, player: PlayerId) {
        self.join(player);
        self.local = player;
    }

    pub fn set_weekday(&mut self, weekday: Weekday) {
        self.weekday = weekday;
    }

    /// Pretend the host build lacks an interception point.
    pub fn hide_hook(&mut self, point: HookPoint) {
        self.missing_hooks.insert(point);
    }

    pub fn installed_hooks(&self) -> &[HookPoint] {
        &self.installed_hooks
    }

    pub fn queue_topic(&mut self, npc: &str, line: &str) {
        self.pending_topics
            .entry(npc.to_string())
            .or_default()
            .push(line.to_string());
    }

    pub fn queued_dialogue(&self, npc: &str) -> &[String] {
        self.npc_queues.get(npc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn inventory(&self, player: PlayerId) -> Option<&Inventory> {
        self.players.get(&player).map(|p| &p.inventory)
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    /// Every NPC line shown so far, as (npc, text).
    pub fn npc_lines(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::NpcLine { npc, text } => Some((npc.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HostEvent::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cue_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HostEvent::Cue(_)))
            .count()
    }

    fn player_mut(&mut self, player: PlayerId) -> &mut PlayerData {
        if !self.players.contains_key(&player) {
            self.player_order.push(player);
        }
        self.players.entry(player).or_default()
    }
}

impl QuestLog for InMemoryHost {
    fn add_to_quest_log(&mut self, player: PlayerId, record: NativeQuestRecord) {
        let log = &mut self.player_mut(player).quest_log;
        if log.iter().any(|r| r.id == record.id) {
            warn!("{} already has {} in its quest log", player, record.id);
            return;
        }
        log.push(record);
    }

    fn remove_from_quest_log(&mut self, player: PlayerId, id: NativeQuestId) -> Option<NativeQuestRecord> {
        let log = &mut self.players.get_mut(&player)?.quest_log;
        let index = log.iter().position(|r| r.id == id)?;
        Some(log.remove(index))
    }

    fn quest_log(&self, player: PlayerId) -> Vec<NativeQuestId> {
        self.players
            .get(&player)
            .map(|p| p.quest_log.iter().map(|r| r.id).collect())
            .unwrap_or_default()
    }

    fn quest_record(&self, player: PlayerId, id: NativeQuestId) -> Option<&NativeQuestRecord> {
        self.players.get(&player)?.quest_log.iter().find(|r| r.id == id)
    }

    fn quest_record_mut(&mut self, player: PlayerId, id: NativeQuestId) -> Option<&mut NativeQuestRecord> {
        self.players
            .get_mut(&player)?
            .quest_log
            .iter_mut()
            .find(|r| r.id == id)
    }
}

impl PlayerInventory for InMemoryHost {
    fn count_item(&self, player: PlayerId, item: &ItemId) -> u32 {
        self.players
            .get(&player)
            .map(|p| p.inventory.count(item))
            .unwrap_or(0)
    }

    fn find_item(&self, player: PlayerId, item: &ItemId) -> Option<Item> {
        self.players.get(&player)?.inventory.first(item).cloned()
    }

    fn remove_items(&mut self, player: PlayerId, item: &ItemId, count: u32) -> bool {
        let Some(data) = self.players.get_mut(&player) else {
            return false;
        };
        if data.inventory.count(item) < count {
            return false;
        }
        data.inventory.reduce_id(item, count);
        true
    }

    fn add_item(&mut self, player: PlayerId, item: Item) {
        let leftover = self.player_mut(player).inventory.add_item(&item);
        if leftover > 0 {
            debug!("Inventory full, dropping {} x{}", item.id, leftover);
            self.events.push(HostEvent::Dropped {
                player,
                item: item.id,
                count: leftover,
            });
        }
    }
}

impl NpcDialogue for InMemoryHost {
    fn refresh_pending_dialogue(&mut self, npc: &Npc, _player: PlayerId) {
        if let Some(topics) = self.pending_topics.remove(&npc.name) {
            self.npc_queues
                .entry(npc.name.clone())
                .or_default()
                .extend(topics);
        }
    }

    fn clear_dialogue(&mut self, npc: &Npc) {
        self.npc_queues.remove(&npc.name);
    }

    fn push_dialogue(&mut self, npc: &Npc, line: &str) {
        self.npc_queues
            .entry(npc.name.clone())
            .or_default()
            .push(line.to_string());
    }

    fn present_dialogue(&mut self, npc: &Npc) {
        let queued = self.npc_queues.remove(&npc.name).unwrap_or_default();
        for text in queued.into_iter().rev() {
            self.events.push(HostEvent::NpcLine {
                npc: npc.name.clone(),
                text,
            });
        }
    }
}

impl Presentation for InMemoryHost {
    fn play_cue(&mut self, cue: Cue) {
        self.events.push(HostEvent::Cue(cue));
    }

    fn hold_up_item(&mut self, player: PlayerId, item: &Item) {
        self.events.push(HostEvent::HeldUp {
            player,
            item: item.id.clone(),
        });
    }

    fn show_message(&mut self, text: &str) {
        self.events.push(HostEvent::Message(text.to_string()));
    }
}

impl ModData for InMemoryHost {
    fn mod_data(&self, player: PlayerId, key: &str) -> Option<String> {
        self.players.get(&player)?.mod_data.get(key).cloned()
    }

    fn set_mod_data(&mut self, player: PlayerId, key: &str, value: Option<&str>) {
        let data = &mut self.player_mut(player).mod_data;
        match value {
            Some(value) => {
                data.insert(key.to_string(), value.to_string());
            }
            None => {
                data.remove(key);
            }
        }
    }
}

impl GameSession for InMemoryHost {
    fn local_player(&self) -> PlayerId {
        self.local
    }

    fn master_player(&self) -> PlayerId {
        self.master
    }

    fn players(&self) -> Vec<PlayerId> {
        self.player_order.clone()
    }

    fn weekday(&self) -> Weekday {
        self.weekday
    }
}

impl HookInstaller for InMemoryHost {
    fn install_prefix(&mut self, point: HookPoint) -> QuestResult<()> {
        if self.missing_hooks.contains(&point) {
            return Err(QuestError::HookNotFound(point));
        }
        self.installed_hooks.push(point);
        Ok(())
    }
}
