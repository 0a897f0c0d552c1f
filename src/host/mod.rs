//! Host Collaborators
//!
//! Everything the overlay needs from the game it runs inside. The overlay
//! never reaches into host internals; it only talks through these traits.

pub mod memory;

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::QuestResult;
use crate::item::{Item, ItemId};
use crate::npc::Npc;

pub use memory::{HostEvent, InMemoryHost};

// ============================================================================
// Handles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Identity of a host quest record. Allocated by the interception layer and
/// never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeQuestId(pub u64);

impl fmt::Display for NativeQuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quest#{}", self.0)
    }
}

/// The host's own quest record. We only use its identity and the text fields
/// the journal shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeQuestRecord {
    pub id: NativeQuestId,
    pub title: String,
    pub description: String,
    pub current_objective: String,
    pub completed: bool,
    /// Journal shows the "new" marker until the player opens it
    pub show_new: bool,
}

impl NativeQuestRecord {
    pub fn new(id: NativeQuestId) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            current_objective: String::new(),
            completed: false,
            show_new: false,
        }
    }
}

/// The two host quest-completion callbacks the overlay redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    /// Player talked to an NPC
    NpcSocialized,
    /// Player offered the held item to an NPC
    ItemOfferedToNpc,
}

impl HookPoint {
    pub const ALL: [HookPoint; 2] = [HookPoint::NpcSocialized, HookPoint::ItemOfferedToNpc];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::NpcSocialized => "on_npc_socialized",
            HookPoint::ItemOfferedToNpc => "on_item_offered_to_npc",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio/visual cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    /// Journal-update jingle played when a quest advances
    QuestProgress,
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// The player's quest journal.
pub trait QuestLog {
    fn add_to_quest_log(&mut self, player: PlayerId, record: NativeQuestRecord);
    fn remove_from_quest_log(&mut self, player: PlayerId, id: NativeQuestId) -> Option<NativeQuestRecord>;
    /// Record ids in journal order.
    fn quest_log(&self, player: PlayerId) -> Vec<NativeQuestId>;
    fn quest_record(&self, player: PlayerId, id: NativeQuestId) -> Option<&NativeQuestRecord>;
    fn quest_record_mut(&mut self, player: PlayerId, id: NativeQuestId) -> Option<&mut NativeQuestRecord>;
}

/// Inventory scanning and mutation.
pub trait PlayerInventory {
    /// Total units of `item` across all stacks.
    fn count_item(&self, player: PlayerId, item: &ItemId) -> u32;
    /// First non-empty stack of `item`.
    fn find_item(&self, player: PlayerId, item: &ItemId) -> Option<Item>;
    /// Remove `count` units from the union of matching stacks. Returns false
    /// (and removes nothing) if the player holds fewer.
    fn remove_items(&mut self, player: PlayerId, item: &ItemId, count: u32) -> bool;
    /// Add to inventory, letting the host deal with overflow.
    fn add_item(&mut self, player: PlayerId, item: Item);
}

/// NPC dialogue queue.
pub trait NpcDialogue {
    /// Let the NPC pull down any condition-based dialogue it has pending.
    fn refresh_pending_dialogue(&mut self, npc: &Npc, player: PlayerId);
    fn clear_dialogue(&mut self, npc: &Npc);
    fn push_dialogue(&mut self, npc: &Npc, line: &str);
    /// Open the dialogue box for whatever is queued.
    fn present_dialogue(&mut self, npc: &Npc);
}

/// Fire-and-forget display side effects.
pub trait Presentation {
    fn play_cue(&mut self, cue: Cue);
    /// Player holds the item over their head with its name shown.
    fn hold_up_item(&mut self, player: PlayerId, item: &Item);
    /// Dialogue box with no speaker.
    fn show_message(&mut self, text: &str);
}

/// Per-player persisted key/value store (saved with the host's save file).
pub trait ModData {
    fn mod_data(&self, player: PlayerId, key: &str) -> Option<String>;
    /// `None` removes the key.
    fn set_mod_data(&mut self, player: PlayerId, key: &str, value: Option<&str>);
}

/// Who is playing and when.
pub trait GameSession {
    /// The player on this machine.
    fn local_player(&self) -> PlayerId;
    /// The host player whose save is authoritative.
    fn master_player(&self) -> PlayerId;
    fn is_master_game(&self) -> bool {
        self.local_player() == self.master_player()
    }
    /// Every player currently in the session, master first.
    fn players(&self) -> Vec<PlayerId>;
    fn weekday(&self) -> Weekday;
}

/// Access to the host's quest-completion callback slots.
pub trait HookInstaller {
    /// Install a prefix on `point` that routes through the overlay first.
    fn install_prefix(&mut self, point: HookPoint) -> QuestResult<()>;
}

/// Everything at once. Implemented for any type that provides all parts.
pub trait Host:
    QuestLog + PlayerInventory + NpcDialogue + Presentation + ModData + GameSession + HookInstaller
{
}

impl<T> Host for T where
    T: QuestLog + PlayerInventory + NpcDialogue + Presentation + ModData + GameSession + HookInstaller
{
}
