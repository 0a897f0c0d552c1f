//! Quest Kinds
//!
//! A quest kind is the per-quest strategy plugged into the generic shim and
//! controller: its text, its conversation-piece predicate, and the dialogue
//! logic run whenever the player talks to someone.

use std::fmt;

use super::shim::QuestCtx;
use super::state::QuestState;
use crate::item::Item;
use crate::npc::Npc;

/// Compile-time identity of a quest kind. Also names its controller, since
/// there is exactly one controller per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestKindId(pub &'static str);

impl QuestKindId {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for QuestKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub trait QuestKind: Send + Sync + 'static {
    type State: QuestState;

    fn id(&self) -> QuestKindId;

    fn title(&self) -> String;

    fn description(&self) -> String;

    /// Journal objective for a given progress. Must be pure.
    fn objective(&self, state: &Self::State) -> String;

    /// True if holding `item` means the player wants to talk about this quest.
    fn is_conversation_piece(&self, item: &Item) -> bool;

    /// React to the player talking to `npc` (optionally holding `item`).
    ///
    /// A priority-ordered chain: at most one branch fires. NPCs with nothing
    /// to say about this quest fall through without effect.
    fn check_if_complete(&self, quest: &mut QuestCtx<'_, Self>, npc: &Npc, item: Option<&Item>)
    where
        Self: Sized;
}
