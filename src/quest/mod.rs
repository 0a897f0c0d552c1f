//! Quest Module
//!
//! Typed quest progress, the per-kind strategy trait, and the shim that
//! presents a quest to the host as one of its own journal records.

pub mod kind;
pub mod shim;
pub mod state;
pub mod trade;

pub use kind::{QuestKind, QuestKindId};
pub use shim::{InterceptTarget, QuestCtx, QuestShim};
pub use state::{OverallQuestState, PersistedQuest, QuestState, StateSlot, QUEST_COMPLETE_MARKER};
