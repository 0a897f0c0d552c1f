//! Quest Overlay
//!
//! Data-driven side quests layered over a host game's native quest journal.
//! Quests show up in the journal as ordinary records; the interception layer
//! routes the host's completion checks for those records back to the quest
//! kind that owns them.

pub mod config;
pub mod controller;
pub mod dedup;
pub mod error;
pub mod host;
pub mod interception;
pub mod item;
pub mod kinds;
pub mod monitor;
pub mod npc;
pub mod overlay;
pub mod part_exchange;
pub mod quest;
pub mod replay;

pub use config::OverlayConfig;
pub use error::{QuestError, QuestResult};
pub use overlay::Overlay;
pub use quest::{OverallQuestState, QuestKind, QuestKindId};
