//! Quest kinds shipped with the overlay.

pub mod scythe;

pub use scythe::{ScytheConfig, ScytheProgress, ScytheQuest, ScytheQuestState, SCYTHE_QUEST};
