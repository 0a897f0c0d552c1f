//! Quest State Tracking
//!
//! Typed per-kind progress, the derived overall status, and how progress is
//! persisted in the host's string key/value store.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::{GameSession, Host, ModData, PlayerId};

/// Stored in place of the progress value once a quest is finished.
pub const QUEST_COMPLETE_MARKER: &str = "Complete";

/// Progress for one quest kind.
///
/// `Default` is the initial stage. Unknown or missing fields in a persisted
/// value fall back to their defaults, so kinds should mark their structs
/// `#[serde(default)]`.
pub trait QuestState:
    Clone + PartialEq + Default + Debug + Serialize + DeserializeOwned + 'static
{
    /// Discrete narrative stage, ordered from first to last.
    type Stage: Copy + Ord + Debug;

    fn stage(&self) -> Self::Stage;

    /// Has progress reached (or passed) `stage`?
    fn has_reached(&self, stage: Self::Stage) -> bool {
        self.stage() >= stage
    }
}

/// Overall status of a quest kind for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverallQuestState {
    /// No quest instance yet
    NotStarted,
    /// A quest instance is live in the player's log
    InProgress,
    /// Completion has been recorded
    Complete,
}

impl OverallQuestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallQuestState::NotStarted => "not_started",
            OverallQuestState::InProgress => "in_progress",
            OverallQuestState::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(OverallQuestState::NotStarted),
            "in_progress" => Some(OverallQuestState::InProgress),
            "complete" => Some(OverallQuestState::Complete),
            _ => None,
        }
    }
}

/// What a persisted slot holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedQuest<S> {
    /// Nothing stored: quest never started (or was reset)
    Absent,
    /// Quest underway at this progress
    Active(S),
    /// Quest finished
    Complete,
}

impl<S: QuestState> PersistedQuest<S> {
    /// Decode a raw slot value. Unreadable progress decodes as the initial
    /// stage rather than failing.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => PersistedQuest::Absent,
            Some(QUEST_COMPLETE_MARKER) => PersistedQuest::Complete,
            Some(raw) => PersistedQuest::Active(decode_state(raw)),
        }
    }

    pub fn to_raw(&self) -> Option<String> {
        match self {
            PersistedQuest::Absent => None,
            PersistedQuest::Active(state) => Some(encode_state(state)),
            PersistedQuest::Complete => Some(QUEST_COMPLETE_MARKER.to_string()),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PersistedQuest::Complete)
    }

    /// Progress if active, otherwise the initial stage.
    pub fn state_or_default(&self) -> S {
        match self {
            PersistedQuest::Active(state) => state.clone(),
            _ => S::default(),
        }
    }
}

/// Serialize state for storage
pub fn encode_state<S: QuestState>(state: &S) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
}

/// Deserialize state from storage
pub fn decode_state<S: QuestState>(raw: &str) -> S {
    match serde_json::from_str(raw) {
        Ok(state) => state,
        Err(e) => {
            warn!("Unreadable quest state {:?} ({}), starting from the beginning", raw, e);
            S::default()
        }
    }
}

/// Where one quest kind keeps its progress: a single key in the master
/// player's mod data.
#[derive(Debug)]
pub struct StateSlot<S> {
    key: String,
    _state: PhantomData<fn() -> S>,
}

impl<S> Clone for StateSlot<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _state: PhantomData,
        }
    }
}

impl<S: QuestState> StateSlot<S> {
    pub fn new(prefix: &str, kind_id: &str) -> Self {
        Self {
            key: format!("{}.{}", prefix, kind_id),
            _state: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw value as stored on `player`.
    pub fn raw(&self, host: &dyn Host, player: PlayerId) -> Option<String> {
        host.mod_data(player, &self.key)
    }

    pub fn load(&self, host: &dyn Host) -> PersistedQuest<S> {
        let raw = self.raw(host, host.master_player());
        PersistedQuest::from_raw(raw.as_deref())
    }

    pub fn store(&self, host: &mut dyn Host, value: &PersistedQuest<S>) {
        let master = host.master_player();
        let raw = value.to_raw();
        host.set_mod_data(master, &self.key, raw.as_deref());
    }
}
