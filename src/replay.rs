//! Scripted Sessions
//!
//! Replays a TOML script of player actions against an in-memory host and
//! collects a readable transcript of everything the game showed.
//!
//! ```toml
//! weekday = "Fri"
//!
//! [[step]]
//! action = "give"
//! item = "QuestOverlay.BustedScythe"
//!
//! [[step]]
//! action = "talk"
//! npc = "Clint"
//! held = "QuestOverlay.BustedScythe"
//! ```

use std::path::Path;

use chrono::Weekday;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::error::{QuestError, QuestResult};
use crate::host::{GameSession, HostEvent, InMemoryHost, PlayerId, PlayerInventory};
use crate::item::{Item, ItemId};
use crate::npc::Npc;
use crate::overlay::Overlay;
use crate::quest::{OverallQuestState, QuestKindId};

const FARMER: PlayerId = PlayerId(1);

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Item enters the farmer's inventory
    Give {
        item: ItemId,
        #[serde(default = "one")]
        count: u32,
        #[serde(default)]
        name: Option<String>,
    },
    /// Item leaves the inventory (sold, eaten, ...)
    Take {
        item: ItemId,
        #[serde(default = "one")]
        count: u32,
    },
    Talk {
        npc: String,
        #[serde(default)]
        held: Option<ItemId>,
    },
    Offer { npc: String, item: ItemId },
    Tick {
        #[serde(default = "one")]
        times: u32,
    },
    NewDay {
        #[serde(default)]
        weekday: Option<Weekday>,
    },
    /// Use the held item at the garage
    Install { item: ItemId },
    Load,
    Save,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    /// Day of the week the session starts on
    #[serde(default)]
    pub weekday: Option<Weekday>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(text: &str) -> QuestResult<Self> {
        toml::from_str(text).map_err(|source| QuestError::Parse {
            what: "replay script".to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> QuestResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| QuestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct Replay {
    host: InMemoryHost,
    overlay: Overlay,
    transcript: Vec<String>,
}

impl Replay {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            host: InMemoryHost::new(FARMER),
            overlay: Overlay::with_builtin_quests(config),
            transcript: Vec::new(),
        }
    }

    pub fn host(&self) -> &InMemoryHost {
        &self.host
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn overall_state(&self, kind: QuestKindId) -> Option<OverallQuestState> {
        self.overlay.overall_state(&self.host, kind, FARMER)
    }

    /// Final state of every quest kind, in registration order.
    pub fn summary(&self) -> Vec<(QuestKindId, OverallQuestState)> {
        self.overlay
            .kinds()
            .into_iter()
            .filter_map(|kind| self.overall_state(kind).map(|state| (kind, state)))
            .collect()
    }

    /// Load the session and run every step. Stops at the first step that
    /// can't be carried out.
    pub fn run(&mut self, script: &Script) -> QuestResult<()> {
        if let Some(weekday) = script.weekday {
            self.host.set_weekday(weekday);
        }
        self.overlay.on_session_loaded(&mut self.host);
        self.record_events();

        for (index, step) in script.steps.iter().enumerate() {
            debug!("Step {}: {:?}", index + 1, step);
            self.apply(index + 1, step)?;
            self.record_events();
        }
        info!("Replayed {} steps", script.steps.len());
        Ok(())
    }

    fn apply(&mut self, index: usize, step: &Step) -> QuestResult<()> {
        match step {
            Step::Give { item, count, name } => {
                self.transcript.push(format!("> give {} x{}", item, count));
                let mut given = Item::new(item.clone()).with_stack(*count);
                if let Some(name) = name {
                    given = given.with_display_name(name.clone());
                }
                self.host.add_item(FARMER, given);
                // Items are noticed on the next poll
                self.overlay.on_one_second_tick(&mut self.host);
            }
            Step::Take { item, count } => {
                self.transcript.push(format!("> take {} x{}", item, count));
                if !self.host.remove_items(FARMER, item, *count) {
                    return Err(QuestError::Replay {
                        step: index,
                        message: format!("farmer has fewer than {} of {}", count, item),
                    });
                }
            }
            Step::Talk { npc, held } => {
                let held = match held {
                    Some(id) => Some(self.held(index, id)?),
                    None => None,
                };
                match &held {
                    Some(item) => self.transcript.push(format!("> talk {} holding {}", npc, item.id)),
                    None => self.transcript.push(format!("> talk {}", npc)),
                }
                self.overlay.talk_to(&mut self.host, &Npc::new(npc), held.as_ref());
            }
            Step::Offer { npc, item } => {
                let offered = self.held(index, item)?;
                self.transcript.push(format!("> offer {} to {}", offered.id, npc));
                if !self.overlay.offer_item(&mut self.host, &Npc::new(npc), &offered) {
                    self.transcript.push(format!("({} isn't interested)", npc));
                }
            }
            Step::Tick { times } => {
                self.transcript.push(format!("> tick x{}", times));
                for _ in 0..*times {
                    self.overlay.on_one_second_tick(&mut self.host);
                }
            }
            Step::NewDay { weekday } => {
                if let Some(weekday) = weekday {
                    self.host.set_weekday(*weekday);
                }
                self.transcript.push(format!("> new day ({})", self.host.weekday()));
                self.overlay.on_day_started(&mut self.host);
            }
            Step::Install { item } => {
                let held = self.held(index, item)?;
                self.transcript.push(format!("> install {}", held.id));
                if !self.overlay.on_item_installed(&mut self.host, &held) {
                    self.transcript.push("(nothing happens)".to_string());
                }
            }
            Step::Load => {
                self.transcript.push("> load".to_string());
                // A reloaded save never carries our records
                self.overlay.before_save(&mut self.host);
                self.overlay.on_session_loaded(&mut self.host);
            }
            Step::Save => {
                self.transcript.push("> save".to_string());
                self.overlay.before_save(&mut self.host);
                self.overlay.after_save(&mut self.host);
            }
        }
        Ok(())
    }

    /// The farmer's stack of `id`; holding something not in the inventory is
    /// a script error.
    fn held(&self, index: usize, id: &ItemId) -> QuestResult<Item> {
        self.host.find_item(FARMER, id).ok_or_else(|| QuestError::Replay {
            step: index,
            message: format!("farmer is not carrying {}", id),
        })
    }

    fn record_events(&mut self) {
        for event in self.host.take_events() {
            self.transcript.push(describe(&event));
        }
    }
}

fn describe(event: &HostEvent) -> String {
    match event {
        HostEvent::NpcLine { npc, text } => format!("{}: {}", npc, text),
        HostEvent::Message(text) => format!("[message] {}", text),
        HostEvent::Cue(cue) => format!("[cue] {:?}", cue),
        HostEvent::HeldUp { item, .. } => format!("[found] {}", item),
        HostEvent::Dropped { item, count, .. } => format!("[dropped] {} x{}", item, count),
    }
}
