//! Scythe Attachment Quest
//!
//! The harvester attachment turns up broken in the south pasture with two
//! pieces missing. Townsfolk eventually point at Jas and Vincent, who each
//! kept a piece and want something in return.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemId};
use crate::npc::Npc;
use crate::part_exchange::{is_broken_part, PartQuestKind};
use crate::quest::{QuestCtx, QuestKind, QuestKindId, QuestState};

pub const SCYTHE_QUEST: QuestKindId = QuestKindId("scythe");

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScytheConfig {
    /// Starts the quest when picked up
    pub broken_part: ItemId,
    /// Crafted from the two kids' pieces; installed at the garage
    pub working_part: ItemId,
    /// Vincent's piece
    pub vincent_part: ItemId,
    /// Jas's piece
    pub jas_part: ItemId,
    /// What Vincent wants, and how many
    pub trade_item: ItemId,
    pub trade_count: u32,
    /// Any one of these satisfies Jas, first match wins
    pub shiny_items: Vec<ItemId>,
    /// Days the Wizard will scry
    pub wizard_days: Vec<Weekday>,
}

impl Default for ScytheConfig {
    fn default() -> Self {
        Self {
            broken_part: ItemId::new("QuestOverlay.BustedScythe"),
            working_part: ItemId::new("QuestOverlay.WorkingScythe"),
            vincent_part: ItemId::new("QuestOverlay.ScythePart1"),
            jas_part: ItemId::new("QuestOverlay.ScythePart2"),
            trade_item: ItemId::new("(O)716"), // crayfish
            trade_count: 3,
            shiny_items: ["(O)80", "(O)82", "(O)68", "(O)66", "(O)60", "(O)62", "(O)70"]
                .into_iter()
                .map(ItemId::new)
                .collect(),
            wizard_days: vec![Weekday::Fri, Weekday::Sat],
        }
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ScytheProgress {
    #[default]
    NoCluesYet,
    MissingParts,
    JasAndVincentFingered,
    InstallPart,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScytheQuestState {
    pub progress: ScytheProgress,
    pub jas_trade_known: bool,
    pub vincent_trade_known: bool,
    pub jas_part_got: bool,
    pub vincent_part_got: bool,
}

impl QuestState for ScytheQuestState {
    type Stage = ScytheProgress;

    fn stage(&self) -> ScytheProgress {
        self.progress
    }
}

impl ScytheQuestState {
    fn reach(&mut self, progress: ScytheProgress) {
        self.progress = self.progress.max(progress);
    }

    fn both_trades_known(&self) -> bool {
        self.jas_trade_known && self.vincent_trade_known
    }

    fn both_parts_got(&self) -> bool {
        self.jas_part_got && self.vincent_part_got
    }
}

// ============================================================================
// Quest kind
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ScytheQuest {
    config: ScytheConfig,
}

impl ScytheQuest {
    pub fn new(config: ScytheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScytheConfig {
        &self.config
    }

    fn wizard_available(&self, day: Weekday) -> bool {
        self.config.wizard_days.contains(&day)
    }
}

impl QuestKind for ScytheQuest {
    type State = ScytheQuestState;

    fn id(&self) -> QuestKindId {
        SCYTHE_QUEST
    }

    fn title(&self) -> String {
        "Fix the harvester".to_string()
    }

    fn description(&self) -> String {
        "I dug the tractor's harvester attachment out of the pasture, but it won't work as it is. Somebody in town might know something about it."
            .to_string()
    }

    fn objective(&self, state: &ScytheQuestState) -> String {
        let text = match state.progress {
            ScytheProgress::NoCluesYet => "Ask around town about this thing.",
            ScytheProgress::MissingParts => {
                "Some pieces seem to be missing, and there's nothing else lying out in that field. Maybe someone who pokes around the farm knows where they went."
            }
            ScytheProgress::JasAndVincentFingered => {
                if !state.both_trades_known() {
                    "Ask Jas and Vincent about the harvester."
                } else if state.both_parts_got() {
                    "Put the scythe attachment back together (craft it from the parts)."
                } else {
                    "Find something shiny for Jas (a gem, maybe?) and three big bugs for Vincent. Mine bugs are TOO big... a crayfish, perhaps?"
                }
            }
            ScytheProgress::InstallPart => "Take the repaired scythe attachment to the tractor garage.",
        };
        text.to_string()
    }

    fn is_conversation_piece(&self, item: &Item) -> bool {
        is_broken_part(self, item)
    }

    fn check_if_complete(&self, quest: &mut QuestCtx<'_, Self>, npc: &Npc, item: Option<&Item>) {
        use ScytheProgress::*;

        let holding_broken = item.is_some_and(|i| is_broken_part(self, i));
        let state = quest.state();
        let name = npc.name.as_str();

        if name == "Clint" && state.progress < MissingParts {
            quest.spout(
                npc,
                "Let's have a look...$s#$b#There's no real smithing needed. Give it a good clean and some oil and it'll run.$h#$b#Still, it looks short a piece or two. Are you sure you got all of it out of the weeds?",
            );
            quest.update_state(|s| s.reach(MissingParts));
        } else if name == "Robin" && holding_broken && state.progress < InstallPart {
            quest.spout(
                npc,
                "The old harvester! Your grandpa broke nearly everything on that tractor, but I don't remember anything happening to this. Demetrius or Maru might be able to get it going.",
            );
        } else if npc.is_any(&["Maru", "Demetrius"]) && state.progress < MissingParts {
            quest.spout(
                npc,
                "Oh, the old harvester! It looks sound enough, but I don't think it's all there. Some parts seem to be missing.#$b#You could get it running again if you find the rest. Let me know if you want a hand.",
            );
            quest.update_state(|s| s.reach(MissingParts));
        } else if name == "Lewis" && holding_broken && state.progress < InstallPart {
            quest.spout(
                npc,
                "I'm no expert on farm machinery. A harvester, you say? I'll take your word for it!$h#$b#He broke plenty on that tractor, but not that, as far as I recall. Maybe it just needs a cleaning?",
            );
        } else if name == "Marnie" && holding_broken && state.progress < JasAndVincentFingered {
            quest.spout(
                npc,
                "That's the old harvester! Most of it, anyway...$s#$b#Did you look around where you found it? There could be more under that log.#$b#Jas and Vincent used to play in your south pasture before you moved in. I told them to keep out so you could work, but they know that ground better than anyone.",
            );
            quest.update_state(|s| s.reach(JasAndVincentFingered));
        } else if name == "Penny" && holding_broken && state.progress == NoCluesYet {
            quest.spout(
                npc,
                "That's part of the tractor? I'll believe you.#$b#Sorry, I really don't know anything about farming.$2",
            );
        } else if name == "Penny" && state.progress == MissingParts {
            quest.spout(
                npc,
                "Missing parts for a 'harvester'?$s#$b#Try Jas and Vincent. They said they used to play in your south pasture until Marnie shooed them out.$4",
            );
            quest.update_state(|s| s.reach(JasAndVincentFingered));
        } else if name == "Abigail" && (holding_broken || state.progress < JasAndVincentFingered) {
            quest.spout(
                npc,
                "Oh, I've seen that thing, jammed under a tree, right? Getting it out must have been a job!#$b#Did Jas or Vincent tell you where it was? They used to play around it all the time.",
            );
            quest.update_state(|s| s.reach(JasAndVincentFingered));
        } else if name == "Jodi" && holding_broken && state.progress == NoCluesYet {
            quest.spout(
                npc,
                "A harvester? If you say so... Funny, it looks familiar somehow.$s#$b#Well, it looks like a mess, and I've cleaned up plenty of those. That must be it!$l",
            );
        } else if name == "Jodi" && state.progress == MissingParts {
            quest.spout(
                npc,
                "You think it's incomplete?$s#$b#Ask Jas and Vincent. They used to play out in your south pasture, but don't worry, Marnie and I told them to stay out once you moved in.#$b#You have enough to do without those two tearing through the corn!$l",
            );
            quest.update_state(|s| s.reach(JasAndVincentFingered));
        } else if name == "Wizard"
            && (holding_broken || !state.both_trades_known())
            && !state.both_parts_got()
            && self.wizard_available(quest.weekday())
        {
            quest.spout(
                npc,
                "Aha! I FORESEE THAT YOU REQUIRE A SCRYING!$a#$b#The mists part... I see two CHILDREN playing on your farm...#$b#They have carried off pieces of your machine...#$b#Each must be appeased. The boy desires three crayfish. The girl desires a gemstone, though her tastes are young, so a humble one will do.",
            );
            // The kids don't know the player knows, so the trade flags stay put.
            quest.update_state(|s| s.reach(JasAndVincentFingered));
        } else if name == "Wizard"
            && holding_broken
            && !state.both_parts_got()
            && !self.wizard_available(quest.weekday())
        {
            quest.spout(npc, "BAH! Take this mundane contraption away! Return at the end of the week and perhaps I will have time.$a");
        } else if name == "Jas" && holding_broken && state.jas_part_got {
            quest.spout(npc, "My jumprope is so sparkly in the sun now! Did the pieces fit back together?");
        } else if name == "Jas" && state.jas_trade_known && !state.jas_part_got {
            if let Some(gem) = quest.try_take_any(&self.config.shiny_items, 1) {
                quest.add_quest_item(&self.config.jas_part);
                let line = format!(
                    "Ooh! This {} is SO sparkly! Thank you! Here's your thingamajig. I hope it works, I really want to ride your tractor someday!$l",
                    gem.display_name
                );
                quest.spout(npc, &line);
                quest.update_state(|s| s.jas_part_got = true);
            } else if holding_broken {
                quest.spout(npc, "When are you going to bring me something shiny? I can't wait!");
            }
        } else if name == "Jas" && !state.jas_trade_known {
            quest.spout(
                npc,
                "Ooh! You found the Greeble machine!$h#$b#Vincent and I used to play with it, but Aunt Marnie said we can't go in your pasture anymore unless you invite us.#$b#Missing parts? Well, sure! We kept the shiny bits. One's on my jumprope, it sparkles when I jump! FINDERS KEEPERS!$l#$b#I guess I could give it back... BUT ONLY IF YOU TRADE ME SOMETHING REALLY SHINY!$h",
            );
            quest.update_state(|s| {
                s.reach(JasAndVincentFingered);
                s.jas_trade_known = true;
            });
        } else if name == "Vincent" && holding_broken && state.vincent_part_got {
            quest.spout(npc, "Did you get it back together? I could help, it came apart really easy!$l");
        } else if name == "Vincent"
            && state.vincent_trade_known
            && !state.vincent_part_got
            && quest.try_take_items(&self.config.trade_item, self.config.trade_count)
        {
            quest.add_quest_item(&self.config.vincent_part);
            quest.spout(
                npc,
                "Whoa, these crawdads are great! Thanks! Here's your thingamajig, I hope it works!$l#$b#I won't tell Mom you gave them to me if you don't want... Why?$s",
            );
            quest.update_state(|s| s.vincent_part_got = true);
        } else if name == "Vincent" && state.vincent_trade_known && !state.vincent_part_got {
            quest.spout(npc, "Did you find the bugs yet? Three big ones!");
        } else if name == "Vincent" && !state.vincent_trade_known {
            quest.spout(
                npc,
                "The Greeble machine!$h#$b#Jas and I used to play with that, but Marnie said we can't go in your pasture unless you invite us.#$b#Missing parts? Yeah, we each took one. I put mine in a trap for the Greebles under my bed. It didn't work.#$b#Hey, got any good bugs on your farm? Bring me some really big crawly ones and I'll find it for you!$h",
            );
            quest.update_state(|s| {
                s.reach(JasAndVincentFingered);
                s.vincent_trade_known = true;
            });
        }
    }
}

impl PartQuestKind for ScytheQuest {
    fn broken_part_id(&self) -> &ItemId {
        &self.config.broken_part
    }

    fn working_part_id(&self) -> &ItemId {
        &self.config.working_part
    }

    fn quest_complete_message(&self) -> String {
        "The harvester attachment is back on the tractor. Time to bring in the crops!".to_string()
    }

    fn got_working_part(&self, state: &ScytheQuestState) -> ScytheQuestState {
        ScytheQuestState {
            progress: ScytheProgress::InstallPart,
            ..state.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::controller::ManagedController;
    use crate::host::{
        Cue, GameSession, HostEvent, InMemoryHost, ModData, PlayerId, PlayerInventory, QuestLog,
    };
    use crate::overlay::Overlay;
    use crate::part_exchange::PartQuestController;
    use crate::quest::{OverallQuestState, PersistedQuest, StateSlot};

    const FARMER: PlayerId = PlayerId(1);

    struct Session {
        host: InMemoryHost,
        overlay: Overlay,
        config: ScytheConfig,
    }

    impl Session {
        fn new() -> Self {
            let config = OverlayConfig::default();
            let mut host = InMemoryHost::new(FARMER);
            let mut overlay = Overlay::with_builtin_quests(&config);
            overlay.on_session_loaded(&mut host);
            Self {
                host,
                overlay,
                config: config.scythe,
            }
        }

        fn slot(&self) -> StateSlot<ScytheQuestState> {
            StateSlot::new(&OverlayConfig::default().state_key_prefix, SCYTHE_QUEST.as_str())
        }

        fn state(&self) -> ScytheQuestState {
            self.slot().load(&self.host).state_or_default()
        }

        /// Jump straight to `state` with the quest live.
        fn with_state(state: ScytheQuestState) -> Self {
            let mut session = Self::new();
            session.start();
            let slot = session.slot();
            slot.store(&mut session.host, &PersistedQuest::Active(state));
            session.overlay.on_day_started(&mut session.host);
            session.host.take_events();
            session
        }

        fn overall(&self) -> Option<OverallQuestState> {
            self.overlay.overall_state(&self.host, SCYTHE_QUEST, FARMER)
        }

        fn give(&mut self, item: Item) {
            self.host.add_item(FARMER, item);
            self.overlay.on_one_second_tick(&mut self.host);
        }

        fn start(&mut self) {
            let broken = Item::new(self.config.broken_part.clone()).as_quest_item();
            self.give(broken);
        }

        fn broken(&self) -> Item {
            Item::new(self.config.broken_part.clone())
        }

        fn talk(&mut self, name: &str, held: Option<Item>) -> bool {
            self.overlay.talk_to(&mut self.host, &Npc::new(name), held.as_ref())
        }

        fn lines_from(&self, name: &str) -> usize {
            self.host.npc_lines().iter().filter(|(npc, _)| npc == name).count()
        }

        fn objective(&self) -> String {
            let record = self.host.quest_log(FARMER)[0];
            self.host.quest_record(FARMER, record).unwrap().current_objective.clone()
        }

        fn count(&self, id: &ItemId) -> u32 {
            self.host.count_item(FARMER, id)
        }
    }

    fn fingered() -> ScytheQuestState {
        ScytheQuestState {
            progress: ScytheProgress::JasAndVincentFingered,
            jas_trade_known: true,
            vincent_trade_known: true,
            ..ScytheQuestState::default()
        }
    }

    // ========================================================================
    // End-to-end scenarios
    // ========================================================================

    #[test]
    fn test_scenario_a_broken_part_starts_quest() {
        let mut s = Session::new();
        assert_eq!(s.overall(), Some(OverallQuestState::NotStarted));

        s.start();

        assert!(s.host.events().iter().any(|e| matches!(e, HostEvent::HeldUp { .. })));
        assert_eq!(s.overall(), Some(OverallQuestState::InProgress));
        assert_eq!(s.state(), ScytheQuestState::default());
        assert_eq!(s.objective(), "Ask around town about this thing.");

        let record = s.host.quest_log(FARMER)[0];
        assert!(s.host.quest_record(FARMER, record).unwrap().show_new);
        assert!(s.overlay.layer().is_owned(record));
    }

    #[test]
    fn test_scenario_b_clint_speaks_once() {
        let mut s = Session::new();
        s.start();

        assert!(s.talk("Clint", Some(s.broken())));
        assert_eq!(s.lines_from("Clint"), 1);
        assert_eq!(s.state().progress, ScytheProgress::MissingParts);
        assert_eq!(s.host.cue_count(), 1);

        assert!(!s.talk("Clint", None));
        assert!(!s.talk("Clint", Some(s.broken())));
        assert_eq!(s.lines_from("Clint"), 1);
    }

    #[test]
    fn test_scenario_b_held_part_repeats_robin() {
        let mut s = Session::new();
        s.start();

        assert!(s.talk("Robin", Some(s.broken())));
        assert!(s.talk("Robin", Some(s.broken())));
        assert_eq!(s.lines_from("Robin"), 2);

        // Robin has nothing to say without the part
        assert!(!s.talk("Robin", None));
        assert_eq!(s.state().progress, ScytheProgress::NoCluesYet);
    }

    #[test]
    fn test_scenario_c_vincent_without_bugs() {
        let mut s = Session::with_state(fingered());
        s.host.add_item(FARMER, Item::new("716").with_stack(2));

        assert!(s.talk("Vincent", None));
        assert_eq!(s.host.npc_lines()[0].1, "Did you find the bugs yet? Three big ones!");
        assert_eq!(s.count(&ItemId::new("716")), 2);
        assert_eq!(s.count(&s.config.vincent_part), 0);
        assert!(!s.state().vincent_part_got);
    }

    #[test]
    fn test_scenario_d_vincent_trade() {
        let mut s = Session::with_state(fingered());
        s.host.add_item(FARMER, Item::new("(O)716").with_stack(5));
        let objective_before = s.objective();

        assert!(s.talk("Vincent", None));
        assert_eq!(s.count(&ItemId::new("716")), 2);

        let part = s.host.find_item(FARMER, &s.config.vincent_part).unwrap();
        assert!(part.quest_item);
        assert_eq!(part.stack, 1);
        assert!(s.state().vincent_part_got);
        assert_eq!(s.host.cue_count(), 1);
        assert_eq!(s.objective(), objective_before);

        // Jas next; the objective moves once both pieces are in
        s.host.add_item(FARMER, Item::new("(O)66").with_display_name("Amethyst"));
        assert!(s.talk("Jas", None));
        assert!(s.state().jas_part_got);
        assert!(s.host.npc_lines().last().unwrap().1.contains("Amethyst"));
        assert_eq!(s.objective(), "Put the scythe attachment back together (craft it from the parts).");
    }

    #[test]
    fn test_scenario_e_working_part_advances_once() {
        let mut s = Session::with_state(ScytheQuestState {
            jas_part_got: true,
            vincent_part_got: true,
            ..fingered()
        });

        let working = Item::new(s.config.working_part.clone()).as_quest_item();
        s.give(working);
        assert_eq!(s.state().progress, ScytheProgress::InstallPart);
        assert!(s.state().jas_part_got);
        assert_eq!(s.objective(), "Take the repaired scythe attachment to the tractor garage.");

        let cues = s.host.cue_count();
        s.overlay.on_one_second_tick(&mut s.host);
        s.overlay.on_one_second_tick(&mut s.host);
        assert_eq!(s.host.cue_count(), cues);
    }

    #[test]
    fn test_scenario_f_install_completes() {
        let mut s = Session::new();
        s.start();
        let working = Item::new(s.config.working_part.clone()).as_quest_item();
        s.give(working.clone());
        let record = s.host.quest_log(FARMER)[0];

        assert!(s.overlay.on_item_installed(&mut s.host, &working));

        assert_eq!(s.overall(), Some(OverallQuestState::Complete));
        assert_eq!(s.count(&s.config.working_part), 0);
        assert_eq!(
            s.host.messages(),
            vec!["The harvester attachment is back on the tractor. Time to bring in the crops!".to_string()]
        );
        assert!(!s.overlay.layer().is_owned(record));
        assert!(s.host.quest_log(FARMER).is_empty());
        assert_eq!(
            s.host.mod_data(FARMER, s.slot().key()).as_deref(),
            Some("Complete")
        );

        // Finding another broken part doesn't restart anything
        s.start();
        assert_eq!(s.overall(), Some(OverallQuestState::Complete));
    }

    // ========================================================================
    // Dialogue chain details
    // ========================================================================

    #[test]
    fn test_abigail_never_moves_progress_back() {
        let mut s = Session::with_state(ScytheQuestState {
            progress: ScytheProgress::InstallPart,
            jas_part_got: true,
            vincent_part_got: true,
            ..fingered()
        });

        assert!(s.talk("Abigail", Some(s.broken())));
        let state = s.state();
        assert_eq!(state.progress, ScytheProgress::InstallPart);
        assert!(state.both_parts_got());
        assert_eq!(s.host.cue_count(), 0);
    }

    #[test]
    fn test_wizard_only_scries_on_his_days() {
        let mut s = Session::new();
        s.start();
        s.host.set_weekday(Weekday::Mon);

        assert!(s.talk("Wizard", Some(s.broken())));
        assert!(s.host.npc_lines()[0].1.starts_with("BAH!"));
        assert_eq!(s.state().progress, ScytheProgress::NoCluesYet);

        // Nothing to say on an off day without the part
        assert!(!s.talk("Wizard", None));

        s.host.set_weekday(Weekday::Fri);
        assert!(s.talk("Wizard", None));
        let state = s.state();
        assert_eq!(state.progress, ScytheProgress::JasAndVincentFingered);
        assert!(!state.jas_trade_known && !state.vincent_trade_known);
        assert_eq!(s.objective(), "Ask Jas and Vincent about the harvester.");
    }

    #[test]
    fn test_kids_reveal_their_trades() {
        let mut s = Session::new();
        s.start();

        assert!(s.talk("Jas", None));
        assert!(s.state().jas_trade_known);
        assert_eq!(s.state().progress, ScytheProgress::JasAndVincentFingered);
        assert_eq!(s.objective(), "Ask Jas and Vincent about the harvester.");

        assert!(s.talk("Vincent", None));
        assert!(s.state().vincent_trade_known);
        assert!(s.objective().starts_with("Find something shiny for Jas"));
    }

    #[test]
    fn test_jas_waits_for_something_shiny() {
        let mut s = Session::with_state(fingered());

        // Nothing shiny, not holding the part: nothing to say
        assert!(!s.talk("Jas", None));
        assert!(s.talk("Jas", Some(s.broken())));
        assert!(!s.state().jas_part_got);

        // First listed gem wins over a later one
        s.host.add_item(FARMER, Item::new("(O)70"));
        s.host.add_item(FARMER, Item::new("(O)80").with_stack(2));
        assert!(s.talk("Jas", None));
        assert_eq!(s.count(&ItemId::new("80")), 1);
        assert_eq!(s.count(&ItemId::new("70")), 1);
        assert!(s.host.find_item(FARMER, &s.config.jas_part).unwrap().quest_item);
    }

    #[test]
    fn test_unrelated_npc_is_a_no_op() {
        let mut s = Session::new();
        s.start();
        s.host.take_events();

        assert!(!s.talk("Gus", Some(s.broken())));
        assert!(!s.talk("Pierre", None));
        assert!(s.host.events().is_empty());
        assert_eq!(s.state(), ScytheQuestState::default());
    }

    #[test]
    fn test_offer_probe_only_wants_broken_part() {
        let mut s = Session::new();
        s.start();

        let broken = s.broken();
        assert!(s.overlay.offer_item(&mut s.host, &Npc::new("Robin"), &broken));
        let working = Item::new(s.config.working_part.clone());
        assert!(!s.overlay.offer_item(&mut s.host, &Npc::new("Robin"), &working));
    }

    #[test]
    fn test_objective_text_is_pure() {
        let quest = ScytheQuest::default();
        let state = fingered();
        assert_eq!(quest.objective(&state), quest.objective(&state.clone()));
        assert_eq!(
            quest.objective(&ScytheQuestState {
                progress: ScytheProgress::MissingParts,
                ..ScytheQuestState::default()
            })
            .split_whitespace()
            .next(),
            Some("Some")
        );
    }

    #[test]
    fn test_unknown_persisted_fields_start_over() {
        let mut s = Session::new();
        let slot = s.slot();
        s.host
            .set_mod_data(FARMER, slot.key(), Some(r#"{"progress":"Polishing","jas_trade_known":true}"#));
        s.overlay.on_day_started(&mut s.host);

        assert_eq!(s.overall(), Some(OverallQuestState::InProgress));
        assert_eq!(s.state(), ScytheQuestState::default());
    }

    #[test]
    fn test_progress_cue_only_on_change() {
        let mut s = Session::new();
        s.start();
        s.talk("Abigail", None);
        s.talk("Abigail", Some(s.broken()));
        let cues = s
            .host
            .events()
            .iter()
            .filter(|e| matches!(e, HostEvent::Cue(Cue::QuestProgress)))
            .count();
        assert_eq!(cues, 1);
    }

    #[test]
    fn test_farmhand_sees_master_progress() {
        let mut s = Session::new();
        s.start();

        // Same save seen from a farmhand's machine
        let farmhand = PlayerId(2);
        s.host.set_local_player(farmhand);
        assert!(!s.host.is_master_game());
        let mut remote = Overlay::with_builtin_quests(&OverlayConfig::default());
        remote.on_session_loaded(&mut s.host);
        assert_eq!(
            remote.overall_state(&s.host, SCYTHE_QUEST, farmhand),
            Some(OverallQuestState::InProgress)
        );

        // Master finishes; the farmhand's mirror goes away on the next tick
        let slot = s.slot();
        slot.store(&mut s.host, &PersistedQuest::Complete);
        remote.on_one_second_tick(&mut s.host);
        assert!(s.host.quest_log(farmhand).is_empty());
        assert_eq!(
            remote.overall_state(&s.host, SCYTHE_QUEST, farmhand),
            Some(OverallQuestState::Complete)
        );
    }

    #[test]
    fn test_farmhand_dialogue_advances_master_progress() {
        let mut s = Session::new();
        s.start();

        let farmhand = PlayerId(2);
        s.host.set_local_player(farmhand);
        let mut remote = Overlay::with_builtin_quests(&OverlayConfig::default());
        remote.on_session_loaded(&mut s.host);

        assert!(remote.talk_to(&mut s.host, &Npc::new("Clint"), None));
        assert_eq!(s.state().progress, ScytheProgress::MissingParts);
        assert!(s.host.mod_data(farmhand, s.slot().key()).is_none());
    }

    #[test]
    fn test_controller_state_key_uses_prefix() {
        let controller = PartQuestController::new(ScytheQuest::default(), "Tractor");
        assert_eq!(controller.state_key(), "Tractor.scythe");
    }
}
