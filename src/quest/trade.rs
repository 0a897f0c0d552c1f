//! Item trades run from inside a dialogue chain.
//!
//! Each step checks the player holds enough, then removes exactly that many.
//! Removal works on the union of matching stacks, so mixed-quality stacks of
//! the same item are drained front to back.

use tracing::debug;

use super::kind::QuestKind;
use super::shim::QuestCtx;
use crate::host::PlayerInventory;
use crate::item::{Item, ItemId};

impl<K: QuestKind> QuestCtx<'_, K> {
    /// Take `count` of `id` if the player has that many.
    pub fn try_take_items(&mut self, id: &ItemId, count: u32) -> bool {
        let player = self.shim.player();
        if self.host.count_item(player, id) < count {
            return false;
        }
        let taken = self.host.remove_items(player, id, count);
        debug!("Took {} x{} from {}: {}", id.qualified(), count, player, taken);
        taken
    }

    /// Take both, or neither.
    pub fn try_take_items_pair(&mut self, first: &ItemId, first_count: u32, second: &ItemId, second_count: u32) -> bool {
        let player = self.shim.player();
        if self.host.count_item(player, first) < first_count
            || self.host.count_item(player, second) < second_count
        {
            return false;
        }
        self.host.remove_items(player, first, first_count) && self.host.remove_items(player, second, second_count)
    }

    /// Take `count` of the first candidate the player holds enough of, in the
    /// order given. Returns what was taken.
    pub fn try_take_any(&mut self, candidates: &[ItemId], count: u32) -> Option<Item> {
        let player = self.shim.player();
        for id in candidates {
            if self.host.count_item(player, id) < count {
                continue;
            }
            let Some(found) = self.host.find_item(player, id) else {
                continue;
            };
            if self.host.remove_items(player, id, count) {
                return Some(found.with_stack(count));
            }
        }
        None
    }

    /// Give the player a fresh quest-tagged item.
    pub fn add_quest_item(&mut self, id: &ItemId) {
        let player = self.shim.player();
        self.host.add_item(player, Item::new(id.clone()).as_quest_item());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use crate::dedup::MessageDedup;
    use crate::host::{InMemoryHost, NativeQuestId, PlayerId, PlayerInventory};
    use crate::item::{Item, ItemId};
    use crate::npc::Npc;
    use crate::quest::kind::{QuestKind, QuestKindId};
    use crate::quest::shim::{QuestCtx, QuestShim};
    use crate::quest::state::{PersistedQuest, QuestState, StateSlot};

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Nothing;

    impl QuestState for Nothing {
        type Stage = ();

        fn stage(&self) {}
    }

    /// Runs whichever trade the NPC's name asks for.
    struct Trader;

    impl QuestKind for Trader {
        type State = Nothing;

        fn id(&self) -> QuestKindId {
            QuestKindId("trader")
        }

        fn title(&self) -> String {
            String::new()
        }

        fn description(&self) -> String {
            String::new()
        }

        fn objective(&self, _state: &Nothing) -> String {
            String::new()
        }

        fn is_conversation_piece(&self, _item: &Item) -> bool {
            false
        }

        fn check_if_complete(&self, quest: &mut QuestCtx<'_, Self>, npc: &Npc, _item: Option<&Item>) {
            match npc.name.as_str() {
                "Single" => {
                    if quest.try_take_items(&ItemId::new("716"), 3) {
                        quest.add_quest_item(&ItemId::new("reward"));
                        quest.spout(npc, "thanks");
                    }
                }
                "Pair" => {
                    if quest.try_take_items_pair(&ItemId::new("334"), 2, &ItemId::new("388"), 5) {
                        quest.spout(npc, "thanks");
                    }
                }
                "Any" => {
                    let shiny = [ItemId::new("80"), ItemId::new("66")];
                    if let Some(taken) = quest.try_take_any(&shiny, 1) {
                        let line = format!("thanks for the {}", taken.display_name);
                        quest.spout(npc, &line);
                    }
                }
                _ => {}
            }
        }
    }

    fn setup() -> (InMemoryHost, QuestShim<Trader>, MessageDedup) {
        let player = PlayerId(1);
        let mut host = InMemoryHost::new(player);
        let slot = StateSlot::new("Test", "trader");
        slot.store(&mut host, &PersistedQuest::Active(Nothing));
        let shim = QuestShim::new(Arc::new(Trader), player, NativeQuestId(1), slot);
        (host, shim, MessageDedup::new())
    }

    #[test]
    fn test_single_trade_needs_full_count() {
        let (mut host, mut shim, mut dedup) = setup();
        let player = shim.player();
        host.add_item(player, Item::new("(O)716").with_stack(2));

        assert!(!shim.check_interaction(Some(&Npc::new("Single")), None, false, &mut host, &mut dedup));
        assert_eq!(host.count_item(player, &ItemId::new("716")), 2);
        assert_eq!(host.count_item(player, &ItemId::new("reward")), 0);

        host.add_item(player, Item::new("716").with_stack(2));
        assert!(shim.check_interaction(Some(&Npc::new("Single")), None, false, &mut host, &mut dedup));
        assert_eq!(host.count_item(player, &ItemId::new("716")), 1);

        let reward = host.find_item(player, &ItemId::new("reward")).unwrap();
        assert!(reward.quest_item);
    }

    #[test]
    fn test_pair_trade_is_all_or_nothing() {
        let (mut host, mut shim, mut dedup) = setup();
        let player = shim.player();
        host.add_item(player, Item::new("334").with_stack(2));
        host.add_item(player, Item::new("388").with_stack(4));

        assert!(!shim.check_interaction(Some(&Npc::new("Pair")), None, false, &mut host, &mut dedup));
        assert_eq!(host.count_item(player, &ItemId::new("334")), 2);
        assert_eq!(host.count_item(player, &ItemId::new("388")), 4);

        host.add_item(player, Item::new("388"));
        assert!(shim.check_interaction(Some(&Npc::new("Pair")), None, false, &mut host, &mut dedup));
        assert_eq!(host.count_item(player, &ItemId::new("334")), 0);
        assert_eq!(host.count_item(player, &ItemId::new("388")), 0);
    }

    #[test]
    fn test_any_of_trade_prefers_candidate_order() {
        let (mut host, mut shim, mut dedup) = setup();
        let player = shim.player();
        host.add_item(player, Item::new("66").with_display_name("Amethyst"));
        host.add_item(player, Item::new("80").with_display_name("Quartz"));

        assert!(shim.check_interaction(Some(&Npc::new("Any")), None, false, &mut host, &mut dedup));
        assert_eq!(host.count_item(player, &ItemId::new("80")), 0);
        assert_eq!(host.count_item(player, &ItemId::new("66")), 1);
        assert_eq!(host.npc_lines()[0].1, "thanks for the Quartz");
    }

    #[test]
    fn test_any_of_trade_with_nothing_held() {
        let (mut host, mut shim, mut dedup) = setup();
        assert!(!shim.check_interaction(Some(&Npc::new("Any")), None, false, &mut host, &mut dedup));
        assert!(host.events().is_empty());
    }
}
