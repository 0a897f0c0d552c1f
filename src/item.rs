use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Item Ids
// ============================================================================

/// Type prefix the host uses for plain objects.
const OBJECT_PREFIX: &str = "(O)";

/// Host item id. Plain object ids may be written with or without the `(O)`
/// type prefix; comparisons always use the qualified form.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualified form, e.g. `716` -> `(O)716`. Already-qualified ids are kept.
    pub fn qualified(&self) -> String {
        if self.is_qualified() {
            self.0.clone()
        } else {
            format!("{}{}", OBJECT_PREFIX, self.0)
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.0.starts_with('(') && self.0.contains(')')
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || self.qualified() == other.qualified()
    }
}

impl std::hash::Hash for ItemId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.qualified().hash(state);
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Items
// ============================================================================

/// A stack of items as the host hands it to us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub display_name: String,
    pub stack: u32,
    /// Quest items cannot be sold or trashed; the host enforces that.
    #[serde(default)]
    pub quest_item: bool,
}

impl Item {
    pub fn new(id: impl Into<ItemId>) -> Self {
        let id = id.into();
        Self {
            display_name: id.as_str().to_string(),
            id,
            stack: 1,
            quest_item: false,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_stack(mut self, stack: u32) -> Self {
        self.stack = stack;
        self
    }

    pub fn as_quest_item(mut self) -> Self {
        self.quest_item = true;
        self
    }

    pub fn is(&self, id: &ItemId) -> bool {
        &self.id == id
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Inventory
// ============================================================================

pub const INVENTORY_SIZE: usize = 36;
pub const MAX_STACK: u32 = 999;

#[derive(Debug, Clone)]
pub struct Inventory {
    pub slots: Vec<Option<Item>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            slots: vec![None; INVENTORY_SIZE],
        }
    }

    /// Try to add an item to inventory. Returns the quantity that couldn't fit.
    pub fn add_item(&mut self, item: &Item) -> u32 {
        let mut quantity = item.stack;

        // First, try to stack with existing items
        for slot in self.slots.iter_mut().flatten() {
            if quantity == 0 {
                break;
            }
            if slot.id == item.id && slot.quest_item == item.quest_item {
                let add = quantity.min(MAX_STACK.saturating_sub(slot.stack));
                slot.stack += add;
                quantity -= add;
            }
        }

        // Then, try to find empty slots for remaining quantity
        for slot in &mut self.slots {
            if quantity == 0 {
                break;
            }
            if slot.is_none() {
                let add = quantity.min(MAX_STACK);
                *slot = Some(item.clone().with_stack(add));
                quantity -= add;
            }
        }

        quantity
    }

    /// Total units of `id` across every stack.
    pub fn count(&self, id: &ItemId) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.is(id))
            .map(|slot| slot.stack)
            .sum()
    }

    /// First non-empty stack of `id`.
    pub fn first(&self, id: &ItemId) -> Option<&Item> {
        self.slots
            .iter()
            .flatten()
            .find(|slot| slot.is(id) && slot.stack > 0)
    }

    /// Remove up to `count` units of `id`, draining stacks front to back.
    /// Returns how many units were actually removed.
    pub fn reduce_id(&mut self, id: &ItemId, count: u32) -> u32 {
        let mut remaining = count;
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            let Some(item) = slot else { continue };
            if !item.is(id) {
                continue;
            }
            let take = remaining.min(item.stack);
            item.stack -= take;
            remaining -= take;
            if item.stack == 0 {
                *slot = None;
            }
        }
        count - remaining
    }
}
