//! Player inventory: item stacks and gold

use serde::{Deserialize, Serialize};

use crate::data::{ItemDef, Rarity};

/// A stack of identical items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub rarity: Rarity,
    pub quantity: u32,
}

/// Slot-limited list of stacks plus gold
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub stacks: Vec<ItemStack>,
    pub gold: u64,
    pub capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            stacks: Vec::new(),
            gold: 0,
            capacity,
        }
    }

    /// Whether one more of this item fits, either on an existing stack of
    /// the same rarity or in a free slot.
    pub fn can_add(&self, def: &ItemDef, rarity: Rarity) -> bool {
        self.stacks
            .iter()
            .any(|s| s.item == def.id && s.rarity == rarity && s.quantity < def.max_stack)
            || self.stacks.len() < self.capacity
    }

    /// Add one item. Returns false, leaving the inventory unchanged, when
    /// there is no room.
    pub fn add(&mut self, def: &ItemDef, rarity: Rarity) -> bool {
        if let Some(stack) = self
            .stacks
            .iter_mut()
            .find(|s| s.item == def.id && s.rarity == rarity && s.quantity < def.max_stack)
        {
            stack.quantity += 1;
            return true;
        }
        if self.stacks.len() >= self.capacity {
            return false;
        }
        self.stacks.push(ItemStack {
            item: def.id.clone(),
            rarity,
            quantity: 1,
        });
        true
    }

    pub fn count(&self, item: &str) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.item == item)
            .map(|s| s.quantity)
            .sum()
    }

    /// Remove one item, taking from the lowest-rarity stack first.
    pub fn take_one(&mut self, item: &str) -> Option<Rarity> {
        let index = self
            .stacks
            .iter()
            .enumerate()
            .filter(|(_, s)| s.item == item && s.quantity > 0)
            .min_by_key(|(_, s)| s.rarity)
            .map(|(i, _)| i)?;
        let stack = &mut self.stacks[index];
        stack.quantity -= 1;
        let rarity = stack.rarity;
        if stack.quantity == 0 {
            self.stacks.remove(index);
        }
        Some(rarity)
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> ItemDef {
        ItemDef {
            id: "potion".into(),
            name: "Potion".into(),
            max_stack: 2,
            consumable: None,
        }
    }

    #[test]
    fn test_stacks_then_uses_new_slot() {
        let mut inv = Inventory::new(2);
        let def = potion();
        assert!(inv.add(&def, Rarity::Common));
        assert!(inv.add(&def, Rarity::Common));
        assert_eq!(inv.stacks.len(), 1);
        assert!(inv.add(&def, Rarity::Common));
        assert_eq!(inv.stacks.len(), 2);
        assert_eq!(inv.count("potion"), 3);
    }

    #[test]
    fn test_full_inventory_rejects() {
        let mut inv = Inventory::new(1);
        let def = potion();
        inv.add(&def, Rarity::Rare);
        assert!(!inv.can_add(&def, Rarity::Common));
        assert!(!inv.add(&def, Rarity::Common));
        assert!(inv.can_add(&def, Rarity::Rare));
    }

    #[test]
    fn test_take_one_removes_empty_stacks() {
        let mut inv = Inventory::new(4);
        let def = potion();
        inv.add(&def, Rarity::Rare);
        inv.add(&def, Rarity::Common);
        assert_eq!(inv.take_one("potion"), Some(Rarity::Common));
        assert_eq!(inv.stacks.len(), 1);
        assert_eq!(inv.take_one("potion"), Some(Rarity::Rare));
        assert_eq!(inv.take_one("potion"), None);
    }
}
