//! Loot pickup and consumables

use tracing::debug;

use super::DungeonInstance;
use crate::combat::TargetId;
use crate::object::LootId;
use crate::player::PlayerId;
use crate::world::{ItemUseError, ServerEvent};

impl DungeonInstance {
    /// Move a drop into a player's inventory if they are close enough and
    /// have room. Stale ids are ignored.
    pub(super) fn pickup(&mut self, player: PlayerId, loot_id: LootId) {
        let Some(entity) = self.state.players.get(&player) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let Some(drop) = self.state.loot.get(&loot_id) else {
            debug!(instance = %self.id, %player, loot = loot_id.0, "pickup of missing loot");
            return;
        };
        if entity.position.distance_xz(&drop.position) > self.config.pickup_range {
            debug!(instance = %self.id, %player, loot = loot_id.0, "pickup out of range");
            return;
        }
        let Some(def) = self.defs.item(&drop.item) else {
            return;
        };
        let rarity = drop.rarity;
        let Some(session) = self.sessions.get_mut(&player) else {
            return;
        };
        if !session.inventory.add(def, rarity) {
            self.outbox
                .send(player, ServerEvent::InventoryFull { loot_id });
            return;
        }

        let Some(drop) = self.state.loot.remove(&loot_id) else {
            return;
        };
        self.outbox.broadcast(ServerEvent::LootAcquired {
            player_id: player,
            loot_id,
            item: drop.item,
            rarity: drop.rarity,
        });
        self.queue_inventory(player);
    }

    /// Drink or use one consumable.
    ///
    /// Checks, in order: the player is here and alive, holds the item, the
    /// item is consumable, and it is off cooldown. Nothing changes on
    /// failure.
    pub fn use_item(&mut self, player: PlayerId, def_id: &str) -> Result<(), ItemUseError> {
        let entity = self
            .state
            .players
            .get_mut(&player)
            .ok_or(ItemUseError::UnknownPlayer)?;
        let session = self
            .sessions
            .get_mut(&player)
            .ok_or(ItemUseError::UnknownPlayer)?;
        if !entity.is_alive() {
            return Err(ItemUseError::PlayerDead);
        }
        if session.inventory.count(def_id) == 0 {
            return Err(ItemUseError::NotInInventory(def_id.to_string()));
        }
        let consumable = self
            .defs
            .item(def_id)
            .and_then(|d| d.consumable)
            .ok_or_else(|| ItemUseError::NotConsumable(def_id.to_string()))?;
        if let Some(remaining) = session.item_cooldowns.remaining(def_id, self.now) {
            return Err(ItemUseError::OnCooldown { remaining });
        }

        session.inventory.take_one(def_id);
        session
            .item_cooldowns
            .arm(def_id, self.now + consumable.cooldown);
        let healed = entity.stats.adjust_hp(consumable.heal);
        entity.stats.adjust_mana(consumable.mana);

        if consumable.heal > 0 {
            self.outbox.broadcast(ServerEvent::Damage {
                target_id: TargetId::Player(player),
                source_id: Some(TargetId::Player(player)),
                amount: healed,
                is_crit: false,
                is_dodge: false,
                dot_type: None,
                is_heal: true,
            });
        }
        self.queue_inventory(player);
        Ok(())
    }
}
