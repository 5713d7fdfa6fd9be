//! Item drop resolution on enemy death.
//!
//! Two-stage roll: one draw against the table's base chance gates the whole
//! table, then every rule rolls independently against its item's own chance.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::ItemTypeId;
use tracing::trace;

use crate::rng::SimRng;

/// Spread radius used when an item has random spread turned off.
pub const DEFAULT_DROP_SPREAD: f32 = 0.5;

/// Droppable item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    /// Item type
    pub id: ItemTypeId,
    /// Display name
    pub name: String,
    /// Whether the item stacks
    pub stackable: bool,
    /// Probability this item drops once the table passes (0.0 - 1.0)
    pub drop_chance: f32,
    /// Minimum quantity for stackable items
    pub min_quantity: u32,
    /// Maximum quantity for stackable items
    pub max_quantity: u32,
    /// Scatter radius around the death position
    pub drop_spread: f32,
    /// Whether to scatter by `drop_spread`
    pub random_spread: bool,
}

impl Default for ItemDef {
    fn default() -> Self {
        Self {
            id: ItemTypeId::new(0),
            name: String::from("Item"),
            stackable: false,
            drop_chance: 0.5,
            min_quantity: 1,
            max_quantity: 5,
            drop_spread: 1.0,
            random_spread: true,
        }
    }
}

impl ItemDef {
    /// Creates an item definition with default drop parameters.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ItemTypeId::new(id),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Marks the item stackable with its own quantity range.
    #[must_use]
    pub fn stackable(mut self, min: u32, max: u32) -> Self {
        self.stackable = true;
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    /// Sets drop chance.
    #[must_use]
    pub fn with_drop_chance(mut self, chance: f32) -> Self {
        self.drop_chance = chance;
        self
    }

    /// Sets spread radius.
    #[must_use]
    pub fn with_spread(mut self, spread: f32, random: bool) -> Self {
        self.drop_spread = spread;
        self.random_spread = random;
        self
    }

    fn spread_radius(&self) -> f32 {
        if self.random_spread && self.drop_spread > 0.0 {
            self.drop_spread
        } else {
            DEFAULT_DROP_SPREAD
        }
    }
}

/// Pairs an item with the quantity range used for non-stackable drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRule {
    /// The item
    pub item: ItemDef,
    /// Minimum quantity (non-stackable items)
    #[serde(default = "one")]
    pub min_quantity: u32,
    /// Maximum quantity (non-stackable items)
    #[serde(default = "one")]
    pub max_quantity: u32,
}

fn one() -> u32 {
    1
}

impl DropRule {
    /// Creates a rule dropping exactly one of a non-stackable item.
    #[must_use]
    pub fn new(item: ItemDef) -> Self {
        Self {
            item,
            min_quantity: 1,
            max_quantity: 1,
        }
    }

    /// Sets the rule-level quantity range.
    #[must_use]
    pub fn with_quantity(mut self, min: u32, max: u32) -> Self {
        self.min_quantity = min;
        self.max_quantity = max;
        self
    }

    /// Rolls a quantity: stackable items use the item's range.
    fn roll_quantity(&self, rng: &mut SimRng) -> u32 {
        if self.item.stackable {
            rng.range_inclusive(self.item.min_quantity, self.item.max_quantity)
        } else {
            rng.range_inclusive(self.min_quantity, self.max_quantity)
        }
    }
}

/// An item instance handed off to the pickup subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedItem {
    /// Item type
    pub item: ItemTypeId,
    /// Display name
    pub name: String,
    /// Units in this instance
    pub quantity: u32,
    /// World position
    pub position: Vec2,
}

/// Group-level drop configuration attached to every spawned enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTable {
    /// Probability that anything drops at all (0.0 - 1.0)
    pub base_drop_chance: f32,
    /// Rules rolled independently once the base roll passes
    pub rules: Vec<DropRule>,
    /// Emit stackable items as one stack instead of unit drops
    pub stack_stackables: bool,
}

impl Default for DropTable {
    fn default() -> Self {
        Self {
            base_drop_chance: 0.5,
            rules: Vec::new(),
            stack_stackables: false,
        }
    }
}

impl DropTable {
    /// Creates an empty table with the given base chance.
    #[must_use]
    pub fn new(base_drop_chance: f32) -> Self {
        Self {
            base_drop_chance,
            ..Default::default()
        }
    }

    /// Adds a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: DropRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Emits stackable items as single stacks.
    #[must_use]
    pub fn with_stacking(mut self, stack: bool) -> Self {
        self.stack_stackables = stack;
        self
    }

    /// Clamps probabilities into [0, 1] and orders every quantity range.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.base_drop_chance = self.base_drop_chance.clamp(0.0, 1.0);
        for rule in &mut self.rules {
            rule.item.drop_chance = rule.item.drop_chance.clamp(0.0, 1.0);
            rule.item.drop_spread = rule.item.drop_spread.max(0.0);
            if rule.item.max_quantity < rule.item.min_quantity {
                std::mem::swap(&mut rule.item.min_quantity, &mut rule.item.max_quantity);
            }
            if rule.max_quantity < rule.min_quantity {
                std::mem::swap(&mut rule.min_quantity, &mut rule.max_quantity);
            }
        }
        self
    }

    /// Rolls the table for an enemy that died at `origin`.
    pub fn resolve(&self, origin: Vec2, rng: &mut SimRng) -> Vec<DroppedItem> {
        let mut drops = Vec::new();
        if self.rules.is_empty() || !rng.chance(self.base_drop_chance) {
            return drops;
        }

        for rule in &self.rules {
            if !rng.chance(rule.item.drop_chance) {
                continue;
            }

            let quantity = rule.roll_quantity(rng);
            if quantity == 0 {
                continue;
            }

            let radius = rule.item.spread_radius();
            if rule.item.stackable && self.stack_stackables {
                drops.push(DroppedItem {
                    item: rule.item.id,
                    name: rule.item.name.clone(),
                    quantity,
                    position: origin + rng.inside_unit_circle() * radius,
                });
            } else {
                for _ in 0..quantity {
                    drops.push(DroppedItem {
                        item: rule.item.id,
                        name: rule.item.name.clone(),
                        quantity: 1,
                        position: origin + rng.inside_unit_circle() * radius,
                    });
                }
            }
            trace!("Dropped {}x {}", quantity, rule.item.name);
        }

        drops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coin() -> ItemDef {
        ItemDef::new(1, "Coin").stackable(2, 4).with_drop_chance(1.0)
    }

    #[test]
    fn test_certain_drop_always_emits() {
        let table = DropTable::new(1.0).with_rule(DropRule::new(ItemDef::new(7, "Fang").with_drop_chance(1.0)));
        let mut rng = SimRng::new(11);
        for _ in 0..100 {
            let drops = table.resolve(Vec2::ZERO, &mut rng);
            assert!(!drops.is_empty());
            assert!(drops.iter().all(|d| d.item == ItemTypeId::new(7)));
        }
    }

    #[test]
    fn test_zero_base_chance_never_drops() {
        let table = DropTable::new(0.0).with_rule(DropRule::new(coin()));
        let mut rng = SimRng::new(12);
        for _ in 0..100 {
            assert!(table.resolve(Vec2::ZERO, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_stackable_unit_drops_by_default() {
        let table = DropTable::new(1.0).with_rule(DropRule::new(coin()));
        let mut rng = SimRng::new(13);
        let drops = table.resolve(Vec2::ZERO, &mut rng);
        assert!((2..=4).contains(&drops.len()));
        assert!(drops.iter().all(|d| d.quantity == 1));
    }

    #[test]
    fn test_stackable_single_stack_when_enabled() {
        let table = DropTable::new(1.0)
            .with_rule(DropRule::new(coin()))
            .with_stacking(true);
        let mut rng = SimRng::new(14);
        let drops = table.resolve(Vec2::ZERO, &mut rng);
        assert_eq!(drops.len(), 1);
        assert!((2..=4).contains(&drops[0].quantity));
    }

    #[test]
    fn test_non_stackable_uses_rule_range() {
        let rule = DropRule::new(ItemDef::new(3, "Bone").with_drop_chance(1.0)).with_quantity(3, 3);
        let table = DropTable::new(1.0).with_rule(rule).with_stacking(true);
        let mut rng = SimRng::new(15);
        let drops = table.resolve(Vec2::ZERO, &mut rng);
        assert_eq!(drops.len(), 3);
    }

    #[test]
    fn test_zero_quantity_skipped() {
        let rule = DropRule::new(ItemDef::new(3, "Dust").with_drop_chance(1.0)).with_quantity(0, 0);
        let table = DropTable::new(1.0).with_rule(rule);
        let mut rng = SimRng::new(16);
        assert!(table.resolve(Vec2::ZERO, &mut rng).is_empty());
    }

    #[test]
    fn test_validated_clamps_and_orders() {
        let mut item = ItemDef::new(1, "Odd").with_drop_chance(3.0);
        item.min_quantity = 9;
        item.max_quantity = 2;
        let table = DropTable::new(-1.0)
            .with_rule(DropRule::new(item).with_quantity(5, 1))
            .validated();

        assert_eq!(table.base_drop_chance, 0.0);
        let rule = &table.rules[0];
        assert_eq!(rule.item.drop_chance, 1.0);
        assert_eq!((rule.item.min_quantity, rule.item.max_quantity), (2, 9));
        assert_eq!((rule.min_quantity, rule.max_quantity), (1, 5));
    }

    proptest! {
        #[test]
        fn prop_drops_stay_within_spread(seed in any::<u64>(), spread in 0.0f32..4.0, x in -50.0f32..50.0, y in -50.0f32..50.0) {
            let item = coin().with_spread(spread, true);
            let table = DropTable::new(1.0).with_rule(DropRule::new(item));
            let mut rng = SimRng::new(seed);
            let origin = Vec2::new(x, y);
            let radius = if spread > 0.0 { spread } else { DEFAULT_DROP_SPREAD };
            for drop in table.resolve(origin, &mut rng) {
                prop_assert!(drop.position.distance(origin) <= radius + 1e-3);
                prop_assert!(drop.quantity >= 1);
            }
        }
    }
}
