//! One-way lifecycle notifications from enemies to their spawner.
//!
//! Enemies never touch spawner bookkeeping. They publish here and the
//! spawner drains the bus on its own tick.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{EnemyId, SpawnPointId};

use crate::drops::DroppedItem;

/// Events emitted by enemies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyEvent {
    /// Enemy died (removal follows after the cleanup delay)
    Died {
        /// Enemy ID
        enemy_id: EnemyId,
        /// Death position
        position: Vec2,
    },
    /// Enemy cleanup finished; the instance is gone
    Removed {
        /// Enemy ID
        enemy_id: EnemyId,
        /// Spawn point the enemy came from, `None` for random placement
        origin: Option<SpawnPointId>,
        /// Position at removal
        position: Vec2,
    },
    /// An item instance was dropped on death
    ItemDropped {
        /// Enemy that dropped it
        enemy_id: EnemyId,
        /// The item
        item: DroppedItem,
    },
}

/// Handle enemies publish through.
pub type EventSender = Sender<EnemyEvent>;

/// Bounded event bus owned by the spawner.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<EnemyEvent>,
    receiver: Receiver<EnemyEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<EnemyEvent> {
        self.receiver.try_iter().collect()
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_senders_drain_in_order() {
        let bus = EventBus::new(8);
        let first = bus.sender();
        let second = bus.sender();
        let id = EnemyId::from_raw(1);

        first
            .try_send(EnemyEvent::Died {
                enemy_id: id,
                position: Vec2::ZERO,
            })
            .expect("room on the bus");
        second
            .try_send(EnemyEvent::Removed {
                enemy_id: id,
                origin: Some(SpawnPointId::new(2)),
                position: Vec2::ZERO,
            })
            .expect("room on the bus");

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EnemyEvent::Died { .. }));
        assert!(matches!(events[1], EnemyEvent::Removed { origin: Some(_), .. }));
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_full_bus_rejects_sends_until_drained() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        let died = EnemyEvent::Died {
            enemy_id: EnemyId::from_raw(1),
            position: Vec2::ZERO,
        };

        assert!(sender.try_send(died.clone()).is_ok());
        assert!(sender.try_send(died.clone()).is_err());
        assert_eq!(bus.drain().len(), 1);
        assert!(sender.try_send(died).is_ok());
    }
}
