//! # Event System
//!
//! Structured notifications from the simulation to the rendering
//! collaborator.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │ Simulation  │─────>│   Bounded   │─────>│  Renderer   │
//! │   (turns)   │      │   Channel   │      │   (host)    │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Sending never blocks a turn: when the channel is full the event is
//! dropped and a warning is logged.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use delve_core::{EntityId, LocationKey};
use tracing::warn;

/// Events emitted while resolving turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    // =========================================================================
    // Movement
    // =========================================================================
    /// An entity changed cell.
    Moved {
        /// Entity that moved.
        entity: EntityId,
        /// Previous cell.
        from: LocationKey,
        /// New cell.
        to: LocationKey,
    },

    /// The player walked into something solid.
    Bumped {
        /// Entity that bumped.
        entity: EntityId,
        /// Cell it tried to enter.
        at: LocationKey,
    },

    // =========================================================================
    // Combat
    // =========================================================================
    /// A melee attack was resolved.
    Attacked {
        /// Attacking entity.
        attacker: EntityId,
        /// Defending entity.
        target: EntityId,
        /// Damage after defense, never negative.
        damage: i32,
    },

    /// An entity's health reached zero.
    Died {
        /// Entity that died.
        entity: EntityId,
        /// Where the corpse lies.
        at: Option<LocationKey>,
    },

    // =========================================================================
    // Effects and items
    // =========================================================================
    /// An effect was applied to an entity.
    EffectApplied {
        /// Target entity.
        entity: EntityId,
        /// Effect name.
        name: String,
    },

    /// A timed effect ran out.
    EffectExpired {
        /// Target entity.
        entity: EntityId,
        /// Effect name.
        name: String,
    },

    /// An item moved from the floor to an inventory.
    ItemPickedUp {
        /// Entity that picked it up.
        entity: EntityId,
        /// The item.
        item: EntityId,
    },

    /// An item was used up.
    ItemUsed {
        /// Entity that used it.
        entity: EntityId,
        /// The item, now destroyed.
        item: EntityId,
        /// Entities the effect landed on.
        targets: Vec<EntityId>,
    },

    // =========================================================================
    // World
    // =========================================================================
    /// The player moved to another dungeon level.
    LevelChanged {
        /// Level left behind.
        from: i32,
        /// Level entered.
        to: i32,
    },
}

/// Event bus owning both ends of a bounded channel.
pub struct EventBus {
    /// Sender end - held by the simulation.
    sender: Sender<GameEvent>,
    /// Receiver end - cloned out to consumers.
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Receives all pending events without blocking.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event. `None` if nothing is pending.
    #[inline]
    pub fn try_recv(&self) -> Option<GameEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
