//! # Effect Data
//!
//! Plain data describing timed and instantaneous effects. The engine that
//! applies them lives in the simulation crate; these types are here because
//! [`ActiveEffects`](crate::ActiveEffects) and
//! [`Consumable`](crate::Consumable) components carry them.

use serde::{Deserialize, Serialize};

/// Numeric component an effect modifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// [`Health`](crate::Health), clamped to `[0, base]`.
    Health,
    /// [`Power`](crate::Power), floored at 0.
    Power,
    /// [`Defense`](crate::Defense), floored at 0.
    Defense,
}

/// How the delta of an effect is applied over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectMode {
    /// Delta added on every tick; nothing is undone on expiry.
    #[default]
    PerTurn,
    /// Delta added once on application and reversed once on expiry.
    Modifier,
}

/// Auxiliary tag component an effect holds on its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    /// Attaches [`Paralyzed`](crate::Paralyzed).
    Paralyzed,
}

/// Event fired each time an effect is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectEvent {
    /// Damage routed through combat resolution (can kill).
    TakeDamage {
        /// Raw damage before any floor.
        amount: i32,
    },
    /// Healing, clamped to the health ceiling.
    Heal {
        /// Hit points restored.
        amount: i32,
    },
}

/// Description of an effect before it is attached.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Name shown in the message log.
    pub name: String,
    /// Component the delta applies to.
    pub stat: Option<StatKind>,
    /// Change to the stat's current value.
    pub delta: i32,
    /// Per-turn or modifier semantics for `delta`.
    pub mode: EffectMode,
    /// Turns the effect stays attached; 0 is instantaneous.
    pub duration: u32,
    /// Events fired each time the effect is applied.
    pub events: Vec<EffectEvent>,
    /// Tags held for the effect's lifetime.
    pub tags: Vec<TagKind>,
}

impl EffectSpec {
    /// An instantaneous effect with no stat change.
    #[must_use]
    pub fn instant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the stat delta.
    #[must_use]
    pub fn with_stat(mut self, stat: StatKind, delta: i32) -> Self {
        self.stat = Some(stat);
        self.delta = delta;
        self
    }

    /// Keeps the effect attached for `turns` ticks.
    #[must_use]
    pub fn lasting(mut self, turns: u32) -> Self {
        self.duration = turns;
        self
    }

    /// Switches to modifier semantics.
    #[must_use]
    pub fn as_modifier(mut self) -> Self {
        self.mode = EffectMode::Modifier;
        self
    }

    /// Adds an event.
    #[must_use]
    pub fn with_event(mut self, event: EffectEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: TagKind) -> Self {
        self.tags.push(tag);
        self
    }

    /// True if the effect resolves within a single application.
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.duration == 0
    }
}

/// An effect attached to an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// What the effect does.
    pub spec: EffectSpec,
    /// Ticks left before expiry.
    pub remaining_turns: u32,
    /// Net change a modifier actually made, reversed on expiry.
    pub applied_delta: i32,
}

impl ActiveEffect {
    /// Wraps a spec with its full duration remaining.
    #[must_use]
    pub fn new(spec: EffectSpec) -> Self {
        let remaining_turns = spec.duration;
        Self {
            spec,
            remaining_turns,
            applied_delta: 0,
        }
    }

    /// True if this effect holds `tag`.
    #[must_use]
    pub fn holds(&self, tag: TagKind) -> bool {
        self.spec.tags.contains(&tag)
    }
}

/// How a consumable picks its targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Targeting {
    /// The entity using the item.
    #[default]
    User,
    /// The closest visible living actor within `range`.
    NearestVisible {
        /// Maximum Euclidean distance.
        range: i32,
    },
    /// Every living actor within `radius` of a chosen location.
    Location {
        /// Blast radius; 0 hits only the chosen cell.
        radius: i32,
    },
}
