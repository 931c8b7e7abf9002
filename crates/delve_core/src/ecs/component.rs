//! # Component System
//!
//! Components are pure data containers with no behavior. The set of kinds
//! is closed: every kind has a fixed [`ComponentKind`] discriminant and its
//! own dense table in [`ComponentTables`], so attaching an unknown kind is
//! unrepresentable.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::EntityId;
use super::storage::ComponentStorage;
use crate::effect::{ActiveEffect, EffectSpec, Targeting};
use crate::spatial::LocationKey;

/// Discriminant for every component kind the store knows about.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// [`Position`]
    Position = 0,
    /// [`Appearance`]
    Appearance = 1,
    /// [`Blocking`]
    Blocking = 2,
    /// [`Opaque`]
    Opaque = 3,
    /// [`Health`]
    Health = 4,
    /// [`Power`]
    Power = 5,
    /// [`Defense`]
    Defense = 6,
    /// [`Description`]
    Description = 7,
    /// [`ActiveEffects`]
    ActiveEffects = 8,
    /// [`Visible`]
    Visible = 9,
    /// [`Revealed`]
    Revealed = 10,
    /// [`AiTag`]
    AiTag = 11,
    /// [`Player`]
    Player = 12,
    /// [`Dead`]
    Dead = 13,
    /// [`Paralyzed`]
    Paralyzed = 14,
    /// [`Terrain`]
    Terrain = 15,
    /// [`Item`]
    Item = 16,
    /// [`Consumable`]
    Consumable = 17,
    /// [`Inventory`]
    Inventory = 18,
}

impl ComponentKind {
    /// Every kind, in discriminant order.
    pub const ALL: [Self; 19] = [
        Self::Position,
        Self::Appearance,
        Self::Blocking,
        Self::Opaque,
        Self::Health,
        Self::Power,
        Self::Defense,
        Self::Description,
        Self::ActiveEffects,
        Self::Visible,
        Self::Revealed,
        Self::AiTag,
        Self::Player,
        Self::Dead,
        Self::Paralyzed,
        Self::Terrain,
        Self::Item,
        Self::Consumable,
        Self::Inventory,
    ];

    /// Bit for this kind inside a [`ComponentMask`].
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// Set of component kinds packed into a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a mask from a list of kinds.
    #[must_use]
    pub const fn of(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Adds a kind to the set.
    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Removes a kind from the set.
    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// Checks membership of a single kind.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True if every kind in `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if the two sets share at least one kind.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if the set holds no kinds.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the kinds in the set, in discriminant order.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// Marker trait for ECS components.
///
/// Each implementor names its kind and the table it lives in. The store
/// calls [`Component::location`] around attach, detach and replace so that
/// location-bearing components keep the spatial index in step.
pub trait Component: Clone + Default + fmt::Debug + 'static {
    /// Kind discriminant, used for the entity bitmask.
    const KIND: ComponentKind;

    /// Table holding every instance of this component.
    fn storage(tables: &ComponentTables) -> &ComponentStorage<Self>;

    /// Mutable table holding every instance of this component.
    fn storage_mut(tables: &mut ComponentTables) -> &mut ComponentStorage<Self>;

    /// Grid location this component pins its entity to, if any.
    fn location(&self) -> Option<LocationKey> {
        None
    }
}

/// Components that may be edited in place through
/// [`EntityStore::get_mut`](crate::EntityStore::get_mut).
///
/// [`Position`] deliberately does not implement this: moving an entity must
/// go through the store so the spatial index is updated in the same step.
pub trait Mutable: Component {}

macro_rules! component_tables {
    ($($ty:ident => $field:ident),* $(,)?) => {
        /// Dense storage for every component kind, indexed by entity slot.
        #[derive(Default)]
        pub struct ComponentTables {
            $(pub(crate) $field: ComponentStorage<$ty>,)*
        }

        impl ComponentTables {
            /// Grows every table so `len` slots are addressable.
            pub(crate) fn grow(&mut self, len: usize) {
                $(self.$field.ensure_len(len);)*
            }

            /// Resets one slot in every table to its default value.
            pub(crate) fn reset(&mut self, index: usize) {
                $(self.$field.reset(index);)*
            }
        }
    };
}

component_tables! {
    Position => positions,
    Appearance => appearances,
    Blocking => blocking,
    Opaque => opaque,
    Health => health,
    Power => power,
    Defense => defense,
    Description => descriptions,
    ActiveEffects => active_effects,
    Visible => visible,
    Revealed => revealed,
    AiTag => ai,
    Player => players,
    Dead => dead,
    Paralyzed => paralyzed,
    Terrain => terrain,
    Item => items,
    Consumable => consumables,
    Inventory => inventories,
}

macro_rules! impl_component {
    ($ty:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$ty;

            #[inline]
            fn storage(tables: &ComponentTables) -> &ComponentStorage<Self> {
                &tables.$field
            }

            #[inline]
            fn storage_mut(tables: &mut ComponentTables) -> &mut ComponentStorage<Self> {
                &mut tables.$field
            }
        }

        impl Mutable for $ty {}
    };
}

// =============================================================================
// Location
// =============================================================================

/// Grid position of an entity: column, row and dungeon level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Dungeon level (negative going down).
    pub level: i32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, level: i32) -> Self {
        Self { x, y, level }
    }

    /// Canonical location key for this position.
    #[inline]
    #[must_use]
    pub const fn key(self) -> LocationKey {
        LocationKey::new(self.x, self.y, self.level)
    }

    /// Position shifted by `(dx, dy)` on the same level.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.level)
    }
}

impl From<LocationKey> for Position {
    fn from(key: LocationKey) -> Self {
        Self::new(key.x, key.y, key.level)
    }
}

impl Component for Position {
    const KIND: ComponentKind = ComponentKind::Position;

    #[inline]
    fn storage(tables: &ComponentTables) -> &ComponentStorage<Self> {
        &tables.positions
    }

    #[inline]
    fn storage_mut(tables: &mut ComponentTables) -> &mut ComponentStorage<Self> {
        &mut tables.positions
    }

    fn location(&self) -> Option<LocationKey> {
        Some(self.key())
    }
}

// =============================================================================
// Presentation
// =============================================================================

/// Glyph and color the rendering collaborator draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    /// Character drawn for the entity.
    pub glyph: char,
    /// Packed `0xRRGGBB` color.
    pub color: u32,
}

impl Appearance {
    /// Creates a new appearance.
    #[must_use]
    pub const fn new(glyph: char, color: u32) -> Self {
        Self { glyph, color }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::new(' ', 0xFF_FF_FF)
    }
}

impl_component!(Appearance, appearances);

/// Display name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Name used in the message log.
    pub name: String,
}

impl Description {
    /// Creates a new description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl_component!(Description, descriptions);

/// Which terrain sprite a level tile is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Impassable, opaque.
    Wall,
    /// Open ground.
    #[default]
    Floor,
    /// Leads to the level above.
    StairsUp,
    /// Leads to the level below.
    StairsDown,
}

impl TileKind {
    /// Whether the tile stops movement.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Whether the tile stops sight.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Terrain marker with its tile kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    /// Tile kind.
    pub kind: TileKind,
}

impl_component!(Terrain, terrain);

// =============================================================================
// Flags
// =============================================================================

macro_rules! flag_components {
    ($($(#[$meta:meta])* $ty:ident => $field:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $ty;

            impl_component!($ty, $field);
        )*
    };
}

flag_components! {
    /// Occupies its tile: no other blocking entity may enter.
    Blocking => blocking,
    /// Stops line of sight through its tile.
    Opaque => opaque,
    /// In the player's field of view this turn.
    Visible => visible,
    /// Has been seen at least once.
    Revealed => revealed,
    /// Takes a turn during world resolution.
    AiTag => ai,
    /// The player-controlled entity.
    Player => players,
    /// Health reached zero; no longer interactive.
    Dead => dead,
    /// Cannot move while the tag is attached.
    Paralyzed => paralyzed,
    /// Can be picked up.
    Item => items,
}

// =============================================================================
// Stats
// =============================================================================

macro_rules! stat_components {
    ($($(#[$meta:meta])* $ty:ident => $field:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $ty {
                /// Current value after modifiers and damage.
                pub current: i32,
                /// Unmodified value.
                pub base: i32,
            }

            impl $ty {
                /// Creates the stat with `current == base`.
                #[must_use]
                pub const fn new(base: i32) -> Self {
                    Self { current: base, base }
                }
            }

            impl_component!($ty, $field);
        )*
    };
}

stat_components! {
    /// Hit points. `base` is the ceiling.
    Health => health,
    /// Attack strength.
    Power => power,
    /// Damage absorbed per hit.
    Defense => defense,
}

// =============================================================================
// Effects and items
// =============================================================================

/// Timed effects currently attached, in application order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    /// Effects in the order they were applied.
    pub effects: Vec<ActiveEffect>,
}

impl_component!(ActiveEffects, active_effects);

/// What using an item does and whom it targets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    /// Effect applied to each target.
    pub effect: EffectSpec,
    /// Target selection rule.
    pub targeting: Targeting,
}

impl_component!(Consumable, consumables);

/// Items carried by an entity, in pickup order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Carried item entities.
    pub items: Vec<EntityId>,
}

impl_component!(Inventory, inventories);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_bits_are_distinct() {
        let mut seen = 0u32;
        for kind in ComponentKind::ALL {
            assert_eq!(seen & kind.bit(), 0, "{kind:?} shares a bit");
            seen |= kind.bit();
        }
    }

    #[test]
    fn test_mask_set_operations() {
        let mask = ComponentMask::of(&[ComponentKind::Position, ComponentKind::Health]);
        assert!(mask.contains(ComponentKind::Health));
        assert!(!mask.contains(ComponentKind::Blocking));
        assert!(mask.contains_all(ComponentMask::of(&[ComponentKind::Position])));
        assert!(mask.intersects(ComponentMask::of(&[ComponentKind::Health, ComponentKind::Opaque])));
        assert_eq!(
            mask.kinds().collect::<Vec<_>>(),
            vec![ComponentKind::Position, ComponentKind::Health]
        );
    }

    #[test]
    fn test_stat_new_starts_full() {
        let hp = Health::new(12);
        assert_eq!(hp.current, 12);
        assert_eq!(hp.base, 12);
    }

    #[test]
    fn test_only_position_has_location() {
        assert_eq!(Position::new(1, 2, -1).location(), Some(LocationKey::new(1, 2, -1)));
        assert_eq!(Blocking.location(), None);
    }
}
