//! # Prefabs
//!
//! One builder per archetype. Each assembles a fixed component set on a
//! fresh entity; there is no runtime inheritance between archetypes.

use delve_core::{
    AiTag, Appearance, Blocking, Consumable, Defense, Description, EffectEvent, EffectSpec,
    EntityId, EntityStore, Health, Inventory, Item, LocationKey, Opaque, Player, Position, Power,
    StoreResult, TagKind, Targeting, Terrain, TileKind,
};

// ============================================================================
// TUNING
// ============================================================================

/// Player hit points.
pub const PLAYER_HEALTH: i32 = 20;
/// Player attack strength.
pub const PLAYER_POWER: i32 = 5;
/// Player damage absorption.
pub const PLAYER_DEFENSE: i32 = 1;

/// Goblin hit points.
pub const GOBLIN_HEALTH: i32 = 5;
/// Goblin attack strength.
pub const GOBLIN_POWER: i32 = 2;
/// Goblin damage absorption.
pub const GOBLIN_DEFENSE: i32 = 1;

/// Hit points a health potion restores.
pub const POTION_HEAL: i32 = 6;
/// Damage of a lightning bolt.
pub const LIGHTNING_DAMAGE: i32 = 8;
/// Reach of targeted scrolls.
pub const SCROLL_RANGE: i32 = 5;
/// Turns a paralysis scroll holds its target.
pub const PARALYSIS_TURNS: u32 = 4;
/// Damage of a fireball.
pub const FIREBALL_DAMAGE: i32 = 6;
/// Blast radius of a fireball.
pub const FIREBALL_RADIUS: i32 = 1;

const WHITE: u32 = 0xFF_FF_FF;
const GRAY: u32 = 0x80_80_80;
const GREEN: u32 = 0x30_C0_30;
const RED: u32 = 0xC0_30_30;
const YELLOW: u32 = 0xE0_E0_40;
const ORANGE: u32 = 0xF0_80_20;
const MAGENTA: u32 = 0xC0_40_C0;

// ============================================================================
// ACTORS
// ============================================================================

/// Items that can appear on a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// Restores health to the user.
    HealthPotion,
    /// Strikes the nearest visible enemy.
    LightningScroll,
    /// Freezes the nearest visible enemy in place.
    ParalysisScroll,
    /// Burns everything around a chosen cell.
    FireballScroll,
}

impl ItemKind {
    /// Every item kind.
    pub const ALL: [Self; 4] = [
        Self::HealthPotion,
        Self::LightningScroll,
        Self::ParalysisScroll,
        Self::FireballScroll,
    ];
}

/// Spawns the player.
///
/// # Errors
///
/// Only fails if the store rejects a fresh entity, which cannot happen.
pub fn player(store: &mut EntityStore, at: LocationKey) -> StoreResult<EntityId> {
    let id = store.create();
    store.attach(id, Position::from(at))?;
    store.attach(id, Appearance::new('@', WHITE))?;
    store.attach(id, Description::new("player"))?;
    store.attach(id, Health::new(PLAYER_HEALTH))?;
    store.attach(id, Power::new(PLAYER_POWER))?;
    store.attach(id, Defense::new(PLAYER_DEFENSE))?;
    store.attach(id, Inventory::default())?;
    store.attach(id, Blocking)?;
    store.attach(id, Player)?;
    Ok(id)
}

/// Spawns a goblin.
///
/// # Errors
///
/// Only fails if the store rejects a fresh entity, which cannot happen.
pub fn goblin(store: &mut EntityStore, at: LocationKey) -> StoreResult<EntityId> {
    let id = store.create();
    store.attach(id, Position::from(at))?;
    store.attach(id, Appearance::new('g', GREEN))?;
    store.attach(id, Description::new("goblin"))?;
    store.attach(id, Health::new(GOBLIN_HEALTH))?;
    store.attach(id, Power::new(GOBLIN_POWER))?;
    store.attach(id, Defense::new(GOBLIN_DEFENSE))?;
    store.attach(id, Blocking)?;
    store.attach(id, AiTag)?;
    Ok(id)
}

// ============================================================================
// TERRAIN
// ============================================================================

/// Spawns one terrain tile. Walls block and stop sight.
///
/// # Errors
///
/// Only fails if the store rejects a fresh entity, which cannot happen.
pub fn terrain(store: &mut EntityStore, at: LocationKey, kind: TileKind) -> StoreResult<EntityId> {
    let (glyph, color, name) = match kind {
        TileKind::Wall => ('#', GRAY, "wall"),
        TileKind::Floor => ('.', GRAY, "floor"),
        TileKind::StairsUp => ('<', WHITE, "stairs up"),
        TileKind::StairsDown => ('>', WHITE, "stairs down"),
    };

    let id = store.create();
    store.attach(id, Position::from(at))?;
    store.attach(id, Appearance::new(glyph, color))?;
    store.attach(id, Description::new(name))?;
    store.attach(id, Terrain { kind })?;
    if kind.is_blocking() {
        store.attach(id, Blocking)?;
    }
    if kind.is_opaque() {
        store.attach(id, Opaque)?;
    }
    Ok(id)
}

// ============================================================================
// ITEMS
// ============================================================================

/// Effect and targeting rule carried by an item kind.
#[must_use]
pub fn consumable(kind: ItemKind) -> Consumable {
    match kind {
        ItemKind::HealthPotion => Consumable {
            effect: EffectSpec::instant("healing").with_event(EffectEvent::Heal { amount: POTION_HEAL }),
            targeting: Targeting::User,
        },
        ItemKind::LightningScroll => Consumable {
            effect: EffectSpec::instant("lightning")
                .with_event(EffectEvent::TakeDamage { amount: LIGHTNING_DAMAGE }),
            targeting: Targeting::NearestVisible { range: SCROLL_RANGE },
        },
        ItemKind::ParalysisScroll => Consumable {
            effect: EffectSpec::instant("paralysis")
                .lasting(PARALYSIS_TURNS)
                .with_tag(TagKind::Paralyzed),
            targeting: Targeting::NearestVisible { range: SCROLL_RANGE },
        },
        ItemKind::FireballScroll => Consumable {
            effect: EffectSpec::instant("fire")
                .with_event(EffectEvent::TakeDamage { amount: FIREBALL_DAMAGE }),
            targeting: Targeting::Location { radius: FIREBALL_RADIUS },
        },
    }
}

/// Spawns an item lying on the floor.
///
/// # Errors
///
/// Only fails if the store rejects a fresh entity, which cannot happen.
pub fn item(store: &mut EntityStore, at: LocationKey, kind: ItemKind) -> StoreResult<EntityId> {
    let (glyph, color, name) = match kind {
        ItemKind::HealthPotion => ('!', RED, "health potion"),
        ItemKind::LightningScroll => ('?', YELLOW, "scroll of lightning"),
        ItemKind::ParalysisScroll => ('?', MAGENTA, "scroll of paralysis"),
        ItemKind::FireballScroll => ('?', ORANGE, "scroll of fireball"),
    };

    let id = store.create();
    store.attach(id, Position::from(at))?;
    store.attach(id, Appearance::new(glyph, color))?;
    store.attach(id, Description::new(name))?;
    store.attach(id, consumable(kind))?;
    store.attach(id, Item)?;
    Ok(id)
}
