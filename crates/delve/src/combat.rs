//! # Combat
//!
//! Melee resolution and the damage/death pipeline shared by attacks and
//! damaging effects.
//!
//! Damage is `attacker.power - defender.defense`, floored at zero: a
//! defender tougher than its attacker takes nothing and is never healed.

use tracing::{debug, info};

use delve_core::{
    ActiveEffects, AiTag, Appearance, Blocking, ComponentKind, Dead, Defense, Description, EntityId, Health,
    Paralyzed, Player, Power, StoreError,
};

use crate::error::SimResult;
use crate::events::GameEvent;
use crate::messages::capitalize;
use crate::world::GameWorld;

/// Corpse glyph color.
const CORPSE_COLOR: u32 = 0xA0_00_00;

/// Damage dealt by `power` against `defense`, never negative.
#[inline]
#[must_use]
pub const fn damage(power: i32, defense: i32) -> i32 {
    let raw = power - defense;
    if raw > 0 {
        raw
    } else {
        0
    }
}

/// Resolves one melee attack. Returns the damage dealt.
///
/// # Errors
///
/// Fails if the attacker has no [`Power`] or the target no [`Defense`].
pub fn attack(world: &mut GameWorld, attacker: EntityId, target: EntityId) -> SimResult<i32> {
    let power = world.store().require::<Power>(attacker)?.current;
    let defense = world.store().require::<Defense>(target)?.current;
    let amount = damage(power, defense);

    let who = capitalize(&world.name_of(attacker));
    let whom = world.name_of(target);
    if amount > 0 {
        world.log(format!("{who} attacks {whom} for {amount} hit points."));
    } else {
        world.log(format!("{who} attacks {whom} but does no damage."));
    }
    debug!(%attacker, %target, amount, "attack");
    world.emit(GameEvent::Attacked {
        attacker,
        target,
        damage: amount,
    });

    apply_damage(world, target, amount)?;
    Ok(amount)
}

/// Subtracts hit points. Kills the target in the same step if its health
/// drops to zero or below. Returns `true` if the target died.
///
/// Non-positive amounts and already-dead targets are ignored.
///
/// # Errors
///
/// Fails if the target is stale or has no [`Health`].
pub fn apply_damage(world: &mut GameWorld, target: EntityId, amount: i32) -> SimResult<bool> {
    if amount <= 0 || world.store().has::<Dead>(target) {
        return Ok(false);
    }
    let hp = world
        .store_mut()
        .get_mut::<Health>(target)
        .ok_or(StoreError::MissingComponent {
            entity: target,
            kind: ComponentKind::Health,
        })?;
    hp.current -= amount;
    if hp.current <= 0 {
        kill(world, target)?;
        return Ok(true);
    }
    Ok(false)
}

/// Restores hit points up to the ceiling. Returns the amount restored.
///
/// # Errors
///
/// Fails if the target is stale or has no [`Health`].
pub fn heal(world: &mut GameWorld, target: EntityId, amount: i32) -> SimResult<i32> {
    if world.store().has::<Dead>(target) {
        return Ok(0);
    }
    let hp = world
        .store_mut()
        .get_mut::<Health>(target)
        .ok_or(StoreError::MissingComponent {
            entity: target,
            kind: ComponentKind::Health,
        })?;
    let before = hp.current;
    hp.current = (hp.current + amount.max(0)).min(hp.base);
    let restored = hp.current - before;

    let who = capitalize(&world.name_of(target));
    world.log(format!("{who} recovers {restored} hit points."));
    Ok(restored)
}

/// Turns an entity into a corpse: it stops acting and blocking, health is
/// pinned at zero, its active effects are dropped and it is marked
/// [`Dead`]. Killing a corpse is a no-op.
///
/// # Errors
///
/// Fails if the target is stale.
pub fn kill(world: &mut GameWorld, target: EntityId) -> SimResult<()> {
    if world.store().has::<Dead>(target) {
        return Ok(());
    }
    let name = world.name_of(target);
    let is_player = world.store().has::<Player>(target);
    let at = world.store().location_of(target);

    let store = world.store_mut();
    store.detach::<AiTag>(target);
    store.detach::<Blocking>(target);
    store.detach::<Paralyzed>(target);
    store.detach::<ActiveEffects>(target);
    if let Some(hp) = store.get_mut::<Health>(target) {
        hp.current = 0;
    }
    store.attach(target, Dead)?;
    store.attach(target, Appearance::new('%', CORPSE_COLOR))?;
    if !is_player {
        store.attach(target, Description::new(format!("remains of {name}")))?;
    }

    info!(entity = %target, %name, "died");
    if is_player {
        world.log("You died!");
    } else {
        world.log(format!("{} dies!", capitalize(&name)));
    }
    world.emit(GameEvent::Died { entity: target, at });
    Ok(())
}
