//! # Effect Engine
//!
//! Applies, ticks and expires timed modifications.
//!
//! ## Lifecycle
//!
//! ```text
//! apply()  ── duration 0 ──> delta + events now, nothing attached
//!    │
//!    └──── duration n ──> tags attached, ActiveEffect appended
//!                          (Modifier: delta + events now, amount recorded)
//! tick()   ── PerTurn: delta + events ──> remaining -= 1
//!                                           │
//!                           remaining == 0 ─┴─> Modifier: reverse recorded amount
//!                                               tags released, effect dropped
//! ```
//!
//! Effects on one entity are processed in the order they were applied. A
//! failure on one entity is logged and skipped; the pass continues.

use tracing::{debug, warn};

use delve_core::{
    ActiveEffect, ActiveEffects, Dead, Defense, EffectEvent, EffectMode, EffectSpec, EntityId,
    Health, Paralyzed, Power, Query, StatKind, StoreError, TagKind,
};

use crate::combat;
use crate::error::EffectError;
use crate::events::GameEvent;
use crate::messages::capitalize;
use crate::world::GameWorld;

/// Applies an effect to `target`. Corpses are left alone.
///
/// Instantaneous effects resolve here and leave nothing behind. Lasting
/// effects attach their tags immediately and are appended to the target's
/// [`ActiveEffects`].
///
/// # Errors
///
/// Fails if the target is stale or lacks the stat the effect modifies.
pub fn apply(world: &mut GameWorld, target: EntityId, spec: &EffectSpec) -> Result<(), EffectError> {
    if !world.store().is_alive(target) {
        return Err(StoreError::StaleEntity(target).into());
    }
    if world.store().has::<Dead>(target) {
        debug!(entity = %target, effect = %spec.name, "effect on corpse ignored");
        return Ok(());
    }
    debug!(entity = %target, effect = %spec.name, duration = spec.duration, "effect applied");
    world.emit(GameEvent::EffectApplied {
        entity: target,
        name: spec.name.clone(),
    });

    if spec.is_instant() {
        if let Some(stat) = spec.stat {
            adjust_stat(world, target, stat, spec.delta)?;
        }
        fire_events(world, target, spec)?;
        return Ok(());
    }

    let mut active = ActiveEffect::new(spec.clone());
    if spec.mode == EffectMode::Modifier {
        if let Some(stat) = spec.stat {
            active.applied_delta = adjust_stat(world, target, stat, spec.delta)?;
        }
        fire_events(world, target, spec)?;
    }
    for &tag in &spec.tags {
        hold_tag(world, target, tag)?;
    }

    let store = world.store_mut();
    if let Some(effects) = store.get_mut::<ActiveEffects>(target) {
        effects.effects.push(active);
    } else {
        store.attach(target, ActiveEffects { effects: vec![active] })?;
    }
    Ok(())
}

/// One effect pass over every entity with active effects. Returns the
/// number of effects that expired.
pub fn tick(world: &mut GameWorld) -> usize {
    let holders: Vec<EntityId> = world
        .store()
        .query(Query::new().with::<ActiveEffects>().without::<Dead>())
        .collect();

    let mut expired = 0;
    for entity in holders {
        match tick_entity(world, entity) {
            Ok(count) => expired += count,
            Err(err) => warn!(%entity, %err, "effect tick skipped"),
        }
    }
    expired
}

fn tick_entity(world: &mut GameWorld, entity: EntityId) -> Result<usize, EffectError> {
    let Some(ActiveEffects { effects }) = world.store_mut().detach::<ActiveEffects>(entity) else {
        return Ok(0);
    };

    let mut kept = Vec::with_capacity(effects.len());
    let mut expired = Vec::new();
    for mut effect in effects {
        if world.store().has::<Dead>(entity) {
            break;
        }
        if effect.spec.mode == EffectMode::PerTurn {
            if let Err(err) = run_per_turn(world, entity, &effect.spec) {
                warn!(%entity, effect = %effect.spec.name, %err, "per-turn effect failed");
            }
        }
        effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
        if effect.remaining_turns == 0 {
            expired.push(effect);
        } else {
            kept.push(effect);
        }
    }

    if world.store().has::<Dead>(entity) {
        debug!(%entity, "effects dropped with the corpse");
        return Ok(0);
    }
    for effect in &expired {
        expire(world, entity, effect, &kept);
    }
    if !kept.is_empty() {
        world.store_mut().attach(entity, ActiveEffects { effects: kept })?;
    }
    Ok(expired.len())
}

fn run_per_turn(world: &mut GameWorld, entity: EntityId, spec: &EffectSpec) -> Result<(), EffectError> {
    if let Some(stat) = spec.stat {
        adjust_stat(world, entity, stat, spec.delta)?;
    }
    fire_events(world, entity, spec)
}

fn expire(world: &mut GameWorld, entity: EntityId, effect: &ActiveEffect, kept: &[ActiveEffect]) {
    if effect.spec.mode == EffectMode::Modifier && effect.applied_delta != 0 {
        if let Some(stat) = effect.spec.stat {
            if let Err(err) = adjust_stat(world, entity, stat, -effect.applied_delta) {
                warn!(%entity, effect = %effect.spec.name, %err, "modifier reversal failed");
            }
        }
    }
    for &tag in &effect.spec.tags {
        if !kept.iter().any(|other| other.holds(tag)) {
            release_tag(world, entity, tag);
        }
    }
    debug!(%entity, effect = %effect.spec.name, "effect expired");
    world.emit(GameEvent::EffectExpired {
        entity,
        name: effect.spec.name.clone(),
    });
}

/// Adds `delta` to a stat and returns the change actually made.
///
/// Health is clamped to `[0, base]` and reaching zero kills; Power and
/// Defense are floored at zero.
fn adjust_stat(world: &mut GameWorld, entity: EntityId, stat: StatKind, delta: i32) -> Result<i32, EffectError> {
    let missing = EffectError::MissingStat { entity, stat };
    let store = world.store_mut();
    match stat {
        StatKind::Health => {
            let hp = store.get_mut::<Health>(entity).ok_or(missing)?;
            let before = hp.current;
            hp.current = (hp.current + delta).min(hp.base).max(0);
            let change = hp.current - before;
            let lethal = hp.current <= 0;
            if lethal && !store.has::<Dead>(entity) {
                combat::kill(world, entity)?;
            }
            Ok(change)
        }
        StatKind::Power => {
            let power = store.get_mut::<Power>(entity).ok_or(missing)?;
            let before = power.current;
            power.current = (power.current + delta).max(0);
            Ok(power.current - before)
        }
        StatKind::Defense => {
            let defense = store.get_mut::<Defense>(entity).ok_or(missing)?;
            let before = defense.current;
            defense.current = (defense.current + delta).max(0);
            Ok(defense.current - before)
        }
    }
}

fn fire_events(world: &mut GameWorld, entity: EntityId, spec: &EffectSpec) -> Result<(), EffectError> {
    for event in &spec.events {
        if world.store().has::<Dead>(entity) {
            break;
        }
        match *event {
            EffectEvent::TakeDamage { amount } => {
                let who = capitalize(&world.name_of(entity));
                world.log(format!("{who} is hit by {} for {amount} damage.", spec.name));
                combat::apply_damage(world, entity, amount)?;
            }
            EffectEvent::Heal { amount } => {
                combat::heal(world, entity, amount)?;
            }
        }
    }
    Ok(())
}

fn hold_tag(world: &mut GameWorld, entity: EntityId, tag: TagKind) -> Result<(), EffectError> {
    match tag {
        TagKind::Paralyzed => {
            if world.store().has::<Dead>(entity) {
                return Ok(());
            }
            world.store_mut().attach(entity, Paralyzed)?;
            let who = capitalize(&world.name_of(entity));
            world.log(format!("{who} is paralyzed!"));
        }
    }
    Ok(())
}

fn release_tag(world: &mut GameWorld, entity: EntityId, tag: TagKind) {
    match tag {
        TagKind::Paralyzed => {
            if world.store_mut().detach::<Paralyzed>(entity).is_some() {
                let who = capitalize(&world.name_of(entity));
                world.log(format!("{who} can move again."));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::prefabs;
    use delve_core::LocationKey;

    fn with_goblin() -> (GameWorld, EntityId) {
        let mut world = GameWorld::empty(GameConfig::default());
        let goblin = prefabs::goblin(world.store_mut(), LocationKey::new(1, 1, -1)).unwrap();
        (world, goblin)
    }

    fn power(world: &GameWorld, id: EntityId) -> i32 {
        world.store().get::<Power>(id).unwrap().current
    }

    #[test]
    fn test_modifier_expires_after_one_tick() {
        let (mut world, goblin) = with_goblin();
        let rage = EffectSpec::instant("rage")
            .with_stat(StatKind::Power, 3)
            .lasting(1)
            .as_modifier();

        apply(&mut world, goblin, &rage).unwrap();
        assert_eq!(power(&world, goblin), prefabs::GOBLIN_POWER + 3);
        assert_eq!(
            world.store().get::<ActiveEffects>(goblin).unwrap().effects[0].remaining_turns,
            1
        );

        assert_eq!(tick(&mut world), 1);
        assert_eq!(power(&world, goblin), prefabs::GOBLIN_POWER);
        assert!(!world.store().has::<ActiveEffects>(goblin));

        assert_eq!(tick(&mut world), 0);
        assert_eq!(power(&world, goblin), prefabs::GOBLIN_POWER);
    }

    #[test]
    fn test_modifier_reverses_only_what_it_applied() {
        let (mut world, goblin) = with_goblin();
        let weaken = EffectSpec::instant("weakness")
            .with_stat(StatKind::Power, -10)
            .lasting(2)
            .as_modifier();

        apply(&mut world, goblin, &weaken).unwrap();
        assert_eq!(power(&world, goblin), 0);

        tick(&mut world);
        tick(&mut world);
        assert_eq!(power(&world, goblin), prefabs::GOBLIN_POWER);
    }

    #[test]
    fn test_per_turn_applies_every_tick() {
        let (mut world, goblin) = with_goblin();
        let poison = EffectSpec::instant("poison")
            .with_stat(StatKind::Health, -1)
            .lasting(3);

        apply(&mut world, goblin, &poison).unwrap();
        assert_eq!(world.store().get::<Health>(goblin).unwrap().current, prefabs::GOBLIN_HEALTH);
        for _ in 0..3 {
            tick(&mut world);
        }
        assert_eq!(
            world.store().get::<Health>(goblin).unwrap().current,
            prefabs::GOBLIN_HEALTH - 3
        );
        assert!(!world.store().has::<ActiveEffects>(goblin));
    }

    #[test]
    fn test_per_turn_damage_can_kill() {
        let (mut world, goblin) = with_goblin();
        let burn = EffectSpec::instant("burning")
            .lasting(5)
            .with_event(EffectEvent::TakeDamage { amount: 3 });

        apply(&mut world, goblin, &burn).unwrap();
        tick(&mut world);
        assert!(!world.store().has::<Dead>(goblin));
        tick(&mut world);
        assert!(world.store().has::<Dead>(goblin));
        assert!(!world.store().has::<delve_core::AiTag>(goblin));
        assert!(!world.store().has::<ActiveEffects>(goblin));
    }

    #[test]
    fn test_corpse_is_not_regenerated() {
        let (mut world, goblin) = with_goblin();
        let burn = EffectSpec::instant("burning")
            .lasting(5)
            .with_event(EffectEvent::TakeDamage { amount: 10 });
        let regen = EffectSpec::instant("regeneration")
            .with_stat(StatKind::Health, 2)
            .lasting(5);

        apply(&mut world, goblin, &burn).unwrap();
        apply(&mut world, goblin, &regen).unwrap();
        tick(&mut world);
        tick(&mut world);

        assert!(world.store().has::<Dead>(goblin));
        assert_eq!(world.store().get::<Health>(goblin).unwrap().current, 0);

        apply(&mut world, goblin, &regen).unwrap();
        assert!(!world.store().has::<ActiveEffects>(goblin));
        tick(&mut world);
        assert_eq!(world.store().get::<Health>(goblin).unwrap().current, 0);
    }

    #[test]
    fn test_instant_effect_leaves_nothing_behind() {
        let (mut world, goblin) = with_goblin();
        let zap = EffectSpec::instant("zap").with_event(EffectEvent::TakeDamage { amount: 2 });

        apply(&mut world, goblin, &zap).unwrap();
        assert_eq!(
            world.store().get::<Health>(goblin).unwrap().current,
            prefabs::GOBLIN_HEALTH - 2
        );
        assert!(!world.store().has::<ActiveEffects>(goblin));
    }

    #[test]
    fn test_zero_remaining_resolves_in_one_pass() {
        let (mut world, goblin) = with_goblin();
        let mut stale = ActiveEffect::new(EffectSpec::instant("regen").with_stat(StatKind::Health, 1));
        stale.remaining_turns = 0;
        world.store_mut().get_mut::<Health>(goblin).unwrap().current = 1;
        world
            .store_mut()
            .attach(goblin, ActiveEffects { effects: vec![stale] })
            .unwrap();

        assert_eq!(tick(&mut world), 1);
        assert_eq!(world.store().get::<Health>(goblin).unwrap().current, 2);
        assert!(!world.store().has::<ActiveEffects>(goblin));
    }

    #[test]
    fn test_tag_held_while_any_effect_holds_it() {
        let (mut world, goblin) = with_goblin();
        let short = EffectSpec::instant("stun").lasting(1).with_tag(TagKind::Paralyzed);
        let long = EffectSpec::instant("freeze").lasting(3).with_tag(TagKind::Paralyzed);

        apply(&mut world, goblin, &short).unwrap();
        apply(&mut world, goblin, &long).unwrap();
        assert!(world.store().has::<Paralyzed>(goblin));

        tick(&mut world);
        assert!(world.store().has::<Paralyzed>(goblin));
        tick(&mut world);
        assert!(world.store().has::<Paralyzed>(goblin));
        tick(&mut world);
        assert!(!world.store().has::<Paralyzed>(goblin));
        assert!(world.messages().contains("can move again"));
    }

    #[test]
    fn test_effects_run_in_application_order() {
        let (mut world, goblin) = with_goblin();
        world.store_mut().get_mut::<Health>(goblin).unwrap().current = 1;
        let heal = EffectSpec::instant("mend").lasting(1).with_event(EffectEvent::Heal { amount: 4 });
        let hurt = EffectSpec::instant("wound")
            .lasting(1)
            .with_event(EffectEvent::TakeDamage { amount: 3 });

        apply(&mut world, goblin, &heal).unwrap();
        apply(&mut world, goblin, &hurt).unwrap();
        tick(&mut world);

        // Healed to 5 first, then hurt to 2; the reverse order would kill.
        assert_eq!(world.store().get::<Health>(goblin).unwrap().current, 2);
        assert!(!world.store().has::<Dead>(goblin));
    }

    #[test]
    fn test_missing_stat_is_reported() {
        let (mut world, _) = with_goblin();
        let rock = world.store_mut().create();
        let spec = EffectSpec::instant("rage").with_stat(StatKind::Power, 1);
        assert!(matches!(
            apply(&mut world, rock, &spec),
            Err(EffectError::MissingStat { stat: StatKind::Power, .. })
        ));
    }

    #[test]
    fn test_stale_target_is_rejected() {
        let (mut world, goblin) = with_goblin();
        world.store_mut().destroy(goblin);
        assert!(apply(&mut world, goblin, &EffectSpec::instant("zap")).is_err());
    }
}
