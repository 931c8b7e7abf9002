//! # Monster AI
//!
//! Every active monster paths toward the player and takes one step. If the
//! next step is the player's cell it attacks instead. A monster with no path
//! stays put; that is a normal outcome, not an error.

use tracing::{debug, warn};

use delve_core::{AiTag, Blocking, Dead, EntityId, LocationKey, Paralyzed, Position, Query, Visible};

use crate::combat;
use crate::error::AiError;
use crate::path;
use crate::world::GameWorld;

/// What one monster did with its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiAction {
    /// Nothing to do: no path, wrong level, or the player is gone.
    Idle,
    /// Held in place by a paralyzing effect.
    Paralyzed,
    /// Stepped to a new cell.
    Moved(LocationKey),
    /// Attacked the player for this much damage.
    Attacked(i32),
    /// The next cell filled up before the step resolved.
    Blocked,
}

/// Monsters that take a turn this pass, in slot order.
#[must_use]
pub fn active_monsters(world: &GameWorld) -> Vec<EntityId> {
    let mut query = Query::new().with::<AiTag>().with::<Position>().without::<Dead>();
    if world.config().ai.activate_only_visible {
        query = query.with::<Visible>();
    }
    world.store().query(query).collect()
}

/// Runs one AI pass. A failing monster is logged and skipped.
pub fn run(world: &mut GameWorld) -> Vec<(EntityId, AiAction)> {
    let Ok(target) = world.player_position() else {
        return Vec::new();
    };

    let mut actions = Vec::new();
    for actor in active_monsters(world) {
        match take_turn(world, actor, target) {
            Ok(action) => actions.push((actor, action)),
            Err(err) => warn!(%actor, %err, "monster turn skipped"),
        }
    }
    actions
}

/// Resolves one monster's turn against the player at `target`.
///
/// # Errors
///
/// Fails if the monster has no position or stands on an unknown level.
pub fn take_turn(world: &mut GameWorld, actor: EntityId, target: LocationKey) -> Result<AiAction, AiError> {
    if world.is_player_dead() || !world.store().is_alive(actor) || world.store().has::<Dead>(actor) {
        return Ok(AiAction::Idle);
    }
    if world.store().has::<Paralyzed>(actor) {
        debug!(%actor, "paralyzed");
        return Ok(AiAction::Paralyzed);
    }

    let from = world.store().location_of(actor).ok_or(AiError::NoPosition(actor))?;
    if from.level != target.level {
        return Ok(AiAction::Idle);
    }
    let bounds = world.bounds(from.level).ok_or(AiError::UnknownLevel {
        actor,
        level: from.level,
    })?;

    let route = path::find_path(world.store(), bounds, from, target);
    debug!(%actor, length = route.len(), "path computed");
    let Some(&next) = route.get(1) else {
        return Ok(AiAction::Idle);
    };

    if next == target {
        let player = world.player();
        let damage = combat::attack(world, actor, player)?;
        return Ok(AiAction::Attacked(damage));
    }
    if world.store().any_at::<Blocking>(next) {
        return Ok(AiAction::Blocked);
    }
    world.move_entity(actor, next)?;
    Ok(AiAction::Moved(next))
}
