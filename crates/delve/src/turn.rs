//! # Turn Scheduler
//!
//! The state machine driving one full game turn.
//!
//! ```text
//! AwaitingPlayerInput ──intent──> ResolvingPlayer ──spent──> ResolvingWorld
//!        ^    ^                         │  │                    │ AI
//!        │    └──────── free ───────────┘  │                    │ effects
//!        │                                 └─ needs target ─┐   │ visibility
//!        │                                                  v   │
//!        │                                AwaitingTarget ───┘   │
//!        └──────────────────────────────────────────────────────┘
//!
//!  player health <= 0 at any point ──> GameOver (LoadGame / NewGame only)
//! ```
//!
//! Bumping a wall, being paralyzed and a fizzling scroll all spend the
//! player's turn. Looking at an empty slot, finding nothing to pick up and
//! choosing a target cost nothing.

use tracing::{debug, warn};

use delve_core::{
    Blocking, Consumable, Dead, Defense, EntityId, Health, Inventory, Item, LocationKey, Paralyzed, Position,
    Query, Targeting, TileKind, Visible,
};

use crate::ai;
use crate::combat;
use crate::effects;
use crate::error::{SimResult, TurnError};
use crate::events::GameEvent;
use crate::world::{GameWorld, FIRST_LEVEL};

/// Scheduler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the next player intent.
    #[default]
    AwaitingPlayerInput,
    /// An item needs a `Target` intent before it resolves.
    AwaitingTarget {
        /// Inventory slot of the item.
        item: usize,
        /// Blast radius around the chosen cell.
        radius: i32,
    },
    /// Applying the player's action.
    ResolvingPlayer,
    /// Running AI, effects and visibility.
    ResolvingWorld,
    /// The player is dead.
    GameOver,
}

/// Player intent vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Step, or attack whatever stands there.
    Move {
        /// Column delta.
        dx: i32,
        /// Row delta.
        dy: i32,
    },
    /// Pass the turn.
    Wait,
    /// Use the item in an inventory slot.
    UseItem(usize),
    /// Choose the cell for a pending item.
    Target(LocationKey),
    /// Pick up an item underfoot.
    PickUp,
    /// Take the down stairs underfoot.
    Descend,
    /// Take the up stairs underfoot.
    Ascend,
    /// Ask the host to save.
    SaveGame,
    /// Ask the host to load.
    LoadGame,
    /// Ask the host to start over.
    NewGame,
}

/// Commands the host handles outside the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaCommand {
    /// Save the current world.
    Save,
    /// Replace the world with a saved one.
    Load,
    /// Replace the world with a fresh one.
    NewGame,
}

impl Intent {
    const fn meta(self) -> Option<MetaCommand> {
        match self {
            Self::SaveGame => Some(MetaCommand::Save),
            Self::LoadGame => Some(MetaCommand::Load),
            Self::NewGame => Some(MetaCommand::NewGame),
            _ => None,
        }
    }
}

/// Result of submitting one intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A full turn was resolved.
    Advanced {
        /// Turn counter after the turn.
        turn: u64,
    },
    /// Nothing happened that costs a turn.
    NoTurn,
    /// The chosen item needs a `Target` intent.
    NeedsTarget {
        /// Blast radius of the item.
        radius: i32,
    },
    /// The host must carry out a meta command.
    Meta(MetaCommand),
    /// The player died during this turn.
    PlayerDied,
}

enum Resolution {
    Spent,
    Free,
    NeedsTarget { item: usize, radius: i32 },
}

/// Drives player intents through full game turns.
#[derive(Clone, Debug, Default)]
pub struct TurnScheduler {
    state: TurnState,
}

impl TurnScheduler {
    /// A scheduler waiting for input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Re-derives the state after the host replaced the world.
    pub fn sync(&mut self, world: &GameWorld) {
        self.state = if world.is_player_dead() {
            TurnState::GameOver
        } else {
            TurnState::AwaitingPlayerInput
        };
    }

    /// Resolves one intent.
    ///
    /// Meta intents are returned to the host without spending a turn.
    /// Otherwise the player acts; if that spent the turn, every active
    /// monster acts, the effect engine ticks and visibility is recomputed.
    ///
    /// # Errors
    ///
    /// [`TurnError::GameOver`] once the player is dead, for anything but
    /// `LoadGame` and `NewGame`. Failures of the player's own action are propagated and leave
    /// the scheduler waiting for input.
    pub fn submit(&mut self, world: &mut GameWorld, intent: Intent) -> Result<TurnOutcome, TurnError> {
        if self.state == TurnState::GameOver || world.is_player_dead() {
            self.state = TurnState::GameOver;
            return match intent.meta() {
                Some(meta @ (MetaCommand::Load | MetaCommand::NewGame)) => {
                    debug!(?meta, "meta command after game over");
                    Ok(TurnOutcome::Meta(meta))
                }
                _ => Err(TurnError::GameOver),
            };
        }
        if let Some(meta) = intent.meta() {
            if matches!(self.state, TurnState::AwaitingTarget { .. }) {
                self.state = TurnState::AwaitingPlayerInput;
            }
            debug!(?meta, "meta command");
            return Ok(TurnOutcome::Meta(meta));
        }

        match self.run(world, intent) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.state = TurnState::AwaitingPlayerInput;
                Err(err.into())
            }
        }
    }

    fn run(&mut self, world: &mut GameWorld, intent: Intent) -> SimResult<TurnOutcome> {
        let resolution = match (self.state, intent) {
            (TurnState::AwaitingTarget { item, radius }, Intent::Target(at)) => {
                self.state = TurnState::ResolvingPlayer;
                resolve_target(world, item, radius, at)?
            }
            (TurnState::AwaitingTarget { .. }, _) => {
                world.log("Targeting cancelled.");
                Resolution::Free
            }
            (_, intent) => {
                self.state = TurnState::ResolvingPlayer;
                debug!(turn = world.turn(), ?intent, "resolving player");
                resolve_player(world, intent)?
            }
        };

        match resolution {
            Resolution::Free => {
                self.state = TurnState::AwaitingPlayerInput;
                return Ok(TurnOutcome::NoTurn);
            }
            Resolution::NeedsTarget { item, radius } => {
                self.state = TurnState::AwaitingTarget { item, radius };
                return Ok(TurnOutcome::NeedsTarget { radius });
            }
            Resolution::Spent => {}
        }

        world.update_fov()?;
        if world.is_player_dead() {
            return Ok(self.game_over(world));
        }

        self.state = TurnState::ResolvingWorld;
        let actions = ai::run(world);
        let expired = effects::tick(world);
        world.update_fov()?;
        let turn = world.advance_turn();
        debug!(turn, monsters = actions.len(), expired, "world resolved");

        if world.is_player_dead() {
            return Ok(self.game_over(world));
        }
        self.state = TurnState::AwaitingPlayerInput;
        Ok(TurnOutcome::Advanced { turn })
    }

    fn game_over(&mut self, world: &mut GameWorld) -> TurnOutcome {
        self.state = TurnState::GameOver;
        world.log("Game over. Load a saved game or start a new one.");
        TurnOutcome::PlayerDied
    }
}

// =============================================================================
// Player actions
// =============================================================================

fn resolve_player(world: &mut GameWorld, intent: Intent) -> SimResult<Resolution> {
    match intent {
        Intent::Move { dx, dy } => bump(world, dx, dy),
        Intent::Wait => Ok(Resolution::Spent),
        Intent::PickUp => pick_up(world),
        Intent::UseItem(slot) => use_item(world, slot),
        Intent::Descend => take_stairs(world, TileKind::StairsDown),
        Intent::Ascend => take_stairs(world, TileKind::StairsUp),
        Intent::Target(at) => {
            debug!(%at, "target with no pending item ignored");
            Ok(Resolution::Free)
        }
        Intent::SaveGame | Intent::LoadGame | Intent::NewGame => Ok(Resolution::Free),
    }
}

/// Living entity at `at` that can be attacked.
fn combatant_at(world: &GameWorld, at: LocationKey) -> Option<EntityId> {
    let store = world.store();
    store.entities_at(at).iter().copied().find(|&id| {
        store.has::<Health>(id) && store.has::<Defense>(id) && !store.has::<Dead>(id)
    })
}

fn bump(world: &mut GameWorld, dx: i32, dy: i32) -> SimResult<Resolution> {
    let player = world.player();
    let from = world.player_position()?;

    if world.store().has::<Paralyzed>(player) {
        world.log("You are paralyzed!");
        return Ok(Resolution::Spent);
    }

    let to = from.offset(dx, dy);
    if let Some(target) = combatant_at(world, to) {
        combat::attack(world, player, target)?;
        return Ok(Resolution::Spent);
    }

    let in_bounds = world.bounds(to.level).is_some_and(|b| b.contains(to.x, to.y));
    let blocker = world
        .store()
        .entities_at(to)
        .iter()
        .copied()
        .find(|&id| world.store().has::<Blocking>(id));
    if !in_bounds || blocker.is_some() {
        let what = blocker.map_or_else(
            || "the edge of the world".to_string(),
            |id| format!("the {}", world.name_of(id)),
        );
        world.log(format!("You bump into {what}."));
        world.emit(GameEvent::Bumped { entity: player, at: to });
        return Ok(Resolution::Spent);
    }

    world.move_entity(player, to)?;
    let item = world
        .store()
        .entities_at(to)
        .iter()
        .copied()
        .find(|&id| world.store().has::<Item>(id));
    if let Some(item) = item {
        let name = world.name_of(item);
        world.log(format!("You see a {name} here."));
    }
    Ok(Resolution::Spent)
}

fn pick_up(world: &mut GameWorld) -> SimResult<Resolution> {
    let player = world.player();
    let at = world.player_position()?;
    let item = world
        .store()
        .entities_at(at)
        .iter()
        .copied()
        .find(|&id| world.store().has::<Item>(id));
    let Some(item) = item else {
        world.log("There is nothing here to pick up.");
        return Ok(Resolution::Free);
    };

    let store = world.store_mut();
    store.detach::<Position>(item);
    if let Some(inventory) = store.get_mut::<Inventory>(player) {
        inventory.items.push(item);
    } else {
        store.attach(player, Inventory { items: vec![item] })?;
    }

    let name = world.name_of(item);
    world.log(format!("You pick up the {name}."));
    world.emit(GameEvent::ItemPickedUp { entity: player, item });
    Ok(Resolution::Spent)
}

fn inventory_item(world: &GameWorld, slot: usize) -> Option<EntityId> {
    world
        .store()
        .get::<Inventory>(world.player())
        .and_then(|inventory| inventory.items.get(slot).copied())
}

fn use_item(world: &mut GameWorld, slot: usize) -> SimResult<Resolution> {
    let player = world.player();
    let Some(item) = inventory_item(world, slot) else {
        world.log("You have no item in that slot.");
        return Ok(Resolution::Free);
    };
    let Some(consumable) = world.store().get::<Consumable>(item).cloned() else {
        let name = world.name_of(item);
        world.log(format!("The {name} cannot be used."));
        return Ok(Resolution::Free);
    };

    let targets = match consumable.targeting {
        Targeting::User => vec![player],
        Targeting::NearestVisible { range } => nearest_visible(world, player, range).into_iter().collect(),
        Targeting::Location { radius } => {
            world.log("Choose a target location.");
            return Ok(Resolution::NeedsTarget { item: slot, radius });
        }
    };
    consume(world, slot, item, &consumable, &targets)?;
    Ok(Resolution::Spent)
}

fn resolve_target(world: &mut GameWorld, slot: usize, radius: i32, at: LocationKey) -> SimResult<Resolution> {
    let Some(item) = inventory_item(world, slot) else {
        return Ok(Resolution::Free);
    };
    let Some(consumable) = world.store().get::<Consumable>(item).cloned() else {
        return Ok(Resolution::Free);
    };

    let level = world.player_position()?.level;
    let targets = if at.level == level {
        actors_within(world, at, radius)
    } else {
        Vec::new()
    };
    consume(world, slot, item, &consumable, &targets)?;
    Ok(Resolution::Spent)
}

/// Closest visible living actor other than `user` within `range`.
fn nearest_visible(world: &GameWorld, user: EntityId, range: i32) -> Option<EntityId> {
    let origin = world.store().location_of(user)?;
    let limit = i64::from(range) * i64::from(range);
    let query = Query::new().with::<Health>().with::<Visible>().without::<Dead>();
    world
        .store()
        .query(query)
        .filter(|&id| id != user)
        .filter_map(|id| {
            let at = world.store().location_of(id)?;
            let distance = at.distance_squared(origin);
            (at.level == origin.level && distance <= limit).then_some((id, distance))
        })
        .min_by_key(|&(_, distance)| distance)
        .map(|(id, _)| id)
}

/// Living actors within `radius` of `center`, in slot order.
fn actors_within(world: &GameWorld, center: LocationKey, radius: i32) -> Vec<EntityId> {
    let limit = i64::from(radius) * i64::from(radius);
    let query = Query::new().with::<Health>().with::<Position>().without::<Dead>();
    world
        .store()
        .query(query)
        .filter(|&id| {
            world
                .store()
                .location_of(id)
                .is_some_and(|at| at.level == center.level && at.distance_squared(center) <= limit)
        })
        .collect()
}

/// Applies the item's effect to every target, then destroys the item. With
/// no targets the item fizzles but is still used up.
fn consume(
    world: &mut GameWorld,
    slot: usize,
    item: EntityId,
    consumable: &Consumable,
    targets: &[EntityId],
) -> SimResult<()> {
    let player = world.player();
    let name = world.name_of(item);

    if targets.is_empty() {
        world.log(format!("The {name} fizzles."));
    } else {
        world.log(format!("You use the {name}."));
    }
    for &target in targets {
        if let Err(err) = effects::apply(world, target, &consumable.effect) {
            warn!(%target, %err, "item effect skipped");
        }
    }

    if let Some(inventory) = world.store_mut().get_mut::<Inventory>(player) {
        if slot < inventory.items.len() {
            inventory.items.remove(slot);
        }
    }
    world.store_mut().destroy(item);
    world.emit(GameEvent::ItemUsed {
        entity: player,
        item,
        targets: targets.to_vec(),
    });
    Ok(())
}

fn take_stairs(world: &mut GameWorld, wanted: TileKind) -> SimResult<Resolution> {
    let at = world.player_position()?;
    if world.terrain_at(at) != Some(wanted) {
        let direction = if wanted == TileKind::StairsDown { "down" } else { "up" };
        world.log(format!("There are no stairs {direction} here."));
        return Ok(Resolution::Free);
    }

    let level = world.level();
    let to = if wanted == TileKind::StairsDown { level - 1 } else { level + 1 };
    if to > FIRST_LEVEL {
        world.log("The way out is sealed.");
        return Ok(Resolution::Free);
    }
    world.change_level(to)?;
    Ok(Resolution::Spent)
}
