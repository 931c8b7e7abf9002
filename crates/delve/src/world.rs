//! # Game World
//!
//! Owns everything one playthrough needs: the entity store, per-level
//! bookkeeping, the player handle, the turn counter, the seeded RNG, the
//! message log and the event channel.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use delve_core::{
    Blocking, ComponentKind, Dead, Description, EntityId, EntityStore, Health, LocationKey,
    Position, StoreError, StoreSnapshot, Terrain, TileKind,
};

use crate::config::GameConfig;
use crate::error::{SimError, SimResult};
use crate::events::{EventBus, EventReceiver, EventSender, GameEvent};
use crate::fov;
use crate::level::{LevelBounds, LevelData, LevelInfo, LevelSource, NoLevels};
use crate::messages::MessageLog;
use crate::prefabs;
use crate::spawn;

/// Level the player starts on.
pub const FIRST_LEVEL: i32 = -1;

/// Complete simulation state for one playthrough.
pub struct GameWorld {
    /// All entities and the spatial index.
    store: EntityStore,
    /// Tunables.
    config: GameConfig,
    /// The player entity.
    player: EntityId,
    /// Level the player is on.
    level: i32,
    /// Bounds and stairs of every level loaded so far.
    levels: BTreeMap<i32, LevelInfo>,
    /// Completed world turns.
    turn: u64,
    /// Source of every random decision.
    pub(crate) rng: ChaCha8Rng,
    /// User-visible messages.
    messages: MessageLog,
    /// Channel kept alive for receivers handed to the host.
    bus: EventBus,
    /// Simulation end of the channel.
    events: EventSender,
    /// Supplies levels the first time they are entered.
    source: Box<dyn LevelSource>,
}

/// Everything needed to resume a playthrough.
///
/// The spatial index is not included; it is rebuilt from Position
/// components on restore.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Live entities and their components.
    pub store: StoreSnapshot,
    /// Per-level bounds and stairs.
    pub levels: BTreeMap<i32, LevelInfo>,
    /// The player entity.
    pub player: EntityId,
    /// Level the player is on.
    pub level: i32,
    /// Completed world turns.
    pub turn: u64,
    /// RNG state, so spawning continues identically.
    pub rng: ChaCha8Rng,
    /// Message log.
    pub messages: MessageLog,
}

impl GameWorld {
    /// A world with no levels and no player, drawing levels from `source`.
    #[must_use]
    pub fn with_source(config: GameConfig, source: Box<dyn LevelSource>) -> Self {
        let bus = EventBus::new(config.event_capacity);
        let events = bus.sender();
        Self {
            store: EntityStore::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            messages: MessageLog::new(config.message_log_capacity),
            player: EntityId::NULL,
            level: FIRST_LEVEL,
            levels: BTreeMap::new(),
            turn: 0,
            bus,
            events,
            source,
            config,
        }
    }

    /// A world with no levels, no player and no level source. Levels are
    /// added with [`GameWorld::add_level`].
    #[must_use]
    pub fn empty(config: GameConfig) -> Self {
        Self::with_source(config, Box::new(NoLevels))
    }

    /// Starts a new playthrough: loads the first level, places the player on
    /// its up stairs (or the first open cell), populates it and computes the
    /// initial field of view.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot supply the first level or it has no open
    /// cell.
    pub fn new(config: GameConfig, source: impl LevelSource + 'static) -> SimResult<Self> {
        let mut world = Self::with_source(config, Box::new(source));
        let data = world.source.generate(FIRST_LEVEL)?;
        world.add_level(&data)?;

        let start = data
            .info()
            .stairs_up
            .or_else(|| data.open_cells().first().copied())
            .ok_or(SimError::NoOpenCell(FIRST_LEVEL))?;
        world.spawn_player(start)?;
        spawn::populate(&mut world, &data)?;
        world.update_fov()?;
        world.log("You enter the dungeon.");
        info!(seed = world.config.seed, "new game");
        Ok(world)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Read access to the entity store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Write access to the entity store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Level the player is on.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Completed world turns.
    #[must_use]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The message log.
    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Appends to the message log.
    pub fn log(&mut self, message: impl Into<String>) {
        self.messages.push(message);
    }

    /// A receiver for simulation events.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Publishes an event; dropped with a warning if the channel is full.
    pub fn emit(&self, event: GameEvent) {
        self.events.send(event);
    }

    /// Bookkeeping for a loaded level.
    #[must_use]
    pub fn level_info(&self, level: i32) -> Option<&LevelInfo> {
        self.levels.get(&level)
    }

    /// Bounds of a loaded level.
    #[must_use]
    pub fn bounds(&self, level: i32) -> Option<LevelBounds> {
        self.levels.get(&level).map(|info| info.bounds)
    }

    pub(crate) fn advance_turn(&mut self) -> u64 {
        self.turn += 1;
        self.turn
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The player's cell.
    ///
    /// # Errors
    ///
    /// [`SimError::NoPlayer`] if there is no live, positioned player.
    pub fn player_position(&self) -> SimResult<LocationKey> {
        self.store.location_of(self.player).ok_or(SimError::NoPlayer)
    }

    /// True once the player is gone or out of hit points.
    #[must_use]
    pub fn is_player_dead(&self) -> bool {
        !self.store.is_alive(self.player)
            || self.store.has::<Dead>(self.player)
            || self
                .store
                .get::<Health>(self.player)
                .is_some_and(|hp| hp.current <= 0)
    }

    /// Display name, falling back to "something".
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> String {
        self.store
            .get::<Description>(id)
            .map_or_else(|| "something".to_string(), |d| d.name.clone())
    }

    /// Terrain kind of a cell, if it has terrain.
    #[must_use]
    pub fn terrain_at(&self, key: LocationKey) -> Option<TileKind> {
        self.store
            .entities_at(key)
            .iter()
            .find_map(|&id| self.store.get::<Terrain>(id))
            .map(|t| t.kind)
    }

    /// Smallest open terrain cell with no blocking occupant.
    fn first_open_cell(&self, level: i32) -> Option<LocationKey> {
        self.store
            .spatial()
            .iter_level(level)
            .filter(|(key, _)| self.terrain_at(*key).is_some_and(|kind| !kind.is_blocking()))
            .filter(|(key, _)| !self.store.any_at::<Blocking>(*key))
            .map(|(key, _)| key)
            .min()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Instantiates terrain entities for a level and records its bounds and
    /// stairs. A level that is already loaded is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn add_level(&mut self, data: &LevelData) -> SimResult<()> {
        if self.levels.contains_key(&data.level()) {
            debug!(level = data.level(), "level already loaded");
            return Ok(());
        }
        for (key, kind) in data.tiles() {
            prefabs::terrain(&mut self.store, key, kind)?;
        }
        self.levels.insert(data.level(), data.info());
        debug!(level = data.level(), "level loaded");
        Ok(())
    }

    /// Creates the player at `at` and makes it the world's player.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn spawn_player(&mut self, at: LocationKey) -> SimResult<EntityId> {
        self.player = prefabs::player(&mut self.store, at)?;
        self.level = at.level;
        Ok(self.player)
    }

    /// Moves an entity to `to`, keeping the spatial index in step.
    ///
    /// # Errors
    ///
    /// Fails if the entity is stale or has no position.
    pub fn move_entity(&mut self, id: EntityId, to: LocationKey) -> SimResult<()> {
        let from = self
            .store
            .location_of(id)
            .ok_or(StoreError::MissingComponent {
                entity: id,
                kind: ComponentKind::Position,
            })?;
        self.store.set_position(id, Position::from(to))?;
        self.emit(GameEvent::Moved { entity: id, from, to });
        Ok(())
    }

    /// Recomputes the player's field of view and rewrites Visible flags.
    /// Stale spatial index entries met on the way are repaired.
    ///
    /// # Errors
    ///
    /// [`SimError::NoPlayer`] if the player has no position.
    pub fn update_fov(&mut self) -> SimResult<()> {
        let origin = self.player_position()?;
        let visible = fov::compute_visible(&self.store, origin, self.config.fov_radius);
        let update = fov::apply_visibility(&mut self.store, &visible)?;
        if update.stale > 0 {
            let repaired = self.store.repair_spatial_index();
            warn!(stale = update.stale, repaired, "spatial index repaired during visibility update");
        }
        debug!(cells = visible.len(), entities = update.visible, "field of view updated");
        Ok(())
    }

    /// Moves the player to another level.
    ///
    /// Non-player actors on the level being left are destroyed; terrain and
    /// items stay. A level entered for the first time is generated and
    /// populated. The player arrives on the up stairs when descending and
    /// the down stairs when ascending.
    ///
    /// # Errors
    ///
    /// Fails if the level source cannot supply the level or it has no open
    /// cell. On failure the level being left is unchanged.
    pub fn change_level(&mut self, to: i32) -> SimResult<()> {
        let from = self.level;
        if to == from {
            return Ok(());
        }

        if !self.levels.contains_key(&to) {
            let data = self.source.generate(to)?;
            self.add_level(&data)?;
            spawn::populate(self, &data)?;
        }

        let info = self.levels.get(&to).copied().ok_or(SimError::MissingLevel(to))?;
        let stairs = if to < from { info.stairs_up } else { info.stairs_down };
        let arrival = stairs
            .or_else(|| self.first_open_cell(to))
            .ok_or(SimError::NoOpenCell(to))?;

        // Nothing on the old level is touched until the new one is ready.
        let leaving: Vec<EntityId> = self
            .store
            .spatial()
            .iter_level(from)
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|&id| id != self.player && self.store.has::<Health>(id))
            .collect();
        for id in leaving {
            self.store.destroy(id);
        }

        self.move_entity(self.player, arrival)?;
        self.level = to;
        info!(from, to, "level changed");
        self.log(format!("You arrive on level {}.", -to));
        self.emit(GameEvent::LevelChanged { from, to });
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Captures the playthrough.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            store: self.store.snapshot(),
            levels: self.levels.clone(),
            player: self.player,
            level: self.level,
            turn: self.turn,
            rng: self.rng.clone(),
            messages: self.messages.clone(),
        }
    }

    /// Replaces the playthrough with a snapshot. Configuration, the level
    /// source and the event channel are kept.
    ///
    /// # Errors
    ///
    /// Fails for a malformed snapshot.
    pub fn restore(&mut self, snapshot: &WorldSnapshot) -> SimResult<()> {
        self.store.restore(&snapshot.store)?;
        self.levels = snapshot.levels.clone();
        self.player = snapshot.player;
        self.level = snapshot.level;
        self.turn = snapshot.turn;
        self.rng = snapshot.rng.clone();
        self.messages = snapshot.messages.clone();
        info!(turn = self.turn, level = self.level, "game restored");
        Ok(())
    }
}
