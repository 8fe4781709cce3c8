//! The world: entity table, spatial index and connected players.
//!
//! A [`World`] is shared (`&self` everywhere) between the tick and other
//! threads. The entity table is a `DashMap`; the spatial index has its own
//! lock. Locks are never nested in the query direction: a query snapshots
//! the index, drops its lock, then resolves ids through the table. Only
//! [`World::move_entity`] holds a table guard while it takes the index lock.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use sim_data::StaticData;
use sim_entity::{
    Entity, EntityId, EntityIdAllocator, EntityIdType, EntityKind, FightProp, LifecycleState,
    PlayerUid, SceneEntityInfo,
};
use sim_math::Position;
use sim_net::{
    FightPropNotify, Packet, SceneEntityAppearNotify, SceneEntityDisappearNotify, SessionId,
    Transport, VisionType, drain_fight_props,
};
use tracing::{debug, error, info};

use crate::ability::{self, BindReport};
use crate::command::WorldCommand;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::spatial::{Shape, SpatialIndex};

#[derive(Debug, Clone, Copy)]
struct PlayerSlot {
    session: SessionId,
    team: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisionEvent {
    Appear(EntityId),
    Disappear(EntityId),
}

/// One simulated world.
pub struct World {
    config: WorldConfig,
    data: Arc<dyn StaticData>,
    allocator: EntityIdAllocator,
    entities: DashMap<EntityId, Entity>,
    spatial: SpatialIndex,
    players: DashMap<PlayerUid, PlayerSlot>,
    /// Visibility changes since the last sync pass.
    vision: Mutex<Vec<VisionEvent>>,
    level_entity: EntityId,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("entities", &self.entities.len())
            .field("players", &self.players.len())
            .field("level_entity", &self.level_entity)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create a world and spawn its level entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Config`] if `config` fails validation, or
    /// another [`WorldError`] if the level entity cannot be spawned.
    pub fn new(config: WorldConfig, data: Arc<dyn StaticData>) -> Result<Self, WorldError> {
        config.validate()?;
        let mut world = Self {
            spatial: SpatialIndex::new(config.spatial_rank),
            config,
            data,
            allocator: EntityIdAllocator::new(),
            entities: DashMap::new(),
            players: DashMap::new(),
            vision: Mutex::new(Vec::new()),
            level_entity: EntityId::INVALID,
        };
        world.level_entity = world.spawn(Entity::new(
            EntityKind::MpLevel,
            Position::ZERO,
            Position::ZERO,
        ))?;
        info!(
            level_entity = %world.level_entity,
            spatial_rank = world.config.spatial_rank,
            "world created"
        );
        Ok(world)
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn data(&self) -> &Arc<dyn StaticData> {
        &self.data
    }

    /// The world-anchor entity created with the world.
    #[must_use]
    pub fn level_entity_id(&self) -> EntityId {
        self.level_entity
    }

    /// The raw index. It can see an entity mid-spawn, before it reaches the
    /// table; public reads go through the table-filtered queries instead.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Activate `entity`: allocate its id, bind its default abilities, index
    /// it and add it to the table. Nothing is committed if indexing fails.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotUnbound`] for an entity that was already
    /// activated, or [`WorldError::Spatial`] if the index rejects it.
    pub fn spawn(&self, mut entity: Entity) -> Result<EntityId, WorldError> {
        if entity.state() != LifecycleState::Unbound {
            return Err(WorldError::NotUnbound(entity.state()));
        }
        let id = self.allocate_free(entity.kind().allocation_type())?;
        entity.activate(id);
        ability::bind_defaults(&mut entity, self.data.as_ref());
        // The appear record carries the full snapshot.
        if let Some(store) = entity.fight_props_mut() {
            store.drain_dirty();
        }

        self.spatial.insert(id, entity.position())?;
        let visible = !entity.kind().is_container();
        debug!(entity = %id, position = %entity.position(), abilities = entity.abilities().len(), "spawned");
        self.entities.insert(id, entity);
        if visible {
            self.vision.lock().push(VisionEvent::Appear(id));
        }
        Ok(id)
    }

    /// Allocate an id no live entity holds. Only matters once the sequence
    /// has wrapped.
    fn allocate_free(&self, id_type: EntityIdType) -> Result<EntityId, WorldError> {
        for _ in 0..EntityId::MAX_SEQUENCE {
            let id = self.allocator.allocate(id_type);
            if !self.entities.contains_key(&id) && !self.spatial.contains(id) {
                return Ok(id);
            }
            debug!(entity = %id, "id still live after wrap, skipping");
        }
        Err(WorldError::IdsExhausted(id_type))
    }

    /// Remove `id` from the index, then the table, and hand back the entity
    /// marked removed. `None` if it was not in the world.
    pub fn despawn(&self, id: EntityId) -> Option<Entity> {
        self.spatial.remove(id);
        let (_, mut entity) = self.entities.remove(&id)?;
        entity.mark_removed();
        if !entity.kind().is_container() {
            self.vision.lock().push(VisionEvent::Disappear(id));
        }
        debug!(entity = %id, "despawned");
        Some(entity)
    }

    /// Move `id`, keeping the index and the entity's own position in step.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if `id` is not in the table, or
    /// [`WorldError::Spatial`] if it was deindexed concurrently.
    pub fn move_entity(
        &self,
        id: EntityId,
        position: Position,
        rotation: Option<Position>,
    ) -> Result<(), WorldError> {
        let mut entity = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::UnknownEntity(id))?;
        self.spatial.update(id, position)?;
        entity.set_position(position);
        if let Some(rotation) = rotation {
            entity.set_rotation(rotation);
        }
        Ok(())
    }

    /// Set a fight property on a live entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if `id` is not in the table.
    pub fn set_fight_prop(&self, id: EntityId, prop: FightProp, value: f32) -> Result<(), WorldError> {
        self.with_entity_mut(id, |e| e.set_fight_prop(prop, value))
            .map(|_| ())
            .ok_or(WorldError::UnknownEntity(id))
    }

    /// Bind `id`'s default abilities again, e.g. after a data reload.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if `id` is not in the table.
    pub fn rebind_abilities(&self, id: EntityId) -> Result<BindReport, WorldError> {
        let data = self.data.clone();
        self.with_entity_mut(id, |e| ability::bind_defaults(e, data.as_ref()))
            .ok_or(WorldError::UnknownEntity(id))
    }

    /// Apply one queued command.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation returns.
    pub fn apply(&self, command: WorldCommand) -> Result<(), WorldError> {
        match command {
            WorldCommand::Spawn(entity) => self.spawn(*entity).map(|_| ()),
            WorldCommand::Despawn(id) => {
                self.despawn(id);
                Ok(())
            }
            WorldCommand::Move {
                id,
                position,
                rotation,
            } => self.move_entity(id, position, rotation),
            WorldCommand::SetFightProp { id, prop, value } => self.set_fight_prop(id, prop, value),
            WorldCommand::PlayerJoin { uid, session } => self.add_player(uid, session).map(|_| ()),
            WorldCommand::PlayerLeave(uid) => self.remove_player(uid).map(|_| ()),
        }
    }

    // ── Access ──────────────────────────────────────────────────────────────

    /// Run `f` against entity `id`, if it is live.
    pub fn with_entity<R>(&self, id: EntityId, f: impl FnOnce(&Entity) -> R) -> Option<R> {
        self.entities.get(&id).map(|e| f(&e))
    }

    /// Run `f` against entity `id` mutably, if it is live. Position changes
    /// must go through [`World::move_entity`] instead.
    pub fn with_entity_mut<R>(&self, id: EntityId, f: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        self.entities.get_mut(&id).map(|mut e| f(&mut e))
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Live entities inside `shape`.
    #[must_use]
    pub fn entities_in(&self, shape: Shape) -> Vec<EntityId> {
        self.spatial
            .query(shape)
            .filter(|id| self.entities.contains_key(id))
            .collect()
    }

    /// Live entities within `radius` of `center`.
    #[must_use]
    pub fn nearby(&self, center: Position, radius: f32) -> Vec<EntityId> {
        self.entities_in(Shape::sphere(center, radius))
    }

    /// The `n` live entities closest to `point`, closest first.
    #[must_use]
    pub fn nearest(&self, point: Position, n: usize) -> Vec<EntityId> {
        self.spatial
            .nearest(point, n)
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| self.entities.contains_key(id))
            .collect()
    }

    /// Client records of the visible entities inside `shape`.
    #[must_use]
    pub fn visible_in(&self, shape: Shape) -> Vec<SceneEntityInfo> {
        self.spatial
            .query(shape)
            .filter_map(|id| self.with_entity(id, Entity::to_info).flatten())
            .collect()
    }

    // ── Players ─────────────────────────────────────────────────────────────

    /// Register `uid` on `session` and spawn their team entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PlayerAlreadyJoined`] if `uid` is present.
    pub fn add_player(&self, uid: PlayerUid, session: SessionId) -> Result<EntityId, WorldError> {
        if self.players.contains_key(&uid) {
            return Err(WorldError::PlayerAlreadyJoined(uid));
        }
        let team = self.spawn(Entity::new(
            EntityKind::Team { owner: uid },
            Position::ZERO,
            Position::ZERO,
        ))?;
        self.players.insert(uid, PlayerSlot { session, team });
        info!(player = %uid, %session, team = %team, "player joined");
        Ok(team)
    }

    /// Unregister `uid` and despawn everything they own. Returns how many
    /// entities were removed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownPlayer`] if `uid` is not present.
    pub fn remove_player(&self, uid: PlayerUid) -> Result<usize, WorldError> {
        self.players
            .remove(&uid)
            .ok_or(WorldError::UnknownPlayer(uid))?;
        let owned: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.owner() == Some(uid))
            .map(|e| *e.key())
            .collect();
        for id in &owned {
            self.despawn(*id);
        }
        info!(player = %uid, removed = owned.len(), "player left");
        Ok(owned.len())
    }

    #[must_use]
    pub fn session_of(&self, uid: PlayerUid) -> Option<SessionId> {
        self.players.get(&uid).map(|p| p.session)
    }

    #[must_use]
    pub fn team_of(&self, uid: PlayerUid) -> Option<EntityId> {
        self.players.get(&uid).map(|p| p.team)
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Send `uid` the full state of every visible entity. Returns the number
    /// of entities described; nothing is sent when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownPlayer`] if `uid` is not present, or
    /// [`WorldError::Net`] if encoding fails.
    pub fn send_snapshot(&self, uid: PlayerUid, transport: &dyn Transport) -> Result<usize, WorldError> {
        let session = self.session_of(uid).ok_or(WorldError::UnknownPlayer(uid))?;
        let entity_list: Vec<SceneEntityInfo> =
            self.entities.iter().filter_map(|e| e.to_info()).collect();
        let count = entity_list.len();
        if count > 0 {
            let packet = Packet::from_notify(&SceneEntityAppearNotify {
                entity_list,
                appear_type: VisionType::Meet,
            })?;
            transport.send(session, packet);
        }
        Ok(count)
    }

    // ── Tick ────────────────────────────────────────────────────────────────

    /// Advance every live entity by `dt` seconds.
    pub fn tick(&self, dt: f32) {
        for mut entity in self.entities.iter_mut() {
            entity.on_tick(dt);
        }
    }

    /// Push pending visibility changes and every dirty fight-property set to
    /// clients. Returns the number of packets sent.
    ///
    /// Avatar deltas go to the owner's session only; other entities' deltas
    /// go to every session. Dirty sets are drained even with nobody
    /// connected; joiners get a full snapshot instead.
    pub fn sync(&self, transport: &dyn Transport) -> usize {
        let sessions: Vec<(PlayerUid, SessionId)> = self
            .players
            .iter()
            .map(|p| (*p.key(), p.session))
            .collect();
        let mut sent = self.flush_vision(transport, &sessions);

        for mut entity in self.entities.iter_mut() {
            let owner = entity.owner();
            let Some(notify) = drain_fight_props(&mut entity) else {
                continue;
            };
            let packet = match notify.to_packet() {
                Ok(packet) => packet,
                Err(e) => {
                    error!(entity = %entity.id(), error = %e, "failed to encode fight prop delta");
                    continue;
                }
            };
            match notify {
                FightPropNotify::Avatar(_) => {
                    let target = owner.and_then(|uid| {
                        sessions.iter().find(|(p, _)| *p == uid).map(|(_, s)| *s)
                    });
                    if let Some(session) = target {
                        transport.send(session, packet);
                        sent += 1;
                    }
                }
                FightPropNotify::Entity(_) => sent += broadcast(transport, &sessions, packet),
            }
        }
        if sent > 0 {
            debug!(packets = sent, "sync pass");
        }
        sent
    }

    fn flush_vision(&self, transport: &dyn Transport, sessions: &[(PlayerUid, SessionId)]) -> usize {
        let events = std::mem::take(&mut *self.vision.lock());
        if events.is_empty() {
            return 0;
        }

        let appeared: Vec<EntityId> = events
            .iter()
            .filter_map(|e| match e {
                VisionEvent::Appear(id) => Some(*id),
                VisionEvent::Disappear(_) => None,
            })
            .collect();
        let entity_list: Vec<SceneEntityInfo> = appeared
            .iter()
            .filter_map(|id| self.with_entity(*id, Entity::to_info).flatten())
            .collect();
        // Entities that came and went within one pass were never shown.
        let gone: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                VisionEvent::Disappear(id) if !appeared.contains(id) => Some(id.id()),
                _ => None,
            })
            .collect();

        let mut sent = 0;
        if !entity_list.is_empty() {
            match Packet::from_notify(&SceneEntityAppearNotify {
                entity_list,
                appear_type: VisionType::Born,
            }) {
                Ok(packet) => sent += broadcast(transport, sessions, packet),
                Err(e) => error!(error = %e, "failed to encode appear notify"),
            }
        }
        if !gone.is_empty() {
            match Packet::from_notify(&SceneEntityDisappearNotify {
                entity_list: gone,
                disappear_type: VisionType::Remove,
            }) {
                Ok(packet) => sent += broadcast(transport, sessions, packet),
                Err(e) => error!(error = %e, "failed to encode disappear notify"),
            }
        }
        sent
    }
}

fn broadcast(transport: &dyn Transport, sessions: &[(PlayerUid, SessionId)], packet: Packet) -> usize {
    for (_, session) in sessions {
        transport.send(*session, packet.clone());
    }
    sessions.len()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sim_data::{AbilityDefinition, DefaultAbilities, GameData, GlobalCombatConfig};
    use sim_net::messages::cmd;
    use sim_net::{
        AvatarFightPropUpdateNotify, ChannelTransport, EntityFightPropUpdateNotify, decode,
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::error::ConfigError;

    fn data() -> Arc<dyn StaticData> {
        Arc::new(
            GameData::builder()
                .ability(AbilityDefinition::new("abilityA"))
                .ability(AbilityDefinition::new("abilityB"))
                .ability(AbilityDefinition::new("teamAbility"))
                .global_combat(GlobalCombatConfig {
                    default_abilities: DefaultAbilities {
                        default_mp_level_abilities: vec![
                            "abilityA".into(),
                            "unknown_id".into(),
                            "abilityB".into(),
                        ],
                        default_team_abilities: vec!["teamAbility".into()],
                        ..DefaultAbilities::default()
                    },
                })
                .build(),
        )
    }

    fn world() -> World {
        World::new(WorldConfig::default(), data()).unwrap()
    }

    fn monster_at(p: Position) -> Entity {
        Entity::new(
            EntityKind::Monster {
                monster_id: 21010101,
                level: 1,
            },
            p,
            Position::ZERO,
        )
    }

    fn avatar(owner: PlayerUid, guid: u64) -> Entity {
        Entity::new(
            EntityKind::Avatar {
                avatar_id: 10000007,
                guid,
                owner,
            },
            Position::ZERO,
            Position::ZERO,
        )
    }

    fn drain(rx: &mut UnboundedReceiver<(SessionId, Packet)>) -> Vec<(SessionId, Packet)> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_level_entity_binds_defaults_in_order() {
        let world = world();
        let level = world.level_entity_id();
        assert_eq!(level.id_type(), Some(EntityIdType::MpLevel));
        let names = world
            .with_entity(level, |e| {
                e.abilities().names().map(str::to_string).collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(names, vec!["abilityA", "abilityB"]);
    }

    #[test]
    fn test_world_without_combat_config_still_starts() {
        let data: Arc<dyn StaticData> = Arc::new(GameData::default());
        let world = World::new(WorldConfig::default(), data).unwrap();
        assert!(
            world
                .with_entity(world.level_entity_id(), |e| e.abilities().is_empty())
                .unwrap()
        );
    }

    #[test]
    fn test_spawn_is_visible_to_queries() {
        let world = world();
        let p = Position::new(100.0, 0.0, 100.0);
        let id = world.spawn(monster_at(p)).unwrap();
        assert_eq!(id.id_type(), Some(EntityIdType::Monster));
        assert_eq!(world.nearby(p, 0.0), vec![id]);
        assert!(world.with_entity(id, Entity::is_active).unwrap());
    }

    #[test]
    fn test_spawn_rejects_active_entity() {
        let world = world();
        let mut e = monster_at(Position::ZERO);
        e.activate(EntityId::compose(EntityIdType::Monster, 999));
        assert!(matches!(
            world.spawn(e),
            Err(WorldError::NotUnbound(LifecycleState::Active))
        ));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config = WorldConfig::default().with_tick_rate(0.0);
        assert!(matches!(
            World::new(config, data()),
            Err(WorldError::Config(ConfigError::TickRate(_)))
        ));
    }

    #[test]
    fn test_spawn_skips_ids_still_live_after_wrap() {
        let mut world = world();
        let held = world.spawn(monster_at(Position::new(40.0, 0.0, 0.0))).unwrap();
        // Rewind so the next sequence is the one `held` carries.
        world.allocator = EntityIdAllocator::starting_after(held.sequence() - 1);

        let fresh = world.spawn(monster_at(Position::new(80.0, 0.0, 0.0))).unwrap();
        assert_ne!(fresh, held);
        assert_eq!(fresh.sequence(), held.sequence() + 1);
        assert!(world.contains(held) && world.contains(fresh));
    }

    #[test]
    fn test_rebind_abilities_is_idempotent() {
        let world = world();
        let level = world.level_entity_id();
        let before = world
            .with_entity(level, |e| {
                e.abilities()
                    .iter()
                    .map(|a| (a.name().to_string(), a.instanced_ability_id()))
                    .collect::<Vec<_>>()
            })
            .unwrap();

        let report = world.rebind_abilities(level).unwrap();
        assert_eq!(
            report,
            BindReport {
                bound: 0,
                skipped_unknown: 1,
                already_bound: 2
            }
        );
        let after = world
            .with_entity(level, |e| {
                e.abilities()
                    .iter()
                    .map(|a| (a.name().to_string(), a.instanced_ability_id()))
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(after, before);
        assert_eq!(after.len(), 2);

        let monster = world.spawn(monster_at(Position::new(60.0, 0.0, 0.0))).unwrap();
        world.despawn(monster);
        assert!(matches!(
            world.rebind_abilities(monster),
            Err(WorldError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_despawn_leaves_no_dangling_entry() {
        let world = world();
        let p = Position::new(5.0, 5.0, 5.0);
        let id = world.spawn(monster_at(p)).unwrap();

        let removed = world.despawn(id).unwrap();
        assert_eq!(removed.state(), LifecycleState::Removed);
        assert!(!world.spatial().contains(id));
        assert!(!world.nearby(p, 100.0).contains(&id));
        assert!(world.despawn(id).is_none());
        assert!(matches!(
            world.set_fight_prop(id, FightProp::CUR_HP, 1.0),
            Err(WorldError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_move_keeps_index_consistent() {
        let world = world();
        let a = Position::new(0.0, 0.0, 1000.0);
        let b = Position::new(-800.0, 3.0, 20.0);
        let id = world.spawn(monster_at(a)).unwrap();

        world.move_entity(id, b, Some(Position::new(0.0, 90.0, 0.0))).unwrap();
        assert_eq!(world.spatial().position_of(id), Some(b));
        assert_eq!(world.with_entity(id, Entity::position), Some(b));
        assert!(world.nearby(a, 1.0).is_empty());
        assert_eq!(world.nearby(b, 1.0), vec![id]);

        let missing = EntityId::compose(EntityIdType::Monster, 4242);
        assert!(matches!(
            world.move_entity(missing, a, None),
            Err(WorldError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_nearest_and_visible_in() {
        let world = world();
        let near = world.spawn(monster_at(Position::new(1.0, 0.0, 0.0))).unwrap();
        let far = world.spawn(monster_at(Position::new(50.0, 0.0, 0.0))).unwrap();
        let probe = Position::new(2.0, 0.0, 0.0);

        assert_eq!(world.nearest(probe, 1), vec![near]);
        // The level entity sits at the origin but has no client record.
        let infos = world.visible_in(Shape::sphere(Position::ZERO, 100.0));
        let ids: Vec<u32> = infos.iter().map(|i| i.entity_id).collect();
        assert_eq!(infos.len(), 2);
        assert!(ids.contains(&near.id()) && ids.contains(&far.id()));
    }

    #[test]
    fn test_players_join_and_leave() {
        let world = world();
        let uid = PlayerUid(10001);
        let team = world.add_player(uid, SessionId(1)).unwrap();
        assert_eq!(world.team_of(uid), Some(team));
        assert!(
            world
                .with_entity(team, |e| e.abilities().contains("teamAbility"))
                .unwrap()
        );
        assert!(matches!(
            world.add_player(uid, SessionId(2)),
            Err(WorldError::PlayerAlreadyJoined(_))
        ));

        world.spawn(avatar(uid, 1)).unwrap();
        world.spawn(monster_at(Position::ZERO)).unwrap();
        assert_eq!(world.remove_player(uid).unwrap(), 2);
        assert_eq!(world.entity_count(), 2);
        assert!(world.session_of(uid).is_none());
        assert!(matches!(
            world.remove_player(uid),
            Err(WorldError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_sync_sends_nothing_when_clean() {
        let world = world();
        world.add_player(PlayerUid(1), SessionId(1)).unwrap();
        let (transport, mut rx) = ChannelTransport::new();
        assert_eq!(world.sync(&transport), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_sync_routes_entity_and_avatar_deltas() {
        let world = world();
        let alice = PlayerUid(1);
        let bob = PlayerUid(2);
        world.add_player(alice, SessionId(11)).unwrap();
        world.add_player(bob, SessionId(22)).unwrap();
        let monster = world.spawn(monster_at(Position::ZERO)).unwrap();
        let hero = world.spawn(avatar(alice, 0xA1)).unwrap();

        let (transport, mut rx) = ChannelTransport::new();
        // Appear notifies for the two spawns.
        world.sync(&transport);
        let appear = drain(&mut rx);
        assert_eq!(appear.len(), 2);
        assert!(
            appear
                .iter()
                .all(|(_, p)| p.cmd_id == cmd::SCENE_ENTITY_APPEAR_NOTIFY)
        );

        world.set_fight_prop(monster, FightProp(5), 120.0).unwrap();
        world.set_fight_prop(monster, FightProp(9), 0.0).unwrap();
        world.set_fight_prop(hero, FightProp::CUR_HP, 50.0).unwrap();
        assert_eq!(world.sync(&transport), 3);

        let packets = drain(&mut rx);
        let entity_packets: Vec<_> = packets
            .iter()
            .filter(|(_, p)| p.cmd_id == cmd::ENTITY_FIGHT_PROP_UPDATE_NOTIFY)
            .collect();
        assert_eq!(entity_packets.len(), 2);
        let body: EntityFightPropUpdateNotify = decode(&entity_packets[0].1.payload).unwrap();
        assert_eq!(body.entity_id, monster.as_u64());
        assert_eq!(body.fight_prop_map, BTreeMap::from([(5, 120.0), (9, 0.0)]));

        let avatar_packets: Vec<_> = packets
            .iter()
            .filter(|(_, p)| p.cmd_id == cmd::AVATAR_FIGHT_PROP_UPDATE_NOTIFY)
            .collect();
        assert_eq!(avatar_packets.len(), 1);
        assert_eq!(avatar_packets[0].0, SessionId(11));
        let body: AvatarFightPropUpdateNotify = decode(&avatar_packets[0].1.payload).unwrap();
        assert_eq!(body.avatar_guid, 0xA1);

        assert_eq!(world.sync(&transport), 0);
    }

    #[test]
    fn test_despawn_broadcasts_disappear() {
        let world = world();
        world.add_player(PlayerUid(1), SessionId(1)).unwrap();
        let id = world.spawn(monster_at(Position::ZERO)).unwrap();
        let (transport, mut rx) = ChannelTransport::new();
        world.sync(&transport);
        drain(&mut rx);

        world.despawn(id);
        assert_eq!(world.sync(&transport), 1);
        let packets = drain(&mut rx);
        assert_eq!(packets[0].1.cmd_id, cmd::SCENE_ENTITY_DISAPPEAR_NOTIFY);
        let body: SceneEntityDisappearNotify = decode(&packets[0].1.payload).unwrap();
        assert_eq!(body.entity_list, vec![id.id()]);
    }

    #[test]
    fn test_spawn_then_despawn_in_one_pass_is_silent() {
        let world = world();
        world.add_player(PlayerUid(1), SessionId(1)).unwrap();
        let id = world.spawn(monster_at(Position::ZERO)).unwrap();
        world.despawn(id);
        let (transport, mut rx) = ChannelTransport::new();
        assert_eq!(world.sync(&transport), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_snapshot_on_join() {
        let world = world();
        world.spawn(monster_at(Position::ZERO)).unwrap();
        world.add_player(PlayerUid(1), SessionId(1)).unwrap();
        let (transport, mut rx) = ChannelTransport::new();
        assert_eq!(world.send_snapshot(PlayerUid(1), &transport).unwrap(), 1);
        let packets = drain(&mut rx);
        let body: SceneEntityAppearNotify = decode(&packets[0].1.payload).unwrap();
        assert_eq!(body.appear_type, VisionType::Meet);
        assert!(matches!(
            world.send_snapshot(PlayerUid(9), &transport),
            Err(WorldError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_tick_advances_abilities() {
        let world = world();
        world.tick(0.5);
        let t = world
            .with_entity(world.level_entity_id(), |e| {
                e.abilities().get("abilityA").map(|a| a.active_time)
            })
            .flatten()
            .unwrap();
        assert_eq!(t, 0.5);
    }

    #[test]
    fn test_apply_commands() {
        let world = world();
        world
            .apply(WorldCommand::Spawn(Box::new(monster_at(Position::new(
                300.0, 0.0, 0.0,
            )))))
            .unwrap();
        let id = world.nearest(Position::new(301.0, 0.0, 0.0), 1)[0];
        world
            .apply(WorldCommand::Move {
                id,
                position: Position::new(9.0, 0.0, 9.0),
                rotation: None,
            })
            .unwrap();
        world
            .apply(WorldCommand::SetFightProp {
                id,
                prop: FightProp::CUR_HP,
                value: 3.0,
            })
            .unwrap();
        assert_eq!(world.with_entity(id, |e| e.fight_prop(FightProp::CUR_HP)), Some(3.0));
        world.apply(WorldCommand::Despawn(id)).unwrap();
        assert!(!world.contains(id));
    }

    #[test]
    fn test_concurrent_moves_and_queries() {
        let world = Arc::new(world());
        let ids: Vec<EntityId> = (0..20)
            .map(|n| world.spawn(monster_at(Position::new(n as f32, 0.0, 0.0))).unwrap())
            .collect();

        let mover = {
            let world = world.clone();
            let ids = ids.clone();
            std::thread::spawn(move || {
                for step in 0..100 {
                    for (n, id) in ids.iter().enumerate() {
                        let p = Position::new(n as f32, (step % 3) as f32, 0.0);
                        world.move_entity(*id, p, None).unwrap();
                    }
                }
            })
        };
        for _ in 0..100 {
            let found = world.nearby(Position::new(10.0, 0.0, 0.0), 50.0);
            assert!(ids.iter().all(|id| found.contains(id)));
        }
        mover.join().unwrap();
    }
}
