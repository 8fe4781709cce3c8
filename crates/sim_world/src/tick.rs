//! Fixed-timestep tick loop.
//!
//! Each tick:
//!
//! 1. Apply the [`WorldCommand`]s queued since the previous tick.
//! 2. Advance every entity (`World::tick`).
//! 3. Run the sync pass, pushing deltas to the transport.
//! 4. Advance the tick counter.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sim_net::Transport;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::WorldCommand;
use crate::world::World;

const DEFAULT_TICK_DURATION: Duration = Duration::from_millis(50);

/// Drives one world.
pub struct TickLoop {
    tick_id: u64,
    world: Arc<World>,
    transport: Arc<dyn Transport>,
    commands_tx: mpsc::UnboundedSender<WorldCommand>,
    commands_rx: mpsc::UnboundedReceiver<WorldCommand>,
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_id", &self.tick_id)
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

impl TickLoop {
    #[must_use]
    pub fn new(world: Arc<World>, transport: Arc<dyn Transport>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            tick_id: 0,
            world,
            transport,
            commands_tx,
            commands_rx,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// A handle other threads use to queue commands for the next tick.
    #[must_use]
    pub fn commands(&self) -> mpsc::UnboundedSender<WorldCommand> {
        self.commands_tx.clone()
    }

    /// Run one tick of `dt` seconds. Returns the number of packets sent.
    pub fn tick(&mut self, dt: f64) -> usize {
        let mut applied = 0usize;
        while let Ok(command) = self.commands_rx.try_recv() {
            if let Err(e) = self.world.apply(command) {
                warn!(tick_id = self.tick_id, error = %e, "command rejected");
            }
            applied += 1;
        }

        self.world.tick(dt as f32);
        let sent = self.world.sync(self.transport.as_ref());
        self.tick_id += 1;

        debug!(
            tick_id = self.tick_id,
            dt,
            commands = applied,
            packets = sent,
            "tick complete"
        );
        sent
    }

    fn tick_duration(&self) -> Duration {
        // `World::new` validated the config, so the fallback is never taken.
        self.world
            .config()
            .tick_duration()
            .unwrap_or(DEFAULT_TICK_DURATION)
    }

    fn done(&self) -> bool {
        let max_ticks = self.world.config().max_ticks;
        max_ticks > 0 && self.tick_id >= max_ticks
    }

    /// Blocking loop at the configured rate until `max_ticks` is reached (or
    /// forever when it is 0).
    pub fn run(&mut self) {
        let tick_duration = self.tick_duration();
        info!(
            tick_rate = self.world.config().tick_rate,
            max_ticks = self.world.config().max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();
            self.tick(tick_duration.as_secs_f64());

            if self.done() {
                info!(ticks = self.tick_id, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }

    /// Async loop on a Tokio interval. Stops at `max_ticks` or when
    /// `shutdown` resolves, whichever comes first.
    pub async fn run_async(&mut self, shutdown: impl Future<Output = ()>) {
        let tick_duration = self.tick_duration();
        let mut interval = tokio::time::interval(tick_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            tick_rate = self.world.config().tick_rate,
            max_ticks = self.world.config().max_ticks,
            "starting async tick loop"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(ticks = self.tick_id, "shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    let start = Instant::now();
                    self.tick(tick_duration.as_secs_f64());
                    let elapsed = start.elapsed();
                    if elapsed > tick_duration {
                        warn!(
                            tick_id = self.tick_id,
                            elapsed_ms = elapsed.as_millis() as u64,
                            budget_ms = tick_duration.as_millis() as u64,
                            "tick exceeded time budget"
                        );
                    }
                    if self.done() {
                        info!(ticks = self.tick_id, "tick loop complete");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sim_data::GameData;
    use sim_entity::{Entity, EntityKind, FightProp, PlayerUid};
    use sim_math::Position;
    use sim_net::{ChannelTransport, SessionId};

    use super::*;
    use crate::config::WorldConfig;

    fn tick_loop(config: WorldConfig) -> (TickLoop, mpsc::UnboundedReceiver<(SessionId, sim_net::Packet)>) {
        let world = Arc::new(World::new(config, Arc::new(GameData::default())).unwrap());
        let (transport, rx) = ChannelTransport::new();
        (TickLoop::new(world, Arc::new(transport)), rx)
    }

    #[test]
    fn test_tick_advances_counter() {
        let (mut tick_loop, _rx) = tick_loop(WorldConfig::default());
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(0.05);
        tick_loop.tick(0.05);
        assert_eq!(tick_loop.tick_id(), 2);
    }

    #[test]
    fn test_commands_apply_on_next_tick() {
        let (mut tick_loop, mut rx) = tick_loop(WorldConfig::default());
        let commands = tick_loop.commands();
        commands
            .send(WorldCommand::PlayerJoin {
                uid: PlayerUid(1),
                session: SessionId(1),
            })
            .unwrap();
        commands
            .send(WorldCommand::Spawn(Box::new(Entity::new(
                EntityKind::Monster {
                    monster_id: 1,
                    level: 1,
                },
                Position::new(10.0, 0.0, 10.0),
                Position::ZERO,
            ))))
            .unwrap();
        assert_eq!(tick_loop.world().player_count(), 0);

        // Appear notify for the monster.
        assert_eq!(tick_loop.tick(0.05), 1);
        assert_eq!(tick_loop.world().player_count(), 1);
        let monster = tick_loop.world().nearby(Position::new(10.0, 0.0, 10.0), 0.0)[0];
        assert!(rx.try_recv().is_ok());

        commands
            .send(WorldCommand::SetFightProp {
                id: monster,
                prop: FightProp::CUR_HP,
                value: 5.0,
            })
            .unwrap();
        assert_eq!(tick_loop.tick(0.05), 1);
    }

    #[test]
    fn test_rejected_command_does_not_stop_tick() {
        let (mut tick_loop, _rx) = tick_loop(WorldConfig::default());
        tick_loop
            .commands()
            .send(WorldCommand::PlayerLeave(PlayerUid(404)))
            .unwrap();
        tick_loop.tick(0.05);
        assert_eq!(tick_loop.tick_id(), 1);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = WorldConfig::default().with_tick_rate(1000.0).with_max_ticks(5);
        let (mut tick_loop, _rx) = tick_loop(config);
        tick_loop.run();
        assert_eq!(tick_loop.tick_id(), 5);
    }

    #[tokio::test]
    async fn test_run_async_limited_ticks() {
        let config = WorldConfig::default().with_tick_rate(1000.0).with_max_ticks(3);
        let (mut tick_loop, _rx) = tick_loop(config);
        tick_loop.run_async(std::future::pending()).await;
        assert_eq!(tick_loop.tick_id(), 3);
    }

    #[tokio::test]
    async fn test_run_async_stops_on_shutdown() {
        let (mut tick_loop, _rx) = tick_loop(WorldConfig::default());
        tick_loop.run_async(async {}).await;
        assert_eq!(tick_loop.tick_id(), 0);
    }
}
