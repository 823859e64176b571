//! The fixed-rate simulation loop for one room's world.
//!
//! The system order inside a tick is fixed: inputs, physics, index rebuild,
//! collision, food, score. Scheduling (when ticks fire) belongs to the room
//! worker; this type only advances the world by one tick at a time.

use rand::Rng;
use tracing::debug;

use crate::game::constants::food::{FOOD_TARGET, RESPAWN_PER_TICK};
use crate::game::events::GameEvent;
use crate::game::input::{InputCommand, InputQueue, InputSender};
use crate::game::performance::{TickMonitor, TickTimer};
use crate::game::spatial::SpatialIndex;
use crate::game::state::{Player, PlayerId, World};
use crate::game::systems::score::LeaderboardEntry;
use crate::game::systems::{collision, food, physics, score};
use crate::game::worm::WormId;

#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// Head-vs-own-body collision; the reference behavior ships with it off
    pub self_collision: bool,
    pub food_target: usize,
    pub respawn_per_tick: usize,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            self_collision: false,
            food_target: FOOD_TARGET,
            respawn_per_tick: RESPAWN_PER_TICK,
        }
    }
}

pub struct GameLoop {
    world: World,
    index: SpatialIndex,
    inputs: InputQueue,
    config: GameLoopConfig,
    monitor: TickMonitor,
    leaderboard: Vec<LeaderboardEntry>,
    last_tick_ms: u64,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig, start_time_ms: u64) -> Self {
        Self {
            world: World::new(start_time_ms),
            index: SpatialIndex::default(),
            inputs: InputQueue::new(),
            config,
            monitor: TickMonitor::new(),
            leaderboard: Vec::new(),
            last_tick_ms: start_time_ms,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn monitor(&self) -> &TickMonitor {
        &self.monitor
    }

    /// Handle for transport contexts to submit raw input payloads
    pub fn input_sender(&self) -> InputSender {
        self.inputs.sender()
    }

    pub fn add_player(&mut self, player: Player) {
        self.inputs.register_player(player.id);
        self.world.add_player(player);
    }

    /// Drop a player, their worm, and any queued input
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<WormId> {
        self.inputs.unregister_player(player_id);
        self.world.remove_player(player_id)
    }

    /// Spawn a worm outside the input path (initial join)
    pub fn spawn_worm_for(
        &mut self,
        player_id: PlayerId,
        name: String,
        skin_id: u8,
    ) -> Option<WormId> {
        let mut rng = rand::thread_rng();
        self.world.spawn_worm(player_id, name, skin_id, &mut rng)
    }

    /// Advance the world by one tick. `now_ms` is wall-clock milliseconds;
    /// dt is derived from the previous tick's timestamp.
    pub fn tick(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut timer = TickTimer::start();
        let dt = now_ms.saturating_sub(self.last_tick_ms) as f32 / 1000.0;
        self.last_tick_ms = now_ms;
        self.world.now_ms = now_ms;

        let mut rng = rand::thread_rng();
        let mut events = Vec::new();

        self.drain_inputs(now_ms, &mut rng, &mut events);
        timer.mark("input");

        events.extend(physics::update(&mut self.world, dt));
        timer.mark("physics");

        self.index.clear_worms();
        for (id, worm) in self.world.worms.iter_mut() {
            if worm.alive {
                self.index.insert_worm_segments(*id, worm.segments());
            }
        }
        timer.mark("index");

        events.extend(collision::resolve(
            &mut self.world,
            &mut self.index,
            self.config.self_collision,
        ));
        timer.mark("collision");

        food::update(
            &mut self.world,
            &mut self.index,
            &mut rng,
            dt,
            self.config.food_target,
            self.config.respawn_per_tick,
        );
        timer.mark("food");

        score::award_kills(&mut self.world, &events);
        self.leaderboard = score::compute_leaderboard(&self.world);
        timer.mark("score");

        self.world.tick += 1;
        self.monitor.record(self.world.tick, &timer.finish());
        events
    }

    fn drain_inputs<R: Rng>(&mut self, now_ms: u64, rng: &mut R, events: &mut Vec<GameEvent>) {
        for (player_id, request) in self.inputs.ingest(now_ms) {
            // Respawn requests bypass the queue; ignore them while the
            // player still pilots a living worm
            let has_living_worm = self
                .world
                .get_player(player_id)
                .and_then(|p| p.worm_id)
                .and_then(|id| self.world.worms.get(&id))
                .is_some_and(|w| w.alive);
            if has_living_worm {
                debug!(player = %player_id, "spawn request ignored, worm still alive");
                continue;
            }
            if let Some(worm_id) =
                self.world
                    .spawn_worm(player_id, request.player_name, request.skin_id, rng)
            {
                events.push(GameEvent::WormSpawned { player_id, worm_id });
            }
        }

        for (player_id, command) in self.inputs.drain() {
            let Some(player) = self.world.players.get_mut(&player_id) else {
                continue;
            };
            player.last_input_ms = now_ms;
            let Some(worm_id) = player.worm_id else {
                continue;
            };
            let Some(worm) = self.world.worms.get_mut(&worm_id) else {
                continue;
            };
            if !worm.alive {
                continue;
            }
            match command {
                InputCommand::DirectionChange { direction } => {
                    worm.set_target_direction(direction)
                }
                InputCommand::Boost { is_boosting } => worm.set_boosting(is_boosting),
            }
        }
    }
}
