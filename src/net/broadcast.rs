//! Per-client delta broadcaster.
//!
//! Caches one structured snapshot per player (bounded, LRU-evicted) and
//! decides per broadcast whether the client gets a full snapshot (first
//! contact and periodic resync) or a field-level delta. The cache is
//! advanced with the same `apply` the client uses, so both sides agree on
//! the base of the next diff.

use std::collections::HashMap;

use crate::game::constants::net::{MAX_CACHED_SNAPSHOTS, RESYNC_INTERVAL};
use crate::game::state::PlayerId;
use crate::net::delta;
use crate::net::protocol::{GameSnapshot, ServerEvent};

struct CacheEntry {
    snapshot: GameSnapshot,
    broadcasts_since_full: u32,
    last_used: u64,
}

pub struct Broadcaster {
    entries: HashMap<PlayerId, CacheEntry>,
    /// Monotonic access stamp for LRU eviction
    clock: u64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            clock: 0,
        }
    }

    /// Decide what one client receives this broadcast. `None` means the
    /// client's view is already current and nothing is sent.
    pub fn prepare(&mut self, player_id: PlayerId, current: GameSnapshot) -> Option<ServerEvent> {
        self.clock += 1;
        let clock = self.clock;

        match self.entries.get_mut(&player_id) {
            None => {
                self.insert_with_eviction(
                    player_id,
                    CacheEntry {
                        snapshot: current.clone(),
                        broadcasts_since_full: 0,
                        last_used: clock,
                    },
                );
                Some(ServerEvent::GameState(current))
            }
            Some(entry) => {
                entry.last_used = clock;
                entry.broadcasts_since_full += 1;

                if entry.broadcasts_since_full >= RESYNC_INTERVAL {
                    entry.broadcasts_since_full = 0;
                    entry.snapshot = current.clone();
                    return Some(ServerEvent::GameState(current));
                }

                match delta::diff(&entry.snapshot, &current) {
                    Some(update) => {
                        entry.snapshot = delta::apply(&entry.snapshot, &update);
                        Some(ServerEvent::DeltaUpdate(update))
                    }
                    None => None,
                }
            }
        }
    }

    /// Drop a client's cached state (disconnect)
    pub fn remove_client(&mut self, player_id: PlayerId) {
        self.entries.remove(&player_id);
    }

    pub fn cached_clients(&self) -> usize {
        self.entries.len()
    }

    fn insert_with_eviction(&mut self, player_id: PlayerId, entry: CacheEntry) {
        if self.entries.len() >= MAX_CACHED_SNAPSHOTS {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(player_id, entry);
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
