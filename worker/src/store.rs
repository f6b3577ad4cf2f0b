use kvsweep_core::{GameStatus, GridState};
use serde_json::Value;

use crate::*;

/// Key of the newest-first list of recent games.
pub const GAMES_KEY: &str = "games";

/// Number of games kept in the recent games index.
pub const RECENT_CAPACITY: usize = 50;

pub fn game_key(id: &str) -> String {
    format!("game:{id}")
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

/// Game records over a [`KvStore`]: one keyed entry per game plus the
/// bounded recent games index.
///
/// The keyed write and the index write are separate backend calls; a failure
/// between them leaves the two views diverged. [`GameStore::get`] falls back
/// to the index, so reads by id recover from a lost keyed entry.
#[derive(Debug)]
pub struct GameStore<K, C = SystemClock> {
    kv: K,
    clock: C,
    capacity: usize,
}

impl<K: KvStore> GameStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_clock(kv, SystemClock)
    }
}

impl<K: KvStore, C: Clock> GameStore<K, C> {
    pub fn with_clock(kv: K, clock: C) -> Self {
        Self {
            kv,
            clock,
            capacity: RECENT_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Stores a fresh ongoing game and puts it at the head of the index.
    ///
    /// Ids are the creation time in milliseconds, moved forward past ids
    /// already taken.
    pub async fn create(&self, state: GridState) -> Result<GameRecord> {
        let timestamp = self.clock.now_millis();
        let mut stamp = timestamp;
        while self.kv.exists(&game_key(&stamp.to_string())).await? {
            stamp += 1;
        }

        let record = GameRecord {
            id: stamp.to_string(),
            state,
            status: GameStatus::Ongoing,
            timestamp,
        };
        let value = record.encode()?;
        self.kv.set(&game_key(&record.id), value.clone()).await?;

        let mut index = self.load_index().await?;
        index.insert(0, value);
        index.truncate(self.capacity);
        self.kv.set(GAMES_KEY, Value::Array(index)).await?;

        log::debug!("stored game {}", record.id);
        Ok(record)
    }

    /// Looks a game up by id, restoring its keyed entry from the index when
    /// only the index still has it.
    pub async fn get(&self, id: &str) -> Result<Option<GameRecord>> {
        let key = game_key(id);
        if let Some(value) = self.kv.get(&key).await? {
            return GameRecord::decode(value).map(Some);
        }

        let index = self.load_index().await?;
        let Some(value) = index.into_iter().find(|entry| entry_id(entry) == Some(id)) else {
            return Ok(None);
        };
        let record = GameRecord::decode(value.clone())?;
        log::info!("restoring game {id} from the recent games index");
        self.kv.set(&key, value).await?;
        Ok(Some(record))
    }

    /// Replaces the state and status of an existing game, keeping its id and
    /// timestamp. The index entry is replaced in place when still present.
    pub async fn update(&self, id: &str, state: GridState, status: GameStatus) -> Result<GameRecord> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_owned()))?;

        let record = GameRecord {
            state,
            status,
            ..existing
        };
        let value = record.encode()?;
        self.kv.set(&game_key(id), value.clone()).await?;

        let mut index = self.load_index().await?;
        match index.iter().position(|entry| entry_id(entry) == Some(id)) {
            Some(position) => {
                index[position] = value;
                self.kv.set(GAMES_KEY, Value::Array(index)).await?;
            }
            None => log::debug!("game {id} is no longer in the recent games index"),
        }

        Ok(record)
    }

    /// The `n` newest games, newest first.
    pub async fn list_recent(&self, n: usize) -> Result<Vec<GameRecord>> {
        self.load_index()
            .await?
            .into_iter()
            .take(n)
            .map(GameRecord::decode)
            .collect()
    }

    async fn load_index(&self) -> Result<Vec<Value>> {
        Ok(match self.kv.get(GAMES_KEY).await? {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                log::warn!("recent games index is not a list, treating it as empty");
                Vec::new()
            }
            None => Vec::new(),
        })
    }
}
