use kvsweep_core::{BoardConfig, BoardGenerator, Coord2, GameStatus, GridState, checked_coords};

use crate::*;

/// Applies new-game and move requests against stored games.
///
/// Every move is a read-modify-write of one record with no lock around it:
/// two moves racing on the same game both start from the same stored state
/// and the later write wins.
#[derive(Debug)]
pub struct SessionService<K, G, C = SystemClock> {
    store: GameStore<K, C>,
    generator: G,
    config: ServiceConfig,
}

impl<K: KvStore, G: BoardGenerator, C: Clock> SessionService<K, G, C> {
    pub fn new(store: GameStore<K, C>, generator: G, config: ServiceConfig) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    pub fn store(&self) -> &GameStore<K, C> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Generates and stores a new game. Missing parameters use the configured
    /// defaults, all of them are clamped to a playable board.
    pub async fn new_game(
        &self,
        width: Option<i64>,
        height: Option<i64>,
        mines: Option<i64>,
    ) -> Result<GameRecord> {
        let config = BoardConfig::clamped(
            width.unwrap_or(self.config.default_width),
            height.unwrap_or(self.config.default_height),
            mines.unwrap_or(self.config.default_mines),
        );
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let board = self.generator.generate(config, seed)?;

        let record = self.store.create(GridState::new(board)).await?;
        log::info!(
            "new game {} ({}x{}, {} mines)",
            record.id,
            config.size.0,
            config.size.1,
            config.mines
        );
        Ok(record)
    }

    pub async fn game(&self, id: &str) -> Result<GameRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_owned()))
    }

    /// Most recent games, newest first.
    pub async fn history(&self) -> Result<Vec<GameRecord>> {
        self.store.list_recent(self.config.history_len).await
    }

    pub async fn apply_reveal(&self, id: &str, x: i64, y: i64) -> Result<GameRecord> {
        self.apply_move(id, x, y, |state, coords| {
            let outcome = state.reveal(coords)?;
            Ok((outcome.has_update(), outcome.status()))
        })
        .await
    }

    pub async fn apply_flag(&self, id: &str, x: i64, y: i64) -> Result<GameRecord> {
        self.apply_move(id, x, y, |state, coords| {
            let outcome = state.toggle_flag(coords)?;
            Ok((outcome.has_update(), GameStatus::Ongoing))
        })
        .await
    }

    async fn apply_move(
        &self,
        id: &str,
        x: i64,
        y: i64,
        apply: impl FnOnce(&mut GridState, Coord2) -> kvsweep_core::Result<(bool, GameStatus)>,
    ) -> Result<GameRecord> {
        let record = self.game(id).await?;
        if record.status.is_finished() {
            return Err(ServiceError::GameFinished {
                status: record.status,
                state: Box::new(state_view(&record.state)),
            });
        }
        let coords =
            checked_coords(x, y, record.state.size()).ok_or(ServiceError::InvalidPosition { x, y })?;

        let mut state = record.state.clone();
        let (changed, status) = apply(&mut state, coords)?;
        if !changed {
            log::debug!("game {id}: move at {coords:?} changed nothing");
            return Ok(record);
        }

        log::debug!("game {id}: move at {coords:?}, now {status}");
        self.store.update(id, state, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvsweep_core::{PresetBoardGenerator, RandomBoardGenerator, iter_coords};
    use serde_json::Value;

    type Service<K = MemoryKv, G = PresetBoardGenerator> = SessionService<K, G, StepClock>;

    fn service_with<K: KvStore>(kv: K, mines: Vec<Coord2>) -> Service<K> {
        SessionService::new(
            GameStore::with_clock(kv, StepClock::starting_at(1)),
            PresetBoardGenerator::new(mines),
            ServiceConfig::default(),
        )
    }

    fn service(mines: Vec<Coord2>) -> Service {
        service_with(MemoryKv::new(), mines)
    }

    /// Backend that hands control back to the scheduler before every call,
    /// letting concurrent requests interleave.
    struct YieldingKv(MemoryKv);

    impl KvStore for YieldingKv {
        async fn get(&self, key: &str) -> std::result::Result<Option<Value>, StoreError> {
            tokio::task::yield_now().await;
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> std::result::Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.set(key, value).await
        }

        async fn exists(&self, key: &str) -> std::result::Result<bool, StoreError> {
            tokio::task::yield_now().await;
            self.0.exists(key).await
        }
    }

    #[tokio::test]
    async fn new_game_uses_defaults() {
        let service = SessionService::new(
            GameStore::with_clock(MemoryKv::new(), StepClock::starting_at(1)),
            RandomBoardGenerator::default(),
            ServiceConfig::default(),
        );

        let record = service.new_game(None, None, None).await.unwrap();

        assert_eq!(record.state.size(), (10, 10));
        assert_eq!(record.state.board().mine_count(), 10);
        assert_eq!(record.status, GameStatus::Ongoing);
        assert!(record.state.revealed().iter().all(|&revealed| !revealed));
        assert!(record.state.flags().iter().all(|&flag| !flag));
        assert_eq!(service.game(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn new_game_clamps_parameters() {
        let service = SessionService::new(
            GameStore::with_clock(MemoryKv::new(), StepClock::starting_at(1)),
            RandomBoardGenerator::default(),
            ServiceConfig::default(),
        );

        let record = service.new_game(Some(2), Some(99), Some(5000)).await.unwrap();

        assert_eq!(record.state.size(), (5, 30));
        assert_eq!(record.state.board().mine_count(), 149);
    }

    #[tokio::test]
    async fn configured_seed_repeats_boards() {
        let config = ServiceConfig {
            seed: Some(7),
            ..ServiceConfig::default()
        };
        let service = SessionService::new(
            GameStore::with_clock(MemoryKv::new(), StepClock::starting_at(1)),
            RandomBoardGenerator::default(),
            config,
        );

        let first = service.new_game(None, None, None).await.unwrap();
        let second = service.new_game(None, None, None).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.state.board(), second.state.board());
    }

    #[tokio::test]
    async fn sparse_board_is_won_by_one_reveal() {
        let service = service(vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();

        let record = service.apply_reveal(&game.id, 4, 4).await.unwrap();

        assert_eq!(record.status, GameStatus::Won);
        for pos in iter_coords((5, 5)) {
            assert_eq!(record.state.is_revealed(pos), pos != (0, 0), "at {pos:?}");
        }
        assert_eq!(service.game(&game.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn hitting_a_mine_loses_and_discloses_mines() {
        let service = service(vec![(0, 0), (4, 4), (2, 3)]);
        let game = service.new_game(Some(5), Some(5), Some(3)).await.unwrap();
        service.apply_flag(&game.id, 4, 4).await.unwrap();

        let record = service.apply_reveal(&game.id, 2, 3).await.unwrap();

        assert_eq!(record.status, GameStatus::Lost);
        for &mine in record.state.board().mines() {
            assert!(record.state.is_revealed(mine));
        }
        assert!(record.state.is_flagged((4, 4)));
    }

    #[tokio::test]
    async fn finished_games_reject_moves() {
        let service = service(vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();
        service.apply_reveal(&game.id, 0, 0).await.unwrap();
        let stored = service.game(&game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Lost);

        let reveal = service.apply_reveal(&game.id, 3, 3).await.unwrap_err();
        let flag = service.apply_flag(&game.id, 3, 3).await.unwrap_err();

        assert!(matches!(
            reveal,
            ServiceError::GameFinished {
                status: GameStatus::Lost,
                ..
            }
        ));
        assert!(matches!(
            flag,
            ServiceError::GameFinished {
                status: GameStatus::Lost,
                ..
            }
        ));
        assert_eq!(reveal.kind(), ErrorKind::State);
        assert_eq!(reveal.to_body().state, Some(state_view(&stored.state)));
        assert_eq!(service.game(&game.id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn won_games_reject_moves() {
        let service = service(vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();
        service.apply_reveal(&game.id, 4, 4).await.unwrap();
        let stored = service.game(&game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Won);

        let reveal = service.apply_reveal(&game.id, 0, 0).await.unwrap_err();
        let flag = service.apply_flag(&game.id, 0, 0).await.unwrap_err();

        for err in [&reveal, &flag] {
            assert!(matches!(
                err,
                ServiceError::GameFinished {
                    status: GameStatus::Won,
                    ..
                }
            ));
        }
        let body = reveal.to_body();
        assert_eq!(body.status, Some(kvsweep_protocol::Status::Won));
        assert_eq!(body.state, Some(state_view(&stored.state)));
        assert_eq!(service.game(&game.id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let service = service(vec![(0, 0)]);

        let err = service.apply_reveal("missing", 0, 0).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.to_body().error, "Game not found");
    }

    #[tokio::test]
    async fn bounds_come_from_the_stored_board() {
        let service = service(vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();

        // inside the 10x10 default, outside this board
        for (x, y) in [(7, 2), (2, 5), (-1, 0)] {
            let err = service.apply_flag(&game.id, x, y).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidPosition { .. }), "{x},{y}");
        }
        assert_eq!(service.game(&game.id).await.unwrap(), game);
    }

    #[tokio::test]
    async fn flag_toggles_back_and_blocks_reveal() {
        let service = service(vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();

        let flagged = service.apply_flag(&game.id, 2, 2).await.unwrap();
        assert!(flagged.state.is_flagged((2, 2)));

        let blocked = service.apply_reveal(&game.id, 2, 2).await.unwrap();
        assert!(!blocked.state.is_revealed((2, 2)));
        assert_eq!(blocked.status, GameStatus::Ongoing);

        let unflagged = service.apply_flag(&game.id, 2, 2).await.unwrap();
        assert!(!unflagged.state.is_flagged((2, 2)));
        assert_eq!(unflagged.state, game.state);
    }

    #[tokio::test]
    async fn history_lists_latest_games() {
        let service = service(vec![(0, 0)]);
        let mut ids = Vec::new();
        for _ in 0..8 {
            ids.push(service.new_game(None, None, None).await.unwrap().id);
        }

        let history: Vec<_> = service
            .history()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(history, ["8", "7", "6", "5", "4"]);
        assert_eq!(ids.last().map(String::as_str), Some("8"));
    }

    /// Moves on one game are not serialized: both requests below read the
    /// same stored state and the second write discards the first flag.
    #[tokio::test]
    async fn concurrent_moves_on_one_game_lose_an_update() {
        let service = service_with(YieldingKv(MemoryKv::new()), vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();

        let (first, second) = tokio::join!(
            service.apply_flag(&game.id, 1, 1),
            service.apply_flag(&game.id, 3, 3),
        );
        let first = first.unwrap();
        let second = second.unwrap();

        // each request saw only its own flag
        assert!(first.state.is_flagged((1, 1)) && !first.state.is_flagged((3, 3)));
        assert!(second.state.is_flagged((3, 3)) && !second.state.is_flagged((1, 1)));

        let stored = service.game(&game.id).await.unwrap();
        let flags = [stored.state.is_flagged((1, 1)), stored.state.is_flagged((3, 3))];
        assert_eq!(flags.iter().filter(|&&flag| flag).count(), 1);
    }

    #[tokio::test]
    async fn sequential_moves_keep_every_update() {
        let service = service_with(YieldingKv(MemoryKv::new()), vec![(0, 0)]);
        let game = service.new_game(Some(5), Some(5), Some(1)).await.unwrap();

        service.apply_flag(&game.id, 1, 1).await.unwrap();
        service.apply_flag(&game.id, 3, 3).await.unwrap();

        let stored = service.game(&game.id).await.unwrap();
        assert!(stored.state.is_flagged((1, 1)) && stored.state.is_flagged((3, 3)));
    }
}
