use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{IdGenerator, ReviewStore, SqliteReviewStore},
    ranking::RankingEngine,
    services::{DirectoryService, ReviewService},
    votes::VoteLedger,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReviewStore>,
    pub ranking: RankingEngine,
    pub votes: VoteLedger,
    pub reviews: ReviewService,
    pub directory: DirectoryService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        if let Some(dir) = config.database_dir() {
            std::fs::create_dir_all(&dir)?;
        }
        let store = SqliteReviewStore::connect(&config.database.url, config.database.max_connections).await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wire every service over an already-open store
    pub fn with_store(config: Config, store: Arc<dyn ReviewStore>) -> Self {
        let ids = Arc::new(IdGenerator::new(config.server.node_id));
        Self {
            ranking: RankingEngine::new(store.clone()),
            votes: VoteLedger::new(store.clone()),
            reviews: ReviewService::new(store.clone(), ids.clone()),
            directory: DirectoryService::new(store.clone(), ids),
            store,
            config,
        }
    }
}
