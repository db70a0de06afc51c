//! Shared application state for the web server.

use std::sync::Arc;

use agrisense_config::Config;
use agrisense_db::{seed_demo_data, Database, DbError};
use agrisense_ranker::{FileModelStore, ModelStore, RankerSettings, SuitabilityRanker};
use rand::{rngs::StdRng, SeedableRng};

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub ranker: Arc<SuitabilityRanker>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<Database>, ranker: Arc<SuitabilityRanker>, config: Config) -> Self {
        Self { db, ranker, config: Arc::new(config) }
    }

    /// Build the process-lifetime state: record store (seeded when
    /// configured) and a ranker loaded from the configured model files.
    pub async fn initialise(config: Config) -> Result<Self, DbError> {
        let store: Arc<dyn ModelStore> = Arc::new(FileModelStore::from_config(&config.model));
        Self::initialise_with_store(config, store).await
    }

    pub async fn initialise_with_store(config: Config, store: Arc<dyn ModelStore>) -> Result<Self, DbError> {
        let db = Arc::new(Database::new()?);
        if config.database.seed_demo_data {
            let mut rng = match config.database.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            seed_demo_data(&db, &mut rng).await?;
        }

        let settings = RankerSettings::from(&config.model);
        let ranker = Arc::new(SuitabilityRanker::load(store, settings));
        Ok(Self::new(db, ranker, config))
    }
}

pub type SharedState = Arc<AppState>;
