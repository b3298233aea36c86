//! Application state

use std::sync::Arc;

use visage_core::{ArtifactStore, CommandVerifier, FaceVerifier, GatewayDb};

use crate::config::ServerConfig;
use crate::error::ServerResult;

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub db: GatewayDb,
    pub artifacts: ArtifactStore,
    pub verifier: Arc<dyn FaceVerifier>,
}

impl AppState {
    /// Open the gateway database and wire up the external comparator.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let db = GatewayDb::open(&config.database_path).await?;
        let artifacts = ArtifactStore::new(&config.media_dir);
        let verifier = Arc::new(
            CommandVerifier::new(&config.comparator_command)
                .with_detector_backend(config.detector_backend.clone())
                .with_timeout(config.verify_timeout),
        );

        Ok(Self {
            config,
            db,
            artifacts,
            verifier,
        })
    }

    /// State with a caller-supplied verifier (tests, alternative backends).
    pub fn with_verifier(
        config: ServerConfig,
        db: GatewayDb,
        verifier: Arc<dyn FaceVerifier>,
    ) -> Self {
        let artifacts = ArtifactStore::new(&config.media_dir);
        Self {
            config,
            db,
            artifacts,
            verifier,
        }
    }
}
