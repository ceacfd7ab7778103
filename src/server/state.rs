use axum::extract::FromRef;

use crate::artifact_store::ArtifactStore;
use crate::converter::Converter;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub converter: Converter,
    pub artifact_store: ArtifactStore,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for Converter {
    fn from_ref(input: &ServerState) -> Self {
        input.converter.clone()
    }
}

impl FromRef<ServerState> for ArtifactStore {
    fn from_ref(input: &ServerState) -> Self {
        input.artifact_store.clone()
    }
}
