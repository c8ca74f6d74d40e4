use std::sync::Arc;

use admitnote_core::config::{AiConfig, AppConfig};
use admitnote_core::types::ClinicalData;
use admitnote_engine::error::ParseError;
use admitnote_engine::orchestrator::{Orchestrator, ParseInput};
use admitnote_engine::traits::{AiTransport, AlwaysOnline, ConnectivityProbe, ParseObserver};

use crate::config_store::ConfigStore;
use crate::connectivity::{REFRESH_INTERVAL, TcpConnectivityProbe};
use crate::secrets::{ApiKeySource, KeyringApiKey};
use crate::transport::GeminiTransport;

/// Glue between persisted settings and the orchestrator.
///
/// Configuration and the API key are read at the start of every `parse()`,
/// so edits made between calls take effect without a restart.
pub struct AdmitNoteService {
    store: ConfigStore,
    keys: Arc<dyn ApiKeySource>,
    orchestrator: Orchestrator,
}

impl AdmitNoteService {
    pub fn new(
        store: ConfigStore,
        keys: Arc<dyn ApiKeySource>,
        transport: Arc<dyn AiTransport>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            store,
            keys,
            orchestrator: Orchestrator::new(transport, connectivity),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn load_ai_config(&self) -> anyhow::Result<AiConfig> {
        let app = self.store.load_or_default()?;
        let key = match self.keys.api_key() {
            Ok(k) => k.unwrap_or_default(),
            Err(e) => {
                // A broken keyring behaves like a missing key.
                log::warn!("api key lookup failed: {e:#}");
                String::new()
            }
        };
        Ok(AiConfig::from_app_config(&app, key))
    }

    /// `ParseError` failures are returned inside the error and can be
    /// recovered with `downcast_ref`.
    pub async fn parse(
        &self,
        input: &ParseInput,
        observer: &dyn ParseObserver,
    ) -> anyhow::Result<ClinicalData> {
        let cfg = self.load_ai_config()?;
        self.parse_with_config(&cfg, input, observer).await
    }

    /// Skips the config read; for callers that adjust the snapshot first.
    pub async fn parse_with_config(
        &self,
        cfg: &AiConfig,
        input: &ParseInput,
        observer: &dyn ParseObserver,
    ) -> anyhow::Result<ClinicalData> {
        log::debug!("parse with {cfg:?}");
        let data: Result<ClinicalData, ParseError> =
            self.orchestrator.parse_with_observer(cfg, input, observer).await;
        Ok(data?)
    }
}

/// Production wiring: keyring, HTTPS transport, TCP connectivity check against the configured host.
///
/// Call from inside a tokio runtime; the check refreshes on a background task.
pub fn build_service_from_config(
    store: ConfigStore,
    skip_connectivity_check: bool,
) -> anyhow::Result<AdmitNoteService> {
    let app: AppConfig = store.load_or_default()?;

    let connectivity: Arc<dyn ConnectivityProbe> = if skip_connectivity_check {
        Arc::new(AlwaysOnline)
    } else {
        let online = TcpConnectivityProbe::for_base_url(&app.base_url)?;
        Arc::new(online.spawn_refresher(REFRESH_INTERVAL)?)
    };

    Ok(AdmitNoteService::new(
        store,
        Arc::new(KeyringApiKey),
        Arc::new(GeminiTransport::new()),
        connectivity,
    ))
}
