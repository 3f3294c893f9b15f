//! Runtime services and shared state for the grievance-triage service.

use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    handler,
    service::{auth::TokenSource, classifier::Classifier, db::TicketStore, storage::Signer, transcriber::Transcriber},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the long-lived service clients and configuration. Each
/// client is constructed once here and reused by every request; they are all
/// trivially cloneable, so the runtime can be handed to the router as state
/// without any `Arc` or `Mutex` of its own.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The ticket store instance.
    pub store: TicketStore,
    /// The image classifier instance.
    pub classifier: Classifier,
    /// The speech transcriber instance.
    pub transcriber: Transcriber,
    /// The upload-URL signer instance.
    pub signer: Signer,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the ticket store.
        let store = TicketStore::surreal(&config).await?;

        // One token source serves both Google-facing clients.
        let token = TokenSource::from_config(&config);

        // Initialize the signer.
        let signer = Signer::gcs(&config, token.clone());

        // Initialize the classifier; it signs read URLs for the images it inspects.
        let classifier = Classifier::openai(&config, signer.clone());

        // Initialize the transcriber.
        let transcriber = Transcriber::speech(&config, token);

        Ok(Self {
            config,
            store,
            classifier,
            transcriber,
            signer,
        })
    }

    /// Serve the HTTP API until the process is stopped.
    pub async fn start(&self) -> Void {
        let app = handler::router(self.clone());

        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!("Listening on {} ...", self.config.listen_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
