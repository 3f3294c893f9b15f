//! SurrealDB implementation of the ticket store.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
    sql::{Datetime, Thing},
};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{AudioReport, CreatedTicket, GeoPoint, GrievanceTicket, ImageReport, NewTicket, Res, TicketStatus},
};

use super::{GenericTicketStore, TicketStore};

const TABLE: &str = "grievance";

// Extra methods on `TicketStore` applied by the surreal implementation.

impl TicketStore {
    pub async fn surreal(config: &Config) -> Res<Self> {
        let store = SurrealTicketStore::new(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// In-memory store, used by tests and local runs.
    pub async fn surreal_memory() -> Res<Self> {
        let store = SurrealTicketStore::memory().await?;
        Ok(Self::new(Arc::new(store)))
    }
}

// Record types.

/// A ticket as stored: native record id and native datetime.
#[derive(Debug, Serialize, Deserialize)]
struct TicketRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    timestamp: Datetime,
    status: TicketStatus,
    location: GeoPoint,
    image: ImageReport,
    audio: AudioReport,
    text_description: String,
}

impl TicketRecord {
    /// Unpack the store-native id and datetime into transport form.
    fn into_ticket(self) -> GrievanceTicket {
        GrievanceTicket {
            id: self.id.map(|thing| thing.id.to_raw()).unwrap_or_default(),
            timestamp: DateTime::<Utc>::from(self.timestamp).to_rfc3339(),
            status: self.status,
            location: self.location,
            image: self.image,
            audio: self.audio,
            text_description: self.text_description,
        }
    }
}

// Specific implementations.

/// SurrealDB ticket store.
#[derive(Clone)]
pub struct SurrealTicketStore {
    db: Surreal<Any>,
}

impl SurrealTicketStore {
    /// Connect to the configured endpoint and prepare the schema.
    #[instrument(skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        let endpoint = match config.db_endpoint.as_str() {
            "memory" => "mem://",
            other => other,
        };

        let db = connect(endpoint).await?;

        // Root signin only applies to remote endpoints.
        if endpoint.starts_with("ws") || endpoint.starts_with("http") {
            db.signin(Root {
                username: &config.db_username,
                password: &config.db_password,
            })
            .await?;
        }

        Self::init(db).await
    }

    /// Create a store on a fresh in-memory engine.
    pub async fn memory() -> Res<Self> {
        let db = connect("mem://").await?;

        Self::init(db).await
    }

    async fn init(db: Surreal<Any>) -> Res<Self> {
        db.use_ns("grievance").use_db("triage").await?;

        db.query("DEFINE TABLE IF NOT EXISTS grievance SCHEMALESS").await?;

        info!("Ticket store initialized successfully.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericTicketStore for SurrealTicketStore {
    #[instrument(skip_all)]
    async fn create_ticket(&self, ticket: &NewTicket) -> Res<CreatedTicket> {
        let record = TicketRecord {
            id: None,
            timestamp: Utc::now().into(),
            status: TicketStatus::New,
            location: ticket.location,
            image: ticket.image.clone(),
            audio: ticket.audio.clone(),
            text_description: ticket.text_description.clone(),
        };

        let created: Option<TicketRecord> = self.db.create(TABLE).content(record).await?;
        let created = created.ok_or_else(|| anyhow!("Store returned no record for the created ticket."))?;

        let id = created.id.as_ref().map(|thing| thing.id.to_raw()).unwrap_or_default();

        info!("Created grievance ticket `{id}`.");

        Ok(CreatedTicket {
            id,
            timestamp: created.timestamp.into(),
        })
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, limit: usize) -> Res<Vec<GrievanceTicket>> {
        let mut response = self
            .db
            .query("SELECT * FROM grievance ORDER BY timestamp DESC, id DESC LIMIT $limit")
            .bind(("limit", limit as i64))
            .await?;

        let records: Vec<TicketRecord> = response.take(0)?;

        Ok(records.into_iter().map(TicketRecord::into_ticket).collect())
    }
}
