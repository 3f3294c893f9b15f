//! Recent-ticket listing.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::{base::types::GrievanceTicket, runtime::Runtime};

use super::ApiError;

#[instrument(skip_all)]
pub async fn get_grievances(State(runtime): State<Runtime>) -> Result<Json<Vec<GrievanceTicket>>, ApiError> {
    let tickets = runtime.store.list_recent(runtime.config.listing_limit).await?;

    info!("Found {} grievances.", tickets.len());

    Ok(Json(tickets))
}
