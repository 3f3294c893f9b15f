//! Grievance ticket persistence.
//!
//! The store assigns ids and creation timestamps itself; callers hand it the
//! ticket content and get the assignment back. Tickets are immutable once
//! created, and the only read path is the time-ordered listing.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{CreatedTicket, GrievanceTicket, NewTicket, Res};

pub mod surreal;

// Traits.

/// Generic ticket store trait that clients must implement.
#[async_trait]
pub trait GenericTicketStore: Send + Sync + 'static {
    /// Persist a new ticket, assigning `status = new`, a unique id, and the
    /// server-side creation timestamp.
    ///
    /// Ticket content is never rejected on semantic grounds; only structural
    /// or connectivity failures propagate.
    async fn create_ticket(&self, ticket: &NewTicket) -> Res<CreatedTicket>;

    /// Fetch up to `limit` tickets, newest first, computed fresh per call.
    ///
    /// Ordering is by timestamp descending with the record id descending as
    /// the deterministic tie-break.
    async fn list_recent(&self, limit: usize) -> Res<Vec<GrievanceTicket>>;
}

// Structs.

/// Ticket store handle for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TicketStore {
    inner: Arc<dyn GenericTicketStore>,
}

impl Deref for TicketStore {
    type Target = dyn GenericTicketStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TicketStore {
    pub fn new(inner: Arc<dyn GenericTicketStore>) -> Self {
        Self { inner }
    }
}
