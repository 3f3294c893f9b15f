use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crate-wide error type.
pub type Err = anyhow::Error;
/// Crate-wide result type.
pub type Res<T> = Result<T, Err>;
/// Result with no success payload.
pub type Void = Res<()>;

/// The fixed category set the image classifier must choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Category {
    /// A pothole in a road.
    Pothole,
    /// An illegal or overflowing garbage dump.
    #[serde(rename = "Garbage Dump")]
    GarbageDump,
    /// A non-functioning streetlight.
    #[serde(rename = "Broken Streetlight")]
    BrokenStreetlight,
    /// A fallen tree blocking or damaging public space.
    #[serde(rename = "Fallen Tree")]
    FallenTree,
    /// Flooding or waterlogging.
    Flooding,
    /// Anything that does not fit the other categories.
    #[default]
    Other,
}

/// Ticket lifecycle status.
///
/// Only `New` is ever assigned by this service; the remaining values exist for
/// downstream consumers that work tickets after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Freshly ingested; the only status this service assigns.
    #[default]
    New,
    /// Seen by a downstream operator.
    Acknowledged,
    /// Being actively worked.
    InProgress,
    /// Work completed.
    Resolved,
}

/// A geographic point, caller-supplied and returned verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// Classifier output for a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Category assigned by the classifier.
    pub category: Category,
    /// Free-text description produced by the classifier.
    pub description: String,
}

impl ImageAnalysis {
    /// The fixed degraded result used when classification fails for any reason.
    pub fn fallback() -> Self {
        Self {
            category: Category::Other,
            description: "AI analysis failed.".to_string(),
        }
    }
}

/// Transcriber output for a single audio blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    /// Transcribed text of the audio.
    pub transcription: String,
    /// Detected language code of the transcription.
    pub language_code: String,
}

/// The image portion of a ticket: blob reference plus AI enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReport {
    /// Storage URL of the uploaded image blob.
    pub url: String,
    /// Category assigned by the classifier.
    pub category: Category,
    /// AI-generated description of the image.
    pub ai_description: String,
}

/// The audio portion of a ticket. All fields are empty strings when the
/// grievance carried no audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioReport {
    /// Storage URL of the uploaded audio blob.
    pub url: String,
    /// Transcribed text of the audio.
    pub transcription: String,
    /// Detected language of the transcription.
    pub language: String,
}

/// A ticket as submitted to the store: everything except the store-assigned
/// id, timestamp, and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Caller-supplied grievance location.
    pub location: GeoPoint,
    /// Image blob reference plus AI enrichment.
    pub image: ImageReport,
    /// Audio blob reference plus transcription.
    pub audio: AudioReport,
    /// Caller-supplied free-text description.
    pub text_description: String,
}

/// The store's acknowledgement of a created ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTicket {
    /// Store-assigned ticket id.
    pub id: String,
    /// Store-assigned creation timestamp.
    pub timestamp: DateTime<Utc>,
}

/// A persisted grievance ticket in transport form: string id, RFC 3339
/// timestamp, and the location unpacked into plain numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceTicket {
    /// Store-assigned ticket id.
    pub id: String,
    /// Creation timestamp in RFC 3339 form.
    pub timestamp: String,
    /// Current lifecycle status.
    pub status: TicketStatus,
    /// Caller-supplied grievance location.
    pub location: GeoPoint,
    /// Image blob reference plus AI enrichment.
    pub image: ImageReport,
    /// Audio blob reference plus transcription.
    pub audio: AudioReport,
    /// Caller-supplied free-text description.
    pub text_description: String,
}
