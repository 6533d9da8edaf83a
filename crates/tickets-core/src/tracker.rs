use crate::error::Result;
use crate::task_line::TaskLine;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Marker written into every ticket description, followed by the line hash.
pub const HASH_MARKER: &str = "Content-Hash:";

/// A ticket as the tracker identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Fields for a ticket about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub summary: String,
    pub labels: Vec<String>,
    pub description: String,
    pub content_hash: String,
}

impl NewTicket {
    pub fn from_line(line: &TaskLine, created_at: DateTime<Local>) -> Self {
        Self {
            summary: line.summary.clone(),
            labels: line.labels.clone(),
            description: describe(&line.content_hash, created_at),
            content_hash: line.content_hash.clone(),
        }
    }
}

/// Ticket description embedding the content hash.
pub fn describe(content_hash: &str, created_at: DateTime<Local>) -> String {
    format!(
        "Ticket created automatically on {}\n\n{HASH_MARKER} {content_hash}",
        created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// The issue tracker as seen by the processor.
pub trait Tracker {
    /// An existing ticket carrying `content_hash` whose status is not closed.
    fn find_open_by_hash(&self, content_hash: &str) -> Result<Option<TicketRef>>;

    fn create(&self, ticket: &NewTicket) -> Result<TicketRef>;
}

impl<T: Tracker + ?Sized> Tracker for &T {
    fn find_open_by_hash(&self, content_hash: &str) -> Result<Option<TicketRef>> {
        (**self).find_open_by_hash(content_hash)
    }

    fn create(&self, ticket: &NewTicket) -> Result<TicketRef> {
        (**self).create(ticket)
    }
}

impl<T: Tracker + ?Sized> Tracker for Box<T> {
    fn find_open_by_hash(&self, content_hash: &str) -> Result<Option<TicketRef>> {
        (**self).find_open_by_hash(content_hash)
    }

    fn create(&self, ticket: &NewTicket) -> Result<TicketRef> {
        (**self).create(ticket)
    }
}
