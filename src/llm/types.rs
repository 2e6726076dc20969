use serde::{Deserialize, Serialize};

/// Progress notifications emitted during an extraction round trip, for
/// callers driving a UI or a job log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting,
    DraftingResponse,
    ProcessingResponse,
    Auditing,
    Success,
    Failed { reason: String },
}
