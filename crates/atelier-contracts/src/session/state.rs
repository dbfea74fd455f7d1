use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, DesignVariant};

/// Generic message shown when a batch is aborted.
pub const BATCH_FAILED_MESSAGE: &str = "Đã có lỗi xảy ra. Hãy kiểm tra kết nối và thử lại.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Analyzing,
    Generating,
    Done,
    Failed,
}

/// Everything the presentation layer reads about one session.
///
/// `generation` is the state epoch. Mode switches and new uploads bump it,
/// and any result tagged with an older epoch is dropped on arrival.
/// `in_flight` is the epoch of the running batch, if any; it can lag behind
/// `generation` while an abandoned batch drains. `batch` counts started
/// batches; a regeneration only lands on the batch it was issued against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationState {
    pub is_analyzing: bool,
    pub is_generating: bool,
    pub analysis: Option<AnalysisResult>,
    pub variants: Vec<DesignVariant>,
    pub error: Option<String>,
    pub generation: u64,
    pub in_flight: Option<u64>,
    pub batch: u64,
}

impl GenerationState {
    pub fn phase(&self) -> Phase {
        if self.is_analyzing {
            Phase::Analyzing
        } else if self.is_generating {
            Phase::Generating
        } else if self.error.is_some() {
            Phase::Failed
        } else if !self.variants.is_empty() {
            Phase::Done
        } else {
            Phase::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.is_analyzing || self.is_generating
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Whether results issued under (`generation`, `batch`) may still land.
    pub fn accepts_regeneration(&self, generation: u64, batch: u64) -> bool {
        self.is_current(generation) && self.batch == batch && !self.is_busy()
    }

    pub fn variant(&self, id: &str) -> Option<&DesignVariant> {
        self.variants.iter().find(|variant| variant.id == id)
    }
}
