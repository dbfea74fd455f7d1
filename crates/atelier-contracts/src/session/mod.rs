mod reducer;
mod state;

pub use reducer::{reduce, SessionEvent};
pub use state::{GenerationState, Phase, BATCH_FAILED_MESSAGE};
