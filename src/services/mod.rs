pub mod prediction;
pub mod recompute;
pub mod recording;

pub use prediction::{GameOutcome, PredictionService};
pub use recompute::{replay_order, RecomputeService, RecomputeSummary};
pub use recording::{Recorded, RecordingService};
