mod engine;
mod types;

pub use engine::{project, summarize};
pub use types::{Phase, ProjectionParams, ProjectionSummary, YearResult};
