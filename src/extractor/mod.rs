pub mod engine;
pub mod partial;
pub mod profiles;
pub mod traits;
pub mod ytdlp;

pub use engine::FallbackEngine;
pub use profiles::{AttemptPlan, AttemptStep, ExtractionProfile, Strictness};
pub use traits::{ExtractionLayer, FetchRequest};
pub use ytdlp::YtDlpRunner;
