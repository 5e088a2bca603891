pub mod alpha;
pub mod background;
pub mod engine;
pub mod error;
pub mod fitting;
pub mod geometry;
pub mod math;
pub mod segmentation;
pub mod shell;
pub mod tessellation;

pub use engine::{AlphaMatte, AnalysisReport, MatteComponents, MatteEngine, MatteInput, MatteParams};
pub use error::{MatteError, Result};
