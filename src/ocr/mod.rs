pub mod engine;
pub mod preprocess;
pub mod runner;
pub mod setup;

pub use engine::{EngineConfig, OcrEngine, TesseractEngine};
pub use preprocess::{preprocess, PreprocessedSet};
pub use runner::{extract_channels, ChannelText};
pub use setup::ensure_tesseract;
