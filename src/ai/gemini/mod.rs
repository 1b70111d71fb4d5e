pub mod discovery;
pub mod types;
pub mod vision;

pub use vision::GeminiVisionProvider;
