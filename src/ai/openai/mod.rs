pub mod types;
pub mod vision;

pub use vision::OpenAiVisionProvider;
