//! Image descriptions for blind and low-vision users
//!
//! Sends an image to a vision model (OpenAI or Google Gemini) together with a
//! detail/language-specific instruction and returns the plain description
//! text, or a categorized error the caller can report.

pub mod ai;
pub mod error;
pub mod image;
pub mod models;
pub mod prompts;
pub mod text;

pub use error::{Error, Result};
