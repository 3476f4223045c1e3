pub mod cache;
pub mod catalog;
pub mod gemini_api;
pub mod types;
