pub mod gemini;
pub mod image;
pub mod parse;
pub mod request;
pub mod runtime;
