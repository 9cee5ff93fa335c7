pub mod facebook;
pub mod gemini;
