pub mod config;
pub mod copywriter;
pub mod error;
pub mod handler;
pub mod http;
pub mod insights;
pub mod providers;
pub mod scoring;
pub mod telemetry;
