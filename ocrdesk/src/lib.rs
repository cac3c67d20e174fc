pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod ocr;
pub mod pipeline;
pub mod preprocessing;
pub mod session;
pub mod structure;
pub mod upload;
