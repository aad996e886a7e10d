pub mod annotators;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod nlp;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod upload;
