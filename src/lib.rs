pub mod analyzer;
pub mod batch;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod export;
pub mod history;
pub mod interactive;
pub mod pipeline;
pub mod preprocess;
pub mod scanner;
