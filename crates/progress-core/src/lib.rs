pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod paths;
pub mod publish;
pub mod render;
pub mod staging;
pub mod tracker;
pub mod types;

pub use error::{ProgressError, Result};
