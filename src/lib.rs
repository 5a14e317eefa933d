pub mod api;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod helpers;
pub mod models;
pub mod services;
pub mod statistics;

pub use error::{DashboardError, Result};
