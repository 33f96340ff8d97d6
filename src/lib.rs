pub mod config;
pub mod counter;
pub mod error;
pub mod geometry;
pub mod pose;
