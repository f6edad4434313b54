pub mod config;
pub mod dataset;
pub mod detection;
pub mod identity;
pub mod pipeline;
pub mod report;
pub mod shared;
pub mod video;
