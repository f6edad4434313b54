pub mod constants;
pub mod embedding;
pub mod frame;
pub mod http_fetch;
pub mod region;
pub mod video_metadata;
