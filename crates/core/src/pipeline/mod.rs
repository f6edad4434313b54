pub mod aggregate;
pub mod extract_faces_use_case;
pub mod pipeline_logger;
pub mod process_videos_use_case;
