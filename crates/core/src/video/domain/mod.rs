pub mod image_writer;
pub mod video_downloader;
pub mod video_reader;
