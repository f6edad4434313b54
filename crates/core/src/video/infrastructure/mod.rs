pub mod ffmpeg_reader;
pub mod http_video_downloader;
pub mod image_file_writer;
