pub mod csv_dataset;
pub mod video_record;
