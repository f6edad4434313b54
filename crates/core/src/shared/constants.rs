pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Run detection on every Nth decoded frame.
pub const DEFAULT_SAMPLE_INTERVAL: usize = 10;

/// Minimum detector confidence for a face to be kept.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Cosine similarity at or above which two ArcFace embeddings are the same person.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Number of faces shown in the ranked chart.
pub const DEFAULT_TOP_N: usize = 20;

/// Side length of saved face thumbnails.
pub const THUMBNAIL_SIZE: u32 = 256;

pub const URL_COLUMN: &str = "Video URL";
pub const PERFORMANCE_COLUMN: &str = "Performance";
pub const FACE_IMAGE_COLUMN: &str = "Face Image";
pub const AVERAGE_PERFORMANCE_COLUMN: &str = "Average Performance";

pub const RESULTS_FILE_NAME: &str = "influencer_performance.csv";
pub const CLEANED_RESULTS_FILE_NAME: &str = "cleaned_influencer_performance.csv";
pub const CHART_FILE_NAME: &str = "influencer_performance.svg";
pub const HTML_FILE_NAME: &str = "influencer_performance_table.html";

pub const VIDEOS_DIR_NAME: &str = "videos";
pub const FRAMES_DIR_NAME: &str = "frames";
