use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use facetally_core::config::pipeline_settings::PipelineSettings;
use facetally_core::dataset::csv_dataset::load_records;
use facetally_core::detection::infrastructure::model_resolver::{self, ProgressFn};
use facetally_core::detection::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use facetally_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facetally_core::identity::identity_matcher::{build_matcher, IdentityMatcher, MatchMode};
use facetally_core::pipeline::aggregate::average_performance;
use facetally_core::pipeline::extract_faces_use_case::ExtractFacesUseCase;
use facetally_core::pipeline::pipeline_logger::LogPipelineLogger;
use facetally_core::pipeline::process_videos_use_case::ProcessVideosUseCase;
use facetally_core::report::clean::dedupe_by_average_performance;
use facetally_core::report::performance_row::PerformanceRow;
use facetally_core::report::ranking::{sort_descending, unique_by_face_image, Insights};
use facetally_core::report::{chart, html, results_csv};
use facetally_core::shared::constants::{
    CHART_FILE_NAME, CLEANED_RESULTS_FILE_NAME, DEFAULT_TOP_N, EMBEDDING_MODEL_NAME,
    EMBEDDING_MODEL_URL, FRAMES_DIR_NAME, HTML_FILE_NAME, RESULTS_FILE_NAME, VIDEOS_DIR_NAME,
    YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facetally_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facetally_core::video::infrastructure::http_video_downloader::HttpVideoDownloader;
use facetally_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Rank the people appearing in a set of videos by the performance of the
/// videos they appear in.
#[derive(Parser)]
#[command(name = "facetally", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every video in a spreadsheet, find faces and write the results.
    Run(RunArgs),
    /// Drop rows whose average performance repeats an earlier row.
    Clean {
        /// Results CSV to clean.
        input: PathBuf,

        /// Output file (default: cleaned_influencer_performance.csv next to the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print insights and render the chart and HTML table from a results CSV.
    Report {
        /// Results CSV.
        input: PathBuf,

        /// Directory holding the face thumbnails.
        #[arg(long)]
        frames: PathBuf,

        /// Output directory (default: next to the input).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Number of faces in the bar chart.
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Spreadsheet with video URL and performance columns.
    input: PathBuf,

    /// Working directory for downloaded videos, face thumbnails and reports.
    #[arg(long, default_value = "facetally-output")]
    workdir: PathBuf,

    /// JSON settings file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run face detection every Nth frame.
    #[arg(long)]
    sample_interval: Option<usize>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// How faces are matched: exact or cosine.
    #[arg(long)]
    match_mode: Option<MatchMode>,

    /// Cosine similarity threshold for the same person (-1.0-1.0).
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of faces in the bar chart.
    #[arg(long)]
    top: Option<usize>,

    /// Directory containing ONNX models (skips download if found).
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Run(args) => run_pipeline(&args),
        Command::Clean { input, output } => run_clean(&input, output.as_deref()),
        Command::Report {
            input,
            frames,
            out,
            top,
        } => run_report(&input, &frames, out.as_deref(), top),
    }
}

fn run_pipeline(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.exists() {
        return Err(format!("Input file not found: {}", args.input.display()).into());
    }
    let settings = resolve_settings(args)?;

    let video_dir = args.workdir.join(VIDEOS_DIR_NAME);
    let frame_dir = args.workdir.join(FRAMES_DIR_NAME);
    fs::create_dir_all(&video_dir)?;
    fs::create_dir_all(&frame_dir)?;

    let records = load_records(&args.input, &settings.columns())?;
    let matcher: Arc<dyn IdentityMatcher> =
        Arc::from(build_matcher(settings.match_mode, settings.similarity_threshold)?);
    log::info!(
        "Matching faces by {} (threshold {}), sampling every {} frames",
        settings.match_mode,
        settings.similarity_threshold,
        settings.sample_interval
    );

    let extractor = build_extractor(&settings, matcher)?;
    let mut use_case = ProcessVideosUseCase::new(
        Box::new(HttpVideoDownloader::new()?),
        extractor,
        Box::new(ImageFileWriter::new()),
        Box::new(LogPipelineLogger::new()),
    );
    let outcome = use_case.execute(&records, &video_dir, &frame_dir)?;

    for failure in &outcome.failures {
        log::warn!(
            "Row {} ({}) skipped: {}",
            failure.row,
            failure.url,
            failure.reason
        );
    }

    let rows = average_performance(&outcome.faces);
    let results_path = args.workdir.join(RESULTS_FILE_NAME);
    results_csv::write_rows(&results_path, &rows)?;
    log::info!("Results saved to {}", results_path.display());

    write_report(&rows, &frame_dir, &args.workdir, settings.top_n)
}

fn run_clean(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let rows = results_csv::read_rows(input)?;
    let cleaned = dedupe_by_average_performance(rows);
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => sibling(input, CLEANED_RESULTS_FILE_NAME),
    };
    results_csv::write_rows(&output, &cleaned)?;
    log::info!("Cleaned CSV saved as {}", output.display());
    Ok(())
}

fn run_report(
    input: &Path,
    frames: &Path,
    out: Option<&Path>,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if top == 0 {
        return Err("--top must be at least 1".into());
    }
    if !frames.is_dir() {
        return Err(format!("Frames directory not found: {}", frames.display()).into());
    }
    let rows = results_csv::read_rows(input)?;
    let out_dir = match out {
        Some(dir) => dir.to_path_buf(),
        None => sibling(input, ""),
    };
    fs::create_dir_all(&out_dir)?;
    write_report(&rows, frames, &out_dir, top)
}

/// Prints insights and writes the chart and HTML table into `out_dir`.
fn write_report(
    rows: &[PerformanceRow],
    frames: &Path,
    out_dir: &Path,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(insights) = Insights::compute(rows, top) else {
        log::warn!("No faces with a recorded performance; skipping chart and table");
        return Ok(());
    };

    eprintln!("\nPerformance Insights:");
    for line in insights.lines() {
        eprintln!("{line}");
    }

    chart::write_svg(&out_dir.join(CHART_FILE_NAME), &insights)?;

    // The table lists every face, not only the charted ones.
    let mut ranked = unique_by_face_image(rows.to_vec());
    sort_descending(&mut ranked);
    let table = html::render_table(&ranked, frames);
    if !table.missing.is_empty() {
        log::warn!("{} face images were missing from {}", table.missing.len(), frames.display());
    }
    html::write_table(&out_dir.join(HTML_FILE_NAME), &table)?;
    Ok(())
}

fn resolve_settings(args: &RunArgs) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let mut settings = match &args.config {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    apply_overrides(&mut settings, args);
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(settings: &mut PipelineSettings, args: &RunArgs) {
    if let Some(n) = args.sample_interval {
        settings.sample_interval = n;
    }
    if let Some(c) = args.confidence {
        settings.confidence = c;
    }
    if let Some(mode) = args.match_mode {
        settings.match_mode = mode;
    }
    if let Some(t) = args.threshold {
        settings.similarity_threshold = t;
    }
    if let Some(n) = args.top {
        settings.top_n = n;
    }
    if let Some(dir) = &args.models_dir {
        settings.models_dir = Some(dir.clone());
    }
}

fn build_extractor(
    settings: &PipelineSettings,
    matcher: Arc<dyn IdentityMatcher>,
) -> Result<ExtractFacesUseCase, Box<dyn std::error::Error>> {
    let models_dir = settings.models_dir.as_deref();

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let detector_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        models_dir,
        Some(download_progress("face detection")),
    )?;
    eprintln!();

    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        models_dir,
        Some(download_progress("face embedding")),
    )?;
    eprintln!();

    ExtractFacesUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(OnnxYoloDetector::new(&detector_path, settings.confidence)?),
        Box::new(OnnxArcFaceEmbedder::new(&embedder_path)?),
        matcher,
        settings.sample_interval,
    )
}

/// `name` in the same directory as `path`; an empty `name` yields the directory.
fn sibling(path: &Path, name: &str) -> PathBuf {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if name.is_empty() {
        dir.to_path_buf()
    } else {
        dir.join(name)
    }
}

fn download_progress(label: &'static str) -> ProgressFn {
    Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {label} model... {pct}%");
        } else {
            eprint!("\rDownloading {label} model... {downloaded} bytes");
        }
    })
}
