use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::dataset::video_record::VideoRecord;
use crate::identity::face_gallery::FaceGallery;
use crate::pipeline::extract_faces_use_case::{ExtractFacesUseCase, VideoFaces};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::THUMBNAIL_SIZE;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_downloader::VideoDownloader;

/// A distinct person across all videos.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluencerFace {
    /// 1-based, in first-seen order.
    pub id: u32,
    /// Thumbnail written when the person was first seen.
    pub face_path: PathBuf,
    /// One entry per video the person appeared in.
    pub performances: Vec<f64>,
    pub video_urls: Vec<String>,
}

/// A video that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFailure {
    pub url: String,
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ProcessOutcome {
    pub faces: Vec<InfluencerFace>,
    pub failures: Vec<VideoFailure>,
}

#[derive(Default)]
struct Appearances {
    performances: Vec<f64>,
    video_urls: Vec<String>,
}

/// Downloads every video, extracts its faces and attributes the video's
/// performance to each distinct person in it.
///
/// People are matched across videos with the same matcher the extractor uses
/// within a video. A failed download or decode skips that video only;
/// failing to write a thumbnail aborts the run.
pub struct ProcessVideosUseCase {
    downloader: Box<dyn VideoDownloader>,
    extractor: ExtractFacesUseCase,
    image_writer: Box<dyn ImageWriter>,
    logger: Box<dyn PipelineLogger>,
}

impl ProcessVideosUseCase {
    pub fn new(
        downloader: Box<dyn VideoDownloader>,
        extractor: ExtractFacesUseCase,
        image_writer: Box<dyn ImageWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            downloader,
            extractor,
            image_writer,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        records: &[VideoRecord],
        video_dir: &Path,
        frame_dir: &Path,
    ) -> Result<ProcessOutcome, Box<dyn std::error::Error>> {
        let mut gallery: FaceGallery<Appearances> = FaceGallery::new();
        let mut failures = Vec::new();
        let total = records.len();

        for (i, record) in records.iter().enumerate() {
            self.logger.progress(i + 1, total);

            let video_faces = match self.scan(record, video_dir) {
                Ok(faces) => faces,
                Err(reason) => {
                    log::error!("Error processing {}: {reason}", record.url);
                    failures.push(VideoFailure {
                        url: record.url.clone(),
                        row: record.row,
                        reason,
                    });
                    continue;
                }
            };
            self.logger
                .metric("faces_per_video", video_faces.faces.len() as f64);

            let mut credited = HashSet::new();
            for face in &video_faces.faces {
                let (id, is_new) = gallery.match_or_insert(
                    &face.embedding,
                    self.extractor.matcher(),
                    Appearances::default,
                );
                if is_new {
                    let path = frame_dir.join(face_file_name(id));
                    self.image_writer.write(
                        &path,
                        &face.crop,
                        Some((THUMBNAIL_SIZE, THUMBNAIL_SIZE)),
                    )?;
                    log::debug!("New face {id} from {}", record.url);
                }
                // A person split into two faces within one video still
                // counts that video once.
                if !credited.insert(id) {
                    continue;
                }
                if let Some(entry) = gallery.get_mut(id) {
                    entry.payload.performances.push(record.performance);
                    entry.payload.video_urls.push(record.url.clone());
                }
            }
        }

        self.logger.info(&format!(
            "Found {} distinct faces in {} videos ({} failed)",
            gallery.len(),
            total - failures.len(),
            failures.len()
        ));
        self.logger.summary();

        let faces = gallery
            .into_entries()
            .into_iter()
            .map(|entry| InfluencerFace {
                id: entry.id,
                face_path: frame_dir.join(face_file_name(entry.id)),
                performances: entry.payload.performances,
                video_urls: entry.payload.video_urls,
            })
            .collect();
        Ok(ProcessOutcome { faces, failures })
    }

    fn scan(&mut self, record: &VideoRecord, video_dir: &Path) -> Result<VideoFaces, String> {
        let t0 = Instant::now();
        let path = self
            .downloader
            .download(&record.url, video_dir)
            .map_err(|e| format!("download failed: {e}"))?;
        self.logger
            .timing("download", t0.elapsed().as_secs_f64() * 1000.0);

        let t1 = Instant::now();
        let faces = self
            .extractor
            .execute(&path)
            .map_err(|e| format!("face extraction failed: {e}"))?;
        self.logger
            .timing("extract", t1.elapsed().as_secs_f64() * 1000.0);
        Ok(faces)
    }
}

pub fn face_file_name(id: u32) -> String {
    format!("face_{id}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::identity_matcher::{CosineMatcher, ExactMatcher, IdentityMatcher};
    use crate::pipeline::extract_faces_use_case::tests::{
        face, painted_frame, ColorEmbedder, StubDetector,
    };
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::shared::region::Region;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_reader::VideoReader;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Serves a fixed frame list per video file name.
    struct PlaylistReader {
        videos: HashMap<String, Vec<Frame>>,
        current: Vec<Frame>,
    }

    impl VideoReader for PlaylistReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            self.current = self
                .videos
                .get(name)
                .cloned()
                .ok_or_else(|| format!("not a video: {name}"))?;
            Ok(VideoMetadata {
                width: 100,
                height: 100,
                fps: 30.0,
                total_frames: self.current.len(),
                codec: String::new(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.current.drain(..).map(Ok))
        }

        fn close(&mut self) {
            self.current.clear();
        }
    }

    /// "Downloads" by mapping the URL's last segment into `dest_dir`.
    struct StubDownloader {
        failing: HashSet<String>,
    }

    impl VideoDownloader for StubDownloader {
        fn download(
            &self,
            url: &str,
            dest_dir: &Path,
        ) -> Result<PathBuf, Box<dyn std::error::Error>> {
            if self.failing.contains(url) {
                return Err("HTTP 404".into());
            }
            let name = url.rsplit('/').next().unwrap_or(url);
            Ok(dest_dir.join(name))
        }
    }

    #[allow(clippy::type_complexity)]
    struct StubImageWriter {
        written: Arc<Mutex<Vec<(PathBuf, Frame, Option<(u32, u32)>)>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(
            &self,
            path: &Path,
            frame: &Frame,
            size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone(), size));
            Ok(())
        }
    }

    struct FailingImageWriter;

    impl ImageWriter for FailingImageWriter {
        fn write(
            &self,
            _path: &Path,
            _frame: &Frame,
            _size: Option<(u32, u32)>,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    // --- Helpers ---

    const RED: [u8; 3] = [200, 10, 10];
    const BLUE: [u8; 3] = [10, 10, 200];
    const GREEN: [u8; 3] = [10, 200, 10];
    const YELLOW: [u8; 3] = [200, 200, 10];

    fn record(url: &str, performance: f64, row: usize) -> VideoRecord {
        VideoRecord {
            url: url.to_string(),
            performance,
            row,
        }
    }

    /// Builds a one-frame video per entry with the given colored faces.
    fn scenario(videos: &[(&str, &[[u8; 3]])]) -> (PlaylistReader, StubDetector) {
        let slots = [Region::new(5, 5, 20, 20), Region::new(60, 60, 20, 20)];
        let mut playlist = HashMap::new();
        let mut detections = HashMap::new();
        for (video_index, (name, colors)) in videos.iter().enumerate() {
            let patches: Vec<_> = slots.iter().copied().zip(colors.iter().copied()).collect();
            // Distinct frame indices keep detections per video apart.
            let frame = painted_frame(video_index * 10, &patches);
            detections.insert(
                frame.index(),
                patches.iter().map(|(r, _)| face(*r)).collect(),
            );
            playlist.insert(name.to_string(), vec![frame]);
        }
        let reader = PlaylistReader {
            videos: playlist,
            current: Vec::new(),
        };
        (reader, StubDetector::new(detections))
    }

    fn use_case(
        reader: PlaylistReader,
        detector: StubDetector,
        downloader: StubDownloader,
        image_writer: Box<dyn ImageWriter>,
    ) -> ProcessVideosUseCase {
        use_case_matching(Arc::new(ExactMatcher), reader, detector, downloader, image_writer)
    }

    fn use_case_matching(
        matcher: Arc<dyn IdentityMatcher>,
        reader: PlaylistReader,
        detector: StubDetector,
        downloader: StubDownloader,
        image_writer: Box<dyn ImageWriter>,
    ) -> ProcessVideosUseCase {
        let extractor = ExtractFacesUseCase::new(
            Box::new(reader),
            Box::new(detector),
            Box::new(ColorEmbedder),
            matcher,
            1,
        )
        .unwrap();
        ProcessVideosUseCase::new(
            Box::new(downloader),
            extractor,
            image_writer,
            Box::new(NullPipelineLogger),
        )
    }

    fn no_failures() -> StubDownloader {
        StubDownloader {
            failing: HashSet::new(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn recording_writer() -> (
        Box<dyn ImageWriter>,
        Arc<Mutex<Vec<(PathBuf, Frame, Option<(u32, u32)>)>>>,
    ) {
        let written = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(StubImageWriter {
                written: written.clone(),
            }),
            written,
        )
    }

    // --- Tests ---

    #[test]
    fn test_faces_are_matched_across_videos() {
        let (reader, detector) = scenario(&[
            ("a.mp4", &[RED, BLUE]),
            ("b.mp4", &[BLUE]),
            ("c.mp4", &[GREEN, RED]),
        ]);
        let (writer, _) = recording_writer();
        let mut uc = use_case(reader, detector, no_failures(), writer);
        let records = vec![
            record("https://cdn.example.com/a.mp4", 10.0, 1),
            record("https://cdn.example.com/b.mp4", 20.0, 2),
            record("https://cdn.example.com/c.mp4", 30.0, 3),
        ];

        let out = uc
            .execute(&records, Path::new("videos"), Path::new("frames"))
            .unwrap();

        assert!(out.failures.is_empty());
        let summary: Vec<_> = out
            .faces
            .iter()
            .map(|f| (f.id, f.performances.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, vec![10.0, 30.0]), // red
                (2, vec![10.0, 20.0]), // blue
                (3, vec![30.0]),       // green
            ]
        );
        assert_eq!(out.faces[0].face_path, Path::new("frames").join("face_1.jpg"));
        assert_eq!(
            out.faces[1].video_urls,
            vec![
                "https://cdn.example.com/a.mp4".to_string(),
                "https://cdn.example.com/b.mp4".to_string()
            ]
        );
    }

    #[test]
    fn test_two_faces_of_one_person_credit_the_video_once() {
        // Red and green are far apart (cosine ~0.11) so they stay two faces
        // within a video, but both sit close to yellow (~0.75).
        let (reader, detector) = scenario(&[("a.mp4", &[YELLOW]), ("b.mp4", &[RED, GREEN])]);
        let (writer, written) = recording_writer();
        let matcher: Arc<dyn IdentityMatcher> = Arc::new(CosineMatcher::new(0.6).unwrap());
        let mut uc = use_case_matching(matcher, reader, detector, no_failures(), writer);
        let records = vec![record("u/a.mp4", 1.0, 1), record("u/b.mp4", 2.0, 2)];

        let out = uc
            .execute(&records, Path::new("videos"), Path::new("frames"))
            .unwrap();

        assert_eq!(out.faces.len(), 1);
        assert_eq!(out.faces[0].performances, vec![1.0, 2.0]);
        assert_eq!(
            out.faces[0].video_urls,
            vec!["u/a.mp4".to_string(), "u/b.mp4".to_string()]
        );
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_thumbnail_written_once_per_identity() {
        let (reader, detector) = scenario(&[("a.mp4", &[RED]), ("b.mp4", &[RED, BLUE])]);
        let (writer, written) = recording_writer();
        let mut uc = use_case(reader, detector, no_failures(), writer);
        let records = vec![record("u/a.mp4", 1.0, 1), record("u/b.mp4", 2.0, 2)];

        uc.execute(&records, Path::new("videos"), Path::new("frames"))
            .unwrap();

        let written = written.lock().unwrap();
        let paths: Vec<_> = written.iter().map(|(p, _, _)| p.clone()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("frames").join("face_1.jpg"),
                Path::new("frames").join("face_2.jpg")
            ]
        );
        assert!(written
            .iter()
            .all(|(_, _, size)| *size == Some((THUMBNAIL_SIZE, THUMBNAIL_SIZE))));
        assert_eq!(written[1].1.data()[..3], BLUE);
    }

    #[test]
    fn test_failed_videos_are_recorded_and_skipped() {
        let (reader, detector) = scenario(&[("a.mp4", &[RED]), ("c.mp4", &[RED])]);
        let (writer, _) = recording_writer();
        let downloader = StubDownloader {
            failing: HashSet::from(["u/b.mp4".to_string()]),
        };
        let mut uc = use_case(reader, detector, downloader, writer);
        let records = vec![
            record("u/a.mp4", 1.0, 1),
            record("u/b.mp4", 2.0, 2),
            record("u/missing.mp4", 3.0, 3),
            record("u/c.mp4", 4.0, 4),
        ];

        let out = uc
            .execute(&records, Path::new("videos"), Path::new("frames"))
            .unwrap();

        assert_eq!(out.failures.len(), 2);
        assert_eq!(out.failures[0].row, 2);
        assert!(out.failures[0].reason.contains("download failed"));
        assert_eq!(out.failures[1].url, "u/missing.mp4");
        assert!(out.failures[1].reason.contains("face extraction failed"));
        assert_eq!(out.faces.len(), 1);
        assert_eq!(out.faces[0].performances, vec![1.0, 4.0]);
    }

    #[test]
    fn test_video_without_faces_contributes_nothing() {
        let (reader, detector) = scenario(&[("a.mp4", &[]), ("b.mp4", &[GREEN])]);
        let (writer, _) = recording_writer();
        let mut uc = use_case(reader, detector, no_failures(), writer);
        let records = vec![record("u/a.mp4", 1.0, 1), record("u/b.mp4", 2.0, 2)];

        let out = uc
            .execute(&records, Path::new("videos"), Path::new("frames"))
            .unwrap();
        assert_eq!(out.faces.len(), 1);
        assert_eq!(out.faces[0].performances, vec![2.0]);
    }

    #[test]
    fn test_thumbnail_write_failure_aborts() {
        let (reader, detector) = scenario(&[("a.mp4", &[RED])]);
        let mut uc = use_case(
            reader,
            detector,
            no_failures(),
            Box::new(FailingImageWriter),
        );
        let records = vec![record("u/a.mp4", 1.0, 1)];
        assert!(uc
            .execute(&records, Path::new("videos"), Path::new("frames"))
            .is_err());
    }

    #[test]
    fn test_empty_records() {
        let (reader, detector) = scenario(&[]);
        let (writer, _) = recording_writer();
        let mut uc = use_case(reader, detector, no_failures(), writer);
        let out = uc
            .execute(&[], Path::new("videos"), Path::new("frames"))
            .unwrap();
        assert!(out.faces.is_empty());
        assert!(out.failures.is_empty());
    }

    #[test]
    fn test_face_file_name() {
        assert_eq!(face_file_name(12), "face_12.jpg");
    }
}
