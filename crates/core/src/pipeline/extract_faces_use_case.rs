use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::identity::face_gallery::FaceGallery;
use crate::identity::identity_matcher::IdentityMatcher;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

/// A distinct face found in one video.
#[derive(Debug, Clone)]
pub struct VideoFace {
    /// Embedding of the first sighting.
    pub embedding: Embedding,
    /// Largest square crop seen for this face.
    pub crop: Frame,
    pub sightings: usize,
}

#[derive(Debug, Default)]
pub struct VideoFaces {
    pub faces: Vec<VideoFace>,
    pub frames_read: usize,
    pub frames_sampled: usize,
    pub skipped_frames: usize,
}

struct BestCrop {
    crop: Frame,
    area: i64,
    sightings: usize,
}

/// Scans one video and returns the distinct faces in it.
///
/// Only every `sample_interval`-th frame is run through the detector. Faces
/// are deduplicated within the video with the shared identity matcher.
pub struct ExtractFacesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    matcher: Arc<dyn IdentityMatcher>,
    sample_interval: usize,
}

impl ExtractFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        matcher: Arc<dyn IdentityMatcher>,
        sample_interval: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if sample_interval == 0 {
            return Err("Sample interval must be at least 1".into());
        }
        Ok(Self {
            reader,
            detector,
            embedder,
            matcher,
            sample_interval,
        })
    }

    pub fn matcher(&self) -> &dyn IdentityMatcher {
        self.matcher.as_ref()
    }

    pub fn execute(&mut self, path: &Path) -> Result<VideoFaces, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(path)?;
        log::debug!(
            "Scanning {} ({}x{}, ~{} sampled frames)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.sampled_frames(self.sample_interval)
        );

        let mut gallery: FaceGallery<BestCrop> = FaceGallery::new();
        let mut result = VideoFaces::default();

        {
            let matcher = self.matcher.as_ref();
            let detector = &mut *self.detector;
            let embedder = &mut *self.embedder;

            for frame in self.reader.frames() {
                let frame = match frame {
                    Ok(f) => f,
                    Err(e) => {
                        log::warn!(
                            "Decode error in {} after {} frames, keeping faces found so far: {e}",
                            path.display(),
                            result.frames_read
                        );
                        break;
                    }
                };
                result.frames_read += 1;
                if frame.index() % self.sample_interval != 0 {
                    continue;
                }
                result.frames_sampled += 1;

                if let Err(e) = collect_faces(
                    &frame,
                    &mut *detector,
                    &mut *embedder,
                    matcher,
                    &mut gallery,
                ) {
                    result.skipped_frames += 1;
                    log::warn!("Skipping frame {} of {}: {e}", frame.index(), path.display());
                }
            }
        }
        self.reader.close();

        if result.skipped_frames > 0 {
            log::info!(
                "{}: skipped {} of {} sampled frames",
                path.display(),
                result.skipped_frames,
                result.frames_sampled
            );
        }

        result.faces = gallery
            .into_entries()
            .into_iter()
            .map(|entry| VideoFace {
                embedding: entry.anchor,
                crop: entry.payload.crop,
                sightings: entry.payload.sightings,
            })
            .collect();
        Ok(result)
    }
}

fn collect_faces(
    frame: &Frame,
    detector: &mut dyn FaceDetector,
    embedder: &mut dyn FaceEmbedder,
    matcher: &dyn IdentityMatcher,
    gallery: &mut FaceGallery<BestCrop>,
) -> Result<(), Box<dyn std::error::Error>> {
    for face in detector.detect(frame)? {
        let crop = frame.square_crop(&face.region);
        if crop.is_empty() {
            continue;
        }
        let embedding = embedder.embed(&crop)?;
        let area = face.region.area();

        match gallery.find(&embedding, matcher) {
            Some(id) => {
                if let Some(entry) = gallery.get_mut(id) {
                    let best = &mut entry.payload;
                    best.sightings += 1;
                    if area > best.area {
                        best.area = area;
                        best.crop = crop;
                    }
                }
            }
            None => {
                gallery.insert(
                    embedding,
                    BestCrop {
                        crop,
                        area,
                        sightings: 1,
                    },
                );
            }
        }
    }
    Ok(())
}
