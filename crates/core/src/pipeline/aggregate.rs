use crate::pipeline::process_videos_use_case::InfluencerFace;
use crate::report::performance_row::PerformanceRow;

/// One row per identity holding the mean of its video performances.
///
/// Identities without any recorded performance are left out. Order follows
/// the input.
pub fn average_performance(faces: &[InfluencerFace]) -> Vec<PerformanceRow> {
    faces
        .iter()
        .filter_map(|face| {
            log::debug!("Performance list for face {}: {:?}", face.id, face.performances);
            if face.performances.is_empty() {
                return None;
            }
            let mean = face.performances.iter().sum::<f64>() / face.performances.len() as f64;
            Some(PerformanceRow::new(
                face.face_path.to_string_lossy().into_owned(),
                mean,
            ))
        })
        .collect()
}
