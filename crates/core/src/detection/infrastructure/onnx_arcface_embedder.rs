/// ArcFace face embedder using ONNX Runtime.
///
/// Produces 512-d L2-normalized embeddings from RGB face crops; two crops of
/// the same person land close together under cosine similarity.
use std::path::Path;

use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::infrastructure::execution_provider;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: ort::session::Session,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = execution_provider::load_session(model_path)?;
        Ok(Self { session })
    }
}

impl FaceEmbedder for OnnxArcFaceEmbedder {
    fn embed(&mut self, face: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        if face.is_empty() {
            return Err("Cannot embed an empty face crop".into());
        }
        if face.channels() != 3 {
            return Err(format!("Expected RGB face crop, got {} channels", face.channels()).into());
        }

        let tensor = preprocess(face);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("ArcFace model produced no outputs".into());
        }
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        if values.is_empty() {
            return Err("ArcFace model returned an empty embedding".into());
        }

        Ok(Embedding::normalized(values))
    }
}

/// Resize crop to 112x112 (nearest neighbour), normalize, NCHW layout.
fn preprocess(face: &Frame) -> ndarray::Array4<f32> {
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let src = face.as_ndarray();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
