use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// Maps a face crop to an identity embedding.
pub trait FaceEmbedder: Send {
    fn embed(&mut self, face: &Frame) -> Result<Embedding, Box<dyn std::error::Error>>;
}
