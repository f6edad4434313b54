//! Face embedding vectors produced by the recognition model.

/// A face embedding.
///
/// Embeddings built with [`Embedding::normalized`] have unit L2 norm, so their
/// dot product is the cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps `values` after scaling them to unit length. A zero vector stays zero.
    pub fn normalized(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    /// Wraps `values` as-is.
    pub fn raw(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine similarity in `[-1, 1]`. Mismatched lengths or a zero vector give 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        if self.len() != other.len() {
            return 0.0;
        }
        let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            dot += a * b;
            na += a * a;
            nb += b * b;
        }
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        dot / (na.sqrt() * nb.sqrt())
    }

    /// Element-wise equality of every component.
    pub fn exactly_equals(&self, other: &Embedding) -> bool {
        self.len() == other.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }

    /// Short printable key: the first few components at 4 decimals.
    pub fn key(&self) -> String {
        let head: Vec<String> = self.0.iter().take(4).map(|v| format!("{v:.4}")).collect();
        if self.len() > 4 {
            format!("[{}, ..; {}]", head.join(", "), self.len())
        } else {
            format!("[{}]", head.join(", "))
        }
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalized_scales_to_unit_length() {
        let e = Embedding::normalized(vec![3.0, 4.0]);
        assert_relative_eq!(e.as_slice()[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(e.as_slice()[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_normalized_zero_vector_unchanged() {
        let e = Embedding::normalized(vec![0.0, 0.0, 0.0]);
        assert_eq!(e.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cosine_identical() {
        let e = Embedding::normalized(vec![0.2, 0.5, 0.1]);
        assert_relative_eq!(e.cosine_similarity(&e), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = Embedding::raw(vec![1.0, 0.0]);
        let b = Embedding::raw(vec![0.0, 2.0]);
        assert_relative_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let a = Embedding::raw(vec![1.0, 1.0]);
        let b = Embedding::raw(vec![5.0, 5.0]);
        assert_relative_eq!(a.cosine_similarity(&b), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        let a = Embedding::raw(vec![1.0, 0.0]);
        let b = Embedding::raw(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_exactly_equals() {
        let a = Embedding::raw(vec![0.1, 0.2]);
        assert!(a.exactly_equals(&Embedding::raw(vec![0.1, 0.2])));
        assert!(!a.exactly_equals(&Embedding::raw(vec![0.1, 0.2000001])));
        assert!(!a.exactly_equals(&Embedding::raw(vec![0.1])));
    }

    #[test]
    fn test_key_truncates_long_vectors() {
        let e = Embedding::raw(vec![0.5; 512]);
        assert_eq!(e.key(), "[0.5000, 0.5000, 0.5000, 0.5000, ..; 512]");
    }

    #[test]
    fn test_key_short_vector() {
        assert_eq!(Embedding::raw(vec![1.0, -1.0]).key(), "[1.0000, -1.0000]");
    }
}
