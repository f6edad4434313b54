use crate::identity::identity_matcher::IdentityMatcher;
use crate::shared::embedding::Embedding;

/// One known person: the embedding first seen for them plus caller data.
#[derive(Debug, Clone)]
pub struct GalleryEntry<T> {
    pub id: u32,
    pub anchor: Embedding,
    pub payload: T,
}

/// Ordered set of distinct identities.
///
/// Ids are 1-based and assigned in first-seen order. An entry's anchor never
/// changes after insertion, so matching is independent of how many sightings
/// an identity has accumulated.
pub struct FaceGallery<T> {
    entries: Vec<GalleryEntry<T>>,
}

impl<T> Default for FaceGallery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FaceGallery<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Best-scoring identity accepted by `matcher`. Ties go to the earlier id.
    pub fn find(&self, embedding: &Embedding, matcher: &dyn IdentityMatcher) -> Option<u32> {
        let mut best: Option<(u32, f64)> = None;
        for entry in &self.entries {
            let Some(score) = matcher.score(&entry.anchor, embedding) else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry.id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Returns the id of the matching identity, inserting a new one built by
    /// `make_payload` when nothing matches. The flag is `true` for insertions.
    pub fn match_or_insert<F>(
        &mut self,
        embedding: &Embedding,
        matcher: &dyn IdentityMatcher,
        make_payload: F,
    ) -> (u32, bool)
    where
        F: FnOnce() -> T,
    {
        if let Some(id) = self.find(embedding, matcher) {
            return (id, false);
        }
        (self.insert(embedding.clone(), make_payload()), true)
    }

    /// Adds a new identity unconditionally and returns its id.
    pub fn insert(&mut self, anchor: Embedding, payload: T) -> u32 {
        let id = self.entries.len() as u32 + 1;
        self.entries.push(GalleryEntry {
            id,
            anchor,
            payload,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&GalleryEntry<T>> {
        self.index_of(id).map(|i| &self.entries[i])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut GalleryEntry<T>> {
        self.index_of(id).map(move |i| &mut self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GalleryEntry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<GalleryEntry<T>> {
        self.entries
    }

    // Ids are dense and 1-based, so the id doubles as an index.
    fn index_of(&self, id: u32) -> Option<usize> {
        let index = (id as usize).checked_sub(1)?;
        (index < self.entries.len()).then_some(index)
    }
}
