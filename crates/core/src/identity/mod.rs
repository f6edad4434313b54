pub mod face_gallery;
pub mod identity_matcher;
