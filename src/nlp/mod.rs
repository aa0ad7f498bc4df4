//! Text cleaning and representation layer.

pub mod boilerplate;
pub mod commentary;
pub mod embeddings;
pub mod normalize;
pub mod sentences;
pub mod tfidf;
pub mod vocab;
