//! Preprocessing, topic assignment and embedding analysis of European
//! Parliament speeches.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod nlp;
pub mod pipeline;
pub mod topics;
