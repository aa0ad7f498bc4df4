//! Bag-of-words corpora and the token dictionary they are indexed by.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use crate::error::PipelineError;

/// Sparse document: `(token id, count)` pairs.
pub type Bow = Vec<(usize, f64)>;

/// Token ↔ id mapping shared by the corpus and the topic model.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    id2token: Vec<String>,
    token2id: HashMap<String, usize>,
}

impl Dictionary {
    pub fn new(id2token: Vec<String>) -> Self {
        let token2id = id2token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id))
            .collect();
        Self { id2token, token2id }
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    /// Count known tokens; unknown tokens are ignored. Ids come back sorted.
    pub fn doc2bow<S: AsRef<str>>(&self, tokens: &[S]) -> Bow {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(id) = self.id(token.as_ref()) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let mut bow: Bow = counts.into_iter().collect();
        bow.sort_by_key(|(id, _)| *id);
        bow
    }
}

/// Read a Matrix Market coordinate file (one row per document, 1-based ids).
pub fn read_matrix_market(path: &Path) -> Result<Vec<Bow>> {
    let file = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    parse_matrix_market(BufReader::new(file))
}

/// Parse Matrix Market coordinate data from any reader.
pub fn parse_matrix_market<R: BufRead>(reader: R) -> Result<Vec<Bow>> {
    let mut docs: Option<Vec<Bow>> = None;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let malformed = |reason: &str| PipelineError::MalformedCorpus {
            line: line_no,
            reason: reason.to_string(),
        };
        if fields.len() != 3 {
            return Err(malformed("expected three fields").into());
        }
        match docs.as_mut() {
            None => {
                let n_docs: usize = fields[0]
                    .parse()
                    .map_err(|_| malformed("invalid document count"))?;
                docs = Some(vec![Vec::new(); n_docs]);
            }
            Some(docs) => {
                let doc: usize = fields[0]
                    .parse()
                    .map_err(|_| malformed("invalid document id"))?;
                let term: usize = fields[1]
                    .parse()
                    .map_err(|_| malformed("invalid term id"))?;
                let count: f64 = fields[2]
                    .parse()
                    .map_err(|_| malformed("invalid count"))?;
                if doc == 0 || term == 0 || doc > docs.len() {
                    return Err(malformed("id out of range").into());
                }
                docs[doc - 1].push((term - 1, count));
            }
        }
    }
    let mut docs = docs.ok_or_else(|| PipelineError::MalformedCorpus {
        line: 0,
        reason: "missing size header".to_string(),
    })?;
    for bow in &mut docs {
        bow.sort_by_key(|(id, _)| *id);
    }
    Ok(docs)
}
