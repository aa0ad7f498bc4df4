//! Embedding analysis: aggregation, supervised projection and group metrics.

pub mod aggregate;
pub mod axes;
pub mod clustering;
pub mod pcr;
pub mod pls;
pub mod predictive;
pub mod similarity;

use std::collections::BTreeSet;

/// Sorted class names and the class index of every label.
pub fn encode_labels<S: AsRef<str>>(labels: &[S]) -> (Vec<String>, Vec<usize>) {
    let classes: Vec<String> = labels
        .iter()
        .map(|l| l.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let codes = labels
        .iter()
        .map(|l| {
            classes
                .binary_search_by(|c| c.as_str().cmp(l.as_ref()))
                .unwrap_or_default()
        })
        .collect();
    (classes, codes)
}
