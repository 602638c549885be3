// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! Okapi BM25 inverted index.
//!
//! Ranking math and persistence layout follow the reference implementation
//! this crate was built against: a postings map keyed by term, a
//! doc-length map, and the BM25+ IDF smoothing that keeps IDF
//! non-negative even for terms appearing in more than half the corpus.

use std::collections::HashMap;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::persistence::{read_i32, read_string, read_usize, write_i32, write_string, write_usize};
use crate::types::ProcessedDocument;

/// Inverted index over term -> postings, plus the document-length
/// bookkeeping BM25 needs for length normalization.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    k1: f64,
    b: f64,
    avg_doc_length: f64,
    doc_lengths: HashMap<i32, i32>,
    /// term -> [(doc_id, term_freq)]
    inverted: HashMap<String, Vec<(i32, i32)>>,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new(1.2, 0.75)
    }
}

impl Bm25Index {
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            k1,
            b,
            avg_doc_length: 0.0,
            doc_lengths: HashMap::new(),
            inverted: HashMap::new(),
        }
    }

    /// Count term frequencies and append one posting per distinct term.
    /// Does not update `avg_doc_length` — call [`Self::finalize`] before
    /// relying on it.
    ///
    /// Re-indexing a previously-seen id *appends* further postings rather
    /// than replacing the old ones — this is an intentional asymmetry with
    /// [`crate::vector::VectorIndex::add`], preserved from the spec this
    /// crate implements. Callers should treat ids as write-once.
    pub fn add(&mut self, doc: &ProcessedDocument) {
        self.doc_lengths.insert(doc.id, doc.length);

        let mut term_freqs: HashMap<&str, i32> = HashMap::new();
        for token in &doc.tokens {
            *term_freqs.entry(token.as_str()).or_insert(0) += 1;
        }

        for (term, freq) in term_freqs {
            self.inverted
                .entry(term.to_string())
                .or_default()
                .push((doc.id, freq));
        }
    }

    /// Recompute `avg_doc_length` from the current `doc_lengths`. Idempotent.
    /// A no-op (leaving `avg_doc_length` at `0`) when no documents exist.
    pub fn finalize(&mut self) {
        if self.doc_lengths.is_empty() {
            return;
        }
        let total: i64 = self.doc_lengths.values().map(|&l| l as i64).sum();
        self.avg_doc_length = total as f64 / self.doc_lengths.len() as f64;
    }

    pub fn avg_doc_length(&self) -> f64 {
        self.avg_doc_length
    }

    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Score every document matching any query token with Okapi BM25,
    /// sorted by score descending, ties broken by ascending doc id.
    /// A query token appearing twice contributes twice (duplicates are
    /// not deduplicated). Returns an empty list over an empty index.
    pub fn search(&self, query_tokens: &[String]) -> Vec<(i32, f64)> {
        let n = self.doc_lengths.len();
        if n == 0 {
            return vec![];
        }

        let mut scores: HashMap<i32, f64> = HashMap::new();

        for token in query_tokens {
            let Some(postings) = self.inverted.get(token) else {
                continue;
            };

            let df = postings.len() as f64;
            let idf = ((n as f64 - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(doc_id, tf) in postings {
                let Some(&doc_len) = self.doc_lengths.get(&doc_id) else {
                    continue;
                };
                let tf_f = tf as f64;
                let doc_len_f = doc_len as f64;
                let denom = tf_f
                    + self.k1 * (1.0 - self.b + self.b * doc_len_f / self.avg_doc_length);
                let score = idf * (tf_f * (self.k1 + 1.0)) / denom;
                *scores.entry(doc_id).or_insert(0.0) += score;
            }
        }

        let mut results: Vec<(i32, f64)> = scores.into_iter().collect();
        results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        results
    }

    /// Write `k1 · b · avg_doc_length · doc_lengths · inverted index` as
    /// tightly-packed native-endian bytes. Call [`Self::finalize`] first.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(std::fs::File::create(path)?);
        self.write_to(&mut w)
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.k1.to_ne_bytes())?;
        w.write_all(&self.b.to_ne_bytes())?;
        w.write_all(&self.avg_doc_length.to_ne_bytes())?;

        write_usize(w, self.doc_lengths.len())?;
        for (&id, &len) in &self.doc_lengths {
            write_i32(w, id)?;
            write_i32(w, len)?;
        }

        write_usize(w, self.inverted.len())?;
        for (term, postings) in &self.inverted {
            write_string(w, term)?;
            write_usize(w, postings.len())?;
            for &(doc_id, tf) in postings {
                write_i32(w, doc_id)?;
                write_i32(w, tf)?;
            }
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut r = BufReader::new(std::fs::File::open(path)?);
        Self::read_from(&mut r)
    }

    fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut f64_buf = [0u8; 8];
        r.read_exact(&mut f64_buf)?;
        let k1 = f64::from_ne_bytes(f64_buf);
        r.read_exact(&mut f64_buf)?;
        let b = f64::from_ne_bytes(f64_buf);
        r.read_exact(&mut f64_buf)?;
        let avg_doc_length = f64::from_ne_bytes(f64_buf);

        let doc_lengths_size = read_usize(r)?;
        let mut doc_lengths = HashMap::with_capacity(doc_lengths_size);
        for _ in 0..doc_lengths_size {
            let id = read_i32(r)?;
            let len = read_i32(r)?;
            doc_lengths.insert(id, len);
        }

        let index_size = read_usize(r)?;
        let mut inverted = HashMap::with_capacity(index_size);
        for _ in 0..index_size {
            let term = read_string(r)?;
            let postings_size = read_usize(r)?;
            let mut postings = Vec::with_capacity(postings_size);
            for _ in 0..postings_size {
                let doc_id = read_i32(r)?;
                let tf = read_i32(r)?;
                postings.push((doc_id, tf));
            }
            inverted.insert(term, postings);
        }

        Ok(Self {
            k1,
            b,
            avg_doc_length,
            doc_lengths,
            inverted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: i32, text: &str) -> ProcessedDocument {
        ProcessedDocument::new(id, crate::normalizer::normalize(text))
    }

    #[test]
    fn self_recall_on_single_document() {
        let mut idx = Bm25Index::default();
        let d = doc(1, "The quick brown fox jumps");
        idx.add(&d);
        idx.finalize();

        let results = idx.search(&d.tokens);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn ranks_better_matching_document_first() {
        let mut idx = Bm25Index::default();
        idx.add(&doc(1, "The quick brown fox"));
        idx.add(&doc(2, "Quick foxes leap"));
        idx.finalize();

        let results = idx.search(&crate::normalizer::normalize("quick fox"));
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn finalize_is_idempotent_and_noop_on_empty() {
        let mut idx = Bm25Index::default();
        idx.finalize();
        assert_eq!(idx.avg_doc_length(), 0.0);
        idx.finalize();
        assert_eq!(idx.avg_doc_length(), 0.0);
    }

    #[test]
    fn finalize_computes_mean_doc_length() {
        let mut idx = Bm25Index::default();
        idx.add(&doc(1, "one two three"));
        idx.add(&doc(2, "four five"));
        idx.finalize();
        assert!((idx.avg_doc_length() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn search_over_empty_index_is_empty() {
        let idx = Bm25Index::default();
        assert!(idx.search(&["anything".to_string()]).is_empty());
    }

    #[test]
    fn empty_document_has_zero_length_and_no_postings() {
        let mut idx = Bm25Index::default();
        idx.add(&doc(5, ""));
        idx.finalize();
        assert_eq!(idx.doc_lengths.get(&5), Some(&0));
        assert!(idx.search(&["x".to_string()]).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let mut idx = Bm25Index::default();
        idx.add(&doc(2, "same words here"));
        idx.add(&doc(1, "same words here"));
        idx.finalize();
        let results = idx.search(&crate::normalizer::normalize("same words here"));
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
    }

    #[test]
    fn save_and_load_round_trip_preserves_scores() {
        let mut idx = Bm25Index::default();
        idx.add(&doc(1, "The quick brown fox"));
        idx.add(&doc(2, "Quick foxes leap far"));
        idx.finalize();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bm25");
        idx.save(&path).unwrap();
        let loaded = Bm25Index::load(&path).unwrap();

        let q = crate::normalizer::normalize("quick fox");
        assert_eq!(idx.search(&q), loaded.search(&q));
        assert_eq!(idx.avg_doc_length(), loaded.avg_doc_length());
    }
}
