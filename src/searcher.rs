// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! Hybrid searcher: owns the BM25 index, the vector index, and the
//! document-text cache, and reconciles their two ranked result sets into
//! one fused ranking.
//!
//! No reference to the indices' internals escapes this module — every
//! interaction with them goes through the operations below.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::Instant;

use crate::bm25::Bm25Index;
use crate::normalizer::normalize;
use crate::persistence::{read_i32, read_string, read_usize, write_i32, write_string, write_usize};
use crate::types::{InputDocument, ProcessedDocument};
use crate::vector::{self, VectorIndex};

const TEXT_NOT_FOUND: &str = "[Text not found in cache]";
const BM25_WEIGHT: f64 = 0.7;
const VECTOR_WEIGHT: f64 = 0.3;

/// Fixed filename for the document-text cache, written/read in the
/// process's current working directory — inconsistent with the
/// caller-supplied `bm25_path`/`vec_path`, but that inconsistency is
/// preserved from the spec this crate implements (see `DESIGN.md`).
pub const DOCS_CACHE_FILE: &str = "index.docs";

pub struct HybridSearcher {
    bm25: Bm25Index,
    vector: VectorIndex,
    doc_cache: HashMap<i32, String>,
    telemetry_path: Option<std::path::PathBuf>,
}

impl Default for HybridSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HybridSearcher {
    pub fn new() -> Self {
        Self {
            bm25: Bm25Index::default(),
            vector: VectorIndex::new(),
            doc_cache: HashMap::new(),
            telemetry_path: None,
        }
    }

    /// Enable per-query telemetry snapshots, written to `path` on every
    /// [`Self::search`] call.
    pub fn with_telemetry(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.telemetry_path = Some(path.into());
        self
    }

    pub fn doc_count(&self) -> usize {
        self.bm25.doc_count()
    }

    /// Normalize `doc.text`, cache it, hand the tokens to the BM25 index,
    /// and embed+store the same tokens in the vector index.
    ///
    /// Re-indexing a previously-seen id overwrites the cache entry and
    /// the vector slot, but *appends* new postings to BM25 — ids are
    /// therefore write-once in practice (spec-preserved asymmetry).
    pub fn add(&mut self, doc: InputDocument) {
        let tokens = normalize(&doc.text);
        let processed = ProcessedDocument::new(doc.id, tokens);

        log::debug!("indexing doc {}", doc.id);

        self.doc_cache.insert(doc.id, doc.text);
        let embedding = vector::embed(&processed.tokens);
        self.bm25.add(&processed);
        self.vector.add(doc.id, embedding);
    }

    pub fn document_text(&self, id: i32) -> &str {
        self.doc_cache
            .get(&id)
            .map(String::as_str)
            .unwrap_or(TEXT_NOT_FOUND)
    }

    /// Normalize the query, rank it against both indices, and fuse the two
    /// ranked lists: `w_bm25=0.7, w_vec=0.3` when BM25 has any hits, else
    /// `w_bm25=0, w_vec=1.0` (pure vector fallback). Sorted by fused score
    /// descending, ties broken by ascending doc id, truncated to `k`.
    pub fn search(&self, query_text: &str, k: usize) -> Vec<i32> {
        let start = Instant::now();
        let tokens = normalize(query_text);

        let bm25_results = self.bm25.search(&tokens);
        let query_vec = vector::embed(&tokens);
        let vector_results = self.vector.search(&query_vec, k);

        let (bm25_weight, vector_weight) = if bm25_results.is_empty() {
            (0.0, 1.0)
        } else {
            (BM25_WEIGHT, VECTOR_WEIGHT)
        };

        let mut fused: HashMap<i32, f64> = HashMap::new();
        for (id, score) in &bm25_results {
            *fused.entry(*id).or_insert(0.0) += score * bm25_weight;
        }
        for (id, score) in &vector_results {
            *fused.entry(*id).or_insert(0.0) += score * vector_weight;
        }

        let mut ranked: Vec<(i32, f64)> = fused.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        let ids: Vec<i32> = ranked.iter().map(|(id, _)| *id).collect();

        if let Some(path) = &self.telemetry_path {
            let rich: Vec<(i32, f64, String)> = ranked
                .iter()
                .map(|(id, score)| (*id, *score, self.document_text(*id).to_string()))
                .collect();
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            crate::telemetry::record_query(path, query_text, &tokens, &rich, latency_ms);
        }

        ids
    }

    /// Finalize the BM25 index, then write the BM25 file, the vector
    /// file, and the fixed-name document cache (in the current working
    /// directory). Partial files may remain on disk if a later write
    /// fails — no atomic rename is attempted.
    pub fn save(&mut self, bm25_path: impl AsRef<Path>, vec_path: impl AsRef<Path>) -> io::Result<()> {
        self.bm25.finalize();
        self.bm25.save(bm25_path)?;
        self.vector.save(vec_path)?;

        let mut w = io::BufWriter::new(std::fs::File::create(DOCS_CACHE_FILE)?);
        write_usize(&mut w, self.doc_cache.len())?;
        for (&id, text) in &self.doc_cache {
            write_i32(&mut w, id)?;
            write_string(&mut w, text)?;
        }

        log::info!("saved {} documents to {DOCS_CACHE_FILE}", self.doc_cache.len());
        Ok(())
    }

    /// Read the BM25 and vector files (failure here is fatal to the
    /// load). Then attempt the document cache; if it is absent or
    /// unreadable, log a warning and proceed with an empty cache — that
    /// is still a successful load. `avg_doc_length` comes from the file,
    /// not a recomputation.
    pub fn load(bm25_path: impl AsRef<Path>, vec_path: impl AsRef<Path>) -> io::Result<Self> {
        let bm25 = Bm25Index::load(bm25_path)?;
        let vector = VectorIndex::load(vec_path)?;

        let doc_cache = match Self::load_doc_cache() {
            Ok(cache) => {
                log::info!("loaded {} documents from {DOCS_CACHE_FILE}", cache.len());
                cache
            }
            Err(e) => {
                log::warn!("could not load {DOCS_CACHE_FILE} ({e}), starting with empty cache");
                HashMap::new()
            }
        };

        Ok(Self {
            bm25,
            vector,
            doc_cache,
            telemetry_path: None,
        })
    }

    fn load_doc_cache() -> io::Result<HashMap<i32, String>> {
        let mut r = io::BufReader::new(std::fs::File::open(DOCS_CACHE_FILE)?);
        let size = read_usize(&mut r)?;
        let mut cache = HashMap::with_capacity(size);
        for _ in 0..size {
            let id = read_i32(&mut r)?;
            let text = read_string(&mut r)?;
            cache.insert(id, text);
        }
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// `index.docs` is read/written relative to the process's current
    /// working directory (spec-mandated, not our choice — see
    /// `DESIGN.md`). `std::env::set_current_dir` is process-global, so
    /// any test that calls it must run exclusively of the others in this
    /// binary.
    static CWD_GUARD: Mutex<()> = Mutex::new(());

    fn input(id: i32, text: &str) -> InputDocument {
        InputDocument {
            id,
            text: text.to_string(),
        }
    }

    #[test]
    fn scenario_quick_brown_fox() {
        let mut s = HybridSearcher::new();
        s.add(input(1, "The quick brown fox"));
        s.add(input(2, "Quick foxes leap"));
        assert_eq!(s.search("quick fox", 50), vec![1, 2]);
    }

    #[test]
    fn scenario_vector_fallback_on_no_bm25_hits() {
        let mut s = HybridSearcher::new();
        s.add(input(10, "hello world"));
        let results = s.search("xyz nonsense", 50);
        assert!(results.len() <= 1);
    }

    #[test]
    fn scenario_empty_document_never_matches() {
        let mut s = HybridSearcher::new();
        s.add(input(5, ""));
        let results = s.search("anything at all", 50);
        assert!(!results.contains(&5));
    }

    #[test]
    fn missing_document_text_reports_the_hole() {
        let s = HybridSearcher::new();
        assert_eq!(s.document_text(999), TEXT_NOT_FOUND);
    }

    #[test]
    fn hybrid_search_respects_k() {
        let mut s = HybridSearcher::new();
        for i in 0..10 {
            s.add(input(i, "repeated shared vocabulary across every document"));
        }
        assert!(s.search("repeated shared vocabulary", 3).len() <= 3);
    }

    #[test]
    fn save_then_load_is_behaviorally_identical() {
        let _guard = CWD_GUARD.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let mut s = HybridSearcher::new();
        s.add(input(1, "The quick brown fox"));
        s.add(input(2, "Quick foxes leap far"));
        s.add(input(3, "Something else entirely"));

        s.save("index.bm25", "index.vec").unwrap();

        let loaded = HybridSearcher::load("index.bm25", "index.vec").unwrap();

        for query in ["quick fox", "something else", "nonexistent term"] {
            assert_eq!(s.search(query, 50), loaded.search(query, 50), "query={query}");
        }
    }

    #[test]
    fn duplicate_id_appends_bm25_but_overwrites_vector_and_cache() {
        let mut s = HybridSearcher::new();
        s.add(input(1, "alpha beta"));
        s.add(input(1, "alpha beta"));
        // BM25 doc_lengths is keyed by id, so it still reports one length,
        // but postings were appended twice — doubling the term frequency
        // contribution for id 1 relative to a single ingest.
        assert_eq!(s.document_text(1), "alpha beta");
    }
}
