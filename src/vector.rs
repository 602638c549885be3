// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! Flat-scan vector index over deterministic hashed-character-3-gram
//! embeddings.
//!
//! This is intentionally not an approximate nearest-neighbor index: the
//! store is a `HashMap` scanned in full on every query. Swapping in a
//! graph index (HNSW, IVF, ...) is out of scope — see `DESIGN.md`.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use crate::persistence::{read_f32_vec, read_i32, read_usize, write_f32_slice, write_i32, write_usize};

pub const DIMENSION: usize = 1024;

/// Cosine scores at or below this floor are pruned from search results —
/// a fixed threshold that discards incidental matches rather than a
/// learned or configurable one.
const MIN_SCORE: f64 = 0.20;

/// Compute the distinct (per-token) character 3-grams of `tokens`, hash
/// each into `[0, DIMENSION)` with a fixed-seed hasher, and accumulate a
/// count vector, L2-normalized to unit length. Tokens shorter than 3
/// characters contribute nothing. A token's 3-grams are deduplicated
/// (set semantics) before hashing, but distinct tokens are independent —
/// a 3-gram shared by two tokens is counted for each occurrence.
///
/// The hash must be stable across runs of the same build: this uses
/// [`std::collections::hash_map::DefaultHasher`] constructed directly via
/// `::new()`, which (unlike `HashMap`'s `RandomState`-seeded default) uses
/// fixed internal keys and is therefore deterministic from run to run —
/// a requirement for both query-time embedding and save/load parity.
pub fn embed(tokens: &[String]) -> Vec<f32> {
    let mut vec = vec![0.0f32; DIMENSION];

    for token in tokens {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 3 {
            continue;
        }
        let mut grams: HashSet<String> = HashSet::new();
        for w in chars.windows(3) {
            grams.insert(w.iter().collect());
        }
        for gram in grams {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            gram.hash(&mut hasher);
            let idx = (hasher.finish() % DIMENSION as u64) as usize;
            vec[idx] += 1.0;
        }
    }

    let norm = (vec.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>()).sqrt();
    if norm > 0.0 {
        for v in &mut vec {
            *v = (*v as f64 / norm) as f32;
        }
    }
    vec
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for i in 0..a.len() {
        dot += a[i] as f64 * b[i] as f64;
        norm_a += a[i] as f64 * a[i] as f64;
        norm_b += b[i] as f64 * b[i] as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Dense-vector store keyed by doc id, scanned in full on every query.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    vectors: HashMap<i32, Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `doc_id`'s embedding. `vec` must have length
    /// [`DIMENSION`].
    pub fn add(&mut self, doc_id: i32, vec: Vec<f32>) {
        debug_assert_eq!(vec.len(), DIMENSION);
        self.vectors.insert(doc_id, vec);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine-rank every stored vector against `query`, discard scores at
    /// or below the 0.20 floor, sort descending (ties ascending by doc
    /// id), and truncate to `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(i32, f64)> {
        let mut scored: Vec<(i32, f64)> = self
            .vectors
            .iter()
            .filter_map(|(&id, vec)| {
                let score = cosine_similarity(query, vec);
                (score > MIN_SCORE).then_some((id, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(std::fs::File::create(path)?);
        write_usize(&mut w, self.vectors.len())?;
        for (&id, vec) in &self.vectors {
            write_i32(&mut w, id)?;
            write_f32_slice(&mut w, vec)?;
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut r = BufReader::new(std::fs::File::open(path)?);
        let total = read_usize(&mut r)?;
        let mut vectors = HashMap::with_capacity(total);
        for _ in 0..total {
            let id = read_i32(&mut r)?;
            let vec = read_f32_vec(&mut r, DIMENSION)?;
            vectors.insert(id, vec);
        }
        Ok(Self { vectors })
    }
}
