// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! Process entry point: install the logger, load (or freshly create)
//! the searcher, and start serving connections on a fixed port.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use hybrid_search_engine::searcher::HybridSearcher;
use hybrid_search_engine::{server, BM25_PATH, PORT, TELEMETRY_PATH, VEC_PATH};

fn main() -> anyhow::Result<()> {
    hybrid_search_engine::logger::init();

    let searcher = match HybridSearcher::load(BM25_PATH, VEC_PATH) {
        Ok(s) => {
            log::info!("loaded existing index ({} documents)", s.doc_count());
            s
        }
        Err(e) => {
            log::warn!("no usable index on disk ({e}), starting empty");
            HybridSearcher::new()
        }
    }
    .with_telemetry(TELEMETRY_PATH);

    let searcher = Arc::new(Mutex::new(searcher));
    let addr = format!("0.0.0.0:{PORT}");

    server::run(&addr, searcher).with_context(|| format!("server failed on {addr}"))
}
