// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! The three-command line protocol: `<COMMAND> <payload-json>`, one
//! request per connection, one JSON response, then close.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::logger::ScopedTimer;
use crate::searcher::HybridSearcher;
use crate::types::InputDocument;

/// Implicit top-K applied to every `SEARCH` request.
const SEARCH_TOP_K: usize = 50;

#[derive(Deserialize)]
struct IndexPayload {
    id: i32,
    text: String,
}

#[derive(Deserialize)]
struct SearchPayload {
    query: String,
}

#[derive(Serialize)]
struct OkStatus {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn ok_response(status: &'static str) -> String {
    serde_json::to_string(&OkStatus { status }).unwrap_or_else(|_| "{}".to_string())
}

fn error_response(message: impl std::fmt::Display) -> String {
    serde_json::to_string(&ErrorBody {
        error: message.to_string(),
    })
    .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string())
}

/// Parse `"<COMMAND> <payload>"`, dispatch against the searcher (held
/// under the single process-wide gate `searcher`), and return the JSON
/// response body to write back to the connection. Never panics on
/// malformed input — every failure is converted to a JSON error object.
pub fn handle_request(raw: &str, searcher: &Mutex<HybridSearcher>) -> String {
    match dispatch(raw, searcher) {
        Ok(body) => body,
        Err(e) => error_response(e),
    }
}

fn dispatch(raw: &str, searcher: &Mutex<HybridSearcher>) -> Result<String, EngineError> {
    let (command, payload) = raw
        .split_once(' ')
        .ok_or_else(|| EngineError::Protocol("Invalid Protocol Format".to_string()))?;

    match command {
        "INDEX" => {
            let _t = ScopedTimer::new("Indexing Document");
            let doc: IndexPayload = serde_json::from_str(payload)?;
            let mut guard = searcher.lock().unwrap();
            guard.add(InputDocument {
                id: doc.id,
                text: doc.text,
            });
            log::info!("indexed doc id: {}", doc.id);
            Ok(ok_response("ok"))
        }
        "SEARCH" => {
            let _t = ScopedTimer::new("Full Search Request");
            let req: SearchPayload = serde_json::from_str(payload)?;
            log::info!("processing query: \"{}\"", req.query);
            let ids = {
                let guard = searcher.lock().unwrap();
                guard.search(&req.query, SEARCH_TOP_K)
            };
            log::info!("returning {} results", ids.len());
            Ok(serde_json::to_string(&ids)?)
        }
        "SAVE" => {
            log::info!("saving index to disk...");
            let mut guard = searcher.lock().unwrap();
            guard
                .save(crate::BM25_PATH, crate::VEC_PATH)
                .map_err(EngineError::Io)?;
            log::info!("index saved successfully");
            Ok(ok_response("saved"))
        }
        other => {
            log::warn!("unknown command received: {other}");
            Ok(error_response("unknown command"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_searcher() -> Mutex<HybridSearcher> {
        Mutex::new(HybridSearcher::new())
    }

    #[test]
    fn index_then_search_round_trip() {
        let searcher = fresh_searcher();
        let resp = handle_request(r#"INDEX {"id":1,"text":"The quick brown fox"}"#, &searcher);
        assert_eq!(resp, r#"{"status":"ok"}"#);

        let resp = handle_request(r#"SEARCH {"query":"quick fox"}"#, &searcher);
        assert_eq!(resp, "[1]");
    }

    #[test]
    fn unknown_command_is_an_error_object() {
        let searcher = fresh_searcher();
        let resp = handle_request("PING {}", &searcher);
        assert_eq!(resp, r#"{"error":"unknown command"}"#);
    }

    #[test]
    fn missing_space_is_an_error_object() {
        let searcher = fresh_searcher();
        let resp = handle_request("GARBAGE", &searcher);
        assert!(resp.contains("\"error\""));
    }

    #[test]
    fn invalid_json_payload_is_an_error_object() {
        let searcher = fresh_searcher();
        let resp = handle_request("INDEX not json", &searcher);
        assert!(resp.contains("\"error\""));
    }

    #[test]
    fn server_stays_responsive_after_a_malformed_request() {
        let searcher = fresh_searcher();
        let _ = handle_request("GARBAGE", &searcher);
        let resp = handle_request(r#"INDEX {"id":1,"text":"hello"}"#, &searcher);
        assert_eq!(resp, r#"{"status":"ok"}"#);
    }
}
