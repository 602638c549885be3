//! Best-effort, single-file telemetry snapshot.
//!
//! Overwritten wholesale on every query — last-writer-wins under
//! concurrent queries is acceptable (spec.md §5). Not a dashboard and not
//! a historical log: that functionality is explicitly out of scope.

use serde::Serialize;
use std::path::Path;

const MAX_SNAPSHOT_RESULTS: usize = 50;
const SNIPPET_CHARS: usize = 100;

#[derive(Serialize)]
struct ResultSnippet {
    id: i32,
    score: f64,
    snippet: String,
}

#[derive(Serialize)]
struct DebugTree<'a> {
    tokens: &'a [String],
    ngrams: Vec<String>,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    timestamp: String,
    query: &'a str,
    latency_ms: f64,
    debug_tree: DebugTree<'a>,
    results: Vec<ResultSnippet>,
}

fn snippet_of(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let truncated: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

fn current_time() -> String {
    crate::logger::now_hms_millis()
}

/// Overwrite `path` with a snapshot of this query: its tokens, the 3-grams
/// derived from them (for debugging embedding behavior), latency, and up
/// to [`MAX_SNAPSHOT_RESULTS`] ranked results with short text snippets.
/// Write failures are swallowed — telemetry is advisory, not load-bearing.
pub fn record_query(
    path: impl AsRef<Path>,
    query: &str,
    tokens: &[String],
    results: &[(i32, f64, String)],
    latency_ms: f64,
) {
    let ngrams = tokens
        .iter()
        .flat_map(|t| {
            let chars: Vec<char> = t.chars().collect();
            chars
                .windows(3)
                .map(|w| w.iter().collect::<String>())
                .collect::<Vec<_>>()
        })
        .collect();

    let snapshot = Snapshot {
        timestamp: current_time(),
        query,
        latency_ms,
        debug_tree: DebugTree { tokens, ngrams },
        results: results
            .iter()
            .take(MAX_SNAPSHOT_RESULTS)
            .map(|(id, score, text)| ResultSnippet {
                id: *id,
                score: *score,
                snippet: snippet_of(text),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&snapshot) {
        let _ = std::fs::write(path, json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry_latest.json");
        record_query(
            &path,
            "quick fox",
            &["quick".to_string(), "fox".to_string()],
            &[(1, 1.23, "The quick brown fox".to_string())],
            4.5,
        );
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("quick fox"));
        assert!(content.contains("\"id\": 1"));
    }

    #[test]
    fn truncates_long_snippets() {
        let long_text = "x".repeat(500);
        assert!(snippet_of(&long_text).ends_with("..."));
        assert_eq!(snippet_of(&long_text).chars().count(), SNIPPET_CHARS + 3);
    }
}
