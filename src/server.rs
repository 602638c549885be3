// Copyright 2026 hybrid-search-engine contributors
// SPDX-License-Identifier: MIT
//
//! Blocking TCP server: one thread per connection, one request per
//! connection. No async runtime — the core engine does no async I/O,
//! and the protocol itself is a single read/single write/close.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::protocol;
use crate::searcher::HybridSearcher;

/// Maximum bytes read from a single connection. Requests larger than
/// this are truncated before parsing, which will generally surface as
/// a JSON parse error to the client.
const READ_BUFFER_SIZE: usize = 8192;

/// Bind `addr` and serve connections until the process is killed.
/// Every accepted connection is handed its own thread; the searcher is
/// shared behind `Arc<Mutex<_>>` so only one connection touches it at a
/// time, matching the single-threaded core's actual safety contract.
pub fn run(addr: &str, searcher: Arc<Mutex<HybridSearcher>>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    log::info!("listening on {addr}");

    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let searcher = Arc::clone(&searcher);
                thread::spawn(move || handle_connection(stream, &searcher));
            }
            Err(e) => log::warn!("failed to accept connection: {e}"),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream, searcher: &Mutex<HybridSearcher>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut buf = [0u8; READ_BUFFER_SIZE];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            log::warn!("read failed from {peer}: {e}");
            return;
        }
    };

    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s.trim_end_matches(['\r', '\n']),
        Err(_) => {
            log::warn!("non-UTF-8 request from {peer}");
            let _ = stream.write_all(br#"{"error":"invalid UTF-8"}"#);
            return;
        }
    };

    let response = protocol::handle_request(request, searcher);

    if let Err(e) = stream.write_all(response.as_bytes()) {
        log::warn!("write failed to {peer}: {e}");
    }
}
