//! Fanbuf - fan-out benchmark
//!
//! One producer thread writes fixed-size chunks, N cursor threads drain the
//! stream to end-of-stream, and every reader must see the exact byte count.
//!
//! Environment:
//! - `FANBUF_READERS` - cursor threads (default: 8)
//! - `FANBUF_CHUNK`   - bytes per write (default: 64)
//! - `FANBUF_CHUNKS`  - writes per run (default: 100000)
//! - `RUST_LOG`       - log filter, e.g. `fanbuf=debug`

use std::env;
use std::str::FromStr;
use std::thread;
use std::time::Instant;

use fanbuf::{Cursor, Stream, StreamConfig, StreamError};
use log::{info, warn};

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn main() {
    env_logger::init();

    println!("🚀 Fanbuf - Fan-Out Byte Stream");
    println!("==============================\n");

    let readers: usize = env_or("FANBUF_READERS", 8);
    let chunk: usize = env_or("FANBUF_CHUNK", 64);
    let chunks: usize = env_or("FANBUF_CHUNKS", 100_000);
    info!(
        "readers={} chunk={}B chunks={}",
        readers, chunk, chunks
    );

    if let Err(e) = benchmark_fan_out(readers, chunk, chunks) {
        eprintln!("❌ fan-out benchmark failed: {}", e);
        std::process::exit(1);
    }

    benchmark_write_snapshot(chunk, chunks);

    println!("\n✅ All benchmarks complete!");
}

/// Drain a cursor to end-of-stream, returning the bytes seen.
fn drain(mut cursor: Cursor) -> Result<usize, StreamError> {
    let mut buf = [0u8; 4096];
    let mut total = 0;
    loop {
        match cursor.read(&mut buf) {
            Ok(n) => total += n,
            Err(e) if e.is_end_of_stream() => return Ok(total),
            Err(e) => return Err(e),
        }
    }
}

fn benchmark_fan_out(readers: usize, chunk: usize, chunks: usize) -> Result<(), StreamError> {
    println!("📊 Fan-Out ({} readers)", readers);
    println!("------------------------");

    let expected = chunk * chunks;
    let stream = Stream::with_config(StreamConfig::new().initial_capacity(expected));
    let payload = vec![0xA5u8; chunk];

    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let cursor = stream.cursor();
            thread::spawn(move || drain(cursor))
        })
        .collect();

    let start = Instant::now();
    for _ in 0..chunks {
        stream.write(&payload)?;
    }
    stream.close()?;
    let write_duration = start.elapsed();

    for handle in handles {
        let seen = match handle.join() {
            Ok(result) => result?,
            Err(_) => {
                eprintln!("  reader thread panicked");
                continue;
            }
        };
        if seen != expected {
            warn!("reader saw {} of {} bytes", seen, expected);
        }
    }
    let total_duration = start.elapsed();

    let write_ns = write_duration.as_nanos() as f64 / chunks as f64;

    println!("  Chunk size: {} bytes", chunk);
    println!("  Writes: {}", chunks);
    println!(
        "  Write latency: {:.2} ns/op ({:.3} μs/op)",
        write_ns,
        write_ns / 1000.0
    );
    println!(
        "  Delivered: {:.2} MB/sec across all readers",
        (expected * readers) as f64 / total_duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_write_snapshot(chunk: usize, chunks: usize) {
    println!("\n📊 Write + Snapshot (no readers)");
    println!("--------------------------------");

    let stream = Stream::new();
    let payload = vec![0u8; chunk];

    let start = Instant::now();
    for _ in 0..chunks {
        // Nobody can close this stream, so writes cannot fail.
        let _ = stream.write(&payload);
    }
    let write_duration = start.elapsed();

    let start = Instant::now();
    let copy = stream.snapshot();
    let snapshot_duration = start.elapsed();

    let capacity = stream.capacity();
    stream.reset();

    println!(
        "  Write latency: {:.2} ns/op",
        write_duration.as_nanos() as f64 / chunks as f64
    );
    println!(
        "  Snapshot: {} bytes in {:.3} ms",
        copy.len(),
        snapshot_duration.as_secs_f64() * 1000.0
    );
    println!(
        "  After reset: len={} capacity={} (was {})",
        stream.len(),
        stream.capacity(),
        capacity
    );
}
