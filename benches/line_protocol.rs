//! Benchmarks for the client line protocol
//!
//! Covers both directions of the wire:
//! - Inbound command parsing and framing
//! - Outbound real-time (CSV and JSON) and history line encoding
//!
//! Run with: cargo bench --bench line_protocol

use std::sync::Arc;

use airsense::protocol::{LineEncoder, LineFramer, OutputFormat, parse_command};
use airsense::types::{ChannelName, Reading};
use divan::{Bencher, black_box};

fn main() {
    divan::main();
}

/// Macro to generate benchmark modules for command parsing
macro_rules! bench_command {
    ($mod_name:ident, $command:expr) => {
        mod $mod_name {
            use super::*;

            #[divan::bench(name = "parse", sample_count = 1000, sample_size = 100)]
            fn parse(bencher: Bencher) {
                bencher.bench(|| black_box(parse_command(black_box($command))));
            }
        }
    };
}

// =============================================================================
// Inbound commands
// =============================================================================

bench_command!(start_command, b"start");
bench_command!(stop_command, b"stop");
bench_command!(history_command, b"history 1700000000 1700086400");
bench_command!(unknown_command, b"GET / HTTP/1.1");

/// A burst of commands split at an awkward boundary
#[divan::bench(sample_count = 1000, sample_size = 100)]
fn framing_split_burst(bencher: Bencher) {
    let burst = b"start\r\nstop\r\nhistory 1700000000 1700086400\r\nstart\r\n";
    let (head, tail) = burst.split_at(17);
    bencher.bench(|| {
        let mut framer = LineFramer::default();
        framer.extend(black_box(head));
        framer.extend(black_box(tail));
        let mut count = 0;
        while let Some(line) = framer.next_line() {
            count += line.map_or(0, |l| l.len());
        }
        count
    });
}

// =============================================================================
// Outbound lines
// =============================================================================

fn sample_reading() -> (Arc<[ChannelName]>, Reading) {
    let channels: Arc<[ChannelName]> = ["Temp", "SN1", "SN2", "SN3", "SN4", "PM25"]
        .iter()
        .map(|n| ChannelName::new(n.to_string()).unwrap())
        .collect();
    let values = channels
        .iter()
        .cloned()
        .zip([21.5, 0.3125, 0.2871, 0.1044, 0.0937, 12.0])
        .collect();
    (channels, Reading::new(1_700_000_000, values))
}

#[divan::bench(args = [OutputFormat::Csv, OutputFormat::Json], sample_count = 1000, sample_size = 100)]
fn encode_real_time(bencher: Bencher, format: OutputFormat) {
    let (channels, reading) = sample_reading();
    let encoder = LineEncoder::new(format, channels);
    bencher.bench(|| black_box(encoder.real_time(black_box(&reading))));
}

#[divan::bench(sample_count = 1000, sample_size = 100)]
fn encode_history(bencher: Bencher) {
    let (channels, reading) = sample_reading();
    let encoder = LineEncoder::new(OutputFormat::Csv, channels);
    bencher.bench(|| black_box(encoder.history(black_box(&reading))));
}
