//! Throughput benchmarks

use atbench_core::core::batch::parse_commands;
use atbench_core::core::engine::{contains_marker, decode_lossy};
use atbench_core::{Transport, SimulatedTransport, SIMULATED_CHANNEL};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

fn parse_benchmark(c: &mut Criterion) {
    let text: String = (0..1000)
        .map(|i| match i % 4 {
            0 => "# comment\n".to_string(),
            1 => format!("AT+CSQ,signal {i}\n"),
            2 => "\n".to_string(),
            _ => format!("  AT+CMGS=\"+39{i:010}\"  \n"),
        })
        .collect();

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("parse_commands", |b| {
        b.iter(|| black_box(parse_commands(black_box(&text))))
    });

    group.finish();
}

fn marker_benchmark(c: &mut Criterion) {
    let mut response = "+COPS: 0,0,\"OPERATOR\",7\r\n".repeat(40).into_bytes();
    response.extend_from_slice(b"\r\n+CME ERROR: 10\r\n");

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Bytes(response.len() as u64));

    group.bench_function("decode_and_scan", |b| {
        b.iter(|| {
            let text = decode_lossy(black_box(&response));
            black_box(contains_marker(&text))
        })
    });

    group.finish();
}

fn simulator_benchmark(c: &mut Criterion) {
    let mut transport = SimulatedTransport::with_seed(42);
    transport.open(SIMULATED_CHANNEL, 115_200).unwrap();

    let mut group = c.benchmark_group("simulator");

    group.bench_function("transact", |b| {
        b.iter(|| {
            for cmd in ["AT", "ATI", "AT+CSQ", "AT+CMGS=\"+1\"", "AT+UNKNOWN"] {
                black_box(transport.transact(black_box(cmd)).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, parse_benchmark, marker_benchmark, simulator_benchmark);
criterion_main!(benches);
