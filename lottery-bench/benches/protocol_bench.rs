//! Framing and batching benchmarks.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lottery_protocol::{encode_message, split_into_chunks, Batcher, FrameDecoder, WinnerList};

fn create_records(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("Nombre{i},Apellido{i},{},1990-01-01,{}", 20_000_000 + i, i % 10_000))
        .collect()
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for size in [100, 1000, 10000] {
        let payload = Bytes::from("x".repeat(size));

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(encode_message(payload).unwrap()));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for size in [100, 1000, 10000] {
        let encoded = encode_message("x".repeat(size).as_bytes()).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut decoder = FrameDecoder::new();
                decoder.extend(encoded);
                black_box(decoder.decode_frame().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_frame_decode_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode_stream");

    // A full upload arriving in 1 KiB slices
    let mut stream = Vec::new();
    for chunk in split_into_chunks(create_records(1000), 100, "1") {
        stream.extend_from_slice(&encode_message(chunk.as_bytes()).unwrap());
    }
    stream.extend_from_slice(&encode_message(b"").unwrap());

    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("1k_bets", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            let mut frames = 0;
            for slice in stream.chunks(1024) {
                decoder.extend(slice);
                while let Some(frame) = decoder.decode_frame().unwrap() {
                    black_box(&frame);
                    frames += 1;
                }
            }
            black_box(frames)
        });
    });

    group.finish();
}

fn bench_batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching");

    let records = create_records(10_000);
    for max in [10, 100, 1000] {
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(max), &max, |b, &max| {
            b.iter(|| black_box(Batcher::new(&records, max, "1").count()));
        });
    }

    group.finish();
}

fn bench_winner_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("winner_parse");

    for count in [1, 100, 10000] {
        let payload = (0..count)
            .map(|i| (30_000_000 + i).to_string())
            .collect::<Vec<_>>()
            .join(",");

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &payload, |b, payload| {
            b.iter(|| black_box(WinnerList::parse(payload.as_bytes()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_frame_decode_stream,
    bench_batching,
    bench_winner_parse,
);

criterion_main!(benches);
