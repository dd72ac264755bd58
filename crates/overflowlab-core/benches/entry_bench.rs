use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use overflowlab_core::harness;
use overflowlab_core::inline::{self, StackFrame};
use overflowlab_membrane::SafetyLevel;

fn benchmark_entry_paths(c: &mut Criterion) {
    // In-bounds sizes only; the vulnerable paths are not benchmarked past 15.
    let sizes: [usize; 3] = [1, 8, 15];
    let mut group = c.benchmark_group("entry_paths");

    for size in sizes {
        let mut data = vec![b'A'; size];
        data.push(0);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("frame_copy", size), &size, |b, &_size| {
            b.iter(|| {
                let mut frame = StackFrame::new();
                // SAFETY: at most 16 bytes, inside the frame.
                unsafe { inline::process_into_frame(&mut frame, black_box(&data)) };
                black_box(frame);
            });
        });

        group.bench_with_input(BenchmarkId::new("harness", size), &size, |b, &_size| {
            b.iter(|| {
                // SAFETY: C string of at most 15 bytes fits the default sink.
                black_box(unsafe { harness::fuzz_entry(black_box(&data[..size])) });
            });
        });

        group.bench_with_input(
            BenchmarkId::new("harness_hardened", size),
            &size,
            |b, &_size| {
                b.iter(|| {
                    // SAFETY: hardened sink is bounded.
                    black_box(unsafe {
                        harness::fuzz_entry_for_mode(black_box(&data), SafetyLevel::Hardened)
                    });
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_entry_paths);
criterion_main!(benches);
