use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rolling_logger::{
    Destination, FileOutput, LogEntry, Logger, MetadataFormatter, RotatingFileWriter,
    WriterSettings,
};
use log::{Level, LevelFilter};
use std::time::Instant;
use tempfile::tempdir;

const ITERATIONS: usize = 20_000;

fn settings(root: &std::path::Path) -> WriterSettings {
    WriterSettings::builder()
        .root_directory(root)
        .max_file_size(256 * 1024)
        .file_size_to_open(128 * 1024)
        .max_file_count(3)
        .build()
        .unwrap()
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("File Writer");
    group.sample_size(10); // Fewer samples due to I/O operations

    group.bench_function("append_with_rotation", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let writer = RotatingFileWriter::new(settings(dir.path())).unwrap();

            let enqueue_start = Instant::now();
            for i in 0..ITERATIONS {
                writer.append(format!("Test perf: iteration={i}, payload=CPU: 95%, Memory: 2.5GB"));
            }
            let enqueue_duration = enqueue_start.elapsed();
            writer.flush().unwrap();
            let total_duration = enqueue_start.elapsed();

            println!("\nAppend ({} entries):", ITERATIONS);
            println!("Caller-side enqueue: {:?}", enqueue_duration);
            println!("Until on disk: {:?}", total_duration);
            println!(
                "Throughput: {:.2} thousand entries/sec",
                ITERATIONS as f64 / total_duration.as_secs_f64() / 1_000.0
            );

            black_box(writer.list_files().len())
        });
    });

    group.bench_function("pipeline_to_file", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let file = FileOutput::new(LevelFilter::Info, settings(dir.path())).unwrap();
            let logger =
                Logger::new().destination(Destination::new(file).formatter(MetadataFormatter));

            for i in 0..ITERATIONS {
                let entry = LogEntry::new(Level::Info, "bench", format!("iteration={i}"))
                    .with_location("benches/append_bench.rs", "bench", 60);
                logger.log_entry(&entry);
            }
            logger.flush_outputs();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_append);
criterion_main!(benches);
