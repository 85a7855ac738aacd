use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wordmem::{parse_trace, BackingStore};

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("write_read_16k", |b| {
        let mut mem = BackingStore::new("M0", 16384);
        let mut addr = 0u32;

        b.iter(|| {
            mem.write(addr, addr).unwrap();
            black_box(mem.read(addr).unwrap());
            addr = (addr + 1) % 16384;
        });
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");
    group.sample_size(50);

    let trace: String = (0..1024u32)
        .map(|i| {
            if i % 2 == 0 {
                format!("W {:#x} {:#x}\n", i, i)
            } else {
                format!("R {:#x}\n", i - 1)
            }
        })
        .collect();
    group.throughput(Throughput::Elements(1024));

    group.bench_function("parse_1024_lines", |b| {
        b.iter(|| {
            black_box(parse_trace(&trace).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_store, bench_parse);
criterion_main!(benches);
