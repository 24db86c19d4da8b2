use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ebb_proto::commands::{parse_motion_status, Command};

fn benchmark_encode(c: &mut Criterion) {
    let cmd = Command::LowLevelMove {
        rate1: 120_000,
        steps1: 800,
        accel1: 48,
        rate2: 60_000,
        steps2: 400,
        accel2: 24,
        clear: 0,
    };

    c.bench_function("encode_low_level_move", |b| {
        b.iter(|| black_box(cmd.encode()));
    });
}

fn benchmark_parse(c: &mut Criterion) {
    let line = "QM,1,1,0,3";
    c.bench_function("parse_motion_status", |b| {
        b.iter(|| parse_motion_status(black_box(line)).unwrap());
    });
}

criterion_group!(benches, benchmark_encode, benchmark_parse);
criterion_main!(benches);
