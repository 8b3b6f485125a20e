use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gitscope::git::parser::{parse_diffs, parse_log, parse_status};

const SMALL_STATUS: &str = "## main...origin/main [ahead 2, behind 1]\nM  README.md\n M src/lib.rs\nA  src/new.rs\n?? untracked.txt\n";

fn generate_large_status(num_files: usize) -> String {
    let mut output = String::from("## main...origin/main [ahead 2, behind 1]\n");
    for i in 0..num_files {
        output.push_str(&format!("M  src/module_{}/file_{}.rs\n", i % 20, i));
    }
    output
}

fn generate_log(num_commits: usize) -> String {
    let mut output = String::new();
    for i in 0..num_commits {
        output.push_str(&format!(
            "{:040x}|{:07x}|Author {}|author{}@example.com|Commit subject number {}|{}|{:040x}\0",
            i,
            i,
            i % 7,
            i % 7,
            i,
            1_700_000_000 + i * 60,
            i.wrapping_sub(1),
        ));
    }
    output
}

fn generate_diff(num_hunks: usize) -> String {
    let mut output = String::from("diff --git a/big.rs b/big.rs\n--- a/big.rs\n+++ b/big.rs\n");
    for i in 0..num_hunks {
        let start = i * 20 + 1;
        output.push_str(&format!("@@ -{},4 +{},5 @@\n", start, start));
        output.push_str(" context before\n-removed line\n+added line\n+another added\n context after\n context tail\n");
    }
    output
}

fn bench_status(c: &mut Criterion) {
    c.bench_function("parse_status_small", |b| {
        b.iter(|| parse_status(black_box(SMALL_STATUS)))
    });

    let mut group = c.benchmark_group("parse_status_large");
    for size in [100, 1000, 5000] {
        let input = generate_large_status(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| parse_status(black_box(input)))
        });
    }
    group.finish();
}

fn bench_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_log");
    for size in [10, 100, 1000] {
        let input = generate_log(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| parse_log(black_box(input)))
        });
    }
    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_diffs");
    for size in [1, 50, 500] {
        let input = generate_diff(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| parse_diffs(black_box(input)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_status, bench_log, bench_diff);
criterion_main!(benches);
