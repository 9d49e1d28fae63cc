//! Model construction and evaluation benchmarks
//!
//! - `make_model` for each cell family and head
//! - one encoder step at a few hidden sizes
//! - hierarchical loss forward and backward

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rnnfactory::{Dictionary, Hyperparameters, Tensor, backward, make_model, manual_seed};

const N_CLASSES: usize = 1000;

/// Roughly square clustering: `sqrt(n)` clusters of `sqrt(n)` classes
fn clustered_dictionary(n_classes: usize) -> Dictionary {
    let per_cluster = (n_classes as f64).sqrt().ceil() as usize;
    let mapping = (0..n_classes)
        .map(|c| (c / per_cluster, c % per_cluster))
        .collect();
    Dictionary::new(vec![1; n_classes]).with_mapping(mapping)
}

fn tokens(batch: usize) -> Vec<usize> {
    (0..batch).map(|i| (i * 37) % N_CLASSES).collect()
}

// ===== CONSTRUCTION =====

fn bench_make_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_model");
    let dict = clustered_dictionary(N_CLASSES);

    for name in ["srn_sm", "srn_hsm", "lstm_sm", "lstm_hsm"] {
        let hp = Hyperparameters::new(name, 128).with_non_linearity("relu");
        group.bench_function(name, |b| {
            b.iter(|| make_model(black_box(&hp), black_box(&dict), None));
        });
    }
    group.finish();
}

// ===== EVALUATION =====

fn bench_cell_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_step");
    manual_seed(0);
    let dict = Dictionary::new(vec![1; N_CLASSES]);

    for n_hidden in [32, 128, 256] {
        for name in ["srn_sm", "lstm_sm"] {
            let hp = Hyperparameters::new(name, n_hidden).with_non_linearity("sigmoid");
            let Ok((model, _)) = make_model(&hp, &dict, None) else {
                continue;
            };
            let cell = model.encoder();
            let state = cell.initial_state(32);
            let batch = tokens(32);
            group.bench_with_input(BenchmarkId::new(name, n_hidden), &n_hidden, |b, _| {
                b.iter(|| cell.step(black_box(&batch), black_box(&state)));
            });
        }
    }
    group.finish();
}

fn bench_hierarchical_loss(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchical_loss");
    manual_seed(0);
    let hp = Hyperparameters::new("lstm_hsm", 128);
    let Ok((model, _)) = make_model(&hp, &clustered_dictionary(N_CLASSES), None) else {
        return;
    };
    let Some(head) = model.decoder_with_loss() else {
        return;
    };
    let hidden = Tensor::randn(&[32, 128]);
    let targets = tokens(32);

    group.bench_function("forward", |b| {
        b.iter(|| head.loss(black_box(&hidden), black_box(&targets)));
    });
    group.bench_function("forward_backward", |b| {
        b.iter(|| {
            head.trace(&hidden, &targets).and_then(|trace| {
                backward(head.graph(), &trace, head.output(), Tensor::ones(&[1]))
            })
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_make_model,
    bench_cell_step,
    bench_hierarchical_loss
);
criterion_main!(benches);
