use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use affinity_cluster::{jaccard, modularity, LabelPropagationEngine, PropagationConfig};
use affinity_graph::{BipartiteGraph, FoldedGraph, GraphFolder};
use affinity_test::{WorkloadConfig, WorkloadGenerator};

fn folded(communities: usize) -> FoldedGraph {
    let mut generator = WorkloadGenerator::new(WorkloadConfig {
        communities,
        ..WorkloadConfig::default()
    });
    let mut graph = BipartiteGraph::new();
    for event in generator.events() {
        for object in &event.objects {
            graph.increment_edge(&event.identity, *object);
        }
    }
    GraphFolder::new().fold(&graph)
}

fn bench_cluster(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_propagation");
    let engine = LabelPropagationEngine::new(PropagationConfig {
        seed: Some(1),
        ..PropagationConfig::default()
    })
    .unwrap();

    for &communities in &[4usize, 16, 64] {
        let graph = folded(communities);
        group.throughput(Throughput::Elements(graph.vertex_count() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(communities),
            &graph,
            |b, graph| b.iter(|| engine.cluster(graph).groups.len()),
        );
    }
    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");
    let graph = folded(16);
    let generator = WorkloadGenerator::new(WorkloadConfig {
        communities: 16,
        ..WorkloadConfig::default()
    });
    let planted = generator.planted();
    let engine = LabelPropagationEngine::new(PropagationConfig {
        seed: Some(1),
        ..PropagationConfig::default()
    })
    .unwrap();
    let found = engine.cluster(&graph).groups;

    group.bench_function("modularity", |b| b.iter(|| modularity(&graph, &found)));
    group.bench_function("jaccard", |b| b.iter(|| jaccard(&found, &planted)));
    group.finish();
}

criterion_group!(benches, bench_cluster, bench_metrics);
criterion_main!(benches);
