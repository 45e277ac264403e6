use anyhow::{Context, Result};
use dyngraph::{BatchRouter, EngineConfig, RankGraph, TemporalSampler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

const NUM_VERTICES: u64 = 1_000;
const BATCH_SIZE: usize = 5_000;
const NUM_BATCHES: usize = 8;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Dyngraph v{}", dyngraph::version());
    println!("==========================================");
    println!();

    // Optional config file as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => demo_config(),
    };
    config.validate()?;

    let mut router = BatchRouter::new(config.partition.clone())?;
    let ranks = (0..router.num_ranks())
        .map(|rank| RankGraph::new(rank, config.graph.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    println!("=== Demo 1: Streaming ingestion ===");
    let mut rng = StdRng::seed_from_u64(17);
    for step in 0..NUM_BATCHES {
        let (sources, targets, timestamps) = synthetic_batch(&mut rng, step);
        let counts = router.route_all(&ranks, &sources, &targets, &timestamps)?;
        info!("Batch {}: per-rank edges {:?}", step, counts);
    }

    let stats = router.partitioner().stats();
    println!("✓ Routed {} edges to {} ranks", router.next_edge_id(), router.num_ranks());
    println!("  edges per rank:    {:?}", stats.edge_counts);
    println!("  vertices per rank: {:?}", stats.vertex_counts);
    println!("  load factor:       {:.3}", stats.load_factor());
    for rank in &ranks {
        let graph = rank.read();
        println!(
            "  rank {}: {} edges, {} blocks, {:.2} blocks/vertex, {} bytes",
            rank.rank(),
            graph.num_edges(),
            graph.num_blocks(),
            graph.avg_linked_list_length(),
            graph.memory_usage()
        );
    }

    println!("\n=== Demo 2: Temporal sampling ===");
    let local = &ranks[0];
    let graph = local.read();
    let roots: Vec<u64> = graph.source_vertices().take(4).collect();
    let now = NUM_BATCHES as f64;
    let timestamps = vec![now; roots.len()];

    let sampler = TemporalSampler::new(&graph, config.sampler.clone())?;
    let layers = sampler.sample(&roots, &timestamps)?;
    for (layer_index, snapshots) in layers.iter().enumerate() {
        for (snapshot, layer) in snapshots.iter().enumerate() {
            println!(
                "  layer {} snapshot {}: {} dst, {} sampled, {} edges",
                layer_index,
                snapshot,
                layer.num_dst_nodes(),
                layer.num_sampled_nodes(),
                layer.num_edges()
            );
        }
    }

    Ok(())
}

fn demo_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.graph.block_size = 32;
    config.sampler.fanouts = vec![10, 5];
    config.sampler.num_snapshots = 2;
    config.sampler.snapshot_time_window = 2.0;
    config.partition.strategy = dyngraph::Strategy::Fennel;
    config.partition.num_partitions = 4;
    config
}

/// Skewed random edges; every edge of batch `step` is stamped inside
/// `[step, step + 1)` so later batches never go back in time.
fn synthetic_batch(rng: &mut StdRng, step: usize) -> (Vec<u64>, Vec<u64>, Vec<f64>) {
    let mut sources = Vec::with_capacity(BATCH_SIZE);
    let mut targets = Vec::with_capacity(BATCH_SIZE);
    let mut timestamps = Vec::with_capacity(BATCH_SIZE);
    for i in 0..BATCH_SIZE {
        let hub = rng.gen_range(0..NUM_VERTICES / 10);
        let any = rng.gen_range(0..NUM_VERTICES);
        let (src, dst) = if rng.gen_bool(0.5) { (hub, any) } else { (any, hub) };
        sources.push(src);
        targets.push(dst);
        timestamps.push(step as f64 + i as f64 / BATCH_SIZE as f64);
    }
    (sources, targets, timestamps)
}
