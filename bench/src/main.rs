use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use stepwise_bfs_core::{
    try_search, DirectedGraph, GraphNode, NodeId, SearchConfig, SearchState, SearchStatus,
    TracingListener,
};
use tracing_subscriber::EnvFilter;

/// Time-sliced vs. run-to-completion shortest path search on generated graphs.
#[derive(Debug, Parser)]
#[command(name = "stepwise-bfs-bench", version)]
struct Cli {
    /// Graph topology to generate.
    #[arg(value_enum, default_value_t = Topology::Random)]
    topology: Topology,

    /// Number of nodes to generate.
    #[arg(long, env = "STEPWISE_BFS_NODES", default_value_t = 1_000_000)]
    nodes: u64,

    /// Expansion rounds per step (minimum 1).
    #[arg(long, env = "STEPWISE_BFS_EXPANSIONS", default_value_t = 10)]
    expansions_per_step: usize,

    /// Wall-clock budget of each time slice, in milliseconds.
    #[arg(long, env = "STEPWISE_BFS_BUDGET_MS", default_value_t = 250)]
    budget_ms: u64,

    /// Seed for graph generation and endpoint selection.
    #[arg(long, env = "STEPWISE_BFS_SEED", default_value_t = 42)]
    seed: u64,

    /// Source node id. Random if omitted.
    #[arg(long)]
    source: Option<NodeId>,

    /// Target node id. Random if omitted.
    #[arg(long)]
    target: Option<NodeId>,

    /// Log every search event at trace level (use with RUST_LOG=trace).
    #[arg(long)]
    trace_events: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Topology {
    /// Uniform random arcs, 6 per node
    Random,
    /// Fractal branching tree (deep paths)
    Lsystem,
    /// Preferential attachment via edge sampling (hub-and-spoke)
    Scalefree,
    /// Watts-Strogatz ring lattice + shortcuts
    Smallworld,
    /// Two dense cliques connected by a thin bridge
    Barbell,
    /// Diffusion-limited aggregation (organic branching)
    Dla,
    /// Every topology above
    All,
}

impl Topology {
    fn generators(self) -> Vec<(&'static str, Generator)> {
        match self {
            Topology::Random => vec![("Erdos-Renyi random", gen_random as Generator)],
            Topology::Lsystem => vec![("L-system tree", gen_lsystem)],
            Topology::Scalefree => vec![("Scale-free (edge sampling)", gen_scale_free)],
            Topology::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
            Topology::Barbell => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
            Topology::Dla => vec![("DLA (organic branching)", gen_dla)],
            Topology::All => vec![
                ("Erdos-Renyi random", gen_random as Generator),
                ("L-system tree", gen_lsystem),
                ("Scale-free (edge sampling)", gen_scale_free),
                ("Small-world (Watts-Strogatz)", gen_small_world),
                ("Barbell (clique-bridge-clique)", gen_barbell),
                ("DLA (organic branching)", gen_dla),
            ],
        }
    }
}

type Generator = fn(u64, &mut FastRng) -> DirectedGraph;

#[derive(Debug, Serialize)]
struct BenchReport {
    topology: &'static str,
    node_count: usize,
    edge_count: usize,
    memory_mb: f64,
    generate_ms: f64,
    source: NodeId,
    target: NodeId,
    expansions_per_step: usize,
    budget_ms: u64,
    sliced: RunReport,
    complete: RunReport,
}

#[derive(Debug, Serialize)]
struct RunReport {
    status: SearchStatus,
    /// Node ids from source to target; absent when the target is unreachable.
    path: Option<Vec<NodeId>>,
    nodes_reached: usize,
    nodes_expanded: usize,
    /// Number of `run_for` calls; 1 for a run-to-completion.
    slices: usize,
    duration_ms: f64,
}

impl RunReport {
    fn from_search(search: &SearchState<'_, GraphNode<'_>>, slices: usize, elapsed: Duration) -> Self {
        let path = search
            .shortest_path()
            .ok()
            .map(|p| p.iter().map(|n| n.id()).collect());
        Self {
            status: search.status(),
            path,
            nodes_reached: search.nodes_reached(),
            nodes_expanded: search.nodes_expanded(),
            slices,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    fn print(&self, heading: &str) {
        println!("{heading}:");
        match &self.path {
            Some(p) => {
                let ids: Vec<String> = p.iter().map(|id| id.to_string()).collect();
                println!("  Path: [{}] ({} hops)", ids.join(", "), p.len() - 1);
            }
            None => println!("  Target not reachable."),
        }
        println!(
            "  Reached {} nodes, expanded {}, {} slice(s)",
            self.nodes_reached, self.nodes_expanded, self.slices
        );
        println!("  Duration: {:.1} milliseconds.", self.duration_ms);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.nodes >= 2, "--nodes must be at least 2");

    let mut reports = Vec::new();
    for (name, generator) in cli.topology.generators() {
        let report = run_benchmark(&cli, name, generator)
            .with_context(|| format!("benchmark '{name}' failed"))?;
        if !cli.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn run_benchmark(cli: &Cli, name: &'static str, generator: Generator) -> anyhow::Result<BenchReport> {
    let mut rng = FastRng::new(cli.seed);
    tracing::info!(topology = name, nodes = cli.nodes, "building graph");

    let t = Instant::now();
    let graph = generator(cli.nodes, &mut rng);
    let generate_ms = t.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        elapsed_ms = generate_ms,
        "graph built"
    );

    let node_count = graph.node_count() as u64;
    let source = cli.source.unwrap_or_else(|| rng.next(node_count));
    let target = cli.target.unwrap_or_else(|| rng.next(node_count));
    let config = SearchConfig::new(cli.expansions_per_step);
    let budget = Duration::from_millis(cli.budget_ms);

    // Time-sliced: yield back here every `budget`.
    let t = Instant::now();
    let mut search = new_search(&graph, source, target, config, cli.trace_events)?;
    let mut slices = 0;
    while !search.is_complete() {
        search.run_for(budget)?;
        slices += 1;
        tracing::info!(
            slice = slices,
            reached = search.nodes_reached(),
            frontier = search.frontier_len(),
            "time slice elapsed"
        );
    }
    let sliced = RunReport::from_search(&search, slices, t.elapsed());

    // Same query in one go.
    let t = Instant::now();
    let mut search = new_search(&graph, source, target, config, cli.trace_events)?;
    search.run_to_completion()?;
    let complete = RunReport::from_search(&search, 1, t.elapsed());

    if sliced.path.as_ref().map(Vec::len) != complete.path.as_ref().map(Vec::len) {
        tracing::warn!(
            sliced = ?sliced.path,
            complete = ?complete.path,
            "time-sliced and complete runs disagree on path length"
        );
    }

    Ok(BenchReport {
        topology: name,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        memory_mb: graph.memory_usage() as f64 / 1_048_576.0,
        generate_ms,
        source,
        target,
        expansions_per_step: config.expansions_per_step,
        budget_ms: cli.budget_ms,
        sliced,
        complete,
    })
}

fn new_search<'g>(
    graph: &'g DirectedGraph,
    source: NodeId,
    target: NodeId,
    config: SearchConfig,
    trace_events: bool,
) -> anyhow::Result<SearchState<'g, GraphNode<'g>>> {
    let mut search = try_search(graph.node(source), graph.node(target))
        .with_context(|| format!("cannot search {source} → {target}"))?
        .with_config(config);
    if trace_events {
        search.add_listener(TracingListener);
    }
    Ok(search)
}

fn print_report(report: &BenchReport) {
    println!("--- {} ---", report.topology);
    println!(
        "Generated in {:.2}s — {} nodes, {} edges, ~{:.0}MB",
        report.generate_ms / 1000.0,
        report.node_count,
        report.edge_count,
        report.memory_mb
    );
    println!();
    println!("Source: {}", report.source);
    println!("Target: {}", report.target);
    println!(
        "Expansions per step: {}, slice budget: {}ms",
        report.expansions_per_step, report.budget_ms
    );
    println!();
    report.sliced.print("Time-sliced search");
    report.complete.print("Search to completion");
    println!();
}

// ---------------------------------------------------------------------------
// Generators — all O(n) or O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

const ARCS_PER_NODE: u64 = 6;

fn add_concepts(graph: &mut DirectedGraph, ids: std::ops::Range<u64>, label: &str) {
    for id in ids {
        graph.add_node(id, label);
    }
}

/// Uniform random arcs: `ARCS_PER_NODE * n` arcs between uniformly chosen
/// endpoints. Baseline topology with no structure.
fn gen_random(node_count: u64, rng: &mut FastRng) -> DirectedGraph {
    let mut graph = DirectedGraph::with_capacity(node_count as usize);
    add_concepts(&mut graph, 0..node_count, "Node");

    for _ in 0..node_count * ARCS_PER_NODE {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        graph.add_edge(from, to);
    }

    graph
}

/// L-system fractal tree: each node spawns 3 children. Deep paths with
/// exponential width; a random pair is usually unreachable (tree edges only
/// point away from the root).
fn gen_lsystem(node_count: u64, _rng: &mut FastRng) -> DirectedGraph {
    let mut graph = DirectedGraph::with_capacity(node_count as usize);
    let branching = 3u64;
    graph.add_node(0, "Root");

    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching as usize);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                let child = next_id;
                next_id += 1;
                graph.add_node(child, "Branch");
                graph.add_edge(parent, child);
                next_frontier.push(child);
            }
        }
        frontier = next_frontier;
    }

    graph
}

/// Scale-free via edge-list sampling. New nodes link to endpoints of random
/// existing edges, so high-degree nodes attract more links.
fn gen_scale_free(node_count: u64, rng: &mut FastRng) -> DirectedGraph {
    let edges_per_node = 10u64;
    let mut graph = DirectedGraph::with_capacity(node_count as usize);
    let mut edge_endpoints: Vec<u64> =
        Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    // Seed: small clique, both directions
    let seed = 5u64.min(node_count);
    add_concepts(&mut graph, 0..seed, "Node");
    for i in 0..seed {
        for j in (i + 1)..seed {
            graph.add_edge(i, j);
            graph.add_edge(j, i);
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        graph.add_node(new_node, "Node");
        for _ in 0..edges_per_node.min(new_node) {
            let idx = rng.next(edge_endpoints.len() as u64) as usize;
            let target = edge_endpoints[idx];
            if target != new_node {
                graph.add_edge(new_node, target);
                graph.add_edge(target, new_node);
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    graph
}

/// Small-world (Watts-Strogatz): ring lattice to the K next nodes, each arc
/// rewired to a random node with probability p.
fn gen_small_world(node_count: u64, rng: &mut FastRng) -> DirectedGraph {
    let k = 10u64;
    let p = 0.05f64;
    let mut graph = DirectedGraph::with_capacity(node_count as usize);
    add_concepts(&mut graph, 0..node_count, "Node");

    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            if rng.next_f64() < p {
                let rewired = rng.next(node_count);
                graph.add_edge(i, if rewired != i { rewired } else { neighbor });
            } else {
                graph.add_edge(i, neighbor);
            }
        }
    }

    graph
}

/// Barbell: two random cliques joined by a one-way chain of 10 bridge nodes.
/// Anything in B → anything in A is unreachable.
fn gen_barbell(node_count: u64, rng: &mut FastRng) -> DirectedGraph {
    let bridge_len = 10u64.min(node_count / 2);
    let clique_size = (node_count - bridge_len) / 2;
    let mut graph = DirectedGraph::with_capacity(node_count as usize);

    let link_clique = |graph: &mut DirectedGraph, rng: &mut FastRng, base: u64| {
        for i in 0..clique_size {
            for _ in 0..20u64.min(clique_size.saturating_sub(1)) {
                let target = rng.next(clique_size);
                if target != i {
                    graph.add_edge(base + i, base + target);
                }
            }
        }
    };

    add_concepts(&mut graph, 0..clique_size, "ClusterA");
    link_clique(&mut graph, &mut *rng, 0);

    let bridge_start = clique_size;
    for i in 0..bridge_len {
        let id = bridge_start + i;
        graph.add_node(id, "Bridge");
        let prev = if i == 0 { clique_size.saturating_sub(1) } else { id - 1 };
        graph.add_edge(prev, id);
    }

    let b_start = bridge_start + bridge_len;
    add_concepts(&mut graph, b_start..b_start + clique_size, "ClusterB");
    if bridge_len > 0 && clique_size > 0 {
        graph.add_edge(b_start - 1, b_start);
    }
    link_clique(&mut graph, &mut *rng, b_start);

    graph
}

/// DLA (diffusion-limited aggregation): each new node links to a recent
/// "surface" node, with an occasional second link to any older node.
fn gen_dla(node_count: u64, rng: &mut FastRng) -> DirectedGraph {
    let mut graph = DirectedGraph::with_capacity(node_count as usize);
    graph.add_node(0, "Seed");

    let surface_max = 10_000usize;
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for new_node in 1..node_count {
        graph.add_node(new_node, "Node");

        let attach_to = surface[rng.next(surface.len() as u64) as usize];
        graph.add_edge(new_node, attach_to);
        graph.add_edge(attach_to, new_node);

        // 10% chance of a one-way shortcut to an older node
        if rng.next(10) == 0 && new_node > 1 {
            let other = rng.next(new_node);
            if other != attach_to {
                graph.add_edge(new_node, other);
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all(graph: &DirectedGraph, source: NodeId, target: NodeId) -> (SearchStatus, usize) {
        let mut search = new_search(graph, source, target, SearchConfig::new(7), false).unwrap();
        search.run_to_completion().unwrap();
        let hops = search.shortest_path().map(|p| p.len() - 1).unwrap_or(usize::MAX);
        (search.status(), hops)
    }

    #[test]
    fn test_generators_produce_requested_nodes() {
        for (name, generator) in Topology::All.generators() {
            let graph = generator(500, &mut FastRng::new(1));
            assert_eq!(graph.node_count(), 500, "{name}");
            assert!(graph.edge_count() > 0, "{name}");
        }
    }

    #[test]
    fn test_generators_are_deterministic() {
        for (name, generator) in Topology::All.generators() {
            let a = generator(300, &mut FastRng::new(9));
            let b = generator(300, &mut FastRng::new(9));
            assert_eq!(a.edge_count(), b.edge_count(), "{name}");
            for id in 0..300 {
                assert_eq!(a.children(id), b.children(id), "{name} node {id}");
            }
        }
    }

    #[test]
    fn test_lsystem_root_reaches_last_leaf() {
        let graph = gen_lsystem(40, &mut FastRng::new(0));
        // 0 → 1..=3 → 4..=12 → 13..=39
        let (status, hops) = run_all(&graph, 0, 39);
        assert_eq!(status, SearchStatus::FoundPath);
        assert_eq!(hops, 3);

        let (status, _) = run_all(&graph, 39, 0);
        assert_eq!(status, SearchStatus::NoPath);
    }

    #[test]
    fn test_barbell_is_one_way() {
        let graph = gen_barbell(110, &mut FastRng::new(3));
        let (status, _) = run_all(&graph, 109, 0);
        assert_eq!(status, SearchStatus::NoPath);
        // Last node of A through the bridge into B
        let (status, hops) = run_all(&graph, 49, 60);
        assert_eq!(status, SearchStatus::FoundPath);
        assert_eq!(hops, 11);
    }

    #[test]
    fn test_new_search_rejects_unknown_node() {
        let graph = gen_lsystem(10, &mut FastRng::new(0));
        let err = new_search(&graph, 0, 99, SearchConfig::default(), false)
            .err()
            .unwrap();
        assert!(err.to_string().contains("0 → 99"));
    }

    #[test]
    fn test_benchmark_report_round_trip() {
        let cli = Cli::parse_from([
            "stepwise-bfs-bench",
            "lsystem",
            "--nodes",
            "200",
            "--source",
            "0",
            "--target",
            "150",
            "--budget-ms",
            "0",
        ]);
        let report = run_benchmark(&cli, "L-system tree", gen_lsystem).unwrap();
        assert_eq!(report.sliced.status, SearchStatus::FoundPath);
        assert_eq!(report.sliced.path, report.complete.path);
        assert!(report.sliced.slices >= 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sliced"]["status"], "found_path");
        assert_eq!(json["expansions_per_step"], 10);
    }
}
