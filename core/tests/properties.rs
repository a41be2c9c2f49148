use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use proptest::prelude::*;
use stepwise_bfs_core::{
    find_shortest_path, DirectedGraph, EventRecorder, GraphNode, NodeId, SearchEvent,
    SearchState, SearchStatus,
};

/// Random directed graph on nodes `0..n`, plus a source and target in range.
fn graph_and_query() -> impl Strategy<Value = (u64, Vec<(u64, u64)>, u64, u64)> {
    (1u64..25).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..(n as usize * 3)),
            0..n,
            0..n,
        )
    })
}

fn build(n: u64, edges: &[(u64, u64)]) -> DirectedGraph {
    let mut g = DirectedGraph::with_capacity(n as usize);
    for id in 0..n {
        g.add_node(id, format!("n{id}"));
    }
    g.load_edges(edges.iter().copied());
    g
}

/// Plain BFS distances from `source`, computed without the crate's search.
fn reference_distances(g: &DirectedGraph, source: NodeId) -> HashMap<NodeId, usize> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    dist.insert(source, 0);
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        let d = dist[&u];
        for &v in g.children(u) {
            if !dist.contains_key(&v) {
                dist.insert(v, d + 1);
                queue.push_back(v);
            }
        }
    }
    dist
}

fn start<'g>(g: &'g DirectedGraph, s: NodeId, t: NodeId) -> SearchState<'g, GraphNode<'g>> {
    find_shortest_path()
        .from(g.node(s).unwrap())
        .to(g.node(t).unwrap())
}

fn outcome(search: &SearchState<'_, GraphNode<'_>>) -> (SearchStatus, Option<Vec<NodeId>>) {
    let path = search
        .shortest_path()
        .ok()
        .map(|p| p.iter().map(|n| n.id()).collect());
    (search.status(), path)
}

fn recorded_ids(events: &[SearchEvent<GraphNode<'_>>]) -> Vec<SearchEvent<NodeId>> {
    events
        .iter()
        .map(|e| match e {
            SearchEvent::BeginSearch(n) => SearchEvent::BeginSearch(n.id()),
            SearchEvent::Reach(n) => SearchEvent::Reach(n.id()),
            SearchEvent::Expand(n) => SearchEvent::Expand(n.id()),
            SearchEvent::EndSearchSuccess(n) => SearchEvent::EndSearchSuccess(n.id()),
            SearchEvent::EndSearchFailure => SearchEvent::EndSearchFailure,
        })
        .collect()
}

fn run_recorded(g: &DirectedGraph, s: NodeId, t: NodeId, batch: usize) -> Vec<SearchEvent<NodeId>> {
    let mut recorder = EventRecorder::new();
    {
        let mut search = start(g, s, t)
            .with_expansions_per_step(batch)
            .with_listener(&mut recorder);
        search.run_to_completion().unwrap();
    }
    recorded_ids(recorder.events())
}

proptest! {
    #[test]
    fn path_length_matches_bfs_distance((n, edges, s, t) in graph_and_query()) {
        let g = build(n, &edges);
        let dist = reference_distances(&g, s);

        let mut search = start(&g, s, t);
        search.run_to_completion().unwrap();

        match dist.get(&t) {
            Some(&d) => {
                prop_assert_eq!(search.status(), SearchStatus::FoundPath);
                let path: Vec<NodeId> = search.shortest_path().unwrap().iter().map(|n| n.id()).collect();
                prop_assert_eq!(path.len() - 1, d);
                prop_assert_eq!(path[0], s);
                prop_assert_eq!(*path.last().unwrap(), t);
                for pair in path.windows(2) {
                    prop_assert!(g.has_edge(pair[0], pair[1]), "{} -> {} is not an edge", pair[0], pair[1]);
                }
            }
            None => {
                prop_assert_eq!(search.status(), SearchStatus::NoPath);
                prop_assert!(search.shortest_path().is_err());
                // Everything reachable was explored before giving up
                prop_assert_eq!(search.nodes_reached(), dist.len());
            }
        }
    }

    #[test]
    fn batch_size_does_not_change_outcome(
        (n, edges, s, t) in graph_and_query(),
        batch in 1usize..40,
    ) {
        let g = build(n, &edges);

        let mut single = start(&g, s, t);
        single.run_to_completion().unwrap();

        let mut batched = start(&g, s, t).with_expansions_per_step(batch);
        batched.run_to_completion().unwrap();

        prop_assert_eq!(outcome(&single), outcome(&batched));
        prop_assert_eq!(
            run_recorded(&g, s, t, 1),
            run_recorded(&g, s, t, batch)
        );
    }

    #[test]
    fn repeated_runs_are_identical((n, edges, s, t) in graph_and_query()) {
        let g = build(n, &edges);
        prop_assert_eq!(run_recorded(&g, s, t, 1), run_recorded(&g, s, t, 1));
    }

    #[test]
    fn each_node_reached_and_expanded_at_most_once((n, edges, s, t) in graph_and_query()) {
        let g = build(n, &edges);
        let mut recorder = EventRecorder::new();
        let reached_count;
        let expanded_count;
        {
            let mut search = start(&g, s, t).with_listener(&mut recorder);
            search.run_to_completion().unwrap();
            reached_count = search.nodes_reached();
            expanded_count = search.nodes_expanded();
        }
        let events = recorded_ids(recorder.events());

        let mut reached = HashSet::new();
        let mut expanded = HashSet::new();
        for e in &events {
            match e {
                SearchEvent::Reach(id) => prop_assert!(reached.insert(*id), "reached {} twice", id),
                SearchEvent::Expand(id) => {
                    prop_assert!(reached.contains(id), "expanded {} before reaching it", id);
                    prop_assert!(expanded.insert(*id), "expanded {} twice", id);
                }
                _ => {}
            }
        }
        prop_assert_eq!(reached.len(), reached_count);
        prop_assert_eq!(expanded.len(), expanded_count);

        let terminal: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::EndSearchSuccess(_) | SearchEvent::EndSearchFailure))
            .collect();
        prop_assert_eq!(terminal.len(), 1);
        prop_assert!(matches!(events.last(), Some(SearchEvent::EndSearchSuccess(_) | SearchEvent::EndSearchFailure)));
    }

    #[test]
    fn zero_budget_slices_reach_same_result((n, edges, s, t) in graph_and_query()) {
        let g = build(n, &edges);

        let mut whole = start(&g, s, t);
        whole.run_to_completion().unwrap();

        let mut sliced = start(&g, s, t);
        while !sliced.is_complete() {
            sliced.run_for(Duration::ZERO).unwrap();
        }

        prop_assert_eq!(outcome(&whole), outcome(&sliced));
    }
}
