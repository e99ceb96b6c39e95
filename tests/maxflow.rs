/*
 * Copyright (c) 2020, 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

use rs_flow::value::approx_eq;
use rs_flow::{
    build_residual_network, maximum_flow, maximum_flow_value, minimum_cut, minimum_cut_value, Algorithm, AttrGraph,
    FlowError, FlowGraph, FlowMap, DEFAULT_CAPACITY,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::error::Error;

const ALGORITHMS: &[Algorithm] = &[
    Algorithm::EdmondsKarp,
    Algorithm::ShortestAugmentingPath { two_phase: false },
    Algorithm::ShortestAugmentingPath { two_phase: true },
    Algorithm::Dinic,
    Algorithm::PreflowPush {
        global_relabel_freq: Some(1.0),
    },
    Algorithm::PreflowPush {
        global_relabel_freq: None,
    },
    Algorithm::BoykovKolmogorov,
];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scenario_a() -> AttrGraph<char, f64> {
    let mut g = AttrGraph::directed();
    for &(u, v, c) in &[
        ('x', 'a', 3.0),
        ('x', 'b', 1.0),
        ('a', 'c', 3.0),
        ('b', 'c', 5.0),
        ('b', 'd', 4.0),
        ('d', 'e', 2.0),
        ('c', 'y', 2.0),
        ('e', 'y', 3.0),
    ] {
        g.add_edge_with(u, v, &[("capacity", c)]);
    }
    g
}

fn random_graph(seed: u64, n: usize, m: usize) -> AttrGraph<usize, i64> {
    random_graph_with(seed, n, m, true, 0.0)
}

/// A random graph whose edges have no capacity with probability `p_unbounded`.
fn random_graph_with(seed: u64, n: usize, m: usize, directed: bool, p_unbounded: f64) -> AttrGraph<usize, i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = if directed {
        AttrGraph::directed()
    } else {
        AttrGraph::undirected()
    };
    for u in 0..n {
        g.add_node(u);
    }
    for _ in 0..m {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if u == v {
            continue;
        }
        if p_unbounded > 0.0 && rng.gen_bool(p_unbounded) {
            g.add_edge(u, v);
        } else {
            g.add_edge_with(u, v, &[("capacity", rng.gen_range(0..20))]);
        }
    }
    g
}

/// Check capacity bounds and flow conservation of `flow`.
///
/// Edges of undirected graphs may carry flow in either direction.
fn check_flow(g: &AttrGraph<usize, i64>, flow: &FlowMap<usize, i64>, s: usize, t: usize, value: i64) {
    let mut balance = vec![0; g.num_nodes()];
    for (u, v, attrs) in g.edges() {
        let mut arcs = vec![(u, v)];
        if !g.is_directed() {
            arcs.push((v, u));
            assert!(flow[u][v] == 0 || flow[v][u] == 0, "flow in both directions on {{{}, {}}}", u, v);
        }
        for (x, y) in arcs {
            let f = flow[x][y];
            assert!(f >= 0, "negative flow on ({}, {})", x, y);
            if let Some(&c) = attrs.get("capacity") {
                assert!(f <= c, "capacity violated on ({}, {})", x, y);
            }
            balance[*x] -= f;
            balance[*y] += f;
        }
    }
    for (u, &b) in balance.iter().enumerate() {
        if u == s {
            assert_eq!(b, -value);
        } else if u == t {
            assert_eq!(b, value);
        } else {
            assert_eq!(b, 0, "flow not conserved at {}", u);
        }
    }
}

#[test]
fn test_scenario_a() -> Result<(), Box<dyn Error>> {
    init_logger();
    let g = scenario_a();
    for &alg in ALGORITHMS {
        let (value, flow) = maximum_flow(&g, &'x', &'y', DEFAULT_CAPACITY, alg, None)?;
        assert!(approx_eq(value, 3.0), "{:?}", alg);
        assert!(approx_eq(flow[&'x'][&'b'], 1.0), "{:?}", alg);
        assert!(approx_eq(flow[&'c'][&'y'], 2.0), "{:?}", alg);

        let mut cut = minimum_cut(&g, &'x', &'y', DEFAULT_CAPACITY, alg)?;
        cut.edges.sort();
        cut.sink_side.sort();
        assert!(approx_eq(cut.value, 3.0), "{:?}", alg);
        assert_eq!(cut.edges, vec![('c', 'y'), ('x', 'b')], "{:?}", alg);
        assert_eq!(cut.sink_side, vec!['b', 'd', 'e', 'y'], "{:?}", alg);
    }
    Ok(())
}

#[test]
fn test_unbounded() {
    init_logger();
    let mut g = AttrGraph::<u32, f64>::directed();
    g.add_edge_with(0, 1, &[("capacity", f64::INFINITY)]);
    g.add_edge_with(0, 2, &[("capacity", 1.0)]);
    for &alg in ALGORITHMS {
        assert_eq!(
            maximum_flow(&g, &0, &1, DEFAULT_CAPACITY, alg, None).err(),
            Some(FlowError::UnboundedFlow)
        );
    }

    // a missing capacity is unbounded, too
    let mut g = AttrGraph::<u32, i32>::directed();
    g.add_edge(0, 1);
    g.add_edge(1, 2);
    assert_eq!(
        maximum_flow_value(&g, &0, &2, DEFAULT_CAPACITY, Algorithm::default(), None),
        Err(FlowError::UnboundedFlow)
    );
    assert_eq!(
        minimum_cut_value(&g, &2, &0, DEFAULT_CAPACITY, Algorithm::default()),
        Ok(0)
    );
}

#[test]
fn test_large_capacities() -> Result<(), Box<dyn Error>> {
    init_logger();
    let mut g = AttrGraph::<u32, i32>::directed();
    g.add_edge_with(0, 1, &[("capacity", 1_000_000_000)]);
    g.add_edge(1, 2);
    for &alg in ALGORITHMS {
        let (value, flow) = maximum_flow(&g, &0, &2, DEFAULT_CAPACITY, alg, None)?;
        assert_eq!(value, 1_000_000_000, "{:?}", alg);
        assert_eq!(flow[&1][&2], 1_000_000_000, "{:?}", alg);

        let cut = minimum_cut(&g, &0, &2, DEFAULT_CAPACITY, alg)?;
        assert_eq!(cut.value, 1_000_000_000, "{:?}", alg);
        assert_eq!(cut.edges, vec![(0, 1)], "{:?}", alg);
    }
    Ok(())
}

#[test]
fn test_unbounded_arc_not_bottleneck() -> Result<(), Box<dyn Error>> {
    init_logger();
    // ten unit paths from 0 to 2 join the uncapacitated edge (2, 1)
    let mut g = AttrGraph::<u32, i32>::directed();
    for i in 3..13 {
        g.add_edge_with(0, i, &[("capacity", 1)]);
        g.add_edge_with(i, 2, &[("capacity", 1)]);
    }
    g.add_edge(2, 1);
    for &alg in ALGORITHMS {
        let (value, flow) = maximum_flow(&g, &0, &1, DEFAULT_CAPACITY, alg, None)?;
        assert_eq!(value, 10, "{:?}", alg);
        assert_eq!(flow[&2][&1], 10, "{:?}", alg);

        let cut = minimum_cut(&g, &0, &1, DEFAULT_CAPACITY, alg)?;
        assert_eq!(cut.value, 10, "{:?}", alg);
        assert!(!cut.edges.contains(&(2, 1)), "{:?}", alg);
    }
    Ok(())
}

#[test]
fn test_disconnected() -> Result<(), Box<dyn Error>> {
    init_logger();
    let mut g = AttrGraph::<u32, i32>::directed();
    g.add_edge_with(0, 1, &[("capacity", 4)]);
    g.add_edge_with(2, 3, &[("capacity", 5)]);
    for &alg in ALGORITHMS {
        let (value, flow) = maximum_flow(&g, &0, &3, DEFAULT_CAPACITY, alg, None)?;
        assert_eq!(value, 0);
        assert!(flow.values().flat_map(|out| out.values()).all(|&f| f == 0));

        let cut = minimum_cut(&g, &0, &3, DEFAULT_CAPACITY, alg)?;
        assert_eq!(cut.value, 0);
        assert!(cut.edges.is_empty());
    }
    Ok(())
}

#[test]
fn test_complete_graph() -> Result<(), Box<dyn Error>> {
    init_logger();
    for n in 2..8 {
        let mut g = AttrGraph::<usize, i32>::undirected();
        for u in 0..n {
            for v in u + 1..n {
                g.add_edge_with(u, v, &[("capacity", 3)]);
            }
        }
        for &alg in ALGORITHMS {
            let value = maximum_flow_value(&g, &0, &1, DEFAULT_CAPACITY, alg, None)?;
            assert_eq!(value, 3 * (n as i32 - 1), "n: {} {:?}", n, alg);
        }
    }
    Ok(())
}

#[test]
fn test_undirected_flow_map() -> Result<(), Box<dyn Error>> {
    let mut g = AttrGraph::<u32, i32>::undirected();
    g.add_edge_with(0, 1, &[("capacity", 3)]);
    g.add_edge_with(2, 1, &[("capacity", 2)]);
    let (value, flow) = maximum_flow(&g, &0, &2, DEFAULT_CAPACITY, Algorithm::default(), None)?;
    assert_eq!(value, 2);
    assert_eq!(flow[&0][&1], 2);
    assert_eq!(flow[&1][&0], 0);
    assert_eq!(flow[&1][&2], 2);
    assert_eq!(flow[&2][&1], 0);
    Ok(())
}

#[test]
fn test_random_agreement() -> Result<(), Box<dyn Error>> {
    init_logger();
    for seed in 0..20 {
        let g = random_graph(seed, 30, 150);
        let (s, t) = (0, 29);
        let expected = maximum_flow_value(&g, &s, &t, DEFAULT_CAPACITY, Algorithm::EdmondsKarp, None)?;
        for &alg in ALGORITHMS {
            let (value, flow) = maximum_flow(&g, &s, &t, DEFAULT_CAPACITY, alg, None)?;
            assert_eq!(value, expected, "seed: {} {:?}", seed, alg);
            check_flow(&g, &flow, s, t, value);

            assert_eq!(maximum_flow_value(&g, &s, &t, DEFAULT_CAPACITY, alg, None)?, expected);

            let cut = minimum_cut(&g, &s, &t, DEFAULT_CAPACITY, alg)?;
            assert_eq!(cut.value, expected, "seed: {} {:?}", seed, alg);
            let cut_sum: i64 = cut.edges.iter().map(|(u, v)| g.edge_attrs(u, v).unwrap()["capacity"]).sum();
            assert_eq!(cut_sum, expected);
            assert!(cut.source_side.contains(&s));
            assert!(cut.sink_side.contains(&t));
        }
    }
    Ok(())
}

#[test]
fn test_random_mixed() -> Result<(), Box<dyn Error>> {
    init_logger();
    let mut solved = 0;
    for seed in 0..40 {
        let g = random_graph_with(seed, 25, 100, seed % 2 == 0, 0.1);
        let (s, t) = (0, 24);
        let expected = match maximum_flow_value(&g, &s, &t, DEFAULT_CAPACITY, Algorithm::EdmondsKarp, None) {
            Err(FlowError::UnboundedFlow) => {
                for &alg in ALGORITHMS {
                    assert_eq!(
                        maximum_flow_value(&g, &s, &t, DEFAULT_CAPACITY, alg, None),
                        Err(FlowError::UnboundedFlow)
                    );
                }
                continue;
            }
            value => value?,
        };
        solved += 1;
        for &alg in ALGORITHMS {
            let (value, flow) = maximum_flow(&g, &s, &t, DEFAULT_CAPACITY, alg, None)?;
            assert_eq!(value, expected, "seed: {} {:?}", seed, alg);
            check_flow(&g, &flow, s, t, value);

            let cut = minimum_cut(&g, &s, &t, DEFAULT_CAPACITY, alg)?;
            assert_eq!(cut.value, expected, "seed: {} {:?}", seed, alg);
            let mut cut_sum = 0;
            for (u, v) in &cut.edges {
                let c = g.edge_attrs(u, v).and_then(|attrs| attrs.get("capacity").copied());
                assert!(c.is_some(), "uncapacitated edge ({}, {}) in cut", u, v);
                cut_sum += c.unwrap_or(0);
            }
            assert_eq!(cut_sum, expected, "seed: {} {:?}", seed, alg);
        }
    }
    assert!(solved > 0);
    Ok(())
}

#[test]
fn test_idempotent() -> Result<(), Box<dyn Error>> {
    let g = random_graph(42, 20, 80);
    for &alg in ALGORITHMS {
        let first = maximum_flow(&g, &0, &19, DEFAULT_CAPACITY, alg, None)?;
        let second = maximum_flow(&g, &0, &19, DEFAULT_CAPACITY, alg, None)?;
        assert_eq!(first, second, "{:?}", alg);
    }
    Ok(())
}

#[test]
fn test_cutoff() -> Result<(), Box<dyn Error>> {
    init_logger();
    for seed in 0..5 {
        let g = random_graph(seed, 30, 150);
        let full = maximum_flow_value(&g, &0, &29, DEFAULT_CAPACITY, Algorithm::Dinic, None)?;
        let cutoff = full / 2;
        for &alg in ALGORITHMS {
            let (value, flow) = maximum_flow(&g, &0, &29, DEFAULT_CAPACITY, alg, Some(cutoff))?;
            assert!(value >= cutoff && value <= full, "seed: {} {:?}", seed, alg);
            check_flow(&g, &flow, 0, 29, value);
        }
    }
    Ok(())
}

#[test]
fn test_residual_network() -> Result<(), Box<dyn Error>> {
    let g = scenario_a();
    let net = build_residual_network(&g, &'x', &'y', DEFAULT_CAPACITY, Algorithm::Dinic, None, false)?;
    assert_eq!(net.num_nodes(), 7);
    assert_eq!(net.num_arcs(), 16);
    let (x, y) = (net.source(), net.sink());
    assert_eq!(net.node(x), &'x');
    assert_eq!(net.node(y), &'y');
    assert!(approx_eq(net.excess(y), 3.0));
    assert!(approx_eq(net.excess(x), -3.0));
    Ok(())
}

#[test]
fn test_errors() {
    let mut g = AttrGraph::<u32, i32>::multi_directed();
    g.add_edge_with(0, 1, &[("capacity", 1)]);
    assert_eq!(
        maximum_flow_value(&g, &0, &1, DEFAULT_CAPACITY, Algorithm::default(), None),
        Err(FlowError::UnsupportedGraphKind("multigraphs are not supported"))
    );

    let mut g = AttrGraph::<u32, i32>::directed();
    g.add_edge_with(0, 1, &[("capacity", 1)]);
    for &alg in ALGORITHMS {
        assert!(matches!(
            maximum_flow(&g, &0, &2, DEFAULT_CAPACITY, alg, None),
            Err(FlowError::InvalidEndpoints(_))
        ));
        assert!(matches!(
            minimum_cut(&g, &1, &1, DEFAULT_CAPACITY, alg),
            Err(FlowError::InvalidEndpoints(_))
        ));
    }

    g.add_edge_with(1, 2, &[("capacity", -1)]);
    assert!(matches!(
        maximum_flow_value(&g, &0, &2, DEFAULT_CAPACITY, Algorithm::Dinic, None),
        Err(FlowError::InvalidInput(_))
    ));

    let alg = Algorithm::PreflowPush {
        global_relabel_freq: Some(-1.0),
    };
    assert!(matches!(
        maximum_flow_value(&g, &0, &1, DEFAULT_CAPACITY, alg, None),
        Err(FlowError::InvalidInput(_))
    ));
}
