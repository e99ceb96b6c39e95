/*
 * Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
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

use std::error::Error;

use rs_flow::mcf::{Pricing, DEFAULT_DEMAND, DEFAULT_WEIGHT};
use rs_flow::{
    cost_of_flow, max_flow_min_cost, maximum_flow_value, min_cost_flow, min_cost_flow_cost, Algorithm, AttrGraph,
    FlowError, NetworkSimplex, SolutionState, DEFAULT_CAPACITY,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scenario_d() -> AttrGraph<char, i64> {
    let mut g = AttrGraph::directed();
    g.add_node_with('a', &[("demand", -5)]);
    g.add_node_with('d', &[("demand", 5)]);
    g.add_edge_with('a', 'b', &[("weight", 3), ("capacity", 4)]);
    g.add_edge_with('a', 'c', &[("weight", 6), ("capacity", 10)]);
    g.add_edge_with('b', 'd', &[("weight", 1), ("capacity", 9)]);
    g.add_edge_with('c', 'd', &[("weight", 2), ("capacity", 5)]);
    g
}

/// A random transportation problem from the nodes `0..k` to `k..2k`.
fn random_problem(seed: u64, k: usize) -> AttrGraph<usize, i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = AttrGraph::directed();
    let mut total = 0;
    for u in 0..k {
        let supply = rng.gen_range(0..10);
        g.add_node_with(u, &[("demand", -supply)]);
        total += supply;
    }
    for v in k..2 * k - 1 {
        let d = total.min(rng.gen_range(0..10));
        g.add_node_with(v, &[("demand", d)]);
        total -= d;
    }
    g.add_node_with(2 * k - 1, &[("demand", total)]);
    for u in 0..k {
        for v in k..2 * k {
            g.add_edge_with(u, v, &[("weight", rng.gen_range(-5..20))]);
        }
    }
    // a few transshipment edges
    for _ in 0..k {
        let u = rng.gen_range(k..2 * k);
        let v = rng.gen_range(k..2 * k);
        if u != v {
            g.add_edge_with(u, v, &[("weight", rng.gen_range(1..5)), ("capacity", rng.gen_range(0..5))]);
        }
    }
    g
}

#[test]
fn test_scenario_d() -> Result<(), Box<dyn Error>> {
    init_logger();
    let g = scenario_d();
    let (cost, flow) = min_cost_flow(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?;
    assert_eq!(cost, 24);
    assert_eq!(flow[&'a'][&'b'], 4);
    assert_eq!(flow[&'a'][&'c'], 1);
    assert_eq!(flow[&'b'][&'d'], 4);
    assert_eq!(flow[&'c'][&'d'], 1);
    assert!(flow[&'d'].is_empty());
    assert_eq!(cost_of_flow(&g, &flow, DEFAULT_WEIGHT), 24);
    assert_eq!(min_cost_flow_cost(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?, 24);
    Ok(())
}

#[test]
fn test_scenario_d_float() -> Result<(), Box<dyn Error>> {
    let mut g = AttrGraph::<char, f64>::directed();
    g.add_node_with('a', &[("demand", -5.0)]);
    g.add_node_with('d', &[("demand", 5.0)]);
    g.add_edge_with('a', 'b', &[("weight", 3.0), ("capacity", 4.0)]);
    g.add_edge_with('a', 'c', &[("weight", 6.0), ("capacity", 10.0)]);
    g.add_edge_with('b', 'd', &[("weight", 1.0), ("capacity", 9.0)]);
    g.add_edge_with('c', 'd', &[("weight", 2.0), ("capacity", 5.0)]);
    assert_eq!(min_cost_flow_cost(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?, 24.0);
    Ok(())
}

#[test]
fn test_pricing_agreement() -> Result<(), Box<dyn Error>> {
    init_logger();
    for seed in 0..10 {
        let g = random_problem(seed, 8);
        let mut values = vec![];
        for &pricing in &[Pricing::Block, Pricing::RoundRobin, Pricing::Complete] {
            let mut spx = NetworkSimplex::new(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?;
            spx.pricing = pricing;
            assert_eq!(spx.solve(), SolutionState::Optimal, "seed: {} {:?}", seed, pricing);

            // the flow satisfies all demands and capacities
            let flow = spx.flow_map();
            let mut balance = vec![0; 16];
            for (u, v, attrs) in g.edges() {
                let f = flow[u][v];
                assert!(f >= 0);
                if let Some(&c) = attrs.get("capacity") {
                    assert!(f <= c);
                }
                balance[*u] -= f;
                balance[*v] += f;
            }
            for (u, b) in balance.into_iter().enumerate() {
                assert_eq!(Some(-b), spx.balance(&u));
            }

            assert_eq!(cost_of_flow(&g, &flow, DEFAULT_WEIGHT), spx.value());
            values.push(spx.value());
        }
        assert!(values.iter().all(|&v| v == values[0]), "seed: {} {:?}", seed, values);
    }
    Ok(())
}

#[test]
fn test_infeasible() {
    let mut g = scenario_d();
    g.set_node_attr('a', "demand", -15);
    g.set_node_attr('d', "demand", 15);
    assert!(matches!(
        min_cost_flow(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT),
        Err(FlowError::Infeasible(_))
    ));

    // demands do not sum to zero
    g.set_node_attr('d', "demand", 4);
    assert!(matches!(
        min_cost_flow(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT),
        Err(FlowError::Infeasible(_))
    ));
}

#[test]
fn test_unbounded_cost() {
    let mut g = scenario_d();
    g.add_edge_with('d', 'b', &[("weight", -2)]);
    g.add_edge_with('b', 'd', &[("weight", 1), ("capacity", 9)]);
    g.add_edge_with('d', 'a', &[("weight", -10), ("capacity", 2)]);
    // bounded negative cycle a-b-d-a
    assert_eq!(min_cost_flow_cost(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT), Ok(15));

    g.add_edge_with('c', 'b', &[("weight", -1)]);
    g.add_edge_with('b', 'c', &[("weight", 0)]);
    assert_eq!(
        min_cost_flow_cost(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT),
        Err(FlowError::UnboundedCost)
    );
}

#[test]
fn test_max_flow_min_cost() -> Result<(), Box<dyn Error>> {
    init_logger();
    let mut g = AttrGraph::<u32, i64>::directed();
    for &(u, v, c, w) in &[
        (0, 1, 6, 2),
        (0, 2, 4, 1),
        (1, 2, 3, 1),
        (1, 3, 3, 4),
        (2, 3, 5, 6),
        (2, 4, 2, 1),
        (4, 3, 2, 1),
    ] {
        g.add_edge_with(u, v, &[("capacity", c), ("weight", w)]);
    }

    let value = maximum_flow_value(&g, &0, &3, DEFAULT_CAPACITY, Algorithm::default(), None)?;
    assert_eq!(value, 10);

    let flow = max_flow_min_cost(&g, &0, &3, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?;
    assert_eq!(flow[&1][&3] + flow[&2][&3] + flow[&4][&3], value);
    assert_eq!(flow[&2][&4], 2);
    assert_eq!(flow[&4][&3], 2);
    assert_eq!(flow[&1][&3], 3);
    assert_eq!(flow[&2][&3], 5);
    assert_eq!(cost_of_flow(&g, &flow, DEFAULT_WEIGHT), 6 * 2 + 4 + 3 + 3 * 4 + 5 * 6 + 2 + 2);
    Ok(())
}

#[test]
fn test_graph_kind() {
    let mut g = AttrGraph::<u32, i64>::multi_directed();
    g.add_edge(0, 1);
    assert_eq!(
        min_cost_flow_cost(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT),
        Err(FlowError::UnsupportedGraphKind("multigraphs are not supported"))
    );

    let mut g = AttrGraph::<u32, i64>::undirected();
    g.add_edge(0, 1);
    assert!(matches!(
        max_flow_min_cost(&g, &0, &1, DEFAULT_CAPACITY, DEFAULT_WEIGHT),
        Err(FlowError::UnsupportedGraphKind(_))
    ));
}

#[test]
fn test_empty() -> Result<(), Box<dyn Error>> {
    let g = AttrGraph::<u32, i32>::directed();
    let (cost, flow) = min_cost_flow(&g, DEFAULT_DEMAND, DEFAULT_CAPACITY, DEFAULT_WEIGHT)?;
    assert_eq!(cost, 0);
    assert!(flow.is_empty());
    Ok(())
}
