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

//! Minimum Cost Flow algorithms.
//!
//! Node demands are negative for supply nodes and positive for demand
//! nodes and must sum to zero. Missing demands and costs are zero, missing
//! capacities are unbounded.
//!
//! # Example
//!
//! ```
//! use rs_flow::{cost_of_flow, min_cost_flow, AttrGraph};
//!
//! let mut g = AttrGraph::<char, i32>::directed();
//! g.add_node_with('a', &[("demand", -5)]);
//! g.add_node_with('d', &[("demand", 5)]);
//! g.add_edge_with('a', 'b', &[("weight", 3), ("capacity", 4)]);
//! g.add_edge_with('a', 'c', &[("weight", 6), ("capacity", 10)]);
//! g.add_edge_with('b', 'd', &[("weight", 1), ("capacity", 9)]);
//! g.add_edge_with('c', 'd', &[("weight", 2), ("capacity", 5)]);
//!
//! let (cost, flow) = min_cost_flow(&g, "demand", "capacity", "weight").unwrap();
//! assert_eq!(cost, 24);
//! assert_eq!(flow[&'a'][&'b'], 4);
//! assert_eq!(flow[&'a'][&'c'], 1);
//! assert_eq!(cost_of_flow(&g, &flow, "weight"), 24);
//! ```

use crate::error::{FlowError, Result};
use crate::graph::{Attributes, FlowGraph};
use crate::maxflow::{maximum_flow_value, Algorithm};
use crate::num::traits::Zero;
use crate::residual::FlowMap;

use log::debug;

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

pub mod simplex;
pub use simplex::{NetworkSimplex, Pricing};

/// Default name of the node demand attribute.
pub const DEFAULT_DEMAND: &str = "demand";

/// Default name of the edge cost attribute.
pub const DEFAULT_WEIGHT: &str = "weight";

#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolutionState {
    /// Unknown state, the problem has not been solved, yet
    Unknown,
    /// The problem has been solved to optimality
    Optimal,
    /// The problem is infeasible
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

fn check_state(state: SolutionState) -> Result<()> {
    match state {
        SolutionState::Optimal => Ok(()),
        SolutionState::Unbounded => Err(FlowError::UnboundedCost),
        SolutionState::Infeasible | SolutionState::Unknown => {
            Err(FlowError::Infeasible("no flow satisfies all node demands".to_string()))
        }
    }
}

/// Compute a minimum cost flow satisfying all node demands.
///
/// Returns the cost of the flow and the flow on each edge.
///
/// # Errors
///
/// - [`FlowError::UnsupportedGraphKind`] if `g` is undirected or a multigraph,
/// - [`FlowError::Infeasible`] if the demands do not sum to zero, some
///   capacity is negative or no flow satisfies the demands,
/// - [`FlowError::InvalidInput`] if some demand or cost is infinite,
/// - [`FlowError::UnboundedCost`] if there is a negative cost cycle of
///   unbounded capacity.
pub fn min_cost_flow<'a, G>(
    g: &'a G,
    demand: &str,
    capacity: &str,
    weight: &str,
) -> Result<(G::Value, FlowMap<G::Node, G::Value>)>
where
    G: FlowGraph<'a>,
{
    let mut spx = NetworkSimplex::new(g, demand, capacity, weight)?;
    check_state(spx.solve())?;
    Ok((spx.value(), spx.flow_map()))
}

/// Return the cost of a minimum cost flow satisfying all node demands.
///
/// See [`min_cost_flow`] for the possible errors.
pub fn min_cost_flow_cost<'a, G>(g: &'a G, demand: &str, capacity: &str, weight: &str) -> Result<G::Value>
where
    G: FlowGraph<'a>,
{
    let mut spx = NetworkSimplex::new(g, demand, capacity, weight)?;
    check_state(spx.solve())?;
    Ok(spx.value())
}

/// Compute a maximum `src`-`snk` flow of minimum cost.
///
/// Node demands of `g` are ignored.
///
/// # Errors
///
/// Besides the errors of [`min_cost_flow`] this fails with
/// [`FlowError::InvalidEndpoints`] or [`FlowError::UnboundedFlow`] if the
/// maximum flow cannot be computed.
pub fn max_flow_min_cost<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    weight: &str,
) -> Result<FlowMap<G::Node, G::Value>>
where
    G: FlowGraph<'a>,
{
    let mut spx = NetworkSimplex::new(g, DEFAULT_DEMAND, capacity, weight)?;
    let value = maximum_flow_value(g, src, snk, capacity, Algorithm::default(), None)?;
    debug!("Maximum flow value {} from {:?} to {:?}", value, src, snk);

    spx.clear_balances();
    spx.set_balance(src, value);
    spx.set_balance(snk, -value);
    check_state(spx.solve())?;
    Ok(spx.flow_map())
}

/// Return the cost of `flow` on `g`.
///
/// Edges without flow or without cost do not contribute.
pub fn cost_of_flow<'a, G>(g: &'a G, flow: &FlowMap<G::Node, G::Value>, weight: &str) -> G::Value
where
    G: FlowGraph<'a>,
{
    let mut cost = G::Value::zero();
    for u in g.nodes() {
        let out = match flow.get(u) {
            Some(out) => out,
            None => continue,
        };
        for (v, attrs) in g.out_edges(u) {
            if let (Some(&f), Some(w)) = (out.get(v), attrs.attr(weight)) {
                cost += f * w;
            }
        }
    }
    cost
}
