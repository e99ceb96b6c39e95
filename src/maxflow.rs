/*
 * Copyright (c) 2015-2022 Frank Fischer <frank-fischer@shadow-soft.de>
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

//! Maximum flow and minimum cut algorithms.
//!
//! Each function builds a fresh [`ResidualNetwork`] from the input graph,
//! checks that the flow is bounded and runs the selected [`Algorithm`].
//! The input graph is never modified.
//!
//! # Example
//!
//! ```
//! use rs_flow::{maximum_flow, minimum_cut, Algorithm, AttrGraph};
//!
//! let mut g = AttrGraph::<&str, i32>::directed();
//! g.add_edge_with("x", "a", &[("capacity", 3)]);
//! g.add_edge_with("x", "b", &[("capacity", 1)]);
//! g.add_edge_with("a", "c", &[("capacity", 3)]);
//! g.add_edge_with("b", "c", &[("capacity", 5)]);
//! g.add_edge_with("b", "d", &[("capacity", 4)]);
//! g.add_edge_with("d", "e", &[("capacity", 2)]);
//! g.add_edge_with("c", "y", &[("capacity", 2)]);
//! g.add_edge_with("e", "y", &[("capacity", 3)]);
//!
//! let (value, flow) = maximum_flow(&g, &"x", &"y", "capacity", Algorithm::default(), None).unwrap();
//! assert_eq!(value, 3);
//! assert_eq!(flow["x"]["b"], 1);
//! assert_eq!(flow["c"]["y"], 2);
//!
//! let mut cut = minimum_cut(&g, &"x", &"y", "capacity", Algorithm::BoykovKolmogorov).unwrap();
//! cut.edges.sort();
//! assert_eq!(cut.value, 3);
//! assert_eq!(cut.edges, vec![("c", "y"), ("x", "b")]);
//! ```

pub mod boykovkolmogorov;
pub use self::boykovkolmogorov::BoykovKolmogorov;

pub mod dinic;
pub use self::dinic::Dinic;

pub mod edmondskarp;
pub use self::edmondskarp::EdmondsKarp;

pub mod mincut;
pub use self::mincut::{flow_value, MinCut};

pub mod preflowpush;
pub use self::preflowpush::PreflowPush;

pub mod shortestaugmentingpath;
pub use self::shortestaugmentingpath::ShortestAugmentingPath;

pub use crate::residual::FlowMap;

use crate::error::{FlowError, Result};
use crate::graph::FlowGraph;
use crate::residual::ResidualNetwork;
use crate::value::FlowNum;

use log::debug;

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

/// The default name of the capacity attribute.
pub const DEFAULT_CAPACITY: &str = "capacity";

/// A maximum flow algorithm working on a residual network.
pub trait MaxFlowSolver<F> {
    /// Compute a maximum flow in `net`.
    ///
    /// The network must not contain an unbounded source-sink path. If
    /// `cutoff` is given, the algorithm may stop as soon as the flow value
    /// reaches it. Returns the flow value.
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F;
}

/// The available maximum flow algorithms.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Algorithm {
    /// Shortest augmenting paths found by bidirectional BFS.
    EdmondsKarp,
    /// Shortest augmenting paths found by DFS along height labels.
    ///
    /// In two-phase mode the algorithm switches to BFS augmentation once
    /// the height of the source gets large.
    ShortestAugmentingPath { two_phase: bool },
    /// Blocking flows in the BFS level graph.
    Dinic,
    /// Highest-label preflow-push.
    ///
    /// Global relabelling happens after `(n + m) / global_relabel_freq`
    /// units of relabel work. `None` (or `0`) disables it.
    PreflowPush { global_relabel_freq: Option<f64> },
    /// Two search trees grown from source and sink.
    BoykovKolmogorov,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::PreflowPush {
            global_relabel_freq: Some(1.0),
        }
    }
}

impl Algorithm {
    /// Check the algorithm parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Algorithm::PreflowPush {
                global_relabel_freq: Some(freq),
            } if !(freq >= 0.0) => Err(FlowError::InvalidInput(format!(
                "global relabel frequency must be non-negative, got {}",
                freq
            ))),
            _ => Ok(()),
        }
    }

    /// Run the algorithm on `net`.
    ///
    /// If `value_only` is `true` the algorithm only needs to compute the
    /// flow value, i.e. the resulting "flow" may be a preflow.
    pub fn run<N, F>(&self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>, value_only: bool) -> F
    where
        F: FlowNum,
    {
        match *self {
            Algorithm::EdmondsKarp => EdmondsKarp::new().solve(net, cutoff),
            Algorithm::ShortestAugmentingPath { two_phase } => ShortestAugmentingPath::new(two_phase).solve(net, cutoff),
            Algorithm::Dinic => Dinic::new().solve(net, cutoff),
            Algorithm::PreflowPush { global_relabel_freq } => {
                let mut alg = PreflowPush::new(global_relabel_freq);
                alg.value_only = value_only;
                alg.solve(net, cutoff)
            }
            Algorithm::BoykovKolmogorov => BoykovKolmogorov::new().solve(net, cutoff),
        }
    }
}

/// Build the residual network of `g` and run `algorithm` on it.
///
/// Returns the residual network holding the computed flow. If
/// `value_only` is `true` the flow may be a preflow (only the flow value
/// and the minimum cut are meaningful in this case).
pub fn build_residual_network<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    algorithm: Algorithm,
    cutoff: Option<G::Value>,
    value_only: bool,
) -> Result<ResidualNetwork<G::Node, G::Value>>
where
    G: FlowGraph<'a>,
{
    algorithm.validate()?;
    let mut net = ResidualNetwork::build(g, src, snk, capacity)?;
    net.check_bounded()?;

    debug!("Maximum flow from {:?} to {:?} using {:?}", src, snk, algorithm);
    let value = algorithm.run(&mut net, cutoff, value_only);
    debug!("Maximum flow value: {}", value);

    Ok(net)
}

/// Compute a maximum flow from `src` to `snk`.
///
/// The capacities are read from the edge attribute `capacity`, a missing
/// attribute means unbounded capacity.
///
/// Returns the flow value and the flow on each edge.
///
/// # Errors
///
/// - [`FlowError::InvalidEndpoints`] if `src` or `snk` is missing or both are equal,
/// - [`FlowError::UnsupportedGraphKind`] if `g` is a multigraph,
/// - [`FlowError::UnboundedFlow`] if there is a path of unbounded capacity,
/// - [`FlowError::InvalidInput`] for negative capacities or invalid algorithm parameters.
pub fn maximum_flow<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    algorithm: Algorithm,
    cutoff: Option<G::Value>,
) -> Result<(G::Value, FlowMap<G::Node, G::Value>)>
where
    G: FlowGraph<'a>,
{
    let net = build_residual_network(g, src, snk, capacity, algorithm, cutoff, false)?;
    Ok((flow_value(&net), net.flow_map(g)))
}

/// Compute the value of a maximum flow from `src` to `snk`.
///
/// See [`maximum_flow`] for the possible errors.
pub fn maximum_flow_value<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    algorithm: Algorithm,
    cutoff: Option<G::Value>,
) -> Result<G::Value>
where
    G: FlowGraph<'a>,
{
    let net = build_residual_network(g, src, snk, capacity, algorithm, cutoff, true)?;
    Ok(flow_value(&net))
}

/// Compute a minimum cut separating `src` from `snk`.
///
/// See [`maximum_flow`] for the possible errors.
pub fn minimum_cut<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    algorithm: Algorithm,
) -> Result<MinCut<G::Node, G::Value>>
where
    G: FlowGraph<'a>,
{
    let net = build_residual_network(g, src, snk, capacity, algorithm, None, true)?;
    Ok(MinCut::new(g, &net))
}

/// Compute the value of a minimum cut separating `src` from `snk`.
///
/// See [`maximum_flow`] for the possible errors.
pub fn minimum_cut_value<'a, G>(
    g: &'a G,
    src: &G::Node,
    snk: &G::Node,
    capacity: &str,
    algorithm: Algorithm,
) -> Result<G::Value>
where
    G: FlowGraph<'a>,
{
    maximum_flow_value(g, src, snk, capacity, algorithm, None)
}
