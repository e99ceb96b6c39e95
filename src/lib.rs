// Copyright (c) 2015-2022 Frank Fischer <frank-fischer@shadow-soft.de>
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see  <http://www.gnu.org/licenses/>
//

#![forbid(unsafe_code)]

//! Network flow algorithms on attributed graphs.
//!
//! The crate solves maximum flow, minimum cut and minimum cost flow
//! problems. Graphs are accessed through the [`FlowGraph`] trait, which
//! only requires enumerating nodes and incident edges together with their
//! attributes. [`AttrGraph`] is a simple implementation of that trait.
//!
//! All maximum flow algorithms work on a [`ResidualNetwork`] built fresh
//! for each call and agree on the flow value:
//!
//! ```
//! use rs_flow::{maximum_flow_value, Algorithm, AttrGraph, DEFAULT_CAPACITY};
//!
//! let mut g = AttrGraph::<char, i64>::directed();
//! g.add_edge_with('s', 'a', &[("capacity", 3)]);
//! g.add_edge_with('a', 't', &[("capacity", 2)]);
//! g.add_edge_with('s', 't', &[("capacity", 1)]);
//!
//! for &alg in &[
//!     Algorithm::EdmondsKarp,
//!     Algorithm::ShortestAugmentingPath { two_phase: false },
//!     Algorithm::Dinic,
//!     Algorithm::default(),
//!     Algorithm::BoykovKolmogorov,
//! ] {
//!     assert_eq!(maximum_flow_value(&g, &'s', &'t', DEFAULT_CAPACITY, alg, None).unwrap(), 3);
//! }
//! ```

mod num {
    pub use num_traits as traits;
}

pub mod error;
pub use self::error::{FlowError, Result};

pub mod value;
pub use self::value::FlowNum;

// # Data structures

pub mod graph;
pub use self::graph::{AttrGraph, AttrMap, Attributes, FlowGraph};

pub mod residual;
pub use self::residual::ResidualNetwork;

// # Algorithms

pub mod maxflow;
pub use self::maxflow::{
    build_residual_network, maximum_flow, maximum_flow_value, minimum_cut, minimum_cut_value, Algorithm, FlowMap,
    MaxFlowSolver, MinCut, DEFAULT_CAPACITY,
};

pub mod mcf;
pub use self::mcf::{cost_of_flow, max_flow_min_cost, min_cost_flow, min_cost_flow_cost, NetworkSimplex, SolutionState};
