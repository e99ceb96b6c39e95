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

//! This module implements Dinic' max flow algorithm
//!
//! # Example
//!
//! ```
//! use rs_flow::{maximum_flow, minimum_cut, Algorithm, AttrGraph};
//!
//! let mut g = AttrGraph::<char, i64>::directed();
//! for &(u, v, c) in &[
//!     ('s', 'a', 5), ('s', 'c', 5), ('a', 'b', 2), ('a', 'c', 1), ('a', 'd', 1),
//!     ('c', 'd', 2), ('d', 'b', 2), ('b', 't', 4), ('d', 't', 5),
//! ] {
//!     g.add_edge_with(u, v, &[("capacity", c)]);
//! }
//!
//! let (value, flow) = maximum_flow(&g, &'s', &'t', "capacity", Algorithm::Dinic, None).unwrap();
//! assert_eq!(value, 5);
//! assert!(flow.values().flat_map(|out| out.values()).all(|&f| f >= 0));
//!
//! let mut cut = minimum_cut(&g, &'s', &'t', "capacity", Algorithm::Dinic).unwrap();
//! cut.source_side.sort();
//! assert_eq!(cut.source_side, vec!['a', 'c', 's']);
//! ```

use super::MaxFlowSolver;
use crate::residual::ResidualNetwork;
use crate::value::{min, FlowNum};

use log::{debug, trace};

use std::collections::VecDeque;

const NONE: usize = usize::MAX;

/// The dinic max-flow algorithm.
#[derive(Default)]
pub struct Dinic {
    /// The BFS distance of each node from the source.
    dist: Vec<usize>,
    /// The first remaining level arc leaving each node.
    first_lvl: Vec<usize>,
    /// The next level arc with the same tail.
    next_lvl: Vec<usize>,
    queue: VecDeque<usize>,
    /// The number of blocking flow phases during the last run.
    pub cnt_phases: usize,
}

impl Dinic {
    /// Create a new Dinic algorithm instance.
    pub fn new() -> Self {
        Dinic::default()
    }

    /// Compute the level graph.
    ///
    /// Returns `true` if the sink is reachable.
    fn search<N, F>(&mut self, net: &ResidualNetwork<N, F>) -> bool
    where
        F: FlowNum,
    {
        let n = net.num_nodes();
        let (src, snk) = (net.source(), net.sink());

        self.dist.clear();
        self.dist.resize(n, n);
        self.first_lvl.clear();
        self.first_lvl.resize(n, NONE);
        self.next_lvl.clear();
        self.next_lvl.resize(net.num_arcs(), NONE);
        self.dist[src] = 0;

        self.queue.clear();
        self.queue.push_back(src);

        let mut snk_d = n;
        while let Some(u) = self.queue.pop_front() {
            let d = self.dist[u];

            if d >= snk_d {
                return true;
            }

            for &a in net.arcs(u) {
                if net.residual(a) > F::zero() {
                    let v = net.head(a);
                    if self.dist[v] == n {
                        self.dist[v] = d + 1;
                        self.queue.push_back(v);
                        if v == snk {
                            snk_d = d + 1
                        }
                    } else if self.dist[v] != d + 1 {
                        continue;
                    }
                    self.next_lvl[a] = self.first_lvl[u];
                    self.first_lvl[u] = a;
                }
            }
        }

        snk_d < n
    }

    /// Send flow from `u` to the sink along level arcs.
    ///
    /// At most `target_flow` units are sent (if given). Returns the amount
    /// of flow sent.
    fn augment<N, F>(&mut self, net: &mut ResidualNetwork<N, F>, u: usize, target_flow: Option<F>) -> F
    where
        F: FlowNum,
    {
        let snk = net.sink();
        let mut df = F::zero();

        loop {
            let a = self.first_lvl[u];
            if a == NONE {
                break;
            }
            let rem_cap = match target_flow {
                Some(target_flow) => min(net.residual(a), target_flow - df),
                None => net.residual(a),
            };
            if rem_cap > F::zero() {
                let v = net.head(a);
                let cf = if v == snk {
                    rem_cap
                } else {
                    self.augment(net, v, Some(rem_cap))
                };
                net.push(a, cf);
                df += cf;
                if target_flow.map(|t| df == t).unwrap_or(false) {
                    break;
                }
            }

            // arc is saturated or blocked
            self.first_lvl[u] = self.next_lvl[a];
        }

        if df.is_zero() {
            // nothing can be sent from this node, remove it from the level graph
            self.first_lvl[u] = NONE;
        }

        df
    }
}

impl<F> MaxFlowSolver<F> for Dinic
where
    F: FlowNum,
{
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F {
        let src = net.source();
        self.cnt_phases = 0;

        let mut value = F::zero();
        while cutoff.map_or(true, |c| value < c) && self.search(net) {
            let df = self.augment(net, src, cutoff.map(|c| c - value));
            trace!("Blocking flow of value {}", df);
            value += df;
            self.cnt_phases += 1;
        }

        debug!("Dinic: {} phases", self.cnt_phases);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residual::testing::network;

    #[test]
    fn test_dinic() {
        let mut net = network(
            &[(0, 2, 15), (0, 4, 10), (2, 3, 6), (2, 4, 7), (3, 1, 5), (3, 5, 2), (4, 3, 11), (4, 5, 4), (5, 3, 4), (5, 1, 20)],
            0,
            1,
        );
        let mut alg = Dinic::new();
        assert_eq!(alg.solve(&mut net, None), 11);
        assert_eq!(net.excess(1), 11);
        assert!((2..6).all(|u| net.excess(u) == 0));
    }

    #[test]
    fn test_cutoff() {
        let mut net = network(&[(0, 1, 4), (1, 3, 4), (0, 2, 4), (2, 3, 4)], 0, 3);
        let mut alg = Dinic::new();
        assert_eq!(alg.solve(&mut net, Some(3)), 3);
        assert_eq!(net.excess(3), 3);
        assert_eq!(alg.cnt_phases, 1);
    }
}
