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

//! This module implements the max flow algorithm of Edmonds and Karp.
//!
//! Augmenting paths are found by a bidirectional BFS: in each step the
//! smaller one of the two frontiers (from the source and from the sink) is
//! expanded until both searches meet.
//!
//! # Example
//!
//! ```
//! use rs_flow::{maximum_flow, Algorithm, AttrGraph};
//!
//! let mut g = AttrGraph::<char, i32>::directed();
//! g.add_edge_with('s', 'a', &[("capacity", 15)]);
//! g.add_edge_with('s', 'c', &[("capacity", 10)]);
//! g.add_edge_with('a', 'b', &[("capacity", 6)]);
//! g.add_edge_with('a', 'c', &[("capacity", 7)]);
//! g.add_edge_with('b', 't', &[("capacity", 5)]);
//! g.add_edge_with('b', 'd', &[("capacity", 2)]);
//! g.add_edge_with('c', 'b', &[("capacity", 11)]);
//! g.add_edge_with('c', 'd', &[("capacity", 4)]);
//! g.add_edge_with('d', 'b', &[("capacity", 4)]);
//! g.add_edge_with('d', 't', &[("capacity", 20)]);
//!
//! let (value, flow) = maximum_flow(&g, &'s', &'t', "capacity", Algorithm::EdmondsKarp, None).unwrap();
//! assert_eq!(value, 11);
//! assert_eq!(flow[&'b'][&'t'], 5);
//! ```

use super::MaxFlowSolver;
use crate::residual::ResidualNetwork;
use crate::value::{min, FlowNum};

use log::{debug, trace};

const NONE: usize = usize::MAX;
/// Marks the source (resp. sink) as root of the forward (resp. backward) search.
const ROOT: usize = usize::MAX - 1;

/// Max-flow algorithm of Edmonds and Karp.
#[derive(Default)]
pub struct EdmondsKarp {
    /// The arc used to reach each node from the source.
    pred: Vec<usize>,
    /// The arc used to reach the sink from each node.
    succ: Vec<usize>,
    /// The number of augmentations during the last run.
    pub cnt_augment: usize,
}

impl EdmondsKarp {
    /// Create a new Edmonds-Karp algorithm instance.
    pub fn new() -> Self {
        EdmondsKarp::default()
    }

    /// Augment along shortest paths until the sink is unreachable.
    ///
    /// `value` is the value of the flow currently in `net`. The function
    /// stops early once the value reaches `cutoff` and returns the new
    /// flow value.
    pub(crate) fn augment_all<N, F>(&mut self, net: &mut ResidualNetwork<N, F>, mut value: F, cutoff: Option<F>) -> F
    where
        F: FlowNum,
    {
        let n = net.num_nodes();
        self.pred.clear();
        self.pred.resize(n, NONE);
        self.succ.clear();
        self.succ.resize(n, NONE);

        while cutoff.map_or(true, |c| value < c) {
            let v = match self.search(net) {
                Some(v) => v,
                None => break,
            };
            value += self.augment(net, v);
            self.cnt_augment += 1;
        }

        value
    }

    /// Bidirectional BFS for a shortest augmenting path.
    ///
    /// Returns the node where both searches met.
    fn search<N, F>(&mut self, net: &ResidualNetwork<N, F>) -> Option<usize>
    where
        F: FlowNum,
    {
        let (src, snk) = (net.source(), net.sink());
        self.pred.fill(NONE);
        self.succ.fill(NONE);
        self.pred[src] = ROOT;
        self.succ[snk] = ROOT;

        let mut fwd = vec![src];
        let mut bwd = vec![snk];
        let mut next = vec![];

        while !fwd.is_empty() && !bwd.is_empty() {
            next.clear();
            if fwd.len() <= bwd.len() {
                for &u in &fwd {
                    for &a in net.arcs(u) {
                        let v = net.head(a);
                        if self.pred[v] == NONE && net.residual(a) > F::zero() {
                            self.pred[v] = a;
                            if self.succ[v] != NONE {
                                return Some(v);
                            }
                            next.push(v);
                        }
                    }
                }
                std::mem::swap(&mut fwd, &mut next);
            } else {
                for &u in &bwd {
                    for &a in net.arcs(u) {
                        let v = net.head(a);
                        if self.succ[v] == NONE && net.residual(a ^ 1) > F::zero() {
                            self.succ[v] = a ^ 1;
                            if self.pred[v] != NONE {
                                return Some(v);
                            }
                            next.push(v);
                        }
                    }
                }
                std::mem::swap(&mut bwd, &mut next);
            }
        }

        None
    }

    /// Augment along the path through `v` found by the last search.
    ///
    /// Returns the amount of flow sent.
    fn augment<N, F>(&self, net: &mut ResidualNetwork<N, F>, v: usize) -> F
    where
        F: FlowNum,
    {
        let path = self.path(net, v);
        let df = path
            .iter()
            .map(|&a| net.residual(a))
            .fold(None, |df, r| Some(df.map_or(r, |df| min(df, r))))
            .unwrap_or_else(F::zero);
        debug_assert!(df > F::zero());

        for &a in &path {
            net.push(a, df);
        }
        trace!("Augment {} along {} arcs", df, path.len());

        df
    }

    /// Return the arcs of the path from the source over `v` to the sink.
    fn path<N, F>(&self, net: &ResidualNetwork<N, F>, v: usize) -> Vec<usize>
    where
        F: FlowNum,
    {
        let mut path = vec![];
        let mut u = v;
        while self.pred[u] != ROOT {
            let a = self.pred[u];
            path.push(a);
            u = net.tail(a);
        }
        path.reverse();
        let mut u = v;
        while self.succ[u] != ROOT {
            let a = self.succ[u];
            path.push(a);
            u = net.head(a);
        }
        path
    }
}

impl<F> MaxFlowSolver<F> for EdmondsKarp
where
    F: FlowNum,
{
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F {
        self.cnt_augment = 0;
        let value = self.augment_all(net, F::zero(), cutoff);
        debug!("Edmonds-Karp: {} augmentations", self.cnt_augment);
        value
    }
}
