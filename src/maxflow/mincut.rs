/*
 * Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
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

//! Flow values and minimum cuts of converged residual networks.

use crate::graph::FlowGraph;
use crate::residual::ResidualNetwork;
use crate::value::{approx_eq, FlowNum};

#[cfg(feature = "serialize")]
use serde_derive::{Deserialize, Serialize};

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

/// Return the value of the (pre)flow in `net`, i.e. the excess of the sink.
pub fn flow_value<N, F>(net: &ResidualNetwork<N, F>) -> F
where
    F: FlowNum,
{
    net.excess(net.sink())
}

/// Return for each node whether it is on the source side of the cut.
///
/// The sink side consists of all nodes that can reach the sink in the
/// residual network. If `net` contains a maximum preflow, this is a
/// minimum cut.
pub fn source_side<N, F>(net: &ResidualNetwork<N, F>) -> Vec<bool>
where
    F: FlowNum,
{
    let snk = net.sink();
    let mut side = vec![true; net.num_nodes()];
    let mut queue = VecDeque::new();
    side[snk] = false;
    queue.push_back(snk);
    while let Some(v) = queue.pop_front() {
        for &a in net.arcs(v) {
            let u = net.head(a);
            if side[u] && net.residual(a ^ 1) > F::zero() {
                side[u] = false;
                queue.push_back(u);
            }
        }
    }
    side
}

/// A minimum cut.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct MinCut<N, F> {
    /// The capacity of the cut.
    pub value: F,
    /// The nodes on the source side.
    pub source_side: Vec<N>,
    /// The nodes on the sink side.
    pub sink_side: Vec<N>,
    /// The edges from the source side to the sink side.
    pub edges: Vec<(N, N)>,
}

impl<N, F> MinCut<N, F>
where
    N: Clone + Eq + Hash + Debug,
    F: FlowNum,
{
    /// Extract the cut of a converged residual network of `g`.
    ///
    /// Edges of zero capacity are not part of the cut.
    pub fn new<'a, G>(g: &'a G, net: &ResidualNetwork<N, F>) -> Self
    where
        N: 'a,
        G: FlowGraph<'a, Node = N, Value = F>,
    {
        let side = source_side(net);
        let mut cut = MinCut {
            value: F::zero(),
            source_side: vec![],
            sink_side: vec![],
            edges: vec![],
        };

        for u in g.nodes() {
            let uid = match net.node_id(u) {
                Some(uid) => uid,
                None => continue,
            };
            if !side[uid] {
                cut.sink_side.push(u.clone());
                continue;
            }
            cut.source_side.push(u.clone());
            for (v, _) in g.out_edges(u) {
                let vid = match net.node_id(v) {
                    Some(vid) => vid,
                    None => continue,
                };
                if side[vid] {
                    continue;
                }
                if let Some(a) = net.arc_between(uid, vid) {
                    if net.cap(a) > F::zero() {
                        cut.value += net.cap(a);
                        cut.edges.push((u.clone(), v.clone()));
                    }
                }
            }
        }

        debug_assert!(
            approx_eq(cut.value, flow_value(net)),
            "cut value {} differs from flow value {}",
            cut.value,
            flow_value(net)
        );

        cut
    }
}
