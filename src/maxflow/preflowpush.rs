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

//! This module implements a highest-label push-relabel algorithm.
//!
//! The algorithm runs in two phases. Phase I computes a maximum preflow:
//! the active node of largest height is discharged until no active node
//! of height `< n` remains. Nodes whose height reaches `n` cannot reach
//! the sink anymore and are ignored. The value of the preflow (the excess
//! of the sink) is the maximum flow value.
//!
//! Phase II converts the preflow into a flow by sending all remaining
//! excess back to the source. Phase II is skipped if only the flow value
//! is required.
//!
//! Two heuristics are used:
//!
//! - *global relabelling*: exact heights are computed by a BFS from the
//!   sink after a certain amount of relabel work,
//! - *gap heuristic*: if some height level `h < n` becomes empty, all nodes
//!   above `h` are disconnected from the sink and lifted to `n + 1`.
//!
//! # Example
//!
//! ```
//! use rs_flow::{maximum_flow, Algorithm, AttrGraph};
//!
//! let mut g = AttrGraph::<char, i64>::directed();
//! for &(u, v, c) in &[
//!     ('s', 'b', 18), ('s', 'e', 27), ('b', 'a', 8), ('b', 'c', 9), ('b', 'f', 6),
//!     ('a', 'c', 1), ('a', 'd', 10), ('c', 'd', 8), ('d', 't', 33), ('e', 'c', 5),
//!     ('e', 'f', 9), ('e', 'h', 5), ('e', 'd', 2), ('f', 'g', 6), ('h', 'g', 4),
//!     ('g', 't', 6), ('g', 'd', 8), ('f', 'c', 3),
//! ] {
//!     g.add_edge_with(u, v, &[("capacity", c)]);
//! }
//!
//! let alg = Algorithm::PreflowPush { global_relabel_freq: Some(1.0) };
//! let (value, flow) = maximum_flow(&g, &'s', &'t', "capacity", alg, None).unwrap();
//! assert_eq!(value, 28);
//! assert_eq!(flow[&'d'][&'t'] + flow[&'g'][&'t'], 28);
//! ```

use super::MaxFlowSolver;
use crate::residual::ResidualNetwork;
use crate::value::{min, FlowNum};

use log::{debug, trace};

use std::collections::VecDeque;

const NONE: usize = usize::MAX;

/// The push-relabel algorithm.
///
/// This struct contains all algorithmic working data.
pub struct PreflowPush<F> {
    /// Global relabelling frequency, `None` or `0` disables global relabelling.
    pub global_relabel_freq: Option<f64>,
    /// Stop after phase I.
    ///
    /// The network contains a maximum preflow in this case.
    pub value_only: bool,

    /// Data associated with each node.
    nodes: Vec<NodeInfo<F>>,
    /// The buckets containing the nodes of a specific height.
    buckets: Vec<Bucket>,
    /// The queue of nodes for a BFS.
    queue: VecDeque<usize>,
    /// The largest height of an active node.
    largest_act: usize,
    /// Relabel work since the last global relabelling.
    work: usize,

    /// The number of relabel operations performed during the algorithm.
    pub cnt_relabel: usize,
    /// The number of global relabellings.
    pub cnt_global_relabel: usize,
    /// The number of gaps found.
    pub cnt_gap: usize,
}

/// Data associated with a node.
#[derive(Clone)]
struct NodeInfo<F> {
    /// The current height of the node.
    height: usize,
    /// The excess of flow of the node.
    excess: F,
    /// The next active node in the linked list for the current height.
    next_act: usize,
    /// The next arc to be considered
    iter: usize,
}

/// A bucket containing nodes of some height.
#[derive(Clone)]
struct Bucket {
    /// The first active node of this height.
    ///
    /// The active nodes are kept in a singly linked list, this is the first
    /// node in that list.
    first_act: usize,
    /// Number of inactive nodes of this height.
    num_inact: usize,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        first_act: NONE,
        num_inact: 0,
    };

    /// Returns `true` if the bucket is empty.
    ///
    /// This means that there are neither active nor inactive nodes of the
    /// buckets height.
    fn is_empty(&self) -> bool {
        self.first_act == NONE && self.num_inact == 0
    }
}

/// The state of the main loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    /// Phase I, discharge active nodes of height `< n`.
    Discharging,
    /// Phase I, recompute exact heights.
    GlobalRelabeling,
    /// Phase II, return excess to the source.
    Converting,
    Done,
}

impl<F> PreflowPush<F>
where
    F: FlowNum,
{
    /// Return a new push-relabel algorithm instance.
    pub fn new(global_relabel_freq: Option<f64>) -> Self {
        PreflowPush {
            global_relabel_freq,
            value_only: false,
            nodes: vec![],
            buckets: vec![],
            queue: VecDeque::new(),
            largest_act: 0,
            work: 0,
            cnt_relabel: 0,
            cnt_global_relabel: 0,
            cnt_gap: 0,
        }
    }

    /// The amount of relabel work after which heights are recomputed.
    fn relabel_threshold(&self, n: usize, m: usize) -> usize {
        match self.global_relabel_freq {
            Some(freq) if freq > 0.0 => ((n + m) as f64 / freq).ceil() as usize,
            _ => usize::MAX,
        }
    }

    /// Initialize preflow algorithm.
    ///
    /// All arcs leaving the source node are saturated.
    fn init_preflow<N>(&mut self, net: &mut ResidualNetwork<N, F>) {
        let n = net.num_nodes();
        let src = net.source();

        self.nodes.clear();
        self.nodes.resize(
            n,
            NodeInfo {
                height: 0,
                excess: F::zero(),
                next_act: NONE,
                iter: 0,
            },
        );
        self.buckets.clear();
        self.buckets.resize(2 * n + 2, Bucket::EMPTY);
        self.largest_act = 0;
        self.work = 0;
        self.cnt_relabel = 0;
        self.cnt_global_relabel = 0;
        self.cnt_gap = 0;

        // send maximal flow out of source
        for a in net.arcs(src).to_vec() {
            let df = net.residual(a);
            if df > F::zero() {
                let v = net.head(a);
                net.push(a, df);
                self.nodes[v].excess += df;
                self.nodes[src].excess -= df;
            }
        }
    }

    /// Compute exact heights by a BFS from the sink.
    ///
    /// Nodes that cannot reach the sink get height `n + 1`, the source
    /// has height `n`.
    fn global_relabel<N>(&mut self, net: &ResidualNetwork<N, F>) {
        let n = net.num_nodes();
        let (src, snk) = (net.source(), net.sink());
        self.cnt_global_relabel += 1;
        self.work = 0;

        for node in &mut self.nodes {
            node.height = n + 1;
            // we need to reset the iterators for correctness
            node.iter = 0;
        }
        self.nodes[src].height = n;
        self.nodes[snk].height = 0;

        for b in &mut self.buckets[..n] {
            *b = Bucket::EMPTY;
        }
        // the sink counts as inactive
        self.buckets[0].num_inact = 1;

        self.largest_act = 0;
        self.queue.clear();
        self.queue.push_back(snk);
        while let Some(v) = self.queue.pop_front() {
            let h = self.nodes[v].height + 1;
            for &a in net.arcs(v) {
                let u = net.head(a);
                if self.nodes[u].height == n + 1 && net.residual(a ^ 1) > F::zero() {
                    self.nodes[u].height = h;
                    self.queue.push_back(u);
                    self.add_to_bucket(u, h);
                }
            }
        }

        trace!("Global relabel, largest active height {}", self.largest_act);
    }

    /// Put node `u` into the bucket of height `h`.
    fn add_to_bucket(&mut self, u: usize, h: usize) {
        if self.nodes[u].excess > F::zero() {
            self.nodes[u].next_act = self.buckets[h].first_act;
            self.buckets[h].first_act = u;
            self.largest_act = self.largest_act.max(h);
        } else {
            self.buckets[h].num_inact += 1;
        }
    }

    /// Return the largest height `<= h` with an active node (or 0).
    fn find_largest_act(&self, h: usize) -> usize {
        (0..h + 1)
            .rev()
            .find(|&h| self.buckets[h].first_act != NONE)
            .unwrap_or(0)
    }

    /// Remove the next node of largest height from its bucket.
    fn next_active(&mut self) -> Option<usize> {
        while self.largest_act > 0 {
            let l = self.largest_act;
            let u = self.buckets[l].first_act;
            if u != NONE {
                self.buckets[l].first_act = self.nodes[u].next_act;
                return Some(u);
            }
            self.largest_act = self.find_largest_act(l);
        }
        None
    }

    /// Push `df` units of flow from `u` along arc `a`.
    fn push<N>(&mut self, net: &mut ResidualNetwork<N, F>, u: usize, a: usize, df: F) {
        let v = net.head(a);
        debug_assert!(df > F::zero());
        debug_assert_eq!(self.nodes[u].height, self.nodes[v].height + 1);

        if self.nodes[v].excess.is_zero() && v != net.source() && v != net.sink() {
            // v becomes active
            let h = self.nodes[v].height;
            debug_assert!(self.buckets[h].num_inact > 0, "height:{}", h);
            self.buckets[h].num_inact -= 1;
            self.nodes[v].next_act = self.buckets[h].first_act;
            self.buckets[h].first_act = v;
        }

        net.push(a, df);
        self.nodes[u].excess -= df;
        self.nodes[v].excess += df;
    }

    /// Discharges node `u`.
    ///
    /// This function does a sequence of push and relabel operations for an
    /// active node `u` until its excess reaches 0.
    ///
    /// In phase I the function may also stop with `u` having nonzero excess
    /// if the height of `u` reaches `n`. In this case `u` gets disconnected
    /// from the sink and will not be considered again until phase II.
    fn discharge<N>(&mut self, net: &mut ResidualNetwork<N, F>, u: usize, phase1: bool) {
        loop {
            let h_u = self.nodes[u].height;
            let deg = net.arcs(u).len();

            // Start at current arc.
            let mut cur = self.nodes[u].iter;
            while cur < deg {
                let a = net.arcs(u)[cur];
                let r = net.residual(a);
                if r > F::zero() && h_u == self.nodes[net.head(a)].height + 1 {
                    let df = min(self.nodes[u].excess, r);
                    self.push(net, u, a, df);

                    // check if node is fully discharged
                    if self.nodes[u].excess.is_zero() {
                        // node is inactive now, save current arc
                        self.buckets[h_u].num_inact += 1;
                        self.largest_act = self.find_largest_act(h_u);
                        self.nodes[u].iter = cur;
                        return;
                    }
                }
                cur += 1;
            }

            // we ran out of admissible arcs but node still has positive excess
            self.nodes[u].iter = 0;
            if !self.relabel(net, u, phase1) {
                break;
            }
        }
    }

    /// The relabel operation.
    ///
    /// The function returns `true` iff the node remains active (i.e. if it
    /// could be discharged again).
    ///
    /// In phase I the function returns `false` if the height of `u` gets at
    /// least `n`.
    fn relabel<N>(&mut self, net: &ResidualNetwork<N, F>, u: usize, phase1: bool) -> bool {
        debug_assert!(self.nodes[u].excess > F::zero());

        let n = net.num_nodes();
        let h_old = self.nodes[u].height;
        let h_new = net
            .arcs(u)
            .iter()
            .filter(|&&a| net.residual(a) > F::zero())
            .map(|&a| self.nodes[net.head(a)].height + 1)
            .min()
            .unwrap_or(2 * n);
        debug_assert!(h_new > h_old);

        self.cnt_relabel += 1;
        self.work += net.arcs(u).len() + 2;

        if phase1 {
            // *** The GAP heuristic ***
            if self.buckets[h_old].is_empty() {
                // u was the last node of its height, so all nodes above are
                // disconnected from the sink.
                self.cnt_gap += 1;
                trace!("Gap at height {}", h_old);
                for b in &mut self.buckets[h_old + 1..n] {
                    *b = Bucket::EMPTY;
                }
                for node in &mut self.nodes {
                    if h_old < node.height && node.height < n {
                        node.height = n + 1;
                    }
                }
                self.nodes[u].height = n + 1;
                self.largest_act = self.find_largest_act(h_old);
                return false;
            }

            // This node has now a too large label for phase I.
            if h_new >= n {
                self.nodes[u].height = h_new;
                self.largest_act = self.find_largest_act(h_old);
                return false;
            }
        }

        // The node remains active, it must have the largest height now.
        self.nodes[u].height = h_new;
        self.largest_act = h_new;
        true
    }

    /// Phase II: return all excess to the source.
    ///
    /// Heights are set to `n` plus the residual distance to the source.
    fn convert<N>(&mut self, net: &mut ResidualNetwork<N, F>) {
        let n = net.num_nodes();
        let (src, snk) = (net.source(), net.sink());

        for node in &mut self.nodes {
            node.height = 2 * n;
            node.next_act = NONE;
            node.iter = 0;
        }
        for b in &mut self.buckets {
            *b = Bucket::EMPTY;
        }
        self.nodes[src].height = n;

        self.queue.clear();
        self.queue.push_back(src);
        while let Some(v) = self.queue.pop_front() {
            let h = self.nodes[v].height + 1;
            for &a in net.arcs(v) {
                let u = net.head(a);
                if u != snk && self.nodes[u].height == 2 * n && net.residual(a ^ 1) > F::zero() {
                    self.nodes[u].height = h;
                    self.queue.push_back(u);
                }
            }
        }

        self.largest_act = 0;
        for u in 0..n {
            let h = self.nodes[u].height;
            if u == src || u == snk {
                self.buckets[h].num_inact += 1;
            } else {
                debug_assert!(h < 2 * n || self.nodes[u].excess.is_zero());
                self.add_to_bucket(u, h);
            }
        }

        while self.largest_act > n {
            match self.next_active() {
                Some(u) => self.discharge(net, u, false),
                None => break,
            }
        }

        debug_assert!((0..n).all(|u| u == src || u == snk || self.nodes[u].excess.is_zero()));
    }
}

impl<F> MaxFlowSolver<F> for PreflowPush<F>
where
    F: FlowNum,
{
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F {
        let snk = net.sink();
        let threshold = self.relabel_threshold(net.num_nodes(), net.num_arcs());

        self.init_preflow(net);

        let mut phase = Phase::GlobalRelabeling;
        while phase != Phase::Done {
            phase = match phase {
                Phase::GlobalRelabeling => {
                    self.global_relabel(net);
                    Phase::Discharging
                }
                Phase::Discharging => {
                    let u = if cutoff.map_or(false, |c| self.nodes[snk].excess >= c) {
                        None
                    } else {
                        self.next_active()
                    };
                    match u {
                        Some(u) => {
                            self.discharge(net, u, true);
                            if self.work >= threshold {
                                Phase::GlobalRelabeling
                            } else {
                                Phase::Discharging
                            }
                        }
                        None => {
                            debug!(
                                "Preflow-push: end of phase I, value {}, {} relabels, {} global relabels, {} gaps",
                                self.nodes[snk].excess, self.cnt_relabel, self.cnt_global_relabel, self.cnt_gap
                            );
                            if self.value_only {
                                Phase::Done
                            } else {
                                Phase::Converting
                            }
                        }
                    }
                }
                Phase::Converting => {
                    self.convert(net);
                    Phase::Done
                }
                Phase::Done => Phase::Done,
            };
        }

        self.nodes[snk].excess
    }
}
