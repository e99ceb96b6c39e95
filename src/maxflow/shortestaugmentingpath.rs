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

//! Shortest augmenting path algorithm.
//!
//! Each node has a height, which is a lower bound on its residual distance
//! to the sink. Augmenting paths are searched by DFS along admissible arcs
//! (arcs `(u,v)` with `height(u) == height(v) + 1`), starting from the
//! current arc of each node. If a node has no admissible arc left it is
//! relabelled. The algorithm stops as soon as some height level becomes
//! empty (then the sink cannot be reached anymore).
//!
//! In two-phase mode the DFS is stopped once the height of the source
//! exceeds `min(sqrt(m), 2 n^(2/3))` and the remaining flow is found by
//! BFS augmentation (see [`EdmondsKarp`](super::EdmondsKarp)).

use super::{EdmondsKarp, MaxFlowSolver};
use crate::residual::ResidualNetwork;
use crate::value::{min, FlowNum};

use log::{debug, trace};

use std::collections::VecDeque;

/// The shortest augmenting path algorithm.
#[derive(Default)]
pub struct ShortestAugmentingPath {
    /// Whether to switch to BFS augmentation for large source heights.
    pub two_phase: bool,
    /// The height of each node.
    heights: Vec<usize>,
    /// The index of the current arc of each node.
    current: Vec<usize>,
    /// The number of nodes of each height.
    counts: Vec<usize>,
    /// The number of augmentations during the last run.
    pub cnt_augment: usize,
    /// The number of relabel operations during the last run.
    pub cnt_relabel: usize,
}

impl ShortestAugmentingPath {
    pub fn new(two_phase: bool) -> Self {
        ShortestAugmentingPath {
            two_phase,
            ..Default::default()
        }
    }

    /// The source height at which the DFS stops.
    fn threshold(&self, n: usize, m: usize) -> usize {
        if self.two_phase {
            let n = n as f64;
            let m = m as f64;
            m.sqrt().min(2.0 * n.powf(2.0 / 3.0)) as usize
        } else {
            n
        }
    }

    /// Compute exact heights by a BFS from the sink.
    ///
    /// Nodes that cannot reach the sink get height `n`.
    fn init_heights<N, F>(&mut self, net: &ResidualNetwork<N, F>)
    where
        F: FlowNum,
    {
        let n = net.num_nodes();
        let snk = net.sink();
        self.heights.clear();
        self.heights.resize(n, n);
        self.heights[snk] = 0;

        let mut queue = VecDeque::with_capacity(n);
        queue.push_back(snk);
        while let Some(v) = queue.pop_front() {
            let h = self.heights[v] + 1;
            for &a in net.arcs(v) {
                let u = net.head(a);
                if u != snk && self.heights[u] == n && net.residual(a ^ 1) > F::zero() {
                    self.heights[u] = h;
                    queue.push_back(u);
                }
            }
        }

        self.counts.clear();
        self.counts.resize(n + 1, 0);
        for &h in &self.heights {
            self.counts[h] += 1;
        }
        self.current.clear();
        self.current.resize(n, 0);
    }

    /// Return the new height of `u`.
    fn relabel<N, F>(&self, net: &ResidualNetwork<N, F>, u: usize) -> usize
    where
        F: FlowNum,
    {
        let mut h = net.num_nodes() - 1;
        for &a in net.arcs(u) {
            if net.residual(a) > F::zero() {
                h = h.min(self.heights[net.head(a)]);
            }
        }
        h + 1
    }

    fn augment<N, F>(net: &mut ResidualNetwork<N, F>, path: &[usize]) -> F
    where
        F: FlowNum,
    {
        let mut df = net.residual(path[0]);
        for &a in &path[1..] {
            df = min(df, net.residual(a));
        }
        for &a in path {
            net.push(a, df);
        }
        trace!("Augment {} along {} arcs", df, path.len());
        df
    }
}

/// How the DFS phase ended.
enum Exit {
    /// The sink is not reachable anymore, the flow is maximal.
    Optimal,
    /// The flow value reached the cutoff.
    Cutoff,
    /// The source height reached the two-phase threshold.
    Threshold,
}

impl<F> MaxFlowSolver<F> for ShortestAugmentingPath
where
    F: FlowNum,
{
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F {
        let n = net.num_nodes();
        let (src, snk) = (net.source(), net.sink());
        self.cnt_augment = 0;
        self.cnt_relabel = 0;

        self.init_heights(net);
        if self.heights[src] == n {
            debug!("Shortest augmenting path: sink not reachable");
            return F::zero();
        }

        let d = self.threshold(n, net.num_arcs() / 2);
        let mut value = F::zero();
        let mut path = Vec::with_capacity(n);
        let mut u = src;

        let exit = if self.heights[src] >= d {
            Exit::Threshold
        } else {
            'dfs: loop {
                let height = self.heights[u];
                loop {
                    let arcs = net.arcs(u);
                    if let Some(&a) = arcs.get(self.current[u]) {
                        let v = net.head(a);
                        if height == self.heights[v] + 1 && net.residual(a) > F::zero() {
                            path.push(a);
                            u = v;
                            break;
                        }
                        self.current[u] += 1;
                        if self.current[u] < arcs.len() {
                            continue;
                        }
                    }

                    // no admissible arc left
                    self.current[u] = 0;
                    self.counts[height] -= 1;
                    if self.counts[height] == 0 {
                        trace!("Gap at height {}", height);
                        break 'dfs Exit::Optimal;
                    }
                    let h = self.relabel(net, u);
                    self.cnt_relabel += 1;
                    if u == src && h >= d {
                        break 'dfs if self.two_phase { Exit::Threshold } else { Exit::Optimal };
                    }
                    self.counts[h] += 1;
                    self.heights[u] = h;
                    if u != src {
                        if let Some(a) = path.pop() {
                            u = net.tail(a);
                        }
                    }
                    break;
                }

                if u == snk {
                    value += Self::augment(net, &path);
                    self.cnt_augment += 1;
                    if cutoff.map_or(false, |c| value >= c) {
                        break 'dfs Exit::Cutoff;
                    }
                    path.clear();
                    u = src;
                }
            }
        };

        debug!(
            "Shortest augmenting path: {} augmentations, {} relabels",
            self.cnt_augment, self.cnt_relabel
        );

        match exit {
            Exit::Threshold => {
                debug!("Shortest augmenting path: switching to BFS augmentation");
                EdmondsKarp::new().augment_all(net, value, cutoff)
            }
            Exit::Optimal | Exit::Cutoff => value,
        }
    }
}
