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

//! The max flow algorithm of Boykov and Kolmogorov.
//!
//! Two search trees are grown from the source and from the sink over
//! non-saturated arcs. Once the trees touch, flow is augmented along the
//! path through both trees. Nodes whose tree arc got saturated become
//! orphans and are either adopted by another node of their tree or
//! removed from it.
//!
//! When no more augmenting path is found, the source tree is the set of
//! nodes reachable from the source in the residual network.
//!
//! The trees use the distance/timestamp heuristic of Boykov and
//! Kolmogorov: each node stores its distance to the root, which is known
//! to be exact if the timestamp equals the current round.

use super::MaxFlowSolver;
use crate::residual::ResidualNetwork;
use crate::value::{min, FlowNum};

use log::{debug, trace};

use std::collections::VecDeque;

/// The tree a node belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tree {
    Free,
    Source,
    Sink,
}

/// The tree arc of a node.
///
/// In the source tree the arc points from the parent to the node, in the
/// sink tree from the node to the parent. In both cases flow is sent along
/// the arc.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Parent {
    /// The node is the root of its tree.
    Root,
    /// The node has lost its parent (or is not in a tree).
    Orphan,
    Arc(usize),
}

/// Result of walking up to the root of a tree.
enum RootCheck {
    /// The path ends at a node of known distance `base_dist`.
    Rooted { base_dist: usize },
    /// The path ends at an orphan.
    Detached,
}

/// The Boykov-Kolmogorov algorithm.
#[derive(Default)]
pub struct BoykovKolmogorov {
    tree: Vec<Tree>,
    parent: Vec<Parent>,
    dist: Vec<usize>,
    timestamp: Vec<usize>,
    time: usize,
    /// Nodes whose neighbors must be scanned.
    ///
    /// Nodes are removed lazily, `in_active` is the true membership.
    active: VecDeque<usize>,
    in_active: Vec<bool>,
    orphans: VecDeque<usize>,
    /// The number of augmentations during the last run.
    pub cnt_augment: usize,
    /// The number of orphans that could not be adopted.
    pub cnt_free: usize,
}

impl BoykovKolmogorov {
    pub fn new() -> Self {
        BoykovKolmogorov::default()
    }

    /// Return the nodes of the source tree after the last run.
    ///
    /// If the algorithm ran without cutoff, these nodes form the source
    /// side of a minimum cut.
    pub fn source_tree_side(&self) -> Vec<usize> {
        (0..self.tree.len()).filter(|&u| self.tree[u] == Tree::Source).collect()
    }

    fn init<N, F>(&mut self, net: &ResidualNetwork<N, F>)
    where
        F: FlowNum,
    {
        let n = net.num_nodes();
        let (src, snk) = (net.source(), net.sink());

        self.tree.clear();
        self.tree.resize(n, Tree::Free);
        self.parent.clear();
        self.parent.resize(n, Parent::Orphan);
        self.dist.clear();
        self.dist.resize(n, 0);
        self.timestamp.clear();
        self.timestamp.resize(n, 0);
        self.in_active.clear();
        self.in_active.resize(n, false);
        self.active.clear();
        self.orphans.clear();
        self.cnt_augment = 0;
        self.cnt_free = 0;

        self.time = 1;
        for &(u, t) in &[(src, Tree::Source), (snk, Tree::Sink)] {
            self.tree[u] = t;
            self.parent[u] = Parent::Root;
            self.timestamp[u] = self.time;
            self.activate(u);
        }
    }

    fn activate(&mut self, u: usize) {
        if !self.in_active[u] {
            self.in_active[u] = true;
            self.active.push_back(u);
        }
    }

    /// Return the parent of node `u`.
    fn parent_node<N, F>(&self, net: &ResidualNetwork<N, F>, u: usize) -> Option<usize>
    where
        F: FlowNum,
    {
        match self.parent[u] {
            Parent::Arc(a) if self.tree[u] == Tree::Source => Some(net.tail(a)),
            Parent::Arc(a) => Some(net.head(a)),
            Parent::Root | Parent::Orphan => None,
        }
    }

    /// The arc between `u` and the neighbor reached by `a` in tree direction.
    ///
    /// For the source tree this is `a` (from `u` to its child), for the
    /// sink tree the reverse of `a`.
    fn tree_arc(t: Tree, a: usize) -> usize {
        if t == Tree::Source {
            a
        } else {
            a ^ 1
        }
    }

    /// Return `true` if `v` may become the parent of `u`.
    ///
    /// `v` is closer if its distance is known to be at least as exact as
    /// that of `u` and larger than `dist[u] + 1`.
    fn is_closer(&self, u: usize, v: usize) -> bool {
        self.timestamp[v] <= self.timestamp[u] && self.dist[v] > self.dist[u] + 1
    }

    /// Grow both trees until they touch.
    ///
    /// Returns the arc from the source tree to the sink tree.
    fn grow<N, F>(&mut self, net: &ResidualNetwork<N, F>) -> Option<usize>
    where
        F: FlowNum,
    {
        while let Some(&u) = self.active.front() {
            if !self.in_active[u] {
                self.active.pop_front();
                continue;
            }

            let this = self.tree[u];
            debug_assert!(this != Tree::Free);
            for &a in net.arcs(u) {
                let ta = Self::tree_arc(this, a);
                if net.residual(ta) > F::zero() {
                    let v = net.head(a);
                    if self.tree[v] == Tree::Free {
                        self.tree[v] = this;
                        self.parent[v] = Parent::Arc(ta);
                        self.dist[v] = self.dist[u] + 1;
                        self.timestamp[v] = self.timestamp[u];
                        self.activate(v);
                    } else if self.tree[v] != this {
                        return Some(ta);
                    } else if self.is_closer(u, v) {
                        self.parent[v] = Parent::Arc(ta);
                        self.dist[v] = self.dist[u] + 1;
                        self.timestamp[v] = self.timestamp[u];
                    }
                }
            }

            self.active.pop_front();
            self.in_active[u] = false;
        }
        None
    }

    /// Augment along the path through the arc `ca` connecting both trees.
    fn augment<N, F>(&mut self, net: &mut ResidualNetwork<N, F>, ca: usize) -> F
    where
        F: FlowNum,
    {
        let mut path = vec![];
        let mut w = net.tail(ca);
        while let Parent::Arc(a) = self.parent[w] {
            path.push(a);
            w = net.tail(a);
        }
        path.reverse();
        path.push(ca);
        let mut w = net.head(ca);
        while let Parent::Arc(a) = self.parent[w] {
            path.push(a);
            w = net.head(a);
        }

        let mut df = net.residual(path[0]);
        for &a in &path[1..] {
            df = min(df, net.residual(a));
        }
        debug_assert!(df > F::zero());

        let mut these_orphans = vec![];
        for &a in &path {
            net.push(a, df);
            if net.is_saturated(a) {
                let (u, v) = (net.tail(a), net.head(a));
                if self.tree[v] == Tree::Source && self.parent[v] == Parent::Arc(a) {
                    self.parent[v] = Parent::Orphan;
                    these_orphans.push(v);
                }
                if self.tree[u] == Tree::Sink && self.parent[u] == Parent::Arc(a) {
                    self.parent[u] = Parent::Orphan;
                    these_orphans.push(u);
                }
            }
        }
        trace!("Augment {} along {} arcs, {} orphans", df, path.len(), these_orphans.len());

        these_orphans.sort_by_key(|&u| self.dist[u]);
        self.orphans.extend(these_orphans);

        df
    }

    /// Walk up from `v` until the root or a node verified in this round.
    ///
    /// The visited nodes are stored in `path`.
    fn check_root<N, F>(&self, net: &ResidualNetwork<N, F>, v: usize, path: &mut Vec<usize>) -> RootCheck
    where
        F: FlowNum,
    {
        let mut w = v;
        loop {
            path.push(w);
            if self.parent[w] == Parent::Root {
                return RootCheck::Rooted { base_dist: 0 };
            }
            if self.timestamp[w] == self.time {
                return RootCheck::Rooted {
                    base_dist: self.dist[w],
                };
            }
            match self.parent_node(net, w) {
                Some(p) => w = p,
                None => return RootCheck::Detached,
            }
        }
    }

    /// Return `true` if `v` is connected to the root of its tree.
    ///
    /// Updates distances and timestamps along the path.
    fn has_valid_root<N, F>(&mut self, net: &ResidualNetwork<N, F>, v: usize) -> bool
    where
        F: FlowNum,
    {
        let mut path = vec![];
        match self.check_root(net, v, &mut path) {
            RootCheck::Detached => false,
            RootCheck::Rooted { base_dist } => {
                let len = path.len();
                for (i, &u) in path.iter().enumerate() {
                    self.dist[u] = base_dist + len - 1 - i;
                    self.timestamp[u] = self.time;
                }
                true
            }
        }
    }

    /// Find new parents for all orphans or remove them from their trees.
    fn adopt<N, F>(&mut self, net: &ResidualNetwork<N, F>)
    where
        F: FlowNum,
    {
        while let Some(u) = self.orphans.pop_front() {
            let this = self.tree[u];

            // neighbors in the same tree, closest first
            let mut nbrs: Vec<(usize, usize)> = net
                .arcs(u)
                .iter()
                .map(|&a| (a, net.head(a)))
                .filter(|&(_, v)| self.tree[v] == this)
                .collect();
            nbrs.sort_by_key(|&(_, v)| self.dist[v]);

            let mut adopted = false;
            for &(a, v) in &nbrs {
                // the arc from v to u in tree direction
                let ta = Self::tree_arc(this, a ^ 1);
                if net.residual(ta) > F::zero() && self.has_valid_root(net, v) {
                    self.parent[u] = Parent::Arc(ta);
                    self.dist[u] = self.dist[v] + 1;
                    self.timestamp[u] = self.time;
                    adopted = true;
                    break;
                }
            }
            if adopted {
                continue;
            }

            // no parent found, remove u from the tree
            for &(a, v) in &nbrs {
                if net.residual(Self::tree_arc(this, a ^ 1)) > F::zero() {
                    self.activate(v);
                }
                if self.parent_node(net, v) == Some(u) {
                    self.parent[v] = Parent::Orphan;
                    self.orphans.push_front(v);
                }
            }
            self.tree[u] = Tree::Free;
            self.parent[u] = Parent::Orphan;
            self.in_active[u] = false;
            self.cnt_free += 1;
        }
    }
}

impl<F> MaxFlowSolver<F> for BoykovKolmogorov
where
    F: FlowNum,
{
    fn solve<N>(&mut self, net: &mut ResidualNetwork<N, F>, cutoff: Option<F>) -> F {
        self.init(net);

        let mut value = F::zero();
        while cutoff.map_or(true, |c| value < c) {
            let ca = match self.grow(net) {
                Some(a) => a,
                None => break,
            };
            self.time += 1;
            value += self.augment(net, ca);
            self.cnt_augment += 1;
            self.adopt(net);
        }

        debug!(
            "Boykov-Kolmogorov: {} augmentations, {} freed orphans",
            self.cnt_augment, self.cnt_free
        );
        value
    }
}
