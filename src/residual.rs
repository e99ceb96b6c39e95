/*
 * Copyright (c) 2017-2022 Frank Fischer <frank-fischer@shadow-soft.de>
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

//! The residual network shared by all maximum flow algorithms.
//!
//! The residual network has the same nodes as the input graph, which are
//! numbered `0..n` in the order of [`FlowGraph::nodes`]. For each pair of
//! adjacent nodes `u` and `v` there is exactly one pair of arcs `(u,v)`
//! and `(v,u)`. The arcs of a pair are numbered `2*i` and `2*i+1`, so the
//! reverse of arc `a` is `a ^ 1`.
//!
//! - A directed edge `(u,v)` with capacity `c` gives arc `(u,v)` the
//!   capacity `c`. If there is no edge `(v,u)`, the reverse arc has
//!   capacity `0`.
//! - An undirected edge `{u,v}` gives both arcs the capacity `c`.
//!
//! Only a single flow value is stored per pair, the flow on the odd arc
//! is the negation of the flow on the even arc. Hence `flow(a) ==
//! -flow(a ^ 1)` holds at all times.
//!
//! Edges without capacity attribute (or with an infinite one) get the
//! finite capacity `inf`, which is three times the sum of all finite
//! capacities (or `1` if there are none). No flow built from finite
//! capacities can saturate such an arc. If the capacities are close to
//! the largest value of the number type, `inf` is lowered such that the
//! capacities of all arcs still add up to a representable value.

use crate::error::{FlowError, Result};
use crate::graph::{Attributes, FlowGraph};
use crate::value::{stand_in_for_infinity, FlowNum};

use log::debug;

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

fn too_large(capacity: &str) -> FlowError {
    FlowError::InvalidInput(format!("the {} values exceed the range of the number type", capacity))
}

/// A flow given as map from node to (neighbor to flow amount).
pub type FlowMap<N, F> = HashMap<N, HashMap<N, F>>;

/// A residual network.
///
/// See the [module documentation](self) for the representation.
#[derive(Clone, Debug)]
pub struct ResidualNetwork<N, F> {
    nodes: Vec<N>,
    ids: HashMap<N, usize>,
    src: usize,
    snk: usize,
    /// The arcs leaving each node.
    adj: Vec<Vec<usize>>,
    /// The head of each arc.
    heads: Vec<usize>,
    /// The capacity of each arc.
    caps: Vec<F>,
    /// The flow on the even arc of each pair.
    flows: Vec<F>,
    /// The pair of arcs for each pair of nodes `(u,v)` with `u < v`.
    pairs: HashMap<(usize, usize), usize>,
    /// The finite stand-in for unbounded capacities.
    inf: F,
}

impl<N, F> ResidualNetwork<N, F>
where
    N: Clone + Eq + Hash + Debug,
    F: FlowNum,
{
    /// Build the residual network of `g` with zero flow.
    ///
    /// The capacity of each edge is read from the attribute `capacity`.
    ///
    /// # Errors
    ///
    /// - [`FlowError::UnsupportedGraphKind`] if `g` is a multigraph,
    /// - [`FlowError::InvalidEndpoints`] if `src` or `snk` are not nodes
    ///   of `g` or if they are equal,
    /// - [`FlowError::InvalidInput`] if some capacity is negative or if
    ///   the capacities are too large for the number type.
    pub fn build<'a, G>(g: &'a G, src: &N, snk: &N, capacity: &str) -> Result<Self>
    where
        N: 'a,
        G: FlowGraph<'a, Node = N, Value = F>,
    {
        if g.is_multigraph() {
            return Err(FlowError::UnsupportedGraphKind("multigraphs are not supported"));
        }

        let nodes: Vec<N> = g.nodes().cloned().collect();
        let ids: HashMap<N, usize> = nodes.iter().cloned().enumerate().map(|(i, u)| (u, i)).collect();

        let s = *ids
            .get(src)
            .ok_or_else(|| FlowError::InvalidEndpoints(format!("source node {:?} not in graph", src)))?;
        let t = *ids
            .get(snk)
            .ok_or_else(|| FlowError::InvalidEndpoints(format!("sink node {:?} not in graph", snk)))?;
        if s == t {
            return Err(FlowError::InvalidEndpoints("source and sink are the same node".to_string()));
        }

        // Collect all edges with positive (or unbounded) capacity. Undirected
        // edges are visited from both end nodes, only the first visit counts.
        let directed = g.is_directed();
        let arcs_per_edge = if directed { 1 } else { 2 };
        let mut edges = Vec::new();
        let mut total = F::zero();
        let mut mass = F::zero();
        let mut num_unbounded = 0;
        for (uid, u) in nodes.iter().enumerate() {
            for (v, attrs) in g.out_edges(u) {
                let vid = match ids.get(v) {
                    Some(&vid) => vid,
                    None => continue,
                };
                if uid == vid || (!directed && vid < uid) {
                    continue;
                }
                let cap = match attrs.attr(capacity) {
                    Some(c) if c < F::zero() => {
                        return Err(FlowError::InvalidInput(format!(
                            "edge ({:?}, {:?}) has negative capacity {}",
                            u, v, c
                        )))
                    }
                    Some(c) if c.is_unbounded() => None,
                    Some(c) if c.is_zero() => continue,
                    Some(c) => {
                        total = total.checked_plus(c).ok_or_else(|| too_large(capacity))?;
                        for _ in 0..arcs_per_edge {
                            mass = mass.checked_plus(c).ok_or_else(|| too_large(capacity))?;
                        }
                        Some(c)
                    }
                    None => None,
                };
                if cap.is_none() {
                    num_unbounded += arcs_per_edge;
                }
                edges.push((uid, vid, cap));
            }
        }

        let inf = stand_in_for_infinity(total, mass, num_unbounded).ok_or_else(|| too_large(capacity))?;

        let n = nodes.len();
        let mut net = ResidualNetwork {
            nodes,
            ids,
            src: s,
            snk: t,
            adj: vec![vec![]; n],
            heads: Vec::with_capacity(edges.len() * 2),
            caps: Vec::with_capacity(edges.len() * 2),
            flows: Vec::with_capacity(edges.len()),
            pairs: HashMap::with_capacity(edges.len()),
            inf,
        };

        for (u, v, cap) in edges {
            let cap = cap.unwrap_or(net.inf);
            let a = net.add_arc(u, v);
            net.caps[a] = cap;
            if !directed {
                net.caps[a ^ 1] = cap;
            }
        }

        debug!(
            "Residual network: {} nodes, {} arcs, inf = {}",
            net.num_nodes(),
            net.num_arcs(),
            net.inf
        );

        Ok(net)
    }

    /// Return the arc `(u,v)`, creating the arc pair if necessary.
    fn add_arc(&mut self, u: usize, v: usize) -> usize {
        let key = (u.min(v), u.max(v));
        let p = match self.pairs.get(&key) {
            Some(&p) => p,
            None => {
                let p = self.flows.len();
                let (lo, hi) = key;
                self.heads.push(hi);
                self.heads.push(lo);
                self.caps.push(F::zero());
                self.caps.push(F::zero());
                self.flows.push(F::zero());
                self.adj[lo].push(p << 1);
                self.adj[hi].push((p << 1) | 1);
                self.pairs.insert(key, p);
                p
            }
        };
        if u < v {
            p << 1
        } else {
            (p << 1) | 1
        }
    }

    /// Fail if the source reaches the sink using unbounded arcs only.
    ///
    /// The flow would be unbounded above in this case.
    pub fn check_bounded(&self) -> Result<()> {
        let mut seen = vec![false; self.num_nodes()];
        let mut queue = VecDeque::new();
        seen[self.src] = true;
        queue.push_back(self.src);
        while let Some(u) = queue.pop_front() {
            for &a in &self.adj[u] {
                let v = self.heads[a];
                if !seen[v] && self.is_unbounded(a) {
                    if v == self.snk {
                        return Err(FlowError::UnboundedFlow);
                    }
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        Ok(())
    }

    /// Return the flow on each edge of `g`.
    ///
    /// The map contains an entry for every edge `(u,v)` of `g` (for
    /// undirected graphs in both directions). Only positive flows are
    /// reported, all other entries are zero.
    pub fn flow_map<'a, G>(&self, g: &'a G) -> FlowMap<N, F>
    where
        N: 'a,
        G: FlowGraph<'a, Node = N, Value = F>,
    {
        let mut flows = FlowMap::with_capacity(g.num_nodes());
        for u in g.nodes() {
            let uid = self.ids.get(u).copied();
            let mut out = HashMap::new();
            for (v, _) in g.out_edges(u) {
                let f = uid
                    .and_then(|uid| self.ids.get(v).and_then(|&vid| self.arc_between(uid, vid)))
                    .map(|a| self.flow(a))
                    .filter(|&f| f > F::zero())
                    .unwrap_or_else(F::zero);
                out.insert(v.clone(), f);
            }
            flows.insert(u.clone(), out);
        }
        flows
    }

    /// Return the number of the node `u`.
    pub fn node_id(&self, u: &N) -> Option<usize> {
        self.ids.get(u).copied()
    }
}

impl<N, F> ResidualNetwork<N, F>
where
    F: FlowNum,
{
    /// Return the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of arcs (twice the number of arc pairs).
    pub fn num_arcs(&self) -> usize {
        self.heads.len()
    }

    /// Return the node with number `u`.
    pub fn node(&self, u: usize) -> &N {
        &self.nodes[u]
    }

    /// Return the source node.
    pub fn source(&self) -> usize {
        self.src
    }

    /// Return the sink node.
    pub fn sink(&self) -> usize {
        self.snk
    }

    /// Return the capacity used for unbounded arcs.
    pub fn inf(&self) -> F {
        self.inf
    }

    /// Return the arcs leaving node `u`.
    pub fn arcs(&self, u: usize) -> &[usize] {
        &self.adj[u]
    }

    /// Return the head of arc `a`.
    pub fn head(&self, a: usize) -> usize {
        self.heads[a]
    }

    /// Return the tail of arc `a`.
    pub fn tail(&self, a: usize) -> usize {
        self.heads[a ^ 1]
    }

    /// Return the arc from `u` to `v`.
    pub fn arc_between(&self, u: usize, v: usize) -> Option<usize> {
        self.pairs
            .get(&(u.min(v), u.max(v)))
            .map(|&p| if u < v { p << 1 } else { (p << 1) | 1 })
    }

    /// Return the capacity of arc `a`.
    pub fn cap(&self, a: usize) -> F {
        self.caps[a]
    }

    /// Return `true` if arc `a` has unbounded capacity.
    pub fn is_unbounded(&self, a: usize) -> bool {
        self.caps[a] >= self.inf
    }

    /// Return the flow on arc `a`.
    pub fn flow(&self, a: usize) -> F {
        if a & 1 == 0 {
            self.flows[a >> 1]
        } else {
            -self.flows[a >> 1]
        }
    }

    /// Return the residual capacity of arc `a`.
    pub fn residual(&self, a: usize) -> F {
        self.caps[a] - self.flow(a)
    }

    /// Return `true` if arc `a` has no residual capacity.
    pub fn is_saturated(&self, a: usize) -> bool {
        self.residual(a) <= F::zero()
    }

    /// Send `df` units of flow along arc `a`.
    ///
    /// This decreases the flow on the reverse arc by the same amount.
    pub fn push(&mut self, a: usize, df: F) {
        debug_assert!(df <= self.residual(a), "push of {} exceeds residual capacity", df);
        if a & 1 == 0 {
            self.flows[a >> 1] += df;
        } else {
            self.flows[a >> 1] -= df;
        }
    }

    /// Return the excess of node `u`, i.e. the inflow minus the outflow.
    pub fn excess(&self, u: usize) -> F {
        let mut ex = F::zero();
        for &a in &self.adj[u] {
            ex -= self.flow(a);
        }
        ex
    }

    /// Remove all flow.
    pub fn reset_flow(&mut self) {
        for f in &mut self.flows {
            *f = F::zero();
        }
    }
}
