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

//! Graphs as seen by the flow algorithms.
//!
//! The flow algorithms do not depend on a particular graph data
//! structure. They only need to
//!
//! 1. enumerate the nodes,
//! 2. enumerate the outgoing (and, for digraphs, incoming) edges of a
//!    node together with the edge's attributes,
//! 3. know whether the graph is directed and whether it may contain
//!    parallel edges.
//!
//! This is captured by the [`FlowGraph`] trait. Capacities, costs and
//! demands are read from the attributes by a caller chosen key, see
//! [`Attributes`].
//!
//! [`AttrGraph`] is a straightforward implementation keyed by arbitrary
//! hashable node identifiers.
//!
//! # Example
//!
//! ```
//! use rs_flow::graph::{AttrGraph, Attributes, FlowGraph};
//!
//! let mut g = AttrGraph::<&str, f64>::directed();
//! g.add_edge_with("x", "y", &[("capacity", 2.0)]);
//! g.add_edge("y", "z");
//!
//! assert_eq!(g.num_nodes(), 3);
//! let (v, attrs) = g.out_edges(&"x").next().unwrap();
//! assert_eq!(*v, "y");
//! assert_eq!(attrs.attr("capacity"), Some(2.0));
//! assert_eq!(g.in_edges(&"z").count(), 1);
//! assert!(g.out_edges(&"y").all(|(_, a)| a.attr("capacity").is_none()));
//! ```

use crate::value::FlowNum;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::slice::Iter as SliceIter;

/// Attributes of a node or an edge.
pub trait Attributes<F> {
    /// Return the value of the attribute `key` (if it exists).
    fn attr(&self, key: &str) -> Option<F>;
}

/// The default attribute storage: a map from attribute name to value.
pub type AttrMap<F> = HashMap<String, F>;

impl<F> Attributes<F> for HashMap<String, F>
where
    F: Copy,
{
    fn attr(&self, key: &str) -> Option<F> {
        self.get(key).copied()
    }
}

/// A graph that can be handed to the flow algorithms.
///
/// For undirected graphs `out_edges` and `in_edges` both return all
/// incident edges.
pub trait FlowGraph<'a> {
    /// Type of a node identifier.
    type Node: 'a + Clone + Eq + Hash + Debug;

    /// Type of the numeric attribute values.
    type Value: FlowNum;

    /// Type of the node and edge attributes.
    type Attrs: 'a + Attributes<Self::Value>;

    /// Iterator over all nodes.
    type NodeIt: Iterator<Item = &'a Self::Node>;

    /// Iterator over the edges incident to a node.
    ///
    /// Each item is the other end node of the edge and the edge's attributes.
    type EdgeIt: Iterator<Item = (&'a Self::Node, &'a Self::Attrs)>;

    /// Return `true` if the graph is directed.
    fn is_directed(&self) -> bool;

    /// Return `true` if the graph may contain parallel edges.
    fn is_multigraph(&self) -> bool;

    /// Return the number of nodes.
    fn num_nodes(&self) -> usize;

    /// Return `true` if `u` is a node of this graph.
    fn has_node(&self, u: &Self::Node) -> bool;

    /// Return an iterator over all nodes.
    fn nodes(&'a self) -> Self::NodeIt;

    /// Return the attributes of node `u`.
    fn node_attrs(&'a self, u: &Self::Node) -> Option<&'a Self::Attrs>;

    /// Return an iterator over the edges leaving `u`.
    ///
    /// The iterator is empty if `u` is not a node of the graph.
    fn out_edges(&'a self, u: &Self::Node) -> Self::EdgeIt;

    /// Return an iterator over the edges entering `u`.
    ///
    /// The iterator is empty if `u` is not a node of the graph.
    fn in_edges(&'a self, u: &Self::Node) -> Self::EdgeIt;
}

#[derive(Clone, Debug)]
struct EdgeData<F> {
    src: usize,
    snk: usize,
    attrs: AttrMap<F>,
}

/// A graph with attributed nodes and edges.
///
/// Nodes are arbitrary hashable identifiers, numbered in the order they
/// have been added. Unless the graph is a multigraph, adding an edge
/// a second time updates the attributes of the existing edge.
#[derive(Clone, Debug)]
pub struct AttrGraph<N, F> {
    directed: bool,
    multi: bool,
    nodes: Vec<N>,
    node_attrs: Vec<AttrMap<F>>,
    ids: HashMap<N, usize>,
    edges: Vec<EdgeData<F>>,
    /// Outgoing (or, if undirected, all incident) edges of each node.
    outs: Vec<Vec<usize>>,
    /// Incoming edges of each node (digraphs only).
    ins: Vec<Vec<usize>>,
}

impl<N, F> AttrGraph<N, F>
where
    N: Clone + Eq + Hash,
    F: Copy,
{
    fn with_kind(directed: bool, multi: bool) -> Self {
        AttrGraph {
            directed,
            multi,
            nodes: vec![],
            node_attrs: vec![],
            ids: HashMap::new(),
            edges: vec![],
            outs: vec![],
            ins: vec![],
        }
    }

    /// Create an empty directed graph.
    pub fn directed() -> Self {
        Self::with_kind(true, false)
    }

    /// Create an empty undirected graph.
    pub fn undirected() -> Self {
        Self::with_kind(false, false)
    }

    /// Create an empty directed multigraph.
    pub fn multi_directed() -> Self {
        Self::with_kind(true, true)
    }

    /// Create an empty undirected multigraph.
    pub fn multi_undirected() -> Self {
        Self::with_kind(false, true)
    }

    /// Return the number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Add node `u` (if it does not exist yet) and return its number.
    pub fn add_node(&mut self, u: N) -> usize {
        if let Some(&uid) = self.ids.get(&u) {
            return uid;
        }
        let uid = self.nodes.len();
        self.ids.insert(u.clone(), uid);
        self.nodes.push(u);
        self.node_attrs.push(AttrMap::new());
        self.outs.push(vec![]);
        self.ins.push(vec![]);
        uid
    }

    /// Add node `u` (if it does not exist yet) and set some of its attributes.
    pub fn add_node_with(&mut self, u: N, attrs: &[(&str, F)]) -> usize {
        let uid = self.add_node(u);
        for &(key, value) in attrs {
            self.node_attrs[uid].insert(key.to_string(), value);
        }
        uid
    }

    /// Set the attribute `key` of node `u`.
    ///
    /// The node is added if it does not exist.
    pub fn set_node_attr(&mut self, u: N, key: &str, value: F) {
        self.add_node_with(u, &[(key, value)]);
    }

    /// Add an edge without attributes and return its number.
    pub fn add_edge(&mut self, u: N, v: N) -> usize {
        self.add_edge_with(u, v, &[])
    }

    /// Add an edge with the given attributes and return its number.
    ///
    /// Missing end nodes are added. If the graph is not a multigraph and
    /// the edge exists already, the given attributes are updated.
    pub fn add_edge_with(&mut self, u: N, v: N, attrs: &[(&str, F)]) -> usize {
        let uid = self.add_node(u);
        let vid = self.add_node(v);

        let eid = match self.find_edge(uid, vid) {
            Some(eid) if !self.multi => eid,
            _ => {
                let eid = self.edges.len();
                self.edges.push(EdgeData {
                    src: uid,
                    snk: vid,
                    attrs: AttrMap::new(),
                });
                self.outs[uid].push(eid);
                if self.directed {
                    self.ins[vid].push(eid);
                } else if uid != vid {
                    self.outs[vid].push(eid);
                }
                eid
            }
        };

        for &(key, value) in attrs {
            self.edges[eid].attrs.insert(key.to_string(), value);
        }
        eid
    }

    fn find_edge(&self, uid: usize, vid: usize) -> Option<usize> {
        self.outs[uid].iter().copied().find(|&e| {
            let edge = &self.edges[e];
            (edge.src == uid && edge.snk == vid) || (!self.directed && edge.src == vid && edge.snk == uid)
        })
    }

    /// Return the attributes of the edge `(u,v)` (the first one if there are parallel edges).
    pub fn edge_attrs(&self, u: &N, v: &N) -> Option<&AttrMap<F>> {
        let uid = *self.ids.get(u)?;
        let vid = *self.ids.get(v)?;
        self.find_edge(uid, vid).map(|e| &self.edges[e].attrs)
    }

    /// Return an iterator over all edges as `(u, v, attributes)`.
    ///
    /// Each edge is returned exactly once in the order of insertion.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, &AttrMap<F>)> + '_ {
        self.edges
            .iter()
            .map(move |e| (&self.nodes[e.src], &self.nodes[e.snk], &e.attrs))
    }
}

/// Iterator over the incident edges of a node of an [`AttrGraph`].
pub struct Edges<'a, N, F> {
    graph: &'a AttrGraph<N, F>,
    u: usize,
    it: SliceIter<'a, usize>,
}

impl<'a, N, F> Iterator for Edges<'a, N, F> {
    type Item = (&'a N, &'a AttrMap<F>);

    fn next(&mut self) -> Option<Self::Item> {
        let g = self.graph;
        let u = self.u;
        self.it.next().map(|&e| {
            let edge = &g.edges[e];
            let v = if edge.src == u { edge.snk } else { edge.src };
            (&g.nodes[v], &edge.attrs)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, N, F> AttrGraph<N, F> {
    fn incident(&'a self, u: &N, lists: &'a [Vec<usize>]) -> Edges<'a, N, F>
    where
        N: Eq + Hash,
    {
        match self.ids.get(u) {
            Some(&uid) => Edges {
                graph: self,
                u: uid,
                it: lists[uid].iter(),
            },
            None => Edges {
                graph: self,
                u: usize::max_value(),
                it: [].iter(),
            },
        }
    }
}

impl<'a, N, F> FlowGraph<'a> for AttrGraph<N, F>
where
    N: 'a + Clone + Eq + Hash + Debug,
    F: 'a + FlowNum,
{
    type Node = N;
    type Value = F;
    type Attrs = AttrMap<F>;
    type NodeIt = SliceIter<'a, N>;
    type EdgeIt = Edges<'a, N, F>;

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn is_multigraph(&self) -> bool {
        self.multi
    }

    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn has_node(&self, u: &N) -> bool {
        self.ids.contains_key(u)
    }

    fn nodes(&'a self) -> SliceIter<'a, N> {
        self.nodes.iter()
    }

    fn node_attrs(&'a self, u: &N) -> Option<&'a AttrMap<F>> {
        self.ids.get(u).map(|&uid| &self.node_attrs[uid])
    }

    fn out_edges(&'a self, u: &N) -> Edges<'a, N, F> {
        self.incident(u, &self.outs)
    }

    fn in_edges(&'a self, u: &N) -> Edges<'a, N, F> {
        if self.directed {
            self.incident(u, &self.ins)
        } else {
            self.incident(u, &self.outs)
        }
    }
}
