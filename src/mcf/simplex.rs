/*
 * Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
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

//! A primal network simplex implementation.
//!
//! The basis tree is rooted at an artificial node connected to every node
//! by an artificial edge. The tree is stored by parent pointers, subtree
//! sizes and a preorder thread (`prev`, `next` and `last` node of each
//! subtree), which allows updating it after a pivot in time proportional
//! to the changed part.
//!
//! Unbounded capacities are replaced by a finite value that no feasible
//! flow of finite cost can reach. If some unbounded edge carries at least
//! half of that value, the problem has a negative cycle of unbounded
//! capacity.

use super::SolutionState;
use crate::error::{FlowError, Result};
use crate::graph::{Attributes, FlowGraph};
use crate::residual::FlowMap;
use crate::value::{approx_eq, min, saturating_add, saturating_mul, stand_in_for_infinity, FlowNum};

use log::{debug, trace};

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

const NONE: usize = usize::MAX;

/// Rule for selecting the entering edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pricing {
    /// The first edge with negative reduced cost after the last entering edge.
    RoundRobin,
    /// The edge with the most negative reduced cost.
    Complete,
    /// The edge with the most negative reduced cost in the next block of
    /// edges containing a candidate.
    Block,
}

/// The state of a non-artificial edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum EdgeState {
    /// Non-basic with zero flow.
    Lower,
    /// Non-basic and saturated.
    Upper,
    Basic,
}

/// An edge of the input graph.
#[derive(Clone, Copy, Debug)]
enum EdgeRef {
    /// An edge of the simplex network.
    Arc(usize),
    /// A self-loop.
    Loop(usize),
}

/// A self-loop, which is not part of the simplex network.
#[derive(Clone, Copy, Debug)]
struct SelfLoop<F> {
    cap: Option<F>,
    cost: F,
}

/// A primal network simplex algorithm.
pub struct NetworkSimplex<N, F> {
    nodes: Vec<N>,
    ids: HashMap<N, usize>,
    /// All input edges in graph order.
    edges: Vec<(usize, usize, EdgeRef)>,
    loops: Vec<SelfLoop<F>>,
    /// Whether the capacity of each (real) edge is unbounded.
    unbounded: Vec<bool>,
    /// The number of real edges.
    num_arcs: usize,

    balances: Vec<F>,
    potentials: Vec<F>,
    subtrees: Vec<usize>,
    parent_edges: Vec<usize>,
    parent_nodes: Vec<usize>,

    prev_preorder: Vec<usize>, // Previous node in preorder node list
    next_preorder: Vec<usize>, // Next node in preorder node list
    last_preorder: Vec<usize>, // Last successor in preorder node list that is a child node

    sources: Vec<usize>,
    sinks: Vec<usize>,
    costs: Vec<F>,
    caps: Vec<F>,
    flows: Vec<F>,
    state: Vec<EdgeState>,

    pub pricing: Pricing,
    current_edge: usize,
    block_size: usize,
    /// The (flow) value to be considered zero. Defaults to `F::zero()`.
    pub zero: F,

    niter: usize,
    solution_state: SolutionState,
    need_new_basis: bool,

    /// The artificial cost value.
    ///
    /// Should be larger than the value of any augmenting cycle. If
    /// `None` (the default) the artificial cost is set to
    /// `(max |cost| + 1) * n`, which should be large enough. The default
    /// saturates at the largest value of `F`.
    pub artificial_cost: Option<F>,
    /// The finite replacement of unbounded capacities.
    faux_inf: F,
    /// Flow on an unbounded edge reaching this value means unbounded cost.
    unbounded_flow: F,
    /// The capacity of artificial edges.
    infinite: F,
}

impl<N, F> NetworkSimplex<N, F>
where
    N: Clone + Eq + Hash + Debug,
    F: FlowNum,
{
    /// Create the min-cost-flow problem of `g`.
    ///
    /// The node demands (negative for supply), edge capacities and edge
    /// costs are read from the attributes `demand`, `capacity` and
    /// `weight`. Missing demands and costs are zero, missing capacities
    /// are unbounded.
    ///
    /// # Errors
    ///
    /// - [`FlowError::UnsupportedGraphKind`] if `g` is undirected or a multigraph,
    /// - [`FlowError::Infeasible`] if some capacity is negative,
    /// - [`FlowError::InvalidInput`] if some demand or cost is infinite or
    ///   if the capacities and demands are too large for the number type.
    pub fn new<'a, G>(g: &'a G, demand: &str, capacity: &str, weight: &str) -> Result<Self>
    where
        N: 'a,
        G: FlowGraph<'a, Node = N, Value = F>,
    {
        if !g.is_directed() {
            return Err(FlowError::UnsupportedGraphKind("minimum cost flow requires a directed graph"));
        }
        if g.is_multigraph() {
            return Err(FlowError::UnsupportedGraphKind("multigraphs are not supported"));
        }

        let nodes: Vec<N> = g.nodes().cloned().collect();
        let ids: HashMap<N, usize> = nodes.iter().cloned().enumerate().map(|(i, u)| (u, i)).collect();
        let n = nodes.len();

        let mut balances = Vec::with_capacity(n);
        let mut max_demand = F::zero();
        for u in &nodes {
            let d = g.node_attrs(u).and_then(|attrs| attrs.attr(demand)).unwrap_or_else(F::zero);
            if d.is_unbounded() {
                return Err(FlowError::InvalidInput(format!("node {:?} has infinite demand", u)));
            }
            if d.abs() > max_demand {
                max_demand = d.abs();
            }
            balances.push(-d);
        }

        let mut edges = vec![];
        let mut loops = vec![];
        let mut arcs = vec![];
        let mut cap_sum = F::zero();
        let mut cost_sum = F::zero();
        for (uid, u) in nodes.iter().enumerate() {
            for (v, attrs) in g.out_edges(u) {
                let vid = match ids.get(v) {
                    Some(&vid) => vid,
                    None => continue,
                };
                let cap = match attrs.attr(capacity) {
                    Some(c) if c < F::zero() => {
                        return Err(FlowError::Infeasible(format!(
                            "edge ({:?}, {:?}) has negative capacity {}",
                            u, v, c
                        )))
                    }
                    Some(c) if c.is_unbounded() => None,
                    c => c,
                };
                let cost = attrs.attr(weight).unwrap_or_else(F::zero);
                if cost.is_unbounded() {
                    return Err(FlowError::InvalidInput(format!("edge ({:?}, {:?}) has infinite weight", u, v)));
                }
                if let Some(c) = cap {
                    cap_sum = saturating_add(cap_sum, c);
                }
                cost_sum = saturating_add(cost_sum, cost.abs());

                if uid == vid {
                    edges.push((uid, vid, EdgeRef::Loop(loops.len())));
                    loops.push(SelfLoop { cap, cost });
                } else {
                    edges.push((uid, vid, EdgeRef::Arc(arcs.len())));
                    arcs.push((uid, vid, cap, cost));
                }
            }
        }

        let mut base = cap_sum;
        for &x in &[cost_sum, max_demand] {
            if x > base {
                base = x;
            }
        }
        // Initial node balances contain the flow of unbounded edges of
        // negative cost, which start at their upper bound. The result must
        // stay below the capacity of artificial edges.
        let num_negative = arcs.iter().filter(|a| a.2.is_none() && a.3 < F::zero()).count();
        let faux_inf = max_demand
            .checked_plus(cap_sum)
            .and_then(|mass| stand_in_for_infinity(base, mass, num_negative))
            .map(|inf| min(inf, F::max_value() - F::one()))
            .filter(|&inf| inf > base)
            .ok_or_else(|| {
                FlowError::InvalidInput("capacities and demands exceed the range of the number type".to_string())
            })?;

        let m = arcs.len();
        let mut spx = NetworkSimplex {
            nodes,
            ids,
            edges,
            loops,
            unbounded: arcs.iter().map(|a| a.2.is_none()).collect(),
            num_arcs: m,

            balances,
            potentials: vec![F::zero(); n + 1],
            subtrees: vec![0; n + 1],
            parent_edges: vec![0; n + 1],
            parent_nodes: vec![0; n + 1],

            prev_preorder: vec![0; n + 1],
            next_preorder: vec![0; n + 1],
            last_preorder: vec![0; n + 1],

            sources: vec![0; m + n],
            sinks: vec![0; m + n],
            costs: vec![F::zero(); m + n],
            caps: vec![F::zero(); m + n],
            flows: vec![F::zero(); m + n],
            state: vec![EdgeState::Lower; m + n],

            pricing: Pricing::Block,
            current_edge: 0,
            block_size: 0,
            zero: F::zero(),

            niter: 0,
            solution_state: SolutionState::Unknown,
            need_new_basis: true,

            artificial_cost: None,
            faux_inf,
            unbounded_flow: faux_inf - base,
            infinite: F::max_value(),
        };

        for (eid, &(u, v, cap, cost)) in arcs.iter().enumerate() {
            spx.sources[eid] = u;
            spx.sinks[eid] = v;
            spx.caps[eid] = cap.unwrap_or(faux_inf);
            spx.costs[eid] = cost;
        }
        // The artificial edges will be initialized when the initial
        // basis is prepared.

        debug!(
            "Network simplex: {} nodes, {} edges, {} self-loops, faux infinity {}",
            n,
            m,
            spx.loops.len(),
            faux_inf
        );

        Ok(spx)
    }

    /// Return the balance (supply) of node `u`, i.e. its negative demand.
    pub fn balance(&self, u: &N) -> Option<F> {
        self.ids.get(u).map(|&uid| self.balances[uid])
    }

    /// Set the balance (supply) of node `u`.
    ///
    /// Returns `false` if `u` is not a node of the problem.
    pub fn set_balance(&mut self, u: &N, balance: F) -> bool {
        match self.ids.get(u) {
            Some(&uid) => {
                self.need_new_basis = true;
                self.solution_state = SolutionState::Unknown;
                self.balances[uid] = balance;
                true
            }
            None => false,
        }
    }

    /// Set the balance of all nodes to zero.
    pub fn clear_balances(&mut self) {
        self.need_new_basis = true;
        self.solution_state = SolutionState::Unknown;
        for b in &mut self.balances {
            *b = F::zero();
        }
    }

    /// Return the cost of the latest computed flow.
    pub fn value(&self) -> F {
        let mut v = F::zero();
        for eid in 0..self.num_arcs {
            v += self.flows[eid] * self.costs[eid];
        }
        for l in 0..self.loops.len() {
            v += self.loop_flow(l) * self.loops[l].cost;
        }
        v
    }

    /// Return the flow on the edge `(u, v)`.
    pub fn flow(&self, u: &N, v: &N) -> Option<F> {
        let uid = *self.ids.get(u)?;
        let vid = *self.ids.get(v)?;
        self.edges
            .iter()
            .find(|&&(x, y, _)| x == uid && y == vid)
            .map(|&(_, _, r)| self.edge_flow(r))
    }

    /// Return the flow on each edge.
    pub fn flow_map(&self) -> FlowMap<N, F> {
        let mut flows: FlowMap<N, F> = self.nodes.iter().map(|u| (u.clone(), HashMap::new())).collect();
        for &(u, v, r) in &self.edges {
            if let Some(out) = flows.get_mut(&self.nodes[u]) {
                out.insert(self.nodes[v].clone(), self.edge_flow(r));
            }
        }
        flows
    }

    fn edge_flow(&self, r: EdgeRef) -> F {
        match r {
            EdgeRef::Arc(eid) => self.flows[eid],
            EdgeRef::Loop(l) => self.loop_flow(l),
        }
    }

    /// Self-loops of negative cost are saturated.
    fn loop_flow(&self, l: usize) -> F {
        let SelfLoop { cap, cost } = self.loops[l];
        if cost < F::zero() {
            cap.unwrap_or(self.faux_inf)
        } else {
            F::zero()
        }
    }

    /// Solve the min-cost-flow problem.
    pub fn solve(&mut self) -> SolutionState {
        self.niter = 0;
        self.solution_state = self.run();
        debug!(
            "Network simplex: {:?} after {} iterations",
            self.solution_state, self.niter
        );
        self.solution_state
    }

    /// Return the solution state of the latest computation.
    pub fn solution_state(&self) -> SolutionState {
        self.solution_state
    }

    pub fn num_iterations(&self) -> usize {
        self.niter
    }

    fn run(&mut self) -> SolutionState {
        let mut total = F::zero();
        for &b in &self.balances {
            total += b;
        }
        if !approx_eq(total, F::zero()) {
            return SolutionState::Infeasible;
        }

        if self.loops.iter().any(|l| l.cost < F::zero() && l.cap.is_none()) {
            return SolutionState::Unbounded;
        }

        // check trivial cases
        if self.nodes.is_empty() {
            return SolutionState::Optimal;
        }

        if self.num_arcs == 0 {
            // check if all balances are zero, that's the only way to be feasible
            return if self.balances.iter().all(|b| b.is_zero()) {
                SolutionState::Optimal
            } else {
                SolutionState::Infeasible
            };
        }

        self.initialize_pricing();

        if self.need_new_basis {
            self.prepare_initial_basis();
        }

        self.initialize_node_potentials();

        loop {
            self.niter += 1;
            if let Some(eid) = self.find_entering_edge() {
                if !self.augment_cycle(eid) {
                    return SolutionState::Unbounded;
                }
            } else {
                break;
            }
        }

        if !self.check_feasibility() {
            return SolutionState::Infeasible;
        }

        let bound = self.unbounded_flow;
        if (0..self.num_arcs).any(|eid| self.unbounded[eid] && self.flows[eid] >= bound) {
            return SolutionState::Unbounded;
        }

        SolutionState::Optimal
    }

    fn initialize_pricing(&mut self) {
        match self.pricing {
            Pricing::RoundRobin => self.current_edge = 0,
            Pricing::Complete => (),
            Pricing::Block => {
                self.current_edge = 0;
                self.block_size = ((self.num_arcs as f64).sqrt() * 0.5).round().max(10.0) as usize;
            }
        }
    }

    fn prepare_initial_basis(&mut self) {
        let n = self.nodes.len();
        let m = self.num_arcs;
        // The artificial node is always the root of the basis tree
        let root = n;

        // modified balances of each node
        let mut balances = self.balances.clone();
        balances.push(F::zero());

        // compute the cost value for the artificial edges
        let artificial_cost = self.artificial_cost.unwrap_or_else(|| {
            let mut value = F::zero();
            for &c in &self.costs[..m] {
                if c.abs() > value {
                    value = c.abs();
                }
            }
            let n = <F as crate::num::traits::NumCast>::from(n).unwrap_or_else(F::max_value);
            saturating_mul(n, saturating_add(F::one(), value))
        });
        trace!("Artificial cost {}", artificial_cost);

        self.subtrees[root] = n + 1;
        self.parent_edges[root] = NONE;
        self.parent_nodes[root] = NONE;

        self.prev_preorder[root] = NONE;
        self.next_preorder[root] = 0;
        self.last_preorder[root] = n - 1;

        // Initial flow on all non-artificial edges is at lower or upper bound depending on the cost
        for eid in 0..m {
            let flw = if self.costs[eid] >= F::zero() {
                self.state[eid] = EdgeState::Lower;
                F::zero()
            } else {
                self.state[eid] = EdgeState::Upper;
                self.caps[eid]
            };
            self.flows[eid] = flw;

            // Update artificial balances
            balances[self.sources[eid]] -= flw;
            balances[self.sinks[eid]] += flw;
        }

        // The initial basis consists of the artificial edges only
        for vid in 0..n {
            self.subtrees[vid] = 1;
            // Set the initial flow on the artificial edges
            let eid = m + vid;
            let fid; // the parent edge, oriented from the artificial node (the root) to v
            let b; // the balance / initial flow on the artificial edge
            if balances[vid] >= F::zero() {
                fid = (eid << 1) | 1;
                b = balances[vid];
                self.costs[eid] = F::zero();
                // this edge is oriented from v to the artificial node
                self.sources[eid] = vid;
                self.sinks[eid] = root;
            } else {
                fid = eid << 1;
                b = -balances[vid];
                self.costs[eid] = artificial_cost;
                // this edge is oriented from the artificial node to v
                self.sources[eid] = root;
                self.sinks[eid] = vid;
            }

            self.caps[eid] = self.infinite;
            self.flows[eid] = b;
            self.state[eid] = EdgeState::Basic;

            self.parent_nodes[vid] = root;
            self.parent_edges[vid] = fid;
            self.prev_preorder[vid] = if vid > 0 { vid - 1 } else { n };
            self.next_preorder[vid] = if vid + 1 < n { vid + 1 } else { NONE };
            self.last_preorder[vid] = vid; // all subtrees are empty
        }

        self.need_new_basis = false;
    }

    fn initialize_node_potentials(&mut self) {
        let root = self.nodes.len();
        self.potentials[root] = F::zero();

        let mut uid = self.next_preorder[root];
        while uid != NONE {
            let eid = self.parent_edges[uid];
            let vid = self.parent_nodes[uid];
            self.potentials[uid] = self.potentials[vid] + oriented_flow(eid, self.costs[eid >> 1]);
            uid = self.next_preorder[uid];
        }
    }

    fn update_node_potentials(&mut self, uentering: usize) {
        let eid = self.parent_edges[uentering];
        let vid = self.parent_nodes[uentering];
        let sigma = self.potentials[vid] - self.potentials[uentering] + oriented_flow(eid, self.costs[eid >> 1]);
        let uend = self.next_preorder[self.last_preorder[uentering]];
        let mut uid = uentering;
        while uid != uend {
            self.potentials[uid] += sigma;
            uid = self.next_preorder[uid];
        }
    }

    /// Return the residual capacity of oriented edge `f` in direction of
    /// the cycle (`fwd`) or against it.
    fn cycle_capacity(&self, f: usize, fwd: bool) -> F {
        if ((f & 1) != 0) == fwd {
            self.flows[f >> 1]
        } else if self.caps[f >> 1] != self.infinite {
            self.caps[f >> 1] - self.flows[f >> 1]
        } else {
            self.infinite
        }
    }

    /// Pivot on the oriented entering edge `e_in`.
    ///
    /// Returns `false` if the cycle has unbounded capacity.
    fn augment_cycle(&mut self, e_in: usize) -> bool {
        // e = (u,v)
        let (mut u_in, mut v_in) = if (e_in & 1) == 0 {
            (self.sources[e_in >> 1], self.sinks[e_in >> 1])
        } else {
            (self.sinks[e_in >> 1], self.sources[e_in >> 1])
        };

        // Obtain free capacity on entering edge
        let mut d = self.caps[e_in >> 1];

        // Compute maximal flow augmentation value and determine base-leaving-edge.
        //
        // Among several edges of minimal capacity the first one found is
        // chosen, walking up from both ends of the entering edge and always
        // continuing on the side with the smaller subtree.
        let mut v_out = None;
        let mut e_out_fwd = true;
        let mut uid = u_in;
        let mut vid = v_in;
        while uid != vid {
            let fwd = self.subtrees[uid] < self.subtrees[vid];
            // Edges on the side of u are in forward direction on the cycle
            // Edges on the side of v are in backward direction on the cycle
            let nodeid = if fwd { uid } else { vid };

            let flw = self.cycle_capacity(self.parent_edges[nodeid], fwd);
            if flw < d {
                d = flw;
                v_out = Some(nodeid);
                e_out_fwd = fwd;
            }

            if fwd {
                uid = self.parent_nodes[uid]
            } else {
                vid = self.parent_nodes[vid]
            };
        }

        if d >= self.infinite {
            return false;
        }

        // vid is the common ancestor, i.e. the "top-most" node on the
        // cycle in the basis tree.
        let ancestorid = vid;

        // Augment the flow on the basis entering edge.
        self.flows[e_in >> 1] = if self.state[e_in >> 1] == EdgeState::Lower {
            d
        } else {
            self.caps[e_in >> 1] - d
        };

        // Check if e_in stays in non-basis
        let v_out = match v_out {
            Some(v_out) => v_out,
            None => {
                // switch bound
                self.state[e_in >> 1] = match self.state[e_in >> 1] {
                    EdgeState::Lower => EdgeState::Upper,
                    _ => EdgeState::Lower,
                };
                // update flow on cycle
                let mut uid = u_in;
                let mut vid = v_in;
                while uid != ancestorid {
                    let f = self.parent_edges[uid];
                    self.flows[f >> 1] += oriented_flow(f, d);
                    uid = self.parent_nodes[uid];
                }
                while vid != ancestorid {
                    let f = self.parent_edges[vid];
                    self.flows[f >> 1] -= oriented_flow(f, d);
                    vid = self.parent_nodes[vid];
                }
                return true;
            }
        };
        let u_out = self.parent_nodes[v_out];

        // ************************************************************
        // update the basis tree
        // ************************************************************

        self.state[e_in >> 1] = EdgeState::Basic; // e_in enters the basis

        // The basis leaving edge should be on the side of u, so possibly reverse e_in.
        let e_out = self.parent_edges[v_out];
        let e_in = if e_out_fwd {
            self.state[e_out >> 1] = if (e_out & 1) == 0 {
                EdgeState::Upper
            } else {
                EdgeState::Lower
            };
            e_in
        } else {
            self.state[e_out >> 1] = if (e_out & 1) == 0 {
                EdgeState::Lower
            } else {
                EdgeState::Upper
            };
            // swap this edge
            d = -d;
            std::mem::swap(&mut u_in, &mut v_in);
            e_in ^ 1
        };

        let mut uid = u_in;
        let mut vid = v_in;
        let orig_v_out_last = self.last_preorder[v_out];
        let orig_v_out_prev = self.prev_preorder[v_out];
        let orig_v_in_last = self.last_preorder[v_in];
        let orig_ancestor_last = self.last_preorder[ancestorid];

        // Special case: entering and leaving edges are parallel
        if u_in == v_out && v_in == self.parent_nodes[v_out] {
            let fid = self.parent_edges[v_out];
            self.flows[fid >> 1] += oriented_flow(fid, d);
            self.parent_edges[u_in] = e_in ^ 1;
            self.update_node_potentials(u_in);
            return true;
        }

        // All subtree sizes from v up to the ancestor are increased.
        // The flow on these edges is reduced.
        let subtreediff = self.subtrees[v_out];
        let mut childsubtree = 0;

        // Traverse all nodes u from u_in .. v_out. At the beginning
        // of each iteration
        //
        // - there are two successive nodes (w, u, v)
        // - u_last is the original last[u]
        // - u_prev is the original prev[u]
        // - e_add = (u, v) the edge to be added
        //
        // In each iteration
        //
        // - the edge (u, v) is added to basis.
        // - the edge (w, u) is removed from basis.
        // - the flow on (w, u) is increased
        // - the preorder list is updated
        // - EXCEPTION: last[v] might not be correct after each iteration
        let mut e_add = e_in;
        let mut orig_u_last = self.last_preorder[u_in];
        let mut orig_u_prev = self.prev_preorder[u_in];
        while vid != v_out {
            let wid = self.parent_nodes[uid];
            let w_last = self.last_preorder[wid];
            let w_prev = self.prev_preorder[wid];

            // First remove the (original) subtree of u from its parent w.
            // This need an update of last[w] if u was the "last" subtree of w
            if w_last == orig_u_last {
                self.last_preorder[wid] = orig_u_prev;
            }

            // Remove u (and its subtree) from the preorder list ...
            let u_last = self.last_preorder[uid];
            let u_prev = self.prev_preorder[uid];
            self.next_preorder[u_prev] = self.next_preorder[u_last];
            if self.next_preorder[u_last] != NONE {
                self.prev_preorder[self.next_preorder[u_last]] = u_prev;
            }

            // Next attach u below v (between v and next[v])
            self.prev_preorder[uid] = vid;
            self.next_preorder[u_last] = self.next_preorder[vid];
            if self.next_preorder[vid] != NONE {
                self.prev_preorder[self.next_preorder[vid]] = u_last;
            }
            self.next_preorder[vid] = uid;

            let e_del = self.parent_edges[uid];
            self.parent_edges[uid] = e_add ^ 1; // the edge is reversed to (v -> u)
            self.parent_nodes[uid] = vid;

            self.flows[e_del >> 1] += oriented_flow(e_del, d);

            // What is currently below u stays below u but is not added again
            // Everything else is added
            let usubtree = self.subtrees[uid];
            self.subtrees[uid] = subtreediff - childsubtree;
            childsubtree = usubtree;

            // Go up one edge.
            vid = uid;
            uid = wid;
            orig_u_last = w_last;
            orig_u_prev = w_prev;
            e_add = e_del;
        }

        // The last[v] information for nodes v_out .. u_in may be wrong, because
        // we added more nodes to their subtrees. We fix this now.
        {
            // v_out itself is correct because nothing has been added below
            // v_out, so we start with its (new) parent.
            let mut vid = self.parent_nodes[v_out];
            let mut last = self.last_preorder[v_out];
            while vid != v_in {
                // Only nodes that had nothing below them must be updated
                // because now their subtree is not empty anymore.
                if self.last_preorder[vid] == vid {
                    self.last_preorder[vid] = last;
                } else {
                    last = self.last_preorder[vid];
                }
                vid = self.parent_nodes[vid];
            }
        }

        // Now update the nodes from u_out ... ancestor.
        //
        // These nodes may have lost a subtree. They must be updated
        // if and only if their last node was last[v_out].
        {
            let mut uid = u_out;
            while uid != ancestorid {
                if self.last_preorder[uid] == orig_v_out_last {
                    self.last_preorder[uid] = orig_v_out_prev;
                }
                // Update the flow and the subtree size.
                let eid = self.parent_edges[uid];
                self.flows[eid >> 1] += oriented_flow(eid, d);
                self.subtrees[uid] -= subtreediff;
                uid = self.parent_nodes[uid];
            }
        }

        // Now update the nodes from v_in ... ancestor.
        //
        // These nodes may have got new nodes in their subtree. They
        // must be updated if and only if their last node was
        // last[v_in] and last[v_in] has changed.
        {
            let u_in_last = self.last_preorder[u_in];
            let bad_last = if v_in == orig_v_in_last {
                orig_v_in_last
            } else {
                NONE // do not change if last[v_in] has not changed
            };
            let mut vid = v_in;
            while vid != ancestorid {
                if self.last_preorder[vid] == bad_last {
                    self.last_preorder[vid] = u_in_last;
                }
                let eid = self.parent_edges[vid];
                self.flows[eid >> 1] -= oriented_flow(eid, d);
                self.subtrees[vid] += subtreediff;
                vid = self.parent_nodes[vid];
            }
        }

        // Finally it remains to update the nodes from ancestor upwards.
        let (old, new) = if u_out == ancestorid && orig_ancestor_last == orig_v_out_last {
            // This is the only case in which ancestor may have lost a
            // subtree.
            self.last_preorder[ancestorid] = orig_ancestor_last;
            if orig_v_out_prev == v_in {
                (orig_v_out_last, self.last_preorder[u_in])
            } else {
                (orig_v_out_last, orig_v_out_prev)
            }
        } else if orig_ancestor_last == orig_v_out_last {
            (orig_v_out_last, orig_v_out_prev)
        } else if orig_ancestor_last == orig_v_in_last {
            if u_out == ancestorid {
                // Reset last[ancestor] because it has already been changed.
                self.last_preorder[ancestorid] = orig_ancestor_last;
            }
            (orig_v_in_last, self.last_preorder[v_in])
        } else {
            (NONE, NONE)
        };

        if old != NONE {
            let mut uid = ancestorid;
            while uid != NONE && self.last_preorder[uid] == old {
                self.last_preorder[uid] = new;
                uid = self.parent_nodes[uid];
            }
        }

        // Finally update the node potentials for the changed subtree
        self.update_node_potentials(u_in);

        true
    }

    fn check_feasibility(&self) -> bool {
        self.flows[self.num_arcs..].iter().all(|&x| x <= self.zero)
    }

    fn find_entering_edge(&mut self) -> Option<usize> {
        match self.pricing {
            Pricing::RoundRobin => self.round_robin_pricing(),
            Pricing::Complete => self.complete_pricing(),
            Pricing::Block => self.block_pricing(),
        }
    }

    fn round_robin_pricing(&mut self) -> Option<usize> {
        let mut eid = self.current_edge;
        loop {
            if self.reduced_cost(eid) < F::zero() {
                self.current_edge = eid;
                return Some(self.oriented_edge(eid));
            }
            eid = (eid + 1) % self.num_arcs;
            if eid == self.current_edge {
                return None;
            }
        }
    }

    fn complete_pricing(&mut self) -> Option<usize> {
        let mut min_cost = F::zero();
        let mut min_edge = None;
        for eid in 0..self.num_arcs {
            let c = self.reduced_cost(eid);
            if c < min_cost {
                min_cost = c;
                min_edge = Some(eid);
            }
        }

        min_edge.map(|eid| self.oriented_edge(eid))
    }

    fn block_pricing(&mut self) -> Option<usize> {
        let mut end = self.num_arcs;
        let mut eid = self.current_edge % end;
        let mut min_edge = None;
        let mut min_cost = F::zero();
        let mut m = (eid + self.block_size).min(end);
        let mut cnt = self.block_size.min(end);

        loop {
            while eid < m {
                let c = self.reduced_cost(eid);
                if c < min_cost {
                    min_cost = c;
                    min_edge = Some(eid);
                }
                cnt -= 1;
                eid += 1;
            }

            if cnt == 0 {
                // reached regular end of the current block, start new block
                m = (eid + self.block_size).min(end);
                cnt = self.block_size.min(end);
            } else if eid != self.current_edge {
                // reached non-regular end of the final block, start
                // from the beginning
                end = self.current_edge;
                eid = 0;
                m = cnt.min(end);
                continue;
            }

            if let Some(enteringid) = min_edge {
                self.current_edge = eid;
                return Some(self.oriented_edge(enteringid));
            }

            if eid == self.current_edge {
                return None;
            }
        }
    }

    fn reduced_cost(&self, eid: usize) -> F {
        let c = self.costs[eid] - self.potentials[self.sinks[eid]] + self.potentials[self.sources[eid]];
        match self.state[eid] {
            EdgeState::Lower => c,
            EdgeState::Upper => -c,
            EdgeState::Basic => F::zero(),
        }
    }

    fn oriented_edge(&self, eid: usize) -> usize {
        if self.state[eid] == EdgeState::Lower {
            eid << 1
        } else {
            (eid << 1) | 1
        }
    }
}

fn oriented_flow<F>(eid: usize, d: F) -> F
where
    F: FlowNum,
{
    if eid & 1 == 0 {
        d
    } else {
        -d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttrGraph;

    fn example() -> AttrGraph<char, i64> {
        let mut g = AttrGraph::directed();
        g.add_node_with('a', &[("demand", -5)]);
        g.add_node_with('d', &[("demand", 5)]);
        g.add_edge_with('a', 'b', &[("weight", 3), ("capacity", 4)]);
        g.add_edge_with('a', 'c', &[("weight", 6), ("capacity", 10)]);
        g.add_edge_with('b', 'd', &[("weight", 1), ("capacity", 9)]);
        g.add_edge_with('c', 'd', &[("weight", 2), ("capacity", 5)]);
        g
    }

    #[test]
    fn test_simplex() {
        let g = example();
        for &pricing in &[Pricing::Block, Pricing::RoundRobin, Pricing::Complete] {
            let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
            spx.pricing = pricing;
            assert_eq!(spx.solve(), SolutionState::Optimal);
            assert_eq!(spx.solution_state(), SolutionState::Optimal);
            assert_eq!(spx.value(), 24);
            assert_eq!(spx.flow(&'a', &'b'), Some(4));
            assert_eq!(spx.flow(&'a', &'c'), Some(1));
            assert_eq!(spx.flow(&'b', &'d'), Some(4));
            assert_eq!(spx.flow(&'c', &'d'), Some(1));
            assert_eq!(spx.flow(&'d', &'a'), None);
        }
    }

    #[test]
    fn test_balances() {
        let g = example();
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.balance(&'a'), Some(5));
        assert_eq!(spx.balance(&'d'), Some(-5));
        assert_eq!(spx.balance(&'x'), None);

        spx.clear_balances();
        assert!(spx.set_balance(&'a', 2));
        assert!(spx.set_balance(&'d', -2));
        assert!(!spx.set_balance(&'x', 1));
        assert_eq!(spx.solution_state(), SolutionState::Unknown);
        assert_eq!(spx.solve(), SolutionState::Optimal);
        assert_eq!(spx.value(), 8);

        assert!(spx.set_balance(&'d', -3));
        assert_eq!(spx.solve(), SolutionState::Infeasible);
    }

    #[test]
    fn test_infeasible() {
        let mut g = example();
        g.set_node_attr('a', "demand", -20);
        g.set_node_attr('d', "demand", 20);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Infeasible);
    }

    #[test]
    fn test_negative_cycle() {
        let mut g = AttrGraph::<u32, i32>::directed();
        g.add_edge_with(0, 1, &[("weight", 1), ("capacity", 3)]);
        g.add_edge_with(1, 2, &[("weight", -4), ("capacity", 5)]);
        g.add_edge_with(2, 0, &[("weight", 1), ("capacity", 2)]);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Optimal);
        assert_eq!(spx.value(), -4);
        assert_eq!(spx.flow(&1, &2), Some(2));

        let mut g = AttrGraph::<u32, i32>::directed();
        g.add_edge_with(0, 1, &[("weight", 1)]);
        g.add_edge_with(1, 2, &[("weight", -4)]);
        g.add_edge_with(2, 0, &[("weight", 1)]);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Unbounded);
    }

    #[test]
    fn test_large_capacities() {
        let mut g = AttrGraph::<u32, i32>::directed();
        g.add_node_with(0, &[("demand", -1_000_000_000)]);
        g.add_node_with(2, &[("demand", 1_000_000_000)]);
        g.add_edge_with(0, 1, &[("capacity", 1_000_000_000)]);
        g.add_edge_with(1, 2, &[("weight", 1)]);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Optimal);
        assert_eq!(spx.value(), 1_000_000_000);
        assert_eq!(spx.flow(&1, &2), Some(1_000_000_000));

        // two unbounded edges of negative cost start with too much flow
        g.add_edge_with(2, 1, &[("weight", -1)]);
        g.add_edge_with(1, 0, &[("weight", -1)]);
        assert!(matches!(
            NetworkSimplex::new(&g, "demand", "capacity", "weight"),
            Err(FlowError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_self_loops() {
        let mut g = AttrGraph::<u32, i32>::directed();
        g.add_edge_with(0, 0, &[("weight", -2), ("capacity", 3)]);
        g.add_edge_with(0, 1, &[("weight", 1)]);
        g.add_node_with(1, &[("demand", 1)]);
        g.set_node_attr(0, "demand", -1);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Optimal);
        assert_eq!(spx.value(), -5);
        assert_eq!(spx.flow(&0, &0), Some(3));

        g.add_edge_with(1, 1, &[("weight", -1)]);
        let mut spx = NetworkSimplex::new(&g, "demand", "capacity", "weight").unwrap();
        assert_eq!(spx.solve(), SolutionState::Unbounded);
    }
}
