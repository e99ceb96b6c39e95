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

//! Errors reported by the flow algorithms.

use thiserror::Error;

/// Error returned by the flow algorithms.
///
/// Every error is terminal for the call that produced it. No algorithm
/// returns a partial result together with an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Source or sink are missing from the graph or are the same node.
    #[error("invalid endpoints: {0}")]
    InvalidEndpoints(String),

    /// The graph kind is not supported by the algorithm (e.g. multigraphs).
    #[error("unsupported graph kind: {0}")]
    UnsupportedGraphKind(&'static str),

    /// The source reaches the sink using unbounded arcs only.
    #[error("infinite capacity path, flow unbounded above")]
    UnboundedFlow,

    /// Some attribute or parameter has an invalid value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No flow satisfies all node demands.
    #[error("infeasible problem: {0}")]
    Infeasible(String),

    /// The minimum cost flow problem contains a negative cost cycle of unbounded capacity.
    #[error("negative cycle with infinite capacity found")]
    UnboundedCost,
}

/// Result type of the flow algorithms.
pub type Result<T> = std::result::Result<T, FlowError>;
