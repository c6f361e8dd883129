use std::collections::BTreeMap;

use petgraph::visit::EdgeRef;
use statrs::statistics::Statistics;

use chatgraph_types::UserId;
use chatgraph_types::report::{DegreeKind, DegreeSummary};

use crate::builder::InteractionGraph;

/// Degree of every node, isolates included.
///
/// A self-loop counts twice towards its node, for both kinds.
pub fn degrees(graph: &InteractionGraph, kind: DegreeKind) -> BTreeMap<UserId, u64> {
    let g = graph.graph();
    let mut out: BTreeMap<UserId, u64> = graph.users().map(|u| (u, 0)).collect();

    for edge in g.edge_references() {
        let step = match kind {
            DegreeKind::Weighted => u64::from(*edge.weight()),
            DegreeKind::Count => 1,
        };
        for idx in [edge.source(), edge.target()] {
            *out.entry(g[idx]).or_insert(0) += step;
        }
    }
    out
}

/// Drop nodes with degree 0; everything else is kept untouched.
pub fn remove_isolates(degrees: &BTreeMap<UserId, u64>) -> BTreeMap<UserId, u64> {
    degrees
        .iter()
        .filter(|&(_, &d)| d > 0)
        .map(|(&u, &d)| (u, d))
        .collect()
}

/// Number of nodes per distinct degree value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DegreeHistogram {
    pub bins: BTreeMap<u64, usize>,
}

impl DegreeHistogram {
    pub fn from_degrees(degrees: &BTreeMap<UserId, u64>) -> Self {
        let mut bins = BTreeMap::new();
        for &d in degrees.values() {
            *bins.entry(d).or_insert(0) += 1;
        }
        Self { bins }
    }

    pub fn total(&self) -> usize {
        self.bins.values().sum()
    }
}

pub fn summarize(degrees: &BTreeMap<UserId, u64>, kind: DegreeKind) -> DegreeSummary {
    let values: Vec<f64> = degrees.values().map(|&d| d as f64).collect();
    let mean = if values.is_empty() { 0.0 } else { values.iter().mean() };
    let std_dev = if values.len() < 2 { 0.0 } else { values.iter().std_dev() };

    DegreeSummary {
        kind,
        nodes: degrees.len(),
        isolates: degrees.values().filter(|&&d| d == 0).count(),
        min: degrees.values().copied().min().unwrap_or(0),
        max: degrees.values().copied().max().unwrap_or(0),
        mean,
        std_dev,
    }
}
