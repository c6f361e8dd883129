//! Output artifacts for external rendering: Graphviz DOT, CSV tables and the
//! JSON fit report.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use petgraph::dot::{Config, Dot};

use chatgraph_graph::InteractionGraph;
use chatgraph_graph::metrics::DegreeHistogram;
use chatgraph_types::report::{FitReport, PowerLawFit};
use chatgraph_types::{User, UserId};

/// Used for nodes whose user has no downloaded picture.
pub const DEFAULT_IMAGE: &str = "default.jpg";

const NODE_SCALE: f64 = 0.2;

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// DOT source for the graph. Node size grows with `ln(degree + 1)`, edge
/// width and opacity with the weight relative to the heaviest edge.
pub fn render_dot(
    graph: &InteractionGraph,
    users: &BTreeMap<UserId, User>,
    degrees: &BTreeMap<UserId, u64>,
) -> String {
    let g = graph.graph();
    let wmax = g.edge_references().map(|e| *e.weight()).max().unwrap_or(1).max(1) as f64;

    let edge_attrs = |_, edge: petgraph::graph::EdgeReference<'_, u32>| {
            let w = f64::from(*edge.weight()) / wmax;
            let alpha = ((0.2 + 0.8 * w) * 255.0).round() as u8;
            format!("penwidth={:.3} color=\"#000000{:02x}\"", 1.0 + 3.0 * w, alpha)
        };
    let node_attrs = |_, (_, id): (petgraph::graph::NodeIndex, &UserId)| {
            let degree = degrees.get(id).copied().unwrap_or(0);
            let width = ((degree + 1) as f64).ln() * NODE_SCALE;
            let (label, image) = match users.get(id) {
                Some(user) => (
                    user.display_name(),
                    user.profile_image
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
                ),
                None => (id.to_string(), DEFAULT_IMAGE.to_string()),
            };
            format!(
                "label=\"{}\" image=\"{}\" width={:.3} fixedsize=true",
                escape(&label),
                escape(&image),
                width
            )
        };
    let dot = Dot::with_attr_getters(
        g,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &edge_attrs,
        &node_attrs,
    );
    format!("{}", dot)
}

pub fn write_dot(
    path: &Path,
    graph: &InteractionGraph,
    users: &BTreeMap<UserId, User>,
    degrees: &BTreeMap<UserId, u64>,
) -> Result<()> {
    std::fs::write(path, render_dot(graph, users, degrees))
        .with_context(|| format!("writing {}", path.display()))
}

/// `source,target,weight`, one row per edge, smaller id first.
pub fn write_edges(path: &Path, graph: &InteractionGraph) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["source", "target", "weight"])?;
    for ((a, b), w) in graph.edge_weights() {
        writer.write_record([a.to_string(), b.to_string(), w.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_histogram(path: &Path, hist: &DegreeHistogram) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["degree", "frequency"])?;
    for (degree, count) in &hist.bins {
        writer.write_record([degree.to_string(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `degree,empirical,fitted` for the tail of the fit.
pub fn write_fit_pdf(path: &Path, points: &[(u64, f64, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["degree", "empirical", "fitted"])?;
    for (degree, empirical, fitted) in points {
        writer.write_record([degree.to_string(), format!("{:.6}", empirical), format!("{:.6}", fitted)])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, report: &FitReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}

pub fn fit_summary(fit: &PowerLawFit) -> String {
    format!(
        "p(s) ∝ s^-b, s > s_min\n\n   b =  {:.4} ± {:.4}\n   s_min: {}\n   n(s >= s_min): {}\n   Kolmogorov-Smirnov statistic: {:.4}",
        fit.alpha, fit.sigma, fit.xmin, fit.n_tail, fit.ks_distance
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn user(id: i64, username: &str, pic: Option<&str>) -> (UserId, User) {
        (
            UserId(id),
            User {
                id: UserId(id),
                username: username.into(),
                access_hash: None,
                first_name: String::new(),
                last_name: String::new(),
                group_id: 1,
                group: "g".into(),
                profile_image: pic.map(PathBuf::from),
            },
        )
    }

    fn sample() -> (InteractionGraph, BTreeMap<UserId, User>) {
        let users = BTreeMap::from([
            user(1, "alice", Some("pics/1.jpg")),
            user(2, "bo\"b", None),
            user(3, "carol", None),
        ]);
        let mut graph = InteractionGraph::new();
        for &id in users.keys() {
            graph.add_user(id);
        }
        graph.bump(UserId(1), UserId(2));
        graph.bump(UserId(1), UserId(2));
        graph.bump(UserId(2), UserId(3));
        (graph, users)
    }

    #[test]
    fn dot_carries_labels_images_and_widths() {
        let (graph, users) = sample();
        let degrees = chatgraph_graph::degrees(&graph, Default::default());
        let dot = render_dot(&graph, &users, &degrees);

        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("label=\"alice\" image=\"pics/1.jpg\""));
        assert!(dot.contains("label=\"bo\\\"b\" image=\"default.jpg\""));
        assert!(dot.contains("penwidth=4.000"));
        assert!(dot.contains("penwidth=2.500"));
        assert_eq!(dot.matches(" -- ").count(), 2);
    }

    #[test]
    fn csv_tables() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _) = sample();

        let edges = dir.path().join("edges.csv");
        write_edges(&edges, &graph).unwrap();
        assert_eq!(
            std::fs::read_to_string(&edges).unwrap(),
            "source,target,weight\n1,2,2\n2,3,1\n"
        );

        let hist_path = dir.path().join("hist.csv");
        let degrees = chatgraph_graph::degrees(&graph, Default::default());
        write_histogram(&hist_path, &DegreeHistogram::from_degrees(&degrees)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&hist_path).unwrap(),
            "degree,frequency\n1,1\n2,1\n3,1\n"
        );
    }

    #[test]
    fn summary_mentions_parameters() {
        let fit = PowerLawFit {
            alpha: 2.5,
            xmin: 5,
            n_tail: 40,
            sigma: 0.2372,
            ks_distance: 0.0811,
        };
        let text = fit_summary(&fit);
        assert!(text.starts_with("p(s) ∝ s^-b, s > s_min\n"));
        assert!(text.contains("b =  2.5000"));
        assert!(text.contains("s_min: 5"));
        assert!(text.contains("Kolmogorov-Smirnov statistic: 0.0811"));
    }
}
