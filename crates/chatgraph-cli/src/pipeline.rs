use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use chatgraph_graph::metrics::{self, DegreeHistogram};
use chatgraph_graph::powerlaw::{self, Xmin};
use chatgraph_graph::{BuildOptions, InteractionGraph};
use chatgraph_store::{GroupStore, ProfileDir, Records, merge_legacy};
use chatgraph_types::UserId;
use chatgraph_types::report::{DegreeKind, FitReport};

use crate::config::{Cli, Command, Settings};
use crate::export;

pub const NETWORK_FILE: &str = "network.dot";
pub const EDGES_FILE: &str = "edges.csv";
pub const HIST_FILE: &str = "hist.csv";
pub const FIT_FILE: &str = "fit.json";
pub const FIT_PDF_FILE: &str = "fit_pdf.csv";

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(&cli)?;
    std::fs::create_dir_all(&settings.out_dir)
        .with_context(|| format!("creating {}", settings.out_dir.display()))?;

    match &cli.command {
        Command::Graph(build) => {
            let (records, graph) = load_and_build(&settings, &build.into())?;
            export_graph(&settings, &records, &graph)
        }
        Command::Hist { build, degree } => {
            let (_, graph) = load_and_build(&settings, &build.into())?;
            export_histogram(&settings, &graph, (*degree).into())
        }
        Command::Fit { build, fit } => {
            let (_, graph) = load_and_build(&settings, &build.into())?;
            export_fit(&settings, &graph, fit.degree.into(), fit.xmin())
        }
        Command::Report { build, fit } => {
            let (records, graph) = load_and_build(&settings, &build.into())?;
            export_graph(&settings, &records, &graph)?;
            export_histogram(&settings, &graph, fit.degree.into())?;
            export_fit(&settings, &graph, fit.degree.into(), fit.xmin())
        }
        Command::Merge { legacy_group } => {
            let legacy = GroupStore::open(&settings.database_dir, *legacy_group)?;
            let target = GroupStore::open(&settings.database_dir, settings.group_id)?;
            let appended = merge_legacy(&legacy, &target)?;
            println!("Appended {} messages from group {}", appended, legacy_group);
            Ok(())
        }
        Command::Preview { limit } => {
            let store = GroupStore::open(&settings.database_dir, settings.group_id)?;
            for msg in store.preview_messages(*limit)? {
                println!("{}", msg);
            }
            Ok(())
        }
    }
}

fn load_and_build(settings: &Settings, options: &BuildOptions) -> Result<(Records, InteractionGraph)> {
    let store = GroupStore::open(&settings.database_dir, settings.group_id)?;
    let records = store
        .load(&ProfileDir::new(&settings.profile_pics))
        .with_context(|| format!("loading group {}", settings.group_id))?;

    let (graph, _stats) = chatgraph_graph::build(&records.users, &records.messages, options)?;
    Ok((records, graph))
}

fn export_graph(settings: &Settings, records: &Records, graph: &InteractionGraph) -> Result<()> {
    let degrees = metrics::degrees(graph, DegreeKind::Weighted);

    let dot_path = settings.out_dir.join(NETWORK_FILE);
    export::write_dot(&dot_path, graph, &records.users, &degrees)?;
    let edges_path = settings.out_dir.join(EDGES_FILE);
    export::write_edges(&edges_path, graph)?;

    info!("Wrote {} and {}", dot_path.display(), edges_path.display());
    Ok(())
}

fn export_histogram(settings: &Settings, graph: &InteractionGraph, kind: DegreeKind) -> Result<()> {
    let all = metrics::degrees(graph, kind);
    let connected = metrics::remove_isolates(&all);
    let hist = DegreeHistogram::from_degrees(&connected);

    let path = settings.out_dir.join(HIST_FILE);
    export::write_histogram(&path, &hist)?;
    info!(
        "Wrote {} ({} nodes, {} isolates removed)",
        path.display(),
        hist.total(),
        all.len() - connected.len()
    );
    Ok(())
}

fn export_fit(settings: &Settings, graph: &InteractionGraph, kind: DegreeKind, xmin: Xmin) -> Result<()> {
    let degrees: BTreeMap<UserId, u64> = metrics::degrees(graph, kind);
    let data: Vec<u64> = degrees.values().copied().collect();

    let fit = powerlaw::fit_discrete(&data, xmin).context("fitting degree distribution")?;
    let report = FitReport {
        group_id: settings.group_id,
        generated_at: Utc::now(),
        degrees: metrics::summarize(&degrees, kind),
        fit,
    };

    export::write_report(&settings.out_dir.join(FIT_FILE), &report)?;
    export::write_fit_pdf(
        &settings.out_dir.join(FIT_PDF_FILE),
        &powerlaw::pdf_points(&data, &report.fit),
    )?;

    println!("results");
    println!("{}", export::fit_summary(&report.fit));
    Ok(())
}
