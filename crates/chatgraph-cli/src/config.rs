use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};

use chatgraph_graph::powerlaw::{DEFAULT_XMIN, Xmin};
use chatgraph_graph::{BuildOptions, SelfLoopPolicy, UnknownUserPolicy};
use chatgraph_store::layout;
use chatgraph_types::report::DegreeKind;

/// Interaction graphs and degree statistics for crawled chat groups.
#[derive(Debug, Parser)]
#[command(name = "chatgraph", version)]
pub struct Cli {
    /// Root of the crawl database
    #[arg(long, env = "CHATGRAPH_DATABASE_DIR", default_value = "./database", global = true)]
    pub database_dir: PathBuf,

    #[arg(long, env = "CHATGRAPH_GROUP_ID", global = true)]
    pub group_id: Option<i64>,

    /// Defaults to <database-dir>/profile_pics
    #[arg(long, env = "CHATGRAPH_PROFILE_PICS", global = true)]
    pub profile_pics: Option<PathBuf>,

    /// Where output artifacts are written
    #[arg(long, env = "CHATGRAPH_OUT_DIR", default_value = ".", global = true)]
    pub out_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the interaction graph and export it as DOT and an edge list
    Graph(BuildArgs),

    /// Degree histogram with isolated nodes removed
    Hist {
        #[command(flatten)]
        build: BuildArgs,
        #[arg(long, value_enum, default_value_t = DegreeArg::Weighted)]
        degree: DegreeArg,
    },

    /// Fit a discrete power law to the degree sequence
    Fit {
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        fit: FitArgs,
    },

    /// graph + hist + fit
    Report {
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        fit: FitArgs,
    },

    /// Append a legacy group's message history to this group's
    Merge {
        #[arg(long)]
        legacy_group: i64,
    },

    /// Print the first messages of the group
    Preview {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Count replies/reactions to one's own messages
    #[arg(long)]
    pub keep_self_loops: bool,

    #[arg(long, value_enum, default_value_t = UnknownUsers::Skip)]
    pub unknown_users: UnknownUsers,
}

#[derive(Debug, Clone, Args)]
pub struct FitArgs {
    #[arg(long, default_value_t = DEFAULT_XMIN, conflicts_with = "auto_xmin")]
    pub xmin: u64,

    /// Choose xmin by minimising the KS distance
    #[arg(long)]
    pub auto_xmin: bool,

    #[arg(long, value_enum, default_value_t = DegreeArg::Weighted)]
    pub degree: DegreeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnknownUsers {
    Skip,
    AddNode,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DegreeArg {
    Weighted,
    Count,
}

impl From<&BuildArgs> for BuildOptions {
    fn from(args: &BuildArgs) -> Self {
        BuildOptions {
            self_loops: if args.keep_self_loops {
                SelfLoopPolicy::Keep
            } else {
                SelfLoopPolicy::Skip
            },
            unknown_users: match args.unknown_users {
                UnknownUsers::Skip => UnknownUserPolicy::Skip,
                UnknownUsers::AddNode => UnknownUserPolicy::AddNode,
                UnknownUsers::Reject => UnknownUserPolicy::Reject,
            },
        }
    }
}

impl From<DegreeArg> for DegreeKind {
    fn from(arg: DegreeArg) -> Self {
        match arg {
            DegreeArg::Weighted => DegreeKind::Weighted,
            DegreeArg::Count => DegreeKind::Count,
        }
    }
}

impl FitArgs {
    pub fn xmin(&self) -> Xmin {
        if self.auto_xmin {
            Xmin::Auto
        } else {
            Xmin::Fixed(self.xmin)
        }
    }
}

/// Resolved global configuration handed to every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_dir: PathBuf,
    pub group_id: i64,
    pub profile_pics: PathBuf,
    pub out_dir: PathBuf,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let group_id = cli
            .group_id
            .ok_or_else(|| anyhow!("group id is required (--group-id or CHATGRAPH_GROUP_ID)"))?;
        let profile_pics = cli
            .profile_pics
            .clone()
            .unwrap_or_else(|| layout::profile_pics_dir(&cli.database_dir));

        Ok(Self {
            database_dir: cli.database_dir.clone(),
            group_id,
            profile_pics,
            out_dir: cli.out_dir.clone(),
        })
    }
}
