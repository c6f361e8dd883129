//! Interaction graph construction and degree statistics.
//!
//! The builder turns replies and reactions into a weighted undirected graph;
//! `metrics` and `powerlaw` summarise its degree distribution.

pub mod builder;
pub mod error;
pub mod metrics;
pub mod powerlaw;

pub use builder::{BuildOptions, BuildStats, InteractionGraph, SelfLoopPolicy, UnknownUserPolicy, build};
pub use error::{FitError, GraphError};
pub use metrics::{DegreeHistogram, degrees, remove_isolates, summarize};
pub use powerlaw::{Xmin, fit_discrete};
