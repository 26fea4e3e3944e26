//! Configuration management for the Cosmic Express theory engine

pub mod settings;

pub use settings::{
    Settings, SolverConfig, InputConfig, OutputConfig, LoggingConfig,
    OutputFormat, CliOverrides, SolverBackend
};
