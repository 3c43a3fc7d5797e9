//! gametui library
//!
//! Core functionality for the Linux gaming setup tool: component catalog,
//! backend resolution, install planning, step execution, and drive mount
//! provisioning.

pub mod catalog;
pub mod cli;
pub mod detect;
pub mod error;
pub mod executor;
pub mod mounts;
pub mod plan;
pub mod resolver;
pub mod selection;
pub mod types;

// Re-export main types for convenience
pub use catalog::{Component, COMPONENTS};
pub use detect::{DetectedDrive, FixedProbe, HostProbe, ShellProbe, SystemFacts};
pub use error::{GameTuiError, Result};
pub use executor::{CollectSink, ExecutionReport, Executor, OutputSink, StdoutSink, StepResult};
pub use mounts::{MountConfig, MountProvisioner, MountReport, ProvisionOutcome};
pub use plan::{
    build_install_plan, build_uninstall_plan, discover_aur_helper, CommandSpec, InstallPlan, Step,
};
pub use resolver::{verify_table_coverage, BackendTarget, Resolver};
pub use selection::Selection;
pub use types::{AurHelper, Backend, Category, DistroFamily, GpuVendor};
