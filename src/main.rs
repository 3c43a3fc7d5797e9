//! gametui - Main entry point
//!
//! Parses the CLI, detects host facts, and drives the planning/execution core.

use std::path::PathBuf;

use anyhow::Result;
use log::{debug, error, info};
use strum::IntoEnumIterator;

use gametui::cli::{Cli, Commands, DriveCommands};
use gametui::{
    build_install_plan, build_uninstall_plan, catalog, detect, Category, Executor, InstallPlan,
    MountConfig, MountProvisioner, ProvisionOutcome, Selection, ShellProbe, StdoutSink,
    SystemFacts,
};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() -> Result<()> {
    init_logger();
    info!("gametui starting up");

    // The package tables are static data; refuse to start on a coverage gap.
    if let Err(problems) = gametui::verify_table_coverage() {
        for problem in &problems {
            error!("package table: {}", problem);
        }
        anyhow::bail!("package table validation failed ({} problems)", problems.len());
    }

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Install { components, config, save_selection } => {
            let selection = load_selection(components, config)?;
            if let Some(path) = &save_selection {
                selection.save_to_file(path)?;
                println!("Selection saved to {}", path.display());
            }
            run_install(&selection, cli.dry_run)
        }
        Commands::Uninstall { components, config } => {
            let selection = load_selection(components, config)?;
            run_uninstall(&selection, cli.dry_run)
        }
        Commands::Plan { components, config } => {
            let selection = load_selection(components, config)?;
            run_plan(&selection)
        }
        Commands::List => {
            run_list();
            Ok(())
        }
        Commands::Detect => {
            run_detect();
            Ok(())
        }
        Commands::Drives { drive_command } => match drive_command {
            DriveCommands::List => {
                run_drives_list();
                Ok(())
            }
            DriveCommands::Mount { device, mountpoint } => {
                run_drives_mount(&device, mountpoint, cli.dry_run)
            }
        },
    }
}

/// Build the selection from CLI flags and/or a selection file.
fn load_selection(components: Vec<String>, config: Option<PathBuf>) -> Result<Selection> {
    let mut selection = match config {
        Some(path) => Selection::load_from_file(&path)?,
        None => Selection::new(),
    };
    for key in components {
        selection.enable(&key);
    }
    Ok(selection)
}

/// Resolve and execute the install plan.
fn run_install(selection: &Selection, dry_run: bool) -> Result<()> {
    if selection.is_empty() {
        println!("Nothing selected. See 'gametui list' for available components.");
        return Ok(());
    }

    let facts = SystemFacts::detect();
    println!("Distribution: {} ({})", facts.distro_name, facts.distro_family);
    println!("GPU: {}", facts.gpu_vendor);

    let probe = ShellProbe;
    let plan = build_install_plan(selection, &facts, &probe)?;

    execute_plan(&plan, dry_run)
}

/// Resolve and execute the removal plan.
fn run_uninstall(selection: &Selection, dry_run: bool) -> Result<()> {
    if selection.is_empty() {
        println!("Nothing selected. See 'gametui list' for available components.");
        return Ok(());
    }

    let facts = SystemFacts::detect();
    let plan = build_uninstall_plan(selection, &facts)?;

    execute_plan(&plan, dry_run)
}

/// Print advisories, run every step, and print the final recap.
fn execute_plan(plan: &InstallPlan, dry_run: bool) -> Result<()> {
    for advisory in &plan.advisories {
        println!("[i] {}", advisory);
    }
    for warning in &plan.warnings {
        println!("[!] {}", warning);
    }
    if plan.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    let executor = Executor::new(dry_run);
    let mut sink = StdoutSink;
    let report = executor.execute(plan, &mut sink);

    println!();
    println!("{}", report.summary());

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the resolved plan without executing it.
fn run_plan(selection: &Selection) -> Result<()> {
    if selection.is_empty() {
        println!("Nothing selected. See 'gametui list' for available components.");
        return Ok(());
    }

    let facts = SystemFacts::detect();
    let probe = ShellProbe;
    let plan = build_install_plan(selection, &facts, &probe)?;

    println!("{}", plan.summary());
    Ok(())
}

/// List every installable component, grouped by category.
fn run_list() {
    for category in Category::iter() {
        println!("{}:", category);
        for component in catalog::in_category(category) {
            println!("  {:<14} {} - {}", component.key, component.display_name, component.description);
        }
        println!();
    }
}

/// Print detected system facts and candidate drives.
fn run_detect() {
    let facts = SystemFacts::detect();
    println!("Distribution: {} ({})", facts.distro_name, facts.distro_family);
    if let Some(version) = &facts.distro_version {
        println!("Version: {}", version);
    }
    println!("GPU: {}", facts.gpu_vendor);
    if let Some(name) = &facts.gpu_name {
        println!("GPU model: {}", name);
    }

    run_drives_list();
}

/// Print unmounted candidate drives.
fn run_drives_list() {
    let drives = detect::detect_drives();
    if drives.is_empty() {
        println!("No unmounted drives detected");
        return;
    }
    println!("Unmounted drives:");
    for drive in &drives {
        let label = drive.label.as_deref().map(|l| format!(" [{}]", l)).unwrap_or_default();
        println!("  {} - {} ({}){}", drive.device, drive.size, drive.fstype, label);
    }
}

/// Provision and mount one detected drive.
fn run_drives_mount(device: &str, mountpoint: Option<String>, dry_run: bool) -> Result<()> {
    let drives = detect::detect_drives();
    let Some(drive) = drives.iter().find(|d| d.device == device) else {
        anyhow::bail!(
            "{} is not an unmounted candidate drive (see 'gametui drives list')",
            device
        );
    };

    let mount_point =
        mountpoint.map(PathBuf::from).unwrap_or_else(|| MountConfig::default_mount_point(drive));
    let config = MountConfig::for_drive(drive, mount_point);

    let executor = Executor::new(dry_run);
    let provisioner = MountProvisioner::new(&executor);
    let mut sink = StdoutSink;
    let reports = provisioner.provision_all(&[config], &mut sink);

    println!();
    let mut failed = false;
    for report in &reports {
        println!("{}: {}", report.mount_point.display(), report.outcome);
        failed |= matches!(report.outcome, ProvisionOutcome::Failed(_));
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
