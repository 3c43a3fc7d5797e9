//! Install plan engine
//!
//! Translates a component selection + system facts into an ordered sequence
//! of executable steps: distro bootstraps first, then the native batch, the
//! AUR batch, and the Flatpak batch, followed by system tuning actions.
//!
//! # Design
//!
//! - **Pure logic**: no I/O beyond the injected [`HostProbe`] — only
//!   generates the plan; the executor runs it
//! - **Typed output**: each [`Step`] carries its fully rendered
//!   [`CommandSpec`], so the executor needs no distro knowledge
//! - **Ordering invariants**: bootstraps for a backend always precede that
//!   backend's batch; native precedes AUR precedes Flatpak (the AUR helper
//!   and the Flatpak runtime may themselves arrive with the native batch)
//! - **Degrade, don't abort**: a missing AUR helper or a per-component
//!   `Unsupported` target becomes a plan warning; only an unknown distro
//!   refuses to plan at all

use std::fmt;

use crate::catalog::Component;
use crate::detect::{HostProbe, SystemFacts};
use crate::error::{GameTuiError, Result};
use crate::resolver::Resolver;
use crate::selection::Selection;
use crate::types::{AurHelper, Backend, Category, DistroFamily};

/// Flathub repository URL registered by the Flatpak bootstrap.
pub const FLATHUB_REPO: &str = "https://flathub.org/repo/flathub.flatpakrepo";

// ============================================================================
// Step types
// ============================================================================

/// A fully rendered command: program, arguments, and privilege attribution.
///
/// Commands that mutate system state are flagged `privileged`; discovery
/// commands never are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub privileged: bool,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: S, args: &[&str], privileged: bool) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            privileged,
        }
    }

    /// Render for transcripts: `$ pacman -S --needed --noconfirm steam`.
    pub fn display_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_line())
    }
}

/// A single step in an install plan.
///
/// Steps are ordered; the plan builder ensures correct sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// One-time backend setup (repo enablement, arch enablement, remote
    /// registration) that must precede the backend's batch.
    Bootstrap {
        label: String,
        command: CommandSpec,
        /// Repository/architecture enablement the batch genuinely depends
        /// on. Failure is still non-fatal: the package manager will fail
        /// loudly on its own if the bootstrap really was required.
        mandatory: bool,
    },

    /// Grouped backend operation over deduplicated identifiers.
    Batch {
        backend: Backend,
        identifiers: Vec<String>,
        command: CommandSpec,
    },

    /// A standalone action, e.g. one system tuning command.
    SingleAction {
        label: String,
        command: CommandSpec,
    },
}

impl Step {
    /// Human-readable step label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Self::Bootstrap { label, .. } => label.clone(),
            Self::Batch { backend, identifiers, .. } => {
                format!("{} batch ({} packages)", backend, identifiers.len())
            }
            Self::SingleAction { label, .. } => label.clone(),
        }
    }

    pub fn command(&self) -> &CommandSpec {
        match self {
            Self::Bootstrap { command, .. }
            | Self::Batch { command, .. }
            | Self::SingleAction { command, .. } => command,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.command())
    }
}

/// A complete, ordered install (or uninstall) plan.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Ordered sequence of steps
    pub steps: Vec<Step>,
    /// Distro the plan was built for
    pub distro: DistroFamily,
    /// Degradations the operator should see (missing AUR helper,
    /// per-component unsupported targets)
    pub warnings: Vec<String>,
    /// Resolution-time advisories (e.g. Debian non-free repo hint)
    pub advisories: Vec<String>,
}

impl InstallPlan {
    /// True when there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps using the given backend (bootstraps excluded).
    pub fn batch_for(&self, backend: Backend) -> Option<&Step> {
        self.steps.iter().find(|step| matches!(step, Step::Batch { backend: b, .. } if *b == backend))
    }

    /// Returns a summary of the plan for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Plan for {} ({} steps):", self.distro, self.steps.len()),
        ];
        for (i, step) in self.steps.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, step));
        }
        for advisory in &self.advisories {
            lines.push(format!("  [i] {}", advisory));
        }
        for warning in &self.warnings {
            lines.push(format!("  [!] {}", warning));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Install plan
// ============================================================================

/// Build the install plan for a selection.
///
/// # Errors
///
/// Fails with `UnsupportedDistro` when the distro family is unknown and the
/// selection is non-empty — nothing may execute in that case. Unknown
/// component keys fail before any resolution.
pub fn build_install_plan(
    selection: &Selection,
    facts: &SystemFacts,
    probe: &dyn HostProbe,
) -> Result<InstallPlan> {
    let components = selection.enabled_components()?;

    if components.is_empty() {
        return Ok(InstallPlan {
            steps: Vec::new(),
            distro: facts.distro_family,
            warnings: Vec::new(),
            advisories: Vec::new(),
        });
    }

    if !facts.distro_family.is_supported() {
        return Err(GameTuiError::unsupported_distro(facts.distro_name.clone()));
    }

    let distro = facts.distro_family;
    let resolver = Resolver::new(probe);

    let mut native: Vec<String> = Vec::new();
    let mut aur: Vec<String> = Vec::new();
    let mut flatpak: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut advisories: Vec<String> = Vec::new();

    for component in &components {
        if component.category == Category::Optimization {
            continue;
        }
        let target = resolver.resolve(component, facts);
        if let Some(advisory) = target.advisory {
            advisories.push(advisory);
        }
        match target.backend {
            Backend::Native => native.extend(target.identifiers),
            Backend::Aur => aur.extend(target.identifiers),
            Backend::Flatpak => flatpak.extend(target.identifiers),
            Backend::Unsupported => warnings.push(format!(
                "{} is not available on {} and was skipped",
                component.display_name, distro
            )),
        }
    }

    let native = dedup_preserving_order(native);
    let aur = dedup_preserving_order(aur);
    let flatpak = dedup_preserving_order(flatpak);

    let mut steps = Vec::new();

    // Distro bootstraps run before any native batch.
    push_native_bootstraps(&mut steps, distro, &components);

    if !native.is_empty() {
        steps.push(native_batch_step(distro, &native));
    }

    if !aur.is_empty() {
        match discover_aur_helper(probe) {
            Some(helper) => {
                let mut args = vec!["-S", "--needed", "--noconfirm"];
                let id_refs: Vec<&str> = aur.iter().map(String::as_str).collect();
                args.extend(id_refs);
                steps.push(Step::Batch {
                    backend: Backend::Aur,
                    identifiers: aur.clone(),
                    // AUR helpers refuse to run as root; they elevate on
                    // their own for the install phase.
                    command: CommandSpec::new(helper.binary(), &args, false),
                });
            }
            None => warnings.push(format!(
                "No AUR helper found (looked for: {}). Skipping AUR packages: {}",
                AurHelper::PRIORITY.map(|h| h.binary()).join(", "),
                aur.join(", ")
            )),
        }
    }

    if !flatpak.is_empty() {
        push_flatpak_bootstraps(&mut steps, distro, probe);
        let mut args = vec!["install", "-y", "--noninteractive", "flathub"];
        let id_refs: Vec<&str> = flatpak.iter().map(String::as_str).collect();
        args.extend(id_refs);
        steps.push(Step::Batch {
            backend: Backend::Flatpak,
            identifiers: flatpak.clone(),
            command: CommandSpec::new("flatpak", &args, true),
        });
    }

    // System tunings run after the package phases.
    for component in &components {
        if component.category == Category::Optimization {
            push_optimization_steps(&mut steps, component);
        }
    }

    Ok(InstallPlan { steps, distro, warnings, advisories })
}

// ============================================================================
// Uninstall plan
// ============================================================================

/// Build the removal plan for a selection.
///
/// Derived from the same resolution tables as installation: Flatpak removal
/// covers every selected component with a Flatpak identity on this distro
/// (including Debian fallback identities), native removal covers selected
/// non-driver components the distro carries natively. Driver packages are
/// never removed — they are shared system libraries. Mount entries are never
/// touched by uninstall.
pub fn build_uninstall_plan(selection: &Selection, facts: &SystemFacts) -> Result<InstallPlan> {
    let components = selection.enabled_components()?;

    if components.is_empty() {
        return Ok(InstallPlan {
            steps: Vec::new(),
            distro: facts.distro_family,
            warnings: Vec::new(),
            advisories: Vec::new(),
        });
    }

    if !facts.distro_family.is_supported() {
        return Err(GameTuiError::unsupported_distro(facts.distro_name.clone()));
    }

    let distro = facts.distro_family;
    // Resolution for removal never probes: remove both possible identities.
    let probe = crate::detect::FixedProbe::everything_available();
    let resolver = Resolver::new(&probe);

    let mut native: Vec<String> = Vec::new();
    let mut flatpak: Vec<String> = Vec::new();

    for component in &components {
        if component.category == Category::Optimization {
            continue;
        }
        let target = resolver.resolve(component, facts);
        match target.backend {
            Backend::Native if component.category != Category::Driver => {
                native.extend(target.identifiers)
            }
            Backend::Flatpak => flatpak.extend(target.identifiers),
            _ => {}
        }
        // A component installed via the Debian Flatpak fallback may be
        // present even though it resolves native today.
        if distro == DistroFamily::Debian {
            if let Some(fallback) = debian_uninstall_fallback(component.key) {
                flatpak.push(fallback.to_string());
            }
        }
    }

    let native = dedup_preserving_order(native);
    let flatpak = dedup_preserving_order(flatpak);

    let mut steps = Vec::new();

    if !flatpak.is_empty() {
        let mut args = vec!["uninstall", "-y"];
        let id_refs: Vec<&str> = flatpak.iter().map(String::as_str).collect();
        args.extend(id_refs);
        steps.push(Step::Batch {
            backend: Backend::Flatpak,
            identifiers: flatpak.clone(),
            command: CommandSpec::new("flatpak", &args, true),
        });
    }

    if !native.is_empty() {
        let id_refs: Vec<&str> = native.iter().map(String::as_str).collect();
        let command = match distro {
            DistroFamily::Arch => {
                let mut args = vec!["-Rns", "--noconfirm"];
                args.extend(id_refs);
                CommandSpec::new("pacman", &args, true)
            }
            DistroFamily::Debian => {
                let mut args = vec!["remove", "-y"];
                args.extend(id_refs);
                CommandSpec::new("apt", &args, true)
            }
            DistroFamily::Fedora => {
                let mut args = vec!["remove", "-y"];
                args.extend(id_refs);
                CommandSpec::new("dnf", &args, true)
            }
            DistroFamily::OpenSuse => {
                let mut args = vec!["remove", "-y"];
                args.extend(id_refs);
                CommandSpec::new("zypper", &args, true)
            }
            DistroFamily::Unknown => unreachable!("checked above"),
        };
        steps.push(Step::Batch { backend: Backend::Native, identifiers: native.clone(), command });

        if distro == DistroFamily::Debian {
            steps.push(Step::SingleAction {
                label: "Remove unused dependencies".to_string(),
                command: CommandSpec::new("apt", &["autoremove", "-y"], true),
            });
        }
    }

    Ok(InstallPlan { steps, distro, warnings: Vec::new(), advisories: Vec::new() })
}

/// Flatpak identity a Debian fallback install may have left behind.
fn debian_uninstall_fallback(key: &str) -> Option<&'static str> {
    match key {
        "steam" => Some("com.valvesoftware.Steam"),
        "lutris" => Some("net.lutris.Lutris"),
        _ => None,
    }
}

// ============================================================================
// Bootstrap steps
// ============================================================================

/// Emit the distro-specific native bootstraps.
///
/// Fedora and Debian need one-time setup before any native batch; openSUSE
/// needs the NVIDIA vendor repo only when the nvidia component is selected.
fn push_native_bootstraps(steps: &mut Vec<Step>, distro: DistroFamily, components: &[&Component]) {
    match distro {
        DistroFamily::Fedora => {
            // The release RPM URL embeds the Fedora version via rpm macro
            // expansion, so these run through sh -c.
            steps.push(Step::Bootstrap {
                label: "Enable RPM Fusion (free)".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", "dnf install -y https://download1.rpmfusion.org/free/fedora/rpmfusion-free-release-$(rpm -E %fedora).noarch.rpm"],
                    true,
                ),
                mandatory: true,
            });
            steps.push(Step::Bootstrap {
                label: "Enable RPM Fusion (nonfree)".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", "dnf install -y https://download1.rpmfusion.org/nonfree/fedora/rpmfusion-nonfree-release-$(rpm -E %fedora).noarch.rpm"],
                    true,
                ),
                mandatory: true,
            });
        }
        DistroFamily::Debian => {
            steps.push(Step::Bootstrap {
                label: "Refresh package index".to_string(),
                command: CommandSpec::new("apt", &["update"], true),
                mandatory: true,
            });
            steps.push(Step::Bootstrap {
                label: "Enable i386 architecture".to_string(),
                command: CommandSpec::new("dpkg", &["--add-architecture", "i386"], true),
                mandatory: true,
            });
        }
        DistroFamily::OpenSuse => {
            if components.iter().any(|c| c.key == "nvidia") {
                steps.push(Step::Bootstrap {
                    label: "Register NVIDIA repository".to_string(),
                    command: CommandSpec::new(
                        "zypper",
                        &[
                            "addrepo",
                            "--refresh",
                            "https://download.nvidia.com/opensuse/tumbleweed",
                            "NVIDIA",
                        ],
                        true,
                    ),
                    mandatory: true,
                });
            }
        }
        DistroFamily::Arch | DistroFamily::Unknown => {}
    }
}

/// Emit the lazy Flatpak bootstrap: install the runtime if absent, then
/// register Flathub. Only called when the Flatpak batch is non-empty.
fn push_flatpak_bootstraps(steps: &mut Vec<Step>, distro: DistroFamily, probe: &dyn HostProbe) {
    if !probe.binary_in_path("flatpak") {
        let command = match distro {
            DistroFamily::Arch => {
                CommandSpec::new("pacman", &["-S", "--needed", "--noconfirm", "flatpak"], true)
            }
            DistroFamily::Debian => CommandSpec::new("apt", &["install", "-y", "flatpak"], true),
            DistroFamily::Fedora => CommandSpec::new("dnf", &["install", "-y", "flatpak"], true),
            DistroFamily::OpenSuse => {
                CommandSpec::new("zypper", &["install", "-y", "flatpak"], true)
            }
            DistroFamily::Unknown => return,
        };
        steps.push(Step::Bootstrap {
            label: "Install Flatpak".to_string(),
            command,
            mandatory: true,
        });
    }

    steps.push(Step::Bootstrap {
        label: "Register Flathub remote".to_string(),
        command: CommandSpec::new(
            "flatpak",
            &["remote-add", "--if-not-exists", "flathub", FLATHUB_REPO],
            true,
        ),
        mandatory: true,
    });
}

/// Render the native install batch for the distro.
fn native_batch_step(distro: DistroFamily, identifiers: &[String]) -> Step {
    let id_refs: Vec<&str> = identifiers.iter().map(String::as_str).collect();
    let command = match distro {
        DistroFamily::Arch => {
            let mut args = vec!["-S", "--needed", "--noconfirm"];
            args.extend(id_refs);
            CommandSpec::new("pacman", &args, true)
        }
        DistroFamily::Debian => {
            let mut args = vec!["install", "-y"];
            args.extend(id_refs);
            CommandSpec::new("apt", &args, true)
        }
        DistroFamily::Fedora => {
            let mut args = vec!["install", "-y"];
            args.extend(id_refs);
            CommandSpec::new("dnf", &args, true)
        }
        DistroFamily::OpenSuse => {
            let mut args = vec!["install", "-y"];
            args.extend(id_refs);
            CommandSpec::new("zypper", &args, true)
        }
        DistroFamily::Unknown => unreachable!("plan builder rejects unknown distros"),
    };
    Step::Batch { backend: Backend::Native, identifiers: identifiers.to_vec(), command }
}

/// First AUR helper found in PATH, in fixed priority order.
pub fn discover_aur_helper(probe: &dyn HostProbe) -> Option<AurHelper> {
    AurHelper::PRIORITY.into_iter().find(|helper| probe.binary_in_path(helper.binary()))
}

// ============================================================================
// Optimization steps
// ============================================================================

/// Emit the tuning commands for one optimization component.
///
/// These are shell one-liners with redirections, so they run through `sh -c`.
fn push_optimization_steps(steps: &mut Vec<Step>, component: &Component) {
    match component.key {
        "cpu_governor" => {
            steps.push(Step::SingleAction {
                label: "Set performance CPU governor".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", "echo 'GOVERNOR=\"performance\"' > /etc/default/cpufrequtils"],
                    true,
                ),
            });
            steps.push(Step::SingleAction {
                label: "Persist governor via tmpfiles".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", "echo 'w /sys/devices/system/cpu/cpu*/cpufreq/scaling_governor - - - - performance' > /etc/tmpfiles.d/cpu-governor.conf"],
                    true,
                ),
            });
        }
        "swappiness" => {
            steps.push(Step::SingleAction {
                label: "Lower swappiness for gaming".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", "echo 'vm.swappiness=10' > /etc/sysctl.d/99-gaming.conf"],
                    true,
                ),
            });
            steps.push(Step::SingleAction {
                label: "Apply sysctl settings".to_string(),
                command: CommandSpec::new("sysctl", &["-p", "/etc/sysctl.d/99-gaming.conf"], true),
            });
        }
        "io_scheduler" => {
            steps.push(Step::SingleAction {
                label: "I/O scheduler rule (SSD)".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", r#"echo 'ACTION=="add|change", KERNEL=="sd[a-z]*", ATTR{queue/rotational}=="0", ATTR{queue/scheduler}="none"' > /etc/udev/rules.d/60-io-scheduler.rules"#],
                    true,
                ),
            });
            steps.push(Step::SingleAction {
                label: "I/O scheduler rule (HDD)".to_string(),
                command: CommandSpec::new(
                    "sh",
                    &["-c", r#"echo 'ACTION=="add|change", KERNEL=="sd[a-z]*", ATTR{queue/rotational}=="1", ATTR{queue/scheduler}="mq-deadline"' >> /etc/udev/rules.d/60-io-scheduler.rules"#],
                    true,
                ),
            });
        }
        _ => log::error!("unknown optimization component '{}'", component.key),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Deduplicate identifiers, keeping the first occurrence's position.
///
/// Installing an identifier twice would be a no-op for the manager, but the
/// plan should not redundantly list it.
fn dedup_preserving_order(identifiers: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    identifiers.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FixedProbe;
    use crate::types::GpuVendor;

    fn facts(distro: DistroFamily, gpu: GpuVendor) -> SystemFacts {
        SystemFacts { distro_family: distro, gpu_vendor: gpu, ..SystemFacts::default() }
    }

    #[test]
    fn test_empty_selection_yields_empty_plan() {
        let probe = FixedProbe::everything_available();
        let plan =
            build_install_plan(&Selection::new(), &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_distro_with_selection_fails() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["steam"]);
        let err =
            build_install_plan(&selection, &facts(DistroFamily::Unknown, GpuVendor::Amd), &probe)
                .unwrap_err();
        assert!(matches!(err, GameTuiError::UnsupportedDistro(_)));
    }

    #[test]
    fn test_unknown_distro_with_empty_selection_is_fine() {
        let probe = FixedProbe::everything_available();
        let plan =
            build_install_plan(&Selection::new(), &facts(DistroFamily::Unknown, GpuVendor::Amd), &probe)
                .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_arch_amd_example_plan() {
        // Worked example: Arch, GPU=AMD, steam+mesa+vulkan — one native
        // batch, no AUR or Flatpak steps.
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["steam", "mesa", "vulkan"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        assert_eq!(plan.steps.len(), 1);
        match &plan.steps[0] {
            Step::Batch { backend: Backend::Native, identifiers, .. } => {
                assert_eq!(
                    identifiers,
                    &[
                        "steam",
                        "mesa",
                        "lib32-mesa",
                        "vulkan-icd-loader",
                        "lib32-vulkan-icd-loader",
                        "vulkan-radeon",
                        "lib32-vulkan-radeon",
                    ]
                );
            }
            other => panic!("expected native batch, got {}", other),
        }
        assert!(plan.batch_for(Backend::Aur).is_none());
        assert!(plan.batch_for(Backend::Flatpak).is_none());
    }

    #[test]
    fn test_overlapping_identifiers_are_deduplicated() {
        // mesa and lib32 both pull lib32-mesa on Arch.
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["mesa", "lib32"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        let Some(Step::Batch { identifiers, .. }) = plan.batch_for(Backend::Native) else {
            panic!("expected a native batch");
        };
        let count = identifiers.iter().filter(|id| id.as_str() == "lib32-mesa").count();
        assert_eq!(count, 1, "lib32-mesa should appear exactly once");
    }

    #[test]
    fn test_debian_bootstraps_precede_native_batch() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["wine"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Debian, GpuVendor::Amd), &probe)
                .unwrap();

        let update_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("package index")));
        let arch_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("i386")));
        let batch_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Native, .. }));

        assert!(update_idx.is_some() && arch_idx.is_some() && batch_idx.is_some());
        assert!(update_idx.unwrap() < batch_idx.unwrap());
        assert!(arch_idx.unwrap() < batch_idx.unwrap());
    }

    #[test]
    fn test_fedora_rpmfusion_bootstraps_present() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["steam"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Fedora, GpuVendor::Nvidia), &probe)
                .unwrap();

        let fusion_steps = plan
            .steps
            .iter()
            .filter(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("RPM Fusion")))
            .count();
        assert_eq!(fusion_steps, 2);
        assert!(matches!(&plan.steps[0], Step::Bootstrap { mandatory: true, .. }));
    }

    #[test]
    fn test_flatpak_bootstrap_is_lazy() {
        let probe = FixedProbe::with_binaries(&["flatpak"]);

        // No flatpak components selected: no bootstrap.
        let selection = Selection::from_keys(["wine"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();
        assert!(!plan.steps.iter().any(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("Flathub"))));

        // Flatpak component selected: remote registration appears, before the batch.
        let selection = Selection::from_keys(["bottles"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();
        let remote_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("Flathub")));
        let batch_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Flatpak, .. }));
        assert!(remote_idx.is_some() && batch_idx.is_some());
        assert!(remote_idx.unwrap() < batch_idx.unwrap());
    }

    #[test]
    fn test_flatpak_runtime_installed_when_absent() {
        // Probe reports no flatpak binary: the bootstrap installs it first.
        let probe = FixedProbe::with_binaries(&[]);
        let selection = Selection::from_keys(["bottles"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Fedora, GpuVendor::Amd), &probe)
                .unwrap();

        let install_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label == "Install Flatpak"));
        let remote_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("Flathub")));
        assert!(install_idx.is_some());
        assert!(install_idx.unwrap() < remote_idx.unwrap());
    }

    #[test]
    fn test_native_precedes_aur_precedes_flatpak() {
        let probe = FixedProbe::with_binaries(&["yay", "flatpak"]);
        let selection = Selection::from_keys(["steam", "heroic", "bottles"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        let native_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Native, .. }))
            .expect("native batch");
        let aur_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Aur, .. }))
            .expect("aur batch");
        let flatpak_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Flatpak, .. }))
            .expect("flatpak batch");

        assert!(native_idx < aur_idx);
        assert!(aur_idx < flatpak_idx);
    }

    #[test]
    fn test_missing_aur_helper_degrades_with_warning() {
        let probe = FixedProbe::with_binaries(&["flatpak"]);
        let selection = Selection::from_keys(["steam", "heroic"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        assert!(plan.batch_for(Backend::Aur).is_none());
        assert!(plan.batch_for(Backend::Native).is_some());
        assert!(plan.warnings.iter().any(|w| w.contains("AUR helper")));
        assert!(plan.warnings.iter().any(|w| w.contains("heroic-games-launcher-bin")));
    }

    #[test]
    fn test_aur_helper_priority_first_match_wins() {
        let probe = FixedProbe::with_binaries(&["yay", "paru"]);
        assert_eq!(discover_aur_helper(&probe), Some(AurHelper::Yay));

        let probe = FixedProbe::with_binaries(&["paru"]);
        assert_eq!(discover_aur_helper(&probe), Some(AurHelper::Paru));

        let probe = FixedProbe::with_binaries(&[]);
        assert_eq!(discover_aur_helper(&probe), None);
    }

    #[test]
    fn test_aur_batch_command_is_unprivileged() {
        let probe = FixedProbe::with_binaries(&["yay"]);
        let selection = Selection::from_keys(["heroic"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        let Some(Step::Batch { command, .. }) = plan.batch_for(Backend::Aur) else {
            panic!("expected aur batch");
        };
        assert!(!command.privileged);
        assert_eq!(command.program, "yay");
    }

    #[test]
    fn test_unsupported_component_surfaces_warning() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["dxvk"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Debian, GpuVendor::Amd), &probe)
                .unwrap();

        assert!(plan.steps.iter().all(|s| !matches!(s, Step::Batch { .. })));
        assert!(plan.warnings.iter().any(|w| w.contains("DXVK")));
    }

    #[test]
    fn test_opensuse_nvidia_repo_bootstrap() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["nvidia"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::OpenSuse, GpuVendor::Nvidia), &probe)
                .unwrap();

        let repo_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("NVIDIA")));
        let batch_idx = plan
            .steps
            .iter()
            .position(|s| matches!(s, Step::Batch { backend: Backend::Native, .. }));
        assert!(repo_idx.is_some());
        assert!(repo_idx.unwrap() < batch_idx.unwrap());
    }

    #[test]
    fn test_debian_stable_steam_fallback_plan() {
        // Worked example: Debian stable without non-free — the plan carries a
        // Flatpak Steam batch and the non-free advisory.
        let probe = FixedProbe { candidates: false, binaries: vec!["flatpak".to_string()] };
        let selection = Selection::from_keys(["steam"]);
        let mut f = facts(DistroFamily::Debian, GpuVendor::Amd);
        f.debian_version = Some("12.5".to_string());

        let plan = build_install_plan(&selection, &f, &probe).unwrap();

        let Some(Step::Batch { identifiers, .. }) = plan.batch_for(Backend::Flatpak) else {
            panic!("expected flatpak batch");
        };
        assert_eq!(identifiers, &["com.valvesoftware.Steam"]);
        assert!(plan.batch_for(Backend::Native).is_none());
        assert!(plan.advisories.iter().any(|a| a.contains("non-free")));
    }

    #[test]
    fn test_optimizations_become_single_actions() {
        let probe = FixedProbe::everything_available();
        let selection = Selection::from_keys(["swappiness"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert!(plan.steps.iter().all(|s| matches!(s, Step::SingleAction { .. })));
        assert!(plan.steps.iter().all(|s| s.command().privileged));
    }

    #[test]
    fn test_uninstall_plan_skips_drivers() {
        let selection = Selection::from_keys(["steam", "mesa", "gamemode"]);
        let plan = build_uninstall_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd))
            .unwrap();

        let Some(Step::Batch { identifiers, command, .. }) = plan.batch_for(Backend::Native) else {
            panic!("expected native removal batch");
        };
        assert!(identifiers.contains(&"steam".to_string()));
        assert!(identifiers.contains(&"gamemode".to_string()));
        assert!(!identifiers.contains(&"mesa".to_string()), "drivers are never removed");
        assert_eq!(command.program, "pacman");
        assert!(command.args.contains(&"-Rns".to_string()));
    }

    #[test]
    fn test_uninstall_on_debian_covers_flatpak_fallback_and_autoremove() {
        let selection = Selection::from_keys(["steam"]);
        let plan = build_uninstall_plan(&selection, &facts(DistroFamily::Debian, GpuVendor::Amd))
            .unwrap();

        let Some(Step::Batch { identifiers, .. }) = plan.batch_for(Backend::Flatpak) else {
            panic!("expected flatpak removal batch");
        };
        assert!(identifiers.contains(&"com.valvesoftware.Steam".to_string()));
        assert!(plan
            .steps
            .iter()
            .any(|s| matches!(s, Step::SingleAction { command, .. } if command.args.contains(&"autoremove".to_string()))));
    }

    #[test]
    fn test_plan_summary_lists_steps_and_warnings() {
        let probe = FixedProbe::with_binaries(&["flatpak"]);
        let selection = Selection::from_keys(["steam", "heroic"]);
        let plan =
            build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe)
                .unwrap();
        let summary = plan.summary();
        assert!(summary.contains("arch"));
        assert!(summary.contains("pacman"));
        assert!(summary.contains("[!]"));
    }
}
