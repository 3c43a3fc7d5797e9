//! Tests for install plan orchestration
//!
//! These tests verify the worked examples and cross-cutting invariants:
//! - Backend grouping, deduplication, and step ordering
//! - Debian Flatpak fallback with its advisory
//! - Degradation (missing AUR helper, unsupported components)
//! - Plan execution never short-circuiting

use gametui::{
    build_install_plan, build_uninstall_plan, Backend, CollectSink, DistroFamily, Executor,
    FixedProbe, GpuVendor, Selection, Step, SystemFacts,
};

fn facts(distro: DistroFamily, gpu: GpuVendor) -> SystemFacts {
    SystemFacts { distro_family: distro, gpu_vendor: gpu, ..SystemFacts::default() }
}

fn batch_position(plan: &gametui::InstallPlan, backend: Backend) -> Option<usize> {
    plan.steps.iter().position(|s| matches!(s, Step::Batch { backend: b, .. } if *b == backend))
}

// =============================================================================
// Worked examples
// =============================================================================

#[test]
fn test_arch_amd_steam_mesa_vulkan_single_native_batch() {
    let probe = FixedProbe::everything_available();
    let selection = Selection::from_keys(["steam", "mesa", "vulkan"]);
    let plan =
        build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe).unwrap();

    assert_eq!(plan.steps.len(), 1, "plan should be exactly one native batch:\n{}", plan.summary());
    let Step::Batch { backend, identifiers, command } = &plan.steps[0] else {
        panic!("expected a batch step");
    };
    assert_eq!(*backend, Backend::Native);
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
    assert_eq!(command.program, "pacman");
    assert!(command.privileged);
}

#[test]
fn test_debian_stable_steam_substitutes_flatpak_with_advisory() {
    // apt has no steam candidate: the plan must carry the Flatpak identifier
    // and advise about the non-free repository.
    let probe = FixedProbe { candidates: false, binaries: vec!["flatpak".to_string()] };
    let selection = Selection::from_keys(["steam"]);
    let mut f = facts(DistroFamily::Debian, GpuVendor::Amd);
    f.debian_version = Some("12.4".to_string());

    let plan = build_install_plan(&selection, &f, &probe).unwrap();

    assert!(batch_position(&plan, Backend::Native).is_none());
    let flatpak_idx = batch_position(&plan, Backend::Flatpak).expect("flatpak batch");
    let Step::Batch { identifiers, .. } = &plan.steps[flatpak_idx] else { unreachable!() };
    assert_eq!(identifiers, &["com.valvesoftware.Steam"]);
    assert!(plan.advisories.iter().any(|a| a.contains("non-free")));
}

// =============================================================================
// Ordering invariants
// =============================================================================

#[test]
fn test_bootstraps_precede_their_batches_on_every_distro() {
    let probe = FixedProbe::with_binaries(&["yay", "flatpak"]);
    let selection = Selection::from_keys(["steam", "heroic", "bottles", "nvidia", "wine"]);

    for distro in DistroFamily::supported() {
        let plan =
            build_install_plan(&selection, &facts(distro, GpuVendor::Nvidia), &probe).unwrap();

        let is_flatpak_bootstrap = |s: &Step| {
            matches!(s, Step::Bootstrap { label, .. }
                if label.contains("Flatpak") || label.contains("Flathub"))
        };

        // Flatpak bootstraps precede the flatpak batch.
        if let Some(f_idx) = batch_position(&plan, Backend::Flatpak) {
            for (idx, step) in plan.steps.iter().enumerate() {
                if is_flatpak_bootstrap(step) {
                    assert!(idx < f_idx, "flatpak bootstrap after its batch on {}", distro);
                }
            }
        }

        // Native bootstraps precede the native batch.
        if let Some(n_idx) = batch_position(&plan, Backend::Native) {
            for (idx, step) in plan.steps.iter().enumerate() {
                if matches!(step, Step::Bootstrap { .. }) && !is_flatpak_bootstrap(step) {
                    assert!(idx < n_idx, "native bootstrap after its batch on {}", distro);
                }
            }
        }

        // native < aur < flatpak whenever present
        let native = batch_position(&plan, Backend::Native);
        let aur = batch_position(&plan, Backend::Aur);
        let flatpak = batch_position(&plan, Backend::Flatpak);
        if let (Some(n), Some(a)) = (native, aur) {
            assert!(n < a, "native batch must precede AUR batch on {}", distro);
        }
        if let (Some(a), Some(f)) = (aur, flatpak) {
            assert!(a < f, "AUR batch must precede Flatpak batch on {}", distro);
        }
        if let (Some(n), Some(f)) = (native, flatpak) {
            assert!(n < f, "native batch must precede Flatpak batch on {}", distro);
        }
    }
}

#[test]
fn test_flatpak_bootstrap_only_with_flatpak_batch() {
    let probe = FixedProbe::with_binaries(&["flatpak"]);

    for distro in DistroFamily::supported() {
        // wine is native everywhere; no flatpak batch, no flathub bootstrap
        let selection = Selection::from_keys(["wine"]);
        let plan = build_install_plan(&selection, &facts(distro, GpuVendor::Amd), &probe).unwrap();
        assert!(
            !plan
                .steps
                .iter()
                .any(|s| matches!(s, Step::Bootstrap { label, .. } if label.contains("Flathub"))),
            "unexpected Flathub bootstrap on {} without a flatpak batch",
            distro
        );
    }
}

// =============================================================================
// Degradation
// =============================================================================

#[test]
fn test_missing_aur_helper_drops_batch_but_keeps_plan() {
    let probe = FixedProbe::with_binaries(&["flatpak"]);
    let selection = Selection::from_keys(["steam", "heroic", "bottles"]);
    let plan =
        build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe).unwrap();

    assert!(batch_position(&plan, Backend::Aur).is_none());
    assert!(batch_position(&plan, Backend::Native).is_some());
    assert!(batch_position(&plan, Backend::Flatpak).is_some());
    assert!(plan.warnings.iter().any(|w| w.contains("AUR helper")));
}

#[test]
fn test_unsupported_components_reported_per_component() {
    let probe = FixedProbe::everything_available();
    let selection = Selection::from_keys(["dxvk", "vkbasalt"]);
    let plan =
        build_install_plan(&selection, &facts(DistroFamily::OpenSuse, GpuVendor::Amd), &probe)
            .unwrap();

    // Both are unsupported on openSUSE; each gets its own warning.
    assert!(plan.warnings.iter().any(|w| w.contains("DXVK")));
    assert!(plan.warnings.iter().any(|w| w.contains("vkBasalt")));
    assert!(plan.is_empty());
}

#[test]
fn test_unknown_distro_fails_before_any_execution() {
    let probe = FixedProbe::everything_available();
    let selection = Selection::from_keys(["steam"]);
    let result = build_install_plan(&selection, &facts(DistroFamily::Unknown, GpuVendor::Amd), &probe);
    assert!(result.is_err());
}

// =============================================================================
// Execution integration
// =============================================================================

#[test]
fn test_dry_run_reports_every_planned_step() {
    let probe = FixedProbe::with_binaries(&["yay", "flatpak"]);
    let selection = Selection::from_keys(["steam", "heroic", "bottles", "swappiness"]);
    let plan =
        build_install_plan(&selection, &facts(DistroFamily::Arch, GpuVendor::Amd), &probe).unwrap();

    let mut sink = CollectSink::default();
    let report = Executor::with_sudo(true, false).execute(&plan, &mut sink);

    assert_eq!(report.results.len(), plan.steps.len());
    assert!(report.all_succeeded());
    // Every step's command appears in the transcript.
    for step in &plan.steps {
        let line = format!("$ {}", step.command().display_line());
        assert!(sink.lines.contains(&line), "missing transcript line: {}", line);
    }
}

#[test]
fn test_uninstall_never_emits_bootstrap_steps() {
    for distro in DistroFamily::supported() {
        let selection = Selection::from_keys(["steam", "gamemode", "bottles"]);
        let plan = build_uninstall_plan(&selection, &facts(distro, GpuVendor::Amd)).unwrap();
        assert!(
            !plan.steps.iter().any(|s| matches!(s, Step::Bootstrap { .. })),
            "uninstall plan on {} should have no bootstraps",
            distro
        );
    }
}
