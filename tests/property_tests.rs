//! Property-based tests for resolution and planning
//!
//! Uses proptest to check invariants across arbitrary selections and system
//! facts: deterministic resolution, batch deduplication, and backend
//! ordering.

use proptest::prelude::*;

use gametui::{
    build_install_plan, Backend, Category, DistroFamily, FixedProbe, GpuVendor, Resolver,
    Selection, Step, SystemFacts, COMPONENTS,
};

fn facts(distro: DistroFamily, gpu: GpuVendor) -> SystemFacts {
    SystemFacts { distro_family: distro, gpu_vendor: gpu, ..SystemFacts::default() }
}

fn distro_strategy() -> impl Strategy<Value = DistroFamily> {
    prop::sample::select(vec![
        DistroFamily::Arch,
        DistroFamily::Debian,
        DistroFamily::Fedora,
        DistroFamily::OpenSuse,
    ])
}

fn gpu_strategy() -> impl Strategy<Value = GpuVendor> {
    prop::sample::select(vec![
        GpuVendor::Nvidia,
        GpuVendor::Amd,
        GpuVendor::Intel,
        GpuVendor::Unknown,
    ])
}

fn selection_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    let keys: Vec<&'static str> = COMPONENTS.iter().map(|c| c.key).collect();
    prop::sample::subsequence(keys.clone(), 0..keys.len())
}

proptest! {
    /// Resolution is pure: identical inputs always yield identical targets.
    #[test]
    fn resolve_is_deterministic(
        distro in distro_strategy(),
        gpu in gpu_strategy(),
        idx in 0..COMPONENTS.len(),
    ) {
        let component = &COMPONENTS[idx];
        if component.category != Category::Optimization {
            let probe = FixedProbe::everything_available();
            let resolver = Resolver::new(&probe);
            let f = facts(distro, gpu);

            let first = resolver.resolve(component, &f);
            let second = resolver.resolve(component, &f);
            prop_assert_eq!(first, second);
        }
    }

    /// Supported targets always carry at least one identifier.
    #[test]
    fn supported_targets_are_never_empty(
        distro in distro_strategy(),
        gpu in gpu_strategy(),
        idx in 0..COMPONENTS.len(),
    ) {
        let component = &COMPONENTS[idx];
        if component.category != Category::Optimization {
            let probe = FixedProbe::everything_available();
            let resolver = Resolver::new(&probe);

            let target = resolver.resolve(component, &facts(distro, gpu));
            if target.backend != Backend::Unsupported {
                prop_assert!(!target.identifiers.is_empty());
            }
        }
    }

    /// Every batch in any plan is free of duplicate identifiers.
    #[test]
    fn batches_never_contain_duplicates(
        distro in distro_strategy(),
        gpu in gpu_strategy(),
        keys in selection_strategy(),
    ) {
        let probe = FixedProbe::with_binaries(&["yay", "flatpak"]);
        let selection = Selection::from_keys(keys);
        let plan = build_install_plan(&selection, &facts(distro, gpu), &probe).unwrap();

        for step in &plan.steps {
            if let Step::Batch { identifiers, .. } = step {
                let mut sorted = identifiers.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), identifiers.len(), "duplicates in batch");
            }
        }
    }

    /// Backend batch ordering holds for any selection on any distro.
    #[test]
    fn backend_ordering_holds(
        distro in distro_strategy(),
        gpu in gpu_strategy(),
        keys in selection_strategy(),
    ) {
        let probe = FixedProbe::with_binaries(&["paru", "flatpak"]);
        let selection = Selection::from_keys(keys);
        let plan = build_install_plan(&selection, &facts(distro, gpu), &probe).unwrap();

        let position = |backend: Backend| {
            plan.steps
                .iter()
                .position(|s| matches!(s, Step::Batch { backend: b, .. } if *b == backend))
        };
        let native = position(Backend::Native);
        let aur = position(Backend::Aur);
        let flatpak = position(Backend::Flatpak);

        if let (Some(n), Some(a)) = (native, aur) {
            prop_assert!(n < a);
        }
        if let (Some(a), Some(f)) = (aur, flatpak) {
            prop_assert!(a < f);
        }
        if let (Some(n), Some(f)) = (native, flatpak) {
            prop_assert!(n < f);
        }
    }
}
