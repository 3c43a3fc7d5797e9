//! Backend resolver
//!
//! Translates a (component, distro, GPU) triple into the backend that carries
//! it and the concrete package identifiers to install.
//!
//! # Design
//!
//! - **Table-driven**: one per-distro lookup table is the single source of
//!   truth for every component mapping. No call site re-encodes distro
//!   branching.
//! - **Total**: every component resolves to exactly one target per supported
//!   distro; `Backend::Unsupported` is a valid terminal value that callers
//!   must surface to the operator. `verify_table_coverage` checks the tables
//!   for gaps and is exercised by tests and at startup.
//! - **Deterministic**: same inputs (including probe answers) always yield
//!   the same target. The only I/O is behind the injected [`HostProbe`].
//!
//! # Debian fallback
//!
//! Debian carries `steam` and `lutris` natively only when the matching
//! repository components (non-free) are configured. Those two entries are
//! probe-gated: if `apt-cache policy` reports no installation candidate, the
//! resolver substitutes the Flatpak build and attaches an advisory instead of
//! letting the apt batch fail later.

use crate::catalog::Component;
use crate::detect::{HostProbe, SystemFacts};
use crate::types::{Backend, DistroFamily, GpuVendor};

/// Result of resolving one component against the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    /// Which backend carries the component
    pub backend: Backend,
    /// Package identifiers, in install order
    pub identifiers: Vec<String>,
    /// Operator-facing note attached during resolution (e.g. repo hints)
    pub advisory: Option<String>,
}

impl BackendTarget {
    fn new(backend: Backend, identifiers: &[&str]) -> Self {
        Self {
            backend,
            identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
            advisory: None,
        }
    }

    fn unsupported() -> Self {
        Self { backend: Backend::Unsupported, identifiers: Vec::new(), advisory: None }
    }
}

/// Resolves components against the distro package tables.
pub struct Resolver<'a> {
    probe: &'a dyn HostProbe,
}

impl<'a> Resolver<'a> {
    pub fn new(probe: &'a dyn HostProbe) -> Self {
        Self { probe }
    }

    /// Resolve one component for the given system facts.
    ///
    /// Total and deterministic: an unknown distro resolves everything to
    /// `Unsupported`, and a component missing from a table (a bug caught by
    /// [`verify_table_coverage`]) degrades to `Unsupported` rather than
    /// panicking.
    pub fn resolve(&self, component: &Component, facts: &SystemFacts) -> BackendTarget {
        let distro = facts.distro_family;
        if !distro.is_supported() {
            return BackendTarget::unsupported();
        }

        let Some((backend, identifiers)) = base_target(component.key, distro) else {
            log::error!(
                "component '{}' is missing from the {} package table",
                component.key,
                distro
            );
            return BackendTarget::unsupported();
        };

        let mut target = BackendTarget::new(backend, identifiers);

        // GPU-conditional expansion applies only to the vulkan component:
        // vendor-specific ICDs on top of the vendor-neutral loaders.
        if component.key == "vulkan" {
            for extra in vulkan_gpu_extras(distro, facts.gpu_vendor) {
                target.identifiers.push(extra.to_string());
            }
        }

        // Debian probe-gated entries: fall back to Flatpak when apt has no
        // installation candidate for the native package.
        if distro == DistroFamily::Debian && backend == Backend::Native {
            if let Some(flatpak_id) = debian_flatpak_fallback(component.key) {
                let native_id = identifiers.first().copied().unwrap_or(component.key);
                if !self.probe.native_candidate(native_id) {
                    return BackendTarget {
                        backend: Backend::Flatpak,
                        identifiers: vec![flatpak_id.to_string()],
                        advisory: debian_fallback_advisory(component, facts),
                    };
                }
            }
        }

        target
    }
}

// ============================================================================
// Package tables
// ============================================================================

/// Base (component, distro) → (backend, identifiers) mapping.
///
/// This is the single source of truth. `None` means the component is missing
/// from the table entirely, which is a programming error surfaced by
/// [`verify_table_coverage`]; components that genuinely have no delivery path
/// on a distro are listed with `Backend::Unsupported`.
fn base_target(key: &str, distro: DistroFamily) -> Option<(Backend, &'static [&'static str])> {
    match distro {
        DistroFamily::Arch => arch_target(key),
        DistroFamily::Debian => debian_target(key),
        DistroFamily::Fedora => fedora_target(key),
        DistroFamily::OpenSuse => opensuse_target(key),
        DistroFamily::Unknown => None,
    }
}

fn arch_target(key: &str) -> Option<(Backend, &'static [&'static str])> {
    use Backend::*;
    Some(match key {
        "steam" => (Native, &["steam"]),
        "lutris" => (Native, &["lutris"]),
        "heroic" => (Aur, &["heroic-games-launcher-bin"]),
        "bottles" => (Flatpak, &["com.usebottles.bottles"]),
        "protonplus" => (Flatpak, &["com.vysp3r.ProtonPlus"]),
        "gamehub" => (Aur, &["gamehub-bin"]),
        "minigalaxy" => (Aur, &["minigalaxy"]),
        "itch" => (Aur, &["itch-setup-bin"]),
        "retroarch" => (Native, &["retroarch"]),
        "pegasus" => (Aur, &["pegasus-frontend-bin"]),
        "nvidia" => (Native, &["nvidia", "nvidia-utils", "nvidia-settings"]),
        "nvidia-open" => (Native, &["nvidia-open", "nvidia-utils", "nvidia-settings"]),
        "mesa" => (Native, &["mesa", "lib32-mesa"]),
        "vulkan" => (Native, &["vulkan-icd-loader", "lib32-vulkan-icd-loader"]),
        "lib32" => (Native, &["lib32-mesa", "lib32-vulkan-icd-loader"]),
        "gamemode" => (Native, &["gamemode", "lib32-gamemode"]),
        "mangohud" => (Native, &["mangohud", "lib32-mangohud"]),
        "goverlay" => (Aur, &["goverlay-bin"]),
        "protonge" => (Flatpak, &["net.davidotek.pupgui2"]),
        "wine" => (Native, &["wine"]),
        "winetricks" => (Native, &["winetricks"]),
        "dxvk" => (Native, &["dxvk-bin"]),
        "vkbasalt" => (Native, &["vkbasalt"]),
        "corectrl" => (Aur, &["corectrl"]),
        "steamtinker" => (Aur, &["steamtinkerlaunch"]),
        "antimicrox" => (Native, &["antimicrox"]),
        "gpu_recorder" => (Aur, &["gpu-screen-recorder"]),
        "gamescope" => (Native, &["gamescope"]),
        "obs" => (Native, &["obs-studio"]),
        "discord" => (Native, &["discord"]),
        "flatseal" => (Flatpak, &["com.github.tchx84.Flatseal"]),
        _ => return None,
    })
}

fn debian_target(key: &str) -> Option<(Backend, &'static [&'static str])> {
    use Backend::*;
    Some(match key {
        "steam" => (Native, &["steam"]),
        "lutris" => (Native, &["lutris"]),
        "heroic" => (Flatpak, &["com.heroicgameslauncher.hgl"]),
        "bottles" => (Flatpak, &["com.usebottles.bottles"]),
        "protonplus" => (Flatpak, &["com.vysp3r.ProtonPlus"]),
        "gamehub" => (Flatpak, &["com.github.tkashkin.gamehub"]),
        "minigalaxy" => (Flatpak, &["io.github.sharkwouter.Minigalaxy"]),
        "itch" => (Flatpak, &["io.itch.itch"]),
        "retroarch" => (Flatpak, &["org.libretro.RetroArch"]),
        "pegasus" => (Flatpak, &["org.pegasus_frontend.Pegasus"]),
        "nvidia" => (Native, &["nvidia-driver", "nvidia-driver-libs:i386"]),
        "nvidia-open" => (Unsupported, &[]),
        "mesa" => (Native, &["mesa-vulkan-drivers", "mesa-vulkan-drivers:i386"]),
        "vulkan" => (Native, &["libvulkan1", "libvulkan1:i386"]),
        "lib32" => (Native, &["libc6:i386", "libstdc++6:i386"]),
        "gamemode" => (Native, &["gamemode", "libgamemode0:i386"]),
        "mangohud" => (Native, &["mangohud"]),
        "goverlay" => (Flatpak, &["io.github.benjamimgois.goverlay"]),
        "protonge" => (Flatpak, &["net.davidotek.pupgui2"]),
        "wine" => (Native, &["wine"]),
        "winetricks" => (Native, &["winetricks"]),
        "dxvk" => (Unsupported, &[]),
        "vkbasalt" => (Native, &["vkbasalt"]),
        "corectrl" => (Native, &["corectrl"]),
        "steamtinker" => (Flatpak, &["com.github.Matoking.SteamTinkerLaunch"]),
        "antimicrox" => (Flatpak, &["io.github.antimicrox.antimicrox"]),
        "gpu_recorder" => (Flatpak, &["com.dec05eba.gpu_screen_recorder"]),
        "gamescope" => (Native, &["gamescope"]),
        "obs" => (Native, &["obs-studio"]),
        "discord" => (Flatpak, &["com.discordapp.Discord"]),
        "flatseal" => (Flatpak, &["com.github.tchx84.Flatseal"]),
        _ => return None,
    })
}

fn fedora_target(key: &str) -> Option<(Backend, &'static [&'static str])> {
    use Backend::*;
    Some(match key {
        "steam" => (Native, &["steam"]),
        "lutris" => (Native, &["lutris"]),
        "heroic" => (Flatpak, &["com.heroicgameslauncher.hgl"]),
        "bottles" => (Flatpak, &["com.usebottles.bottles"]),
        "protonplus" => (Flatpak, &["com.vysp3r.ProtonPlus"]),
        "gamehub" => (Flatpak, &["com.github.tkashkin.gamehub"]),
        "minigalaxy" => (Flatpak, &["io.github.sharkwouter.Minigalaxy"]),
        "itch" => (Flatpak, &["io.itch.itch"]),
        "retroarch" => (Native, &["retroarch"]),
        "pegasus" => (Flatpak, &["org.pegasus_frontend.Pegasus"]),
        "nvidia" => (Native, &["akmod-nvidia", "xorg-x11-drv-nvidia-cuda"]),
        "nvidia-open" => (Unsupported, &[]),
        "mesa" => (Native, &["mesa-dri-drivers", "mesa-vulkan-drivers"]),
        "vulkan" => (Native, &["vulkan-loader", "vulkan-tools"]),
        "lib32" => (Native, &["mesa-dri-drivers.i686", "mesa-vulkan-drivers.i686"]),
        "gamemode" => (Native, &["gamemode", "gamemode.i686"]),
        "mangohud" => (Native, &["mangohud"]),
        "goverlay" => (Flatpak, &["io.github.benjamimgois.goverlay"]),
        "protonge" => (Flatpak, &["net.davidotek.pupgui2"]),
        "wine" => (Native, &["wine"]),
        "winetricks" => (Native, &["winetricks"]),
        "dxvk" => (Unsupported, &[]),
        "vkbasalt" => (Native, &["vkbasalt"]),
        "corectrl" => (Native, &["corectrl"]),
        "steamtinker" => (Flatpak, &["com.github.Matoking.SteamTinkerLaunch"]),
        "antimicrox" => (Native, &["antimicrox"]),
        "gpu_recorder" => (Flatpak, &["com.dec05eba.gpu_screen_recorder"]),
        "gamescope" => (Native, &["gamescope"]),
        "obs" => (Native, &["obs-studio"]),
        "discord" => (Flatpak, &["com.discordapp.Discord"]),
        "flatseal" => (Flatpak, &["com.github.tchx84.Flatseal"]),
        _ => return None,
    })
}

fn opensuse_target(key: &str) -> Option<(Backend, &'static [&'static str])> {
    use Backend::*;
    Some(match key {
        "steam" => (Flatpak, &["com.valvesoftware.Steam"]),
        "lutris" => (Native, &["lutris"]),
        "heroic" => (Flatpak, &["com.heroicgameslauncher.hgl"]),
        "bottles" => (Flatpak, &["com.usebottles.bottles"]),
        "protonplus" => (Flatpak, &["com.vysp3r.ProtonPlus"]),
        "gamehub" => (Flatpak, &["com.github.tkashkin.gamehub"]),
        "minigalaxy" => (Flatpak, &["io.github.sharkwouter.Minigalaxy"]),
        "itch" => (Flatpak, &["io.itch.itch"]),
        "retroarch" => (Flatpak, &["org.libretro.RetroArch"]),
        "pegasus" => (Flatpak, &["org.pegasus_frontend.Pegasus"]),
        "nvidia" => (Native, &["nvidia-glG06", "nvidia-computeG06"]),
        "nvidia-open" => (Unsupported, &[]),
        "mesa" => (Native, &["Mesa", "Mesa-dri", "Mesa-vulkan-device-select"]),
        "vulkan" => (Native, &["libvulkan1", "vulkan-tools"]),
        "lib32" => (Native, &["Mesa-32bit", "libvulkan1-32bit"]),
        "gamemode" => (Native, &["gamemode"]),
        "mangohud" => (Native, &["mangohud"]),
        "goverlay" => (Flatpak, &["io.github.benjamimgois.goverlay"]),
        "protonge" => (Flatpak, &["net.davidotek.pupgui2"]),
        "wine" => (Native, &["wine"]),
        "winetricks" => (Native, &["winetricks"]),
        "dxvk" => (Unsupported, &[]),
        "vkbasalt" => (Unsupported, &[]),
        "corectrl" => (Flatpak, &["org.corectrl.CoreCtrl"]),
        "steamtinker" => (Flatpak, &["com.github.Matoking.SteamTinkerLaunch"]),
        "antimicrox" => (Flatpak, &["io.github.antimicrox.antimicrox"]),
        "gpu_recorder" => (Flatpak, &["com.dec05eba.gpu_screen_recorder"]),
        "gamescope" => (Native, &["gamescope"]),
        "obs" => (Native, &["obs-studio"]),
        "discord" => (Flatpak, &["com.discordapp.Discord"]),
        "flatseal" => (Flatpak, &["com.github.tchx84.Flatseal"]),
        _ => return None,
    })
}

/// Vendor-specific Vulkan ICD packages added on top of the neutral loaders.
///
/// Only Arch splits the ICDs into per-vendor packages; on the other families
/// the driver packages already carry the ICD.
fn vulkan_gpu_extras(distro: DistroFamily, gpu: GpuVendor) -> &'static [&'static str] {
    match (distro, gpu) {
        (DistroFamily::Arch, GpuVendor::Nvidia) => &["nvidia-utils"],
        (DistroFamily::Arch, GpuVendor::Amd) => &["vulkan-radeon", "lib32-vulkan-radeon"],
        (DistroFamily::Arch, GpuVendor::Intel) => &["vulkan-intel", "lib32-vulkan-intel"],
        _ => &[],
    }
}

/// Flatpak identifier used when a probe-gated Debian native package has no
/// installation candidate.
fn debian_flatpak_fallback(key: &str) -> Option<&'static str> {
    match key {
        "steam" => Some("com.valvesoftware.Steam"),
        "lutris" => Some("net.lutris.Lutris"),
        _ => None,
    }
}

/// Advisory attached to a Debian Flatpak substitution.
///
/// On Debian stable (numeric /etc/debian_version) the operator gets the
/// non-free sources hint; on testing/sid the substitution is routine and
/// needs no advisory.
fn debian_fallback_advisory(component: &Component, facts: &SystemFacts) -> Option<String> {
    let stable = facts
        .debian_version
        .as_deref()
        .is_some_and(|v| v.chars().next().is_some_and(|c| c.is_ascii_digit()));

    if component.key == "steam" && stable {
        Some(
            "Steam requires the non-free repository on Debian stable. \
             Add 'contrib non-free' to your /etc/apt/sources.list entries, \
             e.g.: deb http://deb.debian.org/debian bookworm main contrib non-free. \
             Installing the Flatpak build instead."
                .to_string(),
        )
    } else if stable {
        Some(format!(
            "{} is not available in the configured apt repositories; installing the Flatpak build instead.",
            component.display_name
        ))
    } else {
        None
    }
}

// ============================================================================
// Table validation
// ============================================================================

/// Verify the package tables cover every package component on every supported
/// distro, and that no supported entry has an empty identifier list.
///
/// Returns the list of violations so callers can print them all at once.
pub fn verify_table_coverage() -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    for component in crate::catalog::package_components() {
        for distro in DistroFamily::supported() {
            match base_target(component.key, distro) {
                None => problems.push(format!("'{}' missing from the {} table", component.key, distro)),
                Some((Backend::Unsupported, _)) => {}
                Some((_, ids)) if ids.is_empty() => {
                    problems.push(format!("'{}' on {} has no identifiers", component.key, distro))
                }
                Some(_) => {}
            }
        }
    }

    if problems.is_empty() { Ok(()) } else { Err(problems) }
}
