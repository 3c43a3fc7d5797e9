//! Type-safe core types for gametui
//!
//! This module replaces stringly-typed system facts with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Linux distribution family
///
/// Derived once per run from `/etc/os-release` and treated as a read-only
/// input to all resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DistroFamily {
    #[strum(serialize = "arch")]
    Arch,
    #[strum(serialize = "debian")]
    Debian,
    #[strum(serialize = "fedora")]
    Fedora,
    #[strum(serialize = "opensuse")]
    OpenSuse,
    #[default]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl DistroFamily {
    /// All families the resolver carries a package table for.
    pub fn supported() -> [DistroFamily; 4] {
        [Self::Arch, Self::Debian, Self::Fedora, Self::OpenSuse]
    }

    /// Check if this family has a package table
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// The native package manager binary for this family.
    pub fn native_manager(&self) -> Option<&'static str> {
        match self {
            Self::Arch => Some("pacman"),
            Self::Debian => Some("apt"),
            Self::Fedora => Some("dnf"),
            Self::OpenSuse => Some("zypper"),
            Self::Unknown => None,
        }
    }
}

/// GPU vendor detected from the PCI bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum GpuVendor {
    #[strum(serialize = "NVIDIA")]
    Nvidia,
    #[strum(serialize = "AMD")]
    Amd,
    #[strum(serialize = "Intel")]
    Intel,
    #[default]
    #[strum(serialize = "Unknown")]
    Unknown,
}

/// Package delivery backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// The distro's own package manager (pacman, apt, dnf, zypper)
    #[strum(serialize = "native")]
    Native,
    /// Community-built packages installed through an AUR helper (Arch only)
    #[strum(serialize = "aur")]
    Aur,
    /// Flatpak applications from Flathub
    #[strum(serialize = "flatpak")]
    Flatpak,
    /// No delivery path on this distro; the operator must be told
    #[strum(serialize = "unsupported")]
    Unsupported,
}

/// Component category, used for grouping in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    #[strum(serialize = "launcher")]
    Launcher,
    #[strum(serialize = "driver")]
    Driver,
    #[strum(serialize = "tool")]
    Tool,
    #[strum(serialize = "optimization")]
    Optimization,
}

/// AUR helper selection
///
/// Discovery order is fixed: the first helper found in PATH wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AurHelper {
    #[strum(serialize = "yay")]
    Yay,
    #[strum(serialize = "paru")]
    Paru,
}

impl AurHelper {
    /// Helpers in discovery priority order (first match wins).
    pub const PRIORITY: [AurHelper; 2] = [Self::Yay, Self::Paru];

    /// Binary name to look up in PATH
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Yay => "yay",
            Self::Paru => "paru",
        }
    }
}
