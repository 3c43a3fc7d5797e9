//! Host fact detection and availability probes
//!
//! Detects the distro family, GPU vendor, and candidate game drives, and
//! exposes the [`HostProbe`] seam the resolver and plan builder use for
//! availability questions.
//!
//! # Design
//!
//! - **Pure parsers, thin wrappers**: everything that interprets command
//!   output is a plain function over `&str`, unit-tested without a shell.
//! - **Graceful fallbacks**: detection failures log a warning and default to
//!   `Unknown`; the plan builder is the layer that refuses to proceed.
//! - **Unprivileged**: every command here is a read-only discovery command
//!   and never requests elevation.

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::types::{DistroFamily, GpuVendor};

/// Facts about the host, gathered once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemFacts {
    /// Pretty name from os-release ("Arch Linux", "Debian GNU/Linux 12")
    pub distro_name: String,
    /// Distribution family driving all resolution
    pub distro_family: DistroFamily,
    /// VERSION_ID from os-release, if present
    pub distro_version: Option<String>,
    /// Detected GPU vendor
    pub gpu_vendor: GpuVendor,
    /// GPU model line from lspci, if identifiable
    pub gpu_name: Option<String>,
    /// Contents of /etc/debian_version (Debian family only)
    pub debian_version: Option<String>,
}

impl SystemFacts {
    /// Detect all host facts. Never panics; failures degrade to `Unknown`.
    pub fn detect() -> Self {
        let (distro_name, distro_family, distro_version) = detect_distro();
        let (gpu_vendor, gpu_name) = detect_gpu();
        let debian_version = if distro_family == DistroFamily::Debian {
            read_debian_version(Path::new("/etc/debian_version"))
        } else {
            None
        };

        let facts = Self {
            distro_name,
            distro_family,
            distro_version,
            gpu_vendor,
            gpu_name,
            debian_version,
        };
        log::info!("System detection: {}", facts);
        facts
    }
}

impl fmt::Display for SystemFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "distro={} ({}), gpu={}",
            self.distro_name, self.distro_family, self.gpu_vendor
        )
    }
}

// ============================================================================
// Distro detection
// ============================================================================

fn detect_distro() -> (String, DistroFamily, Option<String>) {
    match fs::read_to_string("/etc/os-release") {
        Ok(content) => parse_os_release(&content),
        Err(e) => {
            log::warn!("Failed to read /etc/os-release: {}", e);
            ("Unknown".to_string(), DistroFamily::Unknown, None)
        }
    }
}

/// Parse os-release content into (pretty name, family, version id).
pub fn parse_os_release(content: &str) -> (String, DistroFamily, Option<String>) {
    let mut id = None;
    let mut pretty_name = None;
    let mut version_id = None;

    for line in content.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim_matches('"').to_ascii_lowercase());
        } else if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            pretty_name = Some(value.trim_matches('"').to_string());
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version_id = Some(value.trim_matches('"').to_string());
        }
    }

    let family = id.as_deref().map(family_from_id).unwrap_or_default();
    (pretty_name.unwrap_or_else(|| "Unknown".to_string()), family, version_id)
}

/// Map an os-release ID to a distro family, covering common derivatives.
pub fn family_from_id(id: &str) -> DistroFamily {
    match id {
        "arch" | "manjaro" | "endeavouros" | "garuda" | "artix" | "arcolinux" => DistroFamily::Arch,
        "debian" | "ubuntu" | "linuxmint" | "pop" | "elementary" | "zorin" => DistroFamily::Debian,
        "fedora" | "nobara" | "ultramarine" => DistroFamily::Fedora,
        "opensuse-leap" | "opensuse-tumbleweed" | "opensuse" => DistroFamily::OpenSuse,
        _ => DistroFamily::Unknown,
    }
}

fn read_debian_version(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ============================================================================
// GPU detection
// ============================================================================

fn detect_gpu() -> (GpuVendor, Option<String>) {
    let output = Command::new("lspci").output();
    match output {
        Ok(output) if output.status.success() => {
            parse_lspci(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            log::warn!("lspci failed: {}", String::from_utf8_lossy(&output.stderr).trim());
            (GpuVendor::Unknown, None)
        }
        Err(e) => {
            log::warn!("Failed to run lspci: {}", e);
            (GpuVendor::Unknown, None)
        }
    }
}

/// Parse lspci output into (vendor, model line).
///
/// Vendor precedence mirrors the detection order: NVIDIA, then AMD/Radeon,
/// then Intel. The model is taken from the first VGA line for that vendor.
pub fn parse_lspci(output: &str) -> (GpuVendor, Option<String>) {
    let lower = output.to_ascii_lowercase();

    let vendor = if lower.contains("nvidia") {
        GpuVendor::Nvidia
    } else if lower.contains("amd") || lower.contains("radeon") {
        GpuVendor::Amd
    } else if lower.contains("intel") {
        GpuVendor::Intel
    } else {
        return (GpuVendor::Unknown, None);
    };

    let needles: &[&str] = match vendor {
        GpuVendor::Nvidia => &["nvidia"],
        GpuVendor::Amd => &["amd", "radeon"],
        GpuVendor::Intel => &["intel"],
        GpuVendor::Unknown => &[],
    };

    let model = output.lines().find_map(|line| {
        let line_lower = line.to_ascii_lowercase();
        if line_lower.contains("vga") && needles.iter().any(|n| line_lower.contains(n)) {
            line.rsplit_once(':').map(|(_, model)| model.trim().to_string())
        } else {
            None
        }
    });

    (vendor, model)
}

// ============================================================================
// Drive enumeration
// ============================================================================

/// An unmounted block device eligible for game-drive provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedDrive {
    /// Device node ("/dev/sdb1")
    pub device: String,
    /// Human-readable size from lsblk
    pub size: String,
    /// Filesystem type ("ntfs", "ext4", ...)
    pub fstype: String,
    /// Filesystem UUID, if lsblk reports one
    pub uuid: Option<String>,
    /// Filesystem label, if any
    pub label: Option<String>,
}

/// Filesystem types that are never mount candidates.
const INELIGIBLE_FSTYPES: &[&str] = &["swap", "linux_raid_member", "LVM2_member"];

/// Enumerate unmounted, mountable block devices via lsblk.
pub fn detect_drives() -> Vec<DetectedDrive> {
    let output = Command::new("lsblk")
        .args(["-P", "-o", "NAME,SIZE,FSTYPE,UUID,LABEL,MOUNTPOINT"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            parse_lsblk(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            log::warn!("lsblk failed: {}", String::from_utf8_lossy(&output.stderr).trim());
            Vec::new()
        }
        Err(e) => {
            log::warn!("Failed to run lsblk: {}", e);
            Vec::new()
        }
    }
}

/// Parse `lsblk -P` (KEY="value" pairs) output into eligible drives.
///
/// Skips anything mounted, without a filesystem, or carrying a swap/RAID/LVM
/// signature.
pub fn parse_lsblk(output: &str) -> Vec<DetectedDrive> {
    output
        .lines()
        .filter_map(|line| {
            let name = kv_value(line, "NAME")?;
            let fstype = kv_value(line, "FSTYPE").unwrap_or_default();
            let mountpoint = kv_value(line, "MOUNTPOINT").unwrap_or_default();

            if name.is_empty() || fstype.is_empty() || !mountpoint.is_empty() {
                return None;
            }
            if INELIGIBLE_FSTYPES.contains(&fstype.as_str()) {
                return None;
            }

            Some(DetectedDrive {
                device: format!("/dev/{}", name),
                size: kv_value(line, "SIZE").unwrap_or_default(),
                fstype,
                uuid: kv_value(line, "UUID").filter(|s| !s.is_empty()),
                label: kv_value(line, "LABEL").filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

/// Extract the value of `KEY="value"` from an lsblk pairs line.
fn kv_value(line: &str, key: &str) -> Option<String> {
    let marker = format!("{}=\"", key);
    let start = line.find(&marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

// ============================================================================
// Availability probes
// ============================================================================

/// Availability questions the resolver and plan builder ask about the host.
///
/// Behind a trait so the planning logic stays pure and testable; the
/// production implementation shells out.
pub trait HostProbe {
    /// Does the native package manager have an installation candidate for
    /// this identifier? (Used for Debian's probe-gated components.)
    fn native_candidate(&self, identifier: &str) -> bool;

    /// Is this binary resolvable in PATH?
    fn binary_in_path(&self, name: &str) -> bool;
}

/// Production probe that shells out for its answers.
pub struct ShellProbe;

impl HostProbe for ShellProbe {
    fn native_candidate(&self, identifier: &str) -> bool {
        let output = match Command::new("apt-cache").args(["policy", identifier]).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Failed to run apt-cache policy {}: {}", identifier, e);
                return false;
            }
        };
        if !output.status.success() {
            return false;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        // A listed candidate of "(none)" means the package is known but not
        // installable from the configured repositories.
        stdout.contains("Candidate:") && !stdout.contains("Candidate: (none)")
    }

    fn binary_in_path(&self, name: &str) -> bool {
        Command::new("which")
            .arg(name)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

/// Probe with canned answers, for tests and plan previews on foreign hosts.
pub struct FixedProbe {
    pub candidates: bool,
    pub binaries: Vec<String>,
}

impl FixedProbe {
    /// Every package has a candidate and every binary is present.
    pub fn everything_available() -> Self {
        Self { candidates: true, binaries: vec!["*".to_string()] }
    }

    /// No candidates, no binaries.
    pub fn nothing_available() -> Self {
        Self { candidates: false, binaries: Vec::new() }
    }

    /// No candidates, only the listed binaries present.
    pub fn with_binaries(binaries: &[&str]) -> Self {
        Self { candidates: true, binaries: binaries.iter().map(|s| s.to_string()).collect() }
    }
}

impl HostProbe for FixedProbe {
    fn native_candidate(&self, _identifier: &str) -> bool {
        self.candidates
    }

    fn binary_in_path(&self, name: &str) -> bool {
        self.binaries.iter().any(|b| b == "*" || b == name)
    }
}

// ============================================================================
// Tests
// ============================================================================
