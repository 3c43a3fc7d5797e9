//! Drive mount provisioning
//!
//! Turns a detected, unmounted block device into a persisted fstab entry with
//! filesystem-aware options and performs the live mount.
//!
//! # Behavior
//!
//! - The mount table is backed up once per run (timestamped copy) before any
//!   mutation.
//! - NTFS-family and exFAT filesystems get numeric uid/gid mapping for the
//!   owning user plus permission masks; everything else gets
//!   `defaults,nofail`. Every entry carries `nofail` so a detached drive
//!   never blocks boot.
//! - Idempotence: before appending, the existing table is scanned for the
//!   mount point as a substring. The scan is deliberately loose (a match
//!   anywhere in the file counts as "already configured") — it can only ever
//!   skip an append, never duplicate one.
//! - Each device is provisioned independently; one failure does not block
//!   the others. Uninstall never removes mount entries.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::detect::DetectedDrive;
use crate::executor::{Executor, OutputSink};
use crate::plan::{CommandSpec, Step};

/// Path of the system mount table.
pub const FSTAB_PATH: &str = "/etc/fstab";

/// One drive the operator wants durably mounted.
///
/// Consumed exactly once when the run is applied; never auto-destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// Device node ("/dev/sdb1")
    pub device: PathBuf,
    /// Where to mount it ("/mnt/games_sdb1")
    pub mount_point: PathBuf,
    /// Filesystem type as reported by lsblk
    pub fstype: String,
    /// Filesystem UUID; preferred over the device node in fstab when present
    pub uuid: Option<String>,
    /// User who owns the mount point (resolved from the environment)
    pub owner: String,
}

impl MountConfig {
    /// Build a config for a detected drive with the invoking user as owner.
    pub fn for_drive(drive: &DetectedDrive, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            device: PathBuf::from(&drive.device),
            mount_point: mount_point.into(),
            fstype: drive.fstype.clone(),
            uuid: drive.uuid.clone(),
            owner: invoking_user(),
        }
    }

    /// Default mount point for a drive: `/mnt/games_<node>`.
    pub fn default_mount_point(drive: &DetectedDrive) -> PathBuf {
        let node = drive.device.rsplit('/').next().unwrap_or("drive");
        PathBuf::from(format!("/mnt/games_{}", node))
    }

    /// Render the persisted table entry for this config.
    pub fn fstab_entry(&self, uid: u32, gid: u32) -> String {
        let source = match &self.uuid {
            Some(uuid) => format!("UUID={}", uuid),
            None => self.device.display().to_string(),
        };
        format!(
            "{} {} {} {} 0 2",
            source,
            self.mount_point.display(),
            self.fstype,
            mount_options(&self.fstype, uid, gid)
        )
    }
}

/// Outcome of provisioning one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Entry appended and mount issued
    Applied,
    /// Mount point already present in the table; nothing appended
    AlreadyConfigured,
    /// Directory, ownership, table, or mount command failure
    Failed(String),
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::AlreadyConfigured => write!(f, "already configured"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-device provisioning result for the final report.
#[derive(Debug, Clone)]
pub struct MountReport {
    pub mount_point: PathBuf,
    pub outcome: ProvisionOutcome,
}

/// Provisions mount configs against a mount table.
pub struct MountProvisioner<'a> {
    fstab_path: PathBuf,
    executor: &'a Executor,
}

impl<'a> MountProvisioner<'a> {
    /// Provisioner against the system fstab.
    pub fn new(executor: &'a Executor) -> Self {
        Self::with_fstab_path(executor, FSTAB_PATH)
    }

    /// Provisioner against a specific table path (tests, chroots).
    pub fn with_fstab_path(executor: &'a Executor, path: impl Into<PathBuf>) -> Self {
        Self { fstab_path: path.into(), executor }
    }

    /// Provision every config, independently; one failure never blocks the
    /// rest. The table is backed up once before the first mutation.
    pub fn provision_all(
        &self,
        configs: &[MountConfig],
        sink: &mut dyn OutputSink,
    ) -> Vec<MountReport> {
        if configs.is_empty() {
            return Vec::new();
        }

        self.backup_fstab(sink);

        configs
            .iter()
            .map(|config| MountReport {
                mount_point: config.mount_point.clone(),
                outcome: self.provision(config, sink),
            })
            .collect()
    }

    /// Provision one device: directory, ownership, table entry, live mount.
    pub fn provision(&self, config: &MountConfig, sink: &mut dyn OutputSink) -> ProvisionOutcome {
        sink.line(&format!(
            "[+] Setting up mount: {} -> {}",
            config.device.display(),
            config.mount_point.display()
        ));

        let mount_point = config.mount_point.display().to_string();

        if let Err(reason) = self.run(
            "Create mount point",
            CommandSpec::new("mkdir", &["-p", &mount_point], true),
            sink,
        ) {
            return ProvisionOutcome::Failed(reason);
        }

        let owner_spec = format!("{0}:{0}", config.owner);
        if let Err(reason) = self.run(
            "Assign mount point ownership",
            CommandSpec::new("chown", &[&owner_spec, &mount_point], true),
            sink,
        ) {
            return ProvisionOutcome::Failed(reason);
        }

        let appended = match self.ensure_fstab_entry(config, sink) {
            Ok(appended) => appended,
            Err(reason) => return ProvisionOutcome::Failed(reason),
        };

        // The live mount relies on the entry just written (or found current).
        sink.line(&format!("[+] Mounting {}...", mount_point));
        if let Err(reason) =
            self.run("Mount drive", CommandSpec::new("mount", &[&mount_point], true), sink)
        {
            return ProvisionOutcome::Failed(reason);
        }

        if appended {
            ProvisionOutcome::Applied
        } else {
            ProvisionOutcome::AlreadyConfigured
        }
    }

    /// Ensure the table carries an entry for the config's mount point.
    ///
    /// Returns `Ok(true)` when an entry was appended, `Ok(false)` when the
    /// mount point was already present (nothing written).
    pub fn ensure_fstab_entry(
        &self,
        config: &MountConfig,
        sink: &mut dyn OutputSink,
    ) -> Result<bool, String> {
        let mount_point = config.mount_point.display().to_string();
        let (uid, gid) = resolve_owner_ids(&config.owner);
        let entry = config.fstab_entry(uid, gid);

        let content = fs::read_to_string(&self.fstab_path)
            .map_err(|e| format!("cannot read {}: {}", self.fstab_path.display(), e))?;

        if fstab_contains_mount_point(&content, &mount_point) {
            log::info!("mount point {} already in {}", mount_point, self.fstab_path.display());
            sink.line(&format!("[!] Mount point {} already configured", mount_point));
            return Ok(false);
        }

        sink.line(&format!("[+] Adding to {}: {}", self.fstab_path.display(), entry));
        let append = format!("echo '{}' >> {}", entry, self.fstab_path.display());
        self.run("Persist mount entry", CommandSpec::new("sh", &["-c", &append], true), sink)?;
        Ok(true)
    }

    /// Copy the table aside with a timestamp suffix. Failure is logged but
    /// does not stop the run.
    fn backup_fstab(&self, sink: &mut dyn OutputSink) {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let backup = format!("{}.backup.{}", self.fstab_path.display(), stamp);
        sink.line(&format!("[+] Backing up {} to {}", self.fstab_path.display(), backup));

        let fstab = self.fstab_path.display().to_string();
        if let Err(reason) =
            self.run("Back up mount table", CommandSpec::new("cp", &[&fstab, &backup], true), sink)
        {
            log::warn!("fstab backup failed: {}", reason);
        }
    }

    /// Run one provisioning command through the executor.
    fn run(
        &self,
        label: &str,
        command: CommandSpec,
        sink: &mut dyn OutputSink,
    ) -> Result<(), String> {
        let step = Step::SingleAction { label: label.to_string(), command };
        let result = self.executor.run_step(&step, sink);
        if result.succeeded {
            Ok(())
        } else {
            let reason = format!(
                "{} failed (exit code {})",
                label,
                result.exit_code.map_or_else(|| "none".to_string(), |c| c.to_string())
            );
            log::error!("{}", reason);
            Err(reason)
        }
    }
}

// ============================================================================
// Option derivation
// ============================================================================

/// Derive mount options from the filesystem type.
///
/// NTFS and exFAT have no POSIX ownership, so the owning user is mapped in
/// numerically with sane permission masks. `windows_names` additionally
/// rejects file names Windows cannot represent (NTFS only).
pub fn mount_options(fstype: &str, uid: u32, gid: u32) -> String {
    match fstype {
        "ntfs" | "ntfs3" => {
            format!("uid={},gid={},dmask=022,fmask=133,windows_names,nofail", uid, gid)
        }
        "exfat" => format!("uid={},gid={},dmask=022,fmask=133,nofail", uid, gid),
        _ => "defaults,nofail".to_string(),
    }
}

/// Loose idempotence scan: the mount point appearing anywhere in the table
/// counts as already configured.
///
/// Deliberately conservative — a false positive skips an append, a false
/// negative cannot happen. Parsing per-entry would tighten path-prefix edge
/// cases and is a one-line change here if ever wanted.
pub fn fstab_contains_mount_point(content: &str, mount_point: &str) -> bool {
    content.contains(mount_point)
}

/// The non-privileged user that invoked us: SUDO_USER, then USER, then root.
pub fn invoking_user() -> String {
    std::env::var("SUDO_USER")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "root".to_string())
}

/// Resolve uid/gid for the owner, falling back to root when undeterminable.
fn resolve_owner_ids(owner: &str) -> (u32, u32) {
    match nix::unistd::User::from_name(owner) {
        Ok(Some(user)) => (user.uid.as_raw(), user.gid.as_raw()),
        Ok(None) => {
            log::warn!("user '{}' not found; mapping ownership to root", owner);
            (0, 0)
        }
        Err(e) => {
            log::warn!("failed to look up user '{}': {}; mapping ownership to root", owner, e);
            (0, 0)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntfs_options_map_owner() {
        let options = mount_options("ntfs", 1000, 1000);
        assert_eq!(options, "uid=1000,gid=1000,dmask=022,fmask=133,windows_names,nofail");
        assert_eq!(mount_options("ntfs3", 1000, 1000), options);
    }

    #[test]
    fn test_exfat_options_have_no_windows_names() {
        let options = mount_options("exfat", 1000, 1000);
        assert_eq!(options, "uid=1000,gid=1000,dmask=022,fmask=133,nofail");
    }

    #[test]
    fn test_posix_filesystems_get_defaults() {
        assert_eq!(mount_options("ext4", 1000, 1000), "defaults,nofail");
        assert_eq!(mount_options("btrfs", 1000, 1000), "defaults,nofail");
        assert_eq!(mount_options("xfs", 1000, 1000), "defaults,nofail");
    }

    #[test]
    fn test_fstab_entry_prefers_uuid() {
        let config = MountConfig {
            device: PathBuf::from("/dev/sdb1"),
            mount_point: PathBuf::from("/mnt/games"),
            fstype: "ext4".to_string(),
            uuid: Some("abcd-1234".to_string()),
            owner: "root".to_string(),
        };
        assert_eq!(config.fstab_entry(0, 0), "UUID=abcd-1234 /mnt/games ext4 defaults,nofail 0 2");
    }

    #[test]
    fn test_fstab_entry_falls_back_to_device() {
        let config = MountConfig {
            device: PathBuf::from("/dev/sdb1"),
            mount_point: PathBuf::from("/mnt/games"),
            fstype: "ntfs".to_string(),
            uuid: None,
            owner: "root".to_string(),
        };
        let entry = config.fstab_entry(1000, 1000);
        assert!(entry.starts_with("/dev/sdb1 /mnt/games ntfs "));
        assert!(entry.contains("windows_names"));
        assert!(entry.ends_with(" 0 2"));
    }

    #[test]
    fn test_loose_scan_matches_substring() {
        let content = "UUID=x / ext4 defaults 0 1\nUUID=y /mnt/games ext4 defaults,nofail 0 2\n";
        assert!(fstab_contains_mount_point(content, "/mnt/games"));
        assert!(!fstab_contains_mount_point(content, "/mnt/media"));
        // Documented conservatism: a prefix of an existing entry also matches.
        assert!(fstab_contains_mount_point(content, "/mnt/game"));
    }

    #[test]
    fn test_default_mount_point_from_device() {
        let drive = crate::detect::DetectedDrive {
            device: "/dev/nvme0n1p3".to_string(),
            size: "2T".to_string(),
            fstype: "ext4".to_string(),
            uuid: None,
            label: None,
        };
        assert_eq!(MountConfig::default_mount_point(&drive), PathBuf::from("/mnt/games_nvme0n1p3"));
    }
}
