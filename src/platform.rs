//! Execution environment detection and Windows AppData discovery.
//!
//! The editor keeps its settings under the Windows LocalAppData and
//! ProgramData roots. Outside native Windows those roots are reached through
//! the WSL `/mnt/c` mount or a Parallels VM disk mounted on the host.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const WSL_MOUNT: &str = "/mnt/c";
const NON_USER_DIRS: &[&str] = &["default", "public", "default user", "all users"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Wsl,
    MacOs,
    Linux,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Wsl => "wsl",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn detect_platform() -> Platform {
    if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "macos") {
        Platform::MacOs
    } else if is_wsl() {
        Platform::Wsl
    } else {
        Platform::Linux
    }
}

fn is_wsl() -> bool {
    fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Candidate mount points walked when looking for a Windows profile.
#[derive(Debug, Clone)]
pub struct MountRoots {
    pub wsl_mount: PathBuf,
    pub parallels_base: Option<PathBuf>,
}

impl Default for MountRoots {
    fn default() -> Self {
        Self {
            wsl_mount: PathBuf::from(WSL_MOUNT),
            parallels_base: dirs::home_dir()
                .map(|h| h.join("Library").join("Parallels").join("Windows Disks")),
        }
    }
}

/// Pair of optional Windows roots: (LocalAppData, ProgramData).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDataRoots {
    pub local_appdata: Option<PathBuf>,
    pub program_data: Option<PathBuf>,
}

/// Locate the AppData roots for `platform` using the default mounts.
pub fn locate_appdata(platform: Platform) -> AppDataRoots {
    locate_appdata_in(platform, &MountRoots::default())
}

pub fn locate_appdata_in(platform: Platform, mounts: &MountRoots) -> AppDataRoots {
    let roots = match platform {
        Platform::Windows => AppDataRoots {
            local_appdata: dirs::data_local_dir().filter(|p| p.exists()),
            program_data: std::env::var_os("PROGRAMDATA")
                .map(PathBuf::from)
                .filter(|p| p.exists()),
        },
        Platform::Wsl => windows_drive_roots(&mounts.wsl_mount),
        Platform::MacOs | Platform::Linux => mounts
            .parallels_base
            .as_deref()
            .and_then(find_parallels_root)
            .map(|c| windows_drive_roots(&c))
            .unwrap_or_default(),
    };
    debug!(
        platform = %platform,
        local_appdata = ?roots.local_appdata,
        program_data = ?roots.program_data,
        "resolved appdata roots"
    );
    roots
}

/// Find the `[C]` drive of the first Parallels VM under `base`.
pub fn find_parallels_root(base: &Path) -> Option<PathBuf> {
    for vm in sorted_dirs(base) {
        for item in sorted_dirs(&vm) {
            let is_c = item
                .file_name()
                .map(|n| n.to_string_lossy().starts_with("[C]"))
                .unwrap_or(false);
            if is_c {
                return Some(item);
            }
        }
    }
    None
}

/// Resolve user and machine roots on a mounted Windows system drive.
fn windows_drive_roots(drive: &Path) -> AppDataRoots {
    for user in sorted_dirs(&drive.join("Users")) {
        let name = user
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if NON_USER_DIRS.contains(&name.as_str()) {
            continue;
        }
        let local = user.join("AppData").join("Local");
        if local.is_dir() {
            return AppDataRoots {
                local_appdata: Some(local),
                program_data: Some(drive.join("ProgramData")),
            };
        }
    }
    AppDataRoots::default()
}

fn sorted_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    };
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_wsl_walk_skips_non_user_dirs() {
        let tmp = tempdir().unwrap();
        let drive = tmp.path();
        fs::create_dir_all(drive.join("Users/Default/AppData/Local")).unwrap();
        fs::create_dir_all(drive.join("Users/Public/AppData/Local")).unwrap();
        fs::create_dir_all(drive.join("Users/alice/AppData/Local")).unwrap();
        let mounts = MountRoots {
            wsl_mount: drive.to_path_buf(),
            parallels_base: None,
        };
        let roots = locate_appdata_in(Platform::Wsl, &mounts);
        assert_eq!(
            roots.local_appdata,
            Some(drive.join("Users/alice/AppData/Local"))
        );
        assert_eq!(roots.program_data, Some(drive.join("ProgramData")));
    }

    #[test]
    fn test_parallels_c_drive_is_found() {
        let tmp = tempdir().unwrap();
        let base = tmp.path();
        let c = base.join("{vm-uuid}/[C] Macdows.hidden");
        fs::create_dir_all(c.join("Users/bob/AppData/Local")).unwrap();
        let mounts = MountRoots {
            wsl_mount: base.join("missing"),
            parallels_base: Some(base.to_path_buf()),
        };
        assert_eq!(find_parallels_root(base), Some(c.clone()));
        let roots = locate_appdata_in(Platform::MacOs, &mounts);
        assert_eq!(roots.local_appdata, Some(c.join("Users/bob/AppData/Local")));
    }

    #[test]
    fn test_absent_mounts_yield_no_roots() {
        let tmp = tempdir().unwrap();
        let mounts = MountRoots {
            wsl_mount: tmp.path().join("nope"),
            parallels_base: Some(tmp.path().join("nope")),
        };
        assert_eq!(locate_appdata_in(Platform::Wsl, &mounts), AppDataRoots::default());
        assert_eq!(locate_appdata_in(Platform::Linux, &mounts), AppDataRoots::default());
    }
}
