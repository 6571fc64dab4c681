use std::path::Path;

use crate::cleaner::{Category, Check, CleanupItem, Payload, ScanContext, SizedPath};
use crate::errors::Result;
use crate::packages::Pacman;
use crate::utils;

/// Directory names under /etc that are never reported, owned or not.
const CRITICAL_DIRS: &[&str] = &[
    "default",
    "ssl",
    "systemd",
    "modprobe.d",
    "sysctl.d",
    "iptables",
    "apparmor",
    "apparmor.d",
    "selinux",
    "audit",
    "pam.d",
    "sudoers.d",
    "dbus-1",
    "X11",
    "xdg",
    "profile.d",
    "NetworkManager",
    "dhcp",
    "resolv.conf",
    "hostname",
    "hosts",
    "fstab",
    "crypttab",
    "initramfs",
    "grub.d",
    "udev",
    "udev.rules.d",
    "init.d",
    "rc.d",
    "rc0.d",
    "rc1.d",
    "rc2.d",
    "rc3.d",
    "rc4.d",
    "rc5.d",
    "rc6.d",
    "runit",
    "sv",
    "s6",
    "openrc",
    "conf.d",
    "kernel",
    "modules.d",
    "kernel.d",
    "sysconfig",
    "environment.d",
    "tmpfiles.d",
    "modules-load.d",
    "depmod.d",
    "dracut.conf.d",
    "mkinitcpio.d",
    "mkinitcpio.conf",
    "pacman.d",
    "makepkg.conf",
    "installpkg",
    "pacman.conf",
    "bash_completion.d",
    "locale.conf",
    "vconsole.conf",
    "hw-probe",
    "locale",
    "locales",
    "nanorc",
    "profile",
    "shells",
    "shadow",
    "passwd",
    "group",
    "sudoers",
    "sudo_logsrvd",
    "sudo-ldap",
];

/// Paths relative to the config root that are always protected.
const CRITICAL_PATHS: &[&str] = &[
    "fstab",
    "hostname",
    "hosts",
    "resolv.conf",
    "pacman.conf",
    "systemd/system",
];

/// Name fragments of services that often keep config around on purpose.
const COMMON_APPS: &[&str] = &[
    "apache",
    "nginx",
    "mysql",
    "postgresql",
    "mongodb",
    "redis",
    "elasticsearch",
    "opensearch",
    "docker",
    "podman",
    "kubernetes",
    "wireguard",
    "openvpn",
    "strongswan",
    "bind",
    "dnsmasq",
    "unbound",
    "cups",
    "sane",
    "avahi",
    "bluetooth",
];

fn is_protected(root: &Path, dir: &Path, name: &str) -> bool {
    if CRITICAL_DIRS.contains(&name) {
        return true;
    }
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    CRITICAL_PATHS.iter().any(|p| relative == Path::new(p))
}

fn looks_like_common_app(name: &str) -> bool {
    let lower = name.to_lowercase();
    COMMON_APPS.iter().any(|app| lower.contains(app))
}

/// Top-level /etc directories that no package claims.
pub struct EtcOrphans;

impl Check for EtcOrphans {
    fn category(&self) -> Category {
        Category::OrphanedConfigDirs
    }

    fn scan(&self, ctx: &ScanContext) -> Result<Option<CleanupItem>> {
        let root = &ctx.config.paths.config_root;
        let Ok(read_dir) = std::fs::read_dir(root) else {
            return Ok(None);
        };

        let mut candidates: Vec<_> = read_dir
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.path())
            .collect();
        candidates.sort();

        let pacman = Pacman::new(ctx.runner);
        let mut dirs = Vec::new();

        for dir in candidates {
            let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if is_protected(root, &dir, &name) {
                continue;
            }
            if ctx.inventory.is_installed(&name) || ctx.inventory.is_in_remote_index(&name) {
                continue;
            }
            if looks_like_common_app(&name) {
                continue;
            }
            if pacman.owns_path(&dir) {
                continue;
            }

            let size = utils::dir_size(&dir);
            if size > 0 {
                tracing::debug!(dir = %dir.display(), size, "unowned /etc directory");
                dirs.push(SizedPath::new(dir, size));
            }
        }

        if dirs.is_empty() {
            return Ok(None);
        }

        let total_bytes = dirs.iter().map(|d| d.size_bytes).sum();
        let description = format!("Potentially orphaned /etc directories ({} dirs)", dirs.len());
        Ok(Some(CleanupItem::new(
            Some(root.clone()),
            total_bytes,
            description,
            Payload::OrphanedConfigDirs { dirs },
        )))
    }
}
