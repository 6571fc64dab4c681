//! What pacman knows about installed software, plus the AUR name set.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::command::CommandRunner;
use crate::errors::Result;

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed wrapper over the `pacman` query commands.
pub struct Pacman<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Pacman<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Names of all installed packages. Empty if pacman fails.
    pub fn installed_packages(&self) -> HashSet<String> {
        match self.runner.run_checked("pacman", &["-Qq"], LIST_TIMEOUT) {
            Ok(stdout) => parse_names(&stdout).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list installed packages");
                HashSet::new()
            }
        }
    }

    /// The "Depends On" set of an installed package, version constraints stripped.
    pub fn dependencies_of(&self, name: &str) -> HashSet<String> {
        match self.runner.run_checked("pacman", &["-Qi", name], QUERY_TIMEOUT) {
            Ok(stdout) => parse_depends(&stdout),
            Err(e) => {
                tracing::debug!(package = name, error = %e, "dependency query failed");
                HashSet::new()
            }
        }
    }

    /// Whether any installed package claims `path`.
    pub fn owns_path(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        match self.runner.run("pacman", &["-Qo", &path], QUERY_TIMEOUT) {
            Ok(output) => output.success,
            Err(e) => {
                tracing::debug!(%path, error = %e, "ownership query failed");
                false
            }
        }
    }

    /// Packages installed as dependencies that nothing requires any more.
    ///
    /// pacman exits non-zero when there are none, so that case is an empty list
    /// rather than an error.
    pub fn orphans(&self) -> Result<Vec<String>> {
        let output = self.runner.run("pacman", &["-Qtdq"], LIST_TIMEOUT)?;
        if !output.success {
            return Ok(Vec::new());
        }
        Ok(parse_names(&output.stdout).collect())
    }
}

fn parse_names(stdout: &str) -> impl Iterator<Item = String> + '_ {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

fn parse_depends(info: &str) -> HashSet<String> {
    let Some(line) = info.lines().find(|l| l.starts_with("Depends On")) else {
        return HashSet::new();
    };
    let Some((_, deps)) = line.split_once(':') else {
        return HashSet::new();
    };
    let deps = deps.trim();
    if deps == "None" {
        return HashSet::new();
    }
    deps.split_whitespace()
        .map(|d| {
            let end = d.find(['>', '<', '=']).unwrap_or(d.len());
            d[..end].trim().to_string()
        })
        .filter(|d| !d.is_empty())
        .collect()
}

/// Snapshot of installed and AUR package names taken once per scan.
#[derive(Default)]
pub struct PackageInventory {
    installed: HashSet<String>,
    remote: HashSet<String>,
}

impl PackageInventory {
    pub fn new(installed: HashSet<String>, remote: HashSet<String>) -> Self {
        Self {
            installed: installed.iter().map(|n| n.to_lowercase()).collect(),
            remote: remote.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains(&name.to_lowercase())
    }

    pub fn is_in_remote_index(&self, name: &str) -> bool {
        self.remote.contains(&name.to_lowercase())
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }

    pub fn remote_count(&self) -> usize {
        self.remote.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::{FakeRunner, Reply};

    const QI_OUTPUT: &str = "\
Name            : firefox
Version         : 128.0-1
Depends On      : gtk3  libxt  mime-types  nss>=3.100  glibc<3  python=3.12
Optional Deps   : networkmanager: Location detection via available WiFi networks
";

    #[test]
    fn installed_packages_parses_lines() {
        let runner = FakeRunner::new().ok("pacman -Qq", "bash\ncoreutils\n\nlinux\n");
        let installed = Pacman::new(&runner).installed_packages();
        assert_eq!(installed.len(), 3);
        assert!(installed.contains("linux"));
    }

    #[test]
    fn installed_packages_fails_soft() {
        let runner = FakeRunner::new().reply("pacman -Qq", Reply::Timeout);
        assert!(Pacman::new(&runner).installed_packages().is_empty());

        let missing = FakeRunner::new();
        assert!(Pacman::new(&missing).installed_packages().is_empty());
    }

    #[test]
    fn dependencies_strip_version_constraints() {
        let runner = FakeRunner::new().ok("pacman -Qi firefox", QI_OUTPUT);
        let deps = Pacman::new(&runner).dependencies_of("firefox");
        let mut sorted: Vec<_> = deps.into_iter().collect();
        sorted.sort();
        assert_eq!(
            sorted,
            vec!["glibc", "gtk3", "libxt", "mime-types", "nss", "python"]
        );
    }

    #[test]
    fn dependencies_none_and_failure_are_empty() {
        let runner = FakeRunner::new()
            .ok("pacman -Qi base", "Name : base\nDepends On : None\n")
            .fail("pacman -Qi ghost");
        let pacman = Pacman::new(&runner);
        assert!(pacman.dependencies_of("base").is_empty());
        assert!(pacman.dependencies_of("ghost").is_empty());
    }

    #[test]
    fn ownership_follows_exit_status() {
        let runner = FakeRunner::new()
            .ok("pacman -Qo /etc/pacman.d", "/etc/pacman.d is owned by pacman 6.1")
            .fail("pacman -Qo /etc/leftover");
        let pacman = Pacman::new(&runner);
        assert!(pacman.owns_path(Path::new("/etc/pacman.d")));
        assert!(!pacman.owns_path(Path::new("/etc/leftover")));
        assert!(!pacman.owns_path(Path::new("/etc/unscripted")));
    }

    #[test]
    fn no_orphans_is_not_an_error() {
        let runner = FakeRunner::new().fail("pacman -Qtdq");
        assert!(Pacman::new(&runner).orphans().unwrap().is_empty());

        let runner = FakeRunner::new().ok("pacman -Qtdq", "libfoo\nlibbar\n");
        assert_eq!(Pacman::new(&runner).orphans().unwrap(), vec!["libfoo", "libbar"]);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let inventory = PackageInventory::new(
            ["NetworkManager".to_string()].into_iter().collect(),
            ["Yay".to_string()].into_iter().collect(),
        );
        assert!(inventory.is_installed("networkmanager"));
        assert!(inventory.is_installed("NETWORKMANAGER"));
        assert!(inventory.is_in_remote_index("yay"));
        assert!(!inventory.is_in_remote_index("paru"));
    }
}
