use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::foundation::error::{TokenpressError, TokenpressResult};

/// Per-user binary root below the home directory.
const HOME_BIN: &str = ".tokenpress/bin";

/// Platform directory name used inside a binary root.
pub fn platform_dir() -> &'static str {
    match std::env::consts::OS {
        "windows" => "windows",
        "macos" => "macos",
        other => other,
    }
}

/// Locates external tools.
///
/// Search order:
/// 1. an explicit per-tool override,
/// 2. the exclusive binary root override, if configured (nothing else is searched then),
/// 3. the per-user root `~/.tokenpress/bin`,
/// 4. the `bin` directory next to the running executable,
/// 5. `PATH`.
///
/// Inside a root, a tool lives at `<root>/<repo>/<platform>/<name>[.exe]`.
#[derive(Clone, Debug, Default)]
pub struct ExecutableResolver {
    overrides: BTreeMap<String, PathBuf>,
    bin_root_override: Option<PathBuf>,
    roots: Vec<PathBuf>,
    search_path: bool,
}

impl ExecutableResolver {
    pub fn from_config(cfg: &RunConfig) -> Self {
        let mut roots = Vec::new();
        if let Some(home) = home_dir() {
            roots.push(home.join(HOME_BIN));
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            roots.push(dir.join("bin"));
        }
        Self {
            overrides: cfg.executables.clone(),
            bin_root_override: cfg.bin_dir.clone(),
            roots,
            search_path: true,
        }
    }

    /// A resolver that only knows the given roots and never looks at `PATH`.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    pub fn with_override(mut self, repo: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(repo.into(), path.into());
        self
    }

    pub fn with_bin_root_override(mut self, root: impl Into<PathBuf>) -> Self {
        self.bin_root_override = Some(root.into());
        self
    }

    /// Find tool `name` distributed as `repo`.
    pub fn resolve(&self, repo: &str, name: &str) -> TokenpressResult<PathBuf> {
        let mut searched = Vec::new();

        if let Some(path) = self.overrides.get(repo).or_else(|| self.overrides.get(name)) {
            if path.is_file() {
                return Ok(path.clone());
            }
            searched.push(path.clone());
            return Err(not_found(name, searched));
        }

        if let Some(root) = &self.bin_root_override {
            return match try_root(root, repo, name, &mut searched) {
                Some(path) => Ok(path),
                None => Err(not_found(name, searched)),
            };
        }

        for root in &self.roots {
            if let Some(path) = try_root(root, repo, name, &mut searched) {
                return Ok(path);
            }
        }

        if self.search_path
            && let Some(paths) = std::env::var_os("PATH")
        {
            for dir in std::env::split_paths(&paths) {
                for candidate in candidates(&dir.join(name)) {
                    if candidate.is_file() {
                        return Ok(candidate);
                    }
                    searched.push(candidate);
                }
            }
        }

        Err(not_found(name, searched))
    }
}

fn try_root(root: &Path, repo: &str, name: &str, searched: &mut Vec<PathBuf>) -> Option<PathBuf> {
    let base = root.join(repo).join(platform_dir()).join(name);
    for candidate in candidates(&base) {
        if candidate.is_file() {
            tracing::debug!(tool = name, path = %candidate.display(), "resolved executable");
            return Some(candidate);
        }
        searched.push(candidate);
    }
    None
}

/// `<base>.exe` before `<base>` on Windows, `<base>` alone elsewhere.
fn candidates(base: &Path) -> Vec<PathBuf> {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() {
        vec![base.to_path_buf()]
    } else {
        let mut with_suffix = base.as_os_str().to_os_string();
        with_suffix.push(suffix);
        vec![PathBuf::from(with_suffix), base.to_path_buf()]
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

fn not_found(tool: &str, searched: Vec<PathBuf>) -> TokenpressError {
    TokenpressError::ExecutableNotFound {
        tool: tool.to_string(),
        searched,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/executable.rs"]
mod tests;
