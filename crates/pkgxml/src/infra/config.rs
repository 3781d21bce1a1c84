//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::ApiVersion;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".pkgxml/config.toml";

/// Files whose presence marks a directory as a project root.
const PROJECT_MARKERS: &[&str] = &[".config/metadata.json", "sfdx-project.json", ".pkgxml"];

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub discovery: Discovery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project root holding `.config/` caches. Defaults to the detected project root.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default = "Project::default_api_version")]
    pub api_version: ApiVersion,
    #[serde(default = "Project::default_project_name")]
    pub default_project_name: String,
    #[serde(default)]
    pub debug_mode: bool,
}

impl Project {
    fn default_api_version() -> ApiVersion {
        ApiVersion::default()
    }

    fn default_project_name() -> String {
        "pxsf".into()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self {
            workspace: None,
            api_version: Self::default_api_version(),
            default_project_name: Self::default_project_name(),
            debug_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Discovery {
    /// Path patterns skipped while looking for manifests to combine.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    api_version: Option<ApiVersion>,
    workspace: Option<PathBuf>,
    debug_mode: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self> {
        let api_version = env::var("PKGXML_API_VERSION")
            .ok()
            .map(|raw| raw.parse::<ApiVersion>())
            .transpose()
            .context("invalid PKGXML_API_VERSION")?;
        Ok(Self {
            api_version,
            workspace: env::var_os("PKGXML_WORKSPACE").map(PathBuf::from),
            debug_mode: env::var("PKGXML_DEBUG")
                .ok()
                .map(|raw| matches!(raw.trim(), "1" | "true" | "yes")),
        })
    }

    #[cfg(test)]
    fn for_tests(api_version: u32, workspace: &str) -> Self {
        Self {
            api_version: Some(ApiVersion::new(api_version)),
            workspace: Some(PathBuf::from(workspace)),
            debug_mode: Some(true),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    ///
    /// `workspace` pins the project root; otherwise it is detected from the current directory.
    pub fn load(workspace: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env()?;
        let global = global_config_path();
        let root = match workspace.or(env.workspace.as_deref()) {
            Some(root) => root.to_path_buf(),
            None => detect_project_root()?,
        };
        let workspace_config = Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH));

        let mut config = Self::load_with_layers(global, workspace_config, env)?;
        if config.project.workspace.is_none() {
            config.project.workspace = Some(root);
        }
        Ok(config)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            project: merge_project(self.project, other.project),
            discovery: merge_discovery(self.discovery, other.discovery),
        }
    }

    /// Resolved project root. Relative paths are taken from the current directory.
    pub fn workspace(&self) -> Result<PathBuf> {
        let cwd = env::current_dir().context("unable to determine working directory")?;
        Ok(match &self.project.workspace {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => cwd.join(path),
            None => cwd,
        })
    }

    pub fn api_version(&self) -> ApiVersion {
        self.project.api_version
    }
}

fn merge_project(base: Project, overlay: Project) -> Project {
    Project {
        workspace: overlay.workspace.or(base.workspace),
        api_version: if overlay.api_version != Project::default_api_version() {
            overlay.api_version
        } else {
            base.api_version
        },
        default_project_name: if overlay.default_project_name != Project::default_project_name()
        {
            overlay.default_project_name
        } else {
            base.default_project_name
        },
        debug_mode: overlay.debug_mode || base.debug_mode,
    }
}

fn merge_discovery(base: Discovery, overlay: Discovery) -> Discovery {
    let mut exclude: BTreeSet<String> = base.exclude.into_iter().collect();
    exclude.extend(overlay.exclude);

    Discovery {
        exclude: exclude.into_iter().collect(),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("pkgxml/config.toml"))
}

fn detect_project_root() -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    Ok(find_project_root(&cwd).unwrap_or(cwd))
}

fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if PROJECT_MARKERS
            .iter()
            .any(|marker| current.join(marker).exists())
        {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(api_version) = env.api_version {
        config.project.api_version = api_version;
    }
    if let Some(workspace) = env.workspace {
        config.project.workspace = Some(workspace);
    }
    if let Some(debug_mode) = env.debug_mode {
        config.project.debug_mode = debug_mode;
    }
    config
}
