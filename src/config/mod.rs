// Configuration management
use crate::error::{BmxError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".bmx";
const CONFIG_FILE: &str = "config.toml";
const PROJECT_FILE: &str = ".bmx.toml";

pub const DEFAULT_FILTER: &str = "amazon_aws";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_DURATION: u32 = 60;

/// Values read from `~/.bmx/config.toml`, a project `.bmx.toml`, `BMX_*`
/// environment variables or command line flags, in increasing precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UserConfig {
    pub allow_project_configs: bool,
    pub org: Option<String>,
    pub user: Option<String>,
    pub account: Option<String>,
    pub role: Option<String>,
    pub profile: Option<String>,
    pub filter: Option<String>,
    /// Minutes
    pub default_duration: Option<u32>,
}

/// Effective options after every layer has been applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub org: String,
    pub user: String,
    pub account: String,
    pub role: String,
    pub profile: String,
    pub filter: String,
    pub duration: u32,
}

/// Where configuration files are looked up
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub user_dir: PathBuf,
    pub working_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Result<Self> {
        let user_dir = dirs::home_dir().ok_or_else(|| {
            BmxError::ConfigError("Could not determine home directory".to_string())
        })?;
        let working_dir = std::env::current_dir()?;

        Ok(Self {
            user_dir,
            working_dir,
        })
    }

    /// Get the user config file path
    pub fn config_file_path(&self) -> PathBuf {
        self.user_dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load the user config, overlaid by the nearest project config when allowed
    pub fn load(&self) -> Result<UserConfig> {
        let config_path = self.config_file_path();

        let mut config = if config_path.exists() {
            tracing::debug!("Loading config from: {}", config_path.display());
            read_config(&config_path)?
        } else {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            UserConfig::default()
        };

        if config.allow_project_configs {
            if let Some(project_path) = find_project_config(&self.working_dir) {
                tracing::debug!("Loading project config from: {}", project_path.display());
                config.overlay(read_config(&project_path)?);
            }
        }

        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<UserConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        BmxError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    toml::from_str(&contents)
        .map_err(|e| BmxError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Search `start` and its ancestors for a project config file
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|candidate| candidate.is_file())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl UserConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = ConfigLoader::new()?.load()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override values with `BMX_ORG`, `BMX_USER`, `BMX_ACCOUNT` and `BMX_ROLE`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            ("BMX_ORG", &mut self.org),
            ("BMX_USER", &mut self.user),
            ("BMX_ACCOUNT", &mut self.account),
            ("BMX_ROLE", &mut self.role),
        ];

        for (key, field) in fields {
            if let Some(value) = non_empty(lookup(key)) {
                tracing::debug!("Using {} from environment: {}", key, value);
                *field = Some(value);
            }
        }
    }

    /// Replace values with the non-empty ones set in `other`
    pub fn overlay(&mut self, other: UserConfig) {
        let UserConfig {
            allow_project_configs: _,
            org,
            user,
            account,
            role,
            profile,
            filter,
            default_duration,
        } = other;

        for (field, value) in [
            (&mut self.org, org),
            (&mut self.user, user),
            (&mut self.account, account),
            (&mut self.role, role),
            (&mut self.profile, profile),
            (&mut self.filter, filter),
        ] {
            if let Some(value) = non_empty(value) {
                *field = Some(value);
            }
        }

        if default_duration.is_some() {
            self.default_duration = default_duration;
        }
    }

    /// Apply command line `flags` and fill in defaults
    pub fn merge(mut self, flags: UserConfig) -> Result<Settings> {
        self.overlay(flags);

        let org = non_empty(self.org).ok_or_else(|| {
            BmxError::ConfigError(
                "Okta org not configured. Pass --org, set BMX_ORG or add org to ~/.bmx/config.toml"
                    .to_string(),
            )
        })?;

        let duration = self.default_duration.unwrap_or(DEFAULT_DURATION);
        if duration == 0 {
            return Err(BmxError::ConfigError(
                "Duration must be at least one minute".to_string(),
            ));
        }

        Ok(Settings {
            org,
            user: self.user.unwrap_or_default(),
            account: self.account.unwrap_or_default(),
            role: self.role.unwrap_or_default(),
            profile: non_empty(self.profile).unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            filter: non_empty(self.filter).unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn loader(user_dir: &Path, working_dir: &Path) -> ConfigLoader {
        ConfigLoader {
            user_dir: user_dir.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    fn write_user_config(user_dir: &Path, contents: &str) {
        let dir = user_dir.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let home = tempfile::tempdir().unwrap();

        let config = loader(home.path(), home.path()).load().unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_user_config_parsed() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(
            home.path(),
            "org = \"d2l\"\nuser = \"jdoe\"\ndefault_duration = 30\n",
        );

        let config = loader(home.path(), home.path()).load().unwrap();
        assert_eq!(config.org.as_deref(), Some("d2l"));
        assert_eq!(config.user.as_deref(), Some("jdoe"));
        assert_eq!(config.default_duration, Some(30));
        assert!(!config.allow_project_configs);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(home.path(), "org = [\n");

        let err = loader(home.path(), home.path()).load().unwrap_err();
        assert!(matches!(err, BmxError::ConfigError(_)));
    }

    #[test]
    fn test_project_config_found_in_ancestor() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(
            home.path(),
            "allow_project_configs = true\norg = \"d2l\"\naccount = \"dev\"\n",
        );
        let project = home.path().join("project");
        let nested = project.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(project.join(PROJECT_FILE), "account = \"prod\"\nrole = \"owner\"\n").unwrap();

        assert_eq!(
            find_project_config(&nested),
            Some(project.join(PROJECT_FILE))
        );

        let config = loader(home.path(), &nested).load().unwrap();
        assert_eq!(config.org.as_deref(), Some("d2l"));
        assert_eq!(config.account.as_deref(), Some("prod"));
        assert_eq!(config.role.as_deref(), Some("owner"));
    }

    #[test]
    fn test_project_config_ignored_unless_allowed() {
        let home = tempfile::tempdir().unwrap();
        write_user_config(home.path(), "account = \"dev\"\n");
        fs::write(home.path().join(PROJECT_FILE), "account = \"prod\"\n").unwrap();

        let config = loader(home.path(), home.path()).load().unwrap();
        assert_eq!(config.account.as_deref(), Some("dev"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let env: HashMap<&str, &str> = [("BMX_ORG", "envorg"), ("BMX_ROLE", "")]
            .into_iter()
            .collect();
        let mut config = UserConfig {
            org: Some("fileorg".to_string()),
            role: Some("filerole".to_string()),
            ..Default::default()
        };

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.org.as_deref(), Some("envorg"));
        assert_eq!(config.role.as_deref(), Some("filerole"));
    }

    #[test]
    fn test_merge_flags_win_when_not_empty() {
        let config = UserConfig {
            org: Some("d2l".to_string()),
            user: Some("jdoe".to_string()),
            account: Some("dev".to_string()),
            default_duration: Some(30),
            ..Default::default()
        };
        let flags = UserConfig {
            user: Some(String::new()),
            account: Some("prod".to_string()),
            default_duration: Some(15),
            ..Default::default()
        };

        let settings = config.merge(flags).unwrap();
        assert_eq!(
            settings,
            Settings {
                org: "d2l".to_string(),
                user: "jdoe".to_string(),
                account: "prod".to_string(),
                role: String::new(),
                profile: DEFAULT_PROFILE.to_string(),
                filter: DEFAULT_FILTER.to_string(),
                duration: 15,
            }
        );
    }

    #[test]
    fn test_merge_requires_org() {
        let err = UserConfig::default()
            .merge(UserConfig::default())
            .unwrap_err();
        assert!(matches!(err, BmxError::ConfigError(_)));
    }

    #[test]
    fn test_merge_rejects_zero_duration() {
        let flags = UserConfig {
            org: Some("d2l".to_string()),
            default_duration: Some(0),
            ..Default::default()
        };

        assert!(UserConfig::default().merge(flags).is_err());
    }
}
