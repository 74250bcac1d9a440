use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lgw_network::ConnectOptions;

/// Client settings read from `lgw.toml`.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub wallet_dir: PathBuf,
    pub label: String,
    pub msp_id: String,
    /// MSP directory with `signcerts/` and `keystore/`, used by `enroll`.
    pub msp_dir: Option<PathBuf>,
    /// Connection profile, `.json` or `.toml`.
    pub profile: PathBuf,
    pub options: ConnectOptions,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            wallet_dir: PathBuf::from("wallet"),
            label: "appUser".into(),
            msp_id: "Org1MSP".into(),
            msp_dir: None,
            profile: PathBuf::from("connection-profile.json"),
            options: ConnectOptions::default(),
        }
    }
}

impl GatewayConfig {
    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve(base);
        }
        Ok(config)
    }

    fn resolve(&mut self, base: &Path) {
        let join = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };
        self.wallet_dir = join(&self.wallet_dir);
        self.profile = join(&self.profile);
        self.msp_dir = self.msp_dir.as_deref().map(join);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load(&dir.path().join("lgw.toml")).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.label, "appUser");
    }

    #[test]
    fn relative_paths_follow_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lgw.toml");
        std::fs::write(
            &path,
            r#"
label = "auditor"
msp_dir = "org1/msp"
profile = "/etc/lgw/profile.json"

[options]
discovery_as_localhost = true
evaluate_timeout = { secs = 2, nanos = 0 }
"#,
        )
        .unwrap();

        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.label, "auditor");
        assert_eq!(config.wallet_dir, dir.path().join("wallet"));
        assert_eq!(config.msp_dir, Some(dir.path().join("org1/msp")));
        assert_eq!(config.profile, PathBuf::from("/etc/lgw/profile.json"));
        assert!(config.options.discovery_as_localhost);
        assert_eq!(config.options.evaluate_timeout, Duration::from_secs(2));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lgw.toml");
        std::fs::write(&path, "label = [").unwrap();
        assert!(GatewayConfig::load(&path).is_err());
    }
}
