use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, info, trace, warn};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

const RC_ENV: &str = "TASKFLOWRC";
const RC_FILE_NAME: &str = ".taskflowrc";

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("api.base_url".to_string(), DEFAULT_API_BASE_URL.to_string());
        map.insert("data.location".to_string(), "~/.taskflow".to_string());
        map.insert("color".to_string(), "on".to_string());
        map.insert("confirm".to_string(), "on".to_string());
        Self {
            map,
            loaded_file: None,
        }
    }
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();

        match resolve_rc_path(rc_override)? {
            Some(path) => {
                info!(rc = %path.display(), "loading taskflowrc");
                let path = expand_tilde(&path);
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                cfg.parse_into(&path, &text)?;
                cfg.loaded_file = Some(path);
            }
            None => debug!("no taskflowrc found; using defaults"),
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> anyhow::Result<Option<bool>> {
        self.map.get(key).map(|v| parse_bool(key, v)).transpose()
    }

    pub fn api_base_url(&self) -> String {
        self.get("api.base_url")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// `api.timeout` in seconds; unset or `0` means requests may wait forever.
    pub fn api_timeout(&self) -> anyhow::Result<Option<Duration>> {
        let Some(raw) = self.get("api.timeout") else {
            return Ok(None);
        };
        let secs: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid api.timeout value: {raw}"))?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }

    pub fn color(&self) -> anyhow::Result<bool> {
        Ok(self.get_bool("color")?.unwrap_or(true))
    }

    pub fn confirm_deletes(&self) -> anyhow::Result<bool> {
        Ok(self.get_bool("confirm")?.unwrap_or(true))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.map.iter()
    }

    fn parse_into(&mut self, path: &Path, text: &str) -> anyhow::Result<()> {
        for (line_num, raw_line) in text.lines().enumerate() {
            let line = raw_line
                .split_once('#')
                .map(|(before, _)| before)
                .unwrap_or(raw_line)
                .trim();
            if line.is_empty() {
                continue;
            }

            let (k, v) = line.split_once('=').ok_or_else(|| {
                anyhow!(
                    "invalid config line {}:{}: {}",
                    path.display(),
                    line_num + 1,
                    raw_line
                )
            })?;

            let key = k.trim().to_string();
            if key.is_empty() {
                return Err(anyhow!(
                    "empty config key at {}:{}",
                    path.display(),
                    line_num + 1
                ));
            }
            let value = v.trim().to_string();
            trace!(key = %key, value = %value, "loaded config key");
            self.map.insert(key, value);
        }

        Ok(())
    }
}

#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(cfg_value) = cfg.get("data.location") {
        expand_tilde(Path::new(&cfg_value))
    } else {
        default_data_dir()?
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn resolve_rc_path(override_path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = override_path {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(rc_env) = std::env::var(RC_ENV) {
        if rc_env == "/dev/null" {
            return Ok(None);
        }
        return Ok(Some(PathBuf::from(rc_env)));
    }

    let Some(home) = dirs::home_dir() else {
        warn!("cannot determine home directory; skipping taskflowrc lookup");
        return Ok(None);
    };
    let candidate = home.join(RC_FILE_NAME);
    Ok(candidate.exists().then_some(candidate))
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".taskflow"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn parse_bool(key: &str, s: &str) -> anyhow::Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" => Ok(false),
        other => Err(anyhow!("invalid boolean for {key}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::{Config, DEFAULT_API_BASE_URL};

    fn rc_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp rc");
        file.write_all(contents.as_bytes()).expect("write rc");
        file
    }

    #[test]
    fn defaults_apply_without_rc_file() {
        let cfg = Config::default();
        assert_eq!(cfg.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(cfg.api_timeout().expect("timeout"), None);
        assert!(cfg.color().expect("color"));
        assert!(cfg.confirm_deletes().expect("confirm"));
    }

    #[test]
    fn rc_file_values_and_comments() {
        let file = rc_file(
            "# backend\napi.base_url = https://tasks.example.com/api/ # prod\n\napi.timeout=15\ncolor=off\n",
        );
        let cfg = Config::load(Some(file.path())).expect("load rc");
        assert_eq!(cfg.api_base_url(), "https://tasks.example.com/api");
        assert_eq!(cfg.api_timeout().expect("timeout"), Some(Duration::from_secs(15)));
        assert!(!cfg.color().expect("color"));
        assert_eq!(cfg.loaded_file.as_deref(), Some(file.path()));
    }

    #[test]
    fn malformed_line_names_file_and_line() {
        let file = rc_file("color=on\nnot a pair\n");
        let err = Config::load(Some(file.path())).expect_err("should fail");
        assert!(format!("{err:#}").contains(":2:"));
    }

    #[test]
    fn overrides_strip_rc_prefix() {
        let mut cfg = Config::default();
        cfg.apply_overrides([
            ("rc.confirm".to_string(), "off".to_string()),
            ("api.timeout".to_string(), "0".to_string()),
        ]);
        assert!(!cfg.confirm_deletes().expect("confirm"));
        assert_eq!(cfg.api_timeout().expect("timeout"), None);
    }

    #[test]
    fn invalid_boolean_is_reported() {
        let mut cfg = Config::default();
        cfg.apply_overrides([("color".to_string(), "sometimes".to_string())]);
        assert!(cfg.color().is_err());
    }
}
