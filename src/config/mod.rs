use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .jamsdeskrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn rscript_path(&self) -> PathBuf {
        PathBuf::from(self.get("RSCRIPT_PATH").unwrap())
    }

    pub fn routine_dir(&self) -> PathBuf {
        PathBuf::from(self.get("ROUTINE_DIR").unwrap())
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.get("OUTPUT_PATH").unwrap())
    }

    /// Wall-clock limit for one interpreter run; RUN_TIMEOUT=0 disables it.
    pub fn run_timeout(&self) -> Option<Duration> {
        let secs = self
            .get("RUN_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    pub fn keep_run_scripts(&self) -> bool {
        self.get_bool("KEEP_RUN_SCRIPTS")
    }

    pub fn skip_smoke_test(&self) -> bool {
        self.get_bool("SKIP_SMOKE_TEST")
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or JAMSDESK_* for forward-compat
    const KEYS: &[&str] = &[
        "RSCRIPT_PATH",
        "ROUTINE_DIR",
        "OUTPUT_PATH",
        "RUN_TIMEOUT",
        "KEEP_RUN_SCRIPTS",
        "SKIP_SMOKE_TEST",
    ];

    KEYS.contains(&k) || k.starts_with("JAMSDESK_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("jamsdesk").join(".jamsdeskrc")
}

fn default_rscript() -> &'static str {
    if cfg!(windows) {
        "Rscript"
    } else {
        "/usr/local/bin/Rscript"
    }
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    // Paths
    let data = BaseDirs::new()
        .map(|b| b.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share"));
    let jamsdesk_dir = data.join("jamsdesk");

    m.insert(
        "OUTPUT_PATH".into(),
        jamsdesk_dir.join("assets").to_string_lossy().into_owned(),
    );
    m.insert(
        "ROUTINE_DIR".into(),
        jamsdesk_dir.join("R").to_string_lossy().into_owned(),
    );
    m.insert("RSCRIPT_PATH".into(), default_rscript().into());

    // Numbers
    m.insert("RUN_TIMEOUT".into(), "600".into());

    // Bools as strings
    m.insert("KEEP_RUN_SCRIPTS".into(), "false".into());
    m.insert("SKIP_SMOKE_TEST".into(), "false".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(inner: HashMap<String, String>) -> Config {
        Config { inner, config_path: PathBuf::new() }
    }

    #[test]
    fn defaults_are_complete() {
        let m = default_map();
        for key in ["RSCRIPT_PATH", "ROUTINE_DIR", "OUTPUT_PATH", "RUN_TIMEOUT"] {
            assert!(m.contains_key(key), "missing default for {}", key);
        }
    }

    #[test]
    fn timeout_zero_disables() {
        let mut inner = default_map();
        inner.insert("RUN_TIMEOUT".into(), "0".into());
        assert_eq!(bare(inner).run_timeout(), None);
    }

    #[test]
    fn timeout_default_is_ten_minutes() {
        assert_eq!(bare(default_map()).run_timeout(), Some(Duration::from_secs(600)));
    }
}
