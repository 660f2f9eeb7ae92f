use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings consulted while turning documents into pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Origin that relative links resolve against and that counts as
    /// same-origin for link interception.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Appended to every page title.
    #[serde(default = "default_title_postfix")]
    pub title_postfix: String,
    #[serde(default = "default_closed_tickets_path")]
    pub closed_tickets_path: String,
    /// Push navigations onto history. When off, pages render in place and
    /// back/forward fall through to full reloads.
    #[serde(default = "default_true")]
    pub history: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            title_postfix: default_title_postfix(),
            closed_tickets_path: default_closed_tickets_path(),
            history: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.tickview/config.toml` under `project_root`, or defaults when absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".tickview/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/tickview/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("tickview/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_base_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_title_postfix() -> String {
    " [tickview]".to_string()
}

fn default_closed_tickets_path() -> String {
    "/closed_tickets".to_string()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_temp_dir(label: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "tickview-config-test-{label}-{}-{id}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir must be created");
        dir
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = make_temp_dir("project-default");
        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg.view.title_postfix, " [tickview]");
        assert_eq!(cfg.view.closed_tickets_path, "/closed_tickets");
        assert!(cfg.view.history);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn partial_view_table_keeps_other_defaults() {
        let root = make_temp_dir("project-partial");
        std::fs::create_dir_all(root.join(".tickview")).expect("create .tickview");
        std::fs::write(
            root.join(".tickview/config.toml"),
            "[view]\nbase_url = \"https://tracker.example.org/\"\nhistory = false\n",
        )
        .expect("write config");

        let cfg = load_project_config(&root).expect("load should succeed");
        assert_eq!(cfg.view.base_url, "https://tracker.example.org/");
        assert!(!cfg.view.history);
        assert_eq!(cfg.view.title_postfix, " [tickview]");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn parse_error_names_the_file() {
        let root = make_temp_dir("project-broken");
        std::fs::create_dir_all(root.join(".tickview")).expect("create .tickview");
        std::fs::write(root.join(".tickview/config.toml"), "[view\n").expect("write config");

        let err = load_project_config(&root).expect_err("broken toml must fail");
        assert!(format!("{err}").contains("config.toml"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
        let empty: UserConfig = toml::from_str("").expect("parse");
        assert_eq!(empty.output, None);
    }
}
