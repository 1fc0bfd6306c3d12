use crate::layout::MAX_WIDTH;
use crate::render::WidgetOptions;
use anyhow::Context;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { scale: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub cache_max_age_secs: u64,
    pub profile_ttl_secs: u64,
    pub workers: usize,
    pub mock: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: None,
            cache_dir: PathBuf::from("cache"),
            cache_max_age_secs: 60 * 60,
            profile_ttl_secs: 10 * 60,
            workers: 4,
            mock: false,
        }
    }
}

impl ServeConfig {
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }
}

/// Per-color overrides applied on top of whichever theme a request resolves.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeVariables {
    pub font_family: Option<String>,
    pub background: Option<String>,
    pub window_border: Option<String>,
    pub header_background: Option<String>,
    pub top_bar: Option<String>,
    pub title_text: Option<String>,
    pub prompt_user: Option<String>,
    pub prompt_host: Option<String>,
    pub prompt_path: Option<String>,
    pub command_text: Option<String>,
    pub table_border: Option<String>,
    pub table_header: Option<String>,
    pub primary_text: Option<String>,
    pub label_text: Option<String>,
    pub section_title: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub danger: Option<String>,
    pub muted: Option<String>,
    pub team_badge: Option<String>,
    pub solo_badge: Option<String>,
    pub footer_text: Option<String>,
    pub footer_background: Option<String>,
    pub error_fill: Option<String>,
    pub coalition_default: Option<String>,
}

/// Values land in SVG attributes verbatim, so anything that could close one is refused.
fn usable(name: &str, value: &str) -> bool {
    let ok = !value.is_empty() && !value.contains(['"', '<', '>', '&']);
    if !ok {
        warn!(variable = name, value, "ignoring theme variable");
    }
    ok
}

macro_rules! apply_vars {
    ($vars:expr, $theme:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $vars.$field.as_deref() {
                if usable(stringify!($field), value) {
                    $theme.$field = value.to_string();
                }
            }
        )+
    };
}

impl ThemeVariables {
    pub fn apply(&self, theme: &mut Theme) {
        apply_vars!(self, theme;
            font_family, background, window_border, header_background, top_bar,
            title_text, prompt_user, prompt_host, prompt_path, command_text,
            table_border, table_header, primary_text, label_text, section_title,
            success, warning, danger, muted, team_badge, solo_badge,
            footer_text, footer_background, error_fill, coalition_default,
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub theme_name: String,
    pub theme_variables: ThemeVariables,
    pub widget: WidgetOptions,
    pub render: RenderConfig,
    pub serve: ServeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme_name: "dark".to_string(),
            theme_variables: ThemeVariables::default(),
            widget: WidgetOptions::default(),
            render: RenderConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl Config {
    /// Resolves `name` (or the configured default) and applies the overrides.
    pub fn theme(&self, name: Option<&str>) -> Theme {
        let mut theme = Theme::resolve(name.unwrap_or(&self.theme_name));
        self.theme_variables.apply(&mut theme);
        theme
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WidgetConfigFile {
    width: Option<u32>,
    max_skills: Option<usize>,
    max_projects: Option<usize>,
    include_piscine: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    widget: Option<WidgetConfigFile>,
    render: Option<RenderConfigFile>,
    serve: Option<ServeConfig>,
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme {
        if theme_name != "dark" && theme_name != "light" {
            warn!(theme = %theme_name, "unknown theme, using dark");
        }
        config.theme_name = theme_name;
    }
    if let Some(vars) = parsed.theme_variables {
        config.theme_variables = vars;
    }
    if let Some(widget) = parsed.widget {
        if let Some(v) = widget.width.filter(|&v| v > 0 && v <= MAX_WIDTH) {
            config.widget.width = v;
        }
        if let Some(v) = widget.max_skills.filter(|&v| v > 0) {
            config.widget.max_skills = v;
        }
        if let Some(v) = widget.max_projects.filter(|&v| v > 0) {
            config.widget.max_projects = v;
        }
        if let Some(v) = widget.include_piscine {
            config.widget.include_piscine = v;
        }
    }
    if let Some(v) = parsed.render.and_then(|render| render.scale) {
        if v.is_finite() && v > 0.0 {
            config.render.scale = v;
        }
    }
    if let Some(serve) = parsed.serve {
        config.serve = serve;
    }
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.cache_max_age(), Duration::from_secs(3600));
        assert_eq!(config.theme(None), Theme::dark());
    }

    #[test]
    fn json5_file_overrides_defaults() {
        let config = parse_config(
            r##"{
                // comments and trailing commas are fine
                theme: "light",
                themeVariables: { success: "#00FF00", danger: "red\" onload=\"x" },
                widget: { width: 640, maxSkills: 0, includePiscine: true },
                render: { scale: 1.5 },
                serve: { port: 8080, mock: true, cacheDir: "/tmp/ftw" },
            }"##,
        )
        .unwrap();
        assert_eq!(config.widget.width, 640);
        assert_eq!(config.widget.max_skills, 100);
        assert!(config.widget.include_piscine);
        assert_eq!(config.render.scale, 1.5);
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.host, "127.0.0.1");
        assert!(config.serve.mock);

        let theme = config.theme(None);
        assert_eq!(theme.name, "light");
        assert_eq!(theme.success, "#00FF00");
        assert_eq!(theme.danger, Theme::light().danger);
        assert_eq!(config.theme(Some("dark")).success, "#00FF00");
        assert_eq!(parse_config("{ widget: { width: 9000 } }").unwrap().widget.width, 800);
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json5");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json5"));

        let broken = dir.path().join("broken.json5");
        std::fs::write(&broken, "{ theme: ").unwrap();
        let err = load_config(Some(&broken)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json5"));
    }
}
