use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::animation::DEFAULT_ANIMATION_PERIOD;
use crate::drawing::{
    CapacityPolicy, StoreCapacities, ToolKind, ToolState, DEFAULT_FREEHAND_CAPACITY,
    DEFAULT_SHAPE_CAPACITY, MAX_FREEHAND_THICKNESS, MIN_FREEHAND_THICKNESS,
};
use crate::geometry::{parse_hex_rgb, Color};
use crate::render::{GridFlags, GridStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "nxdraw";
const APP_CONFIG_FILE: &str = "config.json";
const DEFAULT_MESSAGE_LOG_LINES: usize = 500;

/// Application-level settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub freehand_capacity: Option<usize>,
    #[serde(default)]
    pub line_capacity: Option<usize>,
    #[serde(default)]
    pub rectangle_capacity: Option<usize>,
    #[serde(default)]
    pub oval_capacity: Option<usize>,
    #[serde(default)]
    pub enforce_capacity: Option<bool>,
    #[serde(default)]
    pub default_color: Option<String>,
    #[serde(default)]
    pub default_thickness: Option<i64>,
    #[serde(default)]
    pub default_tool: Option<String>,
    #[serde(default)]
    pub fine_grid_spacing: Option<u32>,
    #[serde(default)]
    pub coarse_grid_spacing: Option<u32>,
    #[serde(default)]
    pub fine_grid: Option<bool>,
    #[serde(default)]
    pub coarse_grid: Option<bool>,
    #[serde(default)]
    pub animation_period_ms: Option<u64>,
    #[serde(default)]
    pub message_log_lines: Option<usize>,
}

/// Typed startup state for a drawing session, resolved from [`AppConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub capacities: StoreCapacities,
    pub tools: ToolState,
    pub grid: GridFlags,
    pub grid_style: GridStyle,
    pub animation_period: Duration,
    pub message_log_lines: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capacities: StoreCapacities::default(),
            tools: ToolState::default(),
            grid: GridFlags::none(),
            grid_style: GridStyle::default(),
            animation_period: DEFAULT_ANIMATION_PERIOD,
            message_log_lines: DEFAULT_MESSAGE_LOG_LINES,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();

        let capacities = if config.enforce_capacity.unwrap_or(true) {
            let bounded = |value: Option<usize>, default: usize| {
                CapacityPolicy::bounded(value.unwrap_or(default))
            };
            StoreCapacities {
                freehand: bounded(config.freehand_capacity, DEFAULT_FREEHAND_CAPACITY),
                lines: bounded(config.line_capacity, DEFAULT_SHAPE_CAPACITY),
                rectangles: bounded(config.rectangle_capacity, DEFAULT_SHAPE_CAPACITY),
                ovals: bounded(config.oval_capacity, DEFAULT_SHAPE_CAPACITY),
            }
        } else {
            StoreCapacities::unbounded()
        };

        let tools = ToolState::with_defaults(
            resolve_tool(config.default_tool.as_deref()),
            resolve_color(config.default_color.as_deref()),
            resolve_thickness(config.default_thickness, defaults.tools.thickness()),
        );

        let grid = GridFlags {
            fine: config.fine_grid.unwrap_or(defaults.grid.fine),
            coarse: config.coarse_grid.unwrap_or(defaults.grid.coarse),
        };
        let grid_style = GridStyle {
            fine_spacing: resolve_spacing(
                "fine_grid_spacing",
                config.fine_grid_spacing,
                defaults.grid_style.fine_spacing,
            ),
            coarse_spacing: resolve_spacing(
                "coarse_grid_spacing",
                config.coarse_grid_spacing,
                defaults.grid_style.coarse_spacing,
            ),
            ..defaults.grid_style
        };

        let animation_period = match config.animation_period_ms {
            Some(0) => {
                tracing::warn!("animation_period_ms must be positive; using default");
                defaults.animation_period
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.animation_period,
        };

        Self {
            capacities,
            tools,
            grid,
            grid_style,
            animation_period,
            message_log_lines: config
                .message_log_lines
                .filter(|lines| *lines > 0)
                .unwrap_or(defaults.message_log_lines),
        }
    }
}

fn resolve_tool(value: Option<&str>) -> ToolKind {
    let Some(value) = value else {
        return ToolKind::default();
    };
    value.parse().unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring default_tool override");
        ToolKind::default()
    })
}

fn resolve_color(value: Option<&str>) -> Color {
    let Some(value) = value else {
        return Color::BLACK;
    };
    parse_hex_rgb(value).unwrap_or_else(|| {
        tracing::warn!(value, "default_color is not #rrggbb; using black");
        Color::BLACK
    })
}

fn resolve_thickness(value: Option<i64>, default: u8) -> u8 {
    let Some(value) = value else {
        return default;
    };
    let clamped = value.clamp(
        i64::from(MIN_FREEHAND_THICKNESS),
        i64::from(MAX_FREEHAND_THICKNESS),
    );
    if clamped != value {
        tracing::warn!(value, clamped, "default_thickness out of range; clamping");
    }
    u8::try_from(clamped).unwrap_or(default)
}

fn resolve_spacing(field: &'static str, value: Option<u32>, default: u32) -> u32 {
    match value {
        Some(0) => {
            tracing::warn!(field, "grid spacing must be positive; using default");
            default
        }
        Some(spacing) => spacing,
        None => default,
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

pub fn load_session_settings() -> SessionSettings {
    SessionSettings::from_config(&load_app_config())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_from(json: &str) -> SessionSettings {
        let config: AppConfig = serde_json::from_str(json).expect("config should parse");
        SessionSettings::from_config(&config)
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "nxdraw",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/nxdraw/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("nxdraw", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/nxdraw/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("nxdraw", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn empty_config_resolves_to_classic_defaults() {
        let settings = settings_from("{}");

        assert_eq!(settings, SessionSettings::default());
        assert_eq!(
            settings.capacities.freehand.limit(),
            Some(DEFAULT_FREEHAND_CAPACITY)
        );
        assert_eq!(settings.capacities.lines.limit(), Some(10));
        assert_eq!(settings.animation_period, Duration::from_millis(10));
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(
            r##"{
                "freehand_capacity": 500,
                "oval_capacity": 3,
                "default_color": "#ff0000",
                "default_thickness": 7,
                "default_tool": "freehand",
                "fine_grid": true,
                "coarse_grid_spacing": 25,
                "animation_period_ms": 40
            }"##,
        );

        assert_eq!(settings.capacities.freehand.limit(), Some(500));
        assert_eq!(settings.capacities.ovals.limit(), Some(3));
        assert_eq!(settings.capacities.lines.limit(), Some(10));
        assert_eq!(settings.tools.color(), Color::new(255, 0, 0));
        assert_eq!(settings.tools.thickness(), 7);
        assert_eq!(settings.tools.active_tool(), ToolKind::Freehand);
        assert!(settings.grid.fine);
        assert!(!settings.grid.coarse);
        assert_eq!(settings.grid_style.coarse_spacing, 25);
        assert_eq!(settings.animation_period, Duration::from_millis(40));
    }

    #[test]
    fn disabling_enforcement_makes_every_category_unbounded() {
        let settings = settings_from(r#"{ "enforce_capacity": false, "line_capacity": 2 }"#);
        assert_eq!(settings.capacities, StoreCapacities::unbounded());
    }

    #[test]
    fn invalid_values_fall_back_without_failing() {
        let settings = settings_from(
            r#"{
                "default_color": "blue",
                "default_thickness": 99,
                "default_tool": "spray",
                "fine_grid_spacing": 0,
                "animation_period_ms": 0
            }"#,
        );

        assert_eq!(settings.tools.color(), Color::BLACK);
        assert_eq!(settings.tools.thickness(), MAX_FREEHAND_THICKNESS);
        assert_eq!(settings.tools.active_tool(), ToolKind::Line);
        assert_eq!(settings.grid_style.fine_spacing, 10);
        assert_eq!(settings.animation_period, DEFAULT_ANIMATION_PERIOD);
    }

    #[test]
    fn config_file_is_read_from_xdg_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("nxdraw");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.json"), r#"{ "line_capacity": 4 }"#).unwrap();

        let config = load_app_config_with(Some(dir.path()), None);
        assert_eq!(config.line_capacity, Some(4));
    }

    #[test]
    fn unparsable_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("nxdraw");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.json"), "{ not json").unwrap();

        let config = load_app_config_with(Some(dir.path()), None);
        assert!(config.line_capacity.is_none());
        assert!(config.default_color.is_none());
    }
}
