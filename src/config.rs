//! Saved command-line defaults.
//!
//! Config files hold the same flags the CLI accepts, one or more per line,
//! with `#` comments. A global file is merged with a local `.noteuirc`, then
//! the command line is merged over both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::styled::Color;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub images_dir: Option<PathBuf>,
    pub no_images: bool,
    pub preview: bool,
    pub preview_max_edge: Option<u32>,
    pub default_fg: Option<Color>,
    pub default_bg: Option<Color>,
    pub pretty: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: booleans accumulate, values from `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            images_dir: other
                .images_dir
                .clone()
                .or_else(|| self.images_dir.clone()),
            no_images: self.no_images || other.no_images,
            preview: self.preview || other.preview,
            preview_max_edge: other.preview_max_edge.or(self.preview_max_edge),
            default_fg: other.default_fg.or(self.default_fg),
            default_bg: other.default_bg.or(self.default_bg),
            pretty: self.pretty || other.pretty,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("noteui").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("noteui")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("noteui").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("noteui")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".noteuirc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    let flags = parse_flag_tokens(&tokens);
    tracing::debug!(path = %path.display(), ?flags, "loaded config");
    Ok(flags)
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# noteui defaults (saved with --save)".to_string()];
    if let Some(dir) = &flags.images_dir {
        lines.push(format!("--images-dir {}", dir.display()));
    }
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if flags.preview {
        lines.push("--preview".to_string());
    }
    if let Some(edge) = flags.preview_max_edge {
        lines.push(format!("--preview-max-edge {edge}"));
    }
    if let Some(color) = flags.default_fg {
        lines.push(format!("--default-fg {color}"));
    }
    if let Some(color) = flags.default_bg {
        lines.push(format!("--default-bg {color}"));
    }
    if flags.pretty {
        lines.push("--pretty".to_string());
    }
    if let Some(log) = &flags.debug_log {
        lines.push(format!("--debug-log {}", log.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the config flags out of a token list.
///
/// Accepts `--flag value` and `--flag=value`. Unknown tokens, including the
/// program name and edit operations, are ignored, as are values that fail to
/// parse.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        let takes_value = matches!(
            name,
            "--images-dir" | "--preview-max-edge" | "--default-fg" | "--default-bg" | "--debug-log"
        );
        let value = if takes_value && inline.is_none() {
            i += 1;
            tokens.get(i).map(String::as_str)
        } else {
            inline
        };

        match (name, value) {
            ("--no-images", None) => flags.no_images = true,
            ("--preview", None) => flags.preview = true,
            ("--pretty", None) => flags.pretty = true,
            ("--images-dir", Some(v)) => flags.images_dir = Some(PathBuf::from(v)),
            ("--preview-max-edge", Some(v)) => {
                flags.preview_max_edge = v.parse().ok().or(flags.preview_max_edge);
            }
            ("--default-fg", Some(v)) => flags.default_fg = v.parse().ok().or(flags.default_fg),
            ("--default-bg", Some(v)) => flags.default_bg = v.parse().ok().or(flags.default_bg),
            ("--debug-log", Some(v)) => flags.debug_log = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}
