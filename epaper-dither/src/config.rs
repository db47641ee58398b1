use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;

use crate::palette::{EPAPER_7_COLOR, Rgb};

/// Default on-disk config filename
pub const DEFAULT_CONFIG_PATH: &str = "epaper-dither.toml";

pub const DEFAULT_DISPLAY_WIDTH: u32 = 230;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 230;

/// Strongly typed representation of the configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub output: Output,
    pub logging: Option<Logging>,
}

/// Native panel resolution. Input images are shrunk to fit inside it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Display {
    pub width: u32,
    pub height: u32,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Output {
    /// Center the dithered image on a full display canvas before packing.
    #[serde(default)]
    pub pad_to_display: bool,
    /// Fill color for the centering margin; white when unset.
    pub margin_color: Option<Rgb>,
    /// Array elements per line in the rendered output.
    pub line_width: Option<usize>,
    /// Write the packed image as PNG here.
    pub preview: Option<PathBuf>,
    /// Write the array text here instead of stdout.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    pub filter: Option<String>,
}

impl Config {
    /// Load config from `path`, or from [`DEFAULT_CONFIG_PATH`] when `None`.
    ///
    /// An explicitly given path must exist. A missing default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !path.exists() {
            if explicit {
                bail!("config file {} not found", path.display());
            }
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = text.parse::<DocumentMut>()?;
        let cfg: Config = toml_edit::de::from_document(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            bail!(
                "display dimensions must be non-zero, got {}x{}",
                self.display.width,
                self.display.height
            );
        }
        // the margin is packed along with the image, so it has to be a panel color
        if let Some(c) = self.output.margin_color
            && !EPAPER_7_COLOR.contains(&c)
        {
            bail!("margin_color {c:?} is not a panel palette color");
        }
        Ok(())
    }

    pub fn log_filter(&self) -> Option<String> {
        self.logging.as_ref().and_then(|l| l.filter.clone())
    }
}
