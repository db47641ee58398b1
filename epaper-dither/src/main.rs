use std::path::PathBuf;

use clap::Parser;
use epaper_dither::config::Config;
use epaper_dither::pipeline::{self, Settings};
use tracing_subscriber::{EnvFilter, fmt};

/// Dither an image onto the 7-color e-paper palette and print it as a packed byte array.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Image to convert
    input: PathBuf,
    /// Config file (defaults to ./epaper-dither.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Display width in pixels
    #[arg(long)]
    width: Option<u32>,
    /// Display height in pixels
    #[arg(long)]
    height: Option<u32>,
    /// Center the image on a full display canvas before packing; `--pad false` overrides a
    /// config that enables it
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pad: Option<bool>,
    /// Save the packed image as PNG
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Write the array to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Array elements per output line
    #[arg(long)]
    line_width: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Load config first so we can honor logging.filter directive.
    let cfg = Config::load(cli.config.as_deref())?;
    let filter_directive = cfg
        .log_filter()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info,epaper_dither=debug".to_string());
    fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.into_settings(cfg)?;
    pipeline::run(&settings)?;
    Ok(())
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    fn into_settings(self, mut cfg: Config) -> anyhow::Result<Settings> {
        if let Some(w) = self.width {
            cfg.display.width = w;
        }
        if let Some(h) = self.height {
            cfg.display.height = h;
        }
        if let Some(pad) = self.pad {
            cfg.output.pad_to_display = pad;
        }
        if self.preview.is_some() {
            cfg.output.preview = self.preview;
        }
        if self.output.is_some() {
            cfg.output.path = self.output;
        }
        if self.line_width.is_some() {
            cfg.output.line_width = self.line_width;
        }
        cfg.validate()?;
        Ok(Settings::from_config(self.input, &cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_config() -> Config {
        Config::parse("[output]\npad_to_display = true\n").unwrap()
    }

    #[test]
    fn pad_flag_can_disable_config_padding() {
        let cli = Cli::try_parse_from(["epaper-dither", "in.png", "--pad", "false"]).unwrap();
        assert!(!cli.into_settings(padded_config()).unwrap().pad_to_display);
    }

    #[test]
    fn bare_pad_flag_enables_padding() {
        let cli = Cli::try_parse_from(["epaper-dither", "in.png", "--pad"]).unwrap();
        assert!(cli.into_settings(Config::default()).unwrap().pad_to_display);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["epaper-dither", "in.png"]).unwrap();
        let settings = cli.into_settings(padded_config()).unwrap();
        assert!(settings.pad_to_display);
        assert_eq!(settings.display, Config::default().display);
        assert_eq!(settings.input, PathBuf::from("in.png"));
    }

    #[test]
    fn dimension_overrides_are_validated() {
        let cli = Cli::try_parse_from(["epaper-dither", "in.png", "--width", "0"]).unwrap();
        assert!(cli.into_settings(Config::default()).is_err());
    }
}
