//! noteui - inspect and edit rich-text notes from the command line.
//!
//! # Usage
//!
//! ```bash
//! noteui note.json --summary
//! noteui note.json --bold 0..5 --fg 6..11=#FFFF0000 -o out.json
//! noteui note.json --insert-image 3..3=file:///tmp/cat.png --pretty
//! ```

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::EnvFilter;

use noteui::codec::{DecodedNote, decode_with_images, encode, encode_pretty};
use noteui::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use noteui::image::{DisplayTarget, FileImageLoader, ImageLoader, RejectAllImages};
use noteui::styled::{
    Alignment, Color, EditError, PlainLineLayout, SpanCategory, StyledText, Toggle,
};

/// Inspect and edit rich-text notes
#[derive(Parser, Debug)]
#[command(name = "noteui", version, about, long_about = None)]
struct Cli {
    /// Note file (JSON)
    #[arg(value_name = "NOTE")]
    note: PathBuf,

    /// Toggle bold over a range
    #[arg(long, value_name = "S..E")]
    bold: Vec<RangeArg>,

    /// Toggle italic over a range
    #[arg(long, value_name = "S..E")]
    italic: Vec<RangeArg>,

    /// Toggle underline over a range
    #[arg(long, value_name = "S..E")]
    underline: Vec<RangeArg>,

    /// Set the text color of a range (no color resets it)
    #[arg(long, value_name = "S..E[=COLOR]")]
    fg: Vec<RangeArg>,

    /// Set the highlight color of a range (no color resets it)
    #[arg(long, value_name = "S..E[=COLOR]")]
    bg: Vec<RangeArg>,

    /// Align the lines touched by a range: start, center or end
    #[arg(long, value_name = "S..E=ALIGN")]
    align: Vec<RangeArg>,

    /// Replace a range with an inline image
    #[arg(long, value_name = "S..E=URI")]
    insert_image: Vec<RangeArg>,

    /// Directory relative image paths are resolved against
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Do not open images (image spans are dropped on decode)
    #[arg(long)]
    no_images: bool,

    /// Report image sizes as shown in the list preview
    #[arg(long)]
    preview: bool,

    /// Bounding edge for preview images, in pixels
    #[arg(long, value_name = "N")]
    preview_max_edge: Option<u32>,

    /// Color used by --fg when none is given
    #[arg(long, value_name = "COLOR")]
    default_fg: Option<Color>,

    /// Color used by --bg when none is given
    #[arg(long, value_name = "COLOR")]
    default_bg: Option<Color>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print span counts and image bounds instead of JSON
    #[arg(long)]
    summary: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write detailed decode/edit debug events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

static RANGE_ARG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*\.\.\s*(\d+)\s*(?:=(.*))?$").expect("range argument pattern")
});

/// `S..E` with an optional `=VALUE` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeArg {
    start: usize,
    end: usize,
    value: Option<String>,
}

impl FromStr for RangeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RANGE_ARG
            .captures(s)
            .ok_or_else(|| format!("expected S..E or S..E=VALUE, got {s:?}"))?;
        let offset = |i: usize| {
            caps[i]
                .parse::<usize>()
                .map_err(|err| format!("bad offset {:?}: {err}", &caps[i]))
        };
        Ok(Self {
            start: offset(1)?,
            end: offset(2)?,
            value: caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

impl fmt::Display for RangeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)?;
        if let Some(value) = &self.value {
            write!(f, "={value}")?;
        }
        Ok(())
    }
}

impl RangeArg {
    fn no_value(&self, flag: &str) -> Result<()> {
        if self.value.is_some() {
            bail!("--{flag} takes a bare range, got {self}");
        }
        Ok(())
    }

    fn required_value(&self, flag: &str) -> Result<&str> {
        self.value
            .as_deref()
            .with_context(|| format!("--{flag} needs a value: {self}"))
    }

    fn color_or(&self, fallback: Option<Color>) -> Result<Option<Color>> {
        match &self.value {
            Some(value) => Ok(Some(value.parse()?)),
            None => Ok(fallback),
        }
    }
}

fn init_tracing(debug_log: Option<&Path>) -> Result<()> {
    let Some(path) = debug_log else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
            )
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create debug log {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Apply the requested edits in a fixed order: inserts, colors, alignment,
/// then bold, italic and underline toggles.
fn apply_edits(styled: &mut StyledText, cli: &Cli, flags: &ConfigFlags) -> Result<()> {
    for arg in &cli.insert_image {
        let uri = arg.required_value("insert-image")?;
        styled
            .insert_image(arg.start, arg.end, uri)
            .with_context(|| format!("--insert-image {arg}"))?;
    }
    for arg in &cli.fg {
        let color = arg.color_or(flags.default_fg)?;
        styled
            .set_foreground_color(arg.start, arg.end, color)
            .with_context(|| format!("--fg {arg}"))?;
    }
    for arg in &cli.bg {
        let color = arg.color_or(flags.default_bg)?;
        styled
            .set_background_color(arg.start, arg.end, color)
            .with_context(|| format!("--bg {arg}"))?;
    }
    if !cli.align.is_empty() {
        let layout = PlainLineLayout::for_text(styled);
        for arg in &cli.align {
            let alignment = arg
                .required_value("align")?
                .parse::<Alignment>()
                .map_err(anyhow::Error::msg)?;
            let applied = styled
                .set_alignment(arg.start, arg.end, alignment, &layout)
                .with_context(|| format!("--align {arg}"))?;
            if !applied {
                tracing::warn!(range = %arg, "alignment range did not resolve to any line");
            }
        }
    }
    for (flag, args, toggle) in [
        ("bold", &cli.bold, StyledText::toggle_bold as ToggleFn),
        ("italic", &cli.italic, StyledText::toggle_italic as ToggleFn),
        ("underline", &cli.underline, StyledText::toggle_underline as ToggleFn),
    ] {
        for arg in args {
            arg.no_value(flag)?;
            let outcome =
                toggle(styled, arg.start, arg.end).with_context(|| format!("--{flag} {arg}"))?;
            tracing::debug!(flag, range = %arg, ?outcome, "toggled");
        }
    }
    Ok(())
}

type ToggleFn = fn(&mut StyledText, usize, usize) -> Result<Toggle, EditError>;

fn summary(note: &DecodedNote) -> String {
    let styled = &note.text;
    let layout = PlainLineLayout::for_text(styled);
    let mut out = format!(
        "text: {} UTF-16 units, {} lines\n",
        styled.len_utf16(),
        layout.line_count()
    );
    for category in SpanCategory::ALL {
        let count = styled.count_of(category);
        if count > 0 {
            out.push_str(&format!("{}: {count}\n", category.name()));
        }
    }
    for image in &note.images {
        let (width, height) = image.bounds;
        out.push_str(&format!(
            "image @{} {} {}x{} -> {width}x{height}\n",
            image.start, image.source, image.handle.width, image.handle.height
        ));
    }
    out
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_tracing(effective.debug_log.as_deref())?;

    if !cli.note.exists() {
        bail!("File not found: {}", cli.note.display());
    }
    let json = std::fs::read_to_string(&cli.note)
        .with_context(|| format!("Failed to read {}", cli.note.display()))?;

    let loader: Box<dyn ImageLoader> = if effective.no_images {
        Box::new(RejectAllImages)
    } else {
        let base = effective.images_dir.clone().unwrap_or_else(|| {
            cli.note
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
        Box::new(FileImageLoader::new(base))
    };
    let target = if effective.preview {
        DisplayTarget::Preview {
            max_edge: effective
                .preview_max_edge
                .unwrap_or(DisplayTarget::PREVIEW_MAX_EDGE),
        }
    } else {
        DisplayTarget::Editor
    };

    let mut note = decode_with_images(&json, loader.as_ref(), target)
        .with_context(|| format!("Failed to decode {}", cli.note.display()))?;
    apply_edits(&mut note.text, &cli, &effective)?;

    let output = if cli.summary {
        // re-resolve so inserted images are reported too
        let edited = decode_with_images(&encode(&note.text), loader.as_ref(), target)
            .context("Failed to re-read edited note")?;
        summary(&edited)
    } else if effective.pretty {
        format!("{}\n", encode_pretty(&note.text))
    } else {
        format!("{}\n", encode(&note.text))
    };

    match &cli.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .context("Failed to write output")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use noteui::styled::{Span, SpanKind};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("noteui").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_range_arg_parses_bare_range() {
        let arg: RangeArg = "2..7".parse().unwrap();
        assert_eq!(
            arg,
            RangeArg {
                start: 2,
                end: 7,
                value: None
            }
        );
    }

    #[test]
    fn test_range_arg_parses_value() {
        let arg: RangeArg = "0..4=#FFFF0000".parse().unwrap();
        assert_eq!(arg.value.as_deref(), Some("#FFFF0000"));
        let arg: RangeArg = "3..3=file:///tmp/a=b.png".parse().unwrap();
        assert_eq!(arg.value.as_deref(), Some("file:///tmp/a=b.png"));
        assert_eq!(arg.to_string(), "3..3=file:///tmp/a=b.png");
    }

    #[test]
    fn test_range_arg_rejects_garbage() {
        assert!("2-7".parse::<RangeArg>().is_err());
        assert!("..7".parse::<RangeArg>().is_err());
        assert!("-1..2".parse::<RangeArg>().is_err());
    }

    #[test]
    fn test_apply_edits_runs_inserts_before_styles() {
        let mut styled = StyledText::from_plain_text("AB");
        let cli = cli(&[
            "note.json",
            "--fg",
            "1..2=#FF00FF00",
            "--bold",
            "0..3",
            "--insert-image",
            "1..1=file:///x.png",
        ]);
        apply_edits(&mut styled, &cli, &ConfigFlags::default()).unwrap();
        assert_eq!(styled.len_utf16(), 3);
        assert_eq!(
            styled.spans_of(SpanCategory::Foreground).collect::<Vec<_>>(),
            vec![&Span::new(1, 2, SpanKind::Foreground(Color(0xFF00_FF00)))]
        );
        assert_eq!(styled.count_of(SpanCategory::Image), 1);
        assert_eq!(styled.count_of(SpanCategory::Bold), 1);
    }

    #[test]
    fn test_apply_edits_uses_default_colors() {
        let mut styled = StyledText::from_plain_text("hello");
        let cli = cli(&["note.json", "--bg", "0..5"]);
        let flags = ConfigFlags {
            default_bg: Some(Color::BLACK),
            ..ConfigFlags::default()
        };
        apply_edits(&mut styled, &cli, &flags).unwrap();
        assert_eq!(
            styled.spans(),
            &[Span::new(0, 5, SpanKind::Background(Color::BLACK))]
        );
    }

    #[test]
    fn test_apply_edits_rejects_value_on_toggle() {
        let mut styled = StyledText::from_plain_text("hello");
        let cli = cli(&["note.json", "--italic", "0..2=yes"]);
        assert!(apply_edits(&mut styled, &cli, &ConfigFlags::default()).is_err());
    }

    #[test]
    fn test_apply_edits_reports_out_of_bounds() {
        let mut styled = StyledText::from_plain_text("hi");
        let cli = cli(&["note.json", "--underline", "0..9"]);
        let err = apply_edits(&mut styled, &cli, &ConfigFlags::default()).unwrap_err();
        assert!(err.to_string().contains("--underline 0..9"));
    }

    #[test]
    fn test_apply_edits_aligns_whole_line() {
        let mut styled = StyledText::from_plain_text("one\ntwo");
        let cli = cli(&["note.json", "--align", "5..6=center"]);
        apply_edits(&mut styled, &cli, &ConfigFlags::default()).unwrap();
        assert_eq!(
            styled.spans(),
            &[Span::new(4, 7, SpanKind::Alignment(Alignment::Center))]
        );
    }
}
