//! Kaishu CLI — outline stroke skeletons and output SVG glyphs.

use std::fs;
use std::path::Path;
use std::process;

use clap::Parser;

use kaishu_core::{load_char, outline_char, DataFile, Metrics};
use kaishu_svg::{render_with_options, RenderOptions};

#[derive(Parser)]
#[command(version, about = "Kaishu \u{2014} skeleton-to-outline glyph generator")]
struct Cli {
    /// Skeleton data file (JSON, one record per character)
    data_file: String,

    /// Only generate these characters (repeatable); default is all
    #[arg(short = 'c', long = "char", value_name = "CHAR")]
    chars: Vec<String>,

    /// Output directory for SVG files
    #[arg(short, long, default_value = ".")]
    output: String,

    /// Em size in font units
    #[arg(long, default_value_t = 1024.0)]
    font_size: f64,

    /// Brush width in font units
    #[arg(long, default_value_t = 32.0)]
    stroke_width: f64,

    /// Decimal places for SVG coordinates
    #[arg(long, default_value_t = 2)]
    precision: usize,
}

fn main() {
    let cli = Cli::parse();
    let data = read_data(&cli.data_file);

    let metrics = Metrics {
        font_size: cli.font_size,
        stroke_width: cli.stroke_width,
        ..Metrics::default()
    };
    let opts = RenderOptions {
        precision: cli.precision,
        ..RenderOptions::default()
    };

    let mut names: Vec<&str> = if cli.chars.is_empty() {
        data.keys().map(String::as_str).collect()
    } else {
        cli.chars.iter().map(String::as_str).collect()
    };
    names.sort_unstable();

    if let Err(e) = fs::create_dir_all(&cli.output) {
        eprintln!("Error creating output directory {}: {e}", cli.output);
        process::exit(1);
    }

    let mut written = 0usize;
    let mut failed = 0usize;
    for name in names {
        let Some(record) = data.get(name) else {
            eprintln!("Error: no record for \"{name}\" in {}", cli.data_file);
            failed += 1;
            continue;
        };
        match generate(record, &metrics, &opts) {
            Ok(svg_str) => {
                if write_svg(&cli.output, name, &svg_str) {
                    written += 1;
                } else {
                    failed += 1;
                }
            }
            Err(e) => {
                eprintln!("Error outlining \"{name}\": {e}");
                failed += 1;
            }
        }
    }

    eprintln!("Wrote {written} glyph(s), {failed} failed");
    if failed > 0 {
        process::exit(1);
    }
}

fn read_data(path: &str) -> DataFile {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error parsing {path}: {e}");
            process::exit(1);
        }
    }
}

/// Outline one character and render it to an SVG string.
fn generate(
    record: &kaishu_core::CharRecord,
    metrics: &Metrics,
    opts: &RenderOptions,
) -> Result<String, kaishu_core::ContourError> {
    let skeleton = load_char(record, metrics.font_size)?;
    let outlines = outline_char(&skeleton, metrics)?;
    Ok(render_with_options(&outlines, metrics, opts).to_string())
}

fn write_svg(output_dir: &str, name: &str, content: &str) -> bool {
    let path = Path::new(output_dir).join(format!("{name}.svg"));
    match fs::write(&path, content) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Error writing {}: {e}", path.display());
            false
        }
    }
}
