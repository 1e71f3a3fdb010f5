use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use orgmark::{HtmlRenderer, Options, Renderer, TextRenderer};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Html,
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "orgmark")]
#[command(about = "Convert Org outline markup to HTML", long_about = None)]
struct Args {
    /// Input file, stdin when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// TOML file with default options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Shift heading levels by this amount
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<i32>,

    /// Never emit a table of contents
    #[arg(long)]
    no_toc: bool,

    /// Pass literal text through without HTML escaping
    #[arg(long)]
    no_escape: bool,

    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Highlight source blocks
    #[cfg(feature = "highlight")]
    #[arg(long)]
    highlight: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(offset) = args.offset {
        options.offset = offset;
    }
    if args.no_toc {
        options.toc = false;
    }
    if args.no_escape {
        options.escape = false;
    }
    #[cfg(feature = "highlight")]
    if args.highlight {
        options.highlight = Some(orgmark::highlight::syntect);
    }

    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            input
        }
    };

    let document = orgmark::parse(&input, options.escape);
    let output = match args.format {
        Format::Html => HtmlRenderer::new(options).render(&document),
        Format::Text => TextRenderer::new().render(&document),
        Format::Json => serde_json::to_string_pretty(&document)?,
    };
    println!("{output}");
    Ok(())
}
