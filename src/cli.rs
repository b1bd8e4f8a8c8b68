use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use crate::config::load_config;
use crate::diagram::{DiagramOptions, build_diagram};
use crate::layout::LayoutStrategy;
use crate::schema::parse_schema;
use crate::serializer::to_json;
use crate::svg::SvgRenderer;

#[derive(Parser, Debug)]
#[command(name = "erdlayout", version, about = "Lay out and render ER diagrams from a JSON schema dump")]
pub struct Args {
    /// Schema JSON file, or '-' for stdin
    #[arg(required_unless_present = "list_layouts")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout strategy (grid, top-down, left-right, orthogonal, organic,
    /// circular, star, relationship-paths, smart-organic)
    #[arg(short = 'l', long = "layout", default_value = "grid")]
    pub layout: String,

    /// Draw table headers only
    #[arg(long = "hide-columns")]
    pub hide_columns: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "svg")]
    pub format: OutputFormat,

    /// Config JSON file with metric and layout overrides
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Seed for the organic layouts
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Only draw these tables
    #[arg(long = "only", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Print the available layout strategies and exit
    #[arg(long = "list-layouts")]
    pub list_layouts: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Json,
}

pub fn run() -> Result<()> {
    execute(Args::parse())
}

pub fn execute(args: Args) -> Result<()> {
    if args.list_layouts {
        print!("{}", strategy_table());
        return Ok(());
    }

    let Some(input_path) = args.input.as_deref() else {
        bail!("no input file given");
    };
    let config = load_config(args.config.as_deref())?;
    let input = read_input(input_path)?;
    let schema =
        parse_schema(&input).with_context(|| format!("failed to load {}", input_path.display()))?;

    let options = DiagramOptions {
        strategy: LayoutStrategy::from_name(&args.layout),
        show_detail: !args.hide_columns,
        visible: (!args.only.is_empty()).then(|| args.only.iter().cloned().collect::<HashSet<_>>()),
        seed: args.seed,
    };
    let diagram = build_diagram(&schema, &options, &config);

    let rendered = match args.format {
        OutputFormat::Svg => SvgRenderer::new(&config).render(&diagram),
        OutputFormat::Json => to_json(&diagram)?,
    };

    write_output(&rendered, args.output.as_deref())
}

fn strategy_table() -> String {
    LayoutStrategy::ALL
        .iter()
        .map(|s| format!("{:<20}{:<20}{}\n", s.name(), s.label(), s.description()))
        .collect()
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_output(contents: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}
