pub mod categorical;
pub mod cli;
pub mod column;
pub mod decision;
pub mod dtype;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod memory;
pub mod numeric;
pub mod optimize;
pub mod report;
pub mod type_map;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, InputArgs},
    column::Table,
    loader::LoadOptions,
    optimize::{OptimizationReport, OptimizeOptions},
    type_map::ColumnTypeMap,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_shrink", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Optimize(args) => handle_optimize(&args),
        Commands::Usage(args) => handle_usage(&args),
        Commands::Range(args) => handle_range(&args),
    }
}

/// Type map from `--types` with any inline `--type` declarations layered on top.
fn declared_types(args: &InputArgs) -> Result<Option<ColumnTypeMap>> {
    let mut types = match &args.types {
        Some(path) => Some(
            ColumnTypeMap::load(path).with_context(|| format!("Loading type map from {path:?}"))?,
        ),
        None => None,
    };
    if !args.type_overrides.is_empty() {
        let overrides = loader::parse_type_overrides(&args.type_overrides)?;
        debug!("Inline type declarations: {overrides:?}");
        types.get_or_insert_with(ColumnTypeMap::default).merge(overrides);
    }
    Ok(types)
}

fn load_options(args: &InputArgs, types: Option<ColumnTypeMap>) -> Result<LoadOptions> {
    Ok(LoadOptions {
        delimiter: io_utils::resolve_input_delimiter(&args.input, args.delimiter),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        types,
        row_limit: args.limit,
    })
}

fn load_input(args: &InputArgs) -> Result<Table> {
    let options = load_options(args, declared_types(args)?)?;
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(options.delimiter)
    );
    loader::load_table(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a OptimizationReport,
    types: &'a ColumnTypeMap,
}

fn handle_optimize(args: &cli::OptimizeArgs) -> Result<()> {
    let table = load_input(&args.input)?;
    let options = OptimizeOptions {
        category_threshold: args.category_threshold,
        float_tolerance: args.float_tolerance,
    };
    let optimized = optimize::optimize(&table, &options)
        .with_context(|| format!("Optimizing {:?}", args.input.input))?;
    let types = type_map::derive_type_map(&optimized.table);

    if args.json {
        let output = JsonOutput {
            report: &optimized.report,
            types: &types,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Serializing report to JSON")?
        );
    } else {
        print!("{}", report::render_optimization(&optimized.report));
        println!();
        print!("{}", report::render_type_map(&types));
    }

    if let Some(path) = &args.output_types {
        types.save(path)?;
        info!("Type map for {} column(s) written to {path:?}", types.len());
    }

    if args.verify {
        verify_type_map(&args.input, &optimized.table, &types)?;
    }
    Ok(())
}

/// Reloads the input under `types` and checks it lands on the optimized footprint.
fn verify_type_map(args: &InputArgs, optimized: &Table, types: &ColumnTypeMap) -> Result<()> {
    if io_utils::is_dash(&args.input) {
        bail!("--verify needs to read the input twice and cannot be used with stdin");
    }
    let options = load_options(args, Some(types.clone()))?;
    let reloaded = loader::load_table(&args.input, &options)
        .with_context(|| format!("Reloading {:?} with the derived type map", args.input))?;
    let expected = memory::measure_table("optimized", optimized);
    let actual = memory::measure_table("reloaded", &reloaded);
    if expected.bytes != actual.bytes {
        bail!(
            "Reloaded table uses {} bytes but the optimized table uses {}",
            actual.bytes,
            expected.bytes
        );
    }
    info!(
        "Verified: reloading with the type map yields {}",
        report::format_megabytes(&actual)
    );
    Ok(())
}

fn handle_usage(args: &cli::UsageArgs) -> Result<()> {
    let table = load_input(&args.input)?;
    print!(
        "{}",
        report::render_class_usage(&memory::usage_by_class(&table))
    );
    if args.columns {
        println!();
        let total = memory::measure_table("total", &table);
        print!(
            "{}",
            report::render_column_usage(&memory::measure_columns(&table), &total)
        );
    }
    Ok(())
}

fn handle_range(args: &cli::RangeArgs) -> Result<()> {
    let table = load_input(&args.input)?;
    let ranges = numeric::numeric_ranges(&table);
    if ranges.is_empty() {
        info!("No numeric columns in {:?}", args.input.input);
    }
    print!("{}", report::render_ranges(&ranges));
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
