use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{categorical::DEFAULT_CATEGORY_THRESHOLD, numeric::DEFAULT_FLOAT_TOLERANCE};

#[derive(Debug, Parser)]
#[command(author, version, about = "Shrink the in-memory footprint of CSV columns", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Narrow every numeric and text column and report the savings
    Optimize(OptimizeArgs),
    /// Report the memory used by each column and each type class
    Usage(UsageArgs),
    /// Show the observed minimum and maximum of numeric columns
    Range(RangeArgs),
}

/// Options shared by every command that reads a CSV file.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Read at most this many data rows
    #[arg(long)]
    pub limit: Option<usize>,
    /// Type map file (YAML, or JSON by extension) applied while loading
    #[arg(short = 't', long = "types")]
    pub types: Option<PathBuf>,
    /// Inline type declarations such as `id:uint16,city:category`
    #[arg(long = "type", action = clap::ArgAction::Append)]
    pub type_overrides: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Write the resulting column type map to this file
    #[arg(short = 'o', long = "output-types")]
    pub output_types: Option<PathBuf>,
    /// Text columns whose uniqueness ratio falls below this become categorical
    #[arg(long = "category-threshold", default_value_t = DEFAULT_CATEGORY_THRESHOLD)]
    pub category_threshold: f64,
    /// Largest absolute error tolerated when narrowing floats to 32 bits
    #[arg(long = "float-tolerance", default_value_t = DEFAULT_FLOAT_TOLERANCE)]
    pub float_tolerance: f64,
    /// Reload the input with the derived type map and confirm the footprint
    #[arg(long)]
    pub verify: bool,
    /// Emit the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UsageArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// List every column rather than only per-class averages
    #[arg(long)]
    pub columns: bool,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delimiter_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn optimize_defaults() {
        let cli = Cli::try_parse_from(["csv-shrink", "optimize", "-i", "data.csv"]).unwrap();
        match cli.command {
            Commands::Optimize(args) => {
                assert_eq!(args.category_threshold, 0.5);
                assert_eq!(args.float_tolerance, 5e-4);
                assert!(args.output_types.is_none());
                assert!(!args.verify);
                assert_eq!(args.input.input, PathBuf::from("data.csv"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
