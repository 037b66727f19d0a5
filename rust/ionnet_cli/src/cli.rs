use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search adducts and build ion identity networks.
    Run(RunArgs),
    /// Write template configuration and feature table files.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SerializationFormat {
    Json,
    #[default]
    PrettyJson,
    Ndjson,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// The path to the json file with the networking settings.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The path to the json feature table.
    #[arg(short, long)]
    pub features: PathBuf,

    /// The directory the networks are written to.
    #[arg(short, long)]
    pub output_path: PathBuf,

    /// The format to use for the output
    #[arg(long, default_value_t, value_enum)]
    pub format: SerializationFormat,

    /// Overrides `min_height` of the config file.
    #[arg(long)]
    pub min_height: Option<f64>,

    /// Overrides `use_grouping` of the config file.
    #[arg(long)]
    pub use_grouping: Option<bool>,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
