use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "govcheck",
    version,
    about = "Local consistency-check tooling for government transparency annual reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Check(CheckArgs),
    Show(ShowArgs),
    Review(ReviewArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/govcheck")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub parsed_path: PathBuf,

    #[arg(long)]
    pub region: String,

    #[arg(long)]
    pub year: u32,

    #[arg(long, default_value = "")]
    pub unit_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long, default_value = ".cache/govcheck")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_id: Option<i64>,

    #[arg(long)]
    pub version_id: Option<i64>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".cache/govcheck")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_id: Option<i64>,

    #[arg(long)]
    pub version_id: Option<i64>,

    #[arg(long, value_enum)]
    pub group: Option<GroupFilter>,

    #[arg(long, default_value_t = false)]
    pub include_dismissed: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    #[arg(long, default_value = ".cache/govcheck")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub item_id: i64,

    #[arg(long, value_enum)]
    pub status: Option<ReviewStatus>,

    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/govcheck")]
    pub cache_root: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum GroupFilter {
    Table3,
    Table4,
    Text,
}

impl GroupFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table3 => "table3",
            Self::Table4 => "table4",
            Self::Text => "text",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReviewStatus {
    Pending,
    Confirmed,
    Dismissed,
}
