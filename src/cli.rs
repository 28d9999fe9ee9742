use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zipfetch")]
#[command(version)]
#[command(about = "Extract selected files from a remote ZIP archive using HTTP Range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfetch https://example.com/dvd.zip -e 'Internal.*\\.dll$' -d libs\n  \
  zipfetch -l https://example.com/dvd.zip              list entries without extracting\n  \
  zipfetch -v local.zip -e '\\.txt$'                    verbose listing of matching entries")]
pub struct Cli {
    /// ZIP archive URL (http/https) or local path
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Case-insensitive regex matched against in-archive paths
    #[arg(short = 'e', long = "pattern", value_name = "REGEX", default_value = ".*")]
    pub pattern: String,

    /// Extract files into DIR (flat, directory components are dropped)
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub extract_dir: PathBuf,

    /// List matching files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List matching files verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode: only errors are reported
    #[arg(short = 'q')]
    pub quiet: bool,

    /// TOML file with fetch settings
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn is_listing(&self) -> bool {
        self.list || self.verbose
    }
}
