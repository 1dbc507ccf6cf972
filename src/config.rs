use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::data::query::DEFAULT_PAGE_SIZE;
use crate::data::SourceFile;

/// Command line, with environment fallbacks for every option.
#[derive(Parser, Debug)]
#[command(name = "spare-parts-api")]
#[command(about = "Read-only HTTP API over a spare-parts inventory file")]
#[command(version)]
pub struct Args {
    /// Delimited text file with a header row. Reloads re-read this path.
    #[arg(short, long, env = "SPARE_PARTS_FILE", default_value = "LE.txt")]
    pub file: PathBuf,

    /// Address to listen on
    #[arg(long, env = "SPARE_PARTS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "SPARE_PARTS_PORT", default_value_t = 3300)]
    pub port: u16,

    /// Field delimiter, a single byte such as ',' or ';'
    #[arg(short, long, env = "SPARE_PARTS_DELIMITER", default_value = ",")]
    pub delimiter: String,

    /// Rows per page when a request does not set page_size
    #[arg(long, env = "SPARE_PARTS_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub default_page_size: usize,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: SourceFile,
    pub addr: SocketAddr,
    pub default_page_size: usize,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let delimiter = match self.delimiter.as_bytes() {
            [byte] => *byte,
            _ => bail!(
                "delimiter must be a single byte, got {:?}",
                self.delimiter
            ),
        };
        if self.default_page_size == 0 {
            bail!("default page size must be greater than zero");
        }
        Ok(Config {
            source: SourceFile::new(self.file).with_delimiter(delimiter),
            addr: SocketAddr::new(self.bind, self.port),
            default_page_size: self.default_page_size,
        })
    }
}
