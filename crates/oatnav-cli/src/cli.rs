use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oatnav", bin_name = "oatnav")]
#[command(about = "Inspect OAT images: headers, embedded dex files, compiled code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the OAT header and key/value metadata
    #[command(after_help = r#"EXAMPLES:
  oatnav info boot.oatdata
  oatnav info boot.oatdata --json"#)]
    Info {
        /// Raw oatdata bytes (e.g. the extracted oatdata section)
        file: PathBuf,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List the embedded dex file descriptors
    #[command(name = "dex-files")]
    DexFiles {
        /// Raw oatdata bytes
        file: PathBuf,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one class record, optionally with a method's code offset
    #[command(after_help = r#"EXAMPLES:
  oatnav class boot.oatdata --index 12
  oatnav class app.oatdata --dex classes2.dex --index 0 --method 3"#)]
    Class {
        /// Raw oatdata bytes
        file: PathBuf,

        /// Dex file to search: stream index or location string
        #[arg(long, value_name = "DEX", default_value = "0")]
        dex: String,

        /// Class-def index within the dex file
        #[arg(long, value_name = "INDEX")]
        index: u32,

        /// Method index within the class
        #[arg(long, value_name = "INDEX")]
        method: Option<u32>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}
