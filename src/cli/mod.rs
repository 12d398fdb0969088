//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

/// WeChat DB Handler - pull, decrypt, re-encrypt and push the WeChat
/// message database of a rooted Android device.
#[derive(Parser, Debug)]
#[command(name = "wechat-db-handler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to the user config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial of the device to use (overrides the config file).
    #[arg(short, long, global = true)]
    pub serial: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List candidate databases on the device.
    Find {
        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Copy a database from the device to this computer.
    Pull {
        /// Output file on this computer.
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: String,

        /// Absolute path of the database on the device. If not specified,
        /// and only one database is found, that database is used.
        #[arg(long)]
        database_path: Option<String>,
    },

    /// Read the default UIN from the device.
    #[command(name = "get-uin", alias = "get_uin")]
    GetUin,

    /// Decrypt a pulled database into a plain SQLite file.
    Decrypt {
        #[arg(value_name = "UIN", allow_hyphen_values = true)]
        uin: String,
        #[arg(value_name = "IMEI")]
        imei: String,
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,
    },

    /// Encrypt a plain SQLite file with the device key.
    Encrypt {
        #[arg(value_name = "UIN", allow_hyphen_values = true)]
        uin: String,
        #[arg(value_name = "IMEI")]
        imei: String,
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,
        #[arg(value_name = "OUTPUT_FILE")]
        output_file: PathBuf,
    },

    /// Copy a database from this computer over one on the device.
    Push {
        /// File on this computer.
        #[arg(value_name = "INPUT_FILE")]
        input_file: String,

        /// Absolute path of the database on the device.
        #[arg(value_name = "DATABASE_PATH")]
        database_path: String,
    },

    /// Write the default configuration file if missing and show its path.
    Config,
}

impl Commands {
    /// Parse the output format argument, if the command has one.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        match self {
            Self::Find { format } => format.parse(),
            _ => Ok(OutputFormat::default()),
        }
    }
}
