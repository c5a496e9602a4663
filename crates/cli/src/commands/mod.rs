//! CLI commands
//!
//! Each command parses its arguments, resolves the alias into a
//! [`StorageClient`] and prints through the shared [`Formatter`].

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use osc_client::StorageClient;
use osc_core::{AliasManager, Error, RemotePath, parse_path};
use serde::de::DeserializeOwned;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod alias;
pub mod bucket;
pub mod completions;
pub mod file;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage storage service aliases
    #[command(subcommand)]
    Alias(alias::AliasCommands),

    /// Create, inspect and configure buckets
    Bucket(bucket::BucketArgs),

    /// Upload, download and manage files
    File(file::FileArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Run a parsed command
pub async fn execute(command: Commands, output_config: OutputConfig) -> ExitCode {
    match command {
        Commands::Alias(cmd) => alias::execute(cmd, output_config).await,
        Commands::Bucket(args) => bucket::execute(args, output_config).await,
        Commands::File(args) => file::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Parse `alias/bucket[/file-id]`, reporting a usage error on failure
pub(crate) fn parse_remote(path: &str, formatter: &Formatter) -> Result<RemotePath, ExitCode> {
    parse_path(path).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

/// Parse a path that must name a file, returning it with the file id
pub(crate) fn parse_file_path(
    path: &str,
    formatter: &Formatter,
) -> Result<(RemotePath, String), ExitCode> {
    let remote = parse_remote(path, formatter)?;
    match remote.require_file() {
        Ok(file_id) => {
            let file_id = file_id.to_string();
            Ok((remote, file_id))
        }
        Err(e) => {
            formatter.error(&e.to_string());
            Err(ExitCode::UsageError)
        }
    }
}

/// Build a client for the named alias
pub(crate) fn setup_client(alias_name: &str, formatter: &Formatter) -> Result<StorageClient, ExitCode> {
    let alias_manager = match AliasManager::new() {
        Ok(am) => am,
        Err(e) => {
            formatter.error(&format!("Failed to load aliases: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    let alias = match alias_manager.get(alias_name) {
        Ok(a) => a,
        Err(Error::AliasNotFound(_)) => {
            formatter.error(&format!("Alias '{alias_name}' not found"));
            return Err(ExitCode::NotFound);
        }
        Err(e) => {
            formatter.error(&format!("Failed to load alias '{alias_name}': {e}"));
            return Err(ExitCode::GeneralError);
        }
    };

    StorageClient::from_alias(&alias).map_err(|e| {
        formatter.error(&format!("Failed to create client: {e}"));
        ExitCode::from_error(&e)
    })
}

/// Report a failed operation and pick the matching exit code
pub(crate) fn report_error(formatter: &Formatter, action: &str, error: &Error) -> ExitCode {
    tracing::debug!(error = ?error, "{action} failed");
    formatter.error(&format!("{action}: {error}"));
    ExitCode::from_error(error)
}

/// Read and parse a JSON document from disk
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Human-readable byte size
pub(crate) fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Timestamp in the local listing format, or `-` when unknown
pub(crate) fn format_timestamp(ts: Option<&jiff::Timestamp>) -> String {
    ts.map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
