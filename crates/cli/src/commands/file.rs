//! file command - Manage files in a bucket
//!
//! Upload, list, inspect, download, delete, copy and move files, and edit
//! their metadata.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use osc_core::ObjectStore as _;
use osc_core::dto::{CopyFileInput, FileInfo, MoveFileInput};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::{
    format_size, format_timestamp, parse_file_path, parse_remote, report_error, setup_client,
};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Manage files
#[derive(Args, Debug)]
pub struct FileArgs {
    #[command(subcommand)]
    pub command: FileCommands,
}

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Upload a local file into a bucket
    Upload(UploadArgs),

    /// List files in a bucket
    List(BucketPathArg),

    /// Show file details
    Info(FilePathArg),

    /// Download file contents
    Download(DownloadArgs),

    /// Delete a file
    Delete(FilePathArg),

    /// Set file metadata
    Meta(MetaArgs),

    /// Copy a file to another bucket
    Copy(TransferArgs),

    /// Move a file to another bucket
    Move(TransferArgs),
}

#[derive(Args, Debug)]
pub struct BucketPathArg {
    /// Path to the bucket (alias/bucket)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct FilePathArg {
    /// Path to the file (alias/bucket/file-id)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Destination bucket (alias/bucket)
    pub path: String,

    /// Local file to upload
    pub source: PathBuf,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Path to the file (alias/bucket/file-id)
    pub path: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Path to the file (alias/bucket/file-id)
    pub path: String,

    /// Metadata entries (key=value)
    #[arg(value_name = "KEY=VALUE", required = true, num_args = 1..)]
    pub entries: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Path to the file (alias/bucket/file-id)
    pub path: String,

    /// Destination bucket id
    pub destination: String,

    /// Key for the new file (defaults to the current key)
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Serialize)]
struct FileListOutput {
    bucket: String,
    count: usize,
    files: Vec<FileInfo>,
}

#[derive(Serialize)]
struct FileOperationOutput {
    success: bool,
    path: String,
    message: String,
}

#[derive(Serialize)]
struct DownloadOutput {
    path: String,
    output: String,
    size: usize,
}

/// Execute the file command
pub async fn execute(args: FileArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match args.command {
        FileCommands::Upload(args) => execute_upload(args, &formatter).await,
        FileCommands::List(args) => execute_list(args, &formatter).await,
        FileCommands::Info(args) => execute_info(args, &formatter).await,
        FileCommands::Download(args) => execute_download(args, &formatter).await,
        FileCommands::Delete(args) => execute_delete(args, &formatter).await,
        FileCommands::Meta(args) => execute_meta(args, &formatter).await,
        FileCommands::Copy(args) => execute_transfer(args, false, &formatter).await,
        FileCommands::Move(args) => execute_transfer(args, true, &formatter).await,
    }
}

/// Parse `key=value` entries into a metadata map
fn parse_metadata(entries: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut metadata = BTreeMap::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((key, _)) if key.is_empty() => {
                return Err(format!("Invalid metadata '{entry}' (key cannot be empty)"));
            }
            Some((key, value)) => {
                metadata.insert(key.to_string(), value.to_string());
            }
            None => {
                return Err(format!("Invalid metadata '{entry}' (expected key=value)"));
            }
        }
    }
    Ok(metadata)
}

fn print_file(formatter: &Formatter, file: &FileInfo) {
    formatter.property("Key:", &formatter.style_name(&file.key));
    formatter.property("ID:", &file.file_id);
    formatter.property("Bucket:", &file.bucket_id);
    formatter.property("Size:", &formatter.style_size(&format_size(file.size)));
    formatter.property("Content type:", file.mime_type.as_deref().unwrap_or("-"));
    formatter.property(
        "Created:",
        &formatter.style_date(&format_timestamp(file.created_at.as_ref())),
    );
    for (key, value) in &file.metadata {
        formatter.property(&format!("  {key}:"), value);
    }
}

fn print_done(formatter: &Formatter, path: &str, message: String) {
    if formatter.is_json() {
        formatter.json(&FileOperationOutput {
            success: true,
            path: path.to_string(),
            message,
        });
    } else {
        formatter.success(&message);
    }
}

async fn execute_upload(args: UploadArgs, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if remote.file_id.is_some() {
        formatter.error("Upload destination must be alias/bucket");
        return ExitCode::UsageError;
    }
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.upload_file(&remote.bucket, &args.source).await {
        Ok(file) => {
            if formatter.is_json() {
                formatter.json(&file);
            } else {
                let size = formatter.style_size(&format_size(file.size));
                formatter.success(&format!(
                    "Uploaded '{}' ({size}) as {}.",
                    args.source.display(),
                    file.file_id
                ));
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to upload file", &e),
    }
}

async fn execute_list(args: BucketPathArg, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.list_files(&remote.bucket).await {
        Ok(files) => {
            if formatter.is_json() {
                formatter.json(&FileListOutput {
                    bucket: remote.bucket,
                    count: files.len(),
                    files,
                });
            } else if files.is_empty() {
                formatter.println("No files found.");
            } else {
                for file in &files {
                    let date = formatter.style_date(&format!(
                        "[{}]",
                        format_timestamp(file.created_at.as_ref())
                    ));
                    let size = formatter.style_size(&format!("{:>10}", format_size(file.size)));
                    let key = formatter.style_name(&file.key);
                    formatter.println(&format!("{date} {size} {key} ({})", file.file_id));
                }
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to list files", &e),
    }
}

async fn execute_info(args: FilePathArg, formatter: &Formatter) -> ExitCode {
    let (remote, file_id) = match parse_file_path(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.get_file(&remote.bucket, &file_id).await {
        Ok(file) => {
            if formatter.is_json() {
                formatter.json(&file);
            } else {
                print_file(formatter, &file);
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to get file", &e),
    }
}

async fn execute_download(args: DownloadArgs, formatter: &Formatter) -> ExitCode {
    let (remote, file_id) = match parse_file_path(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let bytes = match client.download_file(&remote.bucket, &file_id).await {
        Ok(b) => b,
        Err(e) => return report_error(formatter, "Failed to download file", &e),
    };

    let Some(output) = args.output else {
        // Raw contents go to stdout regardless of output mode
        let mut stdout = tokio::io::stdout();
        if let Err(e) = stdout.write_all(&bytes).await {
            formatter.error(&format!("Failed to write to stdout: {e}"));
            return ExitCode::GeneralError;
        }
        if let Err(e) = stdout.flush().await {
            formatter.error(&format!("Failed to write to stdout: {e}"));
            return ExitCode::GeneralError;
        }
        return ExitCode::Success;
    };

    if let Err(e) = tokio::fs::write(&output, &bytes).await {
        formatter.error(&format!("Failed to write {}: {e}", output.display()));
        return ExitCode::GeneralError;
    }

    if formatter.is_json() {
        formatter.json(&DownloadOutput {
            path: args.path,
            output: output.display().to_string(),
            size: bytes.len(),
        });
    } else {
        let size = formatter.style_size(&format_size(bytes.len() as u64));
        formatter.success(&format!("Downloaded {size} to '{}'.", output.display()));
    }
    ExitCode::Success
}

async fn execute_delete(args: FilePathArg, formatter: &Formatter) -> ExitCode {
    let (remote, file_id) = match parse_file_path(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.delete_file(&remote.bucket, &file_id).await {
        Ok(()) => {
            print_done(formatter, &args.path, format!("File '{}' deleted.", args.path));
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to delete file", &e),
    }
}

async fn execute_meta(args: MetaArgs, formatter: &Formatter) -> ExitCode {
    let metadata = match parse_metadata(&args.entries) {
        Ok(m) => m,
        Err(message) => {
            formatter.error(&message);
            return ExitCode::UsageError;
        }
    };
    let (remote, file_id) = match parse_file_path(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client
        .update_file_metadata(&remote.bucket, &file_id, metadata)
        .await
    {
        Ok(file) => {
            if formatter.is_json() {
                formatter.json(&file);
            } else {
                formatter.success(&format!("Metadata updated for '{}'.", args.path));
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to update metadata", &e),
    }
}

async fn execute_transfer(args: TransferArgs, remove_source: bool, formatter: &Formatter) -> ExitCode {
    let (remote, file_id) = match parse_file_path(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = if remove_source {
        let mut input = MoveFileInput::new(&args.destination);
        input.new_key = args.key;
        client.move_file(&remote.bucket, &file_id, &input).await
    } else {
        let mut input = CopyFileInput::new(&args.destination);
        input.new_key = args.key;
        client.copy_file(&remote.bucket, &file_id, &input).await
    };
    let verb = if remove_source { "Moved" } else { "Copied" };

    match result {
        Ok(file) => {
            if formatter.is_json() {
                formatter.json(&file);
            } else {
                formatter.success(&format!(
                    "{verb} '{}' to {}/{}/{}.",
                    args.path, remote.alias, args.destination, file.file_id
                ));
            }
            ExitCode::Success
        }
        Err(e) if remove_source => report_error(formatter, "Failed to move file", &e),
        Err(e) => report_error(formatter, "Failed to copy file", &e),
    }
}
