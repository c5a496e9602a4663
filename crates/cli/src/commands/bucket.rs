//! bucket command - Manage buckets
//!
//! Create, list, inspect, rename and delete buckets, and configure their
//! policy, versioning and lifecycle rules.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use osc_core::ObjectStore as _;
use osc_core::dto::{Bucket, CreateBucketInput, LifecycleInput, UpdateBucketInput, UpdatePolicyInput};
use serde::Serialize;

use super::{
    format_size, format_timestamp, parse_remote, read_json_file, report_error, setup_client,
};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Manage buckets
#[derive(Args, Debug)]
pub struct BucketArgs {
    #[command(subcommand)]
    pub command: BucketCommands,
}

#[derive(Subcommand, Debug)]
pub enum BucketCommands {
    /// Create a bucket
    Create(CreateArgs),

    /// List buckets
    List(AliasArg),

    /// Show bucket details
    Info(BucketPathArg),

    /// Show file count and total size
    Stats(BucketPathArg),

    /// Delete a bucket
    Delete(BucketPathArg),

    /// Rename a bucket
    Rename(RenameArgs),

    /// Show or change versioning
    Versioning(VersioningArgs),

    /// Get or set the access policy
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Replace lifecycle rules from a JSON file
    Lifecycle(JsonFileArgs),
}

#[derive(Args, Debug)]
pub struct AliasArg {
    /// Alias of the storage service
    pub alias: String,
}

#[derive(Args, Debug)]
pub struct BucketPathArg {
    /// Path to the bucket (alias/bucket)
    pub path: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Alias of the storage service
    pub alias: String,

    /// Bucket name
    pub name: String,

    /// Owner id recorded on the bucket
    #[arg(long)]
    pub owner: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Path to the bucket (alias/bucket)
    pub path: String,

    /// New bucket name
    pub new_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VersioningAction {
    Enable,
    Suspend,
    Info,
}

#[derive(Args, Debug)]
pub struct VersioningArgs {
    /// Path to the bucket (alias/bucket)
    pub path: String,

    #[arg(value_enum, default_value = "info")]
    pub action: VersioningAction,
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommands {
    /// Print the bucket policy
    Get(BucketPathArg),

    /// Set the bucket policy from a JSON file
    Set(JsonFileArgs),
}

#[derive(Args, Debug)]
pub struct JsonFileArgs {
    /// Path to the bucket (alias/bucket)
    pub path: String,

    /// JSON document to apply
    pub file: PathBuf,
}

#[derive(Serialize)]
struct BucketListOutput {
    alias: String,
    count: usize,
    buckets: Vec<Bucket>,
}

#[derive(Serialize)]
struct BucketOperationOutput {
    success: bool,
    bucket: String,
    message: String,
}

/// Execute the bucket command
pub async fn execute(args: BucketArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match args.command {
        BucketCommands::Create(args) => execute_create(args, &formatter).await,
        BucketCommands::List(args) => execute_list(args, &formatter).await,
        BucketCommands::Info(args) => execute_info(args, &formatter).await,
        BucketCommands::Stats(args) => execute_stats(args, &formatter).await,
        BucketCommands::Delete(args) => execute_delete(args, &formatter).await,
        BucketCommands::Rename(args) => execute_rename(args, &formatter).await,
        BucketCommands::Versioning(args) => execute_versioning(args, &formatter).await,
        BucketCommands::Policy(PolicyCommands::Get(args)) => {
            execute_policy_get(args, &formatter).await
        }
        BucketCommands::Policy(PolicyCommands::Set(args)) => {
            execute_policy_set(args, &formatter).await
        }
        BucketCommands::Lifecycle(args) => execute_lifecycle(args, &formatter).await,
    }
}

fn print_bucket(formatter: &Formatter, bucket: &Bucket) {
    formatter.property("Name:", &formatter.style_name(&bucket.name));
    formatter.property("ID:", &bucket.bucket_id);
    formatter.property("Owner:", bucket.owner_id.as_deref().unwrap_or("-"));
    formatter.property(
        "Created:",
        &formatter.style_date(&format_timestamp(bucket.created_at.as_ref())),
    );
    formatter.property(
        "Updated:",
        &formatter.style_date(&format_timestamp(bucket.updated_at.as_ref())),
    );
}

fn print_done(formatter: &Formatter, bucket: &str, message: String) {
    if formatter.is_json() {
        formatter.json(&BucketOperationOutput {
            success: true,
            bucket: bucket.to_string(),
            message,
        });
    } else {
        formatter.success(&message);
    }
}

async fn execute_create(args: CreateArgs, formatter: &Formatter) -> ExitCode {
    if args.name.trim().is_empty() {
        formatter.error("Bucket name cannot be empty");
        return ExitCode::UsageError;
    }

    let client = match setup_client(&args.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let input = CreateBucketInput::new(&args.name, &args.owner);
    match client.create_bucket(&input).await {
        Ok(bucket) => {
            if formatter.is_json() {
                formatter.json(&bucket);
            } else {
                let styled = formatter.style_name(&bucket.name);
                formatter.success(&format!(
                    "Bucket '{styled}' created with id {}.",
                    bucket.bucket_id
                ));
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to create bucket", &e),
    }
}

async fn execute_list(args: AliasArg, formatter: &Formatter) -> ExitCode {
    let client = match setup_client(&args.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.list_buckets().await {
        Ok(buckets) => {
            if formatter.is_json() {
                formatter.json(&BucketListOutput {
                    alias: args.alias,
                    count: buckets.len(),
                    buckets,
                });
            } else if buckets.is_empty() {
                formatter.println("No buckets found.");
            } else {
                for bucket in &buckets {
                    let date = formatter.style_date(&format!(
                        "[{}]",
                        format_timestamp(bucket.created_at.as_ref())
                    ));
                    let name = formatter.style_name(&format!("{:<24}", bucket.name));
                    formatter.println(&format!("{date} {name} {}", bucket.bucket_id));
                }
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to list buckets", &e),
    }
}

async fn execute_info(args: BucketPathArg, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.get_bucket(&remote.bucket).await {
        Ok(bucket) => {
            if formatter.is_json() {
                formatter.json(&bucket);
            } else {
                print_bucket(formatter, &bucket);
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to get bucket", &e),
    }
}

async fn execute_stats(args: BucketPathArg, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.bucket_stats(&remote.bucket).await {
        Ok(stats) => {
            if formatter.is_json() {
                formatter.json(&stats);
            } else {
                formatter.property("Bucket:", &formatter.style_name(&remote.bucket));
                formatter.property("Files:", &stats.total_files.to_string());
                formatter.property("Total size:", &formatter.style_size(&format_size(stats.total_size)));
                formatter.property(
                    "Last updated:",
                    &formatter.style_date(&format_timestamp(stats.last_updated.as_ref())),
                );
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to get bucket stats", &e),
    }
}

async fn execute_delete(args: BucketPathArg, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.delete_bucket(&remote.bucket).await {
        Ok(()) => {
            print_done(formatter, &remote.bucket, format!("Bucket '{}' deleted.", remote.bucket));
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to delete bucket", &e),
    }
}

async fn execute_rename(args: RenameArgs, formatter: &Formatter) -> ExitCode {
    if args.new_name.trim().is_empty() {
        formatter.error("New bucket name cannot be empty");
        return ExitCode::UsageError;
    }

    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let input = UpdateBucketInput {
        name: Some(args.new_name),
    };
    match client.update_bucket(&remote.bucket, &input).await {
        Ok(bucket) => {
            if formatter.is_json() {
                formatter.json(&bucket);
            } else {
                let styled = formatter.style_name(&bucket.name);
                formatter.success(&format!("Bucket renamed to '{styled}'."));
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to rename bucket", &e),
    }
}

async fn execute_versioning(args: VersioningArgs, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let enabled = match args.action {
        VersioningAction::Info => {
            return match client.get_versioning(&remote.bucket).await {
                Ok(versioning) => {
                    if formatter.is_json() {
                        formatter.json(&versioning);
                    } else {
                        let status = if versioning.status.is_empty() {
                            if versioning.enabled { "Enabled" } else { "Disabled" }
                        } else {
                            versioning.status.as_str()
                        };
                        formatter.property("Versioning:", status);
                    }
                    ExitCode::Success
                }
                Err(e) => report_error(formatter, "Failed to get versioning", &e),
            };
        }
        VersioningAction::Enable => true,
        VersioningAction::Suspend => false,
    };

    match client.set_versioning(&remote.bucket, enabled).await {
        Ok(()) => {
            let state = if enabled { "enabled" } else { "suspended" };
            print_done(
                formatter,
                &remote.bucket,
                format!("Versioning {state} for bucket '{}'.", remote.bucket),
            );
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to set versioning", &e),
    }
}

async fn execute_policy_get(args: BucketPathArg, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.get_bucket_policy(&remote.bucket).await {
        Ok(policy) => {
            if formatter.is_json() {
                formatter.json(&policy);
            } else {
                // The document itself is JSON either way
                match serde_json::to_string_pretty(&policy.policy) {
                    Ok(text) => formatter.println(&text),
                    Err(e) => formatter.warning(&format!("Cannot render policy: {e}")),
                }
            }
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to get policy", &e),
    }
}

async fn execute_policy_set(args: JsonFileArgs, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let policy: UpdatePolicyInput = match read_json_file(&args.file) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };
    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.set_bucket_policy(&remote.bucket, &policy).await {
        Ok(()) => {
            print_done(
                formatter,
                &remote.bucket,
                format!("Policy updated for bucket '{}'.", remote.bucket),
            );
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to set policy", &e),
    }
}

async fn execute_lifecycle(args: JsonFileArgs, formatter: &Formatter) -> ExitCode {
    let remote = match parse_remote(&args.path, formatter) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let lifecycle: LifecycleInput = match read_json_file(&args.file) {
        Ok(l) => l,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };
    if lifecycle.rules.is_empty() {
        formatter.warning("Lifecycle document has no rules; existing rules will be cleared");
    }

    let client = match setup_client(&remote.alias, formatter) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match client.set_lifecycle(&remote.bucket, &lifecycle).await {
        Ok(()) => {
            print_done(
                formatter,
                &remote.bucket,
                format!(
                    "Lifecycle ({} rules) applied to bucket '{}'.",
                    lifecycle.rules.len(),
                    remote.bucket
                ),
            );
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Failed to set lifecycle", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: BucketCommands,
    }

    #[test]
    fn test_versioning_defaults_to_info() {
        let cli = TestCli::parse_from(["test", "versioning", "local/photos"]);
        match cli.command {
            BucketCommands::Versioning(args) => {
                assert_eq!(args.path, "local/photos");
                assert_eq!(args.action, VersioningAction::Info);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_create_requires_owner() {
        assert!(TestCli::try_parse_from(["test", "create", "local", "photos"]).is_err());

        let cli = TestCli::parse_from(["test", "create", "local", "photos", "--owner", "u-1"]);
        match cli.command {
            BucketCommands::Create(args) => {
                assert_eq!(args.name, "photos");
                assert_eq!(args.owner, "u-1");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_policy_set_parses_file() {
        let cli = TestCli::parse_from(["test", "policy", "set", "local/photos", "policy.json"]);
        match cli.command {
            BucketCommands::Policy(PolicyCommands::Set(args)) => {
                assert_eq!(args.file, PathBuf::from("policy.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
