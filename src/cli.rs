//! Command-line front end: every subcommand runs as a work component

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use supabase_work::{
    Confirmer, Outcome, StorageConfig, SupabaseDb, SupabaseStorage, Work, WorkConfig,
};

#[derive(Parser, Debug)]
#[command(name = "supabase-work", version, about = "Supabase Storage and database operations")]
pub struct Cli {
    /// Work configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub work_config: Option<PathBuf>,

    /// Skip the confirmation prompt for destructive commands
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List available buckets
    Buckets,
    /// Create a bucket
    CreateBucket { bucket: String },
    /// Show a bucket
    Bucket { bucket: String },
    /// Create a signed URL for an object
    Sign {
        bucket: String,
        path: String,
        /// URL lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        expires_in: u64,
    },
    /// Print the public URL of an object
    PublicUrl { bucket: String, path: String },
    /// List the files in a bucket
    Ls { bucket: String },
    /// Delete files from a bucket
    Rm {
        bucket: String,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Move a file within a bucket
    Mv { bucket: String, from: String, to: String },
    /// Delete a bucket
    DeleteBucket { bucket: String },
    /// Remove every file from a bucket
    EmptyBucket { bucket: String },
    /// Upload a local file
    Upload {
        source: PathBuf,
        destination: String,
        bucket: String,
    },
    /// Download a file
    Download {
        source: String,
        bucket: String,
        /// Local file to write (defaults to the object's file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print every row of a table
    DbFetch { table: String },
    /// Insert rows given as a JSON object or array
    DbInsert { table: String, rows: String },
}

impl Command {
    fn uses_database(&self) -> bool {
        matches!(self, Command::DbFetch { .. } | Command::DbInsert { .. })
    }
}

/// A single CLI invocation as a work component
pub struct CommandWork {
    config: WorkConfig,
    command: Command,
    assume_yes: bool,
    storage: Option<SupabaseStorage>,
    db: Option<SupabaseDb>,
}

impl CommandWork {
    pub fn new(config: WorkConfig, command: Command, assume_yes: bool) -> Self {
        Self {
            config,
            command,
            assume_yes,
            storage: None,
            db: None,
        }
    }

    fn storage(&self) -> Result<&SupabaseStorage> {
        self.storage.as_ref().context("Storage is not mounted")
    }

    fn db(&self) -> Result<&SupabaseDb> {
        self.db.as_ref().context("Database is not mounted")
    }
}

#[async_trait]
impl Work for CommandWork {
    async fn mount(&mut self) -> Result<()> {
        if self.command.uses_database() {
            self.db = Some(SupabaseDb::from_env()?);
            return Ok(());
        }

        let config = StorageConfig::from_env()?;
        let storage = SupabaseStorage::connect(&config).await?;

        // fail early when the endpoint or credentials are wrong
        let buckets = storage.available_buckets().await?;
        tracing::debug!("Storage mounted, {} bucket(s) visible", buckets.len());

        self.storage = Some(storage);
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        match &self.command {
            Command::Buckets => {
                let buckets = self.storage()?.available_buckets().await?;

                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["bucket", "created"]);
                for bucket in buckets {
                    let created = bucket
                        .creation_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_default();
                    table.add_row(vec![bucket.name, created]);
                }
                println!("{table}");
            }
            Command::CreateBucket { bucket } => {
                if let Some(created) = self.storage()?.create_bucket(bucket, true).await? {
                    println!("{}", serde_json::to_string_pretty(&created)?);
                }
            }
            Command::Bucket { bucket } => {
                let bucket = self.storage()?.retrieve_bucket(bucket).await?;
                println!("{}", serde_json::to_string_pretty(&bucket)?);
            }
            Command::Sign {
                bucket,
                path,
                expires_in,
            } => {
                println!("{}", self.storage()?.create_signed_url(bucket, path, *expires_in).await?);
            }
            Command::PublicUrl { bucket, path } => {
                println!("{}", self.storage()?.retrieve_public_url(bucket, path).await?);
            }
            Command::Ls { bucket } => {
                for file in self.storage()?.list_bucket_files(bucket).await? {
                    println!("{file}");
                }
            }
            Command::Rm { bucket, files } => {
                let storage = self.storage()?;
                if self.assume_yes {
                    storage.delete_files_from_bucket(bucket, files).await?;
                } else {
                    let mut confirmer = Confirmer::stdio();
                    let confirmation =
                        storage.delete_files_confirmed(&mut confirmer, bucket, files);
                    report(interactive(confirmation)?);
                }
            }
            Command::Mv { bucket, from, to } => {
                let storage = self.storage()?;
                if self.assume_yes {
                    storage.move_file(bucket, from, to).await?;
                } else {
                    let mut confirmer = Confirmer::stdio();
                    let confirmation =
                        storage.move_file_confirmed(&mut confirmer, bucket, from, to);
                    report(interactive(confirmation)?);
                }
            }
            Command::DeleteBucket { bucket } => {
                let storage = self.storage()?;
                if self.assume_yes {
                    storage.delete_bucket(bucket).await?;
                } else {
                    let mut confirmer = Confirmer::stdio();
                    report(interactive(storage.delete_bucket_confirmed(&mut confirmer, bucket))?);
                }
            }
            Command::EmptyBucket { bucket } => {
                let storage = self.storage()?;
                if self.assume_yes {
                    storage.empty_bucket(bucket).await?;
                } else {
                    let mut confirmer = Confirmer::stdio();
                    report(interactive(storage.empty_bucket_confirmed(&mut confirmer, bucket))?);
                }
            }
            Command::Upload {
                source,
                destination,
                bucket,
            } => {
                self.storage()?.upload_to_bucket(source, destination, bucket).await?;
            }
            Command::Download {
                source,
                bucket,
                output,
            } => {
                let output = match output {
                    Some(path) => path.clone(),
                    None => default_download_path(source)?,
                };
                self.storage()?.download_from_bucket(source, bucket, &output).await?;
                println!("{}", output.display());
            }
            Command::DbFetch { table } => {
                let rows = self.db()?.fetch(table).await?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            Command::DbInsert { table, rows } => {
                let rows = parse_rows(rows)?;
                let inserted = self.db()?.insert(table, &rows).await?;
                println!("{}", serde_json::to_string_pretty(&inserted)?);
            }
        }

        Ok(())
    }

    fn config(&self) -> &WorkConfig {
        &self.config
    }
}

/// Drive a prompting future on a blocking-capable thread; the prompt reads stdin
fn interactive<T>(confirmation: impl Future<Output = Result<Outcome<T>>>) -> Result<Outcome<T>> {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(confirmation))
}

fn report(outcome: Outcome<()>) {
    tracing::debug!(executed = outcome.is_executed(), "Confirmation resolved");
}

/// Last path component of an object, used when no output file is given
fn default_download_path(source: &str) -> Result<PathBuf> {
    source
        .rsplit('/')
        .find(|s| !s.is_empty())
        .map(PathBuf::from)
        .with_context(|| format!("Cannot derive a file name from {:?}, pass --output", source))
}

/// A single JSON object becomes one row; an array is taken as is
fn parse_rows(raw: &str) -> Result<Vec<serde_json::Value>> {
    match serde_json::from_str(raw).context("Rows must be JSON")? {
        serde_json::Value::Array(rows) => Ok(rows),
        row @ serde_json::Value::Object(_) => Ok(vec![row]),
        other => anyhow::bail!("Rows must be a JSON object or array, got {}", other),
    }
}
