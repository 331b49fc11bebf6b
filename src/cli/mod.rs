//! Command-line interface for bytecraft
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::error::Result;
use crate::gate::{ConnectivityGate, NetworkProbe, TcpProbe};
use crate::notify::{LogNotifier, NotificationPermission};
use crate::output::OutputOptions;
use crate::storage::FileStorage;
use crate::store::Store;

mod cache;
mod dashboard;
mod db;
mod records;
mod trash;

/// bytecraft - offline-first project dashboard
///
/// Manage clients, projects, tasks and collaborators in a single local
/// document, with a recoverable trash and an offline asset cache.
#[derive(Parser, Debug)]
#[command(name = "bytecraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "BYTECRAFT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Treat the network as unavailable; mutations are refused
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Client records
    #[command(subcommand)]
    Client(ClientCommands),

    /// Project records
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task records
    #[command(subcommand)]
    Task(TaskCommands),

    /// Collaborator records
    #[command(subcommand)]
    Collab(CollabCommands),

    /// Soft-deleted records
    #[command(subcommand)]
    Trash(TrashCommands),

    /// Notification log
    #[command(subcommand)]
    Notify(NotifyCommands),

    /// Whole-document operations
    #[command(subcommand)]
    Db(DbCommands),

    /// Summary of open work, recent clients and notifications
    Dashboard,

    /// Offline asset cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// Add a client
    Add {
        name: String,
        /// Contact e-mail or phone
        #[arg(long, default_value = "")]
        contact: String,
    },

    /// Edit a client
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },

    /// Move a client to the trash
    Rm { id: i64 },

    /// List clients
    Ls,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Add a project
    Add {
        name: String,
        /// Client id
        #[arg(long)]
        client: Option<i64>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// pending, in-progress, completed
        #[arg(long, default_value = "pending")]
        status: String,
    },

    /// Edit a project
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Client id, or "none" to clear
        #[arg(long)]
        client: Option<String>,
        /// Due date, or "none" to clear
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },

    /// Move a project to the trash
    Rm { id: i64 },

    /// List projects
    Ls,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// pending, in-progress, completed
        #[arg(long, default_value = "pending")]
        status: String,
        /// low, medium, high, urgent
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Collaborator id
        #[arg(long)]
        assignee: Option<i64>,
        /// Client id
        #[arg(long)]
        client: Option<i64>,
    },

    /// Edit a task
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Due date, or "none" to clear
        #[arg(long)]
        due: Option<String>,
        /// Collaborator id, or "none" to unassign
        #[arg(long)]
        assignee: Option<String>,
        /// Client id, or "none" to clear
        #[arg(long)]
        client: Option<String>,
    },

    /// Move a task to the trash
    Rm { id: i64 },

    /// List tasks
    Ls {
        /// Only tasks that are not completed
        #[arg(long)]
        open: bool,
        /// Only tasks assigned to this collaborator
        #[arg(long)]
        assignee: Option<i64>,
    },

    /// Flip a task between open and completed
    Toggle { id: i64 },

    /// Add tracked time (e.g. 45m, 1h30m, or minutes)
    Time { id: i64, duration: String },
}

#[derive(Subcommand, Debug)]
pub enum CollabCommands {
    /// Add a collaborator
    Add {
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        /// One of the fixed roles (e.g. "Senior Developer", tester)
        #[arg(long)]
        role: String,
    },

    /// Edit a collaborator
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },

    /// Move a collaborator to the trash (unassigns their tasks)
    Rm { id: i64 },

    /// List collaborators
    Ls,
}

#[derive(Subcommand, Debug)]
pub enum TrashCommands {
    /// List soft-deleted records, newest first
    Ls,

    /// Put a record back into its collection
    Restore {
        id: i64,
        /// Record type, required when several trashed records share the id
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Delete a trashed record permanently
    Purge {
        id: i64,
        /// Record type, required when several trashed records share the id
        #[arg(long = "type")]
        kind: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Show the notification log
    Ls {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Mark every notification as read
    ReadAll,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Write a dated JSON backup
    Export {
        /// Output directory (defaults to the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace every collection from a backup file
    Import { file: PathBuf },

    /// Delete the stored document; the next run starts from factory data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Print the stored document
    Show,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Populate the current bucket from the manifest
    Install {
        /// Serve assets from this directory instead of the network
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },

    /// Delete every bucket except the current one
    Activate,

    /// Route one request through the cache
    Fetch {
        /// Absolute URL, or a path relative to the configured origin
        url: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// Treat as a page navigation
        #[arg(long)]
        navigate: bool,
        /// Serve from this directory instead of the network
        #[arg(long)]
        from_dir: Option<PathBuf>,
        /// Write the response body here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show buckets and what the current one holds
    Status,
}

/// Resolved global state shared by every command
pub(crate) struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub offline: bool,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    fn new(data_dir: Option<&Path>, offline: bool, json: bool, quiet: bool) -> Result<Self> {
        let data_dir = config::resolve_data_dir(data_dir)?;
        let config = Config::load_from_dir(&data_dir);
        Ok(Self {
            data_dir,
            config,
            offline,
            json,
            quiet,
        })
    }

    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// `--offline`, then `network.online`, then the optional probe
    pub fn gate(&self) -> ConnectivityGate {
        if self.offline || !self.config.network.online {
            return ConnectivityGate::offline();
        }
        let mut gate = ConnectivityGate::online();
        if let Some(addr) = &self.config.network.probe {
            let probe = TcpProbe::new(
                addr.clone(),
                Duration::from_millis(self.config.network.probe_timeout_ms),
            );
            gate.set_online(probe.is_online());
        }
        gate
    }

    pub fn open_store(&self) -> Result<Store<FileStorage>> {
        std::fs::create_dir_all(&self.data_dir)?;
        let storage = FileStorage::new(&self.data_dir)
            .with_lock_timeout(self.config.store.lock_timeout_ms);
        let permission = if self.config.notifications.desktop {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        };
        Ok(Store::load(storage, self.config.store_options())?
            .with_gate(self.gate())
            .with_notifier(Box::new(LogNotifier::new(permission))))
    }

    pub fn cache_root(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = Context::new(self.data_dir.as_deref(), self.offline, self.json, self.quiet)?;

        match self.command {
            Commands::Client(cmd) => records::run_client(&ctx, cmd),
            Commands::Project(cmd) => records::run_project(&ctx, cmd),
            Commands::Task(cmd) => records::run_task(&ctx, cmd),
            Commands::Collab(cmd) => records::run_collab(&ctx, cmd),
            Commands::Trash(cmd) => match cmd {
                TrashCommands::Ls => trash::run_ls(&ctx),
                TrashCommands::Restore { id, kind } => {
                    trash::run_restore(&ctx, id, kind.as_deref())
                }
                TrashCommands::Purge { id, kind } => trash::run_purge(&ctx, id, kind.as_deref()),
            },
            Commands::Notify(cmd) => match cmd {
                NotifyCommands::Ls { limit } => dashboard::run_notify_ls(&ctx, limit),
                NotifyCommands::ReadAll => dashboard::run_notify_read_all(&ctx),
            },
            Commands::Db(cmd) => match cmd {
                DbCommands::Export { out } => db::run_export(&ctx, out),
                DbCommands::Import { file } => db::run_import(&ctx, &file),
                DbCommands::Reset { yes } => db::run_reset(&ctx, yes),
                DbCommands::Show => db::run_show(&ctx),
            },
            Commands::Dashboard => dashboard::run(&ctx),
            Commands::Cache(cmd) => cache::run(&ctx, cmd),
        }
    }
}
