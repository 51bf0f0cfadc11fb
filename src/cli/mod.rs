//! Command-line interface for daybook
//!
//! This module defines the CLI structure using clap derive macros. Each
//! subcommand maps onto one store operation; implementations live in the
//! `task` and `note` submodules.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::clock::{date_of, Clock, SystemClock};
use crate::config::{default_config_path, Config};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::session::SessionState;
use crate::storage::FileStore;
use crate::store::{Persistence, TaskStore};

mod note;
mod task;

/// daybook - a personal task tracker
///
/// Tasks remember every day they were active on. Sticky tasks roll forward
/// onto each new day until they are completed.
#[derive(Parser, Debug)]
#[command(name = "daybook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the records file
    #[arg(long, global = true, env = "DAYBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to config.toml
    #[arg(long, global = true, env = "DAYBOOK_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Create a task, active today
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Do not roll this task forward onto new days
        #[arg(long)]
        not_sticky: bool,
    },

    /// List tasks active on a day (today by default)
    List {
        /// Day(s) to list, YYYY-MM-DD; may be repeated
        #[arg(long = "date", value_name = "DATE")]
        dates: Vec<NaiveDate>,

        /// List every task regardless of activity
        #[arg(long, conflicts_with = "dates")]
        all: bool,
    },

    /// Show a task with its notes and active days
    Show {
        /// Task id or unique prefix
        id: String,
    },

    /// Edit a task's fields
    Edit {
        /// Task id or unique prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Make the task sticky
        #[arg(long, conflicts_with = "not_sticky")]
        sticky: bool,

        /// Make the task not sticky
        #[arg(long)]
        not_sticky: bool,
    },

    /// Mark tasks complete
    Complete {
        /// Task ids or unique prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mark tasks incomplete (and active today)
    Incomplete {
        /// Task ids or unique prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Mark tasks active today
    Touch {
        /// Task ids or unique prefixes
        #[arg(required = true)]
        ids: Vec<String>,

        /// Also reopen completed tasks
        #[arg(long)]
        reactivate: bool,
    },

    /// Delete tasks
    Delete {
        /// Task ids or unique prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Task note management
    #[command(subcommand)]
    Note(NoteCommands),
}

/// Note subcommands
#[derive(Subcommand, Debug)]
pub enum NoteCommands {
    /// Append a note to a task
    Add {
        /// Task id or unique prefix
        id: String,

        /// Note body (markdown)
        markdown: String,
    },

    /// Replace the body of an existing note
    Edit {
        /// Task id or unique prefix
        id: String,

        /// Note index as shown by `daybook show`
        index: usize,

        /// New note body (markdown)
        markdown: String,
    },
}

/// Everything a command needs: the loaded store, the session selection
/// state and how to print.
pub(crate) struct Context {
    pub store: TaskStore,
    pub session: SessionState,
    pub clock: Arc<dyn Clock>,
    pub output: OutputOptions,
}

impl Context {
    async fn open(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().or_else(default_config_path);
        let config = Config::load_or_default(config_path.as_deref())?;
        let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
        debug!(data_dir = %data_dir.display(), key = %config.storage.key, "opening records");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let persistence = Persistence::new(Arc::new(FileStore::new(data_dir)), &config.storage.key)?;
        let mut store = TaskStore::load(persistence, Arc::clone(&clock)).await?;
        let mut session = SessionState::new(Arc::clone(&clock));
        session.assess_current();

        let last_saved_day = date_of(store.last_save());
        if config.tasks.touch_sticky_on_open && last_saved_day < Some(session.current_date()) {
            let touched = store.touch_sticky_tasks();
            info!(touched, "rolled sticky tasks onto a new day");
            store.settle().await;
        }

        Ok(Self {
            store,
            session,
            clock,
            output: OutputOptions {
                json: cli.json,
                quiet: cli.quiet,
            },
        })
    }
}

impl Cli {
    /// Execute the parsed command
    pub async fn run(self) -> Result<()> {
        let mut ctx = Context::open(&self).await?;
        let result = match self.command {
            Commands::Add {
                title,
                description,
                not_sticky,
            } => task::run_add(
                &mut ctx,
                task::AddOptions {
                    title,
                    description,
                    sticky: !not_sticky,
                },
            ),
            Commands::List { dates, all } => {
                task::run_list(&mut ctx, task::ListOptions { dates, all })
            }
            Commands::Show { id } => task::run_show(&mut ctx, &id),
            Commands::Edit {
                id,
                title,
                description,
                sticky,
                not_sticky,
            } => {
                let sticky = match (sticky, not_sticky) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                task::run_edit(
                    &mut ctx,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        sticky,
                    },
                )
            }
            Commands::Complete { ids } => task::run_status(&mut ctx, &ids, task::StatusChange::Complete),
            Commands::Incomplete { ids } => {
                task::run_status(&mut ctx, &ids, task::StatusChange::Incomplete)
            }
            Commands::Touch { ids, reactivate } => task::run_touch(&mut ctx, &ids, reactivate),
            Commands::Delete { ids } => task::run_delete(&mut ctx, &ids),
            Commands::Note(cmd) => match cmd {
                NoteCommands::Add { id, markdown } => note::run_add(&mut ctx, &id, markdown),
                NoteCommands::Edit {
                    id,
                    index,
                    markdown,
                } => note::run_edit(&mut ctx, &id, index, markdown),
            },
        };

        // Saves run detached; wait for them before the process exits.
        ctx.store.settle().await;
        result
    }
}
