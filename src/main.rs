use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tackboard::board::models::CardRequest;
use tackboard::board::ordering::DropTarget;
use tackboard::board::views::CardFilter;
use tackboard::config::BoardConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "tackboard")]
#[command(version, about = "Single-board kanban tracker: server and command-line client")]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./tackboard.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Board server URL for client commands. Overrides config and TACKBOARD_URL.
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the board server
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Directory holding the built frontend
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Enable dev mode (CORS permissive for a separate frontend dev server)
        #[arg(long)]
        dev: bool,

        /// Reject a whole reorder batch when any entry names a missing row
        #[arg(long)]
        strict: bool,

        /// Open the board in a browser once the server is up
        #[arg(long)]
        open: bool,
    },
    /// Create and migrate the database, then exit
    Init {
        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Print the board
    Show {
        /// Only cards assigned to this member id
        #[arg(long)]
        assignee: Option<i64>,

        /// Only cards due today or in the "Today" column
        #[arg(long)]
        today: bool,

        /// Only cards whose title, description or tags contain this text
        #[arg(long)]
        search: Option<String>,

        /// Keep re-fetching on the configured poll interval
        #[arg(long)]
        watch: bool,
    },
    /// Add a card at the end of a column
    AddCard {
        column_id: i64,
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Member id to assign
        #[arg(long)]
        assignee: Option<i64>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Move a card, as if dragged and dropped
    MoveCard {
        card_id: i64,

        /// Drop at the end of this column
        #[arg(long, conflicts_with = "before_card", required_unless_present = "before_card")]
        to_column: Option<i64>,

        /// Drop onto this card, taking its position and column
        #[arg(long)]
        before_card: Option<i64>,
    },
    /// Move a column to a zero-based position
    MoveColumn { column_id: i64, position: usize },
    /// Download the board as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// View, validate or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default tackboard.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = BoardConfig::resolve(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    let _log_guard = tackboard::logging::init_logging(&config.logging);
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Serve {
            port,
            host,
            db_path,
            static_dir,
            dev,
            strict,
            open,
        } => {
            cmd::cmd_serve(
                &config,
                cmd::ServeOverrides {
                    port,
                    host,
                    db_path,
                    static_dir,
                    dev,
                    strict,
                    open,
                },
            )
            .await?;
        }
        Commands::Init { db_path } => cmd::cmd_init(&config, db_path)?,
        Commands::Show {
            assignee,
            today,
            search,
            watch,
        } => {
            let client = cmd::board_client(&config, cli.url.as_deref())?;
            let filter = CardFilter {
                assignee,
                due_today: today,
                search,
            };
            cmd::cmd_show(&client, &config, &filter, watch).await?;
        }
        Commands::AddCard {
            column_id,
            title,
            description,
            assignee,
            tags,
            due,
        } => {
            let client = cmd::board_client(&config, cli.url.as_deref())?;
            let req = CardRequest {
                column_id: Some(column_id),
                title: Some(title),
                description,
                assignee_id: assignee,
                tags: (!tags.is_empty()).then_some(tags),
                due_date: due,
                ..Default::default()
            };
            cmd::cmd_add_card(&client, req).await?;
        }
        Commands::MoveCard {
            card_id,
            to_column,
            before_card,
        } => {
            let target = match (to_column, before_card) {
                (Some(column_id), _) => DropTarget::Column(column_id),
                (None, Some(over_id)) => DropTarget::Card(over_id),
                (None, None) => anyhow::bail!("Either --to-column or --before-card is required"),
            };
            let client = cmd::board_client(&config, cli.url.as_deref())?;
            cmd::cmd_move_card(&client, card_id, target).await?;
        }
        Commands::MoveColumn {
            column_id,
            position,
        } => {
            let client = cmd::board_client(&config, cli.url.as_deref())?;
            cmd::cmd_move_column(&client, column_id, position).await?;
        }
        Commands::Export { output } => {
            let client = cmd::board_client(&config, cli.url.as_deref())?;
            cmd::cmd_export(&client, output.as_deref()).await?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(&config, cli.config.as_deref(), command)?;
        }
    }

    Ok(())
}
