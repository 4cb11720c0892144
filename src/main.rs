//! # notekeeper CLI (`notes`)
//!
//! Creates, lists, reads, edits, and deletes plain-text notes under the
//! configured notes root, and runs the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! notes --config ./config.json <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `notes create <name>` | Create a note (date-stamped by default) |
//! | `notes list [dir]` | List notes and subdirectories |
//! | `notes show <name>` | Print a note |
//! | `notes write <name>` | Replace a note's text from `--text` or stdin |
//! | `notes edit <name>` | Open a note in `$EDITOR` |
//! | `notes delete <name>` | Delete a note |
//! | `notes config` | Show or edit the config file |
//! | `notes serve` | Start the HTTP server |
//! | `notes completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Create a note and open it right away
//! notes create groceries --open
//!
//! # Notes in a subdirectory
//! notes create standup --dir work --text "blocked on review"
//! notes list work
//!
//! # Pipe text into a note
//! echo "call back Tuesday" | notes write reminders
//!
//! # Serve the notes root over HTTP
//! PROXYAUTH=s3cret notes serve
//! ```

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use notekeeper::config;
use notekeeper::editor::{editor_command, open_in_editor};
use notekeeper::error::NoteError;
use notekeeper::logging::setup_logging;
use notekeeper::notes::NoteStore;
use notekeeper::server;

/// Environment variable holding the server's shared secret.
const SECRET_ENV: &str = "PROXYAUTH";

/// notekeeper — plain-text notes from the command line or over HTTP.
///
/// All commands accept a `--config` flag pointing to a JSON configuration
/// file. The file is created with defaults if it does not exist.
#[derive(Parser)]
#[command(
    name = "notes",
    about = "notekeeper — plain-text notes from the command line or over HTTP",
    version
)]
struct Cli {
    /// Path to the configuration file (JSON).
    #[arg(long, global = true, default_value = "./config.json")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new note.
    ///
    /// A name without an extension gets the configured one appended. When
    /// `options.dateStamp` is on, the note starts with today's date.
    Create {
        name: String,

        /// Subdirectory of the notes root.
        #[arg(long, default_value = "")]
        dir: String,

        /// Initial text, written after the date stamp.
        #[arg(long)]
        text: Option<String>,

        /// Open the new note in `$EDITOR`.
        #[arg(long)]
        open: bool,
    },

    /// List the entries of a directory under the notes root.
    List {
        /// Subdirectory to list (defaults to the root).
        dir: Option<String>,
    },

    /// Print a note.
    Show {
        name: String,
        #[arg(long, default_value = "")]
        dir: String,
    },

    /// Replace a note's text, creating it if needed.
    ///
    /// Reads the text from stdin when `--text` is not given.
    Write {
        name: String,
        #[arg(long, default_value = "")]
        dir: String,
        #[arg(long)]
        text: Option<String>,
    },

    /// Open an existing note in `$EDITOR`.
    Edit {
        name: String,
        #[arg(long, default_value = "")]
        dir: String,
    },

    /// Delete a note.
    Delete {
        name: String,
        #[arg(long, default_value = "")]
        dir: String,
    },

    /// Print the config file, or open it in `$EDITOR`.
    Config {
        #[arg(long)]
        open: bool,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `server.bind` from the config. The shared secret is read from
    /// the `PROXYAUTH` environment variable.
    Serve,

    /// Print a shell completion script.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "notes", &mut std::io::stdout());
        return Ok(());
    }

    let existed = cli.config.exists();
    let cfg = config::load_config(&cli.config)?;

    let log_dir = match cli.command {
        Commands::Serve => cfg.log_dir(),
        _ => None,
    };
    let _guard = setup_logging(cli.verbose, log_dir.as_deref())?;

    if !existed {
        tracing::info!(path = %cli.config.display(), "created default config file");
    }

    let store = NoteStore::from_config(&cfg);

    match cli.command {
        Commands::Create {
            name,
            dir,
            text,
            open,
        } => {
            store.create(&dir, &name, text.as_deref().unwrap_or_default())?;
            let path = store.resolve(&dir, &name)?;
            println!("Created {}", path.display());
            if open {
                open_in_editor(&editor_command(), &path)?;
            }
        }
        Commands::List { dir } => {
            for name in store.list(dir.as_deref().unwrap_or_default())? {
                println!("{}", name);
            }
        }
        Commands::Show { name, dir } => {
            let note = store.read(&dir, &name)?;
            print!("{}", note.text);
            if !note.text.ends_with('\n') {
                println!();
            }
        }
        Commands::Write { name, dir, text } => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read note text from stdin")?;
                    buf
                }
            };
            store.update(&dir, &name, &text)?;
            println!("Saved {}", store.resolve(&dir, &name)?.display());
        }
        Commands::Edit { name, dir } => {
            let path = store.resolve(&dir, &name)?;
            if !path.is_file() {
                return Err(NoteError::NotFound(path).into());
            }
            open_in_editor(&editor_command(), &path)?;
        }
        Commands::Delete { name, dir } => {
            let path = store.delete(&dir, &name)?;
            println!("Deleted {}", path.display());
        }
        Commands::Config { open } => {
            let path = cfg.source_path();
            if open {
                open_in_editor(&editor_command(), path)?;
            } else {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                println!("# {}", path.display());
                print!("{}", text);
                if !text.ends_with('\n') {
                    println!();
                }
            }
        }
        Commands::Serve => {
            let secret = std::env::var(SECRET_ENV).unwrap_or_default();
            server::run_server(&cfg, &secret).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
