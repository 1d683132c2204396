//! Trading Journal CLI
//!
//! Thin presentation layer: every command becomes an intent for the
//! journal's view controller, and its projections are printed back.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trading_journal_core::{
    open_journal, EntryFilter, EntryId, FileBackend, FormFields, ImageSource, Intent,
    JournalConfig, JournalView, Response, SortKey, ViewController,
};

mod output;

#[derive(Parser)]
#[command(name = "journal")]
#[command(about = "Trading Journal - local profit/loss journal")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to the platform config dir, or JOURNAL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Form values shared by `add` and `edit`.
#[derive(clap::Args)]
struct EntryArgs {
    /// Trade date (YYYY-MM-DD)
    #[arg(long)]
    date: String,
    /// Time of day (HH:MM)
    #[arg(long, default_value = "")]
    time: String,
    /// Profit (positive) or loss (negative)
    #[arg(long, allow_hyphen_values = true)]
    amount: String,
    /// What happened
    #[arg(long = "desc")]
    description: String,
    /// Screenshot to attach (repeatable in the trade form)
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    #[arg(long, default_value = "")]
    symbol: String,
    /// long or short
    #[arg(long = "type", default_value = "")]
    trade_type: String,
    #[arg(long, default_value = "")]
    quantity: String,
    #[arg(long, default_value = "")]
    entry_price: String,
    #[arg(long, default_value = "")]
    exit_price: String,
    #[arg(long, default_value = "")]
    strategy: String,
}

impl EntryArgs {
    fn into_form(self) -> FormFields {
        FormFields {
            date: self.date,
            time: self.time,
            amount: self.amount,
            description: self.description,
            symbol: self.symbol,
            trade_type: self.trade_type,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            strategy: self.strategy,
            images: self.images.into_iter().map(ImageSource::from_path).collect(),
        }
    }
}

/// Filter/sort selection shared by `list`, `stats` and `export`.
#[derive(clap::Args)]
struct ViewArgs {
    /// all, profit, loss, today, 7d, 30d, month, year, or FROM..TO
    #[arg(long)]
    filter: Option<EntryFilter>,
    /// date_desc, date_asc, amount_desc, amount_asc
    #[arg(long)]
    sort: Option<SortKey>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new entry
    Add(EntryArgs),
    /// List entries
    List {
        #[command(flatten)]
        view: ViewArgs,
        /// Only entries whose description or symbol contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Replace an entry's fields (images are kept unless new ones are given)
    Edit {
        id: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Delete an entry
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show totals and win rate
    Stats {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Export the current projection as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import entries from a JSON export
    Import { file: PathBuf },
    /// Print the whole journal as JSON
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(JournalConfig::config_file_path);
    let config = JournalConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::debug!(config = %config_path.display(), "config loaded");
    let mut journal = open_journal(&config).context("Failed to open journal")?;

    match cli.command {
        Commands::Add(args) => {
            let dispatched = journal.dispatch(Intent::Submit(args.into_form())).await?;
            report_response(&dispatched.response, cli.json)?;
        }
        Commands::List { view, search } => {
            apply_view(&mut journal, view).await?;
            match search {
                Some(query) => {
                    let found = journal.search(&query);
                    output::print_entries(&found, cli.json)?;
                }
                None => {
                    let entries = journal.current_projection();
                    output::print_view(&journal.render(), &entries, cli.json)?;
                }
            }
        }
        Commands::Edit { id, entry } => {
            let id = EntryId::from(id);
            journal.dispatch(Intent::BeginEdit(id)).await?;
            let dispatched = journal.dispatch(Intent::Submit(entry.into_form())).await?;
            report_response(&dispatched.response, cli.json)?;
        }
        Commands::Delete { id, yes } => {
            let id = EntryId::from(id);
            journal.dispatch(Intent::RequestDelete(id.clone())).await?;
            if !yes {
                journal.dispatch(Intent::CancelDelete).await?;
                bail!("Refusing to delete {id} without --yes");
            }
            let dispatched = journal.dispatch(Intent::ConfirmDelete).await?;
            report_response(&dispatched.response, cli.json)?;
        }
        Commands::Stats { view } => {
            apply_view(&mut journal, view).await?;
            let view: JournalView = journal.render();
            output::print_stats(&view.stats, cli.json)?;
        }
        Commands::Export { view, output } => {
            apply_view(&mut journal, view).await?;
            let dispatched = journal.dispatch(Intent::Export).await?;
            if let Response::Csv(csv) = dispatched.response {
                match output {
                    Some(path) => std::fs::write(&path, csv)
                        .with_context(|| format!("Failed to write {}", path.display()))?,
                    None => print!("{csv}"),
                }
            }
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let committed = journal.store_mut().import_json(&json)?;
            if let Some(warning) = &committed.warning {
                eprintln!("warning: {warning}");
            }
            println!("Imported {} entries", committed.value.len());
        }
        Commands::Dump => println!("{}", journal.store().export_json()?),
    }

    Ok(())
}

async fn apply_view(journal: &mut ViewController<FileBackend>, view: ViewArgs) -> Result<()> {
    if let Some(filter) = view.filter {
        journal.dispatch(Intent::SetFilter(filter)).await?;
    }
    if let Some(sort) = view.sort {
        journal.dispatch(Intent::SetSort(sort)).await?;
    }
    Ok(())
}

fn report_response(response: &Response, json: bool) -> Result<()> {
    match response {
        Response::Saved(outcome) => {
            for failure in &outcome.image_failures {
                eprintln!("warning: image skipped: {failure}");
            }
            if let Some(warning) = &outcome.persist_warning {
                eprintln!("warning: not saved to disk: {warning}");
            }
            output::print_entries(&[&outcome.entry], json)?;
        }
        Response::Deleted { removed, warning } => {
            if let Some(warning) = warning {
                eprintln!("warning: not saved to disk: {warning}");
            }
            println!("{}", if *removed { "Deleted" } else { "Nothing to delete" });
        }
        Response::EditForm(_) | Response::Csv(_) | Response::Updated => {}
    }
    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_env("JOURNAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
