use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use gig::Store;
use std::fs::File;
use std::path::PathBuf;

/// Fixed export filename, written to the current working directory.
const EXPORT_FILE: &str = "gigHistory.json";

#[derive(Parser)]
#[command(name = "gig")]
#[command(about = "Log the things you got done, by category")]
#[command(version)]
struct Cli {
    /// Path to the database file (default: platform data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new category to store done tasks
    New {
        /// Category name (multiple words are joined with spaces)
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Add a done task to its category
    Add {
        /// Category the task belongs to
        category: String,

        /// What you got done
        description: String,
    },

    /// List categories, or the tasks of one category
    List {
        /// Category whose tasks to list
        category: Option<String>,
    },

    /// Export all categories and tasks to gigHistory.json
    Export,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gig")
        .join("gig.db")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    let mut store = Store::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match cli.command {
        Commands::New { name } => {
            let name = name.join(" ");
            let category = store
                .create_category(&name)
                .with_context(|| format!("Error while creating the \"{name}\" category"))?;
            println!(
                "{} Created new category \"{}\" with ID {}",
                "✓".green(),
                category.name.cyan(),
                category.id
            );
        }

        Commands::Add { category, description } => {
            let task = store
                .create_task(&category, &description)
                .with_context(|| format!("Error while creating task \"{description}\""))?;
            println!("{} Created new task {} successfully", "✓".green(), task.id);
        }

        Commands::List { category: Some(category) } => {
            if !store.category_exists(&category)? {
                println!("This category does not exist.");
                return Ok(());
            }
            let tasks = store.list_tasks(&category).context("Failed to list tasks")?;
            if tasks.is_empty() {
                println!("{}", "You don't have tasks yet.".dimmed());
            } else {
                println!("You have the following tasks:");
                for task in tasks {
                    println!(
                        "{} {} {}",
                        format!("{}.", task.id).cyan(),
                        task.description,
                        task.created.dimmed()
                    );
                }
            }
        }

        Commands::List { category: None } => {
            let categories = store.list_categories().context("Failed to list categories")?;
            if categories.is_empty() {
                println!("{}", "You have no categories.".dimmed());
            } else {
                println!("You have the following categories:");
                for (i, category) in categories.iter().enumerate() {
                    println!("{} {}", format!("{}.", i + 1).cyan(), category.name);
                }
            }
        }

        Commands::Export => {
            let data = store.export_data().context("Failed to export database")?;
            let file = File::create(EXPORT_FILE)
                .with_context(|| format!("Failed to create {EXPORT_FILE}"))?;
            serde_json::to_writer_pretty(file, &data).context("Failed to write export file")?;
            println!(
                "Your database history was written to {} successfully.",
                EXPORT_FILE.cyan()
            );
        }
    }

    Ok(())
}
