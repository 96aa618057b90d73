//! CLI interface for scholar

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::content::{ContentCatalog, ContentLibrary};

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "Self-paced technical learning server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Bind address (defaults to config)
        #[arg(long, env = "SCHOLAR_HOST")]
        host: Option<String>,
        /// Bind port (defaults to config)
        #[arg(long, env = "SCHOLAR_PORT")]
        port: Option<u16>,
        /// Serve over HTTPS
        #[arg(long)]
        https: bool,
        /// TLS certificate path (PEM)
        #[arg(long)]
        cert: Option<String>,
        /// TLS private key path (PEM)
        #[arg(long)]
        key: Option<String>,
    },
    /// Inspect and validate content files
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ContentCommands {
    /// Load the catalog, manifest, and every document; report problems
    Validate,
    /// List catalog modules and sections
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Generate a new JWT secret, invalidating existing tokens
    RotateSecret,
    /// Set or update a user's password
    SetPassword {
        username: String,
        password: String,
    },
}

/// CLI entry point. No subcommand starts the server with config defaults.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => crate::server::start(None, None, false, None, None).await,
        Some(Commands::Serve {
            host,
            port,
            https,
            cert,
            key,
        }) => crate::server::start(host, port, https, cert, key).await,
        Some(Commands::Content { command }) => match command {
            ContentCommands::Validate => validate_content(),
            ContentCommands::List => list_content(),
        },
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => config::show_config(),
            ConfigCommands::RotateSecret => config::rotate_jwt_secret(),
            ConfigCommands::SetPassword { username, password } => {
                config::set_password(&username, &password)
            }
        },
    }
}

fn validate_content() -> Result<()> {
    let config = Config::load()?;

    let catalog = ContentCatalog::load(&config.content.catalog_path)?;
    println!(
        "✓ Catalog {}: {} modules, {} sections",
        config.content.catalog_path.display(),
        catalog.modules.len(),
        catalog.section_count()
    );

    let library = ContentLibrary::new(
        config.content.manifest_path.clone(),
        config.content.content_root.clone(),
    );
    let manifest = library.manifest()?;
    println!(
        "✓ Manifest {}: version {}, {} modules",
        config.content.manifest_path.display(),
        manifest.version,
        manifest.modules.len()
    );

    let documents = library.all_documents(None, None)?;
    println!("✓ Documents: {} loaded", documents.len());

    Ok(())
}

fn list_content() -> Result<()> {
    let config = Config::load()?;
    let catalog = ContentCatalog::load(&config.content.catalog_path)?;

    for module in &catalog.modules {
        println!(
            "{} — {} [{}]",
            module.id,
            module.title,
            module.min_level.as_deref().unwrap_or("any level")
        );
        for section in &module.sections {
            let mut notes = Vec::new();
            if !section.target_os.is_empty() {
                notes.push(section.target_os.join("/"));
            }
            if section.has_questions() {
                notes.push(format!("{} questions", section.questions.len()));
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            println!("  {} — {}{}", section.id, section.title, suffix);
        }
    }

    Ok(())
}
