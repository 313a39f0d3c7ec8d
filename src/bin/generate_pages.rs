// Create/refresh page definitions: one file per view of the configured schema.

use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;

use db_peeker::utils::datasource::create_connector;
use db_peeker::{init_tracing, Config, PageGenerator};

#[derive(Parser)]
#[command(name = "generate_pages")]
#[command(about = "Write one db-peeker page per database view", long_about = None)]
struct Cli {
    /// Directory the page files go to (defaults to PAGES_DIR)
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Schema to enumerate (defaults to PEEKER_SCHEMA, or dmd on SQL Server)
    #[arg(long)]
    schema: Option<String>,

    /// Also write pages for base tables, not only views
    #[arg(long, default_value_t = false)]
    include_tables: bool,

    /// Print what would be written without touching the filesystem
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing()?;

    let config = Config::from_env()?;
    let connector = create_connector(&config.datasource).await?;

    let generator = PageGenerator::new(
        cli.pages_dir.unwrap_or_else(|| config.pages_dir.clone()),
        cli.schema.or_else(|| config.schema.clone()),
    )
    .include_tables(cli.include_tables);

    if cli.dry_run {
        for page in generator.plan(connector.as_ref()).await? {
            println!("would write {} ({})", page.path.display(), page.definition.object);
        }
        return Ok(());
    }

    let pages = generator.run(connector.as_ref()).await?;
    for page in &pages {
        println!("✓ {}", page.path.display());
    }

    println!("\nDone. {} page(s) in {}. Restart db-peeker to pick up new pages.",
        pages.len(),
        generator.pages_dir().display()
    );
    Ok(())
}
