use chrono::Local;
use clap::{Parser, Subcommand};
use labor_board::{
    ClickTarget, ClientConfig, DuplicatePolicy, HeadlessPage, Page, PageController, PageEvent,
    models::{CountAction, SelectedFile},
};
use std::{path::PathBuf, str::FromStr, time::Duration};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "labor_board")]
#[command(about = "Drive the labor board page from a terminal")]
struct Cli {
    /// Backend base URL (overrides LABOR_BOARD_URL)
    #[arg(long)]
    url: Option<String>,

    /// Value of the date input (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Request timeout in seconds (overrides LABOR_BOARD_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Reload the board after a successful assignment
    #[arg(long)]
    reload_after_assign: bool,

    /// Treat `"status": "error"` bodies as rejections
    #[arg(long)]
    honor_body_status: bool,

    /// allow, cancel-previous or ignore-new (overrides LABOR_BOARD_DUPLICATES)
    #[arg(long, value_parser = DuplicatePolicy::from_str)]
    duplicates: Option<DuplicatePolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a schedule export (CSV or Excel)
    Upload { path: PathBuf },
    /// Switch the board to another date
    Goto { date: String },
    /// Add one slot to a position
    Add { position: String },
    /// Remove one slot from a position
    Remove { position: String },
    /// Assign an associate to a position on the selected date
    Assign { position: String, associate: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config.reload_after_assignment |= cli.reload_after_assign;
    config.honor_body_status |= cli.honor_body_status;
    if let Some(policy) = cli.duplicates {
        config.duplicate_policy = policy;
    }

    let date = cli
        .date
        .unwrap_or_else(|| Local::now().date_naive().to_string());
    let page = HeadlessPage::new().with_date(date);

    if let Commands::Upload { path } = &cli.command {
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        page.set_file(Some(SelectedFile::new(name, bytes)));
    }
    if let Commands::Goto { date } = &cli.command {
        page.set_date(date.clone());
    }

    let controller = PageController::attach(page, config)?;

    let outcome = match &cli.command {
        Commands::Upload { .. } => controller.dispatch(PageEvent::UploadClicked).await,
        Commands::Goto { .. } => controller.dispatch(PageEvent::GoClicked).await,
        Commands::Add { position } => {
            let target = ClickTarget::count_button(position, CountAction::Add);
            controller.dispatch(PageEvent::GridClicked(target)).await
        }
        Commands::Remove { position } => {
            let target = ClickTarget::count_button(position, CountAction::Remove);
            controller.dispatch(PageEvent::GridClicked(target)).await
        }
        Commands::Assign {
            position,
            associate,
        } => controller.update_position(position, associate).await,
    };

    let status = controller.page().status();
    if let Some((text, _)) = &status {
        println!("{text}");
    }

    let page = controller.page();
    if page.location().is_some() || page.reload_count() > 0 {
        let date = page.date_value();
        match controller.api().fetch_board(Some(&date)).await {
            Ok(html) => info!("board for {date} loaded ({} bytes)", html.len()),
            Err(err) => warn!("failed to load board for {date}: {err}"),
        }
    }

    if !outcome.is_success() {
        return Err(outcome.to_string().into());
    }
    if status.is_none() {
        println!("{outcome}");
    }
    Ok(())
}
