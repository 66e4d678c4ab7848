use clap::Parser;
use fairybrowser::windows::NoWindows;
use fairybrowser::{
    acquire_page, default_resolver, BrowserIdentity, BrowserKind, DEFAULT_SESSION_NAME,
};
use tracing::info;

/// Attach to (or launch) a local browser session and report its active page.
#[derive(Parser)]
#[command(name = "fairybrowser")]
struct Cli {
    /// Logical session name
    #[arg(long, default_value = DEFAULT_SESSION_NAME)]
    name: String,

    /// Browser kind: chromium or edge
    #[arg(long, default_value = "chromium")]
    kind: BrowserKind,

    /// List live sessions instead of resolving one
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let resolver = default_resolver()?;

    if cli.list {
        for state in resolver.registry().list_all()? {
            println!("{}", state);
        }
        return Ok(());
    }

    let identity = BrowserIdentity::new(cli.name, cli.kind);
    info!(%identity, "resolving session");

    let (_browser, tab) = acquire_page(&resolver, &NoWindows, Some(&identity))?;
    let title = tab.get_title().unwrap_or_default();
    println!("Active page: {}", title);

    Ok(())
}
