use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use pawcare::availability::DemoAvailability;
use pawcare::catalog::sample_services;
use pawcare::config::BookingConfig;
use pawcare::store::LibSqlBackend;
use pawcare::terminal::{self, Command};
use pawcare::wizard::BookingWizard;

#[tokio::main]
async fn main() -> pawcare::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = BookingConfig::from_env();

    eprintln!("🐾 PawCare v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Type 'help' for commands, 'quit' to exit.\n");

    // ── Database ─────────────────────────────────────────────────────────
    let db = Arc::new(LibSqlBackend::new_local(&config.db_path).await.map_err(|e| {
        eprintln!(
            "Error: Failed to open database at {}: {}",
            config.db_path.display(),
            e
        );
        e
    })?);

    if !db.has_services().await? {
        db.seed_services(&sample_services()).await?;
    }

    let availability = Arc::new(DemoAvailability::from_config(&config));
    let mut wizard = BookingWizard::new(db.clone(), availability, db, config);

    println!("{}", terminal::draw(&wizard.render().await?));
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{msg}");
                eprint!("> ");
                continue;
            }
        };

        match terminal::execute(&mut wizard, command).await {
            Ok(status) if !status.is_empty() => println!("{status}"),
            Ok(_) => {}
            Err(e) => eprintln!("{}", terminal::describe_error(&e)),
        }

        match wizard.render().await {
            Ok(screen) => println!("{}", terminal::draw(&screen)),
            Err(e) => eprintln!("{}", terminal::describe_error(&e)),
        }
        eprint!("> ");
    }

    eprintln!("Goodbye!");
    Ok(())
}
