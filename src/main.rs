//! semafour: operate on named cross-process semaphores from the shell
//!
//! Each invocation opens the semaphore, performs one operation and closes its
//! handle again. `wait` doubles as the peer process in cross-process tests.

use anyhow::{Context, Result};
use clap::Parser;
use futures::channel::oneshot;
use semafour::cli::{Args, Command};
use semafour::Semaphore;
use std::io::Write;
use tracing::{info, Level};

#[compio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging based on verbosity and quiet mode
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting semafour v{}", env!("CARGO_PKG_VERSION"));

    let options = args.command.options().context("Invalid semaphore options")?;
    let name = options.name.clone();

    if let Command::Unlink { .. } = args.command {
        Semaphore::unlink_name(&name).with_context(|| format!("Failed to unlink {name}"))?;
        info!("Unlinked {}", name);
        return Ok(());
    }

    let sem = Semaphore::new(options).with_context(|| format!("Failed to open semaphore {name}"))?;

    match &args.command {
        Command::Create { .. } => {
            info!("Created {}", name);
        }
        Command::Post { .. } => {
            sem.post_sync().context("Failed to post")?;
            info!("Posted {}", name);
        }
        Command::Wait { .. } => {
            // lets a parent process know the wait is about to block
            let mut stdout = std::io::stdout();
            writeln!(stdout, "waiting")?;
            stdout.flush()?;

            let (tx, rx) = oneshot::channel();
            sem.wait(move |result| {
                let _ = tx.send(result);
            });
            rx.await
                .context("Wait continuation dropped")?
                .context("Failed to wait")?;
            info!("Acquired {}", name);
        }
        Command::TryWait { .. } => {
            let acquired = sem.try_wait_sync().context("Failed to try-wait")?;
            println!("{}", if acquired { "acquired" } else { "unavailable" });
        }
        // handled before opening
        Command::Unlink { .. } => {}
    }

    sem.close_sync().context("Failed to close")?;
    Ok(())
}
