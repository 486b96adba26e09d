use clap::Parser;
use shuffle_reel::session::{Key, KeyEvent, NavigationSession, SessionEvent};
use shuffle_reel::{Scanner, SourceType};
use tokio::io::{AsyncBufReadExt, BufReader};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting page scan for: {}", args.document.display());

    let mut scanner = Scanner::new(SourceType::File(args.document.clone()));
    if let Some(path) = &args.config {
        scanner = match scanner.with_config_file(path) {
            Ok(scanner) => scanner,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return;
            }
        };
    }
    if let Some(interval) = args.interval {
        scanner = scanner.with_poll_interval(interval);
    }
    if let Some(base_url) = &args.base_url {
        scanner = scanner.with_base_url(base_url.clone());
    }

    let handle = scanner.spawn();
    handle.start().await;

    // One retrieval populates the whole session; the shuffled order
    // stands until the program exits.
    let candidates = handle.retrieve_candidates().await;
    ::log::info!("Retrieved {} candidates", candidates.len());

    let mut session = NavigationSession::new(candidates);
    println!("{}", session.render_at(0));
    println!("[p]revious / [n]ext / [open] / [q]uit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let key = match line.trim() {
            "p" | "left" => Key::Left,
            "n" | "right" => Key::Right,
            "o" | "open" => Key::Confirm,
            "q" | "quit" => break,
            _ => Key::Other,
        };

        match session.handle_key(KeyEvent {
            key,
            composing: false,
        }) {
            Some(SessionEvent::Rendered(frame)) => println!("{frame}"),
            Some(SessionEvent::Navigate(link)) => println!("Opening {link}"),
            None => {}
        }
    }

    handle.shutdown().await;
}
