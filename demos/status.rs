//! Session status and event subscription demonstration.
//!
//! Demonstrates:
//! - Connect to a remote end
//! - Query `session.status`
//! - Subscribe to `log.entryAdded` and print entries as they arrive
//! - Disconnect
//!
//! Usage:
//!   cargo run --example status -- --url ws://127.0.0.1:9222/session
//!   cargo run --example status -- --no-wait
//!   cargo run --example status -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use common::Args;
use webdriver_bidi::{Driver, EventReceived, Result};

// ============================================================================
// Constants
// ============================================================================

const LOG_EVENT: &str = "log.entryAdded";

// ============================================================================
// Types
// ============================================================================

/// Subset of a `log.entryAdded` payload.
#[derive(Debug, Deserialize)]
struct LogEntry {
    level: String,
    text: Option<String>,
    #[serde(default)]
    source: Value,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Session status ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Connecting to {}...", args.url);

    let driver = Driver::builder()
        .startup_timeout(Duration::from_secs(10))
        .command_timeout(Duration::from_secs(10))
        .build()?;

    driver.start(&args.url).await?;
    println!("        ✓ Connected\n");

    // ========================================================================
    // Status
    // ========================================================================

    println!("[1] session.status...");
    let session = driver.session()?;
    let status = session.status().await?;
    println!("    ready: {}", status.ready);
    println!("    message: {}", status.message);

    // ========================================================================
    // Events
    // ========================================================================

    println!("\n[2] Subscribing to {LOG_EVENT}...");
    driver.register_event::<LogEntry>(LOG_EVENT);
    driver.event_received().add_observer(|event: &EventReceived| {
        if let Some(entry) = event.payload().downcast_ref::<LogEntry>() {
            let text = entry.text.as_deref().unwrap_or("");
            println!("    [{}] {text} (source: {})", entry.level, entry.source);
        }
    });
    driver.unexpected_error().add_observer(|error: &webdriver_bidi::ErrorResponse| {
        println!("    [unexpected] {}: {}", error.error, error.message);
    });

    match session.subscribe(vec![LOG_EVENT.to_string()]).await {
        Ok(_) => println!("    ✓ Subscribed"),
        Err(e) => println!("    ✗ Subscribe failed: {e}"),
    }

    common::wait_for_exit(args.no_wait).await;

    // ========================================================================
    // Teardown
    // ========================================================================

    println!("\n[Teardown] Disconnecting...");
    driver.stop().await;
    println!("           ✓ Done");

    Ok(())
}
