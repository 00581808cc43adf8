//! customerio - CLI tool for the Customer.io Track API
//!
//! This tool provides commands for:
//! - Checking the configured credentials
//! - Identifying (creating/updating) a customer
//! - Deleting a customer
//! - Tracking an event for a customer
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/customerio/config.toml (~/.config/customerio/config.toml)
//! - Logs: $XDG_STATE_HOME/customerio/customerio.log (~/.local/state/customerio/customerio.log)

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use customerio_core::{AttributeValue, Attributes, Config, CustomerIo};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "customerio")]
#[command(about = "Send customer data and events to Customer.io")]
#[command(version)]
struct Args {
    /// Verbose output (writes a log file)
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of the XDG default
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show Track API configuration
    Status,

    /// Create or update a customer
    Identify {
        /// Customer ID
        #[arg(long)]
        id: Option<String>,

        /// Customer email
        #[arg(long)]
        email: Option<String>,

        /// Extra attribute as KEY=VALUE (VALUE parsed as JSON when possible)
        #[arg(short, long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,

        /// Date attribute as KEY=RFC3339, sent as Unix seconds
        #[arg(short, long = "date", value_name = "KEY=RFC3339")]
        dates: Vec<String>,
    },

    /// Delete a customer
    Remove {
        /// Customer ID
        customer_id: String,
    },

    /// Track an event for a customer
    Track {
        /// Customer ID
        customer_id: String,

        /// Event name
        event_name: String,

        /// Event property as KEY=VALUE (VALUE parsed as JSON when possible)
        #[arg(short, long = "prop", value_name = "KEY=VALUE")]
        props: Vec<String>,

        /// Date property as KEY=RFC3339, sent as Unix seconds
        #[arg(short, long = "date", value_name = "KEY=RFC3339")]
        dates: Vec<String>,

        /// Event type, e.g. "page"
        #[arg(short = 't', long = "type")]
        event_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(
            customerio_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };

    tracing::debug!(
        endpoint = %config.track.endpoint,
        ready = config.track.is_ready(),
        "configuration loaded"
    );

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Identify {
            id,
            email,
            attrs,
            dates,
        } => cmd_identify(&config, id, email, &attrs, &dates).await,
        Command::Remove { customer_id } => cmd_remove(&config, &customer_id).await,
        Command::Track {
            customer_id,
            event_name,
            props,
            dates,
            event_type,
        } => {
            cmd_track(
                &config,
                &customer_id,
                &event_name,
                &props,
                &dates,
                event_type.as_deref(),
            )
            .await
        }
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Customer.io Track API Configuration");
    println!("===================================");
    println!();

    let track = &config.track;

    println!("Config File:     {}", Config::config_path().display());
    println!("Log File:        {}", Config::log_path().display());
    println!("Endpoint:        {}", track.endpoint);
    println!(
        "Site ID:         {}",
        track.site_id.as_deref().unwrap_or("<not set>")
    );
    println!(
        "API Key:         {}",
        if track.api_key.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );

    println!();
    if track.is_ready() {
        println!("Status: Ready");
    } else {
        println!("Status: Not configured. Add credentials to config.toml:");
        println!();
        println!("  [track]");
        println!("  site_id = \"your-site-id\"");
        println!("  api_key = \"your-api-key\"");
    }

    Ok(())
}

async fn cmd_identify(
    config: &Config,
    id: Option<String>,
    email: Option<String>,
    attrs: &[String],
    dates: &[String],
) -> Result<()> {
    let client = build_client(config)?;

    let mut attributes = parse_attributes(attrs, dates)?;
    if let Some(id) = id {
        attributes.insert("id", id);
    }
    if let Some(email) = email {
        attributes.insert("email", email);
    }

    client
        .identify(attributes)
        .await
        .context("identify failed")?;

    println!("Identified customer");
    Ok(())
}

async fn cmd_remove(config: &Config, customer_id: &str) -> Result<()> {
    let client = build_client(config)?;

    client
        .remove(customer_id)
        .await
        .context("remove failed")?;

    println!("Removed customer {}", customer_id);
    Ok(())
}

async fn cmd_track(
    config: &Config,
    customer_id: &str,
    event_name: &str,
    props: &[String],
    dates: &[String],
    event_type: Option<&str>,
) -> Result<()> {
    let client = build_client(config)?;
    let properties = parse_attributes(props, dates)?;

    client
        .track(customer_id, event_name, properties, event_type)
        .await
        .context("track failed")?;

    println!("Tracked {} for customer {}", event_name, customer_id);
    Ok(())
}

fn build_client(config: &Config) -> Result<CustomerIo> {
    CustomerIo::from_config(&config.track)
        .context("Track API is not configured. Run 'status' for details")
}

/// Build attributes from `KEY=VALUE` and `KEY=RFC3339` arguments
fn parse_attributes(pairs: &[String], dates: &[String]) -> Result<Attributes> {
    let mut attributes = Attributes::new();

    for pair in pairs {
        let (key, raw) = split_pair(pair)?;
        attributes.insert(key, parse_value(raw));
    }

    for pair in dates {
        let (key, raw) = split_pair(pair)?;
        let at = DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid RFC 3339 date for {}: {}", key, raw))?
            .with_timezone(&Utc);
        attributes.insert(key, at);
    }

    Ok(attributes)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(anyhow!("expected KEY=VALUE, got {:?}", pair)),
    }
}

/// JSON when it parses, otherwise the raw string
fn parse_value(raw: &str) -> AttributeValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(AttributeValue::from)
        .unwrap_or_else(|_| AttributeValue::from(raw))
}
