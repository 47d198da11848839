//! `civic` - drive the civic report core from the command line
//!
//! - `civic demo [--json] [--config <path>]` runs a scripted report, triage
//!   and resolution scenario against an in-memory store
//! - `civic check-config <path>` validates a configuration file

use anyhow::{bail, Context};
use async_trait::async_trait;
use civic_core::{
    AuditRecord, CivicConfig, CivicDesk, Coordinates, DashboardStats, Department,
    GeolocationProvider, ImageBlob, InMemoryIssueStore, IssueReport, IssueStatus, IssueType,
    LocationError, ProgressUpdate, SubmissionError, Urgency,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Position source for the scripted scenario
struct DemoGeolocation;

#[async_trait]
impl GeolocationProvider for DemoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(Coordinates::new(40.712_776, -74.005_974))
    }
}

#[derive(Serialize)]
struct DemoSummary {
    reports: Vec<IssueReport>,
    stats: DashboardStats,
    audit: Vec<AuditRecord>,
    audit_verified: bool,
}

fn cli() -> Command {
    Command::new("civic")
        .version(civic_core::VERSION)
        .about("Civic issue reporting core")
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("demo")
                .about("Run a scripted report, triage and resolution scenario")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate a TOML configuration file")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Configuration file to check"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("demo", args)) => run_demo(args).await,
        Some(("check-config", args)) => check_config(args),
        _ => bail!("unknown command"),
    }
}

fn check_config(args: &ArgMatches) -> anyhow::Result<()> {
    let path = args
        .get_one::<PathBuf>("path")
        .context("missing configuration path")?;
    let config = CivicConfig::load(path)
        .with_context(|| format!("invalid configuration {}", path.display()))?;

    println!("{} is valid", path.display());
    println!("  max_attachments: {}", config.max_attachments);
    println!("  max_image_bytes: {}", config.max_image_bytes);
    println!("  accepted_content_prefix: {}", config.accepted_content_prefix);
    println!("  geolocation_timeout_ms: {}", config.geolocation_timeout_ms);
    println!("  first_tracking_sequence: {}", config.first_tracking_sequence);
    println!("  event_channel_capacity: {}", config.event_channel_capacity);
    Ok(())
}

fn photo(name: &str) -> ImageBlob {
    ImageBlob::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

async fn run_demo(args: &ArgMatches) -> anyhow::Result<()> {
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => CivicConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display()))?,
        None => CivicConfig::default(),
    };
    let json = args.get_flag("json");

    let store = Arc::new(InMemoryIssueStore::new(&config));
    let desk = CivicDesk::new(config, store, Arc::new(DemoGeolocation));
    let mut events = desk.subscribe();

    // Citizen reports a pothole, using the device position
    let shared = desk.new_shared_draft();
    {
        let mut draft = shared.lock();
        draft.set_issue_type(Some(IssueType::Pothole));
        draft.set_urgency(Some(Urgency::High));
        draft.set_location_text("Main St & 1st Ave");
        draft.toggle_recording();
        draft.append_transcript("Large pothole causing traffic issues");
        draft.toggle_recording();
        draft.attachments_mut().add_images(
            ["front.jpg", "side.jpg", "wide.jpg", "extra.jpg"].map(photo),
        );
    }
    let located = desk
        .location_resolver()
        .spawn_for(&shared)
        .await
        .context("location lookup task failed")?;
    tracing::info!(?located, "location lookup finished");

    let pothole = {
        let mut draft = shared.lock();
        desk.submit(&mut draft)?
    };
    tracing::info!("{}", pothole.message());

    // A second report is rejected until its urgency is chosen
    let mut graffiti = desk.new_draft();
    graffiti.set_issue_type(Some(IssueType::Graffiti));
    graffiti.set_location_text("Central Park east wall");
    graffiti.set_description("Fresh tagging on the mural");
    match desk.submit(&mut graffiti) {
        Err(SubmissionError::Validation(err)) => tracing::info!(%err, "report rejected"),
        other => bail!("expected a validation error, got {other:?}"),
    }
    graffiti.set_urgency(Some(Urgency::Low));
    let graffiti = desk.submit(&mut graffiti)?;

    // Triage and work
    let id = &pothole.tracking_id;
    desk.assign(id, Department::StreetMaintenance, "Routed to roads crew")?;
    desk.apply_update(
        id,
        ProgressUpdate::new()
            .with_status(IssueStatus::InProgress)
            .with_note("Crew dispatched"),
    )?;
    // The report already holds three photos, so this one is dropped with a warning
    desk.apply_update(
        id,
        ProgressUpdate::new()
            .with_status("completed".parse()?)
            .with_note("Pothole filled and compacted")
            .with_attachments(vec![photo("after.jpg")]),
    )?;
    desk.assign(&graffiti.tracking_id, Department::ParksAndRecreation, "")?;

    while let Ok(event) = events.try_recv() {
        tracing::debug!(tracking_id = %event.tracking_id(), "{}", event.message());
    }

    let summary = DemoSummary {
        reports: desk.issues(&Default::default()),
        stats: desk.stats(),
        audit: desk.audit().records(),
        audit_verified: desk.audit().verify_integrity().is_ok(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &DemoSummary) {
    for report in &summary.reports {
        println!(
            "#{}  {}  [{}]  {}",
            report.tracking_id(),
            report.issue_type(),
            report.urgency(),
            report.status()
        );
        println!("  location:   {}", report.location());
        println!("  department: {}", report.department().map_or("unassigned", |d| d.label()));
        println!("  photos:     {}", report.attachments().len());
        for entry in report.progress_log() {
            match &entry.note {
                Some(note) => println!("  - {} -> {}: {}", entry.from, entry.to, note),
                None => println!("  - {} -> {}", entry.from, entry.to),
            }
        }
        println!();
    }

    println!("Total: {}", summary.stats.total);
    for (status, count) in &summary.stats.by_status {
        println!("  {status}: {count}");
    }
    println!(
        "Audit: {} record(s), chain {}",
        summary.audit.len(),
        if summary.audit_verified { "intact" } else { "BROKEN" }
    );
}
