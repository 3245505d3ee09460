use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use hg_sdk::{parse_timestamp, HeritageGraph, HgConfig, Timestamp, Uri};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = HgConfig::load(cli.config.as_deref())?;
    if let Some(log) = cli.log {
        config.store.log_path = log;
    }
    let format = cli.format;
    match cli.command {
        Command::Ingest(args) => cmd_ingest(config, args, format),
        Command::Render(args) => cmd_render(config, args, format),
        Command::Generate(args) => cmd_generate(config, args, format).await,
        Command::Aliases(args) => cmd_aliases(config, args, format),
        Command::Verify(_) => cmd_verify(config, format),
    }
}

fn open(config: HgConfig) -> anyhow::Result<HeritageGraph> {
    let log_path = config.store.log_path.clone();
    let (graph, replay) = HeritageGraph::open(config)
        .with_context(|| format!("opening fact log {}", log_path.display()))?;
    if replay.skipped > 0 || replay.truncated_tail {
        eprintln!(
            "{} fact log has {} damaged entries{}; run {} for details",
            "!".yellow().bold(),
            replay.skipped,
            if replay.truncated_tail { " and a torn tail" } else { "" },
            "hg verify".bold()
        );
    }
    Ok(graph)
}

fn as_of(raw: Option<&str>) -> anyhow::Result<Timestamp> {
    match raw {
        Some(raw) => Ok(parse_timestamp(raw)?),
        None => Ok(chrono::Utc::now()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_ingest(config: HgConfig, args: IngestArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open(config)?;
    let mut reports = Vec::new();
    for path in &args.files {
        let report = graph.ingest_path(path)?;
        if format == OutputFormat::Text {
            println!(
                "{} {}: {} records, {} accepted ({} entities, {} facts, {} same-as, {} retractions)",
                "✓".green().bold(),
                path.display().to_string().bold(),
                report.lines,
                report.accepted(),
                report.entities,
                report.facts,
                report.same_as,
                report.retractions
            );
            for failure in &report.failures {
                println!("  {} line {}: {}", "✗".red(), failure.line, failure.error);
            }
        }
        reports.push(report);
    }
    match format {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Text => {
            println!("Epoch: {}", graph.epoch().to_string().cyan());
            Ok(())
        }
    }
}

fn cmd_render(config: HgConfig, args: RenderArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open(config)?;
    let uri = Uri::parse(&args.uri)?;
    let document = graph.render(&uri, &as_of(args.as_of.as_deref())?)?;
    match format {
        OutputFormat::Json => print_json(&document),
        OutputFormat::Text => {
            print!("{}", document.body);
            Ok(())
        }
    }
}

async fn cmd_generate(
    config: HgConfig,
    args: GenerateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let graph = open(config)?;
    let as_of = as_of(args.as_of.as_deref())?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let outcome = graph.generate(as_of, args.out, args.workers, cancel).await?;
    if format == OutputFormat::Json {
        return print_json(&outcome);
    }

    let run = &outcome.run;
    let mark = if run.cancelled
        || !run.failures.is_empty()
        || !outcome.flush.failures.is_empty()
    {
        "!".yellow().bold()
    } else {
        "✓".green().bold()
    };
    println!(
        "{} Rendered {} documents into {} files under {}",
        mark,
        run.rendered.to_string().bold(),
        outcome.flush.files,
        outcome.output_dir.display().to_string().bold()
    );
    println!("  Epoch: {}  Classes: {}", run.epoch.to_string().cyan(), run.classes);
    for collision in &outcome.flush.collisions {
        println!(
            "  {} {} holds {} entities",
            "grouped:".yellow(),
            collision.path.display(),
            collision.uris.len()
        );
    }
    for failure in &run.failures {
        println!("  {} {}: {}", "✗".red(), failure.uri, failure.error);
    }
    for failure in &outcome.flush.failures {
        println!(
            "  {} {} ({} documents): {}",
            "✗".red(),
            failure.path.display(),
            failure.uris.len(),
            failure.error
        );
    }
    if run.cancelled {
        println!("  {} cancelled, {} classes skipped", "!".yellow(), run.skipped);
    }
    Ok(())
}

fn cmd_aliases(config: HgConfig, args: AliasesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = open(config)?;
    let report = graph.aliases(&Uri::parse(&args.uri)?)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    println!("Canonical: {}", report.canonical.to_string().cyan().bold());
    if let Some(primary_type) = &report.primary_type {
        println!("Type: {}", primary_type.yellow());
    }
    for alias in &report.aliases {
        let marker = if *alias == report.uri { "*".green().bold() } else { " ".normal() };
        println!("{marker} {alias}");
    }
    Ok(())
}

fn cmd_verify(config: HgConfig, format: OutputFormat) -> anyhow::Result<()> {
    let report = HeritageGraph::verify_log(&config.store.log_path)?;
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    let healthy = report.skipped == 0 && !report.truncated_tail && report.rejected == 0;
    if healthy {
        println!("{} {} records, no issues.", "✓".green().bold(), report.applied);
    } else {
        println!("{} {} records applied", "!".yellow().bold(), report.applied);
        println!("  Rejected on replay: {}", report.rejected);
        println!("  Skipped (CRC or decode): {}", report.skipped);
        println!("  Torn tail: {}", if report.truncated_tail { "yes".red() } else { "no".green() });
    }
    Ok(())
}
