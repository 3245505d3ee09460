use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hg",
    about = "hgraph: temporal heritage graph and snapshot document generator",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ./hgraph.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fact log path, overriding the configuration
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append JSON Lines records to the fact log
    Ingest(IngestArgs),
    /// Print one entity's document
    Render(RenderArgs),
    /// Render every entity into an output directory
    Generate(GenerateArgs),
    /// Show the identity class of a URI
    Aliases(AliasesArgs),
    /// Replay the fact log and report damaged entries
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct IngestArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct RenderArgs {
    pub uri: String,
    /// RFC 3339 timestamp or YYYY-MM-DD (default: now)
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long)]
    pub as_of: Option<String>,
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Args)]
pub struct AliasesArgs {
    pub uri: String,
}

#[derive(Args)]
pub struct VerifyArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ingest() {
        let cli = Cli::try_parse_from(["hg", "ingest", "a.jsonl", "b.jsonl"]).unwrap();
        if let Command::Ingest(args) = cli.command {
            assert_eq!(args.files, vec![PathBuf::from("a.jsonl"), PathBuf::from("b.jsonl")]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn ingest_requires_a_file() {
        assert!(Cli::try_parse_from(["hg", "ingest"]).is_err());
    }

    #[test]
    fn parse_render_with_as_of() {
        let cli = Cli::try_parse_from([
            "hg",
            "render",
            "https://ex.org/church",
            "--as-of",
            "2024-05-01",
        ])
        .unwrap();
        if let Command::Render(args) = cli.command {
            assert_eq!(args.uri, "https://ex.org/church");
            assert_eq!(args.as_of.as_deref(), Some("2024-05-01"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_generate() {
        let cli = Cli::try_parse_from(["hg", "generate", "--out", "site", "--workers", "4"]).unwrap();
        if let Command::Generate(args) = cli.command {
            assert_eq!(args.out, Some(PathBuf::from("site")));
            assert_eq!(args.workers, Some(4));
            assert!(args.as_of.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "hg",
            "verify",
            "--config",
            "conf.toml",
            "--log",
            "facts.log",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
        assert_eq!(cli.config, Some(PathBuf::from("conf.toml")));
        assert_eq!(cli.log, Some(PathBuf::from("facts.log")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_aliases() {
        let cli = Cli::try_parse_from(["hg", "aliases", "http://www.wikidata.org/entity/Q1"]).unwrap();
        assert!(matches!(cli.command, Command::Aliases(_)));
    }
}
