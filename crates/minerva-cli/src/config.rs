//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use minerva_core::{FormVariant, RevealMode};
use minerva_sync::RowStoreClient;

#[derive(Debug, Parser)]
#[command(
    name = "minerva",
    version,
    about = "Title/abstract screening against a remote review sheet"
)]
pub struct Cli {
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Prompt table (CSV with `SR` and `Prompt` columns).
    #[arg(long, env = "MINERVA_PROMPTS", default_value = "prompts.csv", global = true)]
    pub prompts: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct RemoteArgs {
    /// Sheet web-app URL.
    #[arg(long, env = "MINERVA_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Shared secret sent as the `token` query parameter.
    #[arg(long, env = "MINERVA_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Per-request timeout.
    #[arg(long, env = "MINERVA_TIMEOUT_SECS", default_value_t = 20, global = true)]
    pub timeout_secs: u64,
}

impl RemoteArgs {
    pub fn client(&self) -> anyhow::Result<RowStoreClient> {
        let endpoint = self
            .endpoint
            .clone()
            .context("no sheet endpoint configured (--endpoint or MINERVA_ENDPOINT)")?;
        let token = self
            .token
            .clone()
            .context("no sheet token configured (--token or MINERVA_TOKEN)")?;
        RowStoreClient::new(endpoint, token, Duration::from_secs(self.timeout_secs))
            .context("building HTTP client")
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Review rows one at a time.
    Review {
        /// Start with only unreviewed rows.
        #[arg(long)]
        unreviewed: bool,

        #[arg(long, value_enum, default_value_t)]
        variant: VariantArg,

        #[arg(long, value_enum, default_value_t)]
        reveal: RevealArg,

        /// Name stamped into the `Reviewer` column on save.
        #[arg(long, env = "MINERVA_REVIEWER")]
        reviewer: Option<String>,
    },
    /// Print one line per row.
    List {
        #[arg(long)]
        unreviewed: bool,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print review progress.
    Status,
    /// Write the sheet to a CSV file.
    Export {
        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        unreviewed: bool,
    },
    /// Print the prompt table.
    Prompts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Include / Exclude / Unclear.
    #[default]
    Screening,
    /// Yes / No.
    Binary,
}

impl From<VariantArg> for FormVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Screening => FormVariant::Screening,
            VariantArg::Binary => FormVariant::Binary,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RevealArg {
    /// Always show the AI label and justification.
    #[default]
    Open,
    /// Show them only once your decision for the row is saved.
    Blinded,
}

impl From<RevealArg> for RevealMode {
    fn from(r: RevealArg) -> Self {
        match r {
            RevealArg::Open => RevealMode::Open,
            RevealArg::Blinded => RevealMode::Blinded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_defaults() {
        let cli = Cli::try_parse_from(["minerva", "review"]).unwrap();
        assert_eq!(cli.prompts, PathBuf::from("prompts.csv"));
        assert_eq!(cli.remote.timeout_secs, 20);
        match cli.command {
            Command::Review {
                unreviewed,
                variant,
                reveal,
                ..
            } => {
                assert!(!unreviewed);
                assert_eq!(variant, VariantArg::Screening);
                assert_eq!(reveal, RevealArg::Open);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_remote_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "minerva",
            "review",
            "--endpoint",
            "https://example.test/exec",
            "--token",
            "s3cret",
            "--variant",
            "binary",
            "--reveal",
            "blinded",
            "--timeout-secs",
            "25",
        ])
        .unwrap();
        assert_eq!(
            cli.remote.endpoint.as_deref(),
            Some("https://example.test/exec")
        );
        assert_eq!(cli.remote.timeout_secs, 25);
        let Command::Review {
            variant, reveal, ..
        } = cli.command
        else {
            panic!("expected review");
        };
        assert_eq!(FormVariant::from(variant), FormVariant::Binary);
        assert_eq!(RevealMode::from(reveal), RevealMode::Blinded);
    }

    #[test]
    fn client_requires_token() {
        let args = RemoteArgs {
            endpoint: Some("https://example.test/exec".into()),
            token: None,
            timeout_secs: 20,
        };
        let err = args.client().err().unwrap();
        assert!(err.to_string().contains("MINERVA_TOKEN"));
    }

    #[test]
    fn export_requires_out() {
        assert!(Cli::try_parse_from(["minerva", "export"]).is_err());
    }
}
