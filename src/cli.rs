use anyhow::{Context, Result};
use clap::Parser;

use crate::types::{ReleaseAction, ReleaseRequest, ReleaseVersion};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Debug)]
#[command(name = "relcut")]
#[command(
    about = "Release workflow automation: inspect a release, cut release branches, or open release pull requests for every repository the release touches"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Action to perform: check, release_branch, or release_pr
    #[arg(value_name = "ACTION")]
    pub action: String,

    /// Release version, e.g. 1.2.3
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: Option<String>,
}

fn build_request(cli: CliArgs) -> Result<ReleaseRequest> {
    let action = ReleaseAction::from_token(&cli.action)?;

    // Every action queries the tracker by fixVersion, so the version is
    // required across the board.
    let Some(version) = cli.version else {
        anyhow::bail!("action '{}' requires a release version", action.as_str());
    };
    let version = ReleaseVersion::new(version.as_str())
        .with_context(|| format!("invalid release version '{}'", version))?;

    Ok(ReleaseRequest { action, version })
}

/// Parses command-line arguments into a release request.
///
/// Invalid action tokens, a missing or malformed version, and clap-level
/// errors are all reported here, before any external call is made.
pub fn parse_args<I, T>(args: I) -> Result<ReleaseRequest>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_request(cli)
}
