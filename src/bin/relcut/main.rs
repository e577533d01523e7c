mod display;

use relcut::{
    Bitbucket, Config, GitCli, Jira, ReleaseAction, cut_release_branches, load_release_issues,
    open_release_prs, parse_args, report, resolve_repositories,
};

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let request = match parse_args(std::env::args()) {
        Ok(request) => request,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    let config = Config::from_env()?;
    let jira = Jira::new(&config);
    let issues = load_release_issues(&jira, &request.version).await?;
    let mut stdout = std::io::stdout();

    match request.action {
        ReleaseAction::Check => {
            let rows = report::build_release_report(&issues);
            report::render_release_table(&rows, &mut stdout)?;
        }
        ReleaseAction::ReleaseBranch => {
            let repos = resolve_repositories(&issues);
            let git = GitCli::new(&config.repos_root);
            let outcomes = cut_release_branches(&git, &config, &request.version, &repos).await;
            display::print_outcomes(&outcomes, &mut stdout)?;
        }
        ReleaseAction::ReleasePr => {
            let repos = resolve_repositories(&issues);
            let bitbucket = Bitbucket::new(&config);
            let outcomes = open_release_prs(&bitbucket, &config, &request.version, &repos).await;
            display::print_outcomes(&outcomes, &mut stdout)?;
        }
    }

    Ok(())
}
