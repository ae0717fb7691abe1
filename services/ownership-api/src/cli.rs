use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ownership_flow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Ownership Verification Orchestrator",
    about = "Run or demonstrate the beneficial-ownership verification flow",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk scripted verification scenarios and print the screens visited
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed sessions from this CSV prefill export instead of the built-in company
    #[arg(long)]
    pub(crate) prefill_csv: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoScenario;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["ownership-flow-api"]).expect("no arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn demo_accepts_a_single_scenario() {
        let cli = Cli::try_parse_from(["ownership-flow-api", "demo", "--scenario", "two-way-match"])
            .expect("demo arguments parse");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.scenario, Some(DemoScenario::TwoWayMatch));
            }
            other => panic!("expected demo command, got {other:?}"),
        }
    }

    #[test]
    fn serve_overrides_parse() {
        let cli = Cli::try_parse_from([
            "ownership-flow-api",
            "serve",
            "--port",
            "8081",
            "--prefill-csv",
            "Cactus_Practice.csv",
        ])
        .expect("serve arguments parse");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8081));
                assert!(args.host.is_none());
                assert!(args.prefill_csv.is_some());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
