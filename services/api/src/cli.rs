use crate::demo::{run_demo, run_sweep, DemoArgs, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use topper::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "topper",
    about = "Run the Topper rating service or simulate it from the command line",
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
    /// Simulate a few days of likes, gifts, and passive sweeps on demo users
    Demo(DemoArgs),
    /// Run passive bonus sweeps over the demo population and print the result
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Do not schedule the passive bonus sweep (manual `POST /api/v1/sweeps` still works)
    #[arg(long)]
    pub(crate) no_sweep: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Sweep(args) => run_sweep(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["topper"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_sweep_options() {
        let cli = Cli::try_parse_from(["topper", "sweep", "--cycles", "3", "--json"])
            .expect("parses");
        match cli.command {
            Some(Command::Sweep(args)) => {
                assert_eq!(args.cycles, 3);
                assert!(args.json);
            }
            other => panic!("expected sweep command, got {other:?}"),
        }
    }

    #[test]
    fn demo_rejects_malformed_start() {
        let result = Cli::try_parse_from(["topper", "demo", "--start", "tomorrow"]);
        assert!(result.is_err());
    }
}
