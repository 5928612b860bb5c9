use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use reidentify::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ReIDentify Backend",
    about = "Serve the ID card request review API or walk through it offline",
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
    /// Approve, reject and re-status seeded requests against an in-memory store
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
    /// Keep collections in process memory instead of connecting to MongoDB
    #[arg(long)]
    pub(crate) in_memory: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["reidentify-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "reidentify-api",
            "serve",
            "--host",
            "localhost",
            "--port",
            "5050",
            "--in-memory",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.host.as_deref(), Some("localhost"));
                assert_eq!(args.port, Some(5050));
                assert!(args.in_memory);
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }

    #[test]
    fn demo_defaults_to_unrecognized_status() {
        let cli = Cli::try_parse_from(["reidentify-api", "demo"]).expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.status, "on-hold");
                assert!(!args.discard_unknown);
            }
            other => panic!("expected demo command, got {other:?}"),
        }
    }
}
