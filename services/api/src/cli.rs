use crate::rank::{run_rank, RankArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use draw_order::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "draw-order",
    about = "Rank available credit lines into a draw order and plan draws against a target",
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
    /// Rank a table from disk and write the order as CSV
    Rank(RankArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rank(args) => run_rank(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use draw_order::workflows::intake::SheetSelection;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rank_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["draw-order", "rank"]).is_err());
        assert!(Cli::try_parse_from([
            "draw-order",
            "rank",
            "--input",
            "lines.csv",
            "--grid",
            "lines.json"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "draw-order",
            "rank",
            "--input",
            "lines.csv",
            "--alm-mismatch",
            "Over 1 Years & upto 3 Years=250",
            "--today",
            "2025-10-01",
        ])
        .expect("valid arguments");
        match cli.command {
            Some(Command::Rank(args)) => {
                assert_eq!(args.alm_mismatch.len(), 1);
                assert!(args.today.is_some());
            }
            other => panic!("expected rank command, got {other:?}"),
        }
    }

    #[test]
    fn sheet_flag_selects_by_position_or_name() {
        let cli = Cli::try_parse_from([
            "draw-order",
            "rank",
            "--input",
            "lines.xlsx",
            "--sheet",
            "2",
        ])
        .expect("valid arguments");
        match cli.command {
            Some(Command::Rank(args)) => {
                assert_eq!(args.sheet, Some(SheetSelection::Position(2)));
            }
            other => panic!("expected rank command, got {other:?}"),
        }

        assert!(Cli::try_parse_from([
            "draw-order",
            "rank",
            "--grid",
            "lines.json",
            "--sheet",
            "Lines"
        ])
        .is_err());
    }
}
