use backtest_pipeline::cli::{run, Cli};
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    backtest_pipeline::logging::init(cli.verbose);
    run(cli)
}
