use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use querytally_cli::app;
use querytally_cli::cli::Cli;
use querytally_cli::error::CliError;
use querytally_cli::logging;
use querytally_cli::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 로깅 설정이 설정 파일에 있으므로 설정 에러는 stderr로 직접 출력
    let config = match app::resolve_config(&cli).await {
        Ok(config) => config,
        Err(e) => return report_failure(&e),
    };

    if let Err(e) = logging::init_tracing(&config.general) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }
    querytally_core::metrics::describe_all();

    tracing::info!(
        log = ?cli.log_file,
        handler = %config.ingest.handler_path,
        dry_run = cli.dry_run,
        "querytally starting"
    );

    let writer = OutputWriter::new(cli.output);
    let result = match app::execute(&cli, config).await {
        Ok(outcome) => writer.render(&outcome),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "querytally failed");
            report_failure(&e)
        }
    }
}

fn report_failure(e: &CliError) -> ExitCode {
    eprintln!("error: {e}");
    ExitCode::from(e.exit_code())
}
