// src/main.rs

use buildo::errors::BuildError;
use buildo::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            match err.downcast_ref::<BuildError>() {
                Some(build_err) => {
                    eprintln!("buildo: {:?} fault: {build_err}", build_err.fault_kind())
                }
                None => eprintln!("buildo error: {err:?}"),
            }
            std::process::exit(1);
        }
    }
}

/// Returns whether the build succeeded.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.effective_log_level())?;
    let report = run(args).await?;
    Ok(report.success())
}
