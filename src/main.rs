use anyhow::Result;
use labeltime::cli::{describe_failure, run_cli};
use tracing::error;

fn main() -> Result<()> {
    run_cli().inspect_err(|e| {
        error!("Error running cli {}", describe_failure(e));
    })?;
    Ok(())
}
