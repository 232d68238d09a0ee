//! Host command availability checks

use tokio::process::Command;
use tracing::{info, warn};

/// Check that the first word of `command_line` can be executed
pub async fn check_command_available(command_line: &str) -> Result<(), String> {
    let program = command_line
        .split_whitespace()
        .next()
        .ok_or_else(|| "Empty command line".to_string())?;

    match Command::new(program).arg("--version").output().await {
        Ok(_) => {
            info!("{} is available", program);
            Ok(())
        }
        Err(e) => {
            warn!("{} is not available: {}", program, e);
            Err(format!("{} is not available: {}", program, e))
        }
    }
}
