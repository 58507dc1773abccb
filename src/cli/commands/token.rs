//! Acquire and print a clinical-service bearer token.

use crate::clinical::ClinicalClient;
use crate::config::Settings;
use crate::error::Result;

/// Fetch a fresh token and print it, for manual API exploration.
pub async fn run_token(settings: Settings) -> Result<()> {
    let client = ClinicalClient::from_settings(&settings.clinical)?;
    let token = client.acquire_token().await?;
    println!("{}", token);
    Ok(())
}
