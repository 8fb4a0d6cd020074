//! Remote command handler

use anyhow::{bail, Result};

use notekeep_core::AppContainer;

use crate::output::Output;

/// Fetch and print the notes served by the remote endpoint
///
/// The result is display-only and never written to the local store.
pub async fn fetch(app: &AppContainer, output: &Output) -> Result<()> {
    let remote = app.remote();

    if !remote.is_enabled() {
        bail!(
            "Remote endpoint not configured.\n\
             Set one with: notekeep config set remote_url https://your-server/api"
        );
    }

    if !remote.fetch().await {
        bail!("Failed to fetch remote notes (run with NOTEKEEP_LOG=warn for details)");
    }

    output.print_notes(&remote.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Output, OutputFormat};

    #[tokio::test]
    async fn test_fetch_without_endpoint() {
        let app = AppContainer::in_memory().unwrap();
        let err = fetch(&app, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
