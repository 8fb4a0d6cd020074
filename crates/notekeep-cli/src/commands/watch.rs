//! Watch command: follow a live query until Ctrl-C
//!
//! Writes made by other processes are picked up by re-running the open
//! queries on an interval; only changed results are printed.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::StreamExt;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use notekeep_core::{AppContainer, Subscription};

use crate::output::{Output, OutputFormat};

/// What to watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTarget {
    All,
    Bookmarks,
    Note(i64),
}

impl FromStr for WatchTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(WatchTarget::All),
            "bookmarks" => Ok(WatchTarget::Bookmarks),
            other => match other.parse::<i64>() {
                Ok(id) if id > 0 => Ok(WatchTarget::Note(id)),
                _ => bail!(
                    "Invalid watch target: '{}'. Use 'all', 'bookmarks' or a note id",
                    other
                ),
            },
        }
    }
}

/// Print every change to the target until interrupted
pub async fn watch(
    app: &AppContainer,
    target: WatchTarget,
    interval: Duration,
    output: &Output,
) -> Result<()> {
    let use_cases = app.use_cases();

    if output.format == OutputFormat::Human {
        eprintln!("Watching {:?} (Ctrl-C to stop)", target);
    }

    match target {
        WatchTarget::All => {
            let subscription = use_cases.get_all_notes.call().await?;
            follow(app, subscription, interval, |notes| output.print_snapshot(notes)).await
        }
        WatchTarget::Bookmarks => {
            let subscription = use_cases.get_bookmarked_notes.call().await?;
            follow(app, subscription, interval, |notes| output.print_snapshot(notes)).await
        }
        WatchTarget::Note(id) => {
            let subscription = use_cases.get_note_by_id.call(id).await?;
            follow(app, subscription, interval, |note| {
                if output.format == OutputFormat::Human {
                    println!("────────────────────────────────────────");
                }
                output.print_note(note)
            })
            .await
        }
    }
}

async fn follow<T>(
    app: &AppContainer,
    mut subscription: Subscription<T>,
    interval: Duration,
    print: impl Fn(&T) -> Result<()>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            item = subscription.next() => match item {
                Some(Ok(value)) => print(&value)?,
                Some(Err(e)) => return Err(e).context("Live query failed"),
                None => break,
            },
            _ = ticker.tick() => {
                let store = app.store().clone();
                tokio::task::spawn_blocking(move || store.refresh_observers())
                    .await
                    .context("Refresh task failed")?
                    .context("Failed to refresh queries")?;
            }
            _ = &mut shutdown => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }

    Ok(())
}
