//! The aggregation loop: select a stale feed, fetch it, mark it, parse
//! it, and hand its items to a sink.
//!
//! Cycles are strictly sequential. One feed is processed per cycle, and
//! a cycle that fails leaves the loop running: a single bad feed must
//! never stop polling of all the others.

use crate::feed::{parse_feed, FeedFetcher, FetchError, ParseError};
use crate::storage::{Database, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How long a single fetch may take, end to end.
const FETCH_DEADLINE: Duration = Duration::from_secs(30);

/// One parsed entry, decoded and ready for delivery.
///
/// Items are transient: the aggregator does not persist or deduplicate
/// them, so the same item may be delivered again on a later cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub feed_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Downstream consumer of parsed feed items.
///
/// Delivery failures are reported per item and never abort the cycle:
/// the aggregator moves on to the next item regardless.
#[async_trait]
pub trait ItemSink: Send + Sync {
    async fn deliver(&self, item: &FeedItem) -> anyhow::Result<()>;
}

/// Sink that prints each item to stdout.
pub struct ConsoleSink;

#[async_trait]
impl ItemSink for ConsoleSink {
    async fn deliver(&self, item: &FeedItem) -> anyhow::Result<()> {
        println!("Title: {}", item.title);
        println!("Description: {}", item.description);
        Ok(())
    }
}

/// Errors that can end a single aggregation cycle early.
///
/// None of these are fatal to the loop; [`Aggregator::run`] reports them
/// and waits for the next tick.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The HTTP fetch failed; the feed was not marked fetched.
    #[error("Fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    /// The payload was not a usable feed document. The fetch itself
    /// succeeded, so the feed's timestamp already advanced.
    #[error("Parsing {url} failed: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },
    /// The feed repository failed mid-cycle.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a completed cycle accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No feeds are registered; nothing to do.
    Idle,
    /// One feed was processed; `items` counts successful deliveries.
    Delivered { feed_id: i64, items: usize },
}

/// Drives the fixed-interval polling loop over the feed table.
pub struct Aggregator {
    db: Database,
    fetcher: FeedFetcher,
    sink: Arc<dyn ItemSink>,
    interval: Duration,
}

impl Aggregator {
    /// Builds an aggregator polling at the given interval.
    ///
    /// # Errors
    ///
    /// A zero interval would spin the loop flat out against remote
    /// servers and is rejected here rather than at the first tick.
    pub fn new(
        db: Database,
        fetcher: FeedFetcher,
        sink: Arc<dyn ItemSink>,
        interval: Duration,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !interval.is_zero(),
            "aggregation interval must be at least one millisecond"
        );
        Ok(Self {
            db,
            fetcher,
            sink,
            interval,
        })
    }

    /// Runs one aggregation cycle.
    ///
    /// The steps happen in a fixed order: pick the stalest feed, fetch
    /// it, mark it fetched, parse the payload, deliver the items in
    /// document order. Marking sits between fetch and parse on purpose.
    /// A fetch failure leaves the timestamp alone, so the feed stays
    /// first in line for the next cycle. A parse failure keeps the mark,
    /// so a feed that serves broken XML forever still rotates out
    /// instead of wedging the selector on itself.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let Some(feed) = self.db.next_stale_feed().await? else {
            return Ok(CycleOutcome::Idle);
        };

        let bytes = self
            .fetcher
            .fetch(&feed.url, FETCH_DEADLINE)
            .await
            .map_err(|source| CycleError::Fetch {
                url: feed.url.clone(),
                source,
            })?;

        self.db
            .mark_feed_fetched(feed.id, Utc::now().timestamp())
            .await?;

        let channel = parse_feed(&bytes).map_err(|source| CycleError::Parse {
            url: feed.url.clone(),
            source,
        })?;

        debug!(
            feed = %feed.url,
            channel = %channel.title,
            items = channel.items.len(),
            "Parsed feed document"
        );

        let mut delivered = 0usize;
        for entry in channel.items {
            let item = FeedItem {
                feed_id: feed.id,
                title: entry.title,
                link: entry.link,
                description: entry.description,
                pub_date: entry.pub_date,
            };
            match self.sink.deliver(&item).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(feed = %feed.url, title = %item.title, error = %e, "Sink rejected item");
                }
            }
        }

        Ok(CycleOutcome::Delivered {
            feed_id: feed.id,
            items: delivered,
        })
    }

    /// Polls until the shutdown channel fires or its sender is dropped.
    ///
    /// The first cycle runs immediately; later cycles start at fixed
    /// interval boundaries. A cycle that overruns the interval delays
    /// the next one rather than overlapping it. Shutdown is checked
    /// between cycles, never mid-fetch.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.interval, "Collecting feeds");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("Aggregation loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(CycleOutcome::Idle) => debug!("No feeds registered yet"),
                        Ok(CycleOutcome::Delivered { feed_id, items }) => {
                            debug!(feed_id, items, "Cycle complete");
                        }
                        Err(e) => warn!(error = %e, "Cycle failed"),
                    }
                }
            }
        }
    }
}
