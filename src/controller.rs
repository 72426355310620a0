//! Owner of the currently selected birth date and everything derived from it.
//!
//! Selecting a date starts a one-second ticker that republishes the
//! [`BirthdayInfo`] and a single insights request. Both are replaced on the
//! next selection and aborted on `clear()` or drop. Ticks and insight results
//! carry the generation they were produced for and are dropped once
//! superseded.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::birthday::{BirthdayInfo, calculate_birthday_info};
use crate::error::INSIGHTS_UNAVAILABLE;
use crate::insights::{InsightsGateway, InsightsPayload};

const TICK: Duration = Duration::from_secs(1);

pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug, Clone, PartialEq)]
pub enum InsightsState {
    Idle,
    Loading,
    Ready(InsightsPayload),
    Failed(String),
}

pub struct Controller {
    gateway: Arc<dyn InsightsGateway>,
    clock: Clock,
    selected: Option<NaiveDate>,
    generation: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
    fetch: Option<JoinHandle<()>>,
    info_tx: Arc<watch::Sender<Option<BirthdayInfo>>>,
    insights_tx: Arc<watch::Sender<InsightsState>>,
}

impl Controller {
    pub fn new(gateway: Arc<dyn InsightsGateway>) -> Self {
        Self::with_clock(gateway, Utc::now)
    }

    pub fn with_clock(gateway: Arc<dyn InsightsGateway>, clock: Clock) -> Self {
        let (info_tx, _) = watch::channel(None);
        let (insights_tx, _) = watch::channel(InsightsState::Idle);
        Self {
            gateway,
            clock,
            selected: None,
            generation: Arc::new(AtomicU64::new(0)),
            ticker: None,
            fetch: None,
            info_tx: Arc::new(info_tx),
            insights_tx: Arc::new(insights_tx),
        }
    }

    pub fn subscribe_info(&self) -> watch::Receiver<Option<BirthdayInfo>> {
        self.info_tx.subscribe()
    }

    pub fn subscribe_insights(&self) -> watch::Receiver<InsightsState> {
        self.insights_tx.subscribe()
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Make `date` the current selection, replacing any previous ticker and
    /// insights request.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.stop_tasks();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.selected = Some(date);
        info!(%date, generation, "birth date selected");

        self.info_tx
            .send_replace(Some(calculate_birthday_info(date, (self.clock)())));
        self.insights_tx.send_replace(InsightsState::Loading);

        self.ticker = Some(self.spawn_ticker(date, generation));
        self.fetch = Some(self.spawn_fetch(date, generation));
    }

    /// Drop the selection and stop all background work.
    pub fn clear(&mut self) {
        self.stop_tasks();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.selected = None;
        self.info_tx.send_replace(None);
        self.insights_tx.send_replace(InsightsState::Idle);
    }

    fn stop_tasks(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
    }

    fn spawn_ticker(&self, date: NaiveDate, generation: u64) -> JoinHandle<()> {
        let tx = Arc::clone(&self.info_tx);
        let current = Arc::clone(&self.generation);
        let clock = self.clock;

        tokio::spawn(async move {
            let mut ticks = interval(TICK);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; select_date already published.
            ticks.tick().await;

            loop {
                ticks.tick().await;
                let info = calculate_birthday_info(date, clock());
                if !publish_info(&tx, &current, generation, info) {
                    debug!(%date, generation, "ticker superseded, stopping");
                    break;
                }
            }
        })
    }

    fn spawn_fetch(&self, date: NaiveDate, generation: u64) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        let current = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.insights_tx);

        tokio::spawn(async move {
            let state = match gateway.fetch_insights(date).await {
                Ok(payload) => InsightsState::Ready(payload),
                Err(e) => {
                    warn!(%date, "insights unavailable: {e}");
                    InsightsState::Failed(INSIGHTS_UNAVAILABLE.to_string())
                }
            };

            // Checked under the channel lock so a newer selection always wins.
            let applied = tx.send_if_modified(|slot| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *slot = state;
                true
            });

            if !applied {
                debug!(%date, generation, "discarding superseded insights response");
            }
        })
    }
}

/// Publish `info` unless a newer selection (or `clear()`) has bumped the
/// generation. Checked under the channel lock.
fn publish_info(
    tx: &watch::Sender<Option<BirthdayInfo>>,
    current: &AtomicU64,
    generation: u64,
    info: BirthdayInfo,
) -> bool {
    tx.send_if_modified(|slot| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        *slot = Some(info);
        true
    })
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}
