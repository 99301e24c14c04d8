//! Live module clock display.
//!
//! The module keeps local wall time in a UTC epoch, so module time is shown
//! as UTC and the time sent to the module is the host clock shifted by the
//! local offset.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::status::ClockSource;

const TICK: Duration = Duration::from_secs(1);

struct Ticker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Module time, advanced once per second by a single ticker thread.
pub struct ClockDisplay {
    text: Arc<Mutex<String>>,
    live: Arc<AtomicUsize>,
    ticker: Option<Ticker>,
    period: Duration,
    offset: UtcOffset,
}

impl Default for ClockDisplay {
    fn default() -> Self {
        Self::new(local_offset(None))
    }
}

impl ClockDisplay {
    /// `offset` is used when showing the host clock.
    #[must_use]
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            text: Arc::new(Mutex::new(String::new())),
            live: Arc::new(AtomicUsize::new(0)),
            ticker: None,
            period: TICK,
            offset,
        }
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Current clock text, empty until the first sync.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Ticker threads currently running.
    #[must_use]
    pub fn active_tickers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Restarts the display from a new time source. The previous ticker is
    /// stopped and joined before the new one starts.
    pub fn sync(&mut self, source: ClockSource) {
        self.stop();
        let offset = self.offset;
        let mut epoch = match source {
            ClockSource::Module(epoch) => Some(epoch),
            ClockSource::Host => None,
        };
        *self.text.lock() = render(epoch, offset);

        let (stop, rx) = mpsc::channel::<()>();
        let text = self.text.clone();
        let live = self.live.clone();
        let period = self.period;
        live.fetch_add(1, Ordering::SeqCst);
        let handle = thread::spawn(move || {
            while let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(period) {
                if let Some(epoch) = epoch.as_mut() {
                    *epoch += 1;
                }
                *text.lock() = render(epoch, offset);
            }
            live.fetch_sub(1, Ordering::SeqCst);
        });
        debug!(?source, "module clock restarted");
        self.ticker = Some(Ticker { stop, handle });
    }

    /// Stops the ticker, leaving the last text in place.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            drop(ticker.stop);
            let _ = ticker.handle.join();
        }
    }
}

impl Drop for ClockDisplay {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render(epoch: Option<i64>, offset: UtcOffset) -> String {
    match epoch {
        Some(epoch) => format_epoch(epoch),
        None => format_datetime(OffsetDateTime::now_utc().to_offset(offset)),
    }
}

/// `YYYY/M/D HH:MM:SS` for module epoch seconds.
#[must_use]
pub fn format_epoch(epoch: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch)
        .map(format_datetime)
        .unwrap_or_else(|_| format!("epoch {epoch}"))
}

fn format_datetime(at: OffsetDateTime) -> String {
    format!(
        "{}/{}/{} {:02}:{:02}:{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Local UTC offset, or the configured override in minutes. Falls back to
/// UTC when the platform cannot report it.
#[must_use]
pub fn local_offset(override_minutes: Option<i32>) -> UtcOffset {
    if let Some(minutes) = override_minutes {
        return UtcOffset::from_whole_seconds(minutes.saturating_mul(60)).unwrap_or(UtcOffset::UTC);
    }
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Host wall time as the module stores it: local time in a UTC epoch.
#[must_use]
pub fn local_epoch_now(offset: UtcOffset) -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() + i64::from(offset.whole_seconds())
}
