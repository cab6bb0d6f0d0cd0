//! Shared crawl state: the queue of pending URLs and the visited set.
//!
//! Workers call [`Frontier::next`] to claim a URL and [`Frontier::complete`]
//! once they are done with it. A URL joins the visited set at the moment it
//! is claimed, so no two workers can ever fetch the same URL. The mutex is
//! never held across an `.await`.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::warn;
use url::Url;

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<Url>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    in_flight: usize,
    dropped: usize,
    closed: bool,
}

impl State {
    fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

#[derive(Debug)]
pub struct Frontier {
    state: Mutex<State>,
    wakeup: Notify,
    max_pending: Option<usize>,
}

impl Frontier {
    pub fn new(seed: Url, max_pending: Option<usize>) -> Self {
        let mut state = State::default();
        state.queued.insert(seed.as_str().to_string());
        state.pending.push_back(seed);

        Self {
            state: Mutex::new(state),
            wakeup: Notify::new(),
            max_pending,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the next unvisited URL and marks it visited.
    ///
    /// Waits while other workers still have fetches in flight, since those
    /// may discover more work. Returns `None` once the frontier is drained
    /// or closed.
    pub async fn next(&self) -> Option<Url> {
        loop {
            let notified = self.wakeup.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between the check and
            // the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }

                while let Some(url) = state.pending.pop_front() {
                    state.queued.remove(url.as_str());
                    if state.visited.insert(url.as_str().to_string()) {
                        state.in_flight += 1;
                        return Some(url);
                    }
                }

                if state.in_flight == 0 {
                    drop(state);
                    self.wakeup.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Releases a claimed URL and queues the links found on it.
    ///
    /// Links already visited or already queued are ignored. Returns how many
    /// links were newly queued.
    pub fn complete<'a>(&self, links: impl IntoIterator<Item = &'a Url>) -> usize {
        let mut queued = 0;
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);

            if !state.closed {
                for link in links {
                    let key = link.as_str();
                    if state.visited.contains(key) || state.queued.contains(key) {
                        continue;
                    }
                    if self
                        .max_pending
                        .is_some_and(|max| state.pending.len() >= max)
                    {
                        state.dropped += 1;
                        warn!("Frontier full, dropping {}", link);
                        continue;
                    }
                    state.queued.insert(key.to_string());
                    state.pending.push_back(link.clone());
                    queued += 1;
                }
            }
        }

        self.wakeup.notify_waiters();
        queued
    }

    /// Claims the next URL as a [`Claim`] that gives the slot back when dropped.
    pub async fn claim(&self) -> Option<Claim<'_>> {
        let url = self.next().await?;
        Some(Claim {
            frontier: self,
            url,
            completed: false,
        })
    }

    /// Gives back a claimed URL without queueing anything.
    pub fn release(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.wakeup.notify_waiters();
    }

    /// Stops all further dispatching.
    ///
    /// Returns true if there was still work left, i.e. the crawl was cut short.
    pub fn close(&self) -> bool {
        let had_work = {
            let mut state = self.lock();
            let had_work = !state.is_drained();
            state.closed = true;
            had_work
        };
        self.wakeup.notify_waiters();
        had_work
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.lock().visited.contains(url.as_str())
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn dropped(&self) -> usize {
        self.lock().dropped
    }

    pub fn visited(&self) -> BTreeSet<String> {
        self.lock().visited.iter().cloned().collect()
    }
}

/// A URL a worker is currently responsible for.
///
/// Dropped without [`Claim::complete`] (a panicking fetch, say) it releases
/// its slot. If the drop happens while unwinding the frontier is closed too,
/// so the remaining workers stop instead of waiting on the lost fetch.
pub struct Claim<'a> {
    frontier: &'a Frontier,
    url: Url,
    completed: bool,
}

impl Claim<'_> {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn complete<'l>(mut self, links: impl IntoIterator<Item = &'l Url>) -> usize {
        self.completed = true;
        self.frontier.complete(links)
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        self.frontier.release();
        if std::thread::panicking() {
            warn!("Worker panicked while handling {}, stopping crawl", self.url);
            self.frontier.close();
        }
    }
}
