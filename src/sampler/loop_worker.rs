//! The sampling loop: turns raw page events into at most one analysis
//! request per cooldown window.
//!
//! Triggers arrive on a channel from the host (startup, mutation batches,
//! scrolls, clicks). Scrolls are debounced, clicks wait for the post-click
//! DOM to settle, mutations below the changed-text threshold are dropped.
//! When a scheduled fire comes due the loop snapshots the page, extracts
//! visible text and emits a `SampledText` — unless the cooldown is open,
//! the text is too short, or it matches the previously analyzed text.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::SamplerConfig;
use crate::host::{NodePath, PageEvent, PageSource};
use crate::models::{SampleScope, SampledText};

use super::extract::extract_visible_text;

/// Mutable loop state. One instance per page, owned by the loop task;
/// nothing here is shared.
#[derive(Debug, Default)]
pub(crate) struct SamplerState {
    cooldown_until: Option<Instant>,
    last_analyzed_text: Option<String>,
}

impl SamplerState {
    pub(crate) fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.map(|until| now < until).unwrap_or(false)
    }

    pub(crate) fn arm_cooldown(&mut self, now: Instant, period: Duration) {
        self.cooldown_until = Some(now + period);
    }

    pub(crate) fn clear_cooldown(&mut self) {
        self.cooldown_until = None;
    }
}

/// A fire scheduled by a trigger; a newer trigger replaces it wholesale.
struct PendingFire {
    deadline: Instant,
    scope: Option<NodePath>,
}

pub async fn sampling_loop(
    page: Arc<dyn PageSource>,
    config: SamplerConfig,
    mut events: mpsc::Receiver<PageEvent>,
    request_tx: mpsc::Sender<SampledText>,
    cancel_token: CancellationToken,
) {
    let mut state = SamplerState::default();
    let mut pending: Option<PendingFire> = None;

    loop {
        // When nothing is scheduled, park the timer arm far away.
        let deadline = pending
            .as_ref()
            .map(|p| p.deadline)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("sampling loop shutting down");
                break;
            }
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => schedule(&mut pending, event, &config),
                    None => {
                        info!("sampling event channel closed, loop exiting");
                        break;
                    }
                }
            }
            _ = sleep_until(deadline), if pending.is_some() => {
                let fire = pending.take().expect("pending checked by select guard");
                attempt_sample(
                    page.as_ref(),
                    fire.scope.as_ref(),
                    &config,
                    &mut state,
                    &request_tx,
                    Instant::now(),
                );
            }
        }
    }
}

/// Translate one event into a (re)scheduled fire.
fn schedule(pending: &mut Option<PendingFire>, event: PageEvent, config: &SamplerConfig) {
    let now = Instant::now();
    match event {
        PageEvent::Startup => {
            *pending = Some(PendingFire {
                deadline: now + config.startup_delay,
                scope: None,
            });
        }
        PageEvent::Mutation { changed_len } => {
            if changed_len < config.mutation_min_len {
                debug!("mutation below threshold ({changed_len} chars), ignored");
                return;
            }
            *pending = Some(PendingFire {
                deadline: now,
                scope: None,
            });
        }
        PageEvent::Scroll => {
            // Each scroll pushes the deadline out; only the last one fires.
            *pending = Some(PendingFire {
                deadline: now + config.scroll_debounce,
                scope: None,
            });
        }
        PageEvent::Click { target } => {
            *pending = Some(PendingFire {
                deadline: now + config.click_settle,
                scope: target,
            });
        }
    }
}

/// One sampling attempt. Checks the cooldown, extracts text, applies the
/// relevance guards, and emits at most one request. On a send failure the
/// cooldown is cleared again so a later trigger can retry.
pub(crate) fn attempt_sample(
    page: &dyn PageSource,
    scope: Option<&NodePath>,
    config: &SamplerConfig,
    state: &mut SamplerState,
    request_tx: &mpsc::Sender<SampledText>,
    now: Instant,
) -> bool {
    if state.in_cooldown(now) {
        debug!("sampling skipped, cooldown open");
        return false;
    }

    let snapshot = page.snapshot();
    let text = extract_visible_text(&snapshot, scope, config.max_text_len);

    if text.chars().count() < config.min_relevant_len {
        debug!("sampling skipped, only {} chars extracted", text.len());
        return false;
    }
    if state.last_analyzed_text.as_deref() == Some(text.as_str()) {
        debug!("sampling skipped, text unchanged since last analysis");
        return false;
    }

    // Armed before the send so a racing trigger can't double-fire.
    state.arm_cooldown(now, config.cooldown);

    let sample = SampledText {
        text: text.clone(),
        source_url: snapshot.url,
        timestamp: Utc::now(),
        scope: if scope.is_some() {
            SampleScope::Subtree
        } else {
            SampleScope::FullPage
        },
    };

    if let Err(err) = request_tx.try_send(sample) {
        warn!("failed to emit analysis request: {err}");
        state.clear_cooldown();
        return false;
    }

    info!("analysis request emitted ({} chars)", text.len());
    state.last_analyzed_text = Some(text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NodeRect, PageNode, PageSnapshot, Viewport};

    struct StaticPage {
        text: String,
    }

    impl PageSource for StaticPage {
        fn snapshot(&self) -> PageSnapshot {
            PageSnapshot {
                url: "https://example.com/page".into(),
                viewport: Viewport {
                    scroll_x: 0.0,
                    scroll_y: 0.0,
                    width: 1000.0,
                    height: 800.0,
                },
                root: PageNode {
                    tag: "p".into(),
                    text: self.text.clone(),
                    rect: NodeRect {
                        x: 0.0,
                        y: 0.0,
                        width: 500.0,
                        height: 100.0,
                    },
                    attached: true,
                    children: vec![],
                },
            }
        }
    }

    fn long_page() -> StaticPage {
        StaticPage {
            text: "lorem ipsum ".repeat(30),
        }
    }

    fn tiny_config() -> SamplerConfig {
        SamplerConfig {
            startup_delay: Duration::from_millis(10),
            scroll_debounce: Duration::from_millis(20),
            click_settle: Duration::from_millis(10),
            cooldown: Duration::from_millis(200),
            mutation_min_len: 50,
            min_relevant_len: 100,
            max_text_len: 4000,
        }
    }

    #[tokio::test]
    async fn cooldown_allows_only_the_first_of_two_rapid_fires() {
        let page = long_page();
        let config = tiny_config();
        let mut state = SamplerState::default();
        let (tx, mut rx) = mpsc::channel(8);
        let now = Instant::now();

        assert!(attempt_sample(&page, None, &config, &mut state, &tx, now));
        // Second fire inside the window: gated even though the guards would
        // pass again.
        state.last_analyzed_text = None;
        assert!(!attempt_sample(&page, None, &config, &mut state, &tx, now + Duration::from_millis(50)));
        // After the window elapses a new trigger fires again.
        assert!(attempt_sample(&page, None, &config, &mut state, &tx, now + Duration::from_millis(250)));

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn short_text_is_not_emitted() {
        let page = StaticPage {
            text: "too short".into(),
        };
        let mut state = SamplerState::default();
        let (tx, mut rx) = mpsc::channel(8);

        assert!(!attempt_sample(&page, None, &tiny_config(), &mut state, &tx, Instant::now()));
        assert!(rx.try_recv().is_err());
        // And the cooldown was never armed.
        assert!(!state.in_cooldown(Instant::now()));
    }

    #[tokio::test]
    async fn unchanged_text_is_not_reanalyzed() {
        let page = long_page();
        let config = tiny_config();
        let mut state = SamplerState::default();
        let (tx, _rx) = mpsc::channel(8);
        let now = Instant::now();

        assert!(attempt_sample(&page, None, &config, &mut state, &tx, now));
        let later = now + Duration::from_millis(300);
        assert!(!state.in_cooldown(later));
        assert!(!attempt_sample(&page, None, &config, &mut state, &tx, later));
    }

    #[tokio::test]
    async fn send_failure_clears_the_cooldown() {
        let page = long_page();
        let config = tiny_config();
        let mut state = SamplerState::default();
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let now = Instant::now();
        assert!(!attempt_sample(&page, None, &config, &mut state, &tx, now));
        // The failed send must not leave the window stuck open.
        assert!(!state.in_cooldown(now));
    }

    #[tokio::test]
    async fn loop_emits_after_startup_delay_and_debounces_scrolls() {
        let page = Arc::new(long_page());
        let config = tiny_config();
        let (event_tx, event_rx) = mpsc::channel(16);
        let (request_tx, mut request_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(sampling_loop(
            page,
            config,
            event_rx,
            request_tx,
            cancel.clone(),
        ));

        event_tx.send(PageEvent::Startup).await.unwrap();
        let sample = tokio::time::timeout(Duration::from_secs(1), request_rx.recv())
            .await
            .expect("startup fire within deadline")
            .expect("channel open");
        assert_eq!(sample.scope, SampleScope::FullPage);
        assert_eq!(sample.source_url, "https://example.com/page");

        // A burst of scrolls inside the cooldown produces nothing more.
        for _ in 0..5 {
            event_tx.send(PageEvent::Scroll).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(request_rx.try_recv().is_err());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn small_mutations_never_schedule_a_fire() {
        let page = Arc::new(long_page());
        let config = tiny_config();
        let (event_tx, event_rx) = mpsc::channel(16);
        let (request_tx, mut request_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(sampling_loop(
            page,
            config,
            event_rx,
            request_tx,
            cancel.clone(),
        ));

        event_tx.send(PageEvent::Mutation { changed_len: 5 }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(request_rx.try_recv().is_err());

        event_tx
            .send(PageEvent::Mutation { changed_len: 500 })
            .await
            .unwrap();
        let sample = tokio::time::timeout(Duration::from_secs(1), request_rx.recv())
            .await
            .expect("mutation fire within deadline")
            .expect("channel open");
        assert!(!sample.text.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
