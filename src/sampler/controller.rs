use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SamplerConfig;
use crate::host::{PageEvent, PageSource};
use crate::models::SampledText;

use super::loop_worker::sampling_loop;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    event_tx: Option<mpsc::Sender<PageEvent>>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            event_tx: None,
        }
    }

    /// Spawn the sampling loop for a page. Emitted requests land on
    /// `request_tx`.
    pub fn start(
        &mut self,
        page: Arc<dyn PageSource>,
        config: SamplerConfig,
        request_tx: mpsc::Sender<SampledText>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampler already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let handle = tokio::spawn(sampling_loop(
            page,
            config,
            event_rx,
            request_tx,
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.event_tx = Some(event_tx);
        info!("sampler started");
        Ok(())
    }

    /// Forward one host event to the loop. Dropping events when the loop is
    /// backed up is fine; sampling is best-effort by design.
    pub fn notify(&self, event: PageEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.event_tx = None;

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SamplerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NodeRect, PageNode, PageSnapshot, Viewport};

    struct EmptyPage;

    impl PageSource for EmptyPage {
        fn snapshot(&self) -> PageSnapshot {
            PageSnapshot {
                url: "https://example.com".into(),
                viewport: Viewport {
                    scroll_x: 0.0,
                    scroll_y: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                root: PageNode {
                    tag: "body".into(),
                    text: String::new(),
                    rect: NodeRect {
                        x: 0.0,
                        y: 0.0,
                        width: 100.0,
                        height: 100.0,
                    },
                    attached: true,
                    children: vec![],
                },
            }
        }
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let mut controller = SamplerController::new();
        let (tx, _rx) = mpsc::channel(4);

        controller
            .start(Arc::new(EmptyPage), SamplerConfig::default(), tx.clone())
            .unwrap();
        assert!(controller
            .start(Arc::new(EmptyPage), SamplerConfig::default(), tx)
            .is_err());

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_joins_cleanly_and_is_idempotent() {
        let mut controller = SamplerController::new();
        let (tx, _rx) = mpsc::channel(4);

        controller
            .start(Arc::new(EmptyPage), SamplerConfig::default(), tx)
            .unwrap();
        controller.notify(PageEvent::Scroll);
        controller.stop().await.unwrap();
        controller.stop().await.unwrap();
    }
}
