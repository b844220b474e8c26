//! Browser pacer: the turn-taking delay between chat-mode bubbles.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use tangle_core::ports::PacerPort;

pub struct TimeoutPacer;

#[async_trait(?Send)]
impl PacerPort for TimeoutPacer {
    async fn pause(&self, ms: u32) {
        TimeoutFuture::new(ms).await;
    }
}
