use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration, Instant};

/// Sliding-window limiter for calls made with the shared upstream credential.
#[derive(Clone, Debug)]
pub(crate) struct Ratelimiter {
    max_requests: usize,
    bucket_length: Duration,
    requests: Arc<RwLock<VecDeque<Instant>>>,
}

impl Ratelimiter {
    pub(crate) fn new(max_requests: usize, bucket_length: Duration) -> Self {
        assert!(max_requests > 0);

        Self {
            max_requests,
            bucket_length,
            requests: Arc::new(RwLock::new(VecDeque::with_capacity(max_requests))),
        }
    }

    /// remove expired requests from the bucket
    async fn clear_bucket(&self) {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        while let Some(&request) = requests.front() {
            if now.duration_since(request) > self.bucket_length {
                requests.pop_front();
            } else {
                break;
            }
        }
    }

    pub(crate) async fn acquire(&self) {
        loop {
            self.clear_bucket().await;
            let now = Instant::now();

            let mut requests = self.requests.write().await;

            if requests.len() < self.max_requests {
                requests.push_back(now);
                return;
            }

            let cooldown = match requests.front() {
                Some(oldest) => self.bucket_length.saturating_sub(now.duration_since(*oldest)),
                None => Duration::ZERO,
            };

            drop(requests);

            tracing::debug!("Upstream ratelimit reached, waiting {:?}", cooldown);
            sleep(cooldown).await;
        }
    }
}
