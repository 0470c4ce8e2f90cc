use std::time::Duration;

use crate::token::store::TokenRegistry;

/// Periodically drops expired tokens for every user. Only started when a
/// sweep interval is configured; otherwise expiry stays demand-driven.
pub(crate) async fn sweep_loop(registry: TokenRegistry, period: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let removed = registry.sweep_all().await;

        if removed > 0 {
            tracing::debug!("Sweeper removed {} expired token(s)", removed);
        }
    }
}
