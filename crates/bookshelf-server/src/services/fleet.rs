//! Fleet health probe
//!
//! Simulates querying three infrastructure sources and joins their answers.
//! The checks run concurrently, so the probe takes as long as the slowest.

use bookshelf_types::FleetHealthStatus;
use std::time::Duration;

pub struct FleetService {
    networking_delay: Duration,
    data_center_delay: Duration,
    kubernetes_delay: Duration,
}

impl Default for FleetService {
    fn default() -> Self {
        Self {
            networking_delay: Duration::from_millis(500),
            data_center_delay: Duration::from_millis(750),
            kubernetes_delay: Duration::from_millis(250),
        }
    }
}

impl FleetService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same probe with every check answering after `delay`
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            networking_delay: delay,
            data_center_delay: delay,
            kubernetes_delay: delay,
        }
    }

    pub async fn status(&self) -> FleetHealthStatus {
        let (networking, data_center, kubernetes) = tokio::join!(
            check(self.networking_delay, true),
            check(self.data_center_delay, true),
            check(self.kubernetes_delay, false),
        );

        FleetHealthStatus {
            networking,
            data_center,
            kubernetes,
        }
    }
}

async fn check(delay: Duration, healthy: bool) -> bool {
    tokio::time::sleep(delay).await;
    healthy
}
