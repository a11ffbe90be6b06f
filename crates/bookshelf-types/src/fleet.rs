//! Fleet health types

use serde::{Deserialize, Serialize};

/// Combined result of the infrastructure health probes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetHealthStatus {
    pub networking: bool,
    pub data_center: bool,
    pub kubernetes: bool,
}

impl FleetHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.networking && self.data_center && self.kubernetes
    }
}
