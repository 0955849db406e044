use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::domain::ProtocolKind;
use crate::error::{ConfigError, ProtocolError};

use super::{ProtocolPort, ProtocolRequest, ProtocolResponse};

const FAILURE_STATUS: u16 = 500;

/// Parameters of the simulated port. Latency is drawn uniformly from
/// `[min_latency, max_latency]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedSettings {
    min_latency: Duration,
    max_latency: Duration,
    failure_percent: u8,
    status_code: u16,
    response_bytes: usize,
}

impl SimulatedSettings {
    /// # Errors
    ///
    /// Returns an error when `min_latency` exceeds `max_latency`.
    pub fn new(min_latency: Duration, max_latency: Duration) -> Result<Self, ConfigError> {
        if min_latency > max_latency {
            return Err(ConfigError::SimulatedLatencyRange {
                min: u64::try_from(min_latency.as_millis()).unwrap_or(u64::MAX),
                max: u64::try_from(max_latency.as_millis()).unwrap_or(u64::MAX),
            });
        }
        Ok(Self {
            min_latency,
            max_latency,
            failure_percent: 0,
            status_code: 200,
            response_bytes: 0,
        })
    }

    /// Fixed latency, never failing.
    #[must_use]
    pub const fn constant(latency: Duration) -> Self {
        Self {
            min_latency: latency,
            max_latency: latency,
            failure_percent: 0,
            status_code: 200,
            response_bytes: 0,
        }
    }

    #[must_use]
    pub fn with_failure_percent(mut self, percent: u8) -> Self {
        self.failure_percent = percent.min(100);
        self
    }

    #[must_use]
    pub const fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    #[must_use]
    pub const fn with_response_bytes(mut self, response_bytes: usize) -> Self {
        self.response_bytes = response_bytes;
        self
    }

    #[must_use]
    pub const fn failure_percent(&self) -> u8 {
        self.failure_percent
    }
}

/// Stand-in port that performs no network I/O. Used for dry runs and as the
/// engine's test double.
#[derive(Debug, Clone)]
pub struct SimulatedPort {
    settings: SimulatedSettings,
}

impl SimulatedPort {
    #[must_use]
    pub const fn new(settings: SimulatedSettings) -> Self {
        Self { settings }
    }

    fn draw(&self) -> (Duration, bool) {
        let mut rng = rand::thread_rng();
        let latency = if self.settings.min_latency == self.settings.max_latency {
            self.settings.min_latency
        } else {
            rng.gen_range(self.settings.min_latency..=self.settings.max_latency)
        };
        let failed = self.settings.failure_percent > 0
            && rng.gen_range(0..100u8) < self.settings.failure_percent;
        (latency, failed)
    }
}

#[async_trait]
impl ProtocolPort for SimulatedPort {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Simulated
    }

    async fn execute(&self, request: &ProtocolRequest) -> Result<ProtocolResponse, ProtocolError> {
        let (latency, failed) = self.draw();
        tokio::time::sleep(latency).await;

        let (status_code, message) = if failed {
            (FAILURE_STATUS, "Simulated failure".to_owned())
        } else {
            (self.settings.status_code, "OK".to_owned())
        };
        let mut headers = BTreeMap::new();
        headers.insert("x-simulated-endpoint".to_owned(), request.endpoint.clone());
        Ok(ProtocolResponse {
            success: !failed,
            status_code,
            message,
            body: vec![b'x'; self.settings.response_bytes],
            elapsed: latency,
            latency,
            headers,
        })
    }
}
