use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Latching view of the shutdown channel for one worker.
///
/// A broadcast message is consumed on receipt, so the first observation is
/// remembered and every later check reports the stop.
#[derive(Debug)]
pub struct StopSignal {
    rx: ShutdownReceiver,
    stopped: bool,
    closed: bool,
}

impl StopSignal {
    #[must_use]
    pub const fn new(rx: ShutdownReceiver) -> Self {
        Self {
            rx,
            stopped: false,
            closed: false,
        }
    }

    /// Non-blocking check. A closed channel can no longer deliver a stop.
    pub fn is_stopped(&mut self) -> bool {
        if self.stopped || self.closed {
            return self.stopped;
        }
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Lagged(_)) => self.stopped = true,
            Err(TryRecvError::Closed) => self.closed = true,
            Err(TryRecvError::Empty) => {}
        }
        self.stopped
    }

    /// Sleeps for `duration` unless a stop arrives first. Returns `true` when
    /// the full duration elapsed.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_stopped() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return true,
                result = self.rx.recv(), if !self.closed => match result {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        self.stopped = true;
                        return false;
                    }
                    Err(RecvError::Closed) => self.closed = true,
                },
            }
        }
    }
}
