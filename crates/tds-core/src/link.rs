//! Trait abstraction for the physical connection to a meter.
//!
//! This module provides the [`MeterLink`] trait that abstracts over the
//! handshake with a meter, and the [`SimulatedLink`] used by default.
//! A serial or Bluetooth backend would implement the same trait and report
//! handshake failures as [`Error::DeviceUnavailable`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// Trait abstracting the meter connection handshake.
///
/// # Example
///
/// ```ignore
/// use tds_core::link::MeterLink;
///
/// async fn probe<L: MeterLink>(link: &L) -> bool {
///     link.open("COM3", 9600).await.is_ok()
/// }
/// ```
#[async_trait]
pub trait MeterLink: Send + Sync {
    /// Open the link on `port` at `baud_rate`.
    ///
    /// Opening an already open link re-opens it with the new parameters.
    async fn open(&self, port: &str, baud_rate: u32) -> Result<()>;

    /// Close the link. Closing a closed link is a no-op.
    async fn close(&self) -> Result<()>;

    /// Whether the link is currently open.
    fn is_open(&self) -> bool;
}

/// A link that accepts every port without touching hardware.
///
/// Failure injection is available for tests that need to exercise the
/// `DeviceUnavailable` path.
#[derive(Debug, Default)]
pub struct SimulatedLink {
    open: AtomicBool,
    should_fail: AtomicBool,
    close_should_fail: AtomicBool,
    open_count: AtomicU32,
}

impl SimulatedLink {
    /// Create a simulated link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `open` calls fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `close` calls fail (or succeed again).
    pub fn set_close_should_fail(&self, fail: bool) {
        self.close_should_fail.store(fail, Ordering::Relaxed);
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MeterLink for SimulatedLink {
    async fn open(&self, port: &str, baud_rate: u32) -> Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::device_unavailable(port, "simulated handshake failure"));
        }
        debug!("Simulated link opened on {} at {} baud", port, baud_rate);
        self.open.store(true, Ordering::Relaxed);
        self.open_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.close_should_fail.load(Ordering::Relaxed) {
            return Err(Error::Io(std::io::Error::other("simulated close failure")));
        }
        self.open.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_link_open_close() {
        let link = SimulatedLink::new();
        assert!(!link.is_open());

        link.open("COM3", 9600).await.unwrap();
        assert!(link.is_open());
        assert_eq!(link.open_count(), 1);

        link.close().await.unwrap();
        assert!(!link.is_open());

        // Closing twice is fine
        link.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_simulated_link_failure_injection() {
        let link = SimulatedLink::new();
        link.set_should_fail(true);

        let err = link.open("COM9", 9600).await.unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable { ref port, .. } if port == "COM9"));
        assert!(!link.is_open());
        assert_eq!(link.open_count(), 0);

        link.set_should_fail(false);
        link.open("COM9", 9600).await.unwrap();
        assert!(link.is_open());
    }

    #[tokio::test]
    async fn test_simulated_link_close_failure() {
        let link = SimulatedLink::new();
        link.open("COM3", 9600).await.unwrap();
        link.set_close_should_fail(true);

        assert!(matches!(link.close().await, Err(Error::Io(_))));
        assert!(link.is_open());

        link.set_close_should_fail(false);
        link.close().await.unwrap();
        assert!(!link.is_open());
    }
}
