use core::future::Future;

use embassy_time::{with_timeout, Duration, TimeoutError};

/// Upper bound for a blocking operation.
///
/// Public APIs take milliseconds where `0` means "wait forever";
/// [`Timeout::from_millis`] performs that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    Forever,
    After(Duration),
}

impl Timeout {
    pub const fn from_millis(ms: u32) -> Self {
        if ms == 0 {
            Timeout::Forever
        } else {
            Timeout::After(Duration::from_millis(ms as u64))
        }
    }

    /// Drive `fut` to completion unless the timeout expires first.
    pub async fn run<F: Future>(
        self,
        fut: F,
    ) -> Result<F::Output, TimeoutError> {
        match self {
            Timeout::Forever => Ok(fut.await),
            Timeout::After(duration) => with_timeout(duration, fut).await,
        }
    }
}

impl From<u32> for Timeout {
    fn from(ms: u32) -> Self {
        Timeout::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_millis_waits_forever() {
        assert_eq!(Timeout::from_millis(0), Timeout::Forever);
        assert_eq!(
            Timeout::from(250),
            Timeout::After(Duration::from_millis(250))
        );
    }

    #[futures_test::test]
    async fn expires_on_pending_future() {
        let result =
            Timeout::from_millis(10).run(core::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[futures_test::test]
    async fn forever_returns_ready_output() {
        assert_eq!(Timeout::Forever.run(async { 7 }).await.ok(), Some(7));
    }
}
