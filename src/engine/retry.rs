use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::domain::Invoice;
use crate::gateway::{PaymentError, PaymentProvider};

/// What to do after a failed charge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Stop,
}

/// Decides whether a failed charge is attempted again.
///
/// `attempt` counts the failed attempts so far, starting at 1.
pub trait RetryPolicy: Send + Sync {
    fn decide(&self, error: &PaymentError, attempt: u32) -> RetryDecision;
}

impl<F> RetryPolicy for F
where
    F: Fn(&PaymentError, u32) -> RetryDecision + Send + Sync,
{
    fn decide(&self, error: &PaymentError, attempt: u32) -> RetryDecision {
        self(error, attempt)
    }
}

/// Doubling delay between transient failures, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            max_attempts: None,
        }
    }

    /// Stop after this many total attempts
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Delay before the attempt following failure number `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }
}

impl From<&RetryConfig> for ExponentialBackoff {
    fn from(config: &RetryConfig) -> Self {
        let backoff = Self::new(config.base, config.max);
        match config.max_attempts {
            Some(attempts) => backoff.with_max_attempts(attempts),
            None => backoff,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn decide(&self, error: &PaymentError, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::Stop;
        }
        match self.max_attempts {
            Some(max) if attempt >= max => RetryDecision::Stop,
            _ => RetryDecision::RetryAfter(self.delay(attempt)),
        }
    }
}

/// Same delay between every transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }
}

impl RetryPolicy for ConstantBackoff {
    fn decide(&self, error: &PaymentError, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::Stop;
        }
        match self.max_attempts {
            Some(max) if attempt >= max => RetryDecision::Stop,
            _ => RetryDecision::RetryAfter(self.delay),
        }
    }
}

/// Charge an invoice, retrying transient failures as the policy allows.
///
/// Retry state lives in this call, so it never leaks between invoices.
pub async fn charge_with_retry<P, R>(
    provider: &P,
    invoice: &Invoice,
    policy: &R,
) -> Result<bool, PaymentError>
where
    P: PaymentProvider + ?Sized,
    R: RetryPolicy + ?Sized,
{
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        let error = match provider.charge(invoice).await {
            Ok(charged) => return Ok(charged),
            Err(e) => e,
        };

        match policy.decide(&error, attempt) {
            RetryDecision::RetryAfter(delay) => {
                warn!(
                    invoice_id = invoice.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Charge failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::Stop => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, InvoiceStatus, Money};
    use crate::gateway::ScriptedPaymentProvider;

    fn network() -> PaymentError {
        PaymentError::Network("connection reset".to_string())
    }

    fn invoice(id: u32) -> Invoice {
        Invoice::new(
            id,
            1,
            Money::parse("10", Currency::EUR).unwrap(),
            InvoiceStatus::Pending,
        )
    }

    #[test]
    fn backoff_doubles_up_to_max() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(50));

        assert_eq!(backoff.delay(1), Duration::from_millis(10));
        assert_eq!(backoff.delay(2), Duration::from_millis(20));
        assert_eq!(backoff.delay(3), Duration::from_millis(40));
        assert_eq!(backoff.delay(4), Duration::from_millis(50));
        assert_eq!(backoff.delay(40), Duration::from_millis(50));
    }

    #[test]
    fn only_transient_errors_are_retried() {
        let backoff = ExponentialBackoff::default();

        assert!(matches!(
            backoff.decide(&network(), 1),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(
            backoff.decide(&PaymentError::CustomerNotFound(1), 1),
            RetryDecision::Stop
        );
    }

    #[test]
    fn ceiling_stops_after_max_attempts() {
        let backoff = ExponentialBackoff::new(Duration::ZERO, Duration::ZERO).with_max_attempts(3);

        assert!(matches!(backoff.decide(&network(), 2), RetryDecision::RetryAfter(_)));
        assert_eq!(backoff.decide(&network(), 3), RetryDecision::Stop);
    }

    #[test]
    fn default_follows_retry_config() {
        let backoff = ExponentialBackoff::default();
        assert_eq!(backoff.delay(1), Duration::from_millis(10));
        assert_eq!(backoff.decide(&network(), 8), RetryDecision::Stop);
    }

    #[tokio::test]
    async fn retries_until_charge_succeeds() {
        let provider = ScriptedPaymentProvider::always_charge()
            .with_script(1, [Err(network()), Err(network())]);
        let policy = ConstantBackoff::new(Duration::ZERO);

        let result = charge_with_retry(&provider, &invoice(1), &policy).await;

        assert_eq!(result, Ok(true));
        assert_eq!(provider.attempts(1), 3);
    }

    #[tokio::test]
    async fn non_transient_error_returned_immediately() {
        let provider =
            ScriptedPaymentProvider::always_charge().with_script(1, [Err(PaymentError::CustomerNotFound(1))]);
        let policy = ConstantBackoff::new(Duration::ZERO);

        let result = charge_with_retry(&provider, &invoice(1), &policy).await;

        assert_eq!(result, Err(PaymentError::CustomerNotFound(1)));
        assert_eq!(provider.attempts(1), 1);
    }

    #[tokio::test]
    async fn closure_policy_gives_up() {
        let provider = ScriptedPaymentProvider::new(Err(network()));
        let policy = |_: &PaymentError, attempt: u32| {
            if attempt < 2 {
                RetryDecision::RetryAfter(Duration::ZERO)
            } else {
                RetryDecision::Stop
            }
        };

        let result = charge_with_retry(&provider, &invoice(4), &policy).await;

        assert_eq!(result, Err(network()));
        assert_eq!(provider.attempts(4), 2);
    }
}
