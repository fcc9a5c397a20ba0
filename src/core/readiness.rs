use crate::domain::model::Readiness;
use crate::domain::ports::PageSession;
use crate::utils::error::{RenderError, Result};
use serde_json::Value;
use tokio::time::{sleep, Instant};

/// Polls `condition` in the page until it evaluates to `true`.
///
/// Errors from the evaluation itself abort the wait; a condition that stays
/// falsy past `readiness.timeout` yields [`RenderError::ReadinessTimeout`].
pub async fn wait_until<P>(
    session: &mut P,
    stage: &str,
    condition: &str,
    readiness: &Readiness,
) -> Result<()>
where
    P: PageSession + ?Sized,
{
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        polls += 1;
        if session.evaluate(condition).await? == Value::Bool(true) {
            tracing::debug!(
                "Stage '{}' ready after {} poll(s), {:?}",
                stage,
                polls,
                started.elapsed()
            );
            if !readiness.settle.is_zero() {
                sleep(readiness.settle).await;
            }
            return Ok(());
        }

        let elapsed = started.elapsed();
        if elapsed >= readiness.timeout {
            return Err(RenderError::ReadinessTimeout {
                stage: stage.to_string(),
                waited_ms: elapsed.as_millis() as u64,
            });
        }

        sleep(readiness.poll_interval.min(readiness.timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PdfOptions;
    use async_trait::async_trait;
    use std::time::Duration;
    use url::Url;

    /// Answers `false` a fixed number of times, then `true`.
    struct CountdownSession {
        falsy_answers: u32,
        evaluations: u32,
    }

    #[async_trait]
    impl PageSession for CountdownSession {
        async fn navigate(&mut self, _url: &Url, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn evaluate(&mut self, _expression: &str) -> Result<Value> {
            self.evaluations += 1;
            if self.evaluations > self.falsy_answers {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(false))
            }
        }

        async fn print_pdf(&mut self, _options: &PdfOptions) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn fast_readiness(timeout_ms: u64) -> Readiness {
        Readiness {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(5),
            settle: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_wait_until_polls_until_true() {
        let mut session = CountdownSession {
            falsy_answers: 3,
            evaluations: 0,
        };

        wait_until(&mut session, "page-ready", "true", &fast_readiness(2_000))
            .await
            .unwrap();

        assert_eq!(session.evaluations, 4);
    }

    #[tokio::test]
    async fn test_wait_until_times_out_with_stage() {
        let mut session = CountdownSession {
            falsy_answers: u32::MAX,
            evaluations: 0,
        };

        let err = wait_until(&mut session, "styles-ready", "false", &fast_readiness(40))
            .await
            .unwrap_err();

        match err {
            RenderError::ReadinessTimeout { stage, waited_ms } => {
                assert_eq!(stage, "styles-ready");
                assert!(waited_ms >= 40);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(session.evaluations > 1);
    }

    #[tokio::test]
    async fn test_non_boolean_values_are_not_ready() {
        struct StringSession;

        #[async_trait]
        impl PageSession for StringSession {
            async fn navigate(&mut self, _url: &Url, _timeout: Duration) -> Result<()> {
                Ok(())
            }
            async fn evaluate(&mut self, _expression: &str) -> Result<Value> {
                Ok(Value::String("true".to_string()))
            }
            async fn print_pdf(&mut self, _options: &PdfOptions) -> Result<Vec<u8>> {
                Ok(Vec::new())
            }
            async fn close(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let result = wait_until(&mut StringSession, "theme-ready", "'true'", &fast_readiness(20)).await;
        assert!(matches!(result, Err(RenderError::ReadinessTimeout { .. })));
    }

    #[tokio::test]
    async fn test_script_error_aborts_without_waiting() {
        struct ThrowingSession {
            evaluations: u32,
        }

        #[async_trait]
        impl PageSession for ThrowingSession {
            async fn navigate(&mut self, _url: &Url, _timeout: Duration) -> Result<()> {
                Ok(())
            }
            async fn evaluate(&mut self, _expression: &str) -> Result<Value> {
                self.evaluations += 1;
                Err(RenderError::ScriptError {
                    stage: "styles-ready".to_string(),
                    message: "SyntaxError: '[[' is not a valid selector.".to_string(),
                })
            }
            async fn print_pdf(&mut self, _options: &PdfOptions) -> Result<Vec<u8>> {
                Ok(Vec::new())
            }
            async fn close(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let mut session = ThrowingSession { evaluations: 0 };
        let err = wait_until(&mut session, "styles-ready", "[[", &fast_readiness(5_000))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::ScriptError { .. }));
        assert_eq!(session.evaluations, 1);
    }
}
