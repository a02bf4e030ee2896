//! Text classifier boundary: validated probability distribution, the
//! `TextClassifier` trait, a remote sidecar implementation, and deterministic
//! doubles for tests and offline runs.
//!
//! The classifier is the engine's only external dependency. It is assumed to
//! be initialized (model artifact loaded) before the first call; a failure to
//! produce a distribution is fatal and propagates to the caller unchanged.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const ENV_CLASSIFIER_ENDPOINT: &str = "CLASSIFIER_ENDPOINT";

/// How far `safe + scam` may drift from 1 before output is rejected.
/// Matches the 4-decimal-place resolution of the verdict contract.
const DISTRIBUTION_TOLERANCE: f64 = 1e-4;

/// Two-class probability distribution returned by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub safe: f64,
    pub scam: f64,
}

impl Distribution {
    /// Construct with validation.
    pub fn new(safe: f64, scam: f64) -> anyhow::Result<Self> {
        let d = Self { safe, scam };
        d.validate()?;
        Ok(d)
    }

    /// Reject output that is not a valid two-class distribution, rather than
    /// letting out-of-range probabilities leak into a verdict.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.safe) || !(0.0..=1.0).contains(&self.scam) {
            anyhow::bail!(
                "classifier distribution out of range: safe={}, scam={}",
                self.safe,
                self.scam
            );
        }
        if (self.safe + self.scam - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            anyhow::bail!(
                "classifier distribution does not sum to 1: safe={}, scam={}",
                self.safe,
                self.scam
            );
        }
        Ok(())
    }
}

/// Trait object used by the engine (and tests).
pub trait TextClassifier: Send + Sync {
    /// Classify raw text into a `{safe, scam}` distribution.
    fn classify<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Distribution>> + Send + 'a>>;
    /// Implementation name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynTextClassifier = Arc<dyn TextClassifier>;

/// Production classifier backed by an inference sidecar over HTTP.
/// POSTs `{"text": ...}` and expects `{"safe": f64, "scam": f64}` back.
pub struct RemoteClassifier {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("scam-message-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Read the sidecar endpoint from `CLASSIFIER_ENDPOINT`.
    pub fn from_env() -> anyhow::Result<Self> {
        let endpoint = std::env::var(ENV_CLASSIFIER_ENDPOINT)
            .map_err(|_| anyhow::anyhow!("missing {} env var", ENV_CLASSIFIER_ENDPOINT))?;
        Self::new(endpoint)
    }

    async fn fetch(&self, text: &str) -> anyhow::Result<Distribution> {
        #[derive(Serialize)]
        struct Req<'a> {
            text: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            safe: f64,
            scam: f64,
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&Req { text })
            .send()
            .await
            .context("classifier sidecar request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("classifier sidecar returned status {}", status);
        }

        let body: Resp = resp
            .json()
            .await
            .context("classifier sidecar returned malformed body")?;
        Distribution::new(body.safe, body.scam)
    }
}

impl TextClassifier for RemoteClassifier {
    fn classify<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Distribution>> + Send + 'a>> {
        Box::pin(self.fetch(text))
    }
    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Deterministic classifier returning a fixed distribution; counts calls so
/// tests can assert the short-circuit branches never consult the model.
pub struct FixedClassifier {
    dist: Distribution,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(dist: Distribution) -> Self {
        Self {
            dist,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `classify` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextClassifier for FixedClassifier {
    fn classify<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Distribution>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.dist;
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Always fails; models an unavailable inference backend.
pub struct FailingClassifier;

impl TextClassifier for FailingClassifier {
    fn classify<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Distribution>> + Send + 'a>> {
        Box::pin(async { Err(anyhow::anyhow!("inference backend unavailable")) })
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_distribution_passes() {
        assert!(Distribution::new(0.6, 0.4).is_ok());
        assert!(Distribution::new(1.0, 0.0).is_ok());
    }

    #[test]
    fn out_of_range_distribution_rejected() {
        assert!(Distribution::new(-0.1, 1.1).is_err());
        assert!(Distribution::new(1.5, -0.5).is_err());
    }

    #[test]
    fn non_unit_sum_rejected() {
        let err = Distribution::new(0.9, 0.9).unwrap_err();
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn sum_tolerance_is_lenient_at_contract_resolution() {
        // 4-dp drift is acceptable, anything larger is not.
        assert!(Distribution::new(0.60004, 0.39999).is_ok());
        assert!(Distribution::new(0.601, 0.4).is_err());
    }

    #[tokio::test]
    async fn fixed_classifier_counts_calls() {
        let c = FixedClassifier::new(Distribution { safe: 0.7, scam: 0.3 });
        assert_eq!(c.calls(), 0);
        let d = c.classify("anything").await.unwrap();
        assert_eq!(d, Distribution { safe: 0.7, scam: 0.3 });
        assert_eq!(c.calls(), 1);
    }

    #[tokio::test]
    async fn failing_classifier_errors() {
        let c = FailingClassifier;
        assert!(c.classify("anything").await.is_err());
    }
}
