// src/signals.rs
//! Signal extractor primitives: catalogue config types, regex compilation,
//! and the scan pass that counts scam/safe pattern hits per message.
//!
//! The catalogue is an immutable, ordered table built once at load time.
//! A built-in catalogue is embedded from `config/signals.toml`; set
//! `SIGNALS_CONFIG_PATH` to load an alternative file instead.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_SIGNALS_CONFIG_PATH: &str = "config/signals.toml";
pub const ENV_SIGNALS_CONFIG_PATH: &str = "SIGNALS_CONFIG_PATH";

static DEFAULT_CATALOG: Lazy<Arc<SignalCatalog>> = Lazy::new(|| {
    let raw = include_str!("../config/signals.toml");
    Arc::new(SignalCatalog::from_toml_str(raw).expect("valid built-in signal catalogue"))
});

/// Direction of evidence a category contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Scam,
    Safe,
}

/// One catalogue entry as declared in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalCfg {
    pub id: String,
    pub kind: SignalKind,
    /// Human-readable display label. Required for SCAM entries (it is what
    /// ends up in `Verdict::signals`); SAFE entries contribute counts only.
    #[serde(default)]
    pub label: Option<String>,
    /// Regex, compiled case-insensitively.
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogRoot {
    signals: Vec<SignalCfg>,
}

#[derive(Debug)]
struct CompiledSignal {
    cfg: SignalCfg,
    re: Regex,
}

/// Ordered, compiled pattern catalogue. Construction validates every entry;
/// after that the catalogue is read-only and shareable across threads.
#[derive(Debug)]
pub struct SignalCatalog {
    signals: Vec<CompiledSignal>,
}

impl SignalCatalog {
    /// Parse and compile a catalogue from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: CatalogRoot = toml::from_str(toml_str)?;
        let signals = root
            .signals
            .into_iter()
            .map(|cfg| {
                if cfg.kind == SignalKind::Scam && cfg.label.is_none() {
                    anyhow::bail!("scam signal `{}` is missing a display label", cfg.id);
                }
                let re = RegexBuilder::new(&cfg.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| anyhow::anyhow!("signal `{}` regex error: {}", cfg.id, e))?;
                Ok(CompiledSignal { cfg, re })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { signals })
    }

    /// Load a catalogue from a TOML file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("failed to read signal catalogue at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Result of scanning one message. Created per call, discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalMatches {
    pub scam_count: usize,
    pub safe_count: usize,
    /// Display labels of matched SCAM categories, in catalogue order,
    /// at most one entry per category.
    pub scam_labels: Vec<String>,
}

/// Stateless scanner over a shared catalogue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    catalog: Arc<SignalCatalog>,
}

impl SignalExtractor {
    /// Extractor over the built-in catalogue.
    pub fn new() -> Self {
        Self {
            catalog: Arc::clone(&DEFAULT_CATALOG),
        }
    }

    /// Extractor over an explicit catalogue (tests, alternative deployments).
    pub fn with_catalog(catalog: SignalCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Resolve the catalogue from `SIGNALS_CONFIG_PATH` if set, otherwise
    /// fall back to the built-in one.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(ENV_SIGNALS_CONFIG_PATH) {
            Ok(p) => Ok(Self::with_catalog(SignalCatalog::from_path(&PathBuf::from(p))?)),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Scan a message against the catalogue. Case-insensitive; each category
    /// matches at most once. Pure function of the input and the catalogue.
    pub fn scan(&self, text: &str) -> SignalMatches {
        let text = text.to_lowercase();
        let mut m = SignalMatches::default();

        for s in &self.catalog.signals {
            if !s.re.is_match(&text) {
                continue;
            }
            match s.cfg.kind {
                SignalKind::Scam => {
                    m.scam_count += 1;
                    let label = s.cfg.label.clone().unwrap_or_else(|| s.cfg.id.clone());
                    m.scam_labels.push(label);
                }
                SignalKind::Safe => m.safe_count += 1,
            }
        }

        m
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new()
    }
}
