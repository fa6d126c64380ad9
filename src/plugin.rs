//! Post-processing plugins.
//!
//! Plugins run after the engine, on finished tokens. There are two
//! capabilities:
//!
//! - [`TokenProcessor`]: maps one token to an annotated copy (`Token -> Token`).
//! - [`Analyzer`]: reads every token of a log and returns a JSON report.
//!
//! A [`PluginRegistry`] holds plugins in registration order under a stable id.
//! The engine never sees it; callers decide when to run it.
//!
//! ```text
//! Vec<LineBatch> ── process ──▶ processor #1 ─▶ processor #2 ─▶ Vec<LineBatch>
//!                └─ analyze ──▶ analyzer  #1, analyzer #2     ─▶ Vec<AnalysisReport>
//! ```

#[path = "plugin/builtin.rs"]
mod builtin;

pub use builtin::{CharCount, DiceStats, SessionClock};

use serde::Serialize;
use tracing::{info, warn};

use crate::{LineBatch, PluginError, Token};

/// Identity shared by every plugin.
pub trait Plugin: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &str;

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}

pub trait TokenProcessor: Plugin {
    fn process(&self, token: Token) -> Token;
}

pub trait Analyzer: Plugin {
    fn analyze(&self, tokens: &[Token]) -> serde_json::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Processor,
    Analyzer,
}

/// A registered plugin, by capability.
pub enum Capability {
    Processor(Box<dyn TokenProcessor>),
    Analyzer(Box<dyn Analyzer>),
}

impl Capability {
    pub fn id(&self) -> &str {
        match self {
            Capability::Processor(p) => p.id(),
            Capability::Analyzer(a) => a.id(),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Capability::Processor(p) => p.version(),
            Capability::Analyzer(a) => a.version(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        match self {
            Capability::Processor(_) => PluginKind::Processor,
            Capability::Analyzer(_) => PluginKind::Analyzer,
        }
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability").field("id", &self.id()).field("kind", &self.kind()).finish()
    }
}

/// Summary row returned by [`PluginRegistry::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub id: String,
    pub version: String,
    pub kind: PluginKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PluginStats {
    pub total: usize,
    pub enabled: usize,
    pub processors: usize,
    pub analyzers: usize,
}

/// One analyzer's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub plugin: String,
    pub report: serde_json::Value,
}

#[derive(Debug)]
struct Entry {
    plugin: Capability,
    enabled: bool,
}

/// Ordered, id-keyed plugin collection. New plugins start enabled.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: Vec<Entry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`CharCount`], [`DiceStats`] and [`SessionClock`].
    pub fn with_builtins() -> Self {
        let entries = [
            Capability::Processor(Box::new(CharCount)),
            Capability::Analyzer(Box::new(DiceStats::default())),
            Capability::Analyzer(Box::new(SessionClock)),
        ]
        .into_iter()
        .map(|plugin| Entry { plugin, enabled: true })
        .collect();
        PluginRegistry { entries }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.plugin.id() == id)
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry, PluginError> {
        match self.position(id) {
            Some(idx) => Ok(&mut self.entries[idx]),
            None => {
                warn!(plugin = id, "plugin not registered");
                Err(PluginError::NotFound(id.to_string()))
            }
        }
    }

    pub fn register(&mut self, plugin: Capability) -> Result<(), PluginError> {
        if self.position(plugin.id()).is_some() {
            warn!(plugin = plugin.id(), "plugin already registered");
            return Err(PluginError::AlreadyRegistered(plugin.id().to_string()));
        }
        info!(plugin = plugin.id(), version = plugin.version(), kind = ?plugin.kind(), "plugin registered");
        self.entries.push(Entry { plugin, enabled: true });
        Ok(())
    }

    pub fn register_processor(&mut self, processor: impl TokenProcessor + 'static) -> Result<(), PluginError> {
        self.register(Capability::Processor(Box::new(processor)))
    }

    pub fn register_analyzer(&mut self, analyzer: impl Analyzer + 'static) -> Result<(), PluginError> {
        self.register(Capability::Analyzer(Box::new(analyzer)))
    }

    /// Swap in `plugin` under its id, keeping position and enabled state.
    /// Appends when the id is new. Returns the plugin it displaced.
    pub fn replace(&mut self, plugin: Capability) -> Option<Capability> {
        match self.position(plugin.id()) {
            Some(idx) => {
                info!(plugin = plugin.id(), version = plugin.version(), "plugin replaced");
                Some(std::mem::replace(&mut self.entries[idx].plugin, plugin))
            }
            None => {
                info!(plugin = plugin.id(), version = plugin.version(), "plugin registered");
                self.entries.push(Entry { plugin, enabled: true });
                None
            }
        }
    }

    pub fn unregister(&mut self, id: &str) -> Result<Capability, PluginError> {
        let Some(idx) = self.position(id) else {
            warn!(plugin = id, "plugin not registered");
            return Err(PluginError::NotFound(id.to_string()));
        };
        info!(plugin = id, "plugin unregistered");
        Ok(self.entries.remove(idx).plugin)
    }

    pub fn enable(&mut self, id: &str) -> Result<(), PluginError> {
        self.entry_mut(id)?.enabled = true;
        info!(plugin = id, "plugin enabled");
        Ok(())
    }

    pub fn disable(&mut self, id: &str) -> Result<(), PluginError> {
        self.entry_mut(id)?.enabled = false;
        info!(plugin = id, "plugin disabled");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Capability> {
        self.position(id).map(|idx| &self.entries[idx].plugin)
    }

    pub fn is_enabled(&self, id: &str) -> Option<bool> {
        self.position(id).map(|idx| self.entries[idx].enabled)
    }

    pub fn list(&self) -> Vec<PluginInfo> {
        self.entries
            .iter()
            .map(|e| PluginInfo {
                id: e.plugin.id().to_string(),
                version: e.plugin.version().to_string(),
                kind: e.plugin.kind(),
                enabled: e.enabled,
            })
            .collect()
    }

    pub fn stats(&self) -> PluginStats {
        let mut stats = PluginStats { total: self.entries.len(), ..PluginStats::default() };
        for entry in &self.entries {
            if entry.enabled {
                stats.enabled += 1;
            }
            match entry.plugin.kind() {
                PluginKind::Processor => stats.processors += 1,
                PluginKind::Analyzer => stats.analyzers += 1,
            }
        }
        stats
    }

    fn processors(&self) -> impl Iterator<Item = &dyn TokenProcessor> {
        self.entries.iter().filter(|e| e.enabled).filter_map(|e| match &e.plugin {
            Capability::Processor(p) => Some(&**p),
            Capability::Analyzer(_) => None,
        })
    }

    /// Run every enabled processor, in registration order, over one token.
    pub fn process_token(&self, token: Token) -> Token {
        self.processors().fold(token, |token, p| p.process(token))
    }

    /// Run every enabled processor over every token of `batches`.
    pub fn process(&self, batches: Vec<LineBatch>) -> Vec<LineBatch> {
        batches
            .into_iter()
            .map(|mut batch| {
                batch.tokens = batch.tokens.into_iter().map(|t| self.process_token(t)).collect();
                batch
            })
            .collect()
    }

    /// Reports from every enabled analyzer, in registration order.
    pub fn analyze(&self, tokens: &[Token]) -> Vec<AnalysisReport> {
        self.entries
            .iter()
            .filter(|e| e.enabled)
            .filter_map(|e| match &e.plugin {
                Capability::Analyzer(a) => Some(AnalysisReport { plugin: a.id().to_string(), report: a.analyze(tokens) }),
                Capability::Processor(_) => None,
            })
            .collect()
    }

    /// [`analyze`](Self::analyze) over the tokens of a whole log.
    pub fn analyze_batches(&self, batches: &[LineBatch]) -> Vec<AnalysisReport> {
        let tokens: Vec<Token> = batches.iter().flat_map(|b| b.tokens.iter().cloned()).collect();
        self.analyze(&tokens)
    }
}
