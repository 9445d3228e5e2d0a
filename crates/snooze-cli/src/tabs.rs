//! ConsoleTabs: the simulated tab host used by `serve`.
//!
//! Tabs live in memory. Restored tabs are logged so a user watching stderr
//! sees them "open".

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use snooze_core::domain::{SourceRef, TabPayload, WindowId};
use snooze_core::impls::InMemoryTabs;
use snooze_core::ports::{HostError, TabHost, TabSnapshot};

pub struct ConsoleTabs {
    inner: InMemoryTabs,
}

impl ConsoleTabs {
    pub fn new(tabs: Vec<TabSnapshot>) -> Self {
        Self {
            inner: InMemoryTabs::with_tabs(tabs),
        }
    }

    /// Load seed tabs from a JSON array of `{id, url, title, favIconUrl?, windowId?}`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading tabs from {}", path.display()))?;
        let tabs: Vec<TabSnapshot> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing tabs from {}", path.display()))?;
        Ok(Self::new(tabs))
    }
}

#[async_trait]
impl TabHost for ConsoleTabs {
    async fn get(&self, tab: SourceRef) -> Result<TabSnapshot, HostError> {
        self.inner.get(tab).await
    }

    async fn create(
        &self,
        payload: &TabPayload,
        window: Option<WindowId>,
    ) -> Result<SourceRef, HostError> {
        let tab = self.inner.create(payload, window).await?;
        tracing::info!(%tab, url = %payload.url, title = %payload.title, "tab opened");
        Ok(tab)
    }

    async fn remove(&self, tab: SourceRef) -> Result<(), HostError> {
        self.inner.remove(tab).await?;
        tracing::info!(%tab, "tab closed");
        Ok(())
    }
}
