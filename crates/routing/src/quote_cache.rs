use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::{DexQuotes, TokenAddress};

/// DEX quotes for one planning call, keyed by the token being acquired.
///
/// Concurrent callers asking for the same key share a single in-flight fetch.
#[derive(Debug, Clone, Default)]
pub struct QuoteCache {
    entries: Arc<DashMap<TokenAddress, Arc<OnceCell<Arc<DexQuotes>>>>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, required: TokenAddress, fetch: F) -> Arc<DexQuotes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DexQuotes>,
    {
        // clone the cell out so the shard lock is released before awaiting
        let cell = {
            let entry = self
                .entries
                .entry(required)
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };
        let quotes = cell
            .get_or_init(|| async move { Arc::new(fetch().await) })
            .await;
        Arc::clone(quotes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
