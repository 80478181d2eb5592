//! Collateral configuration.
//!
//! The set of supported collateral assets and their price feeds is fixed at
//! construction time: an ordered list of assets, each paired positionally
//! with exactly one feed. There is no way to add or remove an asset after
//! construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{AssetId, FeedId};
use crate::error::{Error, Result};
use crate::utils::constants::MAX_PRICE_AGE_SECS;

/// Immutable collateral configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Supported assets in construction order, paired with their feeds
    entries: Vec<(AssetId, FeedId)>,
    /// Asset lookup index into `entries`
    #[serde(skip)]
    index: HashMap<AssetId, usize>,
    /// Maximum acceptable price quote age in seconds
    max_price_age_secs: u64,
}

impl CollateralConfig {
    /// Build a configuration from positionally paired asset and feed lists.
    ///
    /// Fails with `LengthMismatch` if the lists differ in length and with
    /// `DuplicateAsset` if an asset appears twice.
    pub fn new(assets: Vec<AssetId>, feeds: Vec<FeedId>) -> Result<Self> {
        if assets.len() != feeds.len() {
            return Err(Error::LengthMismatch {
                assets: assets.len(),
                feeds: feeds.len(),
            });
        }

        let mut index = HashMap::with_capacity(assets.len());
        let entries: Vec<(AssetId, FeedId)> = assets.into_iter().zip(feeds).collect();
        for (i, (asset, _)) in entries.iter().enumerate() {
            if index.insert(asset.clone(), i).is_some() {
                return Err(Error::DuplicateAsset(asset.to_string()));
            }
        }

        Ok(Self {
            entries,
            index,
            max_price_age_secs: MAX_PRICE_AGE_SECS,
        })
    }

    /// Override the staleness window (builder style)
    pub fn with_max_price_age(mut self, secs: u64) -> Self {
        self.max_price_age_secs = secs;
        self
    }

    /// Whether the asset is part of the configured collateral set
    pub fn is_supported(&self, asset: &AssetId) -> bool {
        self.index.contains_key(asset)
    }

    /// The feed configured for an asset, if the asset is supported
    pub fn feed_for(&self, asset: &AssetId) -> Option<&FeedId> {
        self.index.get(asset).map(|&i| &self.entries[i].1)
    }

    /// Supported assets in construction order
    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.entries.iter().map(|(asset, _)| asset)
    }

    /// Number of configured assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no assets are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum acceptable quote age in seconds
    pub fn max_price_age_secs(&self) -> u64 {
        self.max_price_age_secs
    }

    /// Rebuild the lookup index after deserialization
    pub fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (asset, _))| (asset.clone(), i))
            .collect();
    }
}
