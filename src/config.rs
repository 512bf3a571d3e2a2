use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::ClusterOptions;
use crate::constants::aggregate::{
    DEFAULT_CLUSTER_CAP, DEFAULT_CLUSTER_PRECISION, DEFAULT_TOP_LABELS,
};
use crate::data::SourceKind;
use crate::errors::PipelineError;
use crate::filter::SpeciesRegistry;
use crate::source::DataSource;
use crate::source::decode::DataFormat;
use crate::source::sources::file_source::{FileSource, FileSourceConfig};
use crate::types::{FieldName, SourceId};

/// Refresh cadence hints per source kind, in seconds.
///
/// The crate does not run timers; callers poll [`RefreshSchedule::is_due`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSchedule {
    /// Fisheries occurrence feeds change slowly.
    pub fisheries_secs: u64,
    /// Cyclone feeds during active seasons.
    pub cyclone_secs: u64,
    /// Gridded ocean parameters.
    pub ocean_secs: u64,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            fisheries_secs: 24 * 60 * 60,
            cyclone_secs: 60 * 60,
            ocean_secs: 15 * 60,
        }
    }
}

impl RefreshSchedule {
    /// Refresh interval for `kind`.
    pub fn interval(&self, kind: SourceKind) -> Duration {
        Duration::from_secs(match kind {
            SourceKind::Fisheries => self.fisheries_secs,
            SourceKind::CycloneTrackPoint => self.cyclone_secs,
            SourceKind::OceanParameter => self.ocean_secs,
        })
    }

    /// True when a source of `kind` last fetched at `last_fetch` should refresh at `now`.
    pub fn is_due(
        &self,
        kind: SourceKind,
        last_fetch: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(last_fetch) = last_fetch else {
            return true;
        };
        let elapsed = now.signed_duration_since(last_fetch);
        elapsed
            .to_std()
            .map(|elapsed| elapsed >= self.interval(kind))
            .unwrap_or(false)
    }
}

/// Aggregation and refresh settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Decimal digits kept when clustering coordinates.
    pub cluster_precision: u32,
    /// Maximum clusters returned for map rendering.
    pub cluster_cap: usize,
    /// Number of labels in top-N rankings.
    pub top_labels: usize,
    /// Refresh cadence hints.
    pub refresh: RefreshSchedule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster_precision: DEFAULT_CLUSTER_PRECISION,
            cluster_cap: DEFAULT_CLUSTER_CAP,
            top_labels: DEFAULT_TOP_LABELS,
            refresh: RefreshSchedule::default(),
        }
    }
}

impl PipelineConfig {
    /// Override cluster precision.
    pub fn with_cluster_precision(mut self, precision: u32) -> Self {
        self.cluster_precision = precision;
        self
    }

    /// Override the cluster cap.
    pub fn with_cluster_cap(mut self, cap: usize) -> Self {
        self.cluster_cap = cap;
        self
    }

    /// Override the top-N label count.
    pub fn with_top_labels(mut self, top_labels: usize) -> Self {
        self.top_labels = top_labels;
        self
    }

    /// Override refresh cadence hints.
    pub fn with_refresh(mut self, refresh: RefreshSchedule) -> Self {
        self.refresh = refresh;
        self
    }

    /// Clustering options derived from this config.
    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions::default()
            .with_precision(self.cluster_precision)
            .with_cap(self.cluster_cap)
    }
}

/// One file-backed source declared in a manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    /// Source identifier; unique within a manifest.
    pub id: SourceId,
    /// Record kind.
    pub kind: SourceKind,
    /// File or directory, relative to the manifest when not absolute.
    pub path: PathBuf,
    /// Forced payload format.
    #[serde(default)]
    pub format: Option<DataFormat>,
    /// Fields attached to rows that lack them (for example `season`).
    #[serde(default)]
    pub fields: IndexMap<FieldName, String>,
    /// Whether to follow symlinks during directory walks.
    #[serde(default = "default_follow_links")]
    pub follow_links: bool,
}

fn default_follow_links() -> bool {
    true
}

impl SourceEntry {
    /// File source configuration for this entry.
    pub fn file_source_config(&self) -> FileSourceConfig {
        let mut config = FileSourceConfig::new(self.id.clone(), self.path.clone(), self.kind)
            .with_follow_links(self.follow_links);
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        for (name, value) in &self.fields {
            config = config.with_static_field(name.clone(), value.clone());
        }
        config
    }
}

/// JSON manifest listing sources, an optional species registry, and settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceManifest {
    /// Declared sources in refresh/registration order.
    pub sources: Vec<SourceEntry>,
    /// Optional species registry JSON file.
    #[serde(default)]
    pub registry: Option<PathBuf>,
    /// Pipeline settings.
    #[serde(default)]
    pub config: PipelineConfig,
}

impl SourceManifest {
    /// Parse a manifest from JSON text. Relative paths stay relative.
    pub fn from_json_str(text: &str) -> Result<Self, PipelineError> {
        let manifest: Self = serde_json::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)?;
        let manifest = Self::from_json_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(manifest.resolve_paths(base))
    }

    /// Make relative source and registry paths relative to `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for entry in &mut self.sources {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
        if let Some(registry) = self.registry.as_mut() {
            if registry.is_relative() {
                *registry = base.join(&*registry);
            }
        }
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.sources.is_empty() {
            return Err(PipelineError::Configuration(
                "manifest declares no sources".into(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &self.sources {
            if entry.id.trim().is_empty() {
                return Err(PipelineError::Configuration(
                    "source id must not be empty".into(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "duplicate source id '{}'",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    /// Build a file source per entry.
    pub fn build_sources(&self) -> Vec<Box<dyn DataSource>> {
        self.sources
            .iter()
            .map(|entry| Box::new(FileSource::new(entry.file_source_config())) as Box<dyn DataSource>)
            .collect()
    }

    /// Load the species registry, if one is declared.
    pub fn load_registry(&self) -> Result<Option<SpeciesRegistry>, PipelineError> {
        let Some(path) = &self.registry else {
            return Ok(None);
        };
        let text = fs::read_to_string(path)?;
        SpeciesRegistry::from_json_str(&text).map(Some)
    }
}
