//! Tunable thresholds for an analysis run.

/// Limits and thresholds used by every stage of the pipeline.
///
/// The defaults suit browser captures of tens to hundreds of calls; callers
/// normally only touch `filter_noise` or the query ratio.
///
/// | Field | Default | Used by |
/// |-------|---------|---------|
/// | `schema_array_sample` | `20` | schema inference: array elements inferred per array |
/// | `required_query_ratio` | `0.8` | analyzer: share of exchanges a query key must appear in |
/// | `artifact_max_depth` | `4` | graph builder: JSON nesting walked for artifacts |
/// | `artifact_array_sample` | `3` | graph builder: array elements walked per array |
/// | `artifact_max_keys` | `60` | graph builder: keys walked per object level |
/// | `max_weak_matches` | `3` | graph builder: name-only matches counted per call pair |
/// | `max_edge_labels` | `12` | graph builder: evidence labels kept per edge |
/// | `filter_noise` | `true` | session: drop static assets, trackers, HTML navigations, non-API calls |
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub schema_array_sample: usize,
    pub required_query_ratio: f64,
    pub artifact_max_depth: usize,
    pub artifact_array_sample: usize,
    pub artifact_max_keys: usize,
    pub max_weak_matches: usize,
    pub max_edge_labels: usize,
    pub filter_noise: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema_array_sample: 20,
            required_query_ratio: 0.8,
            artifact_max_depth: 4,
            artifact_array_sample: 3,
            artifact_max_keys: 60,
            max_weak_matches: 3,
            max_edge_labels: 12,
            filter_noise: true,
        }
    }
}
