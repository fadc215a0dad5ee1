//! Analysis configuration, populated from environment variables.

use apiweave::AnalysisConfig;

/// Build an [`AnalysisConfig`] from the environment, applying the library
/// defaults where a variable is absent or does not parse.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `WEAVE_REQUIRED_QUERY_RATIO` | `0.8` | Share of a group's calls a query key must appear in to be required |
/// | `WEAVE_SCHEMA_ARRAY_SAMPLE` | `20` | Array elements inferred per array during schema inference |
/// | `WEAVE_ARTIFACT_DEPTH` | `4` | JSON nesting walked when extracting graph artifacts |
/// | `WEAVE_KEEP_NOISE` | (absent) | Any of `1`, `true`, `yes` keeps static assets, trackers, HTML page loads, and non-API calls |
pub fn from_env() -> AnalysisConfig {
    let defaults = AnalysisConfig::default();

    let required_query_ratio = env_parse::<f64>("WEAVE_REQUIRED_QUERY_RATIO")
        .filter(|r| (0.0..=1.0).contains(r))
        .unwrap_or(defaults.required_query_ratio);

    let schema_array_sample = env_parse::<usize>("WEAVE_SCHEMA_ARRAY_SAMPLE")
        .filter(|n| *n > 0)
        .unwrap_or(defaults.schema_array_sample);

    let artifact_max_depth =
        env_parse::<usize>("WEAVE_ARTIFACT_DEPTH").unwrap_or(defaults.artifact_max_depth);

    let keep_noise = std::env::var("WEAVE_KEEP_NOISE")
        .map(|v| is_truthy(&v))
        .unwrap_or(false);

    AnalysisConfig {
        required_query_ratio,
        schema_array_sample,
        artifact_max_depth,
        filter_noise: !keep_noise,
        ..defaults
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
