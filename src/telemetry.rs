//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL replaces the base filter (e.g. "debug" or detailed directives
//!   like "info,workflow=debug,transport=debug,tower_http=info").
//! - STUDIO_LOG layers directives for the studio targets on top of the base,
//!   so "workflow=trace" raises one target without restating the rest.
//! - LOG_FORMAT selects "pretty" (default), "compact" or "json".
//!
//! Targets in use: `lesson_studio` (host), `workflow` (both controllers),
//! `transport` (content API calls), `admin` (prompt configs).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,lesson_studio=debug,workflow=debug,transport=info,admin=info,tower_http=info,axum=info";

const STUDIO_TARGETS: [&str; 4] = ["lesson_studio", "workflow", "transport", "admin"];

/// Joins the base filter with studio overrides. Override directives naming
/// anything other than a studio target are dropped with the returned list.
pub fn filter_directives(base: Option<&str>, overrides: Option<&str>) -> (String, Vec<String>) {
    let base = base.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_FILTER);
    let mut directives = vec![base.to_string()];
    let mut rejected = Vec::new();

    for directive in overrides.unwrap_or_default().split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let target = directive.split('=').next().unwrap_or_default();
        if STUDIO_TARGETS.contains(&target) && directive.contains('=') {
            directives.push(directive.to_string());
        } else {
            rejected.push(directive.to_string());
        }
    }
    (directives.join(","), rejected)
}

pub fn init_tracing() {
    let base = std::env::var("LOG_LEVEL").ok();
    let overrides = std::env::var("STUDIO_LOG").ok();
    let (directives, rejected) = filter_directives(base.as_deref(), overrides.as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        Ok("compact") => builder.compact().init(),
        _ => builder.init(),
    }

    if !rejected.is_empty() {
        tracing::warn!(target: "lesson_studio", ?rejected, "Ignored STUDIO_LOG directives for non-studio targets");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let (directives, rejected) = filter_directives(None, None);
        assert_eq!(directives, DEFAULT_FILTER);
        assert!(rejected.is_empty());
    }

    #[test]
    fn studio_overrides_layer_on_the_base() {
        let (directives, rejected) = filter_directives(Some("warn"), Some("workflow=trace, transport=debug"));
        assert_eq!(directives, "warn,workflow=trace,transport=debug");
        assert!(rejected.is_empty());
    }

    #[test]
    fn foreign_targets_in_overrides_are_rejected() {
        let (directives, rejected) = filter_directives(Some("  "), Some("hyper=trace,debug,admin=warn"));
        assert_eq!(directives, format!("{DEFAULT_FILTER},admin=warn"));
        assert_eq!(rejected, vec!["hyper=trace".to_string(), "debug".to_string()]);
    }
}
