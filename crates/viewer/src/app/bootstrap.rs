use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) const WINDOW_SCALE_ENV_VAR: &str = "OVERWORLD_WINDOW_SCALE";
const DEFAULT_WINDOW_SCALE: u32 = 3;

#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) window_title: String,
    /// Integer upscale from the viewport bitmap to the window.
    pub(crate) window_scale: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Overworld".to_string(),
            window_scale: DEFAULT_WINDOW_SCALE,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

pub(crate) fn build_app() -> LoopConfig {
    init_tracing();
    info!("=== Overworld Startup ===");

    LoopConfig {
        window_scale: parse_window_scale(std::env::var(WINDOW_SCALE_ENV_VAR).ok().as_deref()),
        ..LoopConfig::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_window_scale(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|scale| *scale > 0)
        .unwrap_or(DEFAULT_WINDOW_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_scale_defaults_when_unset_or_invalid() {
        assert_eq!(parse_window_scale(None), DEFAULT_WINDOW_SCALE);
        assert_eq!(parse_window_scale(Some("zero")), DEFAULT_WINDOW_SCALE);
        assert_eq!(parse_window_scale(Some("0")), DEFAULT_WINDOW_SCALE);
    }

    #[test]
    fn window_scale_reads_trimmed_value() {
        assert_eq!(parse_window_scale(Some(" 4 ")), 4);
    }
}
