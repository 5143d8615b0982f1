use serde::Deserialize;

// =======================================================
// GLOBAL CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info,hcache=debug".into(),
        }
    }
}

impl GlobalConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &GlobalConfig) {
        if self.log_level.trim().is_empty() {
            self.log_level = defaults.log_level.clone();
        }
    }
}
