use serde::Deserialize;

// =======================================================
// NETWORK CLIENT CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    // Timeouts (seconds), 0 = none
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout_secs(&self) -> Option<u64> {
        (self.connect_timeout_secs > 0).then_some(self.connect_timeout_secs)
    }

    pub fn request_timeout_secs(&self) -> Option<u64> {
        (self.request_timeout_secs > 0).then_some(self.request_timeout_secs)
    }
}
