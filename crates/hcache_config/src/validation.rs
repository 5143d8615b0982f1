use std::fmt;
use std::path::Path;

use crate::{HcacheConfig, StoreBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One problem, tied to the config section it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub section: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Validation output for a loaded hcache configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    issues: Vec<Issue>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.of(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.of(Severity::Warning)
    }

    /// Issues grouped under their `[section]` header, errors first within
    /// each section. Sections keep the order they were first reported in.
    pub fn format(&self) -> String {
        let mut sections: Vec<&str> = Vec::new();
        for issue in &self.issues {
            if !sections.contains(&issue.section) {
                sections.push(issue.section);
            }
        }

        let mut out = String::new();
        for section in sections {
            out.push_str(&format!("[{section}]\n"));
            for severity in [Severity::Error, Severity::Warning] {
                for issue in self
                    .issues
                    .iter()
                    .filter(|i| i.section == section && i.severity == severity)
                {
                    out.push_str(&format!("  {severity}: {}\n", issue.message));
                }
            }
        }
        out
    }

    fn of(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    fn push(&mut self, section: &'static str, severity: Severity, message: impl Into<String>) {
        self.issues.push(Issue {
            section,
            severity,
            message: message.into(),
        });
    }

    fn warn(&mut self, section: &'static str, message: impl Into<String>) {
        self.push(section, Severity::Warning, message);
    }

    fn error(&mut self, section: &'static str, message: impl Into<String>) {
        self.push(section, Severity::Error, message);
    }
}

/// Validate an hcache configuration and return a report of issues.
///
/// Runs on the config after defaults are applied, so zero values that
/// have a default never show up here.
pub fn validate(cfg: &HcacheConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_cache(cfg, &mut report);
    validate_store(cfg, &mut report);
    validate_client(cfg, &mut report);

    report
}

fn validate_cache(cfg: &HcacheConfig, report: &mut ConfigReport) {
    if !cfg.cache.rfc_compliance {
        report.warn("cache", "rfc_compliance is false; any 2xx response will be cached");
        if cfg.cache.store_without_freshness {
            report.warn(
                "cache",
                "store_without_freshness has no effect when rfc_compliance is false",
            );
        }
    }
}

fn validate_store(cfg: &HcacheConfig, report: &mut ConfigReport) {
    if cfg.store.backend != StoreBackend::Disk {
        return;
    }

    if cfg.store.ttl_secs > 0 {
        report.warn("store", "ttl_secs is ignored by the disk backend");
    }

    let dir = cfg.store.dir.as_str();
    let path = Path::new(dir);
    if path.exists() {
        if !path.is_dir() {
            report.error("store", format!("dir '{dir}' exists but is not a directory"));
        }
    } else {
        report.warn(
            "store",
            format!("dir '{dir}' does not exist; it will be created at runtime"),
        );
    }
}

fn validate_client(cfg: &HcacheConfig, report: &mut ConfigReport) {
    let connect = cfg.client.connect_timeout_secs;
    let request = cfg.client.request_timeout_secs;
    if connect > 0 && request > 0 && request < connect {
        report.warn(
            "client",
            format!("request_timeout_secs ({request}) is shorter than connect_timeout_secs ({connect})"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Severity, validate};
    use crate::{HcacheConfig, StoreBackend};

    #[test]
    fn defaults_are_clean() {
        let report = validate(&HcacheConfig::default());
        assert!(report.is_ok());
        assert!(!report.has_warnings());
        assert!(report.format().is_empty());
    }

    #[test]
    fn disk_dir_pointing_at_a_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let mut cfg = HcacheConfig::default();
        cfg.store.backend = StoreBackend::Disk;
        cfg.store.dir = file.path().display().to_string();

        let report = cfg.validate();
        assert!(report.has_errors());
        assert_eq!(report.issues()[0].section, "store");
        assert!(report.format().starts_with("[store]\n  error: dir '"));
    }

    #[test]
    fn missing_disk_dir_is_only_a_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = HcacheConfig::default();
        cfg.store.backend = StoreBackend::Disk;
        cfg.store.dir = dir.path().join("later").display().to_string();

        let report = cfg.validate();
        assert!(report.is_ok());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn zero_capacity_is_defaulted_before_validation() {
        let mut cfg = HcacheConfig::default();
        cfg.store.capacity = 0;
        let report = cfg.validate();
        assert!(report.is_ok());
        assert!(!report.has_warnings());
    }

    #[test]
    fn format_groups_issues_by_section() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let mut cfg = HcacheConfig::default();
        cfg.cache.rfc_compliance = false;
        cfg.cache.store_without_freshness = true;
        cfg.store.backend = StoreBackend::Disk;
        cfg.store.dir = file.path().display().to_string();
        cfg.store.ttl_secs = 10;
        cfg.client.request_timeout_secs = 1;

        let report = cfg.validate();
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 4);
        assert!(report.errors().all(|i| i.severity == Severity::Error));

        let text = report.format();
        let cache = text.find("[cache]").expect("cache section");
        let store = text.find("[store]").expect("store section");
        let client = text.find("[client]").expect("client section");
        assert!(cache < store && store < client);

        // Errors lead their section even when reported after a warning.
        let store_block = &text[store..client];
        let error = store_block.find("error:").expect("error line");
        let warning = store_block.find("warning:").expect("warning line");
        assert!(error < warning);
    }
}
