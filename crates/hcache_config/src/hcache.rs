use serde::Deserialize;

use crate::validation::{validate, ConfigReport};
use crate::{CacheConfig, ClientConfig, GlobalConfig, StoreBackend, StoreConfig};

/// Prefix for environment overrides; nested keys use `__`.
const ENV_PREFIX: &str = "HCACHE";

// =======================================================
// HCACHE CONFIG: main config
// =======================================================
#[derive(Debug, Deserialize)]
pub struct HcacheConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for HcacheConfig {
    fn default() -> Self {
        let mut cfg = Self {
            global: GlobalConfig::default(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
            client: ClientConfig::default(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl HcacheConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    /// Load `file_name` (TOML, optional) with `HCACHE_*` overrides on top.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: HcacheConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("Invalid config in '{file_name}':");
                    eprintln!("{}", report.format());
                    eprintln!("Using default config (in-memory store)...");
                    HcacheConfig::default()
                } else {
                    if report.has_warnings() {
                        eprintln!("Config warnings in '{file_name}':");
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("Error reading config '{file_name}': {e}");
                eprintln!("Using default config (in-memory store)...");
                HcacheConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        let def_global = GlobalConfig::default();
        self.global.apply_defaults_from(&def_global);

        let def_store = StoreConfig::default();
        self.store.apply_defaults_from(&def_store);
    }

    pub fn print(&self) {
        println!("================ HCACHE CONFIG ================");
        self.print_global();
        self.print_cache();
        self.print_store();
        self.print_client();
        println!("===============================================");
    }

    fn print_global(&self) {
        println!("\n[global]");
        println!("  log_level               = {}", self.global.log_level);
    }

    fn print_cache(&self) {
        println!("\n[cache]");
        println!("  rfc_compliance          = {}", self.cache.rfc_compliance);
        println!("  private_cache           = {}", self.cache.private_cache);
        println!(
            "  store_without_freshness = {}",
            self.cache.store_without_freshness
        );
    }

    fn print_store(&self) {
        println!("\n[store]");
        println!("  backend                 = {:?}", self.store.backend);
        match self.store.backend {
            StoreBackend::Memory => {
                println!("  capacity                = {}", self.store.capacity);
                println!("  eviction                = {:?}", self.store.eviction);
            }
            StoreBackend::Disk => {
                println!("  dir                     = {}", self.store.dir);
            }
        }
        println!("  ttl_secs                = {}", self.store.ttl_secs);
    }

    fn print_client(&self) {
        println!("\n[client]");
        println!(
            "  connect_timeout_secs    = {}",
            self.client.connect_timeout_secs
        );
        println!(
            "  request_timeout_secs    = {}",
            self.client.request_timeout_secs
        );
    }
}
