use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "hcache",
    version,
    about = "Fetch a URL through an HTTP cache and report hits and misses"
)]
pub struct Cli {
    /// Configuration file (TOML). Missing file means defaults.
    #[arg(short, long, env = "HCACHE_CONFIG", default_value = "hcache.toml")]
    pub config: String,

    /// How many times to fetch the URL.
    #[arg(short = 'n', long, default_value_t = 2)]
    pub repeat: u32,

    /// Pause between requests, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub interval_ms: u64,

    /// Print the effective configuration before fetching.
    #[arg(long)]
    pub print_config: bool,

    /// Flush the store before the first request.
    #[arg(long)]
    pub flush: bool,

    /// Absolute http:// URL to fetch.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["hcache", "http://example.com/"]).expect("parse");
        assert_eq!(cli.repeat, 2);
        assert_eq!(cli.interval_ms, 0);
        assert!(!cli.flush);
        assert_eq!(cli.url, "http://example.com/");
    }

    #[test]
    fn url_is_required() {
        assert!(Cli::try_parse_from(["hcache", "--repeat", "3"]).is_err());
    }
}
