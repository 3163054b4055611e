use std::env;

use time::UtcOffset;

use crate::error::{Error, Result};

pub const DEFAULT_HOST: &'static str = "spreedly.com";

const TOKEN_VAR: &'static str = "SPREEDLY_TOKEN";
const SITE_NAME_VAR: &'static str = "SPREEDLY_SITE_NAME";
const HOST_VAR: &'static str = "SPREEDLY_HOST";
const ALLOW_DESTRUCTIVE_VAR: &'static str = "SPREEDLY_ALLOW_DESTRUCTIVE";

/// Account credentials and client behaviour, fixed once the client is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub token: String,
    pub site_name: String,
    pub host: String,
    /// Subscriber deletion is refused unless this is set.
    pub allow_destructive_operations: bool,
    /// Offset applied to decoded datetimes, which arrive in UTC.
    pub utc_offset: UtcOffset,
}

impl Config {
    pub fn new(token: &str, site_name: &str) -> Config {
        Config {
            token: token.to_string(),
            site_name: site_name.to_string(),
            host: DEFAULT_HOST.to_string(),
            allow_destructive_operations: false,
            utc_offset: UtcOffset::UTC,
        }
    }

    /// Builds a configuration from `SPREEDLY_TOKEN` and `SPREEDLY_SITE_NAME`,
    /// plus the optional `SPREEDLY_HOST` and `SPREEDLY_ALLOW_DESTRUCTIVE`.
    pub fn from_env() -> Result<Config> {
        let token = required_var(TOKEN_VAR)?;
        let site_name = required_var(SITE_NAME_VAR)?;

        let mut config = Config::new(&token, &site_name);

        if let Ok(host) = env::var(HOST_VAR) {
            config = config.with_host(&host);
        }
        if let Ok(flag) = env::var(ALLOW_DESTRUCTIVE_VAR) {
            config = config.with_destructive_operations(parse_flag(&flag));
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: &str) -> Config {
        self.host = host.to_string();
        self
    }

    pub fn with_destructive_operations(mut self, allow: bool) -> Config {
        self.allow_destructive_operations = allow;
        self
    }

    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Config {
        self.utc_offset = offset;
        self
    }

    /// Uses the host's current local offset for decoded datetimes.
    pub fn with_local_offset(self) -> Result<Config> {
        let offset = UtcOffset::current_local_offset()
            .map_err(|err| Error::Config(format!("cannot determine local offset: {}", err)))?;

        Ok(self.with_utc_offset(offset))
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}

fn parse_flag(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, Config, ALLOW_DESTRUCTIVE_VAR, DEFAULT_HOST, SITE_NAME_VAR, TOKEN_VAR};
    use std::env;
    use time::UtcOffset;

    #[test]
    fn test_new_defaults() {
        let config = Config::new("a9e3cfde", "pingbrigadetest");

        assert_eq!("a9e3cfde", config.token);
        assert_eq!("pingbrigadetest", config.site_name);
        assert_eq!(DEFAULT_HOST, config.host);
        assert!(!config.allow_destructive_operations);
        assert_eq!(UtcOffset::UTC, config.utc_offset);
    }

    #[test]
    fn test_builders() {
        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        let config = Config::new("token", "site")
            .with_host("localhost")
            .with_destructive_operations(true)
            .with_utc_offset(offset);

        assert_eq!("localhost", config.host);
        assert!(config.allow_destructive_operations);
        assert_eq!(offset, config.utc_offset);
    }

    #[test]
    fn test_from_env() {
        env::remove_var(TOKEN_VAR);
        assert!(Config::from_env().is_err());

        env::set_var(TOKEN_VAR, "a9e3cfde");
        env::set_var(SITE_NAME_VAR, "pingbrigadetest");
        env::set_var(ALLOW_DESTRUCTIVE_VAR, "true");
        let config = Config::from_env().unwrap();
        for name in [TOKEN_VAR, SITE_NAME_VAR, ALLOW_DESTRUCTIVE_VAR] {
            env::remove_var(name);
        }

        assert_eq!("a9e3cfde", config.token);
        assert_eq!("pingbrigadetest", config.site_name);
        assert!(config.allow_destructive_operations);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("test"));
        assert!(!parse_flag(""));
    }
}
