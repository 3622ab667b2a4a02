//! Service configuration.
//!
//! Settings come from an optional JSON file (`--config <path>` or `NARWHAL_GATEWAY_CONFIG`),
//! then the listen address may be overridden with `--listen <addr>` or
//! `NARWHAL_GATEWAY_LISTEN`. Command-line flags win over the environment.

use crate::error::{Error, Result};
use narwhal_core::{Algorithm, IdPolicy};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:25333";
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

pub const CONFIG_ENV: &str = "NARWHAL_GATEWAY_CONFIG";
pub const LISTEN_ENV: &str = "NARWHAL_GATEWAY_LISTEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    /// Engines the service offers. Layouts naming any other algorithm fail.
    pub algorithms: Vec<Algorithm>,
    /// Identifier policy of graphs created without an explicit one.
    pub id_policy: IdPolicy,
    /// Upper bound for a single layout call; `None` means no limit unless the call sets one.
    pub layout_timeout_ms: Option<u64>,
    /// Longest request line accepted, newline excluded.
    pub max_request_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 25333)),
            algorithms: Algorithm::ALL.to_vec(),
            id_policy: IdPolicy::default(),
            layout_timeout_ms: None,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl GatewayConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the configuration from command-line arguments (program name excluded) and an
    /// environment lookup.
    pub fn load<I, E>(args: I, env: E) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let mut config_path: Option<PathBuf> = None;
        let mut listen: Option<String> = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg, None),
            };
            match flag.as_str() {
                "--config" => {
                    config_path = Some(PathBuf::from(flag_value(&flag, inline, &mut args)?));
                }
                "--listen" => listen = Some(flag_value(&flag, inline, &mut args)?),
                _ => {
                    return Err(Error::InvalidArgument {
                        message: format!("unknown argument `{flag}`"),
                    });
                }
            }
        }

        let config_path = config_path.or_else(|| env(CONFIG_ENV).map(PathBuf::from));
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(addr) = listen.or_else(|| env(LISTEN_ENV)) {
            config.listen = addr.parse().map_err(|_| Error::InvalidArgument {
                message: format!("invalid listen address `{addr}`"),
            })?;
        }
        Ok(config)
    }
}

fn flag_value(
    flag: &str,
    inline: Option<String>,
    rest: &mut impl Iterator<Item = String>,
) -> Result<String> {
    inline.or_else(|| rest.next()).ok_or_else(|| Error::InvalidArgument {
        message: format!("`{flag}` needs a value"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_arguments() {
        let config = GatewayConfig::load(Vec::new(), no_env).unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.listen.to_string(), DEFAULT_LISTEN);
        assert_eq!(config.algorithms, vec![Algorithm::Layered, Algorithm::Fixed]);
    }

    #[test]
    fn listen_flag_beats_environment() {
        let env = |key: &str| (key == LISTEN_ENV).then(|| "127.0.0.1:4000".to_string());
        let from_env = GatewayConfig::load(Vec::new(), env).unwrap();
        assert_eq!(from_env.listen.port(), 4000);

        let from_flag = GatewayConfig::load(args(&["--listen", "127.0.0.1:5000"]), env).unwrap();
        assert_eq!(from_flag.listen.port(), 5000);

        let inline = GatewayConfig::load(args(&["--listen=127.0.0.1:6000"]), env).unwrap();
        assert_eq!(inline.listen.port(), 6000);
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(matches!(
            GatewayConfig::load(args(&["--verbose"]), no_env),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            GatewayConfig::load(args(&["--listen"]), no_env),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            GatewayConfig::load(args(&["--listen", "nowhere"]), no_env),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GatewayConfig::from_json(
            r#"{ "algorithms": ["org.eclipse.elk.fixed"], "idPolicy": "strict", "layoutTimeoutMs": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.algorithms, vec![Algorithm::Fixed]);
        assert_eq!(config.id_policy, IdPolicy::Strict);
        assert_eq!(config.layout_timeout_ms, Some(250));
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
        assert!(GatewayConfig::from_json(r#"{ "port": 1 }"#).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let env = |key: &str| (key == CONFIG_ENV).then(|| "/nonexistent/narwhal.json".to_string());
        assert!(matches!(GatewayConfig::load(Vec::new(), env), Err(Error::Io(_))));
    }
}
