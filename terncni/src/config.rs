use rscni::{error::Error, types::Args};
use serde::{Deserialize, Serialize};

const TERN_CONFIG_ENDPOINT: &str = "endpoint";
const TERN_CONFIG_TIMEOUT: &str = "timeout";

pub(crate) const DEFAULT_TIMEOUT: u64 = 10;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) endpoint: String,
    pub(crate) timeout: u64,
}

impl Config {
    pub fn parse(conf: &Args) -> Result<Config, Error> {
        match &conf.config {
            Some(config) => {
                let endpoint = config
                    .custom
                    .get(TERN_CONFIG_ENDPOINT)
                    .ok_or(Error::InvalidNetworkConfig(
                        "endpoint must be given.".to_string(),
                    ))?
                    .as_str()
                    .ok_or(Error::InvalidNetworkConfig(
                        "endpoint parameter must be a string".to_string(),
                    ))?
                    .to_string();
                let timeout = match config.custom.get(TERN_CONFIG_TIMEOUT) {
                    Some(timeout) => timeout.as_u64().ok_or(Error::InvalidNetworkConfig(
                        "timeout parameter must be a number".to_string(),
                    ))?,
                    None => DEFAULT_TIMEOUT,
                };

                Ok(Config { endpoint, timeout })
            }
            None => Err(Error::InvalidNetworkConfig(
                "configuration must be given from stdin".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rscni::types::NetConf;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_config_from_net_conf() {
        let args = Args {
            config: Some(NetConf {
                custom: HashMap::from([
                    ("endpoint".to_string(), json!("/var/run/tern/cni.sock")),
                    ("timeout".to_string(), json!(60)),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let conf = Config::parse(&args).unwrap();
        assert_eq!(
            Config {
                endpoint: "/var/run/tern/cni.sock".to_string(),
                timeout: 60,
            },
            conf
        );
    }

    #[test]
    fn parse_config_applies_default_timeout() {
        let args = Args {
            config: Some(NetConf {
                custom: HashMap::from([(
                    "endpoint".to_string(),
                    json!("http://localhost:6000"),
                )]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let conf = Config::parse(&args).unwrap();
        assert_eq!(conf.timeout, DEFAULT_TIMEOUT);
    }

    #[rstest(
        custom,
        case(HashMap::from([("timeout".to_string(), json!(60))])),
        case(HashMap::from([
            ("endpoint".to_string(), json!("http://localhost:6000")),
            ("timeout".to_string(), json!("soon")),
        ])),
        case(HashMap::from([("endpoint".to_string(), json!(1234))]))
    )]
    fn parse_config_error(custom: HashMap<String, serde_json::Value>) {
        let args = Args {
            config: Some(NetConf {
                custom,
                ..Default::default()
            }),
            ..Default::default()
        };

        let res = Config::parse(&args);
        assert!(matches!(res, Err(Error::InvalidNetworkConfig(_))));
    }

    #[test]
    fn parse_config_requires_stdin_config() {
        let res = Config::parse(&Args::default());
        assert!(matches!(res, Err(Error::InvalidNetworkConfig(_))));
    }
}
