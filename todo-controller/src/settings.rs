use clap::Parser;

const DEFAULT_API_HOST: &str = "https://kubernetes.default.svc";
const DEFAULT_API_VERSION: &str = "patrickdap.com/v1";
const DEFAULT_RESOURCE_PLURAL: &str = "todos";
const DEFAULT_RESOURCE_LIMIT: &str = "500";
const DEFAULT_PORT: u16 = 8080;

/// Serves the todos of the pod's namespace from the Kubernetes API
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about)]
pub struct Settings {
    /// Base URL of the Kubernetes API server
    #[arg(long, env = "KUBERNETES_API_HOST", default_value = DEFAULT_API_HOST)]
    pub api_host: String,

    /// Group and version of the todo resource
    #[arg(long, env = "KUBERNETES_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Plural name of the todo resource
    #[arg(long, env = "KUBERNETES_RESOURCE_PLURAL", default_value = DEFAULT_RESOURCE_PLURAL)]
    pub resource_plural: String,

    /// Maximum number of todos requested from the API server
    #[arg(long, env = "KUBERNETES_RESOURCE_LIMIT", default_value = DEFAULT_RESOURCE_LIMIT)]
    pub resource_limit: String,

    /// Port to listen on
    #[arg(long, env = "KUBERNETES_CONTROLLER_PORT", default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,
}

impl Settings {
    /// Trims every value, falls back to the default for blank ones, and drops the
    /// trailing slash of the API host.
    pub fn normalized(self) -> Self {
        let api_host = or_default(self.api_host, DEFAULT_API_HOST);
        Self {
            api_host: api_host.trim_end_matches('/').to_owned(),
            api_version: or_default(self.api_version, DEFAULT_API_VERSION),
            resource_plural: or_default(self.resource_plural, DEFAULT_RESOURCE_PLURAL),
            resource_limit: or_default(self.resource_limit, DEFAULT_RESOURCE_LIMIT),
            port: self.port,
        }
    }
}

fn or_default(value: String, default: &str) -> String {
    match value.trim() {
        "" => default.to_owned(),
        trimmed => trimmed.to_owned(),
    }
}

/// Blank values reach the parser when the variable is set but empty
fn parse_port(value: &str) -> Result<u16, std::num::ParseIntError> {
    match value.trim() {
        "" => Ok(DEFAULT_PORT),
        trimmed => trimmed.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_normalized() {
        let settings = Settings::try_parse_from([
            "todo-controller",
            "--api-host",
            " https://10.0.0.1:6443/ ",
            "--api-version",
            "  ",
            "--resource-plural",
            "tasks",
            "--resource-limit",
            "20",
            "--port",
            " 9090",
        ])
        .unwrap()
        .normalized();

        assert_eq!(
            settings,
            Settings {
                api_host: "https://10.0.0.1:6443".into(),
                api_version: DEFAULT_API_VERSION.into(),
                resource_plural: "tasks".into(),
                resource_limit: "20".into(),
                port: 9090,
            }
        );
    }

    #[test]
    fn blank_port_flag_falls_back_to_default() {
        let settings = Settings::try_parse_from(["todo-controller", "--port", "   "]).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn blank_port_variable_falls_back_to_default() {
        // Only test reading this variable; the others pass `--port`
        for blank in ["", "  "] {
            std::env::set_var("KUBERNETES_CONTROLLER_PORT", blank);
            let parsed = Settings::try_parse_from(["todo-controller"]);
            std::env::remove_var("KUBERNETES_CONTROLLER_PORT");
            assert_eq!(parsed.unwrap().port, DEFAULT_PORT, "value {blank:?}");
        }
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Settings::try_parse_from(["todo-controller", "--port", "http"]).is_err());
    }
}
