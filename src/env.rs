use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error};

pub const HF_ACCESS_TOKEN: &str = "HF_ACCESS_TOKEN";

/// Secrets read from the project's `.env` file.
///
/// Values in the file take precedence over the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariables {
    hf_access_token: Option<String>,
}

impl EnvironmentVariables {
    /// Read `env_path`. A missing or unreadable file is logged and leaves the token unset
    /// unless the process environment provides it.
    pub fn load(env_path: &Path) -> Self {
        let mut values = HashMap::new();

        if env_path.exists() {
            match dotenvy::from_path_iter(env_path) {
                Ok(iter) => {
                    for item in iter {
                        match item {
                            Ok((key, value)) => {
                                values.insert(key, value);
                            }
                            Err(e) => {
                                error!(path = %env_path.display(), "Invalid line in .env file: {}", e);
                            }
                        }
                    }
                    debug!(path = %env_path.display(), "Loaded {} variable(s)", values.len());
                }
                Err(e) => error!(path = %env_path.display(), "Failed to read .env file: {}", e),
            }
        } else {
            error!(".env file not found at: {}", env_path.display());
        }

        let hf_access_token = values
            .remove(HF_ACCESS_TOKEN)
            .or_else(|| std::env::var(HF_ACCESS_TOKEN).ok())
            .filter(|token| !token.is_empty());

        Self { hf_access_token }
    }

    pub fn get_environment_variables(&self) -> HashMap<&'static str, Option<String>> {
        HashMap::from([(HF_ACCESS_TOKEN, self.hf_access_token.clone())])
    }

    pub fn get_hf_access_token(&self) -> Option<&str> {
        self.hf_access_token.as_deref()
    }
}
