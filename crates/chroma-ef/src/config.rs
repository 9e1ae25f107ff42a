//! Secret-discipline helpers for `EmbeddingFunction::get_config`.
//!
//! Embedding functions that need a credential (an API key for a hosted
//! inference endpoint, say) must never place the raw value in their
//! config map — only the name of the environment variable holding it. The
//! registry's rebuild path then re-reads the variable at construction
//! time, not at config-serialization time.

use std::collections::BTreeMap;

/// The config key every credential-bearing embedding function should use
/// to name the environment variable holding its secret.
pub const API_KEY_ENV_VAR_KEY: &str = "api_key_env_var";

/// Insert `{"api_key_env_var": env_var_name}` into a config map, making the
/// secret-discipline convention explicit rather than ad hoc per call site.
pub fn set_api_key_env_var(config: &mut BTreeMap<String, serde_json::Value>, env_var_name: &str) {
    config.insert(API_KEY_ENV_VAR_KEY.to_string(), serde_json::Value::String(env_var_name.to_string()));
}

/// Read the api key out of the environment variable named in `config`,
/// without ever having stored the key itself in `config`.
pub fn read_api_key_from_env(config: &BTreeMap<String, serde_json::Value>) -> Option<String> {
    let var_name = config.get(API_KEY_ENV_VAR_KEY)?.as_str()?;
    std::env::var(var_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_never_carries_the_raw_secret() {
        let mut config = BTreeMap::new();
        set_api_key_env_var(&mut config, "MY_PROVIDER_API_KEY");
        let serialized = serde_json::to_string(&config).unwrap();
        assert!(serialized.contains("MY_PROVIDER_API_KEY"));
        assert!(!serialized.to_lowercase().contains("sk-"));
    }
}
