use anyhow::{anyhow, Context, Result};

pub const MAX_CALL_DEPTH_VAR: &str = "LOXWALK_MAX_CALL_DEPTH";
pub const NO_NATIVES_VAR: &str = "LOXWALK_NO_NATIVES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested function calls allowed before a program is aborted with a stack overflow
    pub max_call_depth: usize,
    /// Install the native function table into the globals
    pub natives: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 256,
            natives: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    // Split out so tests don't have to touch the process environment
    fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(depth) = lookup(MAX_CALL_DEPTH_VAR) {
            let depth = depth
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{} is not a number: {:?}", MAX_CALL_DEPTH_VAR, depth))?;
            if depth == 0 {
                return Err(anyhow!("{} must be at least 1", MAX_CALL_DEPTH_VAR));
            }
            config.max_call_depth = depth;
        }
        if lookup(NO_NATIVES_VAR).is_some() {
            config.natives = false;
        }
        Ok(config)
    }
}
