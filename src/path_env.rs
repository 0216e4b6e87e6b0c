use std::path::PathBuf;

pub const DATA_DIR: &str = "STOCKSIM_DATA_DIR";

/// Directory override from the environment. A leading `~/` is expanded to the home directory.
#[must_use]
pub fn dir_from_env(key: &str) -> Option<PathBuf> {
    let value = std::env::var(key).ok()?;
    expand(value.trim())
}

fn expand(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        return None;
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    Some(PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::{dir_from_env, expand};
    use std::path::PathBuf;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(previous) = &self.previous {
                std::env::set_var(self.key, previous);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn reads_trimmed_value() {
        let _dir = EnvGuard::set("STOCKSIM_PATH_ENV_TEST_DIR", Some("  /tmp/stocksim  "));
        assert_eq!(
            dir_from_env("STOCKSIM_PATH_ENV_TEST_DIR"),
            Some(PathBuf::from("/tmp/stocksim"))
        );
    }

    #[test]
    fn ignores_blank_and_unset() {
        let _blank = EnvGuard::set("STOCKSIM_PATH_ENV_TEST_BLANK", Some("   "));
        let _unset = EnvGuard::set("STOCKSIM_PATH_ENV_TEST_UNSET", None);
        assert!(dir_from_env("STOCKSIM_PATH_ENV_TEST_BLANK").is_none());
        assert!(dir_from_env("STOCKSIM_PATH_ENV_TEST_UNSET").is_none());
    }

    #[test]
    fn expands_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand("~/logs"), Some(home.join("logs")));
        assert_eq!(expand("relative/logs"), Some(PathBuf::from("relative/logs")));
    }
}
