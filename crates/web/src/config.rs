use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "127.0.0.1:7878";
pub const DEFAULT_DATA_DIR: &str = "assets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub data_dir: PathBuf,
    /// `None` keeps the session in memory only.
    pub save_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Flags win over the environment, which wins over the defaults.
    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let mut addr = env("DECKFORGE_ADDR");
        let mut data_dir = env("DECKFORGE_DATA").map(PathBuf::from);
        let mut save_path = env("DECKFORGE_SAVE").map(PathBuf::from);
        let mut seed = None;
        let mut idx = 0usize;
        while idx < args.len() {
            match args[idx].as_str() {
                "--addr" => {
                    if let Some(value) = args.get(idx + 1) {
                        addr = Some(value.clone());
                        idx += 1;
                    }
                }
                "--data" => {
                    if let Some(value) = args.get(idx + 1) {
                        data_dir = Some(PathBuf::from(value));
                        idx += 1;
                    }
                }
                "--save" => {
                    if let Some(value) = args.get(idx + 1) {
                        save_path = Some(PathBuf::from(value));
                        idx += 1;
                    }
                }
                "--seed" => {
                    if let Some(value) = args.get(idx + 1) {
                        seed = value.parse::<u64>().ok();
                        idx += 1;
                    }
                }
                _ => {}
            }
            idx += 1;
        }
        let save_path = save_path.or_else(|| {
            env("HOME").map(|home| PathBuf::from(home).join(".deckforge_session.json"))
        });
        Self {
            addr: addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            data_dir: data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            save_path,
            seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn defaults_without_env_or_flags() {
        let config = ServerConfig::resolve(&[], |_| None);
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.data_dir, PathBuf::from("assets"));
        assert_eq!(config.save_path, None);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn flags_override_env() {
        let env: HashMap<&str, &str> = [
            ("DECKFORGE_ADDR", "0.0.0.0:9000"),
            ("DECKFORGE_DATA", "/srv/cards"),
            ("HOME", "/home/tester"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|value| value.to_string());

        let config = ServerConfig::resolve(&args(&["--addr", "localhost:1", "--seed", "42"]), lookup);
        assert_eq!(config.addr, "localhost:1");
        assert_eq!(config.data_dir, PathBuf::from("/srv/cards"));
        assert_eq!(
            config.save_path,
            Some(PathBuf::from("/home/tester/.deckforge_session.json"))
        );
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn bad_seed_is_ignored() {
        let config = ServerConfig::resolve(&args(&["--seed", "lots", "--save", "s.json"]), |_| None);
        assert_eq!(config.seed, None);
        assert_eq!(config.save_path, Some(PathBuf::from("s.json")));
    }
}
