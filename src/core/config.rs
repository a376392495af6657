use std::fs;
use std::path::Path;
use crate::core::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub index_workers: usize,       // Threads draining the index queue
    pub queue_capacity: usize,      // Bounded job queue size
    pub now: u32,                   // Synthetic current time for premium checks
    pub rating_mode: bool,          // Options file line 2
}

impl Default for Config {
    fn default() -> Self {
        Config {
            index_workers: 2,
            queue_capacity: 256_000,
            now: 0,
            rating_mode: false,
        }
    }
}

impl Config {
    pub fn with_options(options: Options) -> Self {
        Config {
            now: options.now,
            rating_mode: options.rating_mode,
            ..Config::default()
        }
    }
}

/// Two-line options file shipped next to the data archive:
/// current unix time, then `1` for a rating run or `0` for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    pub now: u32,
    pub rating_mode: bool,
}

impl Options {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().map(str::trim);

        let now = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::validation("options: missing current time"))?
            .parse::<u32>()?;

        let rating_mode = match lines.next() {
            Some("1") => true,
            Some("0") | Some("") | None => false,
            Some(other) => {
                return Err(Error::validation(format!("options: invalid mode {:?}", other)));
            }
        };

        Ok(Options { now, rating_mode })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Options::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_lines() {
        let options = Options::parse("1545834028\n1\n").unwrap();
        assert_eq!(options.now, 1545834028);
        assert!(options.rating_mode);

        let config = Config::with_options(options);
        assert_eq!(config.now, 1545834028);
        assert_eq!(config.index_workers, 2);
    }

    #[test]
    fn mode_line_is_optional() {
        let options = Options::parse("100").unwrap();
        assert_eq!(options, Options { now: 100, rating_mode: false });
    }

    #[test]
    fn rejects_garbage() {
        assert!(Options::parse("").is_err());
        assert!(Options::parse("abc\n0").is_err());
        assert!(Options::parse("10\n7").is_err());
    }
}
