use clap::Parser;

const PORT: u16 = 6379;
const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Server settings, read from the command line with environment variable fallbacks.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about)]
pub struct Config {
    /// The port to listen on
    #[arg(short, long, env = "ZIPDIS_PORT", default_value_t = PORT)]
    pub port: u16,

    /// Largest amount of buffered, unparsed request bytes accepted from a client
    #[arg(long, env = "MAX_FRAME_SIZE", default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: PORT,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["zipdis"]).unwrap();
        assert_eq!(config.max_frame_size, MAX_FRAME_SIZE);
    }

    #[test]
    fn flags() {
        let config =
            Config::try_parse_from(["zipdis", "--port", "7000", "--max-frame-size", "1024"])
                .unwrap();
        assert_eq!(
            config,
            Config {
                port: 7000,
                max_frame_size: 1024,
            }
        );
    }
}
