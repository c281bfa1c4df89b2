use env_logger::Env;

#[derive(Clone, Copy, Debug)]
pub struct LogLevel(pub log::LevelFilter);
impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" | "warning" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" | "none" => log::LevelFilter::Off,
            _ => return Err(format!("Invalid log level: {}", s)),
        };
        Ok(LogLevel(level))
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

///////////////////////////////
/// Set up the global logger. RUST_LOG wins over the requested level if set
pub fn setup_global_logger(log_level: Option<LogLevel>) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if std::env::var_os("RUST_LOG").is_none() {
        if let Some(level) = log_level {
            builder.filter_level(level.into());
        }
    }
    builder.format_timestamp_secs();

    //Tests and library users may have installed a logger already
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_levels() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap().0, log::LevelFilter::Warn);
        assert_eq!("debug".parse::<LogLevel>().unwrap().0, log::LevelFilter::Debug);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
