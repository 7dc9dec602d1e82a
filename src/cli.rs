// Command line module
// Flags layered on top of defaults and environment configuration

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "isolated-serve")]
#[command(about = "Serve a directory over HTTP with cross-origin isolation and open CORS headers")]
#[command(version)]
pub struct Cli {
    /// Port to listen on [default: 8000]
    pub port: Option<u16>,

    /// Address to bind to [default: 0.0.0.0]
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory to serve [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Disable the access log
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Override configuration with whatever was given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.host.clone_from(bind);
        }
        if let Some(dir) = &self.directory {
            config.server.root = dir.display().to_string();
        }
        if self.quiet {
            config.logging.access_log = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("isolated-serve").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_arguments_keep_config() {
        let mut cfg = Config::from_defaults().unwrap();
        parse(&[]).apply(&mut cfg);
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.root, ".");
        assert!(cfg.logging.access_log);
    }

    #[test]
    fn test_all_overrides() {
        let mut cfg = Config::from_defaults().unwrap();
        parse(&["9100", "-b", "127.0.0.1", "--directory", "/srv/www", "-q"]).apply(&mut cfg);
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.root, "/srv/www");
        assert!(!cfg.logging.access_log);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["isolated-serve", "70000"]).is_err());
        assert!(Cli::try_parse_from(["isolated-serve", "http"]).is_err());
    }
}
