//! Serve command - run the HTTP build server

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::{BuildyError, BuildyResult};
use crate::server;
use std::path::PathBuf;
use tracing::debug;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> BuildyResult<()> {
    let config = apply_overrides(config.clone(), args)?;
    debug!("Effective config: {:?}", config);
    server::serve(&config).await
}

/// Layer command-line/environment overrides on top of the file config
fn apply_overrides(mut config: Config, args: ServeArgs) -> BuildyResult<Config> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(directory) = args.directory {
        config.builds.directory = Some(directory);
    }
    if let Some(capacity) = args.capacity {
        config.builds.capacity = capacity;
    }
    if let Some(command) = args.build_command {
        config.builds.command = command;
    }
    if let Some(timeout) = args.timeout {
        config.builds.timeout_secs = timeout;
    }

    config
        .validate()
        .map_err(|reason| BuildyError::ConfigInvalid {
            path: PathBuf::from("<command line>"),
            reason,
        })?;

    Ok(config)
}
