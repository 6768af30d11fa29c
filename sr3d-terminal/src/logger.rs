/// File logging; stdout belongs to the terminal UI
use env_logger::{Builder, Env, Target, WriteStyle};
use std::env;
use std::fs::{File, OpenOptions};
use std::io;

/// Path of the log file; logging is off when unset
pub const LOG_PATH_VAR: &str = "SR3D_LOG";
/// Optional filter (`error` .. `trace`, or env_logger directives), `info` by default
pub const LOG_LEVEL_VAR: &str = "SR3D_LOG_LEVEL";

/// Install a logger writing to the file named by `SR3D_LOG`.
///
/// Returns whether a logger was installed.
pub fn init_from_env() -> io::Result<bool> {
    let Some(path) = env::var_os(LOG_PATH_VAR) else {
        return Ok(false);
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file_builder(file, Env::new().filter_or(LOG_LEVEL_VAR, "info"))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))?;
    Ok(true)
}

fn file_builder(file: File, env: Env) -> Builder {
    let mut builder = Builder::from_env(env);
    builder
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never);
    builder
}
