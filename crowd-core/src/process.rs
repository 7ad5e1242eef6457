//! External process execution.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Runs `program` with `args` inside `cwd` and returns its trimmed stdout.
///
/// # Errors
///
/// Returns [`Error::Execution`] with the captured stderr when the process
/// exits unsuccessfully (exit code `-1` when it was killed by a signal), and
/// [`Error::Io`] when it cannot be spawned.
pub async fn exec_process<S: AsRef<str>>(program: &str, args: &[S], cwd: &Path) -> Result<String> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    tracing::debug!(program, args = ?args, cwd = %cwd.display(), "spawning process");

    let output = Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end().to_string())
    } else {
        Err(Error::Execution {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a manifest script through the script runner, e.g.
/// `npm run --ignore-scripts build <args>`.
pub async fn run_lifecycle<S: AsRef<str>>(
    runner: &str,
    cwd: &Path,
    script: &str,
    args: &[S],
) -> Result<String> {
    let mut full_args: Vec<&str> = vec!["run", "--ignore-scripts", script];
    full_args.extend(args.iter().map(AsRef::as_ref));
    exec_process(runner, &full_args, cwd).await
}
