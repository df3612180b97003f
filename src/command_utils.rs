use log::debug;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Execute a command with debug logging.
///
/// `env` is applied to this child only. Values are never logged since they
/// may carry secrets.
pub fn execute_command(
    cmd: &str,
    args: &[&str],
    env: &[(&str, &str)],
    current_dir: Option<&Path>,
) -> io::Result<Output> {
    debug!("Executing command: {} {}", cmd, args.join(" "));
    if !env.is_empty() {
        let names: Vec<&str> = env.iter().map(|(name, _)| *name).collect();
        debug!("with environment: {}", names.join(", "));
    }

    let mut command = Command::new(cmd);
    command.args(args);
    command.envs(env.iter().copied());
    if let Some(dir) = current_dir {
        debug!("in directory: {}", dir.display());
        command.current_dir(dir);
    }

    let output = command.output()?;

    if output.status.success() {
        debug!("Command succeeded: {} {}", cmd, args.join(" "));
    } else {
        debug!(
            "Command failed: {} {} (exit code: {:?})",
            cmd,
            args.join(" "),
            output.status.code()
        );
    }
    if !output.stdout.is_empty() {
        debug!("stdout: {}", String::from_utf8_lossy(&output.stdout).trim());
    }
    if !output.stderr.is_empty() {
        debug!("stderr: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    Ok(output)
}
