use std::path::PathBuf;

pub const DAEMON_NAME: &str = "worktally-daemon";

/// Daemon binary installed next to the CLI binary at `path`.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name(DAEMON_NAME);
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}
