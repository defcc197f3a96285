use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};

/// `path` with `suffix` appended to the file name, e.g. `store.json` -> `store.json.tmp`.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Replaces `path` with `contents` so that readers see either the old or the new file, never a
/// partial one. The data goes to a sibling temp file first, which is then renamed over `path`.
pub async fn replace_atomically(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temp = sibling_path(path, ".tmp");
    let mut file = File::create(&temp).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&temp, path).await
}
