//! Filesystem storage for exported log artifacts.

use std::{
    io,
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};
use tracing::warn;

const SOURCE: &str = "infra::artifacts";

/// Directory in which export jobs create their result files.
///
/// Files start life as [`NamedTempFile`]s so that a job failing or being
/// cancelled halfway removes its partial output on drop. Only
/// [`persist`](Self::persist) turns one into a durable artifact.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Initialise storage rooted at `root`, creating the directory if necessary.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a uniquely named, owner-only file `<prefix><random><suffix>`.
    pub fn create(&self, prefix: &str, suffix: &str) -> io::Result<NamedTempFile> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)?;
        restrict_to_owner(file.path())?;
        Ok(file)
    }

    /// Keep `file` on disk past its drop and return its final path.
    pub fn persist(&self, file: NamedTempFile) -> io::Result<PathBuf> {
        file.into_temp_path().keep().map_err(|err| err.error)
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::Unsupported => {
            warn!(
                target = SOURCE,
                path = %path.display(),
                error = %err,
                "filesystem refused owner-only permissions"
            );
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    warn!(
        target = SOURCE,
        path = %path.display(),
        "owner-only permissions are not supported on this platform"
    );
    Ok(())
}
