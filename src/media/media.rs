use super::*;
use crate::Error;
use crate::KMEANS_FILE;
use crate::MAP_FILE;
use crate::Result;
use crate::UPLOADS_DIR;
use std::path::Path;
use std::path::PathBuf;

/// The media root: uploaded files plus the side artifacts of training.
#[derive(Debug, Clone)]
pub struct Media {
    root: PathBuf,
}

impl Media {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(UPLOADS_DIR))?;
        log::info!("media root at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
    pub fn kmeans(&self) -> PathBuf {
        self.root.join(KMEANS_FILE)
    }
    pub fn map(&self) -> PathBuf {
        self.root.join(MAP_FILE)
    }
    fn uploads(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    /// Stores an uploaded file under a sanitized, collision-free name and
    /// returns the stored path relative to the media root.
    pub fn store(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let ref name = sanitize(name);
        let (stem, ext) = split(name);
        for n in 0.. {
            let candidate = match n {
                0 => name.clone(),
                n => format!("{}_{}{}", stem, n, ext),
            };
            let path = self.uploads().join(&candidate);
            match create(&path, bytes) {
                Ok(()) => {
                    log::info!("stored upload {}", path.display());
                    return Ok(format!("{}/{}", UPLOADS_DIR, candidate));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("unbounded candidate search")
    }

    /// Absolute location of a stored upload. Only paths inside the uploads
    /// directory resolve.
    pub fn resolve(&self, stored: &str) -> Result<PathBuf> {
        let name = stored
            .strip_prefix(UPLOADS_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && sanitize(name) == *name && !name.starts_with('.'))
            .ok_or_else(|| Error::Traversal(stored.to_string()))?;
        Ok(self.uploads().join(name))
    }

    /// Removes a stored upload. Already gone is fine.
    pub fn remove(&self, stored: &str) -> Result<()> {
        match std::fs::remove_file(self.resolve(stored)?) {
            Ok(()) => Ok(log::info!("removed upload {}", stored)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(log::warn!("upload {} already gone", stored))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Creates `path`, failing if it exists, and fills it from `source`. A
/// file that could not be filled completely is removed again.
fn create(path: &Path, mut source: impl std::io::Read) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    std::io::copy(&mut source, &mut file)
        .and_then(|_| file.sync_all())
        .inspect_err(|_| {
            let _ = std::fs::remove_file(path);
        })
}

/// Writes to a temporary sibling then renames over the target, so readers
/// see either the old contents or the new, never a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()));
    std::fs::write(&temp, bytes)?;
    std::fs::rename(&temp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&temp);
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> (tempfile::TempDir, Media) {
        let dir = tempfile::tempdir().unwrap();
        let media = Media::new(dir.path().join("media")).unwrap();
        (dir, media)
    }

    #[test]
    fn store_avoids_collisions() {
        let (_dir, media) = media();
        let a = media.store("points.csv", b"a").unwrap();
        let b = media.store("points.csv", b"b").unwrap();
        let c = media.store("points.csv", b"c").unwrap();
        assert_eq!(a, "uploads/points.csv");
        assert_eq!(b, "uploads/points_1.csv");
        assert_eq!(c, "uploads/points_2.csv");
        assert_eq!(std::fs::read(media.resolve(&b).unwrap()).unwrap(), b"b");
    }

    #[test]
    fn store_sanitizes_client_names() {
        let (_dir, media) = media();
        let stored = media.store("../../etc/passwd lists.csv", b"x").unwrap();
        assert_eq!(stored, "uploads/passwd_lists.csv");
    }

    #[test]
    fn resolve_rejects_escapes() {
        let (_dir, media) = media();
        assert!(media.resolve("uploads/../kmeans.json").is_err());
        assert!(media.resolve("/etc/passwd").is_err());
        assert!(media.resolve("uploads/").is_err());
        assert!(media.resolve("kmeans.json").is_err());
        assert!(media.resolve("uploads/ok.csv").is_ok());
    }

    #[test]
    fn remove_tolerates_missing_files() {
        let (_dir, media) = media();
        let stored = media.store("gone.csv", b"x").unwrap();
        media.remove(&stored).unwrap();
        assert!(!media.resolve(&stored).unwrap().exists());
        media.remove(&stored).unwrap();
    }

    #[test]
    fn interrupted_store_leaves_no_file() {
        use std::io::Read;
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk went away"))
            }
        }
        let (_dir, media) = media();
        let path = media.uploads().join("partial.csv");
        assert!(create(&path, (&b"lat,lon\n"[..]).chain(Broken)).is_err());
        assert!(!path.exists());
        let stored = media.store("partial.csv", b"x").unwrap();
        assert_eq!(stored, "uploads/partial.csv");
    }

    #[test]
    fn create_keeps_existing_files() {
        let (_dir, media) = media();
        let stored = media.store("kept.csv", b"old").unwrap();
        let path = media.resolve(&stored).unwrap();
        let error = create(&path, &b"new"[..]).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let (_dir, media) = media();
        let path = media.map();
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let leftovers = std::fs::read_dir(media.root())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
