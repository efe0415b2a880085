use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct WorldInfo {
    pub name: String,
    pub checksum: String,
    pub path: PathBuf,
    /// Edge length of the world in world units, when known. Used to
    /// normalize minimap coordinates.
    pub size: Option<f32>,
}

/// Source of world data. Parsing world files is the loader's business; the
/// session only needs to know whether a world is available.
pub trait WorldLoader {
    fn load(&mut self, name: &str, checksum: &str) -> Option<WorldInfo>;

    /// Stores downloaded world data so a later `load` can find it.
    fn install(&mut self, name: &str, checksum: &str, data: &[u8]) -> io::Result<()>;
}

/// Looks for `{root}/{name}_{checksum}.s2z`.
#[derive(Debug, Clone)]
pub struct MapDirectoryLoader {
    root: PathBuf,
}

impl MapDirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn world_path(&self, name: &str, checksum: &str) -> PathBuf {
        self.root.join(format!("{}_{}.s2z", name, checksum))
    }
}

impl WorldLoader for MapDirectoryLoader {
    fn load(&mut self, name: &str, checksum: &str) -> Option<WorldInfo> {
        let path = self.world_path(name, checksum);
        if !path.is_file() {
            log::debug!("World file {} not found", path.display());
            return None;
        }
        Some(WorldInfo {
            name: name.to_string(),
            checksum: checksum.to_string(),
            path,
            size: None,
        })
    }

    fn install(&mut self, name: &str, checksum: &str, data: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.world_path(name, checksum);
        std::fs::write(&path, data)?;
        log::info!("Wrote {} bytes of world data to {}", data.len(), path.display());
        Ok(())
    }
}
