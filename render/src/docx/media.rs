use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Where image nodes are loaded from: pictures carried inside the sheet first,
/// then files relative to `root`.
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    embedded: BTreeMap<String, Vec<u8>>,
    root: Option<PathBuf>,
}

impl MediaStore {
    pub fn new() -> Self {
        MediaStore::default()
    }

    /// Resolve file sources against `root` instead of the working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        MediaStore {
            embedded: BTreeMap::new(),
            root: Some(root.into()),
        }
    }

    pub fn insert(&mut self, source: impl Into<String>, data: Vec<u8>) {
        self.embedded.insert(source.into(), data);
    }

    pub fn extend(&mut self, embedded: impl IntoIterator<Item = (String, Vec<u8>)>) {
        self.embedded.extend(embedded);
    }

    pub fn load(&self, source: &str) -> io::Result<Vec<u8>> {
        if let Some(data) = self.embedded.get(source) {
            return Ok(data.clone());
        }
        let path = match &self.root {
            Some(root) => root.join(source),
            None => PathBuf::from(source),
        };
        std::fs::read(path)
    }
}
