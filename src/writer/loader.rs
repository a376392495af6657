use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use serde::Deserialize;
use tracing::{info, warn};
use crate::core::config::{Config, Options};
use crate::core::error::Result;
use crate::core::store::Store;
use crate::core::types::{LikesDocument, RawAccount};
use crate::writer::batch::IndexMode;

pub const OPTIONS_FILE: &str = "options.txt";

/// One data file of the initial load: `{"accounts": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub struct AccountsDocument {
    #[serde(default)]
    pub accounts: Vec<RawAccount>,
}

pub fn decode_accounts<R: Read>(reader: R) -> Result<Vec<RawAccount>> {
    let document: AccountsDocument = serde_json::from_reader(BufReader::new(reader))?;
    Ok(document.accounts)
}

pub fn decode_likes<R: Read>(reader: R) -> Result<LikesDocument> {
    Ok(serde_json::from_reader(BufReader::new(reader))?)
}

/// Data files of a load directory in name order; `options.txt` excluded.
fn data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

impl Store {
    /// Bulk-add one accounts document without validation. Records missing a
    /// required field or clashing with an existing one are logged and skipped.
    /// Call `finish_load` once every document is in.
    pub fn load_document<R: Read>(&self, reader: R) -> Result<usize> {
        let mut loaded = 0;
        for raw in decode_accounts(reader)? {
            match self.add(raw, false, IndexMode::Bulk) {
                Ok(_) => loaded += 1,
                Err(err) => warn!(error = %err, "skipping account"),
            }
        }
        Ok(loaded)
    }

    /// Bulk-record a `{"likes": [...]}` document; unknown ids reject the whole document.
    pub fn load_likes<R: Read>(&self, reader: R) -> Result<usize> {
        let document = decode_likes(reader)?;
        self.add_likes(&document.likes, IndexMode::Bulk)?;
        Ok(document.likes.len())
    }

    /// Create a store from a directory holding `options.txt` and the
    /// accounts documents, and index everything.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Store> {
        let dir = dir.as_ref();
        let options_path = dir.join(OPTIONS_FILE);
        let config = if options_path.exists() {
            Config::with_options(Options::load(&options_path)?)
        } else {
            Config::default()
        };

        let store = Store::new(config)?;
        for path in data_files(dir)? {
            let loaded = store.load_document(fs::File::open(&path)?)?;
            info!(file = %path.display(), loaded, "data file loaded");
        }
        store.finish_load();
        Ok(store)
    }
}
