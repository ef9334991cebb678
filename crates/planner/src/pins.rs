//! Lossless manifest edits for the pinning stage.
//!
//! Built on `toml_edit` so that comments, ordering, and formatting in
//! member manifests survive the rewrite.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, TableLike, value};

const DEP_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Edits one `Cargo.toml`, preserving its formatting.
pub struct ManifestEditor {
    path: PathBuf,
    doc: DocumentMut,
}

impl ManifestEditor {
    /// Opens a manifest for editing.
    pub fn open(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let doc = contents.parse::<DocumentMut>().map_err(|e| {
            Error::manifest(format!("invalid TOML: {e}"), Some(path.to_path_buf()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Sets the package's own version.
    ///
    /// A `version.workspace = true` inheritance marker is replaced with
    /// the literal version, which is what publishing needs.
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let Some(package) = self.doc.get_mut("package").and_then(Item::as_table_like_mut)
        else {
            return Err(Error::manifest(
                "missing [package] table",
                Some(self.path.clone()),
            ));
        };
        package.insert("version", value(version));
        Ok(())
    }

    /// Pins one dependency to an exact version wherever it is declared.
    ///
    /// Returns whether anything changed. String declarations are replaced
    /// outright; table declarations get their `version` key set and keep
    /// `path`, `features`, and the rest untouched.
    pub fn pin_dependency(&mut self, name: &str, version: &str) -> bool {
        let mut changed = false;
        for table_name in DEP_TABLES {
            if let Some(table) = self
                .doc
                .get_mut(table_name)
                .and_then(Item::as_table_like_mut)
            {
                changed |= pin_in_table(table, name, version);
            }
        }
        if let Some(table) = self
            .doc
            .get_mut("workspace")
            .and_then(Item::as_table_like_mut)
            .and_then(|ws| ws.get_mut("dependencies"))
            .and_then(Item::as_table_like_mut)
        {
            changed |= pin_in_table(table, name, version);
        }
        changed
    }

    /// Pins every dependency present in `versions`, returning how many
    /// declarations were rewritten.
    pub fn pin_all(&mut self, versions: &HashMap<String, String>) -> usize {
        let mut names: Vec<&String> = versions.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter(|name| self.pin_dependency(name, &versions[*name]))
            .count()
    }

    /// Writes the edited manifest back to disk.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.doc.to_string())?;
        Ok(())
    }

    /// The edited document as a string, without writing it.
    #[must_use]
    pub fn contents(&self) -> String {
        self.doc.to_string()
    }
}

fn pin_in_table(table: &mut dyn TableLike, name: &str, version: &str) -> bool {
    let Some(item) = table.get_mut(name) else {
        return false;
    };
    if item.as_str().is_some() {
        *item = value(version);
        return true;
    }
    if let Some(dep) = item.as_table_like_mut() {
        dep.insert("version", value(version));
        return true;
    }
    false
}
