//! Converter configuration.
//!
//! [`ConverterSettings`] carries everything a conversion run needs besides the type graph:
//! preferred name casings, where referenced type libraries may be found, the output path,
//! and the pointer size that determines vtable offsets.

use std::{collections::HashSet, fs, path::PathBuf};

use uguid::Guid;

/// Configuration for one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterSettings {
    /// Preferred casings for exported identifiers
    pub names: Vec<String>,

    /// Files with one preferred casing per line
    pub names_files: Vec<PathBuf>,

    /// Type library files that may satisfy references to foreign assemblies
    pub tlb_references: Vec<PathBuf>,

    /// Directories scanned for `*.tlb` files that may satisfy references
    pub tlb_ref_paths: Vec<PathBuf>,

    /// Output library path; never used as a reference candidate
    pub out: Option<PathBuf>,

    /// Library GUID to use instead of the assembly's declared or derived one
    pub override_tlb_id: Option<Guid>,

    /// Size of a pointer on the target platform, in bytes
    pub pointer_size: usize,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        ConverterSettings {
            names: Vec::new(),
            names_files: Vec::new(),
            tlb_references: Vec::new(),
            tlb_ref_paths: Vec::new(),
            out: None,
            override_tlb_id: None,
            pointer_size: 8,
        }
    }
}

impl ConverterSettings {
    /// Settings for a 32-bit target
    #[must_use]
    pub fn win32() -> Self {
        ConverterSettings {
            pointer_size: 4,
            ..Default::default()
        }
    }

    /// Adds preferred casings
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a names file
    #[must_use]
    pub fn with_names_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.names_files.push(path.into());
        self
    }

    /// Adds a reference library file
    #[must_use]
    pub fn with_tlb_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.tlb_references.push(path.into());
        self
    }

    /// Adds a directory to scan for reference libraries
    #[must_use]
    pub fn with_tlb_ref_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tlb_ref_paths.push(path.into());
        self
    }

    /// Sets the output path
    #[must_use]
    pub fn with_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.out = Some(path.into());
        self
    }

    /// Overrides the library GUID
    #[must_use]
    pub fn with_override_tlb_id(mut self, guid: Guid) -> Self {
        self.override_tlb_id = Some(guid);
        self
    }

    /// Collects the library files that may satisfy references to foreign assemblies.
    ///
    /// Explicit references come first, followed by the `*.tlb` files of every existing
    /// reference directory. The output path is excluded (compared case-insensitively) and
    /// duplicates keep their first position. Unreadable directories are skipped.
    #[must_use]
    pub fn candidate_libraries(&self) -> Vec<PathBuf> {
        let mut candidates = self.tlb_references.clone();

        for directory in &self.tlb_ref_paths {
            let Ok(entries) = fs::read_dir(directory) else {
                continue;
            };

            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("tlb"))
                })
                .collect();
            found.sort();
            candidates.extend(found);
        }

        let out = self
            .out
            .as_ref()
            .map(|path| path.to_string_lossy().to_lowercase());

        let mut seen = HashSet::new();
        candidates.retain(|path| {
            let key = path.to_string_lossy().to_lowercase();
            out.as_deref() != Some(key.as_str()) && seen.insert(key)
        });
        candidates
    }
}
