// src/index.rs
//! Read-only facts about each source file, keyed by project-relative name.
//!
//! - `SourceIndex` is the query surface the assembler consumes.
//! - `SharedIndex` puts any index behind a reader/writer lock; readers hold a
//!   scoped guard for the whole generation run.
//! - `SnapshotIndex` is the JSONL form, one `TranslationUnit` per line, so an
//!   external indexer can feed the assembler.

use std::{
    collections::BTreeMap,
    fs,
    io::{BufRead, BufReader, Write},
    path::Path,
    sync::{RwLock, RwLockReadGuard},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnifyError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationKind {
    FunctionDefinition,
    /// `extern "<literal>" ...`, literal without quotes.
    LinkageSpecification { literal: String },
    Other,
}

/// A top-level declaration. Lines are 1-based and inclusive.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeclarationNode {
    #[serde(flatten)]
    pub kind: DeclarationKind,
    pub raw: String,
    pub start_line: u32,
    pub end_line: u32,
    /// File the node's text physically lives in.
    pub containing_file: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct IncludeDirective {
    pub raw: String,
    pub line: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MacroDefinition {
    pub raw: String,
    pub line: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslationUnit {
    pub file: String,
    #[serde(default)]
    pub declarations: Vec<DeclarationNode>,
    #[serde(default)]
    pub includes: Vec<IncludeDirective>,
    #[serde(default)]
    pub macros: Vec<MacroDefinition>,
}

impl TranslationUnit {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into(), ..Self::default() }
    }
}

pub trait SourceIndex {
    /// `None` when the file is not known to the index as a source file.
    fn resolve(&self, file: &str) -> Option<&TranslationUnit>;
}

/// Reader/writer lock around an index.
pub struct SharedIndex<I> {
    inner: RwLock<I>,
}

impl<I: SourceIndex> SharedIndex<I> {
    pub fn new(index: I) -> Self {
        Self { inner: RwLock::new(index) }
    }

    /// Shared read access; released when the guard drops.
    /// A poisoned lock means a writer died mid-update, so readers are refused.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, I>> {
        self.inner.read().map_err(|_| UnifyError::LockUnavailable)
    }

    /// Mutate the index content under the write lock.
    #[cfg(test)]
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut I),
    {
        let mut guard = self.inner.write().map_err(|_| UnifyError::LockUnavailable)?;
        f(&mut guard);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotIndex {
    units: BTreeMap<String, TranslationUnit>,
}

impl SnapshotIndex {
    pub fn from_units(units: impl IntoIterator<Item = TranslationUnit>) -> Self {
        let mut idx = Self::default();
        for unit in units {
            idx.insert(unit);
        }
        idx
    }

    /// Later records for the same file replace earlier ones.
    pub fn insert(&mut self, unit: TranslationUnit) {
        if let Some(old) = self.units.insert(unit.file.clone(), unit) {
            debug!("snapshot holds {} twice; keeping the later record", old.file);
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = fs::File::open(path).map_err(|e| UnifyError::io(path, e))?;
        let mut units = Vec::new();
        for (i, line) in BufReader::new(f).lines().enumerate() {
            let line = line.map_err(|e| UnifyError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let unit: TranslationUnit = serde_json::from_str(&line)
                .map_err(|source| UnifyError::Snapshot { line: i + 1, source })?;
            units.push(unit);
        }
        Ok(Self::from_units(units))
    }
}

impl SourceIndex for SnapshotIndex {
    fn resolve(&self, file: &str) -> Option<&TranslationUnit> {
        self.units.get(file)
    }
}

/// Write units as JSONL, sorted by file name.
pub fn write_snapshot<'a>(units: impl IntoIterator<Item = &'a TranslationUnit>, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(|e| UnifyError::io(parent, e))?;
    }
    let mut units: Vec<_> = units.into_iter().collect();
    units.sort_by(|a, b| a.file.cmp(&b.file));

    let mut f = fs::File::create(out).map_err(|e| UnifyError::io(out, e))?;
    for unit in units {
        let line = serde_json::to_string(unit).map_err(|source| UnifyError::Snapshot { line: 0, source })?;
        writeln!(f, "{line}").map_err(|e| UnifyError::io(out, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn unit(file: &str) -> TranslationUnit {
        let mut u = TranslationUnit::new(file);
        u.includes.push(IncludeDirective { raw: "#include <Wire.h>".into(), line: 1 });
        u.declarations.push(DeclarationNode {
            kind: DeclarationKind::LinkageSpecification { literal: "C".into() },
            raw: "extern \"C\" {\n}".into(),
            start_line: 3,
            end_line: 4,
            containing_file: file.into(),
        });
        u
    }

    #[test]
    fn resolves_by_relative_name() {
        let idx = SnapshotIndex::from_units([unit("Blink.ino")]);
        assert!(idx.resolve("Blink.ino").is_some());
        assert!(idx.resolve("helpers.ino").is_none());
    }

    #[test]
    fn snapshot_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snap/Blink.jsonl");
        let idx = SnapshotIndex::from_units([unit("b.ino"), unit("a.ino")]);
        write_snapshot(idx.units(), &out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.lines().next().unwrap().contains("\"file\":\"a.ino\""));
        assert!(text.contains("\"kind\":\"linkage_specification\""));

        let back = SnapshotIndex::load(&out).unwrap();
        assert_eq!(back.resolve("b.ino"), idx.resolve("b.ino"));
    }

    #[test]
    fn later_record_for_a_file_wins() {
        let mut newer = unit("Blink.ino");
        newer.includes.clear();
        let idx = SnapshotIndex::from_units([unit("Blink.ino"), newer]);
        assert_eq!(idx.len(), 1);
        assert!(idx.resolve("Blink.ino").unwrap().includes.is_empty());
    }

    #[test]
    fn bad_snapshot_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("bad.jsonl");
        fs::write(&out, "{\"file\":\"a.ino\"}\nnot json\n").unwrap();
        match SnapshotIndex::load(&out) {
            Err(UnifyError::Snapshot { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn poisoned_lock_refuses_readers() {
        let shared = SharedIndex::new(SnapshotIndex::default());
        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            shared.update(|_| panic!("writer died")).ok();
        }));
        assert!(matches!(shared.read(), Err(UnifyError::LockUnavailable)));
    }

    #[test]
    fn update_is_visible_to_readers() {
        let shared = SharedIndex::new(SnapshotIndex::default());
        shared.update(|idx| idx.insert(unit("Blink.ino"))).unwrap();
        assert_eq!(shared.read().unwrap().len(), 1);
    }
}
