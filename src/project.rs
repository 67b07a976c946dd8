// src/project.rs
//! Sketch discovery: which project members take part in the unified unit.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::{
    config::UnifyConfig,
    error::{Result, UnifyError},
    util,
};

/// A direct member of the project root, as the workspace lists it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub path: PathBuf,
    /// Resolved target when the member is a symlink.
    pub link_target: Option<PathBuf>,
}

impl Member {
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SketchFile {
    /// Project-relative name, also the index key.
    pub name: String,
    pub is_primary: bool,
    pub link_target: Option<PathBuf>,
}

impl SketchFile {
    /// `#include` line pulling the sketch itself into the unified unit.
    pub fn self_include(&self) -> String {
        match &self.link_target {
            Some(location) => format!("#include \"{}\"", util::to_include_path(location)),
            None => format!("#include \"{}\"", self.name),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
    pub members: Vec<Member>,
}

impl Project {
    /// Lists the direct file members of `root`, sorted by file name.
    pub fn open(root: &Path, name: Option<&str>) -> Result<Self> {
        let root = root.canonicalize().map_err(|e| UnifyError::io(root, e))?;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| util::project_name_from_path(&root));

        let mut members = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for dent in walker {
            let dent = dent.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                UnifyError::io(path, e.into())
            })?;
            let Some(file_name) = dent.file_name().to_str() else {
                debug!("skipping non-utf8 member {}", dent.path().display());
                continue;
            };
            if !dent.path().is_file() {
                continue;
            }
            let link_target = if dent.path_is_symlink() {
                dent.path().canonicalize().ok()
            } else {
                None
            };
            members.push(Member {
                name: file_name.to_string(),
                path: dent.path().to_path_buf(),
                link_target,
            });
        }

        Ok(Self { name, root, members })
    }

    /// Members with a recognized sketch extension, in enumeration order.
    pub fn sketch_files(&self, config: &UnifyConfig) -> Vec<SketchFile> {
        classify_sketches(&self.name, &self.members, config)
    }

    pub fn artifact_path(&self, config: &UnifyConfig) -> PathBuf {
        self.root.join(&config.artifact_name)
    }
}

pub fn classify_sketches(project_name: &str, members: &[Member], config: &UnifyConfig) -> Vec<SketchFile> {
    members
        .iter()
        .filter_map(|m| {
            let ext = m.extension()?;
            if !config.is_sketch_extension(ext) {
                return None;
            }
            Some(SketchFile {
                name: m.name.clone(),
                is_primary: m.name == format!("{project_name}.{ext}"),
                link_target: m.link_target.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> Member {
        Member { name: name.into(), path: PathBuf::from(name), link_target: None }
    }

    #[test]
    fn only_sketch_extensions_participate() {
        let members = vec![member("Blink.ino"), member("util.cpp"), member("old.pde"), member("README")];
        let sketches = classify_sketches("Blink", &members, &UnifyConfig::default());
        let names: Vec<_> = sketches.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Blink.ino", "old.pde"]);
    }

    #[test]
    fn primary_matches_project_name_and_own_extension() {
        let members = vec![member("Blink.pde"), member("Blinker.ino"), member("blink.ino")];
        let sketches = classify_sketches("Blink", &members, &UnifyConfig::default());
        assert!(sketches[0].is_primary);
        assert!(!sketches[1].is_primary);
        assert!(!sketches[2].is_primary);
    }

    #[test]
    fn linked_sketch_includes_its_location() {
        let mut m = member("shared.ino");
        m.link_target = Some(PathBuf::from("/opt/lib/shared.ino"));
        let sketches = classify_sketches("Blink", &[m], &UnifyConfig::default());
        assert!(sketches[0].link_target.is_some());
        assert_eq!(sketches[0].self_include(), "#include \"/opt/lib/shared.ino\"");
    }

    #[test]
    fn plain_sketch_includes_its_name() {
        let sketches = classify_sketches("Blink", &[member("Blink.ino")], &UnifyConfig::default());
        assert_eq!(sketches[0].self_include(), "#include \"Blink.ino\"");
    }
}
