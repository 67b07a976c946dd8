// src/config.rs
//! Plain-data settings threaded through discovery, indexing and assembly.

pub const DEFAULT_ARTIFACT_NAME: &str = ".ino.cpp";
pub const DEFAULT_SENTINEL: &str = "__IN_ECLIPSE__";
pub const DEFAULT_FRAMEWORK_INCLUDE: &str = "#include \"Arduino.h\"";
pub const DEFAULT_SKETCH_EXTENSIONS: [&str; 2] = ["ino", "pde"];
pub const DEFAULT_SOURCE_EXTENSIONS: [&str; 10] =
    ["ino", "pde", "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"];

/// What the assembler produces and which members count as sketches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnifyConfig {
    /// File name of the generated unit, relative to the project root.
    pub artifact_name: String,
    /// Macro that must be defined for the generated unit to compile to anything.
    pub sentinel: String,
    /// First line of the include/macro fragment.
    pub framework_include: String,
    pub sketch_extensions: Vec<String>,
}

impl Default for UnifyConfig {
    fn default() -> Self {
        Self {
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            framework_include: DEFAULT_FRAMEWORK_INCLUDE.to_string(),
            sketch_extensions: DEFAULT_SKETCH_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UnifyConfig {
    pub fn is_sketch_extension(&self, ext: &str) -> bool {
        self.sketch_extensions.iter().any(|e| e == ext)
    }
}

/// File-type associations of the built-in index.
/// A sketch whose extension is missing here exists on disk but never resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    pub source_extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IndexConfig {
    pub fn is_source_extension(&self, ext: &str) -> bool {
        self.source_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
