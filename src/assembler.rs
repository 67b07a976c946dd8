// src/assembler.rs
//! Builds the unified translation unit for one project.
//!
//! Files are processed strictly in enumeration order: the include/macro
//! fragment, the declaration body and the self-include list are shared
//! accumulators, so reordering files reorders the output.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::{
    config::UnifyConfig,
    declarations,
    error::{Result, UnifyError},
    index::{SharedIndex, SourceIndex},
    interleave,
    linkage::{self, LinkedLines},
    project::{Project, SketchFile},
    util,
};

/// The four fragments of the generated unit, in output order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnifiedDocument {
    pub header: String,
    pub include_header_part: String,
    pub body: String,
    /// Self-includes, primary sketch first.
    pub include_code_part: Vec<String>,
}

impl UnifiedDocument {
    fn new(framework_include: &str, generated_at: &str) -> Self {
        let header = format!(
            "//This is an automatically generated file\n\
             //Please do not modify this file\n\
             //If you touch this file your change will be overwritten during the next build\n\
             //This file has been generated on {generated_at}\n\n"
        );
        Self {
            header,
            include_header_part: format!("{framework_include}\n"),
            body: String::new(),
            include_code_part: Vec::new(),
        }
    }

    fn add_self_include(&mut self, sketch: &SketchFile) {
        let line = sketch.self_include();
        if sketch.is_primary {
            self.include_code_part.insert(0, line);
        } else {
            self.include_code_part.push(line);
        }
    }

    fn add_unindexed_error(&mut self, sketch: &SketchFile) {
        let name = &sketch.name;
        self.body.push('\n');
        self.body.push_str(&format!(
            "#error the file: {name} is not found in the indexer though it exists on the file system.\n\
             #error this is probably due to a bad configuration: ino and pde are not marked as C++ source files.\n\
             #error please check that *.ino and *.pde are associated with C++ source code in the indexer's file types.\n\
             #error no forward declarations were generated for {name}.\n"
        ));
    }

    /// Final text, wrapped in the sentinel guard.
    pub fn render(&self, sentinel: &str) -> String {
        let mut out = String::with_capacity(
            self.header.len() + self.include_header_part.len() + self.body.len() + 256,
        );
        out.push_str(&format!("#ifdef {sentinel}\n"));
        out.push_str(&self.header);
        out.push_str(&self.include_header_part);
        out.push_str(&self.body);
        out.push('\n');
        for line in &self.include_code_part {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\n#endif\n");
        out
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Assembly {
    /// No sketch files among the project members.
    NoSketches,
    Document(UnifiedDocument),
}

pub struct DocumentAssembler<'a> {
    config: &'a UnifyConfig,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(config: &'a UnifyConfig) -> Self {
        Self { config }
    }

    /// Assemble with a caller-supplied generation time.
    /// Holds the index read lock for the whole run.
    pub fn assemble<I: SourceIndex>(
        &self,
        sketches: &[SketchFile],
        index: &SharedIndex<I>,
        generated_at: &DateTime<Local>,
    ) -> Result<Assembly> {
        let index = index.read()?;

        if sketches.is_empty() {
            return Ok(Assembly::NoSketches);
        }

        let mut doc = UnifiedDocument::new(&self.config.framework_include, &util::format_timestamp(generated_at));
        for sketch in sketches {
            doc.add_self_include(sketch);

            let Some(unit) = index.resolve(&sketch.name) else {
                warn!("{} exists but is not in the source index", sketch.name);
                doc.add_unindexed_error(sketch);
                continue;
            };

            let ranges = linkage::c_linkage_ranges(&sketch.name, &unit.declarations);
            let linked = LinkedLines::from_ranges(&ranges);
            interleave::interleave_into(&unit.includes, &unit.macros, &linked, &mut doc.include_header_part);
            let added = declarations::extract_into(&unit.declarations, &mut doc.body);
            debug!(
                "{}: {} declarations, {} includes, {} C linkage blocks",
                sketch.name,
                added,
                unit.includes.len(),
                ranges.len()
            );
        }

        Ok(Assembly::Document(doc))
    }
}

/* ---------------- generation ---------------- */

#[derive(Debug, PartialEq, Eq)]
pub enum GenerateOutcome {
    Written(PathBuf),
    /// No sketches left; the stale artifact (if any) was removed.
    Removed(PathBuf),
    NothingToDo,
    /// The index lock was unavailable; retry on the next trigger.
    Skipped,
}

/// Run the assembler for `project` and write or delete the artifact.
pub fn generate<I: SourceIndex>(
    project: &Project,
    index: &SharedIndex<I>,
    config: &UnifyConfig,
) -> Result<GenerateOutcome> {
    let sketches = project.sketch_files(config);
    let assembly = match DocumentAssembler::new(config).assemble(&sketches, index, &Local::now()) {
        Ok(a) => a,
        Err(UnifyError::LockUnavailable) => {
            warn!("source index lock unavailable; {} not regenerated", project.name);
            return Ok(GenerateOutcome::Skipped);
        }
        Err(e) => return Err(e),
    };

    let artifact = project.artifact_path(config);
    match assembly {
        Assembly::NoSketches => remove_stale(&artifact),
        Assembly::Document(doc) => {
            write_artifact(&artifact, &doc.render(&config.sentinel))?;
            info!("{} sketches unified into {}", sketches.len(), artifact.display());
            Ok(GenerateOutcome::Written(artifact))
        }
    }
}

fn remove_stale(artifact: &Path) -> Result<GenerateOutcome> {
    if !artifact.exists() {
        return Ok(GenerateOutcome::NothingToDo);
    }
    fs::remove_file(artifact).map_err(|e| UnifyError::io(artifact, e))?;
    info!("no sketches left; removed {}", artifact.display());
    Ok(GenerateOutcome::Removed(artifact.to_path_buf()))
}

fn write_artifact(artifact: &Path, text: &str) -> Result<()> {
    fs::write(artifact, text).map_err(|e| UnifyError::io(artifact, e))
}
