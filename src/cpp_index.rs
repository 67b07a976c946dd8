// src/cpp_index.rs
//! Built-in source index: parses each associated project member with
//! tree-sitter-cpp and records its top-level declarations, includes and macros.
//!
//! Preprocessor conditionals are not evaluated. Their primary branch is
//! treated as if it were unconditional; `#else`/`#elif` branches are skipped
//! for declarations but still scanned for includes and macros.

use std::{collections::BTreeMap, fs};

use log::{debug, warn};
use tree_sitter::{Node, Parser};

use crate::{
    config::IndexConfig,
    error::{Result, UnifyError},
    index::{DeclarationKind, DeclarationNode, IncludeDirective, MacroDefinition, SourceIndex, TranslationUnit},
    project::Project,
};

/// Nodes whose children are still "top level" for our purposes.
const CONDITIONAL_KINDS: [&str; 2] = ["preproc_if", "preproc_ifdef"];

pub struct TreeSitterIndex {
    units: BTreeMap<String, TranslationUnit>,
}

impl TreeSitterIndex {
    /// Parse every project member whose extension the config associates with C/C++.
    pub fn build(project: &Project, config: &IndexConfig) -> Result<Self> {
        let mut parser = cpp_parser()?;
        let mut units = BTreeMap::new();

        for member in &project.members {
            let Some(ext) = member.extension() else { continue };
            if !config.is_source_extension(ext) {
                debug!("{} is not associated with C/C++; not indexed", member.name);
                continue;
            }
            let bytes = match fs::read(&member.path) {
                Ok(b) => b,
                Err(e) => {
                    warn!("[index] skipping {}: {}", member.path.display(), e);
                    continue;
                }
            };
            // Latin-1 comments from older editors are common in sketches
            let src = String::from_utf8_lossy(&bytes);
            match parse_unit(&mut parser, &member.name, &src) {
                Some(unit) => {
                    units.insert(member.name.clone(), unit);
                }
                None => warn!("[index] parser gave up on {}", member.name),
            }
        }

        Ok(Self { units })
    }

    pub fn units(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.units.values()
    }
}

impl SourceIndex for TreeSitterIndex {
    fn resolve(&self, file: &str) -> Option<&TranslationUnit> {
        self.units.get(file)
    }
}

pub fn cpp_parser() -> Result<Parser> {
    let language: tree_sitter::Language = tree_sitter_cpp::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| UnifyError::Parser(format!("failed to set language: {e}")))?;
    Ok(parser)
}

/// Index one file's text. `None` only if the parser produced no tree.
pub fn parse_unit(parser: &mut Parser, file: &str, src: &str) -> Option<TranslationUnit> {
    let tree = parser.parse(src, None)?;
    let root = tree.root_node();

    let mut unit = TranslationUnit::new(file);
    collect_declarations(root, file, src, &mut unit.declarations);
    collect_directives(root, src, &mut unit);
    unit.includes.sort_by_key(|i| i.line);
    unit.macros.sort_by_key(|m| m.line);
    Some(unit)
}

/* ----------------------------- walkers ----------------------------- */

fn collect_declarations(parent: Node, file: &str, src: &str, out: &mut Vec<DeclarationNode>) {
    let mut cursor = parent.walk();
    for child in parent.named_children(&mut cursor) {
        let kind = child.kind();
        if CONDITIONAL_KINDS.contains(&kind) {
            collect_declarations(child, file, src, out);
            continue;
        }
        // includes, macros and `#else`/`#elif` branches
        if kind.starts_with("preproc_") || kind == "comment" {
            continue;
        }
        // the `name`/`condition` of a conditional are named children too
        if parent.kind() != "translation_unit" && is_conditional_header(parent, child) {
            continue;
        }

        let decl_kind = match kind {
            "function_definition" => DeclarationKind::FunctionDefinition,
            "linkage_specification" => DeclarationKind::LinkageSpecification {
                literal: linkage_literal(child, src),
            },
            _ => DeclarationKind::Other,
        };
        out.push(DeclarationNode {
            kind: decl_kind,
            raw: text(child, src).trim_end().to_string(),
            start_line: line_of(child.start_position().row),
            end_line: line_of(child.end_position().row),
            containing_file: file.to_string(),
        });
    }
}

fn is_conditional_header(parent: Node, child: Node) -> bool {
    ["name", "condition"].iter().any(|field| {
        parent
            .child_by_field_name(field)
            .map(|n| n.id() == child.id())
            .unwrap_or(false)
    })
}

fn linkage_literal(node: Node, src: &str) -> String {
    node.child_by_field_name("value")
        .map(|v| text(v, src).trim_matches('"').to_string())
        .unwrap_or_default()
}

/// Includes and `#define`s anywhere outside function bodies.
fn collect_directives(node: Node, src: &str, unit: &mut TranslationUnit) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "preproc_include" => unit.includes.push(IncludeDirective {
                raw: text(child, src).trim_end().to_string(),
                line: line_of(child.start_position().row),
            }),
            "preproc_def" | "preproc_function_def" => unit.macros.push(MacroDefinition {
                raw: text(child, src).trim_end().to_string(),
                line: line_of(child.start_position().row),
            }),
            "function_definition" => {}
            _ => collect_directives(child, src, unit),
        }
    }
}

fn text<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

fn line_of(row: usize) -> u32 {
    u32::try_from(row + 1).unwrap_or(u32::MAX)
}
