// src/linkage.rs

use std::collections::HashSet;

use crate::index::{DeclarationKind, DeclarationNode};

/// Inclusive line interval of an `extern "C"` block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkageRange {
    pub start_line: u32,
    pub end_line: u32,
}

/// `extern "C"` ranges declared in `file` itself. Blocks attributed to another
/// physical file (pulled in through an include) are ignored.
pub fn c_linkage_ranges(file: &str, decls: &[DeclarationNode]) -> Vec<LinkageRange> {
    decls
        .iter()
        .filter(|d| matches!(&d.kind, DeclarationKind::LinkageSpecification { literal } if literal == "C"))
        .filter(|d| d.containing_file == file)
        .map(|d| LinkageRange { start_line: d.start_line, end_line: d.end_line })
        .collect()
}

/// Every line covered by some C linkage range.
#[derive(Clone, Debug, Default)]
pub struct LinkedLines {
    lines: HashSet<u32>,
}

impl LinkedLines {
    pub fn from_ranges(ranges: &[LinkageRange]) -> Self {
        let lines = ranges
            .iter()
            .flat_map(|r| r.start_line..=r.end_line)
            .collect();
        Self { lines }
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linkage(literal: &str, file: &str, start: u32, end: u32) -> DeclarationNode {
        DeclarationNode {
            kind: DeclarationKind::LinkageSpecification { literal: literal.into() },
            raw: format!("extern \"{literal}\" {{ }}"),
            start_line: start,
            end_line: end,
            containing_file: file.into(),
        }
    }

    #[test]
    fn only_c_blocks_of_the_same_file_count() {
        let decls = vec![
            linkage("C", "Blink.ino", 8, 12),
            linkage("C++", "Blink.ino", 14, 16),
            linkage("C", "wrapper.h", 1, 40),
        ];
        assert_eq!(
            c_linkage_ranges("Blink.ino", &decls),
            vec![LinkageRange { start_line: 8, end_line: 12 }]
        );
    }

    #[test]
    fn ranges_are_inclusive() {
        let lines = LinkedLines::from_ranges(&[LinkageRange { start_line: 8, end_line: 12 }]);
        assert!(!lines.contains(7));
        assert!(lines.contains(8));
        assert!(lines.contains(12));
        assert!(!lines.contains(13));
        assert!(!lines.contains(20));
    }

    #[test]
    fn no_blocks_no_lines() {
        let lines = LinkedLines::from_ranges(&c_linkage_ranges("Blink.ino", &[]));
        assert!((0..100).all(|l| !lines.contains(l)));
    }
}
