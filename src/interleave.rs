// src/interleave.rs
//! Merges one file's macros and includes into the shared header fragment.
//!
//! Line-order heuristic: a macro is emitted right before the first include
//! that follows it, provided it also follows the include before that. This
//! keeps feature-test `#define`s in front of the header they configure.
//! Macros after the last include are not emitted.

use crate::{
    index::{IncludeDirective, MacroDefinition},
    linkage::LinkedLines,
};

pub fn interleave_into(
    includes: &[IncludeDirective],
    macros: &[MacroDefinition],
    linked: &LinkedLines,
    out: &mut String,
) {
    let mut includes: Vec<&IncludeDirective> = includes.iter().collect();
    includes.sort_by_key(|i| i.line);
    let mut macros: Vec<&MacroDefinition> = macros.iter().collect();
    macros.sort_by_key(|m| m.line);

    let mut previous_include_line = 0u32;
    for include in includes {
        for m in macros
            .iter()
            .filter(|m| previous_include_line < m.line && m.line < include.line)
        {
            out.push_str(&m.raw);
            out.push('\n');
        }

        if linked.contains(include.line) {
            out.push_str("extern \"C\" {\n");
            out.push_str(&include.raw);
            out.push_str("\n}\n");
        } else {
            out.push_str(&include.raw);
            out.push('\n');
        }
        previous_include_line = include.line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::LinkageRange;
    use pretty_assertions::assert_eq;

    fn inc(raw: &str, line: u32) -> IncludeDirective {
        IncludeDirective { raw: raw.into(), line }
    }

    fn mac(raw: &str, line: u32) -> MacroDefinition {
        MacroDefinition { raw: raw.into(), line }
    }

    fn run(includes: &[IncludeDirective], macros: &[MacroDefinition], linked: &LinkedLines) -> String {
        let mut out = String::new();
        interleave_into(includes, macros, linked, &mut out);
        out
    }

    #[test]
    fn macros_land_before_the_include_that_follows_them() {
        let out = run(
            &[inc("#include <A.h>", 10), inc("#include <B.h>", 20)],
            &[mac("#define MID 1", 15), mac("#define FIRST 1", 5)],
            &LinkedLines::default(),
        );
        assert_eq!(out, "#define FIRST 1\n#include <A.h>\n#define MID 1\n#include <B.h>\n");
    }

    #[test]
    fn macros_sharing_a_slot_keep_line_order() {
        let out = run(
            &[inc("#include <A.h>", 10)],
            &[mac("#define B 2", 7), mac("#define A 1", 3)],
            &LinkedLines::default(),
        );
        assert_eq!(out, "#define A 1\n#define B 2\n#include <A.h>\n");
    }

    #[test]
    fn trailing_macros_are_not_emitted() {
        let out = run(&[inc("#include <A.h>", 2)], &[mac("#define LATE 1", 9)], &LinkedLines::default());
        assert_eq!(out, "#include <A.h>\n");
    }

    #[test]
    fn includes_inside_c_linkage_are_wrapped() {
        let linked = LinkedLines::from_ranges(&[LinkageRange { start_line: 8, end_line: 12 }]);
        let out = run(&[inc("#include \"c_api.h\"", 9), inc("#include <Servo.h>", 20)], &[], &linked);
        assert_eq!(out, "extern \"C\" {\n#include \"c_api.h\"\n}\n#include <Servo.h>\n");
    }

    #[test]
    fn unsorted_includes_are_processed_in_line_order() {
        let out = run(
            &[inc("#include <B.h>", 20), inc("#include <A.h>", 10)],
            &[mac("#define MID 1", 15)],
            &LinkedLines::default(),
        );
        assert_eq!(out, "#include <A.h>\n#define MID 1\n#include <B.h>\n");
    }
}
