//! Terminal dashboard for stepped execution: the instruction listing with a
//! cursor at the next instruction, alongside the machine stack.

use nilnovi::Program;

const PADDING: usize = 4;
const CURSOR: &str = "<-- co";

/// Render the instruction listing as a boxed table, marking the 1-based
/// address `co` points at.
pub fn instruction_table(program: &Program, co: usize) -> String {
    let rendered: Vec<String> = program.iter().map(|op| op.to_string()).collect();
    let width = rendered.iter().map(String::len).max().unwrap_or(0) + PADDING;
    let index_width = rendered.len().to_string().len().max(2);

    let bar = format!("+{}+", "-".repeat(index_width + width + 1));
    let mut out = String::new();
    out.push_str(&bar);
    out.push('\n');
    for (i, text) in rendered.iter().enumerate() {
        let address = i + 1;
        let marker = if address == co { format!("  {CURSOR}") } else { String::new() };
        out.push_str(&format!(
            "|{address:<index_width$}|{text:<width$}|{marker}\n"
        ));
    }
    out.push_str(&bar);
    out.push('\n');
    out
}

/// Render the stack as a boxed table, top of stack first.
pub fn stack_table(stack: &[i64]) -> String {
    if stack.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = stack.iter().map(|v| v.to_string()).collect();
    let width = rendered.iter().map(String::len).max().unwrap_or(0) + PADDING;
    let index_width = rendered.len().to_string().len().max(2);

    let bar = format!("+{}+", "-".repeat(index_width + width + 1));
    let mut out = String::new();
    out.push_str(&bar);
    out.push('\n');
    for (i, text) in rendered.iter().enumerate().rev() {
        out.push_str(&format!("|{i:<index_width$}|{text:<width$}|\n"));
    }
    out.push_str(&bar);
    out.push('\n');
    out
}

/// Join two multi-line blocks side by side, bottom-aligned, the way the
/// stack should sit next to the instruction listing.
pub fn side_by_side(left: &str, right: &str) -> String {
    let left_lines: Vec<&str> = left.lines().collect();
    let right_lines: Vec<&str> = right.lines().collect();
    let rows = left_lines.len().max(right_lines.len());
    let left_width = left_lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + PADDING;

    let mut out = String::new();
    for row in 0..rows {
        // Shorter block aligns to the bottom.
        let pick = |lines: &[&str]| -> String {
            let skip = rows - lines.len();
            if row >= skip { lines[row - skip].to_string() } else { String::new() }
        };
        let l = pick(&left_lines);
        let r = pick(&right_lines);
        if r.is_empty() {
            out.push_str(l.trim_end());
        } else {
            out.push_str(&format!("{l:<left_width$}{r}"));
        }
        out.push('\n');
    }
    out
}
