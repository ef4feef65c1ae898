use crate::models::Diagnostic;

use super::Session;

/// Message lines of a diagnostic followed by the offending source line and
/// a caret marker under the reported span.
///
/// Spans that run past the end of the line end in `-...`.
pub fn render_diagnostic(source: &str, diag: &Diagnostic) -> Vec<String> {
    let mut lines: Vec<String> = diag
        .message
        .lines()
        .filter(|line| !line.trim_start().starts_with("location:"))
        .map(str::to_string)
        .collect();

    let (start, end) = match (diag.start, diag.end) {
        (Some(start), Some(end)) => (start, end.max(start)),
        _ => (0, source.len()),
    };
    let start = floor_char_boundary(source, start);
    let end = floor_char_boundary(source, end);

    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
    lines.push(source[line_start..line_end].trim_end_matches('\r').to_string());

    let column = source[line_start..start].chars().count();
    let multiline = end > line_end;
    let last = if multiline { line_end } else { end };
    let last_column = source[line_start..last].chars().count() as isize - 1;

    let mut marker = " ".repeat(column);
    marker.push('^');
    if last_column > column as isize {
        marker.push_str(&"-".repeat((last_column - column as isize - 1) as usize));
        marker.push_str(if multiline { "-..." } else { "^" });
    }
    lines.push(marker);
    lines
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl Session {
    /// Prints every diagnostic, errors and warnings alike.
    pub(crate) fn print_diagnostics(&mut self, source: &str, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.out
                .notice(if diag.is_error { "Error:" } else { "Warning:" });
            for line in render_diagnostic(source, diag) {
                self.out.notice(&line);
            }
        }
    }
}
