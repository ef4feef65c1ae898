/// One unit of submitted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Consecutive code lines, evaluated together.
    Code(String),
    /// A single command line such as `/list -all`.
    Command(String),
}

/// Whether a line is a shell command rather than code. Comments that start
/// with `//` or `/*` are code.
pub fn is_command(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('/') && !line.starts_with("//") && !line.starts_with("/*")
}

/// Splits submitted text into code chunks and command lines, in order.
pub fn split_input(code: &str) -> Vec<Input> {
    let mut inputs = Vec::new();
    let mut chunk = String::new();

    for line in code.lines() {
        if is_command(line) {
            flush(&mut chunk, &mut inputs);
            inputs.push(Input::Command(line.trim().to_string()));
        } else {
            chunk.push_str(line);
            chunk.push('\n');
        }
    }
    flush(&mut chunk, &mut inputs);
    inputs
}

fn flush(chunk: &mut String, inputs: &mut Vec<Input>) {
    if !chunk.trim().is_empty() {
        inputs.push(Input::Code(std::mem::take(chunk)));
    }
    chunk.clear();
}
