use std::io::{self, BufRead, Write};

/// Line-oriented terminal conversation over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Print `question` and read one line. Returns `None` at end of input.
    ///
    /// Only the line terminator is removed; confirmations compare the rest
    /// verbatim.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.out, "{question}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Parse a 1-based selection from a list of `len` entries into an index.
pub fn parse_selection(raw: &str, len: usize) -> Result<usize, String> {
    let n: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number.", raw.trim()))?;
    if n == 0 || n > len {
        return Err(format!("Please choose a number between 1 and {len}."));
    }
    Ok(n - 1)
}

pub fn parse_percentage(raw: &str) -> Result<i64, String> {
    let pct: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Progress must be a whole number, got '{}'.", raw.trim()))?;
    if !(0..=100).contains(&pct) {
        return Err(format!("Progress must be between 0 and 100, got {pct}."));
    }
    Ok(pct)
}
