//! Plain-text numeric tables, the only format the sampler speaks.
//!
//! - writing: fixed point, width 10, 10 decimals (`%10.10f`), single-space
//!   column separator, one row per line
//! - reading: whitespace (or comma) separated numbers; blank lines and lines
//!   starting with `#` are skipped

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Format one number the way the sampler's input files expect.
pub fn format_value(v: f64) -> String {
    format!("{v:10.10}")
}

/// Write rows of numbers to `path`, replacing any existing file.
pub fn write_table<R>(path: &Path, rows: impl IntoIterator<Item = R>) -> Result<()>
where
    R: AsRef<[f64]>,
{
    let lines = rows.into_iter().map(|row| {
        row.as_ref()
            .iter()
            .map(|&v| format_value(v))
            .collect::<Vec<_>>()
            .join(" ")
    });
    write_lines(path, lines)
}

/// Write pre-formatted lines to `path`, replacing any existing file.
pub fn write_lines(path: &Path, lines: impl IntoIterator<Item = String>) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}").map_err(|e| PipelineError::io(path, e))?;
    }
    out.flush().map_err(|e| PipelineError::io(path, e))
}

/// Read a numeric table from `path`.
pub fn read_table(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    parse_table(&text, path)
}

/// Parse numeric rows out of `text`; `origin` is only used in error messages.
pub fn parse_table(text: &str, origin: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    PipelineError::value(format!(
                        "{}:{}: '{tok}' is not a number.",
                        origin.display(),
                        idx + 1
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Require every row of `rows` to have exactly `columns` entries.
pub fn require_columns(rows: &[Vec<f64>], columns: usize, origin: &Path) -> Result<()> {
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
        return Err(PipelineError::value(format!(
            "{}: data row {} has {} column(s), expected {columns}.",
            origin.display(),
            idx + 1,
            row.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_matches_fixed_point_ten_decimals() {
        assert_eq!(format_value(283.2), "283.2000000000");
        assert_eq!(format_value(-0.5), "-0.5000000000");
        assert_eq!(format_value(0.0), "0.0000000000");
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# header\n\n1.0 2.0\n  3.5,\t4e-3  \n";
        let rows = parse_table(text, Path::new("t.txt")).unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.5, 4e-3]]);
    }

    #[test]
    fn parse_reports_line_of_bad_token() {
        let err = parse_table("1 2\n3 x\n", Path::new("t.txt")).unwrap_err();
        assert!(err.to_string().contains("t.txt:2"));
    }

    #[test]
    fn write_then_read_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.txt");
        write_table(&path, [[1.25, 2.5], [3.0, 4.125]]).unwrap();

        let rows = read_table(&path).unwrap();
        require_columns(&rows, 2, &path).unwrap();
        assert_eq!(rows[1], vec![3.0, 4.125]);
        assert!(require_columns(&rows, 3, &path).is_err());
    }
}
