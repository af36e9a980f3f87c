//! Source Map v3 decoding and position lookup.
//!
//! Only the parts needed to translate a generated `line:column` back to its
//! original position are kept: `sources`, `names` and the decoded
//! `mappings` table.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors produced while decoding a source map.
#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("Source map read failed for '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source map JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported source map version {0} (only version 3 is supported)")]
    UnsupportedVersion(u32),

    #[error("Invalid base64 VLQ character '{0}' in mappings")]
    InvalidBase64(char),

    #[error("Truncated VLQ value in mappings segment '{0}'")]
    TruncatedVlq(String),

    #[error("Mappings segment on generated line {line} has {fields} fields (expected 1, 4 or 5)")]
    InvalidSegment { line: usize, fields: usize },

    #[error("Mappings reference {kind} index {index} but only {len} are declared")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Mappings produce an out-of-range {0}")]
    ValueOutOfRange(&'static str),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    source_root: Option<String>,
    sources: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    mappings: String,
}

/// Position in the original sources. `line` is 1-based, `column` 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: String,
    pub line: u32,
    pub column: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct OriginalRef {
    source: u32,
    line: u32,
    column: u32,
    name: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    generated_column: u32,
    original: Option<OriginalRef>,
}

/// Decoded source map.
#[derive(Debug, Clone)]
pub struct SourceMap {
    file: Option<String>,
    sources: Vec<String>,
    names: Vec<String>,
    /// Mappings per generated line (0-based), sorted by generated column.
    lines: Vec<Vec<Mapping>>,
}

impl SourceMap {
    /// Read and decode a source map file.
    pub fn from_path(path: &Path) -> Result<Self, SourceMapError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceMapError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Decode a source map document.
    pub fn from_json(text: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(text)?;
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }

        let sources = match raw.source_root.as_deref().filter(|r| !r.is_empty()) {
            Some(root) => raw
                .sources
                .iter()
                .map(|s| format!("{}/{}", root.trim_end_matches('/'), s))
                .collect(),
            None => raw.sources,
        };

        let lines = decode_mappings(&raw.mappings, sources.len(), raw.names.len())?;
        Ok(Self {
            file: raw.file,
            sources,
            names: raw.names,
            lines,
        })
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Original position for a generated position.
    ///
    /// `line` is 1-based. The mapping with the greatest generated column not
    /// past `column` wins; positions before the first mapping of a line, or
    /// on lines without mappings, have no original position.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let index = usize::try_from(line.checked_sub(1)?).ok()?;
        let segments = self.lines.get(index)?;
        let upto = segments.partition_point(|m| m.generated_column <= column);
        let original = segments.get(upto.checked_sub(1)?)?.original?;

        Some(OriginalPosition {
            source: self.sources.get(original.source as usize)?.clone(),
            line: original.line.saturating_add(1),
            column: original.column,
            name: original
                .name
                .and_then(|n| self.names.get(n as usize))
                .cloned(),
        })
    }
}

// ---------------------------------------------------------------------------
// VLQ decoding
// ---------------------------------------------------------------------------

const VLQ_CONTINUATION: u32 = 0b10_0000;
const VLQ_VALUE_MASK: u32 = 0b01_1111;

fn base64_value(c: char) -> Result<u32, SourceMapError> {
    let v = match c {
        'A'..='Z' => c as u32 - 'A' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 26,
        '0'..='9' => c as u32 - '0' as u32 + 52,
        '+' => 62,
        '/' => 63,
        _ => return Err(SourceMapError::InvalidBase64(c)),
    };
    Ok(v)
}

/// Decode every VLQ value in one comma-free segment.
fn decode_segment(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut acc: i64 = 0;
    let mut shift = 0u32;
    let mut pending = false;

    for c in segment.chars() {
        let digit = base64_value(c)?;
        if shift > 60 {
            return Err(SourceMapError::TruncatedVlq(segment.to_string()));
        }
        acc |= i64::from(digit & VLQ_VALUE_MASK) << shift;
        if digit & VLQ_CONTINUATION != 0 {
            shift += 5;
            pending = true;
        } else {
            let magnitude = acc >> 1;
            values.push(if acc & 1 == 1 { -magnitude } else { magnitude });
            acc = 0;
            shift = 0;
            pending = false;
        }
    }

    if pending {
        return Err(SourceMapError::TruncatedVlq(segment.to_string()));
    }
    Ok(values)
}

fn apply_delta(base: i64, delta: i64, what: &'static str) -> Result<i64, SourceMapError> {
    match base.checked_add(delta) {
        Some(next) if (0..=i64::from(u32::MAX)).contains(&next) => Ok(next),
        _ => Err(SourceMapError::ValueOutOfRange(what)),
    }
}

fn check_index(kind: &'static str, index: i64, len: usize) -> Result<u32, SourceMapError> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i as u32),
        _ => Err(SourceMapError::IndexOutOfRange { kind, index, len }),
    }
}

fn decode_mappings(
    mappings: &str,
    source_count: usize,
    name_count: usize,
) -> Result<Vec<Vec<Mapping>>, SourceMapError> {
    // Source, original line/column and name are relative across the whole
    // document; the generated column resets on every line.
    let mut source: i64 = 0;
    let mut orig_line: i64 = 0;
    let mut orig_column: i64 = 0;
    let mut name: i64 = 0;

    let mut lines = Vec::new();
    for (line_no, line) in mappings.split(';').enumerate() {
        let mut generated_column: i64 = 0;
        let mut segments = Vec::new();

        for segment in line.split(',').filter(|s| !s.is_empty()) {
            let fields = decode_segment(segment)?;
            generated_column = apply_delta(generated_column, fields[0], "generated column")?;

            let original = match fields.len() {
                1 => None,
                4 | 5 => {
                    source = apply_delta(source, fields[1], "source index")?;
                    orig_line = apply_delta(orig_line, fields[2], "original line")?;
                    orig_column = apply_delta(orig_column, fields[3], "original column")?;
                    let name_index = if fields.len() == 5 {
                        name = apply_delta(name, fields[4], "name index")?;
                        Some(check_index("name", name, name_count)?)
                    } else {
                        None
                    };
                    Some(OriginalRef {
                        source: check_index("source", source, source_count)?,
                        line: orig_line as u32,
                        column: orig_column as u32,
                        name: name_index,
                    })
                }
                n => {
                    return Err(SourceMapError::InvalidSegment {
                        line: line_no + 1,
                        fields: n,
                    });
                }
            };

            segments.push(Mapping {
                generated_column: generated_column as u32,
                original,
            });
        }

        segments.sort_by_key(|m| m.generated_column);
        lines.push(segments);
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_segment_values() {
        assert_eq!(decode_segment("AAAA").unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(decode_segment("C").unwrap(), vec![1]);
        assert_eq!(decode_segment("D").unwrap(), vec![-1]);
        // 16 needs a continuation digit: "gB"
        assert_eq!(decode_segment("gB").unwrap(), vec![16]);
        assert_eq!(decode_segment("SAAQ").unwrap(), vec![9, 0, 0, 8]);
    }

    #[test]
    fn test_decode_segment_rejects_garbage() {
        assert!(matches!(
            decode_segment("A*"),
            Err(SourceMapError::InvalidBase64('*'))
        ));
        assert!(matches!(
            decode_segment("g"),
            Err(SourceMapError::TruncatedVlq(_))
        ));
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let err = decode_mappings("AA", 1, 0).unwrap_err();
        assert!(matches!(
            err,
            SourceMapError::InvalidSegment { line: 1, fields: 2 }
        ));
    }

    #[test]
    fn test_source_index_checked() {
        let err = decode_mappings("ACAA", 1, 0).unwrap_err();
        assert!(matches!(
            err,
            SourceMapError::IndexOutOfRange { kind: "source", index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_generated_column_resets_per_line() {
        let lines = decode_mappings("AAAA,EAAE;EACA", 1, 0).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1].generated_column, 2);
        assert_eq!(lines[1][0].generated_column, 2);
        let orig = lines[1][0].original.unwrap();
        assert_eq!((orig.line, orig.column), (1, 2));
    }
}
