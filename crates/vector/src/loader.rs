use embedwrangler_common::{Result, WranglerError};
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};

/// Parsed embedding table, rows in file order
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Tokens in insertion order
    pub tokens: Vec<String>,

    /// Token -> row index
    pub index: HashMap<String, usize>,

    /// Vector dimensionality (0 until the first row is pushed)
    pub dim: usize,

    /// Row-major values, `tokens.len() * dim`
    pub values: Vec<f32>,
}

impl RawTable {
    /// Append a row. Returns `false` when the token is already present
    /// (the first occurrence is kept).
    pub fn push(&mut self, token: String, row: &[f32]) -> Result<bool> {
        if self.dim == 0 {
            if row.is_empty() {
                return Err(WranglerError::embedding_load(format!(
                    "Token {:?} has no vector values",
                    token
                )));
            }
            self.dim = row.len();
        }

        if row.len() != self.dim {
            return Err(WranglerError::embedding_load(format!(
                "Token {:?} has {} values, expected {}",
                token,
                row.len(),
                self.dim
            )));
        }

        if self.index.contains_key(&token) {
            return Ok(false);
        }

        self.index.insert(token.clone(), self.tokens.len());
        self.tokens.push(token);
        self.values.extend_from_slice(row);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Parse a GloVe / word2vec text table
///
/// Each line is a token followed by its values. An optional
/// `<count> <dim>` header line is honoured. Tokens may contain spaces;
/// the trailing `dim` fields are always the vector, and the last word of
/// a multi-word token must not parse as a number.
pub fn parse_embeddings<R: BufRead>(reader: R, limit: Option<usize>) -> Result<RawTable> {
    let mut table = RawTable::default();
    let mut declared_count = None;
    let mut first_content_line = true;
    let mut row = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| {
            WranglerError::embedding_load(format!("line {}: unreadable: {}", line_no, e))
        })?;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        if first_content_line {
            first_content_line = false;
            if let Some((count, dim)) = parse_header(&fields) {
                debug!("word2vec header: {} tokens x {} dimensions", count, dim);
                if dim == 0 {
                    return Err(WranglerError::embedding_load("Header declares 0 dimensions"));
                }
                declared_count = Some(count);
                table.dim = dim;
                continue;
            }
        }

        if limit.is_some_and(|max| table.len() >= max) {
            break;
        }

        let dim = if table.dim == 0 {
            fields.len() - 1
        } else {
            table.dim
        };

        if dim == 0 || fields.len() < dim + 1 {
            return Err(WranglerError::embedding_load(format!(
                "line {}: expected a token and {} values, found {} fields",
                line_no,
                dim.max(1),
                fields.len()
            )));
        }

        let split = fields.len() - dim;
        // A numeric field right before the vector means the row is too long
        if split > 1 && fields[split - 1].parse::<f32>().is_ok() {
            return Err(WranglerError::embedding_load(format!(
                "line {}: expected {} values, found more",
                line_no, dim
            )));
        }

        row.clear();
        for raw in &fields[split..] {
            let value: f32 = raw.parse().map_err(|_| {
                WranglerError::embedding_load(format!("line {}: invalid number {:?}", line_no, raw))
            })?;
            if !value.is_finite() {
                return Err(WranglerError::embedding_load(format!(
                    "line {}: non-finite value {:?}",
                    line_no, raw
                )));
            }
            row.push(value);
        }

        let token = fields[..split].join(" ");
        if !table.push(token, &row)? {
            warn!("line {}: duplicate token skipped", line_no);
        }
    }

    if table.is_empty() {
        return Err(WranglerError::embedding_load("Embedding resource contains no vectors"));
    }

    if let Some(count) = declared_count {
        if limit.is_none() && count != table.len() {
            warn!(
                "Header declares {} tokens but {} were loaded",
                count,
                table.len()
            );
        }
    }

    Ok(table)
}

fn parse_header(fields: &[&str]) -> Option<(usize, usize)> {
    match fields {
        [count, dim] => Some((count.parse().ok()?, dim.parse().ok()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<RawTable> {
        parse_embeddings(Cursor::new(text), None)
    }

    #[test]
    fn test_parse_glove_lines() {
        let table = parse("the 0.1 0.2 0.3\n, -0.5 0.0 1e-2\n").unwrap();
        assert_eq!(table.dim, 3);
        assert_eq!(table.tokens, vec!["the", ","]);
        assert_eq!(table.index[","], 1);
        assert_eq!(table.values, vec![0.1, 0.2, 0.3, -0.5, 0.0, 0.01]);
    }

    #[test]
    fn test_parse_word2vec_header() {
        let table = parse("2 2\nking 1 0\nqueen 0 1\n").unwrap();
        assert_eq!(table.dim, 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_token_with_spaces_and_blank_lines() {
        let table = parse("paris 1 2\n\r\n\nnew york 0.5 0.5\n").unwrap();
        assert_eq!(table.tokens, vec!["paris", "new york"]);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let table = parse("apple 1 1\napple 2 2\npear 3 3\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(&table.values[..2], &[1.0, 1.0]);
    }

    #[test]
    fn test_limit() {
        let table = parse_embeddings(Cursor::new("a 1\nb 2\nc 3\n"), Some(2)).unwrap();
        assert_eq!(table.tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_rejects_malformed_rows() {
        assert!(parse("a 1 2\nb 1\n").is_err());
        assert!(parse("a 1 x\n").is_err());
        assert!(parse("a 1 NaN\n").is_err());
        assert!(parse("lonely\n").is_err());
        assert!(parse("\n\n").is_err());
    }

    #[test]
    fn test_rejects_extra_values_after_first_row() {
        let err = parse("a 1 2\nb 1 2 3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse("2 2\na 1 2\nb 1 2 3\n").is_err());

        // Numbered multi-word tokens are indistinguishable from long rows
        assert!(parse("a 1 2\nroute 66 3 4\n").is_err());
        assert!(parse("a 1 2\nroute sixty 3 4\n").is_ok());
    }

    #[test]
    fn test_error_names_line() {
        let err = parse("a 1 2\nb 1 2\nc 1 oops\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }
}
