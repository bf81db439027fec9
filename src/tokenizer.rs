//! Lenient CSV reader for user-supplied spreadsheets.
//!
//! Fields are comma separated, `"` quotes, `""` escapes a quote inside a quoted
//! field, and rows end at `\n`, `\r\n` or a lone `\r`. Every field is trimmed.
//! Broken quoting never fails: an unterminated quote swallows the rest of the
//! input into the current field.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => row.push(take_field(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                // Blank lines carry no fields and produce no row
                if !field.is_empty() || !row.is_empty() {
                    row.push(take_field(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(take_field(&mut field));
        rows.push(row);
    }

    rows
}

/// Splits the first row off as the header line.
pub fn parse_csv_file(content: &str) -> CsvTable {
    let mut rows = parse_csv(content);
    if rows.is_empty() {
        return CsvTable::default();
    }

    let headers = rows.remove(0);
    CsvTable { headers, rows }
}

fn take_field(field: &mut String) -> String {
    let value = field.trim().to_string();
    field.clear();
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_comma_stays_in_field() {
        let rows = parse_csv("\"Acme, Inc.\",\"Engineer\"");
        assert_eq!(rows, vec![vec!["Acme, Inc.".to_string(), "Engineer".to_string()]]);
    }

    #[test]
    fn test_escaped_quote() {
        let rows = parse_csv("\"Say \"\"hi\"\"\",\"Dev\"\n");
        assert_eq!(rows[0][0], "Say \"hi\"");
        assert_eq!(rows[0][1], "Dev");
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        let rows = parse_csv("a,b\r\nc,d\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);

        let rows = parse_csv("a,b\rc,d");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_trailing_row_without_newline() {
        let rows = parse_csv("h1,h2\nlast,row");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["last".to_string(), "row".to_string()]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let rows = parse_csv("a,b\n\n\nc,d\n\n");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_fields_are_trimmed_and_empty_fields_kept() {
        let rows = parse_csv("  Acme  , ,Engineer \n");
        assert_eq!(
            rows[0],
            vec!["Acme".to_string(), "".to_string(), "Engineer".to_string()]
        );
    }

    #[test]
    fn test_embedded_newline_in_quotes() {
        let rows = parse_csv("notes,id\n\"line one\nline two\",7\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "line one\nline two");
        assert_eq!(rows[1][1], "7");
    }

    #[test]
    fn test_unterminated_quote_swallows_rest() {
        let rows = parse_csv("a,\"open field\nstill, open\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "a");
        assert_eq!(rows[0][1], "open field\nstill, open");
    }

    #[test]
    fn test_well_formed_rows_match_header_width() {
        let content = "Company,Position,Status\nAcme,Engineer,applied\n\"Globex, LLC\",\"Dev \"\"Ops\"\"\",offer\nInitech,,target\n";
        let table = parse_csv_file(content);
        assert_eq!(table.rows.len(), 3);
        for row in &table.rows {
            assert_eq!(row.len(), table.headers.len());
        }
    }

    #[test]
    fn test_parse_csv_file_empty() {
        let table = parse_csv_file("");
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
        assert!(table.rows.is_empty());

        let table = parse_csv_file("Company,Position\n");
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }
}
