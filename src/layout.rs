//! Columnar text layout. Knows nothing about VMs: it takes already-stringified
//! columns and produces fixed-width lines.

/// Header of the synthetic row-number column.
pub const INDEX_HEADER: &str = "idx";

fn text_width(s: &str) -> usize {
    s.chars().count()
}

fn pad(out: &mut String, cell: &str, width: usize) {
    out.push_str(cell);
    for _ in text_width(cell)..width {
        out.push(' ');
    }
}

fn row_count(columns: &[Vec<String>]) -> usize {
    columns.iter().map(Vec::len).max().unwrap_or(0)
}

/// Width of every output column, index column first when `numbered`.
///
/// A column is as wide as its longest value or header, plus `offset`.
pub fn column_widths(
    offset: usize,
    headers: Option<&[&str]>,
    numbered: bool,
    columns: &[Vec<String>],
) -> Vec<usize> {
    let rows = row_count(columns);
    let mut widths = Vec::with_capacity(columns.len() + 1);

    if numbered {
        let largest = rows.saturating_sub(1).to_string();
        widths.push(text_width(INDEX_HEADER).max(largest.len()) + offset);
    }

    for (i, column) in columns.iter().enumerate() {
        let header = headers.and_then(|h| h.get(i)).map_or(0, |h| text_width(h));
        let longest = column.iter().map(|v| text_width(v)).max().unwrap_or(0);
        widths.push(header.max(longest) + offset);
    }
    widths
}

/// Lay out `columns` as left-justified, space-padded lines.
///
/// Output is the header line (when `headers` is given) followed by one line
/// per row. Columns are concatenated without separators; the padding is the
/// separator. Short columns are filled with empty cells.
pub fn tabulate(
    offset: usize,
    headers: Option<&[&str]>,
    numbered: bool,
    columns: &[Vec<String>],
) -> Vec<String> {
    let widths = column_widths(offset, headers, numbered, columns);
    let rows = row_count(columns);
    let mut lines = Vec::with_capacity(rows + 1);
    let value_widths = if numbered { &widths[1..] } else { &widths[..] };

    if let Some(headers) = headers {
        let mut line = String::new();
        if numbered {
            pad(&mut line, INDEX_HEADER, widths[0]);
        }
        for (i, width) in value_widths.iter().enumerate() {
            pad(&mut line, headers.get(i).copied().unwrap_or(""), *width);
        }
        lines.push(line);
    }

    for row in 0..rows {
        let mut line = String::new();
        if numbered {
            pad(&mut line, &row.to_string(), widths[0]);
        }
        for (column, width) in columns.iter().zip(value_widths) {
            pad(&mut line, column.get(row).map_or("", String::as_str), *width);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn widths_include_offset() {
        let columns = vec![col(&["1", "22"]), col(&["web1", "database"])];
        let widths = column_widths(2, Some(&["ID", "NAME"]), false, &columns);
        assert_eq!(widths, vec![4, 10]);
    }

    #[test]
    fn header_then_rows() {
        let columns = vec![col(&["1", "2"]), col(&["web1", "web2"])];
        let lines = tabulate(2, Some(&["ID", "NAME"]), false, &columns);
        assert_eq!(lines, vec!["ID  NAME  ", "1   web1  ", "2   web2  "]);
    }

    #[test]
    fn numbered_rows_get_leading_index() {
        let columns = vec![col(&["a", "b"])];
        let lines = tabulate(1, Some(&["X"]), true, &columns);
        assert_eq!(lines, vec!["idx X ", "0   a ", "1   b "]);
    }

    #[test]
    fn index_column_grows_with_row_count() {
        let values: Vec<String> = (0..1500).map(|i| i.to_string()).collect();
        let widths = column_widths(0, None, true, &[values]);
        assert_eq!(widths[0], 4);
    }

    #[test]
    fn zero_rows_yield_header_only() {
        let columns = vec![Vec::new(), Vec::new()];
        let lines = tabulate(2, Some(&["ID", "NAME"]), false, &columns);
        assert_eq!(lines, vec!["ID  NAME  "]);
        assert!(tabulate(2, None, false, &columns).is_empty());
    }

    #[test]
    fn ragged_columns_are_padded_not_panicking() {
        let columns = vec![col(&["1", "2", "3"]), col(&["a"])];
        let lines = tabulate(1, None, false, &columns);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "3   ");
    }

    #[test]
    fn widths_count_chars_not_bytes() {
        let columns = vec![col(&["café"])];
        let lines = tabulate(1, None, false, &columns);
        assert_eq!(lines[0].chars().count(), 5);
    }

    proptest! {
        #[test]
        fn all_lines_have_equal_length(
            offset in 1usize..4,
            numbered in any::<bool>(),
            rows in 0usize..12,
            seed in prop::collection::vec("[a-zA-Z0-9./:-]{0,12}", 1..60),
        ) {
            let ncols = 3;
            let columns: Vec<Vec<String>> = (0..ncols)
                .map(|c| (0..rows).map(|r| seed[(r * ncols + c) % seed.len()].clone()).collect())
                .collect();
            let headers = ["ID", "NAME", "STORAGE_POOL"];
            let lines = tabulate(offset, Some(&headers), numbered, &columns);
            prop_assert_eq!(lines.len(), rows + 1);
            let first = lines[0].chars().count();
            for line in &lines {
                prop_assert_eq!(line.chars().count(), first);
            }
            let widths = column_widths(offset, Some(&headers), numbered, &columns);
            let value_widths = if numbered { &widths[1..] } else { &widths[..] };
            for (w, h) in value_widths.iter().zip(headers) {
                prop_assert!(*w >= h.len() + offset);
            }
            if numbered {
                prop_assert!(widths[0] >= INDEX_HEADER.len() + offset);
            }
        }
    }
}
