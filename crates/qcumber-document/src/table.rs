//! Rectangular step tables.
//!
//! A [`Table`] always has at least one row and one column, and every row
//! has the same number of cells. Cell text is stored unescaped; pipes and
//! backslashes are escaped only when rows are rendered.

use crate::errors::TableError;

/// A step's data table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Default for Table {
    /// An empty 2x2 table, the shape offered when a table is first attached.
    fn default() -> Self {
        Self::new(2, 2)
    }
}

impl Table {
    /// Create an empty table; zero dimensions are raised to one.
    #[must_use]
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![String::new(); columns.max(1)]; rows.max(1)],
        }
    }

    /// Build a table from possibly ragged rows.
    ///
    /// Short rows are padded with empty cells. An empty input yields a 1x1
    /// table.
    ///
    /// # Examples
    /// ```
    /// use qcumber_document::Table;
    ///
    /// let table = Table::from_rows(vec![vec!["a", "bb"], vec!["", "ccc"]]);
    /// assert_eq!(table.column_widths(), [1, 3]);
    /// ```
    #[must_use]
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self { rows: Vec::new() };
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect());
        }
        if table.rows.is_empty() {
            table.rows.push(vec![String::new()]);
        }
        table
    }

    /// Append a row, widening the table or padding the row as needed.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        if cells.is_empty() {
            cells.push(String::new());
        }
        let width = self.column_count().max(cells.len());
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        cells.resize(width, String::new());
        self.rows.push(cells);
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// All rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Text of one cell.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Replace the text of one cell.
    ///
    /// # Errors
    /// Returns [`TableError::OutOfBounds`] when the cell does not exist.
    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        text: impl Into<String>,
    ) -> Result<(), TableError> {
        let (rows, columns) = (self.row_count(), self.column_count());
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|cells| cells.get_mut(column))
            .ok_or(TableError::OutOfBounds {
                row,
                column,
                rows,
                columns,
            })?;
        *cell = text.into();
        Ok(())
    }

    /// Insert an empty row at `index`, clamped to the row count.
    pub fn insert_row(&mut self, index: usize) {
        let index = index.min(self.rows.len());
        self.rows
            .insert(index, vec![String::new(); self.column_count()]);
    }

    /// Insert an empty column at `index`, clamped to the column count.
    pub fn insert_column(&mut self, index: usize) {
        let index = index.min(self.column_count());
        for row in &mut self.rows {
            row.insert(index, String::new());
        }
    }

    /// Remove a row.
    ///
    /// # Errors
    /// Fails when the row does not exist or is the only one.
    pub fn remove_row(&mut self, index: usize) -> Result<Vec<String>, TableError> {
        if index >= self.rows.len() {
            return Err(self.out_of_bounds(index, 0));
        }
        if self.rows.len() == 1 {
            return Err(TableError::LastLine("row"));
        }
        Ok(self.rows.remove(index))
    }

    /// Remove a column.
    ///
    /// # Errors
    /// Fails when the column does not exist or is the only one.
    pub fn remove_column(&mut self, index: usize) -> Result<(), TableError> {
        if index >= self.column_count() {
            return Err(self.out_of_bounds(0, index));
        }
        if self.column_count() == 1 {
            return Err(TableError::LastLine("column"));
        }
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(())
    }

    /// Character width of each column as rendered, escapes included.
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.column_count()];
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(escaped_width(cell));
            }
        }
        widths
    }

    /// Render every row with cells padded to their column width.
    #[must_use]
    pub fn render_rows(&self, indent: &str) -> Vec<String> {
        let widths = self.column_widths();
        self.rows
            .iter()
            .map(|row| {
                let mut line = format!("{indent}|");
                for (cell, width) in row.iter().zip(&widths) {
                    line.push_str(&format!(" {:<width$} |", escape_cell(cell)));
                }
                line
            })
            .collect()
    }

    fn out_of_bounds(&self, row: usize, column: usize) -> TableError {
        TableError::OutOfBounds {
            row,
            column,
            rows: self.row_count(),
            columns: self.column_count(),
        }
    }
}

fn escape_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '|' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escaped_width(text: &str) -> usize {
    text.chars()
        .map(|c| if matches!(c, '|' | '\\') { 2 } else { 1 })
        .sum()
}

/// Split a `| a | b |` line into unescaped, trimmed cell texts.
///
/// Returns `None` when the line is not a table row.
pub(crate) fn parse_row(line: &str) -> Option<Vec<String>> {
    let rest = line.trim().strip_prefix('|')?;
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ ('|' | '\\')) => cell.push(next),
                Some(next) => {
                    cell.push('\\');
                    cell.push(next);
                }
                None => cell.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    let trailing = cell.trim();
    if !trailing.is_empty() {
        cells.push(trailing.to_string());
    }
    Some(cells)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise fallible edits")]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn renders_padded_columns() {
        let table = Table::from_rows(vec![vec!["a", "bb"], vec!["", "ccc"]]);
        assert_eq!(table.column_widths(), [1, 3]);
        assert_eq!(
            table.render_rows("      "),
            ["      | a | bb  |", "      |   | ccc |"]
        );
    }

    #[test]
    fn escapes_pipes_and_backslashes() {
        let table = Table::from_rows(vec![vec![r"a|b", "x"], vec![r"c\d", "yy"]]);
        assert_eq!(table.column_widths(), [4, 2]);
        assert_eq!(table.render_rows(""), [r"| a\|b | x  |", r"| c\\d | yy |"]);
    }

    #[test]
    fn default_table_is_two_by_two() {
        let table = Table::default();
        assert_eq!((table.row_count(), table.column_count()), (2, 2));
        assert_eq!(table.render_rows(""), ["|  |  |", "|  |  |"]);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = Table::from_rows(vec![vec!["a"], vec!["b", "c", "d"], vec![]]);
        assert_eq!(table.column_count(), 3);
        assert!(table.rows().iter().all(|row| row.len() == 3));
        assert_eq!(table.cell(0, 2), Some(""));
    }

    #[test]
    fn editing_keeps_the_table_rectangular() {
        let mut table = Table::new(1, 1);
        table.insert_column(5);
        table.insert_row(0);
        table.set_cell(1, 1, "x").unwrap();
        assert_eq!(table.rows(), [vec!["", ""], vec!["", "x"]]);
        assert_eq!(table.remove_row(0).unwrap(), ["", ""]);
        table.remove_column(0).unwrap();
        assert_eq!(table.rows(), [vec!["x"]]);
        assert_eq!(table.remove_row(0), Err(TableError::LastLine("row")));
        assert_eq!(table.remove_column(0), Err(TableError::LastLine("column")));
    }

    #[test]
    fn set_cell_rejects_missing_cells() {
        let mut table = Table::new(2, 2);
        assert_eq!(
            table.set_cell(2, 0, "x"),
            Err(TableError::OutOfBounds {
                row: 2,
                column: 0,
                rows: 2,
                columns: 2
            })
        );
    }

    #[rstest]
    #[case("| a | bb |", Some(vec!["a", "bb"]))]
    #[case("      |   | ccc |", Some(vec!["", "ccc"]))]
    #[case(r"| a\|b | c\\d |", Some(vec!["a|b", r"c\d"]))]
    #[case("| open | row", Some(vec!["open", "row"]))]
    #[case("Given a step", None)]
    fn parses_rows(#[case] line: &str, #[case] expected: Option<Vec<&str>>) {
        let expected =
            expected.map(|cells| cells.into_iter().map(String::from).collect::<Vec<_>>());
        assert_eq!(parse_row(line), expected);
    }
}
