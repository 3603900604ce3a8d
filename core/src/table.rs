use std::fmt::{Display, Formatter};

use console::{measure_text_width, pad_str, Alignment};

/// Plain text table with bordered, centered cells.
#[derive(Debug, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Missing cells render empty, extra cells are dropped.
    pub fn add_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.header.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, title)| {
                self.rows
                    .iter()
                    .map(|row| measure_text_width(&row[i]))
                    .fold(measure_text_width(title), usize::max)
            })
            .collect()
    }
}

fn write_separator(f: &mut Formatter<'_>, widths: &[usize]) -> std::fmt::Result {
    for width in widths {
        write!(f, "+{}", "-".repeat(width + 2))?;
    }
    writeln!(f, "+")
}

fn write_row(f: &mut Formatter<'_>, widths: &[usize], cells: &[String]) -> std::fmt::Result {
    for (cell, width) in cells.iter().zip(widths) {
        write!(f, "| {} ", pad_str(cell, *width, Alignment::Center, None))?;
    }
    writeln!(f, "|")
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();

        write_separator(f, &widths)?;
        write_row(f, &widths, &self.header)?;
        write_separator(f, &widths)?;
        for row in &self.rows {
            write_row(f, &widths, row)?;
        }
        if !self.rows.is_empty() {
            write_separator(f, &widths)?;
        }
        Ok(())
    }
}
