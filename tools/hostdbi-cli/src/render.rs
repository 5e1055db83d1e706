///
/// Plain-text rendering of fetched frames.
///
/// One header line of column names, then one line per row led by its row
/// label. Cells are right-aligned to the widest entry in their column;
/// missing cells print as `NA` and nested cells as their type and length.
///

use hostdbi_core::na::{from_logical, is_na_real};
use hostdbi_core::{Column, Missing, Table};

pub fn cell_text(column: &Column, row: usize) -> String {
    match column {
        Column::Bool(v) => match from_logical(v[row]) {
            Some(true) => "TRUE".to_string(),
            Some(false) => "FALSE".to_string(),
            None => "NA".to_string(),
        },
        Column::Int(v) if v[row].is_na() => "NA".to_string(),
        Column::Int(v) => v[row].to_string(),
        Column::Float(v) if is_na_real(v[row]) => "NA".to_string(),
        Column::Float(v) => v[row].to_string(),
        Column::String(v) => v[row].clone(),
        Column::Nested(v) => match &v[row] {
            Some(inner) => format!("<{}[{}]>", inner.element_type().name(), inner.len()),
            None => "NULL".to_string(),
        },
    }
}

pub fn render_table(table: &Table) -> String {
    let rows = table.row_count();
    let labels: Vec<String> = match table.row_names() {
        Some(names) => names.to_vec(),
        None => (1..=rows).map(|i| i.to_string()).collect(),
    };

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);
    let mut label_col = vec![String::new()];
    label_col.extend(labels);
    grid.push(label_col);
    for (name, column) in table.names().iter().zip(table.columns()) {
        let mut cells = Vec::with_capacity(rows + 1);
        cells.push(name.clone());
        cells.extend((0..rows.min(column.len())).map(|r| cell_text(column, r)));
        cells.resize(rows + 1, String::new());
        grid.push(cells);
    }

    let widths: Vec<usize> = grid
        .iter()
        .map(|col| col.iter().map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for r in 0..=rows {
        let line: Vec<String> = grid
            .iter()
            .zip(&widths)
            .map(|(col, &w)| format!("{:>w$}", col[r], w = w))
            .collect();
        out.push_str(line.join(" ").trim_end());
        out.push('\n');
    }
    out
}
