//! Reading-order reconstruction for engines that return free-floating
//! text regions instead of lines.

use crate::models::{Table, TextBlock};

/// Group blocks into visual rows.
///
/// A block joins the current row when its vertical center falls inside the
/// row's span. Rows come out top to bottom, cells left to right.
pub fn group_rows(blocks: &[TextBlock]) -> Vec<Vec<&TextBlock>> {
    let mut sorted: Vec<&TextBlock> = blocks
        .iter()
        .filter(|b| !b.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| a.bbox.y.cmp(&b.bbox.y).then(a.bbox.x.cmp(&b.bbox.x)));

    let mut rows: Vec<Vec<&TextBlock>> = Vec::new();
    let mut span: Option<(u32, u32)> = None;

    for block in sorted {
        let center = block.bbox.center_y();
        match span {
            Some((top, bottom)) if center >= top as f32 && center <= bottom as f32 => {
                span = Some((top, bottom.max(block.bbox.bottom())));
                if let Some(row) = rows.last_mut() {
                    row.push(block);
                }
            }
            _ => {
                span = Some((block.bbox.y, block.bbox.bottom()));
                rows.push(vec![block]);
            }
        }
    }

    for row in rows.iter_mut() {
        row.sort_by_key(|b| b.bbox.x);
    }

    rows
}

/// Join each row's cells with a single space.
pub fn rows_to_lines(rows: &[Vec<&TextBlock>]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Runs of at least two consecutive rows that share the same cell count
/// (two or more cells) are reported as a table.
pub fn detect_tables(rows: &[Vec<&TextBlock>]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    let flush = |run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>| {
        if run.len() >= 2 {
            tables.push(Table {
                rows: std::mem::take(run),
            });
        } else {
            run.clear();
        }
    };

    for row in rows {
        let cells: Vec<String> = row.iter().map(|b| b.text.trim().to_string()).collect();
        if cells.len() < 2 {
            flush(&mut run, &mut tables);
            continue;
        }
        if let Some(previous) = run.last() {
            if previous.len() != cells.len() {
                flush(&mut run, &mut tables);
            }
        }
        run.push(cells);
    }
    flush(&mut run, &mut tables);

    tables
}
