//! Table layout: column grid, cell placement, row heights and vertical merges.
//!
//! Every cell gets its own flow, created at the row's top and narrowed to the
//! cell's columns. A row is as tall as its tallest cell. A merge continuation
//! cell is never laid out; it extends the bounds of the cell that opened the
//! merge and reports zero rows of its own.

use std::collections::HashMap;

use log::{debug, warn};

use super::flow::{ContentExtent, VirtualFlow};
use super::paragraph::layout_paragraph;
use super::LayoutContext;
use crate::error::Result;
use crate::model::{CellLayout, Column, InSequence, Rect, Row, Table, TableLayout, TableStyle};
use crate::style::Justification;

/// Where a cell sits in the grid, decided before its content is laid out.
struct Slot {
    column: usize,
    x: f64,
    width: f64,
    /// Row and cell index of the merge this cell continues.
    continues: Option<(usize, usize)>,
}

pub fn layout_table(
    table: &mut Table,
    ctx: &LayoutContext<'_>,
    flow: &mut VirtualFlow,
    extent: &mut ContentExtent,
) -> Result<()> {
    if table.layout.is_laid() {
        debug!("Table already laid out, skipping");
        return Ok(());
    }

    let column_starts = column_starts(&table.columns);
    let table_width = if table.columns.is_empty() {
        flow.width()
    } else {
        table.columns.iter().map(|c| c.width).sum::<f64>()
    };
    let origin_x = table_origin(&table.style, flow, table_width);
    let spacing = table.style.cell_spacing;
    let start_y = flow.y();

    // Column → (row, cell) of the cell that opened a vertical merge there.
    let mut open_merges: HashMap<usize, (usize, usize)> = HashMap::new();
    let mut placements: Vec<Vec<CellLayout>> = Vec::with_capacity(table.rows.len());
    let mut row_heights = Vec::with_capacity(table.rows.len());

    for (row_idx, row) in table.rows.iter_mut().enumerate() {
        check_spans(row, table.columns.len(), row_idx);

        let row_y = flow.y();
        let mut row_height = row.min_height.unwrap_or(0.0);
        let fallback_width = table_width / row.cells.len().max(1) as f64;
        let mut slots = Vec::with_capacity(row.cells.len());
        let mut column = 0;
        let mut cursor_x = 0.0;

        for (cell_idx, cell) in row.cells.iter_mut().enumerate() {
            let span = cell.span.max(1);
            let (x, width) = cell_geometry(
                &table.columns,
                &column_starts,
                column,
                span,
                cursor_x,
                cell.width.unwrap_or(fallback_width),
            );

            let continues = match cell.merge_order() {
                Some(InSequence::First) => {
                    open_merges.insert(column, (row_idx, cell_idx));
                    None
                }
                Some(_) => {
                    let open = open_merges.get(&column).copied();
                    if open.is_none() {
                        warn!(
                            "Row {row_idx}: merge continuation in column {column} without a restart cell, laying it out on its own"
                        );
                    }
                    open
                }
                None => {
                    open_merges.remove(&column);
                    None
                }
            };

            if continues.is_none() {
                let margins = cell
                    .margins
                    .layered_over(&row.margins)
                    .layered_over(&table.style.margins);
                let start = margins.start.unwrap_or(0.0);
                let end = margins.end.unwrap_or(0.0);
                let mut cell_flow = flow.create_cell_flow(
                    origin_x + x + spacing + start,
                    width - 2.0 * spacing - start - end,
                );
                cell_flow.advance(spacing + margins.top.unwrap_or(0.0));
                for par in &mut cell.paragraphs {
                    layout_paragraph(par, ctx, &mut cell_flow, extent)?;
                }
                let content = cell_flow.y() - row_y + margins.bottom.unwrap_or(0.0) + spacing;
                row_height = row_height.max(content);
            }

            slots.push(Slot {
                column,
                x,
                width,
                continues,
            });
            column += span;
            cursor_x = x + width;
        }

        flow.advance(row_height);
        row_heights.push(row_height);

        let mut placed = Vec::with_capacity(slots.len());
        for slot in slots {
            let bounds = Rect::new(origin_x + slot.x, row_y, slot.width, row_height);
            match slot.continues {
                Some((r, c)) => {
                    if let Some(first) = placements.get_mut(r).and_then(|row| row.get_mut(c)) {
                        first.bounds.height = bounds.bottom() - first.bounds.y;
                        first.num_rows_in_span += 1;
                    }
                    placed.push(CellLayout {
                        column: slot.column,
                        bounds,
                        num_rows_in_span: 0,
                    });
                }
                None => placed.push(CellLayout {
                    column: slot.column,
                    bounds,
                    num_rows_in_span: 1,
                }),
            }
        }
        placements.push(placed);
    }

    for (row, placed) in table.rows.iter_mut().zip(placements) {
        for (cell, layout) in row.cells.iter_mut().zip(placed) {
            cell.layout.set(layout);
        }
    }

    let bounds = Rect::new(origin_x, start_y, table_width, flow.y() - start_y);
    flow.mark_character_position(extent, origin_x - flow.x() + table_width);
    debug!(
        "Table at y={:.1}: {} row(s), {} column(s), height {:.1}",
        start_y,
        table.rows.len(),
        table.columns.len(),
        bounds.height
    );
    table.layout.set(TableLayout {
        bounds,
        column_starts,
        row_heights,
    });
    Ok(())
}

/// Start offset of every column, relative to the table's left edge.
pub fn column_starts(columns: &[Column]) -> Vec<f64> {
    columns
        .iter()
        .scan(0.0, |start, column| {
            let this = *start;
            *start += column.width;
            Some(this)
        })
        .collect()
}

/// Offset and width of a cell covering `span` columns from `column`. Cells
/// outside the declared grid continue from the previous cell with their own
/// width.
fn cell_geometry(
    columns: &[Column],
    starts: &[f64],
    column: usize,
    span: usize,
    cursor_x: f64,
    own_width: f64,
) -> (f64, f64) {
    match (starts.get(column), columns.get(column..column + span)) {
        (Some(start), Some(covered)) => (*start, covered.iter().map(|c| c.width).sum()),
        _ => (cursor_x, own_width),
    }
}

fn table_origin(style: &TableStyle, flow: &VirtualFlow, table_width: f64) -> f64 {
    match style.justification {
        Justification::Center => flow.x() + (flow.width() - table_width) / 2.0,
        Justification::Right => flow.x() + flow.width() - table_width,
        Justification::Left | Justification::Both => flow.x() + style.indentation,
    }
}

fn check_spans(row: &Row, grid_columns: usize, row_idx: usize) {
    if grid_columns == 0 {
        return;
    }
    let total: usize = row.cells.iter().map(|c| c.span.max(1)).sum();
    if total != grid_columns {
        warn!("Row {row_idx} spans {total} column(s) but the table grid has {grid_columns}");
    }
}
