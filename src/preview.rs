//! Head-N preview of a loaded dataset as an elastic table.

use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, io_utils, loader, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = loader::load_dataset(
        &args.input,
        args.format.map(Into::into),
        args.delimiter,
        encoding,
    )?;

    let headers = dataset.column_names();
    let shown = args.rows.min(dataset.row_count());
    let mut rows = Vec::with_capacity(shown);
    for row_idx in 0..shown {
        let row = dataset
            .columns
            .iter()
            .map(|column| {
                column
                    .cells
                    .get(row_idx)
                    .and_then(|cell| cell.as_ref())
                    .map(|value| value.as_display())
                    .unwrap_or_default()
            })
            .collect();
        rows.push(row);
    }

    table::print_table(&headers, &rows);
    info!(
        "Displayed {shown} of {} row(s) from {:?}",
        dataset.row_count(),
        args.input
    );
    Ok(())
}
