// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ColumnSpec;
use anyhow::{Context, Result};
use csv::Writer;

/// RFC 4180 CSV: one header row of column headers, then one record per row
/// holding each column's display value.
pub fn export_csv<'a, R: 'a>(
    columns: &[&ColumnSpec<R>],
    rows: impl IntoIterator<Item = &'a R>,
) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|column| column.header()))
        .context("write CSV header")?;

    for row in rows {
        writer
            .write_record(columns.iter().map(|column| column.display(row)))
            .context("write CSV row")?;
    }

    writer.flush().context("flush CSV output")?;
    writer
        .into_inner()
        .map_err(|error| anyhow::anyhow!("finish CSV output: {}", error.error()))
}
