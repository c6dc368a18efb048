//! JSON output for CLI reports
//!
//! - One JSON object per line on stdout
//! - `{"status":"ok","data":...}` on success

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    write_response_to(&mut stdout, data)
}

pub(crate) fn write_response_to<W: Write, T: Serialize>(writer: &mut W, data: &T) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data,
    });

    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
