//! CSV report writer

use super::FileReport;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, reports: &[FileReport]) -> io::Result<()> {
    writeln!(writer, "input,output,scanned,rendered,unsupported,error")?;
    for r in reports {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            csv_escape(&r.input),
            csv_escape(r.output.as_deref().unwrap_or("")),
            r.summary.scanned,
            r.summary.rendered,
            r.summary.unsupported,
            csv_escape(r.error.as_deref().unwrap_or(""))
        )?;
    }
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
