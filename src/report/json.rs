//! JSON report writer

use super::{FileReport, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    summary: Summary,
    files: &'a [FileReport],
}

pub fn write<W: Write>(writer: &mut W, reports: &[FileReport]) -> io::Result<()> {
    let report = JsonReport {
        generated: chrono::Local::now().to_rfc3339(),
        summary: Summary::from_reports(reports),
        files: reports,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::create_test_report;

    #[test]
    fn test_json_shape() {
        let mut buf = Vec::new();
        write(&mut buf, &[create_test_report(2, None)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["summary"]["files"], 1);
        assert_eq!(value["summary"]["sparklines"], 2);
        assert_eq!(value["files"][0]["summary"]["rendered"], 2);
        assert!(value["files"][0].get("error").is_none());
        assert!(value["generated"].is_string());
    }
}
