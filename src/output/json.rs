//! JSON output reporter
//!
//! ```json
//! {"count": 1, "violations": ["a.xml: no-tabs: tab character on line 4"]}
//! ```

use std::io::Write;

use crate::engine::ValidationReport;
use crate::output::{JsonReporter, ReportError, Reporter};

impl Reporter for JsonReporter {
    fn emit(&self, report: &ValidationReport, out: &mut dyn Write) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut *out, report)
            .map_err(|e| ReportError::Serialization(e.to_string()))?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::Violation;

    #[test]
    fn test_json_shape() {
        let report = ValidationReport::new(vec![Violation::new(
            "a.xml",
            "no-tabs",
            None,
            "tab character on line 4",
        )]);
        let mut buf = Vec::new();
        JsonReporter::new().emit(&report, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(
            value["violations"][0],
            "a.xml: no-tabs: tab character on line 4"
        );
        // Key order follows the struct.
        let text = String::from_utf8(buf).unwrap();
        assert!(text.find("\"count\"").unwrap() < text.find("\"violations\"").unwrap());
    }

    #[test]
    fn test_empty_report() {
        let mut buf = Vec::new();
        JsonReporter::new()
            .emit(&ValidationReport::default(), &mut buf)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, serde_json::json!({"count": 0, "violations": []}));
    }
}
