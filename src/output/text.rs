//! Human-readable text output reporter
//!
//! ```text
//! 001_users.xml: no-tabs: tab character on line 4
//! 002_orders.xml: attr-ends-with: changeSet '7::dave': attribute constraintName='fk_o' of <addForeignKeyConstraint> must end with '_fk'
//! changelog-lint: 2 violation(s)
//! ```

use std::io::Write;

use crate::engine::ValidationReport;
use crate::output::{ReportError, Reporter, TextReporter};

/// Format the whole report as text.
fn format_all(report: &ValidationReport) -> String {
    let mut output = String::new();
    for violation in report.violations() {
        output.push_str(violation.as_str());
        output.push('\n');
    }
    output.push_str(&format!("changelog-lint: {} violation(s)\n", report.count()));
    output
}

impl Reporter for TextReporter {
    fn emit(&self, report: &ValidationReport, out: &mut dyn Write) -> Result<(), ReportError> {
        out.write_all(format_all(report).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
