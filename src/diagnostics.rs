// ABOUTME: Diagnostics accumulator for non-fatal warnings during a status check.
// ABOUTME: Collects warnings that shouldn't fail a check but should be shown to users.

/// Collects non-fatal warnings during a check.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn report_write(failed: usize) -> Self {
        Self {
            kind: WarningKind::ReportWrite,
            message: format!("{failed} status line(s) could not be written"),
        }
    }

    pub fn duplicate_resources(skipped: usize) -> Self {
        Self {
            kind: WarningKind::DuplicateResource,
            message: format!("{skipped} duplicate resource(s) checked only once"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The report sink rejected a write.
    ReportWrite,
    /// The same resource was requested more than once.
    DuplicateResource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::report_write(2));
        diag.warn(Warning::duplicate_resources(1));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.warnings()[0].message, "2 status line(s) could not be written");
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::report_write(1).kind, WarningKind::ReportWrite);
        assert_eq!(
            Warning::duplicate_resources(1).kind,
            WarningKind::DuplicateResource
        );
    }
}
