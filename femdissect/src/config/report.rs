//! Contains the [ReportOpt] trait, the options that decide how anomalies found while decoding are reported.

/// How anomalies are reported to the user and reflected in the exit code.
pub trait ReportOpt {
    /// Logger level: 0 = error, 1 = warn, 2 = info, 3 = debug, 4 = trace.
    fn verbosity(&self) -> u8;
    /// Stop decoding after this many anomalies, 0 means never.
    ///
    /// Also caps the number of error messages printed at the end of a run.
    fn max_tolerate_errors(&self) -> u32;
    /// Exit code of a run that completed but found anomalies. Never 0.
    fn any_errors_exit_code(&self) -> Option<u8>;
    /// Print the report without the error messages.
    fn mute_errors(&self) -> bool;
    /// Numeric codes of the anomalies to print (`30` for `[E30]`). Empty prints every anomaly.
    fn shown_error_codes(&self) -> &[u8];

    /// The codes to print, `None` if every anomaly is printed.
    ///
    /// Codes match exactly, `30` selects `[E30]` and not `[E31]`.
    fn error_code_filter(&self) -> Option<&[u8]> {
        let codes = self.shown_error_codes();
        (!codes.is_empty()).then_some(codes)
    }
}
