//! Contains the [ErrorStats] struct which stores the anomaly messages found in the stream
use crate::util::*;

/// Stores error messages observed during decoding
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    fatal_error: Option<Box<str>>,
    reported_errors: Vec<Box<str>>,
    total_errors: u64,
    unique_error_codes: Option<Vec<String>>,
}

impl ErrorStats {
    /// If decoding is done, sort error messages and extract the unique error codes
    pub(super) fn finalize_stats(&mut self, mute_errors: bool) {
        if !mute_errors {
            // Sort by the position they were found at before they are printed
            self.sort_error_msgs_by_mem_pos();
        }
        self.process_unique_error_codes();
    }

    pub(super) fn sort_error_msgs_by_mem_pos(&mut self) {
        let Ok(re) = Regex::new(r"^0x(?<mem_pos>[0-9A-F]+)") else {
            return;
        };
        // Stable sort, messages from the same word keep the order they were found in
        self.reported_errors.sort_by_key(|e| {
            re.captures(e)
                .and_then(|addr| u64::from_str_radix(&addr["mem_pos"], 16).ok())
                .unwrap_or(u64::MAX)
        });
    }

    pub(super) fn process_unique_error_codes(&mut self) {
        if !self.reported_errors.is_empty() {
            self.unique_error_codes = Some(extract_unique_error_codes(&self.reported_errors));
        }
    }

    pub(super) fn err_count(&self) -> u64 {
        self.total_errors
    }

    pub(super) fn add_err(&mut self, error_msg: Box<str>) {
        self.total_errors += 1;
        self.reported_errors.push(error_msg);
    }

    pub(super) fn add_fatal_err(&mut self, error_msg: Box<str>) {
        self.fatal_error = Some(error_msg);
    }

    pub(super) fn any_fatal_err(&self) -> bool {
        self.fatal_error.is_some()
    }

    pub(super) fn take_fatal_err(&mut self) -> Option<Box<str>> {
        self.fatal_error.take()
    }

    /// Unique error codes in order of first appearance, empty before finalizing or without errors.
    pub(super) fn unique_error_codes_as_slice(&self) -> &[String] {
        self.unique_error_codes.as_deref().unwrap_or_default()
    }

    /// Return an iterator over all error messages
    pub fn errors_as_slice_iter(&self) -> impl Iterator<Item = &Box<str>> {
        self.reported_errors.iter().chain(self.fatal_error.iter())
    }
}

fn extract_unique_error_codes(error_messages: &[Box<str>]) -> Vec<String> {
    let mut error_codes: Vec<String> = Vec::new();
    let Ok(re) = Regex::new(r"\[E(?P<err_code>[0-9]{2,4})\]") else {
        return error_codes;
    };
    for err_msg in error_messages {
        for cap in re.captures_iter(err_msg) {
            let code = &cap["err_code"];
            if !error_codes.iter().any(|c| c == code) {
                error_codes.push(code.to_string());
            }
        }
    }
    error_codes
}
