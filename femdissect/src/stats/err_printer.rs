//! Contains the [ErrPrinter] that prints error messages in accordance to a given configuration

use crate::util::*;

/// Prints error messages in accordance to a given configuration
#[derive(Debug, Default)]
pub struct ErrPrinter<'a> {
    max_errors: Option<u32>,
    error_code_filter: Option<&'a [u8]>,
}

impl<'a> ErrPrinter<'a> {
    /// Create a new [ErrPrinter] with the given configuration
    pub fn new(max_errors: Option<u32>, error_code_filter: Option<&'a [u8]>) -> Self {
        Self {
            max_errors,
            error_code_filter,
        }
    }

    /// Print the error messages in accordance to the configuration
    ///
    /// If an error code filter is supplied, only errors whose code is exactly one of the filter codes are displayed
    /// If the max errors is set, only the first `max_errors` are displayed
    ///
    /// The unique error codes are used to minify the error code filter to avoid doing unnecessary comparisons
    pub fn print<E: Iterator<Item = &'a Box<str>>>(&self, err_msgs: E, unique_error_codes: &[String]) {
        for err_msg in self.select(err_msgs, unique_error_codes) {
            crate::display_error(err_msg);
        }
    }

    /// The messages [print](Self::print) would display, in order.
    pub fn select<E: Iterator<Item = &'a Box<str>>>(
        &self,
        err_msgs: E,
        unique_error_codes: &[String],
    ) -> Vec<&'a Box<str>> {
        let max = self.max_errors.unwrap_or(u32::MAX) as usize;
        match self.error_code_filter {
            Some(filter) => {
                let filter = minify_filter(filter, unique_error_codes);
                if filter.is_empty() {
                    return Vec::new();
                }
                filter_error_msgs(&filter, err_msgs).take(max).collect()
            }
            None => err_msgs.take(max).collect(),
        }
    }
}

// Reduce the error code filter to codes that were actually seen in the error messages
fn minify_filter(error_code_filter: &[u8], unique_error_codes: &[String]) -> Vec<u8> {
    error_code_filter
        .iter()
        .copied()
        .filter(|ec| {
            unique_error_codes
                .iter()
                .any(|seen| seen.parse::<u8>().is_ok_and(|seen| seen == *ec))
        })
        .collect()
}

fn filter_error_msgs<'a, 'b, E: Iterator<Item = &'a Box<str>> + 'b>(
    ec_filter: &'b [u8],
    err_msgs: E,
) -> impl Iterator<Item = &'a Box<str>> + 'b {
    let re = Regex::new(r"\[E(?P<err_code>[0-9]{2,4})\]").ok();
    err_msgs.filter(move |err_msg| {
        re.as_ref()
            .and_then(|re| re.captures(err_msg))
            .and_then(|cap| cap["err_code"].parse::<u8>().ok())
            .is_some_and(|code| ec_filter.contains(&code))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msgs() -> Vec<Box<str>> {
        vec![
            "0x0: [E10] Illegal transition".into(),
            "0x4: [E30] Channel trailer 7 does not match open channel 5".into(),
            "0x8: [E10] Illegal transition".into(),
            "0xC: [E31] Channel 2 not terminated".into(),
            "0x10: [E51] Checksum".into(),
        ]
    }

    #[test]
    fn test_minify_filter() {
        let unique_error_codes: Vec<String> = vec!["10".into(), "31".into(), "51".into()];
        assert_eq!(minify_filter(&[10, 20, 31], &unique_error_codes), vec![10, 31]);
    }

    #[test]
    fn test_filter_is_exact_not_prefix() {
        let err_msgs = msgs();
        let filtered: Vec<&Box<str>> = filter_error_msgs(&[3, 30], err_msgs.iter()).collect();
        assert_eq!(filtered, vec![&err_msgs[1]]);
    }

    #[test]
    fn test_select_with_filter_and_max() {
        let err_msgs = msgs();
        let unique: Vec<String> = vec!["10".into(), "30".into(), "31".into(), "51".into()];
        let printer = ErrPrinter::new(Some(2), Some(&[10, 31]));
        let selected = printer.select(err_msgs.iter(), &unique);
        assert_eq!(selected, vec![&err_msgs[0], &err_msgs[2]]);
    }

    #[test]
    fn test_select_filter_not_seen_prints_nothing() {
        let err_msgs = msgs();
        let unique: Vec<String> = vec!["10".into(), "30".into()];
        let printer = ErrPrinter::new(None, Some(&[70]));
        assert!(printer.select(err_msgs.iter(), &unique).is_empty());
    }

    #[test]
    fn test_select_without_filter() {
        let err_msgs = msgs();
        let printer = ErrPrinter::new(Some(3), None);
        assert_eq!(printer.select(err_msgs.iter(), &[]).len(), 3);
        let printer = ErrPrinter::default();
        assert_eq!(printer.select(err_msgs.iter(), &[]).len(), 5);
    }
}
