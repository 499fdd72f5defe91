//! Validation framework for submitted forms.
//!
//! Field checks come from `validator` derives on the form types; the helpers
//! in [`rules`] cover the conversions the derives cannot express.

pub mod rules;

pub use validator::Validate;
use validator::ValidationErrors;

/// Flattens `validator` errors into sorted `field: code` messages.
pub fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(move |e| format!("{}: {}", field, e.code.as_ref()))
        })
        .collect();
    messages.sort();
    messages
}
