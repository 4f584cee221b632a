//! Field-level validation of request bodies.

use std::fmt::Display;

use serde::Serialize;

use crate::{Money, money::AmountInput};

/// A problem with a single field in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The name of the field as the client sent it, e.g. "targetAmount".
    pub field: &'static str,
    /// A message that can be shown next to the field.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

/// All the problems found in one request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// What was being validated, e.g. "chore", used in the summary message.
    pub subject: &'static str,
    /// The individual field errors.
    pub errors: Vec<FieldError>,
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid {} data", self.subject)
    }
}

/// Collects field errors while a request body is validated.
#[derive(Debug)]
pub(crate) struct Validator {
    subject: &'static str,
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn new(subject: &'static str) -> Self {
        Self {
            subject,
            errors: Vec::new(),
        }
    }

    /// Check that a required name is present and not blank, returning it trimmed.
    pub(crate) fn required_name(
        &mut self,
        field: &'static str,
        name: Option<&str>,
    ) -> Option<String> {
        match name {
            None => {
                self.errors.push(FieldError::new(field, "Name is required"));
                None
            }
            Some(name) => self.name(field, name),
        }
    }

    /// Check that a name is not blank, returning it trimmed.
    pub(crate) fn name(&mut self, field: &'static str, name: &str) -> Option<String> {
        let name = name.trim();

        if name.is_empty() {
            self.errors.push(FieldError::new(field, "Name cannot be empty"));
            None
        } else {
            Some(name.to_owned())
        }
    }

    /// Check that a required amount is present and positive.
    pub(crate) fn required_amount(
        &mut self,
        field: &'static str,
        amount: Option<&AmountInput>,
    ) -> Option<Money> {
        match amount {
            None => {
                self.errors.push(FieldError::new(field, "Amount is required"));
                None
            }
            Some(amount) => self.amount(field, amount),
        }
    }

    /// Check that an amount is positive.
    pub(crate) fn amount(&mut self, field: &'static str, amount: &AmountInput) -> Option<Money> {
        match amount.parse_positive() {
            Ok(amount) => Some(amount),
            Err(message) => {
                self.errors.push(FieldError::new(field, &message));
                None
            }
        }
    }

    /// Record an arbitrary field error.
    pub(crate) fn reject(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Whether no field error has been recorded so far.
    pub(crate) fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The field errors recorded so far.
    pub(crate) fn into_errors(self) -> ValidationErrors {
        ValidationErrors {
            subject: self.subject,
            errors: self.errors,
        }
    }

    /// Finish validation, failing if any field error was recorded.
    pub(crate) fn finish(self) -> Result<(), ValidationErrors> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.into_errors())
        }
    }
}

/// Normalise an optional description: blank descriptions are stored as `None`.
pub(crate) fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|description| description.trim().to_owned())
        .filter(|description| !description.is_empty())
}
