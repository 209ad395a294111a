//! Upload form as typed by the user, and its validation.

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Raw upload form fields. Kept as strings so a refused submission can be
/// shown back to the user exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadForm {
    pub name: String,
    pub data_value: String,
    pub confidence: String,
    pub description: String,
}

/// A validated upload, ready to encrypt and submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub name: String,
    pub value: u64,
    pub confidence: u32,
    pub description: String,
}

impl UploadForm {
    pub fn new(
        name: impl Into<String>,
        data_value: &str,
        confidence: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut form = Self {
            name: name.into(),
            data_value: String::new(),
            confidence: confidence.into(),
            description: description.into(),
        };
        form.set_data_value(data_value);
        form
    }

    /// Set the data value, keeping only ASCII digits.
    pub fn set_data_value(&mut self, raw: &str) {
        self.data_value = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<UploadRequest, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }

        let raw_value = self.data_value.trim();
        if raw_value.is_empty() {
            return Err(FormError::MissingValue);
        }
        let value = raw_value
            .parse::<u64>()
            .map_err(|_| FormError::InvalidValue)?;

        let raw_confidence = self.confidence.trim();
        if raw_confidence.is_empty() {
            return Err(FormError::MissingConfidence);
        }
        let confidence = raw_confidence
            .parse::<u32>()
            .map_err(|_| FormError::ConfidenceOutOfRange)?;
        if !(1..=10).contains(&confidence) {
            return Err(FormError::ConfidenceOutOfRange);
        }

        Ok(UploadRequest {
            name: name.to_string(),
            value,
            confidence,
            description: self.description.clone(),
        })
    }
}
