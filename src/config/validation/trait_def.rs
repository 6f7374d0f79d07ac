//! Validation trait definition

/// Checked once at load time; the error names the offending field
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
