//! `folio validate`: checks one field value with the form's rules.

use clap::Args;
use folio_core::validation::{FieldKind, Validator};

use super::CliContext;

/// Exit codes for `folio validate`.
pub mod exit_codes {
    /// The value is valid.
    pub const VALID: u8 = 0;
    /// The value is invalid.
    pub const INVALID: u8 = 2;
}

/// Arguments for `folio validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Field name (name, email, subject, message)
    pub field: String,

    /// Value to check
    pub value: String,
}

/// Validates the value and prints the verdict.
pub fn run(ctx: &CliContext, args: &ValidateArgs) -> u8 {
    let validator = Validator::new(ctx.config.validation.clone());
    let result = validator.validate_field(&args.field, &args.value);

    if FieldKind::from_field_name(&args.field) == FieldKind::Message {
        let reading = validator.meter().read(&args.value);
        println!("{} ({:?})", reading.label, reading.level);
    }

    if result.valid {
        println!("valid");
        exit_codes::VALID
    } else {
        println!(
            "invalid: {}",
            result.message.as_deref().unwrap_or("value rejected")
        );
        exit_codes::INVALID
    }
}
