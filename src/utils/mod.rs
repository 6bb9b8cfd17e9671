//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, CPF handling, and helper functions.

pub mod cpf;
pub mod errors;
pub mod helpers;
pub mod logging;

pub use cpf::{format_cpf, validate_cpf};
pub use errors::{AscesaError, Result};
pub use helpers::format_phone;
