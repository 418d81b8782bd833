//! Join-key normalization for free-text municipality names.
//!
//! The same function is applied to geometry attributes, service-table
//! names, and population-table names before any join, so it must stay
//! symmetric and idempotent.

/// Normalizes a municipality name into its join key.
///
/// Trims surrounding whitespace and uppercases (Unicode-aware, so
/// `"são paulo"` becomes `"SÃO PAULO"`). Accents and interior whitespace
/// are preserved: matching is case/whitespace-insensitive only.
#[must_use]
pub fn normalize_name(input: &str) -> String {
    input.trim().to_uppercase()
}
