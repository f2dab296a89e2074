//! Best-effort repair of default-value literals.
//!
//! Header scanners tokenise literals and glue them back together with
//! spaces, so `1.0f` can come back as `1 0f` and `Color::Red` as
//! `Color: :Red`. Repair undoes the known damage; anything else passes
//! through untouched.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+) ([0-9]+)").expect("valid digit-pair regex"));

/// Repair a default literal. Never fails.
pub fn repair(literal: &str) -> String {
    let scoped = literal.trim().replace(": :", "::");
    DIGIT_PAIR.replace_all(&scoped, "$1.$2").into_owned()
}

/// Whether a default denotes the null handle.
pub fn is_null_literal(literal: &str) -> bool {
    matches!(literal.trim(), "NULL" | "nullptr" | "0")
}
