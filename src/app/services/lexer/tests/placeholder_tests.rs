//! Tests for placeholder detection

use super::*;
use crate::app::services::lexer::is_placeholder;

#[test]
fn test_placeholder_vocabulary() {
    for raw in [
        "Indicar",
        "PENDIENTE",
        "N/A",
        "s/d",
        "Sin datos",
        "Indicar coordenadas",
        "",
        "   ",
    ] {
        assert!(is_placeholder(raw), "'{raw}' should be a placeholder");
    }
}

#[test]
fn test_placeholder_runs_and_sentinels() {
    for raw in ["-", "---", "___", "xxx", "XXXXXX", "0", "0,0", "000000", "999999", "9999999"] {
        assert!(is_placeholder(raw), "'{raw}' should be a placeholder");
    }
}

#[test]
fn test_real_values_are_not_placeholders() {
    for raw in ["504750", "4077905", "-3.5", "Norte 4077905", "90", "99"] {
        assert!(!is_placeholder(raw), "'{raw}' should not be a placeholder");
    }
}

#[test]
fn test_clean_returns_none_for_placeholder() {
    let (cleaned, corrections) = clean_with_log("Pendiente", Field::Y);
    assert!(cleaned.is_none());
    assert!(corrections.is_empty());
}
