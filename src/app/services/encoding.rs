//! Encoding corrector seam
//!
//! Mojibake repair is an upstream collaborator: the normalizer only needs a
//! string-to-string service. `BasicEncodingCorrector` covers the UTF-8 bytes
//! read as Latin-1 that show up in coordinate fields (degree and minute marks,
//! accented place names) so the pipeline works without an external service.

use tracing::debug;

/// Output of an encoding repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedText {
    pub corrected: String,
    pub was_modified: bool,
}

/// Opaque text repair service consumed by the normalizer
pub trait EncodingCorrector: Send + Sync {
    fn correct(&self, text: &str) -> CorrectedText;
}

/// Markers that reveal UTF-8 text decoded as Latin-1 / Windows-1252
pub const MOJIBAKE_MARKERS: &[&str] = &["Ã", "Â", "â€"];

/// Whether a string carries mojibake markers
pub fn has_mojibake(text: &str) -> bool {
    MOJIBAKE_MARKERS.iter().any(|marker| text.contains(marker))
}

// Longest sequences first so that "â€³" is not eaten by "â€"
const REPLACEMENTS: &[(&str, &str)] = &[
    ("â€²", "′"),
    ("â€³", "″"),
    ("â€™", "’"),
    ("â€˜", "‘"),
    ("â€œ", "“"),
    ("â€\u{9d}", "”"),
    ("Âº", "º"),
    ("Â°", "°"),
    ("Â´", "´"),
    ("Âª", "ª"),
    ("Â\u{a0}", " "),
    ("Ã±", "ñ"),
    ("Ã‘", "Ñ"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{AD}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã¼", "ü"),
    ("Ã\u{81}", "Á"),
    ("Ã‰", "É"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
];

/// Table-driven repair for the sequences common in coordinate fields
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEncodingCorrector;

impl EncodingCorrector for BasicEncodingCorrector {
    fn correct(&self, text: &str) -> CorrectedText {
        let mut corrected = text.to_string();
        for (broken, fixed) in REPLACEMENTS {
            if corrected.contains(broken) {
                corrected = corrected.replace(broken, fixed);
            }
        }

        let was_modified = corrected != text;
        if was_modified {
            debug!("Encoding repaired '{}' -> '{}'", text, corrected);
        }

        CorrectedText {
            corrected,
            was_modified,
        }
    }
}
