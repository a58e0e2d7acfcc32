//! Search and sort normalization for Arabic-script dictionary text.

use unicode_normalization::UnicodeNormalization;

const TATWEEL: char = '\u{0640}';
const ALEF: char = '\u{0627}';
const ALEF_MADDA: char = '\u{0622}';
const ALEF_HAMZA_ABOVE: char = '\u{0623}';
const ALEF_HAMZA_BELOW: char = '\u{0625}';
const ALEF_WASLA: char = '\u{0671}';
const ALEF_MAQSURA: char = '\u{0649}';
const YEH: char = '\u{064a}';
const TEH_MARBUTA: char = '\u{0629}';
const HEH: char = '\u{0647}';

/// Harakat, Quranic annotation signs and the superscript alef.
fn is_arabic_mark(c: char) -> bool {
  matches!(c,
    '\u{0610}'..='\u{061a}'
    | '\u{064b}'..='\u{065f}'
    | '\u{0670}'
    | '\u{06d6}'..='\u{06ed}')
}

fn fold_letter(c: char) -> char {
  match c {
    ALEF_MADDA | ALEF_HAMZA_ABOVE | ALEF_HAMZA_BELOW | ALEF_WASLA => ALEF,
    ALEF_MAQSURA => YEH,
    TEH_MARBUTA => HEH,
    other => other,
  }
}

/// Strip diacritics and elongation and fold interchangeable letterforms.
///
/// Text is composed first so that hamza carried on waw, yeh or heh stays
/// part of its letter; only the alef forms in the fold table lose it. The
/// result is lowercased. Applying this twice is a no-op.
pub fn normalize(text: &str) -> String {
  text
    .nfc()
    .filter(|&c| c != TATWEEL && !is_arabic_mark(c))
    .map(fold_letter)
    .nfc()
    .flat_map(char::to_lowercase)
    .collect()
}

/// Plain case folding for fields that are not in the source script.
pub fn fold_case(text: &str) -> String {
  text.to_lowercase()
}
