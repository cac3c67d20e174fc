use serde::Serialize;

use crate::error::ValidationError;

/// One entry of the OCR.Space language catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

const fn lang(code: &'static str, name: &'static str) -> Language {
    Language { code, name }
}

pub const LANGUAGES: &[Language] = &[
    lang("eng", "English"),
    lang("fra", "French"),
    lang("spa", "Spanish"),
    lang("deu", "German"),
    lang("ita", "Italian"),
    lang("por", "Portuguese"),
    lang("nld", "Dutch"),
    lang("rus", "Russian"),
    lang("chs", "Chinese (Simplified)"),
    lang("jpn", "Japanese"),
    lang("kor", "Korean"),
    lang("ara", "Arabic"),
    lang("tur", "Turkish"),
    lang("pol", "Polish"),
    lang("ron", "Romanian"),
    lang("ukr", "Ukrainian"),
    lang("vie", "Vietnamese"),
    lang("ces", "Czech"),
    lang("ell", "Greek"),
    lang("bul", "Bulgarian"),
    lang("hrv", "Croatian"),
    lang("hun", "Hungarian"),
    lang("slk", "Slovak"),
    lang("slv", "Slovenian"),
    lang("swe", "Swedish"),
    lang("fin", "Finnish"),
    lang("dan", "Danish"),
    lang("nor", "Norwegian"),
    lang("heb", "Hebrew"),
    lang("hin", "Hindi"),
    lang("msa", "Malay"),
    lang("tha", "Thai"),
    lang("ind", "Indonesian"),
    lang("fil", "Filipino"),
    lang("srp", "Serbian (Latin)"),
    lang("srp-cyr", "Serbian (Cyrillic)"),
    lang("sqi", "Albanian"),
    lang("est", "Estonian"),
    lang("lav", "Latvian"),
    lang("lit", "Lithuanian"),
    lang("mkd", "Macedonian"),
    lang("kat", "Georgian"),
    lang("hye", "Armenian"),
    lang("aze", "Azerbaijani"),
    lang("kaz", "Kazakh"),
    lang("uzb", "Uzbek"),
    lang("mon", "Mongolian"),
    lang("fas", "Persian"),
    lang("pus", "Pashto"),
    lang("urd", "Urdu"),
    lang("ben", "Bengali"),
    lang("tam", "Tamil"),
    lang("tel", "Telugu"),
    lang("kan", "Kannada"),
    lang("mal", "Malayalam"),
    lang("mar", "Marathi"),
    lang("guj", "Gujarati"),
    lang("pan", "Punjabi"),
    lang("sin", "Sinhala"),
    lang("nep", "Nepali"),
    lang("mya", "Burmese"),
    lang("khm", "Khmer"),
    lang("lao", "Lao"),
    lang("bod", "Tibetan"),
];

/// Look a language up by its OCR.Space code (case-insensitive).
pub fn find_language(code: &str) -> Result<&'static Language, ValidationError> {
    let wanted = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|l| l.code == wanted)
        .ok_or_else(|| ValidationError::UnsupportedLanguage(code.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_has_more_than_fifty_unique_codes() {
        assert!(LANGUAGES.len() > 50);
        let codes: HashSet<_> = LANGUAGES.iter().map(|l| l.code).collect();
        assert_eq!(codes.len(), LANGUAGES.len());
    }

    #[test]
    fn test_find_language_is_case_insensitive() {
        assert_eq!(find_language("ENG").unwrap().name, "English");
        assert_eq!(find_language(" srp-cyr ").unwrap().name, "Serbian (Cyrillic)");
    }

    #[test]
    fn test_unknown_language_rejected() {
        let err = find_language("klingon").unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedLanguage("klingon".to_string()));
    }
}
