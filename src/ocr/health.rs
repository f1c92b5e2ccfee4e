use regex::Regex;
use std::process::Command;
use std::sync::OnceLock;
use sysinfo::System;

use crate::ocr::error::OcrError;

/// Tesseract accepts at most this many `+`-joined languages here.
pub const MAX_LANGUAGES: usize = 4;

fn language_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z_]{1,15}$").expect("valid regex"))
}

pub struct OcrHealthChecker {
    tesseract_cmd: String,
}

impl OcrHealthChecker {
    pub fn new<S: Into<String>>(tesseract_cmd: S) -> Self {
        Self {
            tesseract_cmd: tesseract_cmd.into(),
        }
    }

    pub fn check_tesseract_installation(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.tesseract_cmd)
            .arg("--version")
            .output()
            .map_err(|_| OcrError::TesseractNotInstalled)?;

        if !output.status.success() {
            return Err(OcrError::TesseractNotInstalled);
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };

        Ok(banner
            .lines()
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    pub fn get_available_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.tesseract_cmd)
            .arg("--list-langs")
            .output()
            .map_err(|_| OcrError::TesseractNotInstalled)?;

        if !output.status.success() {
            return Err(OcrError::TesseractNotInstalled);
        }

        Ok(parse_language_list(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Check that every language of a combination such as `nep+eng` is
    /// installed.
    pub fn check_language_data(&self, lang_combination: &str) -> Result<(), OcrError> {
        let languages = validate_language_combination(lang_combination)?;
        let available = self.get_available_languages()?;
        for lang in languages {
            if !available.iter().any(|a| a == lang) {
                return Err(OcrError::LanguageDataNotFound {
                    lang: lang.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn check_memory_available(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory() / (1024 * 1024)
    }

    pub fn estimate_memory_requirement(&self, image_width: u32, image_height: u32) -> u64 {
        // 4 bytes per pixel * 3 working buffers, plus ~100MB engine base
        let pixels = (image_width as u64) * (image_height as u64);
        let image_memory = (pixels * 4 * 3) / (1024 * 1024);
        image_memory + 100
    }

    pub fn validate_memory_for_image(&self, width: u32, height: u32) -> Result<(), OcrError> {
        let required = self.estimate_memory_requirement(width, height);
        let available = self.check_memory_available();

        if required > available {
            return Err(OcrError::InsufficientMemory { required, available });
        }

        Ok(())
    }
}

/// Syntax check for a Tesseract language string (`eng`, `nep+eng`,
/// `chi_sim`). Returns the individual codes.
pub fn validate_language_combination(lang_combination: &str) -> Result<Vec<&str>, OcrError> {
    let invalid = |reason: String| OcrError::InvalidLanguage {
        lang: lang_combination.to_string(),
        reason,
    };

    if lang_combination.trim().is_empty() {
        return Err(invalid("language is empty".to_string()));
    }

    let languages: Vec<&str> = lang_combination.split('+').map(str::trim).collect();
    if languages.len() > MAX_LANGUAGES {
        return Err(invalid(format!(
            "too many languages in combination: {}. Maximum is {}",
            languages.len(),
            MAX_LANGUAGES
        )));
    }

    for lang in &languages {
        if !language_code_pattern().is_match(lang) {
            return Err(invalid(format!("'{}' is not a language code", lang)));
        }
    }

    Ok(languages)
}

fn parse_language_list(output: &str) -> Vec<String> {
    let mut languages: Vec<String> = output
        .lines()
        .filter(|line| !line.starts_with("List of available languages"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    languages.sort();
    languages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_combinations() {
        assert_eq!(validate_language_combination("nep").unwrap(), vec!["nep"]);
        assert_eq!(validate_language_combination("nep+eng").unwrap(), vec!["nep", "eng"]);
        assert!(validate_language_combination("chi_sim").is_ok());
        assert!(validate_language_combination("").is_err());
        assert!(validate_language_combination("eng+").is_err());
        assert!(validate_language_combination("../../etc").is_err());
        assert!(validate_language_combination("eng+fra+deu+spa+ita").is_err());
    }

    #[test]
    fn test_parse_language_list_skips_banner() {
        let out = "List of available languages in \"/usr/share/tessdata/\" (3):\nosd\nnep\neng\n";
        assert_eq!(parse_language_list(out), vec!["eng", "nep", "osd"]);
    }

    #[test]
    fn test_memory_estimation_grows_with_image() {
        let checker = OcrHealthChecker::new("tesseract");
        let small = checker.estimate_memory_requirement(640, 480);
        let large = checker.estimate_memory_requirement(4096, 4096);
        assert!(small < large);
        assert!(small >= 100);
    }

    #[test]
    fn test_missing_binary_is_not_installed() {
        let checker = OcrHealthChecker::new("/nonexistent/tesseract-binary");
        assert!(matches!(
            checker.check_tesseract_installation(),
            Err(OcrError::TesseractNotInstalled)
        ));
    }
}
