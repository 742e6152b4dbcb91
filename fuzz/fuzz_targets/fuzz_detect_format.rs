#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_join::parsers::FormatDetector;

/// Fuzz format detection and candidate ordering without decoding.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let detector = FormatDetector::new();
        let _ = detector.detect_from_content(s);
        let _ = detector.candidates(None, s);
    }
});
