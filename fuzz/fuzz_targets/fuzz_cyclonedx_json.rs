#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_join::parsers::{CycloneDxDecoder, SbomDecoder};

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz the CycloneDX JSON decoder directly.
///
/// Input is also wrapped as the component list of a minimal document, so the
/// component conversion is reached rather than the envelope check.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let decoder = CycloneDxDecoder::new();
        let _ = decoder.decode(s, "fuzz.cdx.json");

        if s.len() < MAX_WRAPPED_INPUT_LEN {
            let wrapped = format!(
                r#"{{"bomFormat":"CycloneDX","specVersion":"1.5","components":[{s}],"dependencies":[{s}]}}"#,
            );
            let _ = decoder.decode(&wrapped, "fuzz.cdx.json");
        }
    }
});
