#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_join::parsers::{SbomDecoder, SpdxDecoder};

/// Fuzz the SPDX tag-value decoder, including multi-line `<text>` values.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let decoder = SpdxDecoder::new();
        let _ = decoder.decode(s, "fuzz.spdx");

        if s.len() < 10_000 {
            let wrapped = format!(
                "SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\nSPDXID: SPDXRef-DOCUMENT\n\nPackageName: fuzz\nSPDXID: SPDXRef-fuzz\n{s}",
            );
            let _ = decoder.decode(&wrapped, "fuzz.spdx");
        }
    }
});
