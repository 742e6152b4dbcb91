#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_join::{decode_str, resolve};

/// Fuzz the whole document path: detection, every decoder, then resolution.
///
/// Resolution must terminate on any decoded record set, including cyclic and
/// self-referencing ones.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok((_, decoded)) = decode_str(s, "fuzz") {
            let resolution = resolve(&decoded.records);
            let _ = resolution.graph.walk_from(&resolution.roots);
            let _ = resolution.graph.has_cycle();
        }
    }
});
