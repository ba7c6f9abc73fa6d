#![no_main]

use certaudit_lib::{ServedChain, TrustStore, ValidateOptions, Validator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing, linking and every check must never panic, regardless of input.
    let validator = Validator::new(
        TrustStore::new(),
        ValidateOptions {
            at_time: Some(1_767_225_600),
            ..ValidateOptions::default()
        },
    );

    if let Ok(served) = ServedChain::from_pem("fuzz", data) {
        let _ = validator.validate_served("example.com", &served);
    }

    // Treat the input as a sequence of length-prefixed DER certificates.
    let mut certificates = Vec::new();
    let mut rest = data;
    while let Some((&len, tail)) = rest.split_first() {
        let len = usize::from(len).min(tail.len());
        let (der, next) = tail.split_at(len);
        certificates.push(der.to_vec());
        rest = next;
    }
    let served = ServedChain {
        origin: "fuzz".into(),
        certificates,
        protocol: None,
        cipher_suite: None,
    };
    let validation = validator.validate_served("example.com", &served);
    if let Some(chain) = &validation.chain {
        let _ = certaudit_lib::find_root(chain);
        let _ = certaudit_lib::render_chain(chain);
    }
});
