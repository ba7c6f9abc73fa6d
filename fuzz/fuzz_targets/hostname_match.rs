#![no_main]

use certaudit_lib::checks::matches;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (cert_name, hostname) = data;
    let matched = matches(cert_name, hostname);

    if cert_name.is_empty() {
        assert!(!matched, "empty name matched {:?}", hostname);
    } else if let Some(domain) = cert_name.strip_prefix("*.") {
        let expected = cert_name == hostname
            || hostname
                .split_once('.')
                .is_some_and(|(_, parent)| parent == domain);
        assert_eq!(matched, expected, "{:?} vs {:?}", cert_name, hostname);
    } else {
        assert_eq!(matched, cert_name == hostname, "{:?} vs {:?}", cert_name, hostname);
    }
});
