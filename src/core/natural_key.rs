//! Sort keys that order embedded numbers by magnitude.
//!
//! Every maximal run of ASCII digits is rewritten as one marker per digit,
//! a separator that sorts below the marker, and then the digits themselves.
//! A longer run therefore always sorts after a shorter one, and runs of equal
//! width fall back to comparing their digits. Leading zeros count towards the
//! run width, so `"007"` sorts after `"12"`.

const RUN_MARKER: char = '1';
const RUN_SEPARATOR: char = '0';

/// Builds the natural sort key for `name`. Plain string comparison of two
/// keys yields the natural ordering of the inputs.
pub fn natural_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 8);
    let mut rest = name;

    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        key.push_str(&rest[..start]);
        let run = &rest[start..];
        let len = run
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(run.len());

        key.extend(std::iter::repeat(RUN_MARKER).take(len));
        key.push(RUN_SEPARATOR);
        key.push_str(&run[..len]);

        rest = &run[len..];
    }

    key.push_str(rest);
    key
}
