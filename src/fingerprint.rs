use md5::{Digest, Md5};

/// Placeholder serialized in place of an absent field.
///
/// Matches the wire history of the state file: legacy versions stringified
/// missing fields as the literal text `undefined`, and every fingerprint on
/// disk was computed that way. Changing this invalidates all persisted state.
const ABSENT: &str = "undefined";

/// Computes the content fingerprint for an ordered list of optional fields.
///
/// Fields are joined with `|` (absent fields become the literal `undefined`),
/// hashed with MD5, and returned as 32 lowercase hex characters. The digest is
/// a change-detection token, not a security boundary, so MD5's 128 bits are
/// sufficient.
///
/// Deterministic and total: equal field sequences always produce equal
/// fingerprints, and `None` hashes differently from `Some("")`.
pub fn fingerprint(fields: &[Option<&str>]) -> String {
    let joined = fields
        .iter()
        .map(|f| f.unwrap_or(ABSENT))
        .collect::<Vec<_>>()
        .join("|");
    let hash = Md5::digest(joined.as_bytes());
    format!("{:x}", hash)
}
