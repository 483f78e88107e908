//! Stable content fingerprints for reference groups.
use sha2::{Digest as _, Sha256};

use crate::types::{Fingerprint, Reference};

/// Compute the fingerprint of a group.
///
/// Normalization: one `kind:url` line per reference, in document order,
/// each terminated by `\n`, then SHA-256. Offsets and surrounding markup
/// are ignored, so moving a group within the file keeps its fingerprint.
pub fn fingerprint(group: &[Reference]) -> Fingerprint {
    let mut hasher = Sha256::new();
    for reference in group {
        hasher.update(reference.kind.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(reference.url.as_bytes());
        hasher.update(b"\n");
    }
    let hash = hasher.finalize();
    return Fingerprint(format!("{hash:x}"));
}
