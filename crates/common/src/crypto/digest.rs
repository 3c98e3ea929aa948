use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of `data`
pub fn md5_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Md5::digest(data.as_ref()))
}

/// Lowercase hex MD5 digest over the concatenation of `parts`
///
/// Equivalent to hashing the joined bytes, without building the joined buffer.
pub fn md5_hex_concat<I, P>(parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hex::encode(hasher.finalize())
}
