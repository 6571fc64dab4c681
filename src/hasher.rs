use std::io::Read;
use std::path::Path;

/// Read block size for content hashing.
const BLOCK_SIZE: usize = 65536;

/// Compute the blake3 hash of an entire file, one block at a time.
pub fn hash_file(path: &Path) -> std::io::Result<blake3::Hash> {
    let file = std::fs::File::open(path)?;
    hash_reader(file)
}

pub fn hash_reader(mut reader: impl Read) -> std::io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; BLOCK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn identical_content_in_different_files_hashes_equal() {
        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(dir.path().join("a.bin"), &content).unwrap();
        fs::write(dir.path().join("b.bin"), &content).unwrap();

        let a = hash_file(&dir.path().join("a.bin")).unwrap();
        let b = hash_file(&dir.path().join("b.bin")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, blake3::hash(&content));
    }

    #[test]
    fn one_byte_change_changes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let mut content = vec![7u8; BLOCK_SIZE * 3 + 17];
        fs::write(dir.path().join("a"), &content).unwrap();
        content[BLOCK_SIZE * 2 + 5] ^= 1;
        fs::write(dir.path().join("b"), &content).unwrap();

        assert_ne!(
            hash_file(&dir.path().join("a")).unwrap(),
            hash_file(&dir.path().join("b")).unwrap()
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("missing")).is_err());
    }
}
