//! Adaptive chunking for download/view (§4.8): small files go out whole;
//! larger ones get a fast first chunk, then progressively bigger chunks so
//! throughput scales with file size without regressing time-to-first-byte.

const ONE_MB: u64 = 1024 * 1024;
const HUNDRED_MB: u64 = 100 * ONE_MB;
const ONE_GB: u64 = 1024 * ONE_MB;

pub const SMALL_FILE_THRESHOLD: u64 = ONE_MB;
pub const INITIAL_CHUNK: usize = 16 * 1024;

/// Chunk size used once the initial fast chunk has gone out.
pub fn steady_state_chunk_size(file_size: u64) -> usize {
    if file_size < HUNDRED_MB {
        ONE_MB as usize
    } else if file_size < ONE_GB {
        4 * ONE_MB as usize
    } else {
        8 * ONE_MB as usize
    }
}

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Logs (never rejects) when the declared content-type disagrees with the
/// file's magic bytes (§4.8 "logs mismatches without rejecting").
pub fn check_signature(declared_content_type: &str, head: &[u8]) {
    let looks_like_png = head.starts_with(PNG_MAGIC);
    let looks_like_jpeg = head.starts_with(JPEG_MAGIC);
    let declares_png = declared_content_type == "image/png";
    let declares_jpeg = declared_content_type == "image/jpeg" || declared_content_type == "image/jpg";

    if declares_png && !looks_like_png {
        warn!("uploaded file declares image/png but magic bytes don't match");
    } else if declares_jpeg && !looks_like_jpeg {
        warn!("uploaded file declares image/jpeg but magic bytes don't match");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_steady_state_chunk_scales_with_size() {
        assert_eq!(steady_state_chunk_size(10 * ONE_MB), ONE_MB as usize);
        assert_eq!(steady_state_chunk_size(500 * ONE_MB), 4 * ONE_MB as usize);
        assert_eq!(steady_state_chunk_size(2 * ONE_GB), 8 * ONE_MB as usize);
    }

    #[test]
    fn test_png_magic_detected() {
        assert!(PNG_MAGIC.len() == 8);
    }
}
