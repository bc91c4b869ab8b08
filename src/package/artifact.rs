//! Version information embedded in plugin artifacts.
//!
//! Plugins are PE libraries carrying a `VS_FIXEDFILEINFO` block in their
//! resource section. The block starts with the signature `0xFEEF04BD`, followed
//! by the structure version and the file version as two 32-bit halves.

use log::debug;
use std::io::Read;
use std::path::Path;

use crate::runtime::Runtime;

const FIXED_FILE_INFO_SIGNATURE: [u8; 4] = 0xFEEF_04BDu32.to_le_bytes();

/// Find the file version of a `VS_FIXEDFILEINFO` block inside `bytes`.
pub fn fixed_file_version(bytes: &[u8]) -> Option<String> {
    let start = bytes
        .windows(FIXED_FILE_INFO_SIGNATURE.len())
        .position(|w| w == FIXED_FILE_INFO_SIGNATURE)?;
    let block = bytes.get(start..start + 16)?;

    let read_u32 = |offset: usize| -> Option<u32> {
        let raw: [u8; 4] = block.get(offset..offset + 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(raw))
    };
    let ms = read_u32(8)?;
    let ls = read_u32(12)?;

    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xffff,
        ls >> 16,
        ls & 0xffff
    ))
}

/// Read the file version of a PE artifact on disk.
///
/// Returns `None` for anything that is not a PE image or carries no version block.
pub fn read_artifact_version<R: Runtime>(runtime: &R, path: &Path) -> Option<String> {
    let mut buffer = Vec::new();
    let mut file = runtime.open(path).ok()?;
    if file.read_to_end(&mut buffer).is_err() {
        return None;
    }

    let pe = match goblin::Object::parse(&buffer) {
        Ok(goblin::Object::PE(pe)) => pe,
        _ => {
            debug!("{:?} is not a PE image", path);
            return None;
        }
    };

    let resources = pe
        .sections
        .iter()
        .find(|s| s.name().map(|n| n == ".rsrc").unwrap_or(false))
        .and_then(|s| {
            let start = s.pointer_to_raw_data as usize;
            let end = start.checked_add(s.size_of_raw_data as usize)?;
            buffer.get(start..end)
        })
        .unwrap_or(&buffer);

    fixed_file_version(resources)
}
