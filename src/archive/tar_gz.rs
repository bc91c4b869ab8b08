use crate::runtime::Runtime;
use crate::runtime::path::join_entry;
use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use log::debug;
use std::path::Path;
use tar::{Archive, EntryType};

use super::ArchiveExtractor;

/// Extractor for .tar.gz / .tgz archives
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<usize> {
        debug!("Extracting tar.gz archive {:?} to {:?}", archive_path, extract_to);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let mut written = 0;
        let entries = archive
            .entries()
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        for entry in entries {
            let mut entry = entry.context("Failed to read tar entry")?;
            let relative = entry.path().context("Invalid tar entry path")?.into_owned();

            let Some(full_path) = join_entry(extract_to, &relative) else {
                if relative.components().all(|c| c == std::path::Component::CurDir) {
                    continue;
                }
                bail!("Archive entry escapes destination: {}", relative.display());
            };

            match entry.header().entry_type() {
                EntryType::Directory => runtime.create_dir_all(&full_path)?,
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path)?;
                    std::io::copy(&mut entry, &mut dest_file)
                        .with_context(|| format!("Failed to extract file {:?}", full_path))?;
                    written += 1;
                }
                other => debug!("Skipping {:?} entry {:?}", other, relative),
            }
        }

        if written == 0 {
            bail!("Archive appears to be empty: {:?}", archive_path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs::{self, File};
    use tar::Builder;
    use tempfile::tempdir;

    fn create_test_archive(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        let file = File::create(path)?;
        let enc = GzEncoder::new(file, Compression::default());
        let mut tar = Builder::new(enc);

        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(EntryType::Regular);
            // set_path refuses "..", write the raw name instead
            let raw = &mut header.as_old_mut().name;
            raw[..name.len()].copy_from_slice(name.as_bytes());
            header.set_cksum();
            tar.append(&header, content.as_bytes())?;
        }

        tar.into_inner()?.finish()?;
        Ok(())
    }

    #[test]
    fn test_can_handle_tar_gz() {
        let extractor = TarGzExtractor;
        assert!(extractor.can_handle(Path::new("data.tar.gz")));
        assert!(extractor.can_handle(Path::new("data.TGZ")));
        assert!(!extractor.can_handle(Path::new("data.zip")));
    }

    #[test]
    fn test_extracts_in_place_and_overwrites() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("data.tar.gz");
        let root = dir.path().join("game");
        fs::create_dir_all(root.join("Modding/plugins"))?;
        fs::write(root.join("Modding/plugins/Rando.dll"), "old")?;

        create_test_archive(
            &archive_path,
            &[
                ("Modding/plugins/Rando.dll", "new"),
                ("Modding/localization/Rando.txt", "hello"),
            ],
        )?;

        let written = TarGzExtractor.extract(&RealRuntime, &archive_path, &root)?;

        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(root.join("Modding/plugins/Rando.dll"))?, "new");
        assert_eq!(
            fs::read_to_string(root.join("Modding/localization/Rando.txt"))?,
            "hello"
        );
        Ok(())
    }

    #[test]
    fn test_rejects_escaping_entry() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("data.tar.gz");
        let root = dir.path().join("game");
        fs::create_dir(&root)?;

        create_test_archive(&archive_path, &[("../evil.txt", "x")])?;

        let err = TarGzExtractor
            .extract(&RealRuntime, &archive_path, &root)
            .unwrap_err();
        assert!(err.to_string().contains("escapes destination"));
        assert!(!dir.path().join("evil.txt").exists());
        Ok(())
    }

    #[test]
    fn test_corrupted_archive_is_error() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("data.tar.gz");
        fs::write(&archive_path, "not gzip").unwrap();

        let result = TarGzExtractor.extract(&RealRuntime, &archive_path, dir.path());
        assert!(result.is_err());
    }
}
