//! Archive extraction (zip, tar, tar.gz, tar.bz2, tar.xz).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use thiserror::Error;

use super::{Extract, FetchError};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Unknown archive type: {0}")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Path traversal detected in archive: {0}")]
    PathTraversal(String),
}

/// Supported archive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

impl ArchiveType {
    /// Detect archive type from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let path_str = path.to_string_lossy().to_lowercase();

        if path_str.ends_with(".zip") || path_str.ends_with(".jar") {
            Some(ArchiveType::Zip)
        } else if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
            Some(ArchiveType::TarGz)
        } else if path_str.ends_with(".tar.bz2") || path_str.ends_with(".tbz2") {
            Some(ArchiveType::TarBz2)
        } else if path_str.ends_with(".tar.xz") || path_str.ends_with(".txz") {
            Some(ArchiveType::TarXz)
        } else if path_str.ends_with(".tar") {
            Some(ArchiveType::Tar)
        } else {
            None
        }
    }
}

/// Archive extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor {
    strip_components: usize,
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop this many leading path components from every entry
    pub fn with_strip_components(mut self, strip_components: usize) -> Self {
        self.strip_components = strip_components;
        self
    }

    /// Extract an archive to the specified directory
    pub fn extract_blocking(&self, archive_path: &Path, dest_dir: &Path) -> Result<(), ArchiveError> {
        let archive_type = ArchiveType::from_path(archive_path)
            .ok_or_else(|| ArchiveError::UnknownType(archive_path.display().to_string()))?;

        self.extract_with_type(archive_path, dest_dir, archive_type)
    }

    /// Extract an archive with explicit type
    pub fn extract_with_type(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
        archive_type: ArchiveType,
    ) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest_dir)?;

        let file = File::open(archive_path)?;
        let reader = BufReader::new(file);

        match archive_type {
            ArchiveType::Zip => self.extract_zip(reader, dest_dir),
            ArchiveType::Tar => self.extract_tar(reader, dest_dir),
            ArchiveType::TarGz => self.extract_tar(GzDecoder::new(reader), dest_dir),
            ArchiveType::TarBz2 => self.extract_tar(bzip2::read::BzDecoder::new(reader), dest_dir),
            ArchiveType::TarXz => self.extract_tar(xz2::read::XzDecoder::new(reader), dest_dir),
        }
    }

    fn extract_zip(&self, reader: BufReader<File>, dest_dir: &Path) -> Result<(), ArchiveError> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let dest_dir_canonical = dest_dir.canonicalize()?;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;

            let Some(outpath) = self.output_path(&dest_dir_canonical, Path::new(file.name()))? else {
                continue;
            };

            if file.is_dir() {
                std::fs::create_dir_all(&outpath)?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
        }

        Ok(())
    }

    fn extract_tar<R: Read>(&self, reader: R, dest_dir: &Path) -> Result<(), ArchiveError> {
        let mut archive = tar::Archive::new(reader);
        let dest_dir_canonical = dest_dir.canonicalize()?;

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.into_owned();

            let Some(outpath) = self.output_path(&dest_dir_canonical, &entry_path)? else {
                continue;
            };

            if entry.header().entry_type().is_dir() {
                std::fs::create_dir_all(&outpath)?;
            } else {
                if let Some(parent) = outpath.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                entry.unpack(&outpath)?;
            }
        }

        Ok(())
    }

    /// Map an entry path into `dest_dir`, or `None` when stripping leaves nothing.
    ///
    /// Rejects absolute paths and `..` components so nothing escapes `dest_dir`.
    fn output_path(&self, dest_dir: &Path, entry_path: &Path) -> Result<Option<PathBuf>, ArchiveError> {
        let mut relative = PathBuf::new();
        for component in entry_path.components().filter(|c| !matches!(c, Component::CurDir)) {
            match component {
                Component::Normal(part) => relative.push(part),
                _ => return Err(ArchiveError::PathTraversal(entry_path.display().to_string())),
            }
        }

        let stripped: PathBuf = relative.components().skip(self.strip_components).collect();
        if stripped.as_os_str().is_empty() {
            return Ok(None);
        }

        Ok(Some(dest_dir.join(stripped)))
    }
}

#[async_trait]
impl Extract for ArchiveExtractor {
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), FetchError> {
        let extractor = *self;
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();

        tokio::task::spawn_blocking(move || extractor.extract_blocking(&archive, &dest_dir))
            .await
            .map_err(|e| FetchError::new("unpacking", e.to_string()))?
            .map_err(|e| FetchError::new("unpacking", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_archive_type_from_path() {
        assert_eq!(ArchiveType::from_path(Path::new("package.zip")), Some(ArchiveType::Zip));
        assert_eq!(ArchiveType::from_path(Path::new("package.tar.gz")), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_path(Path::new("package.tgz")), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_path(Path::new("package.tar.bz2")), Some(ArchiveType::TarBz2));
        assert_eq!(ArchiveType::from_path(Path::new("package.tar.xz")), Some(ArchiveType::TarXz));
        assert_eq!(ArchiveType::from_path(Path::new("package.tar")), Some(ArchiveType::Tar));
        assert_eq!(ArchiveType::from_path(Path::new("package.txt")), None);
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo.tar.gz");
        write_tar_gz(&archive, &[("bin/tool", b"#!/bin/sh"), ("README", b"hello")]);

        let dest = dir.path().join("out");
        ArchiveExtractor::new().extract_blocking(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("README")).unwrap(), b"hello");
        assert_eq!(std::fs::read(dest.join("bin/tool")).unwrap(), b"#!/bin/sh");
    }

    #[test]
    fn test_extract_strip_components() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo.tar.gz");
        write_tar_gz(&archive, &[("foo-1.0/lib/a.txt", b"a")]);

        let dest = dir.path().join("out");
        ArchiveExtractor::new()
            .with_strip_components(1)
            .extract_blocking(&archive, &dest)
            .unwrap();

        assert_eq!(std::fs::read(dest.join("lib/a.txt")).unwrap(), b"a");
        assert!(!dest.join("foo-1.0").exists());
    }

    #[test]
    fn test_extract_zip() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo.zip");
        {
            let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("docs/index.html", options).unwrap();
            zip.write_all(b"<html/>").unwrap();
            zip.finish().unwrap();
        }

        let dest = dir.path().join("out");
        ArchiveExtractor::new().extract_blocking(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("docs/index.html")).unwrap(), b"<html/>");
    }

    #[test]
    fn test_output_path_rejects_traversal() {
        let extractor = ArchiveExtractor::new();
        let dest = Path::new("/tmp/out");

        assert!(matches!(
            extractor.output_path(dest, Path::new("../etc/passwd")),
            Err(ArchiveError::PathTraversal(_))
        ));
        assert!(matches!(
            extractor.output_path(dest, Path::new("/etc/passwd")),
            Err(ArchiveError::PathTraversal(_))
        ));
        assert_eq!(
            extractor.output_path(dest, Path::new("./lib/a.txt")).unwrap(),
            Some(PathBuf::from("/tmp/out/lib/a.txt"))
        );
    }

    #[test]
    fn test_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArchiveExtractor::new()
            .extract_blocking(&dir.path().join("foo.rpm"), &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownType(_)));
    }

    #[tokio::test]
    async fn test_extract_trait_reports_unpacking() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        std::fs::write(&archive, b"not gzip").unwrap();

        let err = Extract::extract(&ArchiveExtractor::new(), &archive, &dir.path().join("out"))
            .await
            .unwrap_err();
        assert_eq!(err.when, "unpacking");
    }
}
