//! Store location resolution.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{RestClientError, RestClientResult};
use crate::registry::Registry;

const CLASSPATH_PREFIX: &str = "classpath:";
const FILE_PREFIX: &str = "file:";

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Bundled resource, looked up by relative path.
    Classpath(String),
    /// Filesystem path.
    File(PathBuf),
}

impl StoreLocation {
    /// `classpath:` selects a resource; `file:` or no prefix selects a file.
    pub fn parse(path: &str) -> Self {
        if let Some(resource) = path.strip_prefix(CLASSPATH_PREFIX) {
            StoreLocation::Classpath(resource.trim_start_matches('/').to_string())
        } else {
            let file = path.strip_prefix(FILE_PREFIX).unwrap_or(path);
            StoreLocation::File(PathBuf::from(file))
        }
    }

    /// Read the whole store.
    ///
    /// Resources are looked up in the registry first, then under each
    /// resource directory.
    pub fn read(&self, registry: &Registry, resource_dirs: &[PathBuf]) -> RestClientResult<Vec<u8>> {
        match self {
            StoreLocation::Classpath(resource) => {
                if let Some(bytes) = registry.resource(resource) {
                    tracing::debug!(resource = %resource, "Resource found in registry");
                    return Ok(bytes.to_vec());
                }

                for dir in resource_dirs {
                    let candidate = dir.join(resource);
                    if candidate.is_file() {
                        tracing::debug!(path = %candidate.display(), "Resource found on disk");
                        return read_file(&candidate)
                            .map_err(|_| RestClientError::ResourceNotFound(resource.clone()));
                    }
                }

                Err(RestClientError::ResourceNotFound(resource.clone()))
            }
            StoreLocation::File(path) => {
                let display = path.display().to_string();
                if !path.is_file() {
                    return Err(RestClientError::CertificateFileNotFound(display));
                }
                read_file(path).map_err(|_| RestClientError::CertificateFileNotFound(display))
            }
        }
    }
}

fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(
            StoreLocation::parse("classpath:/certs/ts.jks"),
            StoreLocation::Classpath("certs/ts.jks".into())
        );
        assert_eq!(
            StoreLocation::parse("file:/etc/ts.jks"),
            StoreLocation::File(PathBuf::from("/etc/ts.jks"))
        );
        assert_eq!(
            StoreLocation::parse("relative/ts.jks"),
            StoreLocation::File(PathBuf::from("relative/ts.jks"))
        );
    }

    #[test]
    fn test_missing_resource_names_path() {
        let err = StoreLocation::parse("classpath:missing.jks")
            .read(&Registry::new(), &[])
            .unwrap_err();
        assert!(err.to_string().contains("missing.jks"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = StoreLocation::parse("file:/no/such/store.jks")
            .read(&Registry::new(), &[])
            .unwrap_err();
        assert!(matches!(err, RestClientError::CertificateFileNotFound(_)));
        assert!(err.to_string().contains("/no/such/store.jks"));
    }

    #[test]
    fn test_resource_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("certs")).unwrap();
        let mut file = File::create(dir.path().join("certs/ts.pem")).unwrap();
        file.write_all(b"bytes").unwrap();

        let registry = Registry::new();
        let location = StoreLocation::parse("classpath:certs/ts.pem");
        assert_eq!(location.read(&registry, &[dir.path().to_path_buf()]).unwrap(), b"bytes");

        // Registry resources shadow the directories
        let registry = registry.with_resource("certs/ts.pem", b"embedded".to_vec());
        assert_eq!(location.read(&registry, &[dir.path().to_path_buf()]).unwrap(), b"embedded");
    }
}
