use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::PathBuf;

/// Writes outputs into a local directory. A write goes to a temporary
/// sibling first and is renamed into place, so an interrupted write never
/// leaves a truncated PDF behind.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    fn locate(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.locate(name);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut partial = full_path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::write(&partial, data) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&partial, &full_path) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("out"));

        let path = storage
            .write_file("Доленков_Игорь_резюме.pdf", b"%PDF-1.7")
            .await
            .unwrap();

        assert_eq!(path, temp_dir.path().join("out/Доленков_Игорь_резюме.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!temp_dir
            .path()
            .join("out/Доленков_Игорь_резюме.pdf.partial")
            .exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        // a non-empty directory cannot be replaced by a file
        fs::create_dir_all(temp_dir.path().join("resume.pdf/keep")).unwrap();

        let result = storage.write_file("resume.pdf", b"%PDF-1.7").await;

        assert!(result.is_err());
        assert!(!temp_dir.path().join("resume.pdf.partial").exists());
        assert!(temp_dir.path().join("resume.pdf/keep").is_dir());
    }

    #[tokio::test]
    async fn test_write_file_overwrites_previous_output() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file("resume.pdf", b"%PDF-old").await.unwrap();
        storage.write_file("resume.pdf", b"%PDF-new").await.unwrap();

        let data = fs::read(storage.locate("resume.pdf")).unwrap();
        assert_eq!(data, b"%PDF-new");
    }
}
