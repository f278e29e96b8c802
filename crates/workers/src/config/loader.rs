use std::path::Path;

use super::schema::WorkerConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_from_file(path: &Path) -> Result<WorkerConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<WorkerConfig, LoadError> {
    let cfg: WorkerConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &WorkerConfig) -> Result<(), LoadError> {
    if cfg.persistence_enabled() && !Path::new(&cfg.storage_dir).is_absolute() {
        return Err(LoadError::Validation(
            "storage_dir must be an absolute path".into(),
        ));
    }
    if cfg.flush.interval_seconds == 0 {
        return Err(LoadError::Validation(
            "flush.interval_seconds must be > 0".into(),
        ));
    }
    if cfg.ingest.channel_capacity == 0 {
        return Err(LoadError::Validation(
            "ingest.channel_capacity must be > 0".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config() {
        let yaml = r#"
storage_dir: /tmp/beacon
flush:
  interval_seconds: 10
"#;
        let cfg = load_from_str(yaml).unwrap();
        assert_eq!(cfg.storage_dir, "/tmp/beacon");
    }

    #[test]
    fn empty_storage_dir_is_allowed() {
        let cfg = load_from_str("storage_dir: \"\"").unwrap();
        assert!(!cfg.persistence_enabled());
    }

    #[test]
    fn relative_storage_dir_rejected() {
        let err = load_from_str("storage_dir: data/reporting").unwrap_err();
        assert!(matches!(err, LoadError::Validation(_)));
    }

    #[test]
    fn zero_interval_rejected() {
        let yaml = r#"
flush:
  interval_seconds: 0
"#;
        assert!(matches!(load_from_str(yaml), Err(LoadError::Validation(_))));
    }

    #[test]
    fn zero_capacity_rejected() {
        let yaml = r#"
ingest:
  channel_capacity: 0
"#;
        assert!(matches!(load_from_str(yaml), Err(LoadError::Validation(_))));
    }

    #[test]
    fn invalid_yaml() {
        assert!(matches!(load_from_str("flush: ["), Err(LoadError::Parse(_))));
    }

    #[test]
    fn load_from_file_works() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.yaml");
        std::fs::write(&path, "storage_dir: /srv/beacon\n").unwrap();
        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.storage_dir, "/srv/beacon");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_from_file(Path::new("/nonexistent/worker.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
