use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use qlens_answerer::DEFAULT_MODEL;
use qlens_answerer::providers::openai::DEFAULT_BASE_URL;
use qlens_core::QaError;
use qlens_understanding::OcrSettings;

/// qlens runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// OpenAI API key; required to serve
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Created at startup. Uploads are never written here.
    pub upload_folder: PathBuf,
    pub ocr: OcrSettings,
    pub log_dir: PathBuf,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            upload_folder: PathBuf::from("./uploads"),
            ocr: OcrSettings::default(),
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// A `.env` file in the working directory or one of its parents supplies
    /// values the process environment does not set.
    pub fn from_env() -> Self {
        let file_vars = dotenvy::dotenv_iter()
            .map(collect_dotenv)
            .unwrap_or_default();
        Self::from_sources(file_vars, std::env::vars())
    }

    /// Like [`Config::from_env`], reading an explicit dotenv file instead.
    pub fn from_env_file(path: &Path) -> Self {
        Self::from_sources(read_dotenv(path), std::env::vars())
    }

    /// Layer process variables over dotenv-file variables.
    pub fn from_sources(
        file_vars: HashMap<String, String>,
        process_vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut vars = file_vars;
        vars.extend(process_vars);
        Self::from_vars(&vars)
    }

    /// Build configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let ocr = OcrSettings {
            languages: get("OCR_LANGUAGES")
                .map(|langs| {
                    langs
                        .split(',')
                        .map(|l| l.trim().to_lowercase())
                        .filter(|l| !l.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.ocr.languages),
            detection_model: get("OCR_DETECTION_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.ocr.detection_model),
            recognition_model: get("OCR_RECOGNITION_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.ocr.recognition_model),
        };

        Self {
            bind_address: get("QLENS_BIND").unwrap_or(defaults.bind_address),
            port: get("QLENS_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            upload_folder: get("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_folder),
            ocr,
            log_dir: get("QLENS_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// The OpenAI API key, or a configuration error when it is missing.
    pub fn require_api_key(&self) -> Result<&str, QaError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| QaError::Config("OpenAI API key is required".to_string()))
    }
}

/// Variables from a dotenv file. A missing file yields none.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    dotenvy::from_path_iter(path)
        .map(collect_dotenv)
        .unwrap_or_default()
}

/// Malformed lines are skipped.
fn collect_dotenv<R: Read>(iter: dotenvy::Iter<R>) -> HashMap<String, String> {
    iter.filter_map(Result::ok).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_env_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("qlens-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(&HashMap::new());
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.upload_folder, PathBuf::from("./uploads"));
        assert_eq!(config.ocr.languages, vec!["en".to_string()]);
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = Config::from_vars(&vars(&[("OPENAI_API_KEY", "  ")]));
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, QaError::Config(_)));
        assert!(err.to_string().contains("OpenAI API key is required"));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(&vars(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("QLENS_PORT", "8088"),
            ("UPLOAD_FOLDER", "/tmp/qlens-uploads"),
            ("OCR_LANGUAGES", "EN, fr"),
            ("OCR_RECOGNITION_MODEL", "/models/rec.rten"),
        ]));
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.port, 8088);
        assert_eq!(config.upload_folder, PathBuf::from("/tmp/qlens-uploads"));
        assert_eq!(config.ocr.languages, vec!["en".to_string(), "fr".to_string()]);
        assert_eq!(config.ocr.recognition_model, PathBuf::from("/models/rec.rten"));
        assert_eq!(config.ocr.detection_model, PathBuf::from("models/text-detection.rten"));
    }

    #[test]
    fn unparsable_port_falls_back_to_default() {
        let config = Config::from_vars(&vars(&[("QLENS_PORT", "not-a-port")]));
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn reads_dotenv_file() {
        let path = temp_env_file("OPENAI_API_KEY=sk-from-file\nUPLOAD_FOLDER=/srv/qlens/uploads\n");
        let vars = read_dotenv(&path);
        std::fs::remove_file(&path).unwrap();

        let config = Config::from_sources(vars, Vec::new());
        assert_eq!(config.require_api_key().unwrap(), "sk-from-file");
        assert_eq!(config.upload_folder, PathBuf::from("/srv/qlens/uploads"));
    }

    #[test]
    fn process_environment_overrides_dotenv() {
        let path = temp_env_file("OPENAI_API_KEY=sk-from-file\nQLENS_PORT=7000\n");
        let vars = read_dotenv(&path);
        std::fs::remove_file(&path).unwrap();

        let config = Config::from_sources(
            vars,
            vec![("OPENAI_API_KEY".to_string(), "sk-from-process".to_string())],
        );
        assert_eq!(config.require_api_key().unwrap(), "sk-from-process");
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn explicit_env_file_supplies_settings() {
        let path = temp_env_file("OCR_RECOGNITION_MODEL=/opt/models/recognition.rten\n");
        let config = Config::from_env_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.ocr.recognition_model,
            PathBuf::from("/opt/models/recognition.rten")
        );
    }

    #[test]
    fn missing_dotenv_file_is_empty() {
        let path = std::env::temp_dir().join("qlens-does-not-exist.env");
        assert!(read_dotenv(&path).is_empty());
    }
}
