//! Recorder settings read from the environment.
//!
//! | Variable               | Default  |
//! |------------------------|----------|
//! | `CAMSTREAM_URL`        | required |
//! | `CAMSTREAM_OUTPUT_DIR` | `frames` |
//! | `CAMSTREAM_MAX_FRAMES` | unlimited |
//! | `CAMSTREAM_TIMEOUT_MS` | `5000`   |
//! | `CAMSTREAM_CHUNK_SIZE` | `4096`   |
//!
//! A `.env` file in the working directory is loaded by `main` before these
//! are read.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use camstream_core::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_IO_TIMEOUT_MS};
use camstream_core::{Error, Result};
use camstream_network::{CameraClientConfig, CameraUrl};

const URL_VAR: &str = "CAMSTREAM_URL";
const OUTPUT_DIR_VAR: &str = "CAMSTREAM_OUTPUT_DIR";
const MAX_FRAMES_VAR: &str = "CAMSTREAM_MAX_FRAMES";
const TIMEOUT_VAR: &str = "CAMSTREAM_TIMEOUT_MS";
const CHUNK_SIZE_VAR: &str = "CAMSTREAM_CHUNK_SIZE";

const DEFAULT_OUTPUT_DIR: &str = "frames";

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub url: CameraUrl,
    pub output_dir: PathBuf,
    pub max_frames: Option<u64>,
    pub timeout: Duration,
    pub chunk_size: usize,
}

impl RecorderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = get(URL_VAR)
            .ok_or_else(|| Error::MissingConfig(URL_VAR.to_owned()))
            .and_then(|value| CameraUrl::parse(&value))?;

        let output_dir = get(OUTPUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let max_frames = get(MAX_FRAMES_VAR)
            .map(|value| parse_positive::<u64>(MAX_FRAMES_VAR, &value))
            .transpose()?;

        let timeout_ms = get(TIMEOUT_VAR)
            .map(|value| parse_positive::<u64>(TIMEOUT_VAR, &value))
            .transpose()?
            .unwrap_or(DEFAULT_IO_TIMEOUT_MS);

        let chunk_size = get(CHUNK_SIZE_VAR)
            .map(|value| parse_positive::<usize>(CHUNK_SIZE_VAR, &value))
            .transpose()?
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        Ok(Self {
            url,
            output_dir,
            max_frames,
            timeout: Duration::from_millis(timeout_ms),
            chunk_size,
        })
    }

    pub fn client_config(&self) -> CameraClientConfig {
        CameraClientConfig {
            timeout: self.timeout,
            chunk_size: self.chunk_size,
            ..CameraClientConfig::new(self.url.clone())
        }
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|parsed| *parsed > T::default())
        .ok_or_else(|| Error::Config(format!("{key} must be a positive integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use rstest::rstest;

    use super::*;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("failed to lock env mutex")
    }

    fn set_env(key: &str, value: &str) {
        unsafe { env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { env::remove_var(key) }
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<RecorderConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RecorderConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = from_pairs(&[(URL_VAR, "http://cam.local/video")]).unwrap();

        assert_eq!(config.url.host(), "cam.local");
        assert_eq!(config.output_dir, PathBuf::from("frames"));
        assert_eq!(config.max_frames, None);
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.chunk_size, 4096);
    }

    #[test]
    fn all_variables_are_read() {
        let config = from_pairs(&[
            (URL_VAR, "http://10.0.0.9:8081/mjpg"),
            (OUTPUT_DIR_VAR, "/tmp/shots"),
            (MAX_FRAMES_VAR, "25"),
            (TIMEOUT_VAR, "750"),
            (CHUNK_SIZE_VAR, "1460"),
        ])
        .unwrap();

        assert_eq!(config.url.port(), 8081);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(config.max_frames, Some(25));
        assert_eq!(config.timeout, Duration::from_millis(750));
        assert_eq!(config.chunk_size, 1460);

        let client = config.client_config();
        assert_eq!(client.timeout, Duration::from_millis(750));
        assert_eq!(client.chunk_size, 1460);
        assert_eq!(client.url, config.url);
    }

    #[rstest]
    #[case(&[])]
    #[case(&[(URL_VAR, "   ")])]
    fn missing_url_is_reported(#[case] pairs: &[(&str, &str)]) {
        assert!(matches!(
            from_pairs(pairs),
            Err(Error::MissingConfig(key)) if key == URL_VAR
        ));
    }

    #[test]
    fn invalid_url_is_reported() {
        assert!(matches!(
            from_pairs(&[(URL_VAR, "rtsp://cam.local/")]),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[rstest]
    #[case(MAX_FRAMES_VAR, "0")]
    #[case(MAX_FRAMES_VAR, "-1")]
    #[case(TIMEOUT_VAR, "soon")]
    #[case(CHUNK_SIZE_VAR, "0")]
    #[case(CHUNK_SIZE_VAR, "4k")]
    fn bad_numbers_are_rejected(#[case] key: &str, #[case] value: &str) {
        let result = from_pairs(&[(URL_VAR, "http://cam.local/"), (key, value)]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn from_env_reads_process_environment() {
        let _guard = lock_env();
        set_env(URL_VAR, "http://env-cam.local:8000/stream");
        set_env(MAX_FRAMES_VAR, "3");
        remove_env(OUTPUT_DIR_VAR);

        let config = RecorderConfig::from_env().expect("config should parse");
        assert_eq!(config.url.host(), "env-cam.local");
        assert_eq!(config.max_frames, Some(3));
        assert_eq!(config.output_dir, PathBuf::from("frames"));

        remove_env(URL_VAR);
        remove_env(MAX_FRAMES_VAR);
    }

    #[test]
    fn from_env_reads_dotenv_file() {
        let _guard = lock_env();
        remove_env(URL_VAR);

        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("camstream.env");
        fs::write(&path, "CAMSTREAM_URL=http://dotenv-cam.local/video\n")
            .expect("should write temporary dotenv file");

        dotenvy::from_path_override(&path).expect("dotenv file should load");
        let config = RecorderConfig::from_env().expect("config should parse");
        assert_eq!(config.url.host(), "dotenv-cam.local");

        remove_env(URL_VAR);
    }
}
