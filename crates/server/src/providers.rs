//! Provider store: a JSON file read per request so edits show up
//! without a restart.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use callpilot_core::Provider;

#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    providers: Vec<Provider>,
}

#[derive(Clone, Debug)]
pub struct ProviderStore {
    path: PathBuf,
}

impl ProviderStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every provider, degrading to an empty list with a warning
    /// when the file is missing or malformed.
    pub fn load(&self) -> Vec<Provider> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "providers.load.read_failed",
                    path = %self.path.display(),
                    error = %error,
                    "provider store unreadable; treating as empty"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<ProvidersFile>(&raw) {
            Ok(file) => file.providers,
            Err(error) => {
                warn!(
                    event_name = "providers.load.parse_failed",
                    path = %self.path.display(),
                    error = %error,
                    "provider store malformed; treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Filter by service and truncate to `limit`. When the service
    /// filter matches nothing but providers exist, fall back to the
    /// full list so a demo request still has someone to call.
    pub fn filtered(&self, service: Option<&str>, limit: usize) -> Vec<Provider> {
        let providers = self.load();
        let mut filtered: Vec<Provider> = match service {
            Some(service) if !service.trim().is_empty() => {
                let matching: Vec<Provider> = providers
                    .iter()
                    .filter(|provider| provider.matches_service(service))
                    .cloned()
                    .collect();
                if matching.is_empty() { providers } else { matching }
            }
            _ => providers,
        };
        filtered.truncate(limit);
        filtered
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::ProviderStore;

    fn store_with(contents: &str) -> (TempDir, ProviderStore) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("providers.json");
        fs::write(&path, contents).expect("write providers");
        let store = ProviderStore::new(path);
        (dir, store)
    }

    const SAMPLE: &str = r#"{
        "providers": [
            {"name": "Bright Smile", "service": "dentist", "availability": ["09:00"], "rating": 4.5, "distance_miles": 2},
            {"name": "Gentle Care", "service": "dentist", "availability": ["16:00"], "rating": 4.8, "distance_miles": 8},
            {"name": "Quick Lube", "service": "auto_repair", "availability": ["10:00"], "rating": 4.1, "distance_miles": 3}
        ]
    }"#;

    #[test]
    fn service_filter_keeps_matching_providers() {
        let (_dir, store) = store_with(SAMPLE);
        let dentists = store.filtered(Some("dentist"), 15);
        assert_eq!(dentists.len(), 2);
        assert!(dentists.iter().all(|p| p.service == "dentist"));
    }

    #[test]
    fn unmatched_service_falls_back_to_all_providers() {
        let (_dir, store) = store_with(SAMPLE);
        let fallback = store.filtered(Some("locksmith"), 15);
        assert_eq!(fallback.len(), 3);
    }

    #[test]
    fn limit_truncates_the_list() {
        let (_dir, store) = store_with(SAMPLE);
        assert_eq!(store.filtered(None, 2).len(), 2);
    }

    #[test]
    fn missing_or_malformed_file_loads_as_empty() {
        let dir = TempDir::new().expect("tempdir");
        let missing = ProviderStore::new(dir.path().join("absent.json"));
        assert!(missing.load().is_empty());

        let (_dir, corrupt) = store_with("{broken");
        assert!(corrupt.load().is_empty());
    }
}
