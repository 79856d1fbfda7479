//! INI serialization logic for converting `ConfigFile` → INI string.

use super::keys::ConfigKey;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let value = |key: ConfigKey| key.get(config);

    format!(
        r#"[endpoints]
; Backend base URLs, comma-separated, probed in order with GET <url>/
; The first one that answers 2xx is used until a request to it fails.
candidates = {}
; Seconds allowed for each candidate probe (default: 5)
probe_timeout = {}
; Seconds allowed for each API request (default: 10)
request_timeout = {}

[tracking]
; Milliseconds between location captures (default: 20000)
polling_interval_ms = {}
; Minimum movement in meters before a new position is reported (default: 11.1)
movement_threshold_meters = {}
; Fixes with an accuracy radius above this many meters are ignored (default: 100)
accuracy_threshold_meters = {}
; Seconds allowed for a single location capture (default: 10)
location_timeout = {}
; Requested fix quality: low, balanced or high (default: balanced)
accuracy_hint = {}

[session]
; Where the active tracking session is recorded so it can be resumed
store_file = {}

[logging]
; Log file, truncated at startup
file = {}
"#,
        value(ConfigKey::EndpointsCandidates),
        value(ConfigKey::EndpointsProbeTimeout),
        value(ConfigKey::EndpointsRequestTimeout),
        value(ConfigKey::TrackingPollingIntervalMs),
        value(ConfigKey::TrackingMovementThresholdMeters),
        value(ConfigKey::TrackingAccuracyThresholdMeters),
        value(ConfigKey::TrackingLocationTimeout),
        value(ConfigKey::TrackingAccuracyHint),
        value(ConfigKey::SessionStoreFile),
        value(ConfigKey::LoggingFile),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_key() {
        let content = to_config_string(&ConfigFile::default());
        for key in ConfigKey::all() {
            assert!(
                content.contains(&format!("\n{} = ", key.key_name())),
                "missing {}",
                key.name()
            );
        }
        assert!(content.contains("candidates = http://192.168.254.104:8000, "));
        assert!(content.contains("movement_threshold_meters = 11.1"));
    }

    #[test]
    fn test_written_file_parses_back() {
        let mut config = ConfigFile::default();
        config.tracking.polling_interval_ms = 7000;
        config.endpoints.candidates = vec!["https://api.example.com".to_string()];

        let ini = ini::Ini::load_from_str(&to_config_string(&config)).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();
        assert_eq!(parsed, config);
    }
}
