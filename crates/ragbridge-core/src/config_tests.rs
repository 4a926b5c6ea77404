//! Unit tests for configuration.

#[cfg(test)]
mod path_expansion_tests {
    use super::super::Config;
    use std::path::PathBuf;

    #[test]
    fn expand_path_handles_tilde() {
        let result = Config::expand_path("~/test");
        // Should not start with ~ after expansion
        assert!(!result.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn expand_path_handles_relative_path() {
        let result = Config::expand_path("docs/corpus.txt");
        assert_eq!(result, PathBuf::from("docs/corpus.txt"));
    }

    #[test]
    fn expand_path_handles_env_vars() {
        temp_env::with_var("RAGBRIDGE_TEST_DOCS", Some("/srv/docs"), || {
            let result = Config::expand_path("$RAGBRIDGE_TEST_DOCS/kb.txt");
            assert_eq!(result, PathBuf::from("/srv/docs/kb.txt"));
        });
    }
}

#[cfg(test)]
mod default_config_tests {
    use super::super::{Config, MessageOrdering};
    use crate::models::Tool;

    #[test]
    fn default_server_listens_on_3000() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.ordering, MessageOrdering::Concurrent);
    }

    #[test]
    fn default_backend_is_openai() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "https://api.openai.com/v1");
        assert_eq!(config.backend.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn default_assistant_spec_enables_file_search() {
        let spec = Config::default().assistant_spec();
        assert_eq!(spec.model, "gpt-4o");
        assert_eq!(spec.tools, vec![Tool::FileSearch]);
    }

    #[test]
    fn default_notices_are_distinct() {
        let config = Config::default();
        assert_ne!(config.notices.initializing, config.notices.error);
    }

    #[test]
    fn default_validates() {
        assert!(Config::default().validate().is_ok());
    }
}

#[cfg(test)]
mod validation_tests {
    use super::super::Config;

    #[test]
    fn zero_poll_attempts_rejected() {
        let mut config = Config::default();
        config.polling.bind.max_attempts = 0;
        let err = config.validate().expect_err("should fail");
        assert!(err.to_string().contains("polling.bind.max_attempts"));
    }

    #[test]
    fn empty_model_rejected() {
        let mut config = Config::default();
        config.assistant.model = "  ".to_string();
        assert!(config.validate().is_err());
    }
}

#[cfg(test)]
mod api_key_tests {
    use super::super::Config;

    #[test]
    fn api_key_read_from_configured_var() {
        let mut config = Config::default();
        config.backend.api_key_env = "RAGBRIDGE_TEST_KEY".to_string();
        temp_env::with_var("RAGBRIDGE_TEST_KEY", Some("sk-test"), || {
            assert_eq!(config.api_key().expect("key"), "sk-test");
        });
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let mut config = Config::default();
        config.backend.api_key_env = "RAGBRIDGE_TEST_MISSING_KEY".to_string();
        temp_env::with_var_unset("RAGBRIDGE_TEST_MISSING_KEY", || {
            let err = config.api_key().expect_err("should fail");
            assert!(err.to_string().contains("RAGBRIDGE_TEST_MISSING_KEY"));
        });
    }
}

#[cfg(test)]
mod loading_tests {
    use super::super::{Config, MessageOrdering};
    use std::path::PathBuf;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        temp_env::with_var_unset("RAGBRIDGE__SERVER__PORT", || {
            let config = Config::load_from_path(&dir.path().join("absent.toml")).expect("load");
            assert_eq!(config.server.port, 3000);
        });
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 4100\nordering = \"serial\"\n\n[corpus]\ndocument = \"/data/kb.txt\"\n",
        )
        .expect("write");

        temp_env::with_var_unset("RAGBRIDGE__SERVER__PORT", || {
            let config = Config::load_from_path(&path).expect("load");
            assert_eq!(config.server.port, 4100);
            assert_eq!(config.server.ordering, MessageOrdering::Serial);
            assert_eq!(config.corpus.document, PathBuf::from("/data/kb.txt"));
            // Untouched sections keep their defaults
            assert_eq!(config.corpus.name, "Knowledge Base");
        });
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4100\n").expect("write");

        temp_env::with_var("RAGBRIDGE__SERVER__PORT", Some("4200"), || {
            let config = Config::load_from_path(&path).expect("load");
            assert_eq!(config.server.port, 4200);
        });
    }

    #[test]
    fn ensure_at_creates_default_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::ensure_at(&path).expect("ensure");
        assert!(path.exists());
        assert_eq!(config.assistant.model, "gpt-4o");
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = Config::default();
        config.corpus.document = PathBuf::from("/test/kb.txt");
        config.server.ordering = MessageOrdering::Serial;

        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");

        assert_eq!(parsed.corpus.document, config.corpus.document);
        assert_eq!(parsed.server.ordering, config.server.ordering);
        assert_eq!(parsed.polling.run.max_attempts, config.polling.run.max_attempts);
    }
}
