//! Snapshot tests for the translator client

#[cfg(test)]
mod snapshot_tests {
    use crate::TranslatorConfig;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = TranslatorConfig::new("translator_key_redacted".to_string(), "eastus2".to_string());

        assert_yaml_snapshot!(config, @r###"
        endpoint: "https://api.cognitive.microsofttranslator.com"
        api_key: translator_key_redacted
        region: eastus2
        target_languages:
          - fr
          - es
        "###);
    }
}
