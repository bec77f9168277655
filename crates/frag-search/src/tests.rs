//! Snapshot tests for the search crate

#[cfg(test)]
mod snapshot_tests {
    use crate::{document_index, SearchServiceConfig};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_text_index_schema_snapshot() {
        let definition = document_index("md-medicaid", None);

        assert_yaml_snapshot!(definition, @r###"
        name: md-medicaid
        fields:
          - name: id
            type: Edm.String
            key: true
            searchable: false
            filterable: true
            sortable: true
            facetable: false
          - name: content
            type: Edm.String
            key: false
            searchable: true
            filterable: false
            sortable: false
            facetable: false
            analyzer: en.lucene
          - name: path
            type: Edm.String
            key: false
            searchable: false
            filterable: true
            sortable: true
            facetable: true
          - name: title
            type: Edm.String
            key: false
            searchable: false
            filterable: true
            sortable: true
            facetable: false
          - name: length
            type: Edm.Int32
            key: false
            searchable: false
            filterable: true
            sortable: true
            facetable: false
        vector_profile: ~
        "###);
    }

    #[test]
    fn test_config_snapshot() {
        let config = SearchServiceConfig::new(
            "https://srch-ragdemo.search.windows.net".to_string(),
            "admin_key_redacted".to_string(),
        )
        .with_index("md-policies");

        assert_yaml_snapshot!(config, { ".endpoint" => "[endpoint]" }, @r###"
        endpoint: "[endpoint]"
        api_key: admin_key_redacted
        index_name: md-policies
        api_version: 2024-07-01
        "###);
    }
}
