//! Snapshot tests for the CLI crate

#[cfg(test)]
mod snapshot_tests {
    use crate::pipeline::fakes::{hit, FakeLlm, FakeRag, FakeTranslator};
    use crate::{FormFill, PipelineConfig, RagPipeline, TranslationOutcome};
    use insta::assert_yaml_snapshot;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_translated_answer_snapshot() {
        let pipeline = RagPipeline::new(
            FakeLlm::replying("Hello"),
            FakeRag {
                documents: vec![hit("a.txt")],
            },
            PipelineConfig::default(),
        )
        .with_translator(Arc::new(FakeTranslator { fail: None }));

        let result = pipeline.answer("Who qualifies?").await.unwrap();
        let TranslationOutcome::Translated(translation) = result.translation else {
            panic!("expected a translation");
        };

        assert_yaml_snapshot!(translation, { ".detectedLanguage.score" => "[score]" }, @r###"
        detectedLanguage:
          language: en
          score: "[score]"
        translations:
          - text: "[fr] Hello"
            to: fr
          - text: "[es] Hello"
            to: es
        "###);
    }

    #[test]
    fn test_form_fill_snapshot() {
        let fill = FormFill::from_response(
            r#"```json
            {"FirstName": "Dana", "Company": "NYSDOT", "InquiryType": "Support"}
            ```"#
                .to_string(),
        );

        assert_yaml_snapshot!(fill.json, @r###"
        Company: NYSDOT
        FirstName: Dana
        InquiryType: Support
        "###);
    }
}
