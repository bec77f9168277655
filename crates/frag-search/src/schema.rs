//! Index schema for ingested text documents

use frag_core::{IndexDefinition, IndexField};

/// Name of the vector field holding document embeddings
pub const VECTOR_FIELD: &str = "embedding";
/// Vector search profile bound to the embedding field
pub const VECTOR_PROFILE: &str = "vpr-hnsw";
/// HNSW algorithm configuration referenced by the profile
pub const HNSW_ALGORITHM: &str = "algo-hnsw";

fn simple(name: &str, field_type: &str) -> IndexField {
    IndexField {
        name: name.to_string(),
        field_type: field_type.to_string(),
        key: false,
        searchable: false,
        filterable: true,
        sortable: true,
        facetable: false,
        analyzer: None,
        dimensions: None,
        vector_search_profile: None,
    }
}

/// Schema for the document index; `dimensions` adds the vector field
pub fn document_index(name: &str, dimensions: Option<usize>) -> IndexDefinition {
    let mut fields = vec![
        IndexField {
            key: true,
            ..simple("id", "Edm.String")
        },
        IndexField {
            searchable: true,
            filterable: false,
            sortable: false,
            analyzer: Some("en.lucene".to_string()),
            ..simple("content", "Edm.String")
        },
        IndexField {
            facetable: true,
            ..simple("path", "Edm.String")
        },
        simple("title", "Edm.String"),
        simple("length", "Edm.Int32"),
    ];

    let vector_profile = dimensions.map(|dims| {
        fields.push(IndexField {
            searchable: true,
            filterable: false,
            sortable: false,
            dimensions: Some(dims),
            vector_search_profile: Some(VECTOR_PROFILE.to_string()),
            ..simple(VECTOR_FIELD, "Collection(Edm.Single)")
        });
        (HNSW_ALGORITHM.to_string(), VECTOR_PROFILE.to_string())
    });

    IndexDefinition {
        name: name.to_string(),
        fields,
        vector_profile,
    }
}
