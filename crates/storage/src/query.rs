//! Translation of typed search filters into the Elasticsearch query DSL.
//!
//! Elassandra accepts a full search DSL document through the CQL layer: the
//! JSON produced here is bound to the `es_query` pseudo-column of a SELECT
//! statement, and the coordinator runs it against the mirrored index. This
//! module is pure; execution lives in [`crate::accessor`].

use serde_json::{json, Value};

/// Typed search criteria over baskets. All filters are optional and
/// combined with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasketQuery {
    /// Exact match on the basket's store code.
    pub store_code: Option<String>,
    /// Exact match on a product code of any item line.
    pub product_code: Option<String>,
}

impl BasketQuery {
    /// Builds the search DSL document for these criteria.
    ///
    /// Present filters become non-scoring `filter` clauses of a `bool`
    /// query: a `term` on `store_code`, and a `nested` query on the
    /// `items` path wrapping a `term` on `items.product_code`. With no
    /// filter at all the bool query degenerates to a `should` clause
    /// holding `match_all`, which selects every document.
    ///
    /// Presence is what counts: an empty string is a filter on the empty
    /// string, not an absent filter.
    pub fn to_search_body(&self) -> Value {
        let mut filters: Vec<Value> = Vec::new();

        if let Some(store_code) = &self.store_code {
            filters.push(json!({ "term": { "store_code": store_code } }));
        }
        if let Some(product_code) = &self.product_code {
            filters.push(json!({
                "nested": {
                    "path": "items",
                    "query": { "term": { "items.product_code": product_code } }
                }
            }));
        }

        if filters.is_empty() {
            json!({ "query": { "bool": { "should": [ { "match_all": {} } ] } } })
        } else {
            json!({ "query": { "bool": { "filter": filters } } })
        }
    }
}
