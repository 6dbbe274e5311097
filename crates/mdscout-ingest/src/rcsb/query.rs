//! RCSB search API v2 request and response bodies
//!
//! API docs: https://search.rcsb.org/#search-api

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows the search API returns per request.
pub const PAGE_SIZE: usize = 10;

/// Node of the boolean query tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryNode {
    Group {
        logical_operator: LogicalOperator,
        nodes: Vec<QueryNode>,
    },
    Terminal {
        service: String,
        parameters: TerminalParameters,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalParameters {
    pub attribute: String,
    pub operator: String,
    pub value: Value,
}

impl QueryNode {
    /// Attribute comparison against the full-text/attribute service
    pub fn text(attribute: &str, operator: &str, value: impl Into<Value>) -> Self {
        QueryNode::Terminal {
            service: "text".to_string(),
            parameters: TerminalParameters {
                attribute: attribute.to_string(),
                operator: operator.to_string(),
                value: value.into(),
            },
        }
    }

    pub fn all(nodes: Vec<QueryNode>) -> Self {
        QueryNode::Group {
            logical_operator: LogicalOperator::And,
            nodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortSpec {
    pub sort_by: String,
    pub direction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginate {
    pub start: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOptions {
    pub return_all_hits: bool,
    pub results_content_type: Vec<String>,
    pub sort: Vec<SortSpec>,
    pub scoring_strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paginate: Option<Paginate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestInfo {
    pub query_id: String,
    pub src: String,
}

/// Full body POSTed to the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: QueryNode,
    pub request_options: RequestOptions,
    pub return_type: String,
    pub request_info: RequestInfo,
}

impl SearchRequest {
    /// Same query restricted to one page
    pub fn page(&self, start: usize, rows: usize) -> SearchRequest {
        let mut request = self.clone();
        request.request_options.paginate = Some(Paginate { start, rows });
        request
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub result_set: Vec<SearchHit>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub identifier: String,
    #[serde(default)]
    pub score: f64,
}

/// Protein entries with bound non-polymers, within the atom budget, solved
/// by X-ray at `max_resolution` Å or better; oldest deposits first.
pub fn criteria_request(max_atoms: u64, max_resolution: f64) -> SearchRequest {
    SearchRequest {
        query: QueryNode::all(vec![
            QueryNode::text("rcsb_entry_info.polymer_entity_count_protein", "greater", 0),
            QueryNode::text(
                "rcsb_entry_info.deposited_nonpolymer_entity_instance_count",
                "greater",
                0,
            ),
            QueryNode::text("rcsb_entry_info.deposited_atom_count", "less_or_equal", max_atoms),
            QueryNode::text("exptl.method", "exact_match", "X-RAY DIFFRACTION"),
            QueryNode::text(
                "rcsb_entry_info.resolution_combined",
                "less_or_equal",
                max_resolution,
            ),
        ]),
        request_options: RequestOptions {
            return_all_hits: false,
            results_content_type: vec!["experimental".to_string()],
            sort: vec![SortSpec {
                sort_by: "rcsb_accession_info.deposit_date".to_string(),
                direction: "asc".to_string(),
            }],
            scoring_strategy: "combined".to_string(),
            paginate: None,
        },
        return_type: "entry".to_string(),
        request_info: RequestInfo {
            query_id: "search_query".to_string(),
            src: "ui".to_string(),
        },
    }
}

/// Number of page requests needed for `limit` results
pub fn page_count(limit: usize) -> usize {
    limit.div_ceil(PAGE_SIZE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(25), 3);
    }

    #[test]
    fn test_criteria_request_shape() {
        let body = serde_json::to_value(criteria_request(50_000, 3.0).page(20, 5)).unwrap();

        assert_eq!(body["return_type"], "entry");
        assert_eq!(body["query"]["type"], "group");
        assert_eq!(body["query"]["logical_operator"], "and");
        assert_eq!(body["query"]["nodes"].as_array().unwrap().len(), 5);
        assert_eq!(
            body["query"]["nodes"][2],
            json!({
                "type": "terminal",
                "service": "text",
                "parameters": {
                    "attribute": "rcsb_entry_info.deposited_atom_count",
                    "operator": "less_or_equal",
                    "value": 50000
                }
            })
        );
        assert_eq!(body["query"]["nodes"][3]["parameters"]["value"], "X-RAY DIFFRACTION");
        assert_eq!(
            body["request_options"]["sort"][0]["sort_by"],
            "rcsb_accession_info.deposit_date"
        );
        assert_eq!(body["request_options"]["paginate"], json!({"start": 20, "rows": 5}));
    }

    #[test]
    fn test_unpaged_request_omits_paginate() {
        let body = serde_json::to_value(criteria_request(1000, 2.5)).unwrap();
        assert!(body["request_options"].get("paginate").is_none());
    }

    #[test]
    fn test_search_response_defaults() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.result_set.is_empty());
        assert_eq!(response.total_count, 0);
    }
}
