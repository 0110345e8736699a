use crate::presentation::Recommendation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendRequest {
    pub query: String,
    pub category: String,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendResponse {
    pub request: RecommendRequest,
    pub results: Vec<Recommendation>,
    pub stats: RecommendStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendStats {
    pub total_time_ms: u64,
    pub num_candidates: usize,
    pub num_results: usize,
}
