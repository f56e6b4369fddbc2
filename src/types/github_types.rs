use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectV2Data {
    pub title: Option<String>,
    pub field: Option<StatusField>,
    pub items: ItemConnection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusField {
    pub options: Option<Vec<StatusOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOption {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConnection {
    pub nodes: Vec<ProjectItem>,
    #[serde(rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    #[serde(rename = "fieldValueByName")]
    pub status: Option<StatusValue>,
    #[serde(rename = "estimateField")]
    pub estimate: Option<EstimateValue>,
    pub content: Option<ItemContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusValue {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateValue {
    pub number: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<String>,
    #[serde(rename = "timelineItems")]
    pub timeline_items: Option<TimelineItems>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineItems {
    pub nodes: Option<Vec<TimelineEvent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}
