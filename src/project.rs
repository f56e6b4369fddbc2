use chrono::{DateTime, Utc};
use log::debug;

use crate::dates::parse_to_utc;
use crate::types::github_types::{ItemContent, ProjectItem, ProjectV2Data};

/// One unit of work on the board. In Projects V2 the Estimate lives on the
/// project item while the dates live on the content (the issue or PR).
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct Card {
    pub created: Option<DateTime<Utc>>,
    pub assigned: Option<DateTime<Utc>>,
    pub closed: Option<DateTime<Utc>>,
    pub points: f64,
}

impl Card {
    pub fn from_item(item: &ProjectItem) -> Card {
        let content = item.content.as_ref();
        Card {
            created: content.and_then(|c| parse_timestamp(c.created_at.as_deref())),
            assigned: content.and_then(parse_assigned_at),
            closed: content.and_then(|c| parse_timestamp(c.closed_at.as_deref())),
            points: item
                .estimate
                .as_ref()
                .and_then(|e| e.number)
                .unwrap_or(0.0),
        }
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(|s| parse_to_utc(s).ok())
}

/// The first ASSIGNED_EVENT on the timeline, if any.
fn parse_assigned_at(content: &ItemContent) -> Option<DateTime<Utc>> {
    content
        .timeline_items
        .as_ref()
        .and_then(|t| t.nodes.as_ref())
        .and_then(|nodes| nodes.first())
        .and_then(|event| parse_timestamp(event.created_at.as_deref()))
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: Option<String>,
    pub cards: Vec<Card>,
}

impl Column {
    pub fn total_points(&self) -> f64 {
        self.cards.iter().map(|card| card.points).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Project {
    /// Bucket items into columns by their Status field value. Items with an
    /// unconfigured or missing status land in the unnamed column.
    pub fn from_project_data(data: &ProjectV2Data) -> Project {
        let name = data.title.clone().unwrap_or_else(|| "Project".to_owned());

        let mut columns: Vec<Column> = vec![Column {
            name: None,
            cards: vec![],
        }];
        if let Some(options) = data.field.as_ref().and_then(|f| f.options.as_ref()) {
            for option in options {
                columns.push(Column {
                    name: Some(option.name.clone()),
                    cards: vec![],
                });
            }
        }

        for item in &data.items.nodes {
            let status = item.status.as_ref().and_then(|s| s.name.as_deref());
            let card = Card::from_item(item);
            debug!("card {:?} with status {:?}", card, status);
            // Index 0 is the unnamed catch-all column.
            let index = columns
                .iter()
                .position(|col| col.name.as_deref() == status)
                .unwrap_or(0);
            columns[index].cards.push(card);
        }

        Project { name, columns }
    }

    pub fn total_points(&self) -> f64 {
        self.columns.iter().map(|column| column.total_points()).sum()
    }

    /// Flattened view of every card across all columns.
    pub fn cards(&self) -> Vec<Card> {
        self.columns
            .iter()
            .flat_map(|column| column.cards.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_data() -> ProjectV2Data {
        serde_json::from_value(serde_json::json!({
            "title": "Sprint board",
            "field": {
                "options": [{"name": "Todo"}, {"name": "Done"}]
            },
            "items": {
                "nodes": [
                    {
                        "fieldValueByName": {"name": "Done"},
                        "estimateField": {"number": 3},
                        "content": {
                            "createdAt": "2026-02-01T09:00:00Z",
                            "closedAt": "2026-02-06T17:00:00Z",
                            "timelineItems": {
                                "nodes": [{"createdAt": "2026-02-02T10:00:00Z"}]
                            }
                        }
                    },
                    {
                        "fieldValueByName": {"name": "Todo"},
                        "estimateField": null,
                        "content": {
                            "createdAt": "2026-02-01T09:00:00Z",
                            "closedAt": null,
                            "timelineItems": {"nodes": []}
                        }
                    },
                    {
                        "fieldValueByName": {"name": "Archived"},
                        "estimateField": {"number": 2},
                        "content": null
                    }
                ],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        }))
        .unwrap()
    }

    #[test]
    fn buckets_items_into_columns() {
        let project = Project::from_project_data(&sample_data());
        assert_eq!(project.name, "Sprint board");
        // Unnamed column plus the two configured options.
        assert_eq!(project.columns.len(), 3);
        assert_eq!(project.columns[0].name, None);
        // "Archived" matches no configured option.
        assert_eq!(project.columns[0].cards.len(), 1);
        assert_eq!(
            project.columns[2].name.as_deref(),
            Some("Done")
        );
        assert_eq!(project.columns[2].cards.len(), 1);
    }

    #[test]
    fn parses_card_fields() {
        let project = Project::from_project_data(&sample_data());
        let done = &project.columns[2].cards[0];
        assert_eq!(done.points, 3.0);
        assert_eq!(
            done.created,
            Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(
            done.assigned,
            Some(Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap())
        );
        assert_eq!(
            done.closed,
            Some(Utc.with_ymd_and_hms(2026, 2, 6, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn missing_estimate_defaults_to_zero_points() {
        let project = Project::from_project_data(&sample_data());
        let todo = &project.columns[1].cards[0];
        assert_eq!(todo.points, 0.0);
        assert!(todo.closed.is_none());
        assert!(todo.assigned.is_none());
    }

    #[test]
    fn totals_and_flattened_cards() {
        let project = Project::from_project_data(&sample_data());
        assert_eq!(project.total_points(), 5.0);
        assert_eq!(project.cards().len(), 3);
    }
}
