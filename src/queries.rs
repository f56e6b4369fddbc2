use crate::config::ProjectType;

// Shared Projects V2 selection: title, the Status column options, and a page
// of items with their status, Estimate and content dates. The first
// ASSIGNED_EVENT stands in for "work started".
const PROJECT_V2_FIELDS: &str = r#"
    projectV2(number: $project_number) {
      title
      field(name: "Status") {
        ... on ProjectV2SingleSelectField {
          options {
            name
          }
        }
      }
      items(first: 100, after: $cursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          fieldValueByName(name: "Status") {
            ... on ProjectV2ItemFieldSingleSelectValue {
              name
            }
          }
          estimateField: fieldValueByName(name: "Estimate") {
            ... on ProjectV2ItemFieldNumberValue {
              number
            }
          }
          content {
            ... on Issue {
              createdAt
              closedAt
              timelineItems(itemTypes: [ASSIGNED_EVENT], first: 1) {
                nodes {
                  ... on AssignedEvent {
                    createdAt
                  }
                }
              }
            }
            ... on PullRequest {
              createdAt
              closedAt
            }
          }
        }
      }
    }"#;

/// The full paginated query for the given project owner type.
pub fn project_v2_query(project_type: ProjectType) -> String {
    match project_type {
        ProjectType::User => format!(
            "query ($login: String!, $project_number: Int!, $cursor: String) {{\n  user(login: $login) {{{}\n  }}\n}}",
            PROJECT_V2_FIELDS
        ),
        ProjectType::Organization => format!(
            "query ($login: String!, $project_number: Int!, $cursor: String) {{\n  organization(login: $login) {{{}\n  }}\n}}",
            PROJECT_V2_FIELDS
        ),
        ProjectType::Repository => format!(
            "query ($owner: String!, $name: String!, $project_number: Int!, $cursor: String) {{\n  repository(owner: $owner, name: $name) {{{}\n  }}\n}}",
            PROJECT_V2_FIELDS
        ),
    }
}
