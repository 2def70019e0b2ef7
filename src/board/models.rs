use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Id of the singleton board row. Every column and card belongs to it.
pub const BOARD_ID: i64 = 1;

/// Member color used when none is supplied.
pub const DEFAULT_MEMBER_COLOR: &str = "#6366f1";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Invalid theme: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub theme: Theme,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    pub order_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: i64,
    pub board_id: i64,
    pub column_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub color: Option<String>,
    pub emoji: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub order_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// API view types

/// Full board state as served by `GET /api/board`: the board row's fields
/// flattened next to every column, card and member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<Column>,
    pub cards: Vec<Card>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardExport {
    pub board: Board,
    pub columns: Vec<Column>,
    pub cards: Vec<Card>,
    pub members: Vec<Member>,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
}

// Reorder batch entries

/// One row of a card reorder batch. A missing `column_id` keeps the card in
/// its current column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardOrder {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<i64>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOrder {
    pub id: i64,
    pub order_index: i64,
}

// Request payloads shared by the HTTP layer and the client

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_order_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_index: Option<i64>,
}

/// Body of `POST /api/cards` and `PUT /api/cards/{id}`. On update every
/// absent field keeps its stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_order_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_index: Option<i64>,
}

/// An `orderIndex` that is not a JSON integer (a string, a fraction, null)
/// reads as absent, so creation falls back to end-of-list placement and an
/// update keeps the stored position.
fn lenient_order_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

// Storage-level inputs, already validated and sanitized

#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub column_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub color: Option<String>,
    pub emoji: Option<String>,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct CardChanges {
    pub column_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub color: Option<String>,
    pub emoji: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<String>,
    pub order_index: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_roundtrip() {
        for s in &["light", "dark"] {
            let parsed: Theme = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_card_order_uses_camel_case() {
        let order: CardOrder =
            serde_json::from_str(r#"{"id": 4, "columnId": 2, "orderIndex": 1}"#).unwrap();
        assert_eq!(
            order,
            CardOrder {
                id: 4,
                column_id: Some(2),
                order_index: 1
            }
        );

        // columnId may be omitted
        let order: CardOrder = serde_json::from_str(r#"{"id": 4, "orderIndex": 0}"#).unwrap();
        assert_eq!(order.column_id, None);
        assert_eq!(
            serde_json::to_value(order).unwrap(),
            serde_json::json!({"id": 4, "orderIndex": 0})
        );
    }

    #[test]
    fn test_board_view_flattens_board_fields() {
        let view = BoardView {
            board: Board {
                id: BOARD_ID,
                name: "Sprint".into(),
                theme: Theme::Dark,
                updated_at: "2025-01-01 00:00:00".into(),
            },
            columns: vec![],
            cards: vec![],
            members: vec![],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Sprint");
        assert_eq!(json["theme"], "dark");
        assert!(json["columns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_non_integer_order_index_reads_as_absent() {
        for body in [
            r#"{"title": "t", "orderIndex": "3"}"#,
            r#"{"title": "t", "orderIndex": 1.5}"#,
            r#"{"title": "t", "orderIndex": null}"#,
            r#"{"title": "t"}"#,
        ] {
            let req: CardRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.order_index, None, "body: {}", body);
            let req: ColumnRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.order_index, None, "body: {}", body);
        }

        let req: CardRequest = serde_json::from_str(r#"{"orderIndex": 2}"#).unwrap();
        assert_eq!(req.order_index, Some(2));
        let req: ColumnRequest = serde_json::from_str(r#"{"orderIndex": -1}"#).unwrap();
        assert_eq!(req.order_index, Some(-1));
    }

    #[test]
    fn test_card_request_skips_absent_fields() {
        let req = CardRequest {
            column_id: Some(3),
            title: Some("Ship it".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"columnId": 3, "title": "Ship it"})
        );
    }
}
