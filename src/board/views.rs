//! Filtered views and plain-text rendering of a board snapshot.

use std::fmt::Write as _;

use chrono::NaiveDate;

use super::models::{BoardView, Card};
use super::ordering::{column_cards, sorted_columns};

/// Card filters as offered by the board UI. Every set filter must match.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub assignee: Option<i64>,
    /// Cards due on `today`, plus every card in the column titled "Today".
    pub due_today: bool,
    /// Case-insensitive match on title, description or any tag.
    pub search: Option<String>,
}

impl CardFilter {
    pub fn is_empty(&self) -> bool {
        self.assignee.is_none() && !self.due_today && self.search_query().is_none()
    }

    fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Cards of `view` that pass the filter, in their original order.
    pub fn apply<'a>(&self, view: &'a BoardView, today: NaiveDate) -> Vec<&'a Card> {
        let today_prefix = today.format("%Y-%m-%d").to_string();
        let today_column = view
            .columns
            .iter()
            .find(|c| c.title.to_lowercase() == "today")
            .map(|c| c.id);
        let query = self.search_query();

        view.cards
            .iter()
            .filter(|card| self.assignee.is_none() || card.assignee_id == self.assignee)
            .filter(|card| {
                !self.due_today
                    || card
                        .due_date
                        .as_deref()
                        .is_some_and(|d| d.starts_with(&today_prefix))
                    || Some(card.column_id) == today_column
            })
            .filter(|card| match &query {
                None => true,
                Some(q) => {
                    card.title.to_lowercase().contains(q)
                        || card
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(q))
                        || card.tags.iter().any(|t| t.to_lowercase().contains(q))
                }
            })
            .collect()
    }
}

/// Render `cards` grouped under the board's columns, in board order.
pub fn render_board(view: &BoardView, cards: &[&Card]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", view.board.name, view.board.theme);

    let visible: Vec<Card> = cards.iter().map(|c| (*c).clone()).collect();
    for column in sorted_columns(&view.columns) {
        let in_column = column_cards(&visible, column.id);
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} [#{}] ({}) ==", column.title, column.id, in_column.len());
        for card in in_column {
            let _ = write!(out, "  {:>3}. #{} {}", card.order_index, card.id, card.title);
            if let Some(emoji) = &card.emoji {
                let _ = write!(out, " {}", emoji);
            }
            if let Some(member) = card
                .assignee_id
                .and_then(|id| view.members.iter().find(|m| m.id == id))
            {
                let _ = write!(out, " @{}", member.name);
            }
            if let Some(due) = &card.due_date {
                let _ = write!(out, " (due {})", due);
            }
            if !card.tags.is_empty() {
                let _ = write!(out, " [{}]", card.tags.join(", "));
            }
            let _ = writeln!(out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{BOARD_ID, Board, Column, Member, Theme};

    fn column(id: i64, title: &str, order_index: i64) -> Column {
        Column {
            id,
            board_id: BOARD_ID,
            title: title.to_string(),
            order_index,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn card(id: i64, column_id: i64, title: &str) -> Card {
        Card {
            id,
            board_id: BOARD_ID,
            column_id,
            title: title.to_string(),
            description: None,
            assignee_id: None,
            color: None,
            emoji: None,
            tags: Vec::new(),
            due_date: None,
            order_index: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sample_view() -> BoardView {
        let mut due = card(1, 1, "Pay invoices");
        due.due_date = Some("2025-03-14".into());
        due.assignee_id = Some(7);

        let mut tagged = card(2, 1, "Refactor parser");
        tagged.tags = vec!["Backend".into()];
        tagged.order_index = 1;

        let in_today = card(3, 2, "Standup");

        let mut described = card(4, 3, "Release");
        described.description = Some("Cut the RC branch".into());
        described.assignee_id = Some(7);

        BoardView {
            board: Board {
                id: BOARD_ID,
                name: "Team".into(),
                theme: Theme::Light,
                updated_at: String::new(),
            },
            columns: vec![column(1, "Backlog", 0), column(2, "TODAY", 1), column(3, "Done", 2)],
            cards: vec![due, tagged, in_today, described],
            members: vec![Member {
                id: 7,
                name: "Ada".into(),
                color: "#6366f1".into(),
                avatar: None,
                created_at: String::new(),
                updated_at: String::new(),
            }],
        }
    }

    fn ids(cards: &[&Card]) -> Vec<i64> {
        cards.iter().map(|c| c.id).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let view = sample_view();
        let filter = CardFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&view, today())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_by_assignee() {
        let view = sample_view();
        let filter = CardFilter {
            assignee: Some(7),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&view, today())), vec![1, 4]);
    }

    #[test]
    fn test_filter_due_today_includes_today_column() {
        let view = sample_view();
        let filter = CardFilter {
            due_today: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&view, today())), vec![1, 3]);

        let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(ids(&filter.apply(&view, tomorrow)), vec![3]);
    }

    #[test]
    fn test_search_matches_title_description_and_tags() {
        let view = sample_view();
        let search = |q: &str| CardFilter {
            search: Some(q.to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&search("INVOICE").apply(&view, today())), vec![1]);
        assert_eq!(ids(&search("rc branch").apply(&view, today())), vec![4]);
        assert_eq!(ids(&search("backend").apply(&view, today())), vec![2]);
        // Whitespace-only search is no search
        assert!(search("   ").is_empty());
        assert_eq!(search("   ").apply(&view, today()).len(), 4);
    }

    #[test]
    fn test_filters_combine() {
        let view = sample_view();
        let filter = CardFilter {
            assignee: Some(7),
            due_today: true,
            search: Some("pay".into()),
        };
        assert_eq!(ids(&filter.apply(&view, today())), vec![1]);
    }

    #[test]
    fn test_render_board() {
        let view = sample_view();
        let cards: Vec<&Card> = view.cards.iter().collect();
        let text = render_board(&view, &cards);

        assert!(text.starts_with("Team (light)"));
        let backlog = text.find("== Backlog [#1] (2) ==").unwrap();
        let today = text.find("== TODAY [#2] (1) ==").unwrap();
        assert!(backlog < today);
        assert!(text.contains("#1 Pay invoices @Ada (due 2025-03-14)"));
        assert!(text.contains("#2 Refactor parser [Backend]"));

        // Columns stay visible when filtering hides all their cards
        let none: Vec<&Card> = Vec::new();
        assert!(render_board(&view, &none).contains("== Done [#3] (0) =="));
    }
}
