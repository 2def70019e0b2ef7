//! Client-side half of card and column ordering.
//!
//! Turns a drag gesture into a reorder batch: the contiguous zero-based
//! `order_index` assignment for every card of the one or two columns the move
//! touches. The server applies the batch atomically (see
//! `BoardDb::reorder_cards`); nothing here talks to storage.

use super::models::{Card, CardOrder, Column, ColumnOrder};
use crate::errors::OrderingError;

/// Where a dragged card was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Append at the end of this column.
    Column(i64),
    /// Insert at this card's position, adopting its column.
    Card(i64),
}

/// Cards of one column, sorted by `order_index`. The sort is stable, so
/// equal indices keep the order they had in `cards`.
pub fn column_cards(cards: &[Card], column_id: i64) -> Vec<&Card> {
    let mut in_column: Vec<&Card> = cards.iter().filter(|c| c.column_id == column_id).collect();
    in_column.sort_by_key(|c| c.order_index);
    in_column
}

/// Columns sorted by `order_index`, ties broken by id.
pub fn sorted_columns(columns: &[Column]) -> Vec<&Column> {
    let mut sorted: Vec<&Column> = columns.iter().collect();
    sorted.sort_by_key(|c| (c.order_index, c.id));
    sorted
}

/// Resolve a card drop into a reorder plan.
///
/// Returns `Ok(None)` when there is nothing to submit: no target, a drop
/// onto the dragged card itself, or a drop that leaves every touched card
/// where it already is. Unknown card or column ids are errors.
///
/// The plan lists the target column's cards first, then (for a cross-column
/// move) the cards left behind in the source column. Each touched column is
/// numbered `0..k`; untouched columns never appear.
pub fn resolve_card_drop(
    columns: &[Column],
    cards: &[Card],
    card_id: i64,
    target: Option<DropTarget>,
) -> Result<Option<Vec<CardOrder>>, OrderingError> {
    let dragged = cards
        .iter()
        .find(|c| c.id == card_id)
        .ok_or(OrderingError::UnknownCard(card_id))?;
    let Some(target) = target else {
        return Ok(None);
    };

    let (target_column, target_index) = match target {
        DropTarget::Card(over_id) if over_id == card_id => return Ok(None),
        DropTarget::Card(over_id) => {
            let over = cards
                .iter()
                .find(|c| c.id == over_id)
                .ok_or(OrderingError::UnknownCard(over_id))?;
            let index = column_cards(cards, over.column_id)
                .iter()
                .position(|c| c.id == over_id)
                .unwrap_or_default();
            (over.column_id, index)
        }
        DropTarget::Column(column_id) => {
            if !columns.iter().any(|c| c.id == column_id) {
                return Err(OrderingError::UnknownColumn(column_id));
            }
            (column_id, column_cards(cards, column_id).len())
        }
    };

    // The index was taken with the dragged card still in its list; the
    // insertion goes into the list without it.
    let mut target_list: Vec<i64> = column_cards(cards, target_column)
        .into_iter()
        .filter(|c| c.id != card_id)
        .map(|c| c.id)
        .collect();
    let insert_at = target_index.min(target_list.len());
    target_list.insert(insert_at, card_id);

    let mut plan: Vec<CardOrder> = target_list
        .iter()
        .enumerate()
        .map(|(position, id)| CardOrder {
            id: *id,
            column_id: Some(target_column),
            order_index: position as i64,
        })
        .collect();

    let source_column = dragged.column_id;
    if source_column != target_column {
        plan.extend(
            column_cards(cards, source_column)
                .into_iter()
                .filter(|c| c.id != card_id)
                .enumerate()
                .map(|(position, c)| CardOrder {
                    id: c.id,
                    column_id: Some(source_column),
                    order_index: position as i64,
                }),
        );
    }

    let unchanged = plan.iter().all(|entry| {
        cards.iter().any(|c| {
            c.id == entry.id
                && Some(c.column_id) == entry.column_id
                && c.order_index == entry.order_index
        })
    });
    if unchanged {
        return Ok(None);
    }
    Ok(Some(plan))
}

/// Apply a reorder plan to an in-memory card list, the way the server will.
/// Entries for cards not in `cards` are ignored.
pub fn apply_card_plan(cards: &mut [Card], plan: &[CardOrder]) {
    for entry in plan {
        if let Some(card) = cards.iter_mut().find(|c| c.id == entry.id) {
            if let Some(column_id) = entry.column_id {
                card.column_id = column_id;
            }
            card.order_index = entry.order_index;
        }
    }
    cards.sort_by_key(|c| (c.order_index, c.id));
}

/// Plan moving a column to `position` (zero-based, clamped to the end).
/// Returns `Ok(None)` when the column is already there.
pub fn plan_column_move(
    columns: &[Column],
    column_id: i64,
    position: usize,
) -> Result<Option<Vec<ColumnOrder>>, OrderingError> {
    let mut ids: Vec<i64> = sorted_columns(columns).iter().map(|c| c.id).collect();
    let current = ids
        .iter()
        .position(|id| *id == column_id)
        .ok_or(OrderingError::UnknownColumn(column_id))?;
    ids.remove(current);
    ids.insert(position.min(ids.len()), column_id);

    let plan: Vec<ColumnOrder> = ids
        .iter()
        .enumerate()
        .map(|(index, id)| ColumnOrder {
            id: *id,
            order_index: index as i64,
        })
        .collect();

    let unchanged = plan.iter().all(|entry| {
        columns
            .iter()
            .any(|c| c.id == entry.id && c.order_index == entry.order_index)
    });
    if unchanged {
        return Ok(None);
    }
    Ok(Some(plan))
}
