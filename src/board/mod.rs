//! Single-board kanban tracker: storage, HTTP API, ordering core and client.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────────┐  HTTP  ┌─────────────────────────────────────────────┐
//! │ client.rs    │ ─────> │ server.rs  (Router, static frontend, CORS)  │
//! │ BoardClient  │ <───── │   └─ api.rs  (handlers, AppState, ApiError) │
//! │   │          │        │        │  sanitize.rs (text cleaning)       │
//! │   v          │        │        v                                    │
//! │ ordering.rs  │        │ db.rs  (BoardDb, DbHandle, reorder batches) │
//! │ views.rs     │        └─────────────────────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! | Module     | Responsibility                                            |
//! |------------|-----------------------------------------------------------|
//! | `models`   | `Board`, `Column`, `Card`, `Member`, request payloads     |
//! | `db`       | SQLite schema, CRUD, atomic reorder batches               |
//! | `api`      | `/api/*` routes and error mapping                         |
//! | `server`   | `ServerConfig`, full router, `start_server`               |
//! | `ordering` | Drag-and-drop → contiguous order plan                     |
//! | `client`   | `BoardClient`, speculative moves with restore on failure  |
//! | `views`    | `CardFilter` and text rendering                           |
//! | `sanitize` | Trimming, tag stripping, HTML escaping                    |
//!
//! ## Card Move Flow
//!
//! 1. `ordering::resolve_card_drop()` turns (card, drop target) into a plan
//!    covering the target column and, for cross-column moves, the source.
//! 2. `BoardClient::move_card()` applies the plan to the local snapshot and
//!    sends it to `POST /api/cards/reorder`.
//! 3. `BoardDb::reorder_cards()` applies every entry in one transaction and
//!    returns the re-read card list, which replaces the snapshot's cards.

pub mod api;
pub mod client;
pub mod db;
pub mod models;
pub mod ordering;
pub mod sanitize;
pub mod server;
pub mod views;
