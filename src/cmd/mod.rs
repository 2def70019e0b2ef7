//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled                                        |
//! |----------|---------------------------------------------------------|
//! | `serve`  | `Serve`                                                 |
//! | `init`   | `Init`                                                  |
//! | `board`  | `Show`, `AddCard`, `MoveCard`, `MoveColumn`, `Export`   |
//! | `config` | `Config`                                                |

pub mod board;
pub mod config;
pub mod init;
pub mod serve;

pub use board::{board_client, cmd_add_card, cmd_export, cmd_move_card, cmd_move_column, cmd_show};
pub use config::cmd_config;
pub use init::cmd_init;
pub use serve::{ServeOverrides, cmd_serve};
