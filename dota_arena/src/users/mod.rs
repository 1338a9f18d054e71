//! Chat users bound to Dota 2 accounts.
//!
//! The tournament core only needs a display name per user; the directory also
//! keeps the linked account so brackets can point at player profiles.
//!
//! ## Example
//!
//! ```no_run
//! use dota_arena::db::Database;
//! use dota_arena::users::{PgUserDirectory, UserDirectory, parse_account_ref};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let directory = PgUserDirectory::new(Arc::new(db.pool().clone()));
//!
//!     let account = parse_account_ref("https://steamcommunity.com/profiles/76561198012345678")
//!         .ok_or("not a Steam profile")?;
//!     directory.bind_account(42, account, "Dendi").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod directory;
pub mod errors;
pub mod models;

pub use directory::{MemoryUserDirectory, PgUserDirectory, UserDirectory};
pub use errors::{UserError, UserResult};
pub use models::{
    AccountId, STEAM64_BASE, User, UserId, parse_account_ref, steam64_to_account_id,
};
