//! Chat users and their linked Dota 2 accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chat platform user ID type
pub type UserId = i64;

/// Dota 2 account ID (the 32-bit Steam account id)
pub type AccountId = i64;

/// Offset between a SteamID64 and the 32-bit account id
pub const STEAM64_BASE: u64 = 76_561_197_960_265_728;

/// Chat user bound to a game account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub account_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

/// Convert a SteamID64 to the account id used by stats APIs
pub fn steam64_to_account_id(steam64: u64) -> Option<AccountId> {
    steam64
        .checked_sub(STEAM64_BASE)
        .filter(|id| *id > 0 && *id <= u64::from(u32::MAX))
        .map(|id| id as AccountId)
}

/// Read an account id from what a user pasted into the chat
///
/// Accepts a profile URL (`https://steamcommunity.com/profiles/<steam64>`),
/// a bare SteamID64, or a bare account id. Vanity URLs (`/id/<name>`) need an
/// API lookup and are not handled here.
pub fn parse_account_ref(input: &str) -> Option<AccountId> {
    let trimmed = input.trim().trim_end_matches('/');

    if let Some((_, tail)) = trimmed.rsplit_once("/profiles/") {
        return tail.parse::<u64>().ok().and_then(steam64_to_account_id);
    }

    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let number = trimmed.parse::<u64>().ok()?;
    if number > STEAM64_BASE {
        steam64_to_account_id(number)
    } else if number > 0 && number <= u64::from(u32::MAX) {
        Some(number as AccountId)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam64_conversion() {
        assert_eq!(steam64_to_account_id(76561198012345678), Some(52079950));
        assert_eq!(steam64_to_account_id(STEAM64_BASE), None);
        assert_eq!(steam64_to_account_id(12345), None);
    }

    #[test]
    fn test_parse_profile_url() {
        assert_eq!(
            parse_account_ref("https://steamcommunity.com/profiles/76561198012345678/"),
            Some(52079950)
        );
        assert_eq!(
            parse_account_ref("  steamcommunity.com/profiles/76561198012345678  "),
            Some(52079950)
        );
        assert_eq!(
            parse_account_ref("https://steamcommunity.com/profiles/not-a-number"),
            None
        );
    }

    #[test]
    fn test_parse_bare_numbers() {
        assert_eq!(parse_account_ref("76561198012345678"), Some(52079950));
        assert_eq!(parse_account_ref("105248644"), Some(105248644));
        assert_eq!(parse_account_ref("0"), None);
    }

    #[test]
    fn test_parse_rejects_other_input() {
        assert_eq!(parse_account_ref(""), None);
        assert_eq!(parse_account_ref("https://steamcommunity.com/id/miracle"), None);
        assert_eq!(parse_account_ref("-42"), None);
        assert_eq!(parse_account_ref("hello"), None);
    }
}
