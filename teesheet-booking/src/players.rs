use std::collections::HashSet;
use teesheet_core::{CoreError, CoreResult, PlayerIdentity, PlayerInput, MAX_PLAYERS_PER_SLOT};

/// Checks a flight's own player list: 1 to 4 players, positions unique and
/// within 1..=4. Says nothing about other flights sharing the slot.
pub fn validate_players(players: &[PlayerInput]) -> CoreResult<()> {
    if players.is_empty() {
        return Err(CoreError::Validation("a flight needs at least one player".into()));
    }
    if players.len() > MAX_PLAYERS_PER_SLOT as usize {
        return Err(CoreError::Validation(format!(
            "a flight holds at most {} players, got {}",
            MAX_PLAYERS_PER_SLOT,
            players.len()
        )));
    }

    let mut seen = HashSet::new();
    for player in players {
        if !(1..=MAX_PLAYERS_PER_SLOT).contains(&player.position) {
            return Err(CoreError::Validation(format!(
                "player position {} is outside 1..={}",
                player.position, MAX_PLAYERS_PER_SLOT
            )));
        }
        if !seen.insert(player.position) {
            return Err(CoreError::Validation(format!(
                "player position {} is used twice",
                player.position
            )));
        }
        validate_identity(&player.identity)?;
    }
    Ok(())
}

fn validate_identity(identity: &PlayerIdentity) -> CoreResult<()> {
    match identity {
        PlayerIdentity::Guest { guest_name, .. } | PlayerIdentity::WalkUp { guest_name } => {
            if guest_name.expose().trim().is_empty() {
                return Err(CoreError::Validation("guest name must not be blank".into()));
            }
            Ok(())
        }
        PlayerIdentity::Member { .. } | PlayerIdentity::Dependent { .. } => Ok(()),
    }
}
