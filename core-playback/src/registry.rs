//! # Player Registry
//!
//! Owns one [`PlayerController`] per [`PlayerId`]. Controllers are created on
//! first reference and share the registry's [`CoreConfig`].

use crate::config::PlayerDefaults;
use crate::controller::PlayerController;
use crate::error::{PlaybackError, Result};
use bridge_traits::PlayerId;
use core_runtime::CoreConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, error};

#[derive(Debug)]
pub struct PlayerRegistry {
    config: CoreConfig,
    defaults: PlayerDefaults,
    players: HashMap<PlayerId, PlayerController>,
}

impl PlayerRegistry {
    /// Validate `config` and `defaults` up front so later lookups cannot fail
    /// on configuration.
    pub fn new(config: CoreConfig, defaults: PlayerDefaults) -> Result<Self> {
        config.validate()?;
        defaults.validate()?;

        Ok(Self {
            config,
            defaults,
            players: HashMap::new(),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn defaults(&self) -> &PlayerDefaults {
        &self.defaults
    }

    /// Controller for `player_id`, created released on first reference.
    pub fn get_or_create(&mut self, player_id: &PlayerId) -> Result<&mut PlayerController> {
        match self.players.entry(player_id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(%player_id, "Registering player");
                let controller =
                    PlayerController::new(player_id.clone(), &self.config, self.defaults.clone())?;
                Ok(entry.insert(controller))
            }
        }
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&PlayerController> {
        self.players.get(player_id)
    }

    pub fn get_mut(&mut self, player_id: &PlayerId) -> Option<&mut PlayerController> {
        self.players.get_mut(player_id)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Registered ids in sorted order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<_> = self.players.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Release one player's engine. The controller stays registered.
    ///
    /// Returns `false` if the id is unknown.
    pub fn release(&mut self, player_id: &PlayerId) -> Result<bool> {
        match self.players.get_mut(player_id) {
            Some(controller) => controller.release().map(|()| true),
            None => Ok(false),
        }
    }

    /// Release every player, continuing past failures.
    pub fn release_all(&mut self) -> Result<()> {
        let mut failures = Vec::new();

        for (player_id, controller) in self.players.iter_mut() {
            if let Err(e) = controller.release() {
                error!(%player_id, error = %e, "Failed to release player");
                failures.push(format!("{}: {}", player_id, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            failures.sort();
            Err(PlaybackError::ReleaseFailed(failures.join("; ")))
        }
    }

    /// Release and unregister a player.
    ///
    /// The controller is dropped even if releasing its engine fails.
    pub fn remove(&mut self, player_id: &PlayerId) -> Result<bool> {
        match self.players.remove(player_id) {
            Some(mut controller) => {
                debug!(%player_id, "Removing player");
                controller.release().map(|()| true)
            }
            None => Ok(false),
        }
    }

    /// Drain queued callbacks of every player. Returns the number handled.
    pub fn dispatch_all(&mut self) -> Result<usize> {
        let mut handled = 0;
        for controller in self.players.values_mut() {
            handled += controller.dispatch_pending()?;
        }
        Ok(handled)
    }
}
