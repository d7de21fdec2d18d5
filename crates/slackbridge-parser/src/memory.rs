//! Config-backed implementation of every collaborator trait.

use std::collections::HashMap;

use async_trait::async_trait;
use slackbridge_core::config::DirectoryConfig;

use crate::directory::{
    ChannelNames, EventStore, IdentityDirectory, LookupResult, Profile, RoomDirectory,
};

/// Read-only directory assembled from the `[directory]` config tables.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    server_name: String,
    ghost_prefix: String,
    rooms: HashMap<String, String>,
    aliases: HashMap<String, String>,
    channel_names: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    user_names: HashMap<String, String>,
    team_domains: HashMap<String, String>,
    events: HashMap<(String, String), String>,
}

impl StaticDirectory {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        let mut dir = Self {
            server_name: config.server_name.clone(),
            ghost_prefix: config.ghost_prefix.clone(),
            ..Self::default()
        };

        for room in &config.rooms {
            dir.rooms.insert(room.channel_id.clone(), room.room_id.clone());
            if let Some(alias) = &room.canonical_alias {
                dir.aliases.insert(room.room_id.clone(), alias.clone());
            }
        }
        for channel in &config.channels {
            dir.channel_names.insert(channel.id.clone(), channel.name.clone());
        }
        for ghost in &config.ghosts {
            let key = dir.ghost_key(&ghost.slack_id, &ghost.team_domain);
            dir.profiles.insert(
                key,
                Profile {
                    display_name: ghost.display_name.clone(),
                },
            );
        }
        for user in &config.slack_users {
            dir.user_names.insert(user.id.clone(), user.name.clone());
        }
        for team in &config.teams {
            if let Some(domain) = &team.domain {
                dir.team_domains.insert(team.id.clone(), domain.clone());
            }
        }
        for event in &config.events {
            dir.events.insert(
                (event.channel.clone(), event.ts.clone()),
                event.event_id.clone(),
            );
        }
        dir
    }

    /// `@{prefix}{domain}_{USER}:{server}`
    fn ghost_key(&self, user_id: &str, team_domain: &str) -> String {
        format!(
            "@{}{}_{}:{}",
            self.ghost_prefix,
            team_domain.to_lowercase(),
            user_id.to_uppercase(),
            self.server_name
        )
    }
}

#[async_trait]
impl RoomDirectory for StaticDirectory {
    async fn bridged_room(&self, channel_id: &str) -> LookupResult<Option<String>> {
        Ok(self.rooms.get(channel_id).cloned())
    }

    async fn canonical_alias(&self, room_id: &str) -> LookupResult<Option<String>> {
        Ok(self.aliases.get(room_id).cloned())
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn identity_key(&self, user_id: &str, team_domain: &str) -> LookupResult<String> {
        Ok(self.ghost_key(user_id, team_domain))
    }

    async fn profile(&self, identity_key: &str) -> LookupResult<Option<Profile>> {
        Ok(self.profiles.get(identity_key).cloned())
    }

    async fn display_name_for_unknown(
        &self,
        _channel_id: &str,
        user_id: &str,
    ) -> LookupResult<Option<String>> {
        Ok(self.user_names.get(user_id).cloned())
    }
}

#[async_trait]
impl ChannelNames for StaticDirectory {
    async fn channel_name(&self, channel_id: &str) -> LookupResult<Option<String>> {
        Ok(self.channel_names.get(channel_id).cloned())
    }
}

#[async_trait]
impl EventStore for StaticDirectory {
    async fn event_by_origin(&self, channel_id: &str, ts: &str) -> LookupResult<Option<String>> {
        Ok(self
            .events
            .get(&(channel_id.to_string(), ts.to_string()))
            .cloned())
    }

    async fn team_domain(&self, team_id: &str) -> LookupResult<Option<String>> {
        Ok(self.team_domains.get(team_id).cloned())
    }
}
