//! Community tips board.
//!
//! Loaded once at startup from the store (falling back to two seeded
//! topics) and re-serialised on every mutation.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{KeyValueStore, COMMUNITY_KEY};
use crate::types::{BetVisionError, CommunityTopic};

const AVATAR_BASE: &str = "https://i.pravatar.cc/150?u=";

fn avatar_for(id: u64) -> String {
    format!("{AVATAR_BASE}{id}")
}

/// Topics shown before anyone has posted.
pub fn default_topics() -> Vec<CommunityTopic> {
    vec![
        CommunityTopic {
            id: 1,
            user: "Gabiis".to_string(),
            avatar: avatar_for(1),
            title: "Real Madrid x City".to_string(),
            tip: "Over 2.5 goals".to_string(),
            comments: 12,
        },
        CommunityTopic {
            id: 2,
            user: "Jackson".to_string(),
            avatar: avatar_for(2),
            title: "Flamengo x Vasco".to_string(),
            tip: "Flamengo to win".to_string(),
            comments: 5,
        },
    ]
}

pub struct CommunityBoard<S> {
    store: S,
    topics: Vec<CommunityTopic>,
}

impl<S: KeyValueStore> CommunityBoard<S> {
    /// Load the board from `store`.
    ///
    /// An absent collection is seeded with [`default_topics`] and written
    /// back; an unreadable one is logged and replaced in memory by the
    /// defaults (the store is only overwritten on the next mutation).
    pub fn load(store: S) -> Self {
        let topics = match store.load(COMMUNITY_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<CommunityTopic>>(&json) {
                Ok(topics) => {
                    info!(count = topics.len(), "Community topics loaded");
                    return Self { store, topics };
                }
                Err(e) => {
                    warn!(error = %e, "Community topics are corrupt, using defaults");
                    default_topics()
                }
            },
            Ok(None) => {
                let board = Self { store, topics: default_topics() };
                if let Err(e) = board.persist(&board.topics) {
                    warn!(error = %e, "Failed to seed community topics");
                }
                return board;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read community topics, using defaults");
                default_topics()
            }
        };

        Self { store, topics }
    }

    pub fn topics(&self) -> &[CommunityTopic] {
        &self.topics
    }

    pub fn get(&self, id: u64) -> Option<&CommunityTopic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Post a new topic. Blank fields are rejected.
    pub fn post(&mut self, user: &str, title: &str, tip: &str) -> Result<&CommunityTopic> {
        let (user, title, tip) = (user.trim(), title.trim(), tip.trim());
        for (field, value) in [("user", user), ("title", title), ("tip", tip)] {
            if value.is_empty() {
                return Err(BetVisionError::InvalidTopic(format!("{field} must not be blank")).into());
            }
        }

        let id = self.topics.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut next = self.topics.clone();
        next.push(CommunityTopic {
            id,
            user: user.to_string(),
            avatar: avatar_for(id),
            title: title.to_string(),
            tip: tip.to_string(),
            comments: 0,
        });
        self.commit(next)?;

        info!(id, user, "Community topic posted");
        Ok(&self.topics[self.topics.len() - 1])
    }

    /// Bump the comment count of topic `id`, returning the new count.
    pub fn record_comment(&mut self, id: u64) -> Result<u32> {
        let mut next = self.topics.clone();
        let topic = next
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(BetVisionError::TopicNotFound(id))?;
        topic.comments = topic.comments.saturating_add(1);
        let comments = topic.comments;
        self.commit(next)?;
        Ok(comments)
    }

    /// Remove topic `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next: Vec<CommunityTopic> = self.topics.iter().filter(|t| t.id != id).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Persist `next` and make it current. On error the board is unchanged.
    fn commit(&mut self, next: Vec<CommunityTopic>) -> Result<()> {
        self.persist(&next)?;
        self.topics = next;
        Ok(())
    }

    fn persist(&self, topics: &[CommunityTopic]) -> Result<()> {
        let json = serde_json::to_string(topics).context("Failed to serialise community topics")?;
        self.store.save(COMMUNITY_KEY, &json)?;
        debug!(count = topics.len(), "Community topics saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
