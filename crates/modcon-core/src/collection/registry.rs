//! The catalog of moderatable collections.
//!
//! Every collection is declared here as data: which dataset it views, how it
//! filters it, and the actions it offers. The executor and console operate on
//! any descriptor generically; nothing outside this table branches on domain.

use std::collections::HashSet;
use std::sync::OnceLock;

use super::model::{CollectionDescriptor, CollectionId, FetchKey, RecordFilter};
use super::record::Record;
use crate::action::{
    ActionDescriptor, Mutation, Parent, ParentKind, ReasonPolicy, Resource, TargetNoun,
};
use crate::error::{ModconError, Result};
use crate::permission::capability;

/// Ordered set of collection descriptors with unique ids.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Vec<CollectionDescriptor>,
}

impl CollectionRegistry {
    /// Builds a registry, rejecting duplicate collection ids.
    pub fn new(collections: Vec<CollectionDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for collection in &collections {
            if !seen.insert(collection.id.clone()) {
                return Err(ModconError::config(format!(
                    "duplicate collection id '{}'",
                    collection.id
                )));
            }
        }
        Ok(Self { collections })
    }

    pub fn get(&self, id: &CollectionId) -> Option<&CollectionDescriptor> {
        self.collections.iter().find(|c| &c.id == id)
    }

    pub fn require(&self, id: &CollectionId) -> Result<&CollectionDescriptor> {
        self.get(id)
            .ok_or_else(|| ModconError::not_found("collection", id.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionDescriptor> {
        self.collections.iter()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

static DEFAULT_REGISTRY: OnceLock<CollectionRegistry> = OnceLock::new();

/// Returns the dashboard's collection catalog, built on first access.
pub fn default_registry() -> &'static CollectionRegistry {
    DEFAULT_REGISTRY.get_or_init(|| CollectionRegistry {
        collections: default_collections(),
    })
}

// ============================================================================
// Effect helpers
// ============================================================================

fn approve(resource: Resource, record: &Record) -> Result<Mutation> {
    Ok(Mutation::Approve {
        resource,
        id: record.require_id()?,
        parent: None,
    })
}

fn deny(resource: Resource, record: &Record, reason: Option<&str>) -> Result<Mutation> {
    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ModconError::ReasonRequired(format!("deny {resource}")))?;
    Ok(Mutation::Deny {
        resource,
        id: record.require_id()?,
        reason: reason.to_string(),
        parent: None,
    })
}

fn delete(resource: Resource, record: &Record) -> Result<Mutation> {
    Ok(Mutation::Delete {
        resource,
        id: record.require_id()?,
        parent: None,
    })
}

fn waiting(flag: &'static str) -> RecordFilter {
    RecordFilter::Flag {
        field: flag,
        equals: false,
    }
}

fn approved(flag: &'static str) -> RecordFilter {
    RecordFilter::Flag {
        field: flag,
        equals: true,
    }
}

fn emoji_route(record: &Record) -> Result<String> {
    let id = record.require_id()?;
    let is_pack = record.get("emoji_ids").is_some_and(|v| !v.is_null());
    Ok(if is_pack {
        format!("/emojis/packages/{id}")
    } else {
        format!("/emojis/{id}")
    })
}

/// Server or bot a review was left on.
fn review_parent(record: &Record) -> Result<Parent> {
    if record.has_object("server") {
        Ok(Parent::new(ParentKind::Server, record.require_str("server.id")?))
    } else {
        Ok(Parent::new(ParentKind::Bot, record.require_str("bot.id")?))
    }
}

fn review_route(record: &Record) -> Result<String> {
    let parent = review_parent(record)?;
    Ok(format!("/{}s/{}", parent.kind, parent.id))
}

fn user_route(record: &Record) -> Result<String> {
    Ok(format!("/profile/u/{}", record.require_str("user.id")?))
}

fn default_collections() -> Vec<CollectionDescriptor> {
    use FetchKey::*;

    vec![
        // Emojis
        CollectionDescriptor::new("emojis.waiting", "Emojis Queue / Waiting Approval", Emojis)
            .with_filter(waiting("approved"))
            .with_action(ActionDescriptor::view("View", emoji_route))
            .with_action(ActionDescriptor::batch(
                "Approve",
                capability::APPROVE_EMOJIS,
                Emojis,
                |r, _| approve(Resource::Emoji, r),
            ))
            .with_action(
                ActionDescriptor::batch("Deny", capability::APPROVE_EMOJIS, Emojis, |r, reason| {
                    deny(Resource::Emoji, r, reason)
                })
                .with_reason(ReasonPolicy::Catalog(Emojis)),
            ),
        CollectionDescriptor::new("emojis.approved", "Emojis Queue / Approved", Emojis)
            .with_filter(approved("approved"))
            .with_action(ActionDescriptor::view("View", emoji_route))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_EMOJIS, Emojis, |r, _| {
                    delete(Resource::Emoji, r)
                })
                .destructive(TargetNoun::new("emoji", "emojis")),
            ),
        // Bots
        CollectionDescriptor::new("bots.waiting", "Bots Queue / Waiting Approval", Bots)
            .with_filter(waiting("verified"))
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/bots/{}", r.require_id()?))
            }))
            .with_action(ActionDescriptor::batch(
                "Approve",
                capability::APPROVE_BOTS,
                Bots,
                |r, _| approve(Resource::Bot, r),
            ))
            .with_action(
                ActionDescriptor::batch("Deny", capability::APPROVE_BOTS, Bots, |r, reason| {
                    deny(Resource::Bot, r, reason)
                })
                .with_reason(ReasonPolicy::Catalog(Bots)),
            ),
        CollectionDescriptor::new("bots.approved", "Bots Queue / Approved", Bots)
            .with_filter(approved("verified"))
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/bots/{}", r.require_id()?))
            }))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_BOTS, Bots, |r, _| {
                    delete(Resource::Bot, r)
                })
                .destructive(TargetNoun::new("bot", "bots")),
            ),
        // Templates
        CollectionDescriptor::new(
            "templates.waiting",
            "Templates Queue / Waiting Approval",
            Templates,
        )
        .with_filter(waiting("approved"))
        .with_action(ActionDescriptor::view("View", |r| {
            Ok(format!("/templates/{}/preview", r.require_id()?))
        }))
        .with_action(ActionDescriptor::batch(
            "Approve",
            capability::APPROVE_TEMPLATES,
            Templates,
            |r, _| approve(Resource::Template, r),
        ))
        .with_action(
            ActionDescriptor::batch(
                "Deny",
                capability::APPROVE_TEMPLATES,
                Templates,
                |r, reason| deny(Resource::Template, r, reason),
            )
            .with_reason(ReasonPolicy::Catalog(Templates)),
        ),
        CollectionDescriptor::new("templates.approved", "Templates Queue / Approved", Templates)
            .with_filter(approved("approved"))
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/templates/{}/preview", r.require_id()?))
            }))
            .with_action(
                ActionDescriptor::batch(
                    "Delete",
                    capability::DELETE_TEMPLATES,
                    Templates,
                    |r, _| delete(Resource::Template, r),
                )
                .destructive(TargetNoun::new("template", "templates")),
            ),
        // Sounds
        CollectionDescriptor::new("sounds.waiting", "Sounds Queue / Waiting Approval", Sounds)
            .with_filter(waiting("approved"))
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/sounds/{}", r.require_id()?))
            }))
            .with_action(ActionDescriptor::batch(
                "Approve",
                capability::APPROVE_SOUNDS,
                Sounds,
                |r, _| approve(Resource::Sound, r),
            ))
            .with_action(
                ActionDescriptor::batch("Deny", capability::APPROVE_SOUNDS, Sounds, |r, reason| {
                    deny(Resource::Sound, r, reason)
                })
                .with_reason(ReasonPolicy::Catalog(Sounds)),
            ),
        CollectionDescriptor::new("sounds.approved", "Sounds Queue / Approved", Sounds)
            .with_filter(approved("approved"))
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/sounds/{}", r.require_id()?))
            }))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_SOUNDS, Sounds, |r, _| {
                    delete(Resource::Sound, r)
                })
                .destructive(TargetNoun::new("sound", "sounds")),
            ),
        // Reviews: deny takes free text, there is no catalog
        CollectionDescriptor::new("reviews.waiting", "Reviews Queue / Waiting Approval", Reviews)
            .with_filter(waiting("approved"))
            .with_action(ActionDescriptor::view("View", review_route))
            .with_action(ActionDescriptor::batch(
                "Approve",
                capability::APPROVE_REVIEWS,
                Reviews,
                |r, _| Ok(approve(Resource::Review, r)?.within(review_parent(r)?)),
            ))
            .with_action(
                ActionDescriptor::batch("Deny", capability::APPROVE_REVIEWS, Reviews, |r, reason| {
                    Ok(deny(Resource::Review, r, reason)?.within(review_parent(r)?))
                })
                .with_reason(ReasonPolicy::FreeText),
            ),
        CollectionDescriptor::new("reviews.approved", "Reviews Queue / Approved", Reviews)
            .with_filter(approved("approved"))
            .with_action(ActionDescriptor::view("View", review_route))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_REVIEWS, Reviews, |r, _| {
                    Ok(delete(Resource::Review, r)?.within(review_parent(r)?))
                })
                .destructive(TargetNoun::new("review", "reviews")),
            ),
        // Administrative records
        CollectionDescriptor::new("blocked_ips", "Blocked IPs", BlockedIps).with_action(
            ActionDescriptor::batch(
                "Delete",
                capability::DELETE_BLOCKED_IPS,
                BlockedIps,
                |r, _| delete(Resource::BlockedIp, r),
            ),
        ),
        CollectionDescriptor::new("links", "Links", Links)
            .with_action(ActionDescriptor::view("Visit", |r| r.require_str("redirectTo")))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_LINKS, Links, |r, _| {
                    delete(Resource::Link, r)
                })
                .destructive(TargetNoun::new("link", "links")),
            ),
        CollectionDescriptor::new("bot_denies", "Bot Denies", BotDenies)
            .with_action(ActionDescriptor::view("View", |r| {
                Ok(format!("/bots/{}", r.require_str("bot.id")?))
            }))
            .with_action(
                ActionDescriptor::batch(
                    "Delete",
                    capability::DELETE_BOT_DENIES,
                    BotDenies,
                    |r, _| delete(Resource::BotDeny, r),
                )
                .destructive(TargetNoun::new("bot deny", "bot denies")),
            ),
        CollectionDescriptor::new("timeouts", "Timeouts", Timeouts)
            .with_action(
                ActionDescriptor::view("View Bot", |r| {
                    Ok(format!("/bots/{}", r.require_str("bot.id")?))
                })
                .requires_object("bot"),
            )
            .with_action(
                ActionDescriptor::view("View Server", |r| {
                    Ok(format!("/servers/{}", r.require_str("server.id")?))
                })
                .requires_object("server"),
            )
            .with_action(ActionDescriptor::view("View User", user_route))
            .with_action(
                ActionDescriptor::batch("Delete", capability::DELETE_TIMEOUTS, Timeouts, |r, _| {
                    let resource = if r.has_object("bot") {
                        Resource::BotTimeout
                    } else {
                        Resource::ServerTimeout
                    };
                    delete(resource, r)
                })
                .destructive(TargetNoun::new("timeout", "timeouts")),
            ),
        CollectionDescriptor::new("quarantines", "Quarantines", Quarantines)
            .with_action(ActionDescriptor::view("View User", user_route).requires_object("user"))
            .with_action(
                ActionDescriptor::batch(
                    "Delete",
                    capability::DELETE_QUARANTINES,
                    Quarantines,
                    |r, _| delete(Resource::Quarantine, r),
                )
                .destructive(TargetNoun::new("quarantine", "quarantines")),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, Effect};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn mutate(collection: &str, action: &str, record: &Record, reason: Option<&str>) -> Result<Mutation> {
        let descriptor = default_registry()
            .get(&CollectionId::from(collection))
            .unwrap()
            .action(action)
            .unwrap();
        match descriptor.effect {
            Effect::Mutate(f) => f(record, reason),
            Effect::Navigate(_) => panic!("{action} is a navigation action"),
        }
    }

    fn navigate(collection: &str, action: &str, record: &Record) -> Result<String> {
        let descriptor = default_registry()
            .get(&CollectionId::from(collection))
            .unwrap()
            .action(action)
            .unwrap();
        match descriptor.effect {
            Effect::Navigate(f) => f(record),
            Effect::Mutate(_) => panic!("{action} is a mutation"),
        }
    }

    #[test]
    fn test_default_registry_ids_are_unique() {
        let collections = default_collections();
        let count = collections.len();
        let registry = CollectionRegistry::new(collections).unwrap();
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let a = CollectionDescriptor::new("links", "Links", FetchKey::Links);
        let b = CollectionDescriptor::new("links", "Links again", FetchKey::Links);
        assert!(CollectionRegistry::new(vec![a, b]).unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_every_mutating_action_refreshes_its_dataset() {
        for collection in default_registry().iter() {
            for action in &collection.actions {
                if action.kind == ActionKind::View {
                    assert!(action.affects.is_none());
                } else {
                    assert_eq!(action.affects, Some(collection.fetch_key), "{}", action.name);
                }
                if action.kind.is_destructive() {
                    assert!(action.noun.is_some(), "{} needs a noun", action.name);
                }
            }
        }
    }

    #[test]
    fn test_blocked_ip_delete_is_not_confirmed() {
        let action = default_registry()
            .get(&CollectionId::from("blocked_ips"))
            .unwrap()
            .action("delete")
            .unwrap();
        assert_eq!(action.kind, ActionKind::MutateBatch);
    }

    #[test]
    fn test_deny_carries_reason() {
        let bot = record(json!({"id": "123"}));
        let m = mutate("bots.waiting", "Deny", &bot, Some("nsfw")).unwrap();
        assert_eq!(
            m,
            Mutation::Deny {
                resource: Resource::Bot,
                id: "123".into(),
                reason: "nsfw".into(),
                parent: None,
            }
        );
        assert!(mutate("bots.waiting", "Deny", &bot, None).is_err());
        assert!(mutate("bots.waiting", "Deny", &bot, Some("  ")).is_err());
    }

    #[test]
    fn test_timeout_delete_targets_by_shape() {
        let bot_timeout = record(json!({"_id": "t1", "bot": {"id": "b"}, "user": {"id": "u"}}));
        let server_timeout = record(json!({"_id": "t2", "server": {"id": "s"}, "user": {"id": "u"}}));

        assert_eq!(
            mutate("timeouts", "Delete", &bot_timeout, None).unwrap().resource(),
            Resource::BotTimeout
        );
        assert_eq!(
            mutate("timeouts", "Delete", &server_timeout, None).unwrap().resource(),
            Resource::ServerTimeout
        );
    }

    #[test]
    fn test_review_mutations_are_scoped_to_their_owner() {
        let server_review = record(json!({"_id": "r1", "server": {"id": "s9"}}));
        let bot_review = record(json!({"_id": "r2", "bot": {"id": "b9"}}));

        let approve = mutate("reviews.waiting", "Approve", &server_review, None).unwrap();
        assert_eq!(approve.target_id(), "r1");
        assert_eq!(approve.parent(), Some(&Parent::new(ParentKind::Server, "s9")));

        let deny = mutate("reviews.waiting", "Deny", &bot_review, Some("Spam")).unwrap();
        assert_eq!(deny.parent(), Some(&Parent::new(ParentKind::Bot, "b9")));
        assert_eq!(deny.reason(), Some("Spam"));

        let delete = mutate("reviews.approved", "Delete", &bot_review, None).unwrap();
        assert_eq!(delete.parent(), Some(&Parent::new(ParentKind::Bot, "b9")));

        let orphan = record(json!({"_id": "r3"}));
        assert!(mutate("reviews.waiting", "Approve", &orphan, None).is_err());
    }

    #[test]
    fn test_navigation_routes() {
        let pack = record(json!({"id": "p1", "emoji_ids": ["1", "2"]}));
        let single = record(json!({"id": "e1", "emoji_ids": null}));
        assert_eq!(navigate("emojis.waiting", "View", &pack).unwrap(), "/emojis/packages/p1");
        assert_eq!(navigate("emojis.approved", "View", &single).unwrap(), "/emojis/e1");

        let server_review = record(json!({"id": "r", "server": {"id": "s9"}}));
        let bot_review = record(json!({"id": "r", "bot": {"id": "b9"}}));
        assert_eq!(navigate("reviews.waiting", "View", &server_review).unwrap(), "/servers/s9");
        assert_eq!(navigate("reviews.waiting", "View", &bot_review).unwrap(), "/bots/b9");

        let link = record(json!({"id": "l", "redirectTo": "https://example.com"}));
        assert_eq!(navigate("links", "Visit", &link).unwrap(), "https://example.com");
    }
}
