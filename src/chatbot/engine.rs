//! Chatbot engine - turns one inbound message into at most one reply.

use chrono::Utc;
use chrono_tz::Tz;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chatbot::ai::AiClient;
use crate::chatbot::cache::TtlCache;
use crate::chatbot::calendar::local_dates;
use crate::chatbot::commands::{AdminCommand, Route, route};
use crate::chatbot::images::ImageClient;
use crate::chatbot::members::{Member, MemberRegistry};
use crate::chatbot::message::ChatMessage;
use crate::chatbot::responses::ResponseStore;
use crate::chatbot::storage::FileStorage;
use crate::chatbot::telegram::Outbox;
use crate::config::Config;
use crate::locale::{Locale, fill};

/// Chatbot configuration.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub ai_endpoint: String,
    pub ai_license: String,
    pub image_endpoint: String,
    pub cache_ttl: Duration,
    pub timezone: Tz,
    pub locale: Locale,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            ai_endpoint: "https://api3.haji-api.ir/lic/gpt/4".to_string(),
            ai_license: String::new(),
            image_endpoint: "https://api-free.ir/api/img.php".to_string(),
            cache_ttl: Duration::from_millis(60_000),
            timezone: chrono_tz::Asia::Tehran,
            locale: Locale::default(),
        }
    }
}

impl From<&Config> for ChatbotConfig {
    fn from(config: &Config) -> Self {
        Self {
            ai_endpoint: config.ai_endpoint.clone(),
            ai_license: config.ai_license.clone(),
            image_endpoint: config.image_endpoint.clone(),
            cache_ttl: config.cache_ttl,
            timezone: config.timezone,
            locale: config.locale.clone(),
        }
    }
}

/// The persisted state the engine works on.
pub struct Stores {
    pub members: MemberRegistry,
    pub responses: ResponseStore,
}

impl Stores {
    /// Open the JSON files under `data_dir`. Unreadable files start empty.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            members: MemberRegistry::load(
                Box::new(FileStorage::new(data_dir.join("users.json"))),
                Box::new(FileStorage::new(data_dir.join("admins.json"))),
            ),
            responses: ResponseStore::load(Box::new(FileStorage::new(data_dir.join("responses.json")))),
        }
    }
}

pub struct ChatbotEngine {
    locale: Locale,
    timezone: Tz,
    members: Mutex<MemberRegistry>,
    responses: Mutex<ResponseStore>,
    cache: Mutex<TtlCache>,
    ai: AiClient,
    images: ImageClient,
    outbox: Arc<dyn Outbox>,
}

/// Locks are only ever held for synchronous store work, never across an await.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatbotEngine {
    pub fn new(config: ChatbotConfig, stores: Stores, outbox: Arc<dyn Outbox>) -> Self {
        Self {
            ai: AiClient::new(config.ai_endpoint, config.ai_license),
            images: ImageClient::new(config.image_endpoint),
            cache: Mutex::new(TtlCache::new(config.cache_ttl)),
            members: Mutex::new(stores.members),
            responses: Mutex::new(stores.responses),
            locale: config.locale,
            timezone: config.timezone,
            outbox,
        }
    }

    #[cfg(test)]
    pub fn is_admin(&self, user_id: i64) -> bool {
        lock(&self.members).is_admin(user_id)
    }

    /// Handle one inbound message. Every failure is logged and contained here.
    pub async fn handle_message(&self, msg: &ChatMessage) {
        let (has_admins, is_admin) = {
            let mut members = lock(&self.members);
            members.add_user(&msg.sender);
            (members.has_admins(), members.is_admin(msg.sender.id))
        };

        // The emptiness check above and the promotion below are separate
        // critical sections: two first messages handled at the same time can
        // both be promoted.
        if !has_admins {
            self.bootstrap_admin(msg).await;
            return;
        }

        match route(&msg.text, is_admin, msg.reply_to.is_some(), &self.locale) {
            Route::AiQuery(query) => self.handle_ai_query(msg, &query).await,
            Route::Admin(command) => self.handle_admin_command(msg, command).await,
            Route::Date => self.send_date(msg).await,
            Route::Image(query) => self.handle_image_request(msg, &query).await,
            Route::Keyword => self.handle_keyword(msg).await,
            Route::Ignore => debug!("No command in admin message {}", msg.message_id),
        }
    }

    async fn bootstrap_admin(&self, msg: &ChatMessage) {
        let added = lock(&self.members).add_admin(&msg.sender);
        if added {
            info!("👑 No admins yet, promoted first sender {} ({})", msg.sender.first_name, msg.sender.id);
        }
        self.reply(msg, &self.locale.admin_bootstrapped).await;
    }

    async fn handle_ai_query(&self, msg: &ChatMessage, query: &str) {
        if query.is_empty() {
            self.reply(msg, &self.locale.invalid_query).await;
            return;
        }

        let cached = lock(&self.cache).get(query).map(str::to_string);
        if let Some(answer) = cached {
            debug!("AI cache hit for {:?}", query);
            self.reply_to(msg, &answer).await;
            return;
        }

        match self.ai.ask(query).await {
            Ok(Some(answer)) => {
                lock(&self.cache).put(query, answer.as_str());
                self.reply_to(msg, &answer).await;
            }
            Ok(None) => {
                info!("AI proxy had no answer for {:?}", query);
                self.reply(msg, &self.locale.ai_no_answer).await;
            }
            Err(e) => {
                warn!("AI query failed: {e}");
                self.reply(msg, &self.locale.ai_failed).await;
            }
        }
    }

    async fn handle_admin_command(&self, msg: &ChatMessage, command: AdminCommand) {
        info!("🔧 Admin command from {} ({}): {:?}", msg.sender.first_name, msg.sender.id, command);

        let text = match command {
            AdminCommand::Promote => {
                let Some(target) = &msg.reply_to else { return };
                let added = lock(&self.members).add_admin(target);
                let template = if added { &self.locale.admin_added } else { &self.locale.admin_exists };
                named(template, target)
            }
            AdminCommand::Demote => {
                let Some(target) = &msg.reply_to else { return };
                let removed = lock(&self.members).remove_admin(target);
                let template = if removed { &self.locale.admin_removed } else { &self.locale.not_admin };
                named(template, target)
            }
            AdminCommand::Delete { keyword } => {
                let deleted = lock(&self.responses).delete_by_keyword(&keyword);
                let template = if deleted {
                    &self.locale.responses_deleted
                } else {
                    &self.locale.responses_not_found
                };
                fill(template, &[("keyword", keyword.as_str())])
            }
            AdminCommand::Teach { keyword, responses } => {
                lock(&self.responses).teach(&keyword, responses);
                fill(&self.locale.responses_learned, &[("keyword", keyword.as_str())])
            }
            AdminCommand::MalformedTeach => self.locale.teach_format_error.clone(),
        };

        self.reply(msg, &text).await;
    }

    async fn send_date(&self, msg: &ChatMessage) {
        let now = Utc::now().with_timezone(&self.timezone);
        let (jalali, gregorian) = local_dates(&now);
        let text = fill(&self.locale.date_reply, &[("jalali", jalali.as_str()), ("gregorian", gregorian.as_str())]);
        self.reply(msg, &text).await;
    }

    async fn handle_image_request(&self, msg: &ChatMessage, query: &str) {
        if query.is_empty() {
            self.reply(msg, &self.locale.invalid_query).await;
            return;
        }

        let urls = match self.images.search(query).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Image search failed: {e}");
                self.reply(msg, &self.locale.image_failed).await;
                return;
            }
        };

        let Some(url) = pick_random(&urls) else {
            self.reply(msg, &fill(&self.locale.image_not_found, &[("query", query)])).await;
            return;
        };

        if self.outbox.send_photo(msg.chat_id, &url).await.is_err() {
            self.reply(msg, &self.locale.image_failed).await;
        }
    }

    async fn handle_keyword(&self, msg: &ChatMessage) {
        let response = lock(&self.responses).lookup_response(&msg.text);
        if let Some(response) = response {
            self.reply_to(msg, &response).await;
        }
    }

    /// Send to the message's chat.
    async fn reply(&self, msg: &ChatMessage, text: &str) {
        self.outbox.send_text(msg.chat_id, text, None).await.ok();
    }

    /// Send as a reply to the message itself.
    async fn reply_to(&self, msg: &ChatMessage, text: &str) {
        self.outbox
            .send_text(msg.chat_id, text, Some(msg.message_id))
            .await
            .ok();
    }
}

fn named(template: &str, member: &Member) -> String {
    fill(template, &[("name", member.first_name.as_str())])
}

fn pick_random(urls: &[String]) -> Option<String> {
    use rand::seq::IndexedRandom;
    urls.choose(&mut rand::rng()).cloned()
}
