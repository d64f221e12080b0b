//! Domain Helpers
//!
//! Typed shortcuts for the standard key families: users, projects, tasks,
//! API responses and analytics. Each helper builds the `<family>:<id>` key,
//! attaches the family tag and, without an explicit TTL, uses the TTL of the
//! configured [`CachePattern`] matching the key.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::{AutoTagRules, CachePattern};
use crate::service::CacheService;

// == Key Families ==
#[derive(Debug, Clone, Copy)]
struct Family {
    prefix: &'static str,
    tag: &'static str,
    /// Used when no configured pattern matches the key
    fallback_ttl: u64,
}

const USER: Family = Family {
    prefix: "user",
    tag: "user-data",
    fallback_ttl: 1800,
};
const PROJECT: Family = Family {
    prefix: "project",
    tag: "project-data",
    fallback_ttl: 3600,
};
const TASK: Family = Family {
    prefix: "task",
    tag: "task-data",
    fallback_ttl: 900,
};
const API: Family = Family {
    prefix: "api",
    tag: "api-response",
    fallback_ttl: 300,
};
const ANALYTICS: Family = Family {
    prefix: "analytics",
    tag: "analytics",
    fallback_ttl: 7200,
};

// == App Cache ==
/// Family-aware wrapper around a shared [`CacheService`].
#[derive(Debug, Clone)]
pub struct AppCache {
    cache: CacheService,
    families: AutoTagRules,
}

impl AppCache {
    /// Wraps `cache`, reading family TTLs from its configured patterns.
    pub fn new(cache: CacheService) -> Self {
        let families = AutoTagRules::new(&cache.config().patterns);
        Self { cache, families }
    }

    /// The underlying service.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// The configured pattern governing `key`, if any.
    pub fn family(&self, key: &str) -> Option<&CachePattern> {
        self.families.rule_for(key)
    }

    // == Users ==
    pub async fn cache_user<T>(&self, user_id: &str, data: &T, ttl: Option<u64>)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.put(USER, user_id, data, ttl).await;
    }

    pub async fn get_user<T: DeserializeOwned>(&self, user_id: &str) -> Option<T> {
        self.cache.get(&key(USER, user_id)).await
    }

    pub async fn invalidate_user(&self, user_id: &str) -> bool {
        self.cache.del(&key(USER, user_id)).await
    }

    // == Projects ==
    pub async fn cache_project<T>(&self, project_id: &str, data: &T, ttl: Option<u64>)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.put(PROJECT, project_id, data, ttl).await;
    }

    pub async fn get_project<T: DeserializeOwned>(&self, project_id: &str) -> Option<T> {
        self.cache.get(&key(PROJECT, project_id)).await
    }

    pub async fn invalidate_project(&self, project_id: &str) -> bool {
        self.cache.del(&key(PROJECT, project_id)).await
    }

    // == Tasks ==
    pub async fn cache_task<T>(&self, task_id: &str, data: &T, ttl: Option<u64>)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.put(TASK, task_id, data, ttl).await;
    }

    pub async fn get_task<T: DeserializeOwned>(&self, task_id: &str) -> Option<T> {
        self.cache.get(&key(TASK, task_id)).await
    }

    pub async fn invalidate_task(&self, task_id: &str) -> bool {
        self.cache.del(&key(TASK, task_id)).await
    }

    // == API Responses ==
    /// Caches a response under `api:<endpoint>:<params hash>`.
    pub async fn cache_api_response<P, T>(&self, endpoint: &str, params: &P, response: &T, ttl: Option<u64>)
    where
        P: Serialize + fmt::Debug + ?Sized,
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.put(API, &api_id(endpoint, params), response, ttl).await;
    }

    pub async fn get_api_response<P, T>(&self, endpoint: &str, params: &P) -> Option<T>
    where
        P: Serialize + fmt::Debug + ?Sized,
        T: DeserializeOwned,
    {
        self.cache.get(&api_key(endpoint, params)).await
    }

    // == Analytics ==
    pub async fn cache_analytics<T>(&self, kind: &str, data: &T, ttl: Option<u64>)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        self.put(ANALYTICS, kind, data, ttl).await;
    }

    pub async fn get_analytics<T: DeserializeOwned>(&self, kind: &str) -> Option<T> {
        self.cache.get(&key(ANALYTICS, kind)).await
    }

    // == Invalidation ==
    pub async fn invalidate_by_tags(&self, tags: &[&str]) -> usize {
        self.cache.del_by_tags(tags).await
    }

    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        self.cache.del_pattern(pattern).await
    }

    async fn put<T>(&self, family: Family, id: &str, value: &T, ttl: Option<u64>)
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        let key = key(family, id);
        let ttl = ttl.unwrap_or_else(|| {
            self.family(&key)
                .map_or(family.fallback_ttl, |pattern| pattern.ttl)
        });
        self.cache.set(&key, value, Some(ttl), &[family.tag]).await;
    }
}

fn key(family: Family, id: &str) -> String {
    format!("{}:{}", family.prefix, id)
}

fn api_id<P: Serialize + fmt::Debug + ?Sized>(endpoint: &str, params: &P) -> String {
    format!("{}:{}", endpoint, hash_params(params))
}

/// The key a response for `endpoint` called with `params` is cached under.
pub fn api_key<P: Serialize + fmt::Debug + ?Sized>(endpoint: &str, params: &P) -> String {
    key(API, &api_id(endpoint, params))
}

/// Base64 of the params' JSON with every non-alphanumeric character removed.
///
/// Not a digest: distinct params can collide once padding and `+`/`/` are
/// stripped.
pub fn hash_params<P: Serialize + fmt::Debug + ?Sized>(params: &P) -> String {
    let json = serde_json::to_string(params).unwrap_or_else(|e| {
        warn!("Cannot serialize API params {:?}: {}", params, e);
        format!("{:?}", params)
    });

    general_purpose::STANDARD
        .encode(json)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
