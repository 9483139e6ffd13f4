//! Stream URL resolution
//!
//! Ties the pieces together: find the player release for a video, get its
//! operation plan from the cache or by extracting it from the player asset,
//! and apply the plan to a format's signature cipher.

use crate::core::format::StreamFormat;
use crate::error::DecipherError;
use crate::platform::cipher::{apply, extract, CipherAnomaly, CipherQuery, Extraction};
use crate::platform::client::HttpClientConfig;
use crate::platform::player::{PlayerRelease, DEFAULT_ORIGIN};
use crate::platform::source::{HttpPlayerSource, PlayerSource};
use crate::utils::cache::{
    new_async_cache_with_capacity, AsyncCache, CacheEntry, DecipherCache, DEFAULT_CACHE_TTL,
};
use crate::utils::url::is_valid_video_id;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Origin for embed pages and player assets
    pub origin: String,
    /// Deadline for one public resolver call, network and extraction included
    pub request_timeout: Duration,
    /// Lifetime of a cached operation plan
    pub cache_ttl: Duration,
    /// Lifetime of a cached video -> release lookup
    pub release_ttl: Duration,
    /// Maximum number of cached release lookups
    pub release_capacity: u64,
    pub user_agent: Option<String>,
    pub proxy_url: Option<String>,
    /// Fail instead of warn when an empty plan is applied
    pub strict_anomalies: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            request_timeout: Duration::from_secs(30),
            cache_ttl: DEFAULT_CACHE_TTL,
            release_ttl: DEFAULT_CACHE_TTL,
            release_capacity: 1024,
            user_agent: None,
            proxy_url: None,
            strict_anomalies: false,
        }
    }
}

impl ResolverConfig {
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_release_ttl(mut self, ttl: Duration) -> Self {
        self.release_ttl = ttl;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_strict_anomalies(mut self, strict: bool) -> Self {
        self.strict_anomalies = strict;
        self
    }

    /// HTTP settings derived from this configuration
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
            proxy_url: self.proxy_url.clone(),
            origin: self.origin.clone(),
        }
    }
}

/// A playable stream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: String,
    /// Empty when unknown or not needed
    pub signature_timestamp: String,
    pub anomaly: Option<CipherAnomaly>,
}

impl ResolvedStream {
    fn direct(url: &str) -> Self {
        Self {
            url: url.to_string(),
            signature_timestamp: String::new(),
            anomaly: None,
        }
    }
}

/// Resolves stream URLs for ciphered formats
pub struct StreamResolver {
    source: Arc<dyn PlayerSource>,
    cache: Arc<DecipherCache>,
    releases: AsyncCache<String, PlayerRelease>,
    /// Serializes plan misses so one extraction serves every waiter
    refresh_lock: Mutex<()>,
    config: ResolverConfig,
}

impl StreamResolver {
    /// Create a resolver with default configuration
    pub fn new() -> Result<Self, DecipherError> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create an HTTP-backed resolver with its own cache
    pub fn with_config(config: ResolverConfig) -> Result<Self, DecipherError> {
        let source = Arc::new(HttpPlayerSource::new(config.http_config())?);
        let cache = Arc::new(DecipherCache::new(config.cache_ttl));
        Ok(Self::with_source(source, cache, config))
    }

    /// Create a resolver over an arbitrary source and a shared cache
    pub fn with_source(
        source: Arc<dyn PlayerSource>,
        cache: Arc<DecipherCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source,
            cache,
            releases: new_async_cache_with_capacity(config.release_ttl, config.release_capacity),
            refresh_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DecipherCache> {
        &self.cache
    }

    /// Player release serving `video_id`
    pub async fn resolve_release(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PlayerRelease, DecipherError> {
        validate_video_id(video_id)?;
        self.bounded(cancel, "player release lookup", self.lookup_release(video_id))
            .await
    }

    /// Operation plan and signature timestamp for `release`
    pub async fn resolve_plan(
        &self,
        release: &PlayerRelease,
        cancel: &CancellationToken,
    ) -> Result<CacheEntry, DecipherError> {
        self.bounded(cancel, "operation plan lookup", self.load_plan(release))
            .await
    }

    /// Decipher a `signatureCipher` string into a playable URL
    pub async fn decipher_url(
        &self,
        video_id: &str,
        cipher: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolvedStream, DecipherError> {
        validate_video_id(video_id)?;
        let query = CipherQuery::parse(cipher)?;
        self.bounded(cancel, "signature deciphering", self.decipher(video_id, &query))
            .await
    }

    /// Playable URL for one format, deciphering only when needed
    pub async fn resolve_format(
        &self,
        video_id: &str,
        format: &StreamFormat,
        cancel: &CancellationToken,
    ) -> Result<ResolvedStream, DecipherError> {
        if let Some(url) = format.direct_url() {
            debug!("Format {} has a direct URL", format.itag);
            return Ok(ResolvedStream::direct(url));
        }

        match format.signature_cipher.as_deref() {
            Some(cipher) if !cipher.is_empty() => {
                debug!("Format {} requires deciphering", format.itag);
                self.decipher_url(video_id, cipher, cancel).await
            }
            _ => Err(DecipherError::CipherNotFound),
        }
    }

    /// Resolve several formats concurrently, one result per format
    pub async fn resolve_formats(
        &self,
        video_id: &str,
        formats: &[StreamFormat],
        cancel: &CancellationToken,
    ) -> Vec<Result<ResolvedStream, DecipherError>> {
        join_all(
            formats
                .iter()
                .map(|format| self.resolve_format(video_id, format, cancel)),
        )
        .await
    }

    /// Signature timestamp for the playback-context request
    pub async fn signature_timestamp(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, DecipherError> {
        validate_video_id(video_id)?;
        self.bounded(cancel, "signature timestamp lookup", async {
            let release = self.lookup_release(video_id).await?;
            Ok(self.load_plan(&release).await?.signature_timestamp)
        })
        .await
    }

    /// Forget cached releases and plans
    pub fn clear(&self) {
        self.cache.invalidate();
        self.releases.invalidate_all();
    }

    async fn decipher(
        &self,
        video_id: &str,
        query: &CipherQuery,
    ) -> Result<ResolvedStream, DecipherError> {
        let release = self.lookup_release(video_id).await?;
        let entry = self.load_plan(&release).await?;
        let applied = apply(&entry.plan, query)?;

        if let Some(anomaly) = applied.anomaly {
            warn!("Deciphering for video {} with release {}: {}", video_id, release, anomaly);
            if self.config.strict_anomalies {
                return Err(DecipherError::ApplicationAnomaly(anomaly.to_string()));
            }
        }

        Ok(ResolvedStream {
            url: applied.url,
            signature_timestamp: entry.signature_timestamp,
            anomaly: applied.anomaly,
        })
    }

    async fn lookup_release(&self, video_id: &str) -> Result<PlayerRelease, DecipherError> {
        if let Some(release) = self.releases.get(video_id).await {
            debug!("Player release cache hit for {}", video_id);
            return Ok(release);
        }

        // Concurrent misses for one video share a single embed page fetch
        self.releases
            .try_get_with(video_id.to_string(), async {
                let html = self.source.fetch_embed_page(video_id).await?;
                let release = PlayerRelease::from_embed_page(&html)?;
                info!("Video {} uses player release {}", video_id, release);
                Ok::<_, DecipherError>(release)
            })
            .await
            .map_err(DecipherError::from_shared)
    }

    async fn load_plan(&self, release: &PlayerRelease) -> Result<CacheEntry, DecipherError> {
        if let Some(entry) = self.cache.get(release) {
            debug!("Operation plan cache hit for {}", release);
            return Ok(entry);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have filled the slot while we waited
        if let Some(entry) = self.cache.get(release) {
            debug!("Operation plan for {} extracted by a concurrent caller", release);
            return Ok(entry);
        }

        let player_code = self.source.fetch_player_asset(release).await?;
        debug!("Fetched player asset {} ({} bytes)", release, player_code.len());

        let extraction = tokio::task::spawn_blocking(move || extract(&player_code))
            .await
            .map_err(|e| {
                DecipherError::ExtractionFailed(format!("extraction task failed: {}", e))
            })??;
        let Extraction {
            plan,
            signature_timestamp,
        } = extraction;

        info!(
            "Extracted {} operations from player release {}",
            plan.len(),
            release
        );
        Ok(self.cache.set(release.clone(), plan, signature_timestamp))
    }

    async fn bounded<T, F>(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        future: F,
    ) -> Result<T, DecipherError>
    where
        F: Future<Output = Result<T, DecipherError>>,
    {
        let timeout = self.config.request_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("{} cancelled", operation);
                Err(DecipherError::Cancelled)
            }
            result = tokio::time::timeout(timeout, future) => match result {
                Ok(result) => result,
                Err(_) => Err(DecipherError::Timeout(format!(
                    "{} exceeded {}",
                    operation,
                    humantime::format_duration(timeout)
                ))),
            },
        }
    }
}

fn validate_video_id(video_id: &str) -> Result<(), DecipherError> {
    if video_id.is_empty() {
        return Err(DecipherError::InvalidVideoId("video id is empty".to_string()));
    }
    if !is_valid_video_id(video_id) {
        return Err(DecipherError::InvalidVideoId(video_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::cipher::{Operation, OperationPlan};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Instant;

    const RELEASE_A: &str = "/s/player/f676c671/player_ias.vflset/en_US/base.js";
    const RELEASE_B: &str = "/s/player/4fbb4d5b/player_ias.vflset/en_US/base.js";

    const PLAYER: &str = r#"var _yt_player={};(function(g){
var XY={"vw":function(a,b){a.splice(0,b)},"cn":function(a){a.reverse()},"Zm":function(a,b){var c=a[0];a[0]=a[b%a.length];a[b%a.length]=c}};
Qk=function(a){a=a.split("");XY.vw(a,2);XY.Zm(a,4);XY.cn(a);return a.join("")};
g.cfg={signatureTimestamp:19834};})(_yt_player);"#;

    const CIPHER: &str =
        "s=ABCDEFGH&sp=sig&url=https%3A%2F%2Fexample.com%2Fvideoplayback%3Fitag%3D251";

    struct FakeSource {
        releases: HashMap<String, String>,
        asset: String,
        embed_delay: Duration,
        asset_delay_ms: AtomicU64,
        embed_fetches: AtomicUsize,
        asset_fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new(asset: &str) -> Self {
            let releases = [("video_a", RELEASE_A), ("video_b", RELEASE_B)]
                .into_iter()
                .map(|(id, path)| (id.to_string(), path.to_string()))
                .collect();
            Self {
                releases,
                asset: asset.to_string(),
                embed_delay: Duration::ZERO,
                asset_delay_ms: AtomicU64::new(0),
                embed_fetches: AtomicUsize::new(0),
                asset_fetches: AtomicUsize::new(0),
            }
        }

        /// Delay every player asset fetch
        fn with_delay(self, delay: Duration) -> Self {
            self.set_delay(delay);
            self
        }

        fn with_embed_delay(mut self, delay: Duration) -> Self {
            self.embed_delay = delay;
            self
        }

        fn set_delay(&self, delay: Duration) {
            self.asset_delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }

        fn asset_fetches(&self) -> usize {
            self.asset_fetches.load(Ordering::SeqCst)
        }

        fn embed_fetches(&self) -> usize {
            self.embed_fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlayerSource for FakeSource {
        async fn fetch_embed_page(&self, video_id: &str) -> Result<String, DecipherError> {
            self.embed_fetches.fetch_add(1, Ordering::SeqCst);
            if !self.embed_delay.is_zero() {
                tokio::time::sleep(self.embed_delay).await;
            }
            let path = self.releases.get(video_id).ok_or_else(|| {
                DecipherError::AssetUnavailable(format!("embed page for {} returned 404", video_id))
            })?;
            Ok(format!(r#"<script>{{"jsUrl":"{}"}}</script>"#, path))
        }

        async fn fetch_player_asset(
            &self,
            _release: &PlayerRelease,
        ) -> Result<String, DecipherError> {
            self.asset_fetches.fetch_add(1, Ordering::SeqCst);
            let delay = Duration::from_millis(self.asset_delay_ms.load(Ordering::SeqCst));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(self.asset.clone())
        }
    }

    fn resolver(source: Arc<FakeSource>, config: ResolverConfig) -> StreamResolver {
        let cache = Arc::new(DecipherCache::new(config.cache_ttl));
        StreamResolver::with_source(source, cache, config)
    }

    #[tokio::test]
    async fn test_decipher_url() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());

        let stream = resolver
            .decipher_url("video_a", CIPHER, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            stream.url,
            "https://example.com/videoplayback?itag=251&sig=HCFEDG"
        );
        assert_eq!(stream.signature_timestamp, "19834");
        assert_eq!(stream.anomaly, None);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetches() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let first = resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();
        let second = resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.embed_fetches(), 1);
        assert_eq!(source.asset_fetches(), 1);
    }

    #[tokio::test]
    async fn test_new_release_replaces_cached_plan() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();
        resolver.decipher_url("video_b", CIPHER, &cancel).await.unwrap();
        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();

        assert_eq!(source.asset_fetches(), 3);
        assert_eq!(
            resolver.cache().cached_release(),
            Some(PlayerRelease::new(RELEASE_A))
        );
    }

    #[tokio::test]
    async fn test_expired_plan_is_extracted_again() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let config = ResolverConfig::default().with_cache_ttl(Duration::from_millis(30));
        let resolver = resolver(source.clone(), config);
        let cancel = CancellationToken::new();

        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();

        assert_eq!(source.embed_fetches(), 1);
        assert_eq!(source.asset_fetches(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_extract_once() {
        let source = Arc::new(FakeSource::new(PLAYER).with_delay(Duration::from_millis(50)));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let results = join_all(
            (0..8).map(|_| resolver.decipher_url("video_a", CIPHER, &cancel)),
        )
        .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(source.asset_fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_release_misses_fetch_embed_once() {
        let source = Arc::new(FakeSource::new(PLAYER).with_embed_delay(Duration::from_millis(50)));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let formats: Vec<StreamFormat> = (0..6)
            .map(|itag| StreamFormat::ciphered(itag, CIPHER))
            .collect();
        let results = resolver.resolve_formats("video_a", &formats, &cancel).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(source.embed_fetches(), 1);
        assert_eq!(source.asset_fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_release_misses_share_failure() {
        let source = Arc::new(FakeSource::new(PLAYER).with_embed_delay(Duration::from_millis(50)));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let results = join_all(
            (0..4).map(|_| resolver.resolve_release("unknown", &cancel)),
        )
        .await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(DecipherError::AssetUnavailable(_)))));
        assert_eq!(source.embed_fetches(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_not_cached() {
        let source = Arc::new(FakeSource::new("var nothing=here;"));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let err = resolver
                .decipher_url("video_a", CIPHER, &cancel)
                .await
                .unwrap_err();
            assert!(matches!(err, DecipherError::ExtractionFailed(_)));
        }
        assert_eq!(source.asset_fetches(), 2);
    }

    #[tokio::test]
    async fn test_asset_unavailable_is_propagated() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());

        let err = resolver
            .decipher_url("unknown", CIPHER, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::AssetUnavailable(_)));
        assert_eq!(source.asset_fetches(), 0);
    }

    #[tokio::test]
    async fn test_malformed_query_fails_before_fetching() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());

        let err = resolver
            .decipher_url(
                "video_a",
                "s=ABCDEFGH&url=https%3A%2F%2Fexample.com",
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::MalformedCipherQuery(_)));
        assert_eq!(source.embed_fetches(), 0);
    }

    #[tokio::test]
    async fn test_invalid_video_id() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source, ResolverConfig::default());
        let cancel = CancellationToken::new();

        assert!(matches!(
            resolver.decipher_url("", CIPHER, &cancel).await,
            Err(DecipherError::InvalidVideoId(_))
        ));
        assert!(matches!(
            resolver.resolve_release("../etc", &cancel).await,
            Err(DecipherError::InvalidVideoId(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let source = Arc::new(FakeSource::new(PLAYER).with_delay(Duration::from_secs(5)));
        let resolver = resolver(source, ResolverConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = resolver
            .decipher_url("video_a", CIPHER, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_during_fetch() {
        let source = Arc::new(FakeSource::new(PLAYER).with_delay(Duration::from_secs(5)));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = resolver
            .decipher_url("video_a", CIPHER, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(source.asset_fetches(), 1);
        assert_eq!(resolver.cache().cached_release(), None);

        // The plan lock was released and nothing was cached
        source.set_delay(Duration::ZERO);
        let stream = resolver
            .decipher_url("video_a", CIPHER, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            stream.url,
            "https://example.com/videoplayback?itag=251&sig=HCFEDG"
        );
        assert_eq!(source.asset_fetches(), 2);
        assert_eq!(source.embed_fetches(), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let source = Arc::new(FakeSource::new(PLAYER).with_delay(Duration::from_millis(500)));
        let config = ResolverConfig::default().with_timeout(Duration::from_millis(20));
        let resolver = resolver(source, config);

        let err = resolver
            .decipher_url("video_a", CIPHER, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_plan_anomaly() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let cancel = CancellationToken::new();

        let lenient = resolver(source.clone(), ResolverConfig::default());
        lenient.cache().set(
            PlayerRelease::new(RELEASE_A),
            OperationPlan::default(),
            String::new(),
        );
        let stream = lenient
            .decipher_url("video_a", CIPHER, &cancel)
            .await
            .unwrap();
        assert_eq!(stream.anomaly, Some(CipherAnomaly::EmptyPlan));
        assert!(stream.url.ends_with("&sig=ABCDEFGH"));

        let strict = resolver(
            source.clone(),
            ResolverConfig::default().with_strict_anomalies(true),
        );
        strict.cache().set(
            PlayerRelease::new(RELEASE_A),
            OperationPlan::default(),
            String::new(),
        );
        let err = strict
            .decipher_url("video_a", CIPHER, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DecipherError::ApplicationAnomaly(_)));
        assert_eq!(source.asset_fetches(), 0);
    }

    #[tokio::test]
    async fn test_resolve_formats() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());

        let formats = vec![
            StreamFormat::direct(18, "https://example.com/videoplayback?itag=18"),
            StreamFormat::ciphered(251, CIPHER),
            StreamFormat {
                itag: 140,
                ..StreamFormat::default()
            },
        ];
        let results = resolver
            .resolve_formats("video_a", &formats, &CancellationToken::new())
            .await;

        assert_eq!(
            results[0].as_ref().unwrap().url,
            "https://example.com/videoplayback?itag=18"
        );
        assert_eq!(
            results[1].as_ref().unwrap().url,
            "https://example.com/videoplayback?itag=251&sig=HCFEDG"
        );
        assert!(matches!(results[2], Err(DecipherError::CipherNotFound)));
        assert_eq!(source.asset_fetches(), 1);
    }

    #[tokio::test]
    async fn test_resolve_plan_and_timestamp() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        let release = resolver.resolve_release("video_a", &cancel).await.unwrap();
        assert_eq!(release.player_id(), Some("f676c671"));

        let entry = resolver.resolve_plan(&release, &cancel).await.unwrap();
        assert_eq!(
            entry.plan,
            OperationPlan::new(vec![
                Operation::splice(2),
                Operation::swap(4),
                Operation::reverse(),
            ])
        );

        let sts = resolver.signature_timestamp("video_a", &cancel).await.unwrap();
        assert_eq!(sts, "19834");
        assert_eq!(source.asset_fetches(), 1);
        assert_eq!(source.embed_fetches(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let source = Arc::new(FakeSource::new(PLAYER));
        let resolver = resolver(source.clone(), ResolverConfig::default());
        let cancel = CancellationToken::new();

        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();
        resolver.clear();
        resolver.decipher_url("video_a", CIPHER, &cancel).await.unwrap();

        assert_eq!(source.embed_fetches(), 2);
        assert_eq!(source.asset_fetches(), 2);
    }
}
