//! Translation dispatcher.
//! Cache lookup → installed-model check → engine call (timeout-bounded) →
//! output validation → cache write. A corrupted model gets one forced
//! reinstall and a single retry; every other failure surfaces immediately.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::cache::{CacheStats, TranslationCache};
use super::direction::{Direction, DirectionResolver, LanguagePair};
use super::engine::{
    EngineClient, EngineError, ErrorClassifier, FailureKind, ModelLifecycle, TranslationEngine,
};
use super::stage::{DispatchStage, StageTracker};
use super::validate::is_different_enough;
use super::{TranslateError, TranslationRequest};
use crate::config::DispatchConfig;
use crate::language::SupportedLanguage;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Bound a collaborator call; elapsed time becomes `EngineError::Timeout`.
async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    timeout(limit, fut).await.map_err(|_| EngineError::Timeout)?
}

fn client_key(source: SupportedLanguage, target: SupportedLanguage) -> String {
    format!("{}-{}", source.code(), target.code())
}

pub struct TranslationService {
    cache: Arc<TranslationCache>,
    engine: Arc<dyn TranslationEngine>,
    models: Arc<dyn ModelLifecycle>,
    resolver: DirectionResolver,
    errors: ErrorClassifier,
    /// Engine handles keyed `"{src}-{tgt}"`.
    clients: Mutex<HashMap<String, Arc<dyn EngineClient>>>,
    metrics: DispatchMetrics,
    translate_timeout: Duration,
    model_timeout: Duration,
    difference_threshold: f32,
    require_wifi: bool,
}

impl TranslationService {
    pub fn new(
        config: &DispatchConfig,
        cache: Arc<TranslationCache>,
        engine: Arc<dyn TranslationEngine>,
        models: Arc<dyn ModelLifecycle>,
    ) -> Self {
        Self {
            cache,
            engine,
            models,
            resolver: DirectionResolver::from_config(config),
            errors: ErrorClassifier::new(config.corruption_signatures.clone()),
            clients: Mutex::new(HashMap::new()),
            metrics: DispatchMetrics::new(),
            translate_timeout: config.translate_timeout(),
            model_timeout: config.model_timeout(),
            difference_threshold: config.difference_threshold,
            require_wifi: config.require_wifi,
        }
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// Blank text and same-language requests return the input untouched
    /// without consulting the cache or the engine. When the engine output is
    /// not different enough from the input, the input is returned and nothing
    /// is cached.
    pub async fn translate(
        &self,
        text: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> Result<String, TranslateError> {
        let request = TranslationRequest::new(text, source, target);
        if request.is_noop() {
            return Ok(request.text);
        }

        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "translate",
            request_id = %request_id,
            source = source.code(),
            target = target.code()
        );
        self.dispatch(&request, request_id).instrument(span).await
    }

    /// Resolve the direction for a chat message, then translate it.
    pub async fn translate_message(
        &self,
        text: &str,
        pair: LanguagePair,
    ) -> Result<(Direction, String), TranslateError> {
        let direction = self.resolve_direction(text, pair);
        let translated = self
            .translate(text, direction.source, direction.target)
            .await?;
        Ok((direction, translated))
    }

    pub fn resolve_direction(&self, text: &str, pair: LanguagePair) -> Direction {
        self.resolver.resolve(text, pair)
    }

    pub fn suggest_language_change(
        &self,
        text: &str,
        pair: LanguagePair,
    ) -> Option<SupportedLanguage> {
        self.resolver.suggest_language_change(text, pair)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn are_models_installed(
        &self,
        first: SupportedLanguage,
        second: SupportedLanguage,
    ) -> bool {
        self.missing_models(&[first, second]).await.is_empty()
    }

    pub async fn can_translate(&self, source: SupportedLanguage, target: SupportedLanguage) -> bool {
        source != target && self.are_models_installed(source, target).await
    }

    /// Languages whose models the lifecycle reports as installed.
    /// Unknown ids are skipped; a failing lifecycle yields an empty list.
    pub async fn installed_languages(&self) -> Vec<SupportedLanguage> {
        match with_timeout(self.model_timeout, self.models.list_installed()).await {
            Ok(ids) => ids
                .iter()
                .filter_map(|id| SupportedLanguage::from_engine_id(id))
                .collect(),
            Err(e) => {
                warn!(error = %e, "listing installed models failed");
                Vec::new()
            }
        }
    }

    /// Make both directions of `pair` ready, downloading models as needed.
    /// Both directions are attempted even when the first one fails.
    pub async fn download_models_if_needed(
        &self,
        pair: LanguagePair,
        require_wifi: bool,
    ) -> Result<(), TranslateError> {
        if pair.native == pair.translate {
            return Ok(());
        }
        let mut failed = 0usize;
        for (source, target) in [
            (pair.native, pair.translate),
            (pair.translate, pair.native),
        ] {
            match self.prepare_models(source, target, require_wifi).await {
                Ok(()) => debug!(
                    source = source.code(),
                    target = target.code(),
                    "direction ready"
                ),
                Err(e) => {
                    warn!(
                        error = %e,
                        source = source.code(),
                        target = target.code(),
                        "model download failed"
                    );
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(TranslateError::ModelDownloadFailed);
        }
        info!(
            native = pair.native.code(),
            translate = pair.translate.code(),
            "models ready"
        );
        Ok(())
    }

    /// Drop the cached engine handle for one pair.
    pub fn release_client(&self, source: SupportedLanguage, target: SupportedLanguage) {
        if self.clients.lock().remove(&client_key(source, target)).is_some() {
            debug!(
                source = source.code(),
                target = target.code(),
                "engine client released"
            );
        }
    }

    pub fn release_all_clients(&self) {
        let mut clients = self.clients.lock();
        let released = clients.len();
        clients.clear();
        debug!(released, "all engine clients released");
    }

    // --- dispatch ---

    async fn dispatch(
        &self,
        request: &TranslationRequest,
        request_id: String,
    ) -> Result<String, TranslateError> {
        let mut stages = StageTracker::new(request_id);
        let result = self.run_stages(request, &mut stages).await;
        if let Err(e) = &result {
            self.metrics.failure();
            warn!(error = %e, stage = %stages.current(), "translation failed");
        }
        result
    }

    async fn run_stages(
        &self,
        request: &TranslationRequest,
        stages: &mut StageTracker,
    ) -> Result<String, TranslateError> {
        let (source, target) = (request.source, request.target);

        stages.advance(DispatchStage::CacheCheck);
        if let Some(hit) = self.cache.get(&request.text, source, target) {
            self.metrics.cache_hit();
            stages.advance(DispatchStage::CacheHit);
            stages.advance(DispatchStage::Done);
            return Ok(hit);
        }
        self.metrics.cache_miss();
        stages.advance(DispatchStage::CacheMiss);

        let missing = self.missing_models(&[source, target]).await;
        if !missing.is_empty() {
            stages.advance(DispatchStage::Fatal);
            return Err(TranslateError::ModelNotInstalled { languages: missing });
        }

        stages.advance(DispatchStage::EngineCall);
        let output = match self.run_engine(&request.text, source, target).await {
            Ok(output) => output,
            Err(e) => match self.errors.classify(&e) {
                FailureKind::Corruption => {
                    warn!(error = %e, "engine reported corrupted model, reinstalling");
                    self.reinstall_and_retry(request, stages).await?
                }
                kind => {
                    stages.advance(DispatchStage::Fatal);
                    return Err(surface(kind, &e, source, target));
                }
            },
        };

        stages.advance(DispatchStage::Validate);
        if !is_different_enough(&request.text, &output, self.difference_threshold) {
            self.metrics.unchanged_output();
            debug!("engine output matches input, not caching");
            stages.advance(DispatchStage::Done);
            return Ok(request.text.clone());
        }

        stages.advance(DispatchStage::CacheWrite);
        self.cache.put(&request.text, &output, source, target);
        stages.advance(DispatchStage::Done);
        Ok(output)
    }

    async fn reinstall_and_retry(
        &self,
        request: &TranslationRequest,
        stages: &mut StageTracker,
    ) -> Result<String, TranslateError> {
        let (source, target) = (request.source, request.target);
        stages.advance(DispatchStage::ForceReinstall);
        self.metrics.reinstall();
        self.release_client(source, target);

        for lang in [source, target] {
            if let Err(e) = self.reinstall_model(lang).await {
                warn!(error = %e, language = lang.code(), "model reinstall failed");
                stages.advance(DispatchStage::Fatal);
                return Err(TranslateError::ReinstallFailed);
            }
        }

        stages.advance(DispatchStage::EngineRetry);
        match self.run_engine(&request.text, source, target).await {
            Ok(output) => {
                info!("translation succeeded after model reinstall");
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "retry after reinstall failed");
                stages.advance(DispatchStage::Fatal);
                Err(TranslateError::ReinstallFailed)
            }
        }
    }

    /// Delete then re-download one language model. Reinstall downloads
    /// never wait for Wi-Fi.
    async fn reinstall_model(&self, lang: SupportedLanguage) -> Result<(), EngineError> {
        let id = lang.engine_id();
        let deleted = with_timeout(self.model_timeout, self.models.delete(id)).await?;
        if !deleted {
            debug!(language = id, "model was not present before reinstall");
        }
        if !with_timeout(self.model_timeout, self.models.download(id, false)).await? {
            return Err(EngineError::DownloadIncomplete);
        }
        info!(language = id, "model reinstalled");
        Ok(())
    }

    /// One engine attempt: client lookup, readiness, translate.
    async fn run_engine(
        &self,
        text: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> Result<String, EngineError> {
        let client = self.client_for(source, target)?;
        self.ensure_ready(client.as_ref(), self.require_wifi).await?;

        let started = Instant::now();
        let result = timeout(self.translate_timeout, client.translate(text)).await;
        self.metrics.engine_call(started.elapsed());
        result.map_err(|_| EngineError::Timeout)?
    }

    async fn prepare_models(
        &self,
        source: SupportedLanguage,
        target: SupportedLanguage,
        require_wifi: bool,
    ) -> Result<(), EngineError> {
        let client = self.client_for(source, target)?;
        self.ensure_ready(client.as_ref(), require_wifi).await
    }

    /// Readiness timeouts count as an incomplete download.
    async fn ensure_ready(
        &self,
        client: &dyn EngineClient,
        require_wifi: bool,
    ) -> Result<(), EngineError> {
        match timeout(self.model_timeout, client.ensure_model_ready(require_wifi)).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) | Err(_) => Err(EngineError::DownloadIncomplete),
            Ok(Err(e)) => Err(e),
        }
    }

    fn client_for(
        &self,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> Result<Arc<dyn EngineClient>, EngineError> {
        let key = client_key(source, target);
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }
        let client = self.engine.client(source.engine_id(), target.engine_id())?;
        debug!(pair = %key, "engine client created");
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    async fn missing_models(&self, languages: &[SupportedLanguage]) -> Vec<SupportedLanguage> {
        let mut missing = Vec::new();
        for &lang in languages {
            if missing.contains(&lang) {
                continue;
            }
            let id = lang.engine_id();
            let installed =
                match with_timeout(self.model_timeout, self.models.is_installed(id)).await {
                    Ok(installed) => installed,
                    Err(e) => {
                        warn!(error = %e, language = id, "model install check failed");
                        false
                    }
                };
            if !installed {
                missing.push(lang);
            }
        }
        missing
    }
}

fn surface(
    kind: FailureKind,
    error: &EngineError,
    source: SupportedLanguage,
    target: SupportedLanguage,
) -> TranslateError {
    match kind {
        FailureKind::Timeout => TranslateError::Timeout,
        FailureKind::ModelMissing => TranslateError::ModelNotInstalled {
            languages: vec![source, target],
        },
        FailureKind::DownloadFailed => TranslateError::ModelDownloadFailed,
        FailureKind::Corruption | FailureKind::Other => TranslateError::Engine(error.message()),
    }
}
