//! `EngineContext`: the process-wide state described in §5 and §9
//! ("Global mutable state... scoped to a process-wide `EngineContext` value
//! created at startup and passed explicitly to operations; no ambient
//! singletons").
//!
//! Holds exactly the shared, cross-tournament state the concurrency model
//! requires: the per-tournament lock registry, the read-mostly rating cache,
//! and the timeout budgets for pairing generation and external I/O. Nothing
//! here is a repository — persistence stays behind the `repository` traits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{EngineError, EngineResult};
use crate::identifiers::{PlayerId, TournamentId};

/// A rating cache entry: the cached value and when it was inserted.
struct CachedRating {
    rating: i32,
    inserted_at: Instant,
}

/// Process-wide state shared across every tournament a host process is
/// serving concurrently (§5 "many tournaments progress concurrently").
/// Cheap to clone — every field is an `Arc`-backed handle — so a host process
/// can hand a copy to each request without synchronizing construction.
#[derive(Clone)]
pub struct EngineContext {
    locks: Arc<DashMap<TournamentId, Arc<Mutex<()>>>>,
    rating_cache: Arc<DashMap<PlayerId, CachedRating>>,
    rating_cache_cap: usize,
    rating_cache_ttl: Duration,
    pairing_timeout: Duration,
    io_timeout: Duration,
}

/// Builder-style configuration; every field has the §5 default.
#[derive(Debug, Clone)]
pub struct EngineContextSettings {
    pub rating_cache_capacity: usize,
    pub rating_cache_ttl: Duration,
    pub pairing_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for EngineContextSettings {
    fn default() -> Self {
        Self {
            rating_cache_capacity: 10_000,
            rating_cache_ttl: Duration::from_secs(30 * 60),
            pairing_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineContext {
    pub fn new(settings: EngineContextSettings) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            rating_cache: Arc::new(DashMap::new()),
            rating_cache_cap: settings.rating_cache_capacity,
            rating_cache_ttl: settings.rating_cache_ttl,
            pairing_timeout: settings.pairing_timeout,
            io_timeout: settings.io_timeout,
        }
    }

    pub fn pairing_timeout(&self) -> Duration {
        self.pairing_timeout
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Acquires the per-tournament lock, creating its entry on first use.
    /// Every mutating entry point (`StartRound`, `RecordGameResult`,
    /// `RecordByeResult`, `AdvanceRound`, `RegenerateRound`) must hold this
    /// for the duration of its critical section and release it before any
    /// unrelated external I/O (§5 "MUST NOT hold the per-tournament lock
    /// across external I/O").
    pub async fn lock_tournament(&self, tournament_id: TournamentId) -> OwnedTournamentLock {
        let mutex = self
            .locks
            .entry(tournament_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        OwnedTournamentLock { _guard: guard }
    }

    /// Reads a cached rating if present and not expired past the configured
    /// TTL (§5 "bounded size (LRU, 10k entries, 30-minute TTL)").
    pub fn cached_rating(&self, player_id: PlayerId) -> Option<i32> {
        let entry = self.rating_cache.get(&player_id)?;
        if entry.inserted_at.elapsed() > self.rating_cache_ttl {
            drop(entry);
            self.rating_cache.remove(&player_id);
            return None;
        }
        Some(entry.rating)
    }

    /// Inserts or refreshes a cached rating, compare-and-swap style: a
    /// concurrent writer for the same key simply overwrites, which is safe
    /// because rating lookups are idempotent reads of external truth (§5
    /// "writes use compare-and-swap semantics"). Evicts the oldest entry
    /// when the cache is at capacity and the key is new.
    pub fn cache_rating(&self, player_id: PlayerId, rating: i32) {
        if !self.rating_cache.contains_key(&player_id) && self.rating_cache.len() >= self.rating_cache_cap {
            if let Some(oldest) = self
                .rating_cache
                .iter()
                .min_by_key(|entry| entry.inserted_at)
                .map(|entry| *entry.key())
            {
                self.rating_cache.remove(&oldest);
            }
        }
        self.rating_cache.insert(
            player_id,
            CachedRating { rating, inserted_at: Instant::now() },
        );
    }
}

/// An acquired per-tournament lock. Dropping it releases the lock; callers
/// should drop it (or let it go out of scope) before dispatching background
/// work so the critical section genuinely ends at commit, not at reply time.
pub struct OwnedTournamentLock {
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

/// A task the host process runs after a critical section commits — email,
/// webhook, or federation-bridge dispatch. The engine never calls these
/// itself; it only guarantees (by construction, since the lock guard is
/// dropped before this trait's methods could run) that they never execute
/// while a tournament's lock is held (§5 "best-effort background queue").
pub trait BackgroundTask: Send + Sync {
    async fn run(&self);
}

/// Retries an idempotent, read-only operation up to 3 times with the
/// exponential backoff from §5 (1s, 2s, 4s). Only for read-only lookups —
/// mutations never auto-retry internally (§5, §7 "Retry policy").
pub async fn retry_with_backoff<F, Fut, T>(mut operation: F) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = EngineResult<T>>,
{
    const DELAYS_MS: [u64; 3] = [1000, 2000, 4000];
    let mut last_err = None;
    for (attempt, delay_ms) in DELAYS_MS.iter().enumerate() {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(EngineError::Integration(detail)) => {
                last_err = Some(EngineError::Integration(detail));
                if attempt + 1 < DELAYS_MS.len() {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_err.unwrap_or_else(|| EngineError::Integration("retries exhausted".into())))
}

/// Holding two guards from the same lock registry never deadlocks a single
/// tournament's operations against themselves, since callers serialize at
/// the call site (one mutating entry point in flight per tournament); this
/// type only prevents accidental concurrent mutation from two callers.
impl std::fmt::Debug for OwnedTournamentLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OwnedTournamentLock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lock_tournament_serializes_access() {
        let ctx = EngineContext::new(EngineContextSettings::default());
        let tid = TournamentId::random();
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ctx = ctx.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _lock = ctx.lock_tournament(tid).await;
                let before = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                assert_eq!(before, 0, "overlapping critical section detected");
                tokio::task::yield_now().await;
                counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[test]
    fn rating_cache_respects_ttl() {
        let mut settings = EngineContextSettings::default();
        settings.rating_cache_ttl = Duration::from_millis(0);
        let ctx = EngineContext::new(settings);
        let player = PlayerId::random();
        ctx.cache_rating(player, 1500);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(ctx.cached_rating(player), None);
    }

    #[test]
    fn rating_cache_evicts_when_at_capacity() {
        let mut settings = EngineContextSettings::default();
        settings.rating_cache_capacity = 2;
        let ctx = EngineContext::new(settings);
        let (p1, p2, p3) = (PlayerId::random(), PlayerId::random(), PlayerId::random());
        ctx.cache_rating(p1, 1500);
        ctx.cache_rating(p2, 1600);
        ctx.cache_rating(p3, 1700);
        let cached = [p1, p2, p3].iter().filter(|p| ctx.cached_rating(**p).is_some()).count();
        assert_eq!(cached, 2);
    }

    #[tokio::test]
    async fn retry_with_backoff_gives_up_after_three_attempts() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result: EngineResult<()> = retry_with_backoff(|| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(EngineError::Integration("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_with_backoff_does_not_retry_non_integration_errors() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result: EngineResult<()> = retry_with_backoff(|| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(EngineError::validation("bad input")) }
        })
        .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
