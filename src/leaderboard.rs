use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Identity used when the IP endpoint is unreachable or returns garbage.
/// Scores still submit under it; personalisation treats the caller as a
/// permanent new player.
pub const UNKNOWN_IP: &str = "unknown";

// ── Wire types ──────────────────────────────────────────────────────────────

/// One leaderboard row. Scores are RAW units; halve for display.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HighScoreRecord {
    pub name: String,
    pub score: u32,
    #[serde(rename = "userIP", default)]
    pub user_ip: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoresResponse {
    pub success: bool,
    #[serde(default)]
    pub scores: Vec<HighScoreRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "updatedScore")]
    pub updated_score: Option<HighScoreRecord>,
    #[serde(rename = "newScore")]
    pub new_score: Option<HighScoreRecord>,
    #[serde(rename = "topScores", default)]
    pub top_scores: Vec<HighScoreRecord>,
    #[serde(rename = "currentHighScore")]
    pub current_high_score: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct IpResponse {
    pub success: bool,
    #[serde(default)]
    pub ip: String,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    name: &'a str,
    score: u32,
    #[serde(rename = "userIP")]
    user_ip: &'a str,
}

// ── HTTP client ─────────────────────────────────────────────────────────────

/// Thin client over the leaderboard API. Every call is issued from a
/// detached task; nothing here ever runs on the frame path.
#[derive(Clone)]
pub struct LeaderboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl LeaderboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_ip(&self) -> Result<String> {
        let resp = self
            .http
            .get(format!("{}/ip", self.base_url))
            .send()
            .await
            .context("ip request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("ip HTTP {}", resp.status()));
        }
        let body: IpResponse = resp.json().await.context("ip JSON parse failed")?;
        if !body.success || body.ip.trim().is_empty() {
            return Err(anyhow!("ip endpoint returned no identity"));
        }
        Ok(body.ip)
    }

    /// Top 10 global scores, descending raw score, ties newest-first.
    /// Ordering is the server's; the client does not re-sort.
    pub async fn fetch_top_scores(&self) -> Result<Vec<HighScoreRecord>> {
        let resp = self
            .http
            .get(format!("{}/scores", self.base_url))
            .send()
            .await
            .context("scores request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("scores HTTP {}", resp.status()));
        }
        let body: ScoresResponse = resp.json().await.context("scores JSON parse failed")?;
        if !body.success {
            return Err(anyhow!("scores endpoint reported failure"));
        }
        Ok(body.scores)
    }

    pub async fn fetch_scores_for_ip(&self, ip: &str) -> Result<Vec<HighScoreRecord>> {
        let resp = self
            .http
            .get(format!("{}/scores", self.base_url))
            .query(&[("ip", ip)])
            .send()
            .await
            .context("ip scores request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("ip scores HTTP {}", resp.status()));
        }
        let body: ScoresResponse = resp.json().await.context("ip scores JSON parse failed")?;
        if !body.success {
            return Err(anyhow!("ip scores endpoint reported failure"));
        }
        Ok(body.scores)
    }

    /// Propose a raw score. The server alone decides whether it replaces
    /// the stored best for this IP; the answer comes back in `success`.
    pub async fn submit_score(&self, name: &str, raw_score: u32, ip: &str) -> Result<SubmitResponse> {
        let resp = self
            .http
            .post(format!("{}/scores", self.base_url))
            .json(&SubmitBody {
                name,
                score: raw_score,
                user_ip: ip,
            })
            .send()
            .await
            .context("submit request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("submit HTTP {}", resp.status()));
        }
        resp.json().await.context("submit JSON parse failed")
    }
}

// ── Session state ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Update {
    Ip(String),
    TopScores(Vec<HighScoreRecord>),
    Personal(Vec<HighScoreRecord>),
    Submitted(SubmitOutcome),
    Failed(String),
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub accepted: bool,
    pub message: Option<String>,
    pub record: Option<HighScoreRecord>,
    pub top_scores: Vec<HighScoreRecord>,
}

impl From<SubmitResponse> for SubmitOutcome {
    fn from(resp: SubmitResponse) -> Self {
        let record = resp.updated_score.or(resp.new_score);
        Self {
            accepted: resp.success,
            message: resp.message,
            record,
            top_scores: resp.top_scores,
        }
    }
}

/// A network response tagged with the round that issued the request.
/// Responses from any other round are discarded: arrival order proves
/// nothing about freshness.
#[derive(Debug)]
pub struct Tagged {
    pub round: u64,
    pub update: Update,
}

/// Everything the UI knows about this caller's leaderboard standing.
/// Mutated only through `apply`, so the staleness rule sits in one place.
#[derive(Debug, Default)]
pub struct Session {
    pub user_ip: String,
    pub has_played_before: bool,
    pub existing_name: String,
    /// Personal best in RAW units, as stored server-side.
    pub personal_best: u32,
    pub top_scores: Vec<HighScoreRecord>,
    pub scores_loaded: bool,
    pub submitting: bool,
    pub last_error: Option<String>,
    pub round: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the caller has a usable identity to key the leaderboard.
    pub fn is_identified(&self) -> bool {
        !self.user_ip.is_empty() && self.user_ip != UNKNOWN_IP
    }

    pub fn advance_round(&mut self, round: u64) {
        self.round = round;
    }

    pub fn global_best(&self) -> u32 {
        self.top_scores.first().map(|s| s.score).unwrap_or(0)
    }

    /// 1-based position the caller's personal best would sit at, 0 when
    /// the caller has no standing yet.
    pub fn player_rank(&self) -> usize {
        if !self.has_played_before || self.personal_best == 0 {
            return 0;
        }
        match self
            .top_scores
            .iter()
            .position(|s| s.score <= self.personal_best)
        {
            Some(i) => i + 1,
            None => self.top_scores.len() + 1,
        }
    }

    /// Apply a tagged response. Returns false when the message belonged to
    /// another round and was dropped. Identity is the one exception: the
    /// caller's IP outlives rounds, so it always lands.
    pub fn apply(&mut self, tagged: Tagged) -> bool {
        if tagged.round != self.round && !matches!(tagged.update, Update::Ip(_)) {
            debug!(
                msg_round = tagged.round,
                round = self.round,
                "dropped stale leaderboard response"
            );
            return false;
        }
        match tagged.update {
            Update::Ip(ip) => {
                self.user_ip = ip;
            }
            Update::TopScores(scores) => {
                self.top_scores = scores;
                self.scores_loaded = true;
                self.last_error = None;
            }
            Update::Personal(records) => {
                match records.first() {
                    Some(best) if self.is_identified() => {
                        self.has_played_before = true;
                        self.existing_name = best.name.clone();
                        self.personal_best = best.score;
                    }
                    _ => {
                        self.has_played_before = false;
                        self.existing_name.clear();
                        self.personal_best = 0;
                    }
                }
            }
            Update::Submitted(outcome) => {
                self.submitting = false;
                if outcome.accepted {
                    if !outcome.top_scores.is_empty() {
                        self.top_scores = outcome.top_scores;
                        self.scores_loaded = true;
                    }
                    if let Some(rec) = outcome.record {
                        if self.is_identified() {
                            self.has_played_before = true;
                            self.existing_name = rec.name;
                            self.personal_best = rec.score;
                        }
                    }
                } else if let Some(msg) = outcome.message {
                    debug!("submit rejected: {msg}");
                }
            }
            Update::Failed(err) => {
                // Stale/loading UI is the designed fallback; the game is
                // never told.
                self.last_error = Some(err);
                self.scores_loaded = true;
            }
        }
        true
    }
}

/// Trim and bound a proposed player name. `None` means the submit button
/// stays disabled.
pub fn validate_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 20 {
        return None;
    }
    Some(trimmed.to_string())
}

// ── Background task helpers ─────────────────────────────────────────────────

pub fn spawn_fetch_ip(client: &LeaderboardClient, tx: &mpsc::Sender<Tagged>, round: u64) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let ip = match client.fetch_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("ip lookup failed, using sentinel: {e:#}");
                UNKNOWN_IP.to_string()
            }
        };
        tx.send(Tagged {
            round,
            update: Update::Ip(ip),
        })
        .await
        .ok();
    });
}

pub fn spawn_fetch_top(client: &LeaderboardClient, tx: &mpsc::Sender<Tagged>, round: u64) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let update = match client.fetch_top_scores().await {
            Ok(scores) => Update::TopScores(scores),
            Err(e) => {
                warn!("score fetch failed: {e:#}");
                Update::Failed(format!("scores: {e:#}"))
            }
        };
        tx.send(Tagged { round, update }).await.ok();
    });
}

pub fn spawn_fetch_personal(
    client: &LeaderboardClient,
    tx: &mpsc::Sender<Tagged>,
    round: u64,
    ip: String,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let update = match client.fetch_scores_for_ip(&ip).await {
            Ok(records) => Update::Personal(records),
            Err(e) => {
                warn!("personal score fetch failed: {e:#}");
                Update::Failed(format!("personal: {e:#}"))
            }
        };
        tx.send(Tagged { round, update }).await.ok();
    });
}

pub fn spawn_submit(
    client: &LeaderboardClient,
    tx: &mpsc::Sender<Tagged>,
    round: u64,
    name: String,
    raw_score: u32,
    ip: String,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let update = match client.submit_score(&name, raw_score, &ip).await {
            Ok(resp) => Update::Submitted(resp.into()),
            Err(e) => {
                warn!("submit failed: {e:#}");
                Update::Failed(format!("submit: {e:#}"))
            }
        };
        tx.send(Tagged { round, update }).await.ok();
    });
}

// ── Tests ───────────────────────────────────────────────────────────────────
