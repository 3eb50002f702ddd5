//! Narration to clip alignment through the matching service, with a random
//! fill fallback.

use std::sync::Arc;

use montage_ml_client::{MatchRequest, MatchResponse, MatchingService, ScriptLine};
use montage_models::{
    BgmResourceEntry, ClipResource, MatchType, RenderEntry, RenderResult, ScriptShot,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::MatcherConfig;
use crate::config_store::TextMatchConfig;
use crate::error::{WorkerError, WorkerResult, NO_RESPONSE_CODE};
use crate::fill::{fill_duration, FillWindow};
use crate::metrics;

const MATCH_SERVICE: &str = "text_video_match";
const EMPTY_LIST_CODE: &str = "matched_video_list_empty";

/// Request-level inputs for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub request_id: String,
    /// Product line tag, sent as the source type.
    #[serde(default)]
    pub request_tag: String,
    /// Appended to every narration line when set.
    #[serde(default)]
    pub fixed_caption: Option<String>,
    #[serde(default)]
    pub first_industry_name: Option<String>,
    #[serde(default)]
    pub second_industry_name: Option<String>,
}

impl MatchContext {
    fn script_text(&self, text: &str) -> String {
        match self.fixed_caption.as_deref() {
            Some(caption) if !caption.is_empty() => format!("{}，{}", text, caption),
            _ => text.to_string(),
        }
    }
}

/// Fills a shot's duration from uniformly shuffled clip resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMatchStrategy;

impl RandomMatchStrategy {
    pub fn run<R: Rng + ?Sized>(
        &self,
        shot_index: usize,
        resources: &[ClipResource],
        target_secs: f64,
        rng: &mut R,
    ) -> WorkerResult<RenderResult> {
        let mut windows: Vec<FillWindow> = resources.iter().map(FillWindow::from).collect();
        windows.shuffle(rng);

        let fill = fill_duration(&windows, target_secs)?;
        Ok(RenderResult {
            shot_index,
            match_type: MatchType::Random,
            bgm_entries: fill.bgm_entries,
            render_lines: vec![fill.entries],
        })
    }
}

/// Matches montage shots against the prepared clip resources.
pub struct TemporalMatcher {
    matching: Arc<dyn MatchingService>,
    config: MatcherConfig,
    text_match: TextMatchConfig,
    random: RandomMatchStrategy,
}

impl TemporalMatcher {
    pub fn new(
        matching: Arc<dyn MatchingService>,
        config: MatcherConfig,
        text_match: TextMatchConfig,
    ) -> Self {
        Self {
            matching,
            config,
            text_match,
            random: RandomMatchStrategy,
        }
    }

    /// Random source for the fallback, seeded when configured.
    pub fn rng(&self) -> StdRng {
        match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Match every montage shot; other shots are skipped.
    ///
    /// The first hard failure aborts the batch.
    pub async fn match_script(
        &self,
        ctx: &MatchContext,
        shots: &[ScriptShot],
        rng: &mut StdRng,
    ) -> WorkerResult<Vec<RenderResult>> {
        let mut results = Vec::new();
        for shot in shots.iter().filter(|s| s.shot_type.needs_montage()) {
            let resources = shot.clip_resources.as_deref().unwrap_or_default();
            results.push(self.match_shot(ctx, shot, resources, rng).await?);
        }
        Ok(results)
    }

    pub async fn match_shot(
        &self,
        ctx: &MatchContext,
        shot: &ScriptShot,
        resources: &[ClipResource],
        rng: &mut StdRng,
    ) -> WorkerResult<RenderResult> {
        let request = self.build_request(ctx, shot, resources);

        let failure = match self.matching.match_script(&request).await {
            Ok(response) if response.is_success && response.clip_count() > 0 => {
                let result = model_result(shot.index, &response);
                info!(
                    request_id = %ctx.request_id,
                    shot_index = shot.index,
                    clips = result.entry_count(),
                    "Matched shot"
                );
                return Ok(result);
            }
            Ok(response) if response.is_success => {
                metrics::record_matched_list_empty();
                WorkerError::empty_result(MATCH_SERVICE)
            }
            Ok(response) => WorkerError::service_unavailable(
                MATCH_SERVICE,
                response.result_code_label(),
                response.error_info.unwrap_or_default(),
            ),
            Err(e) => WorkerError::service_unavailable(MATCH_SERVICE, NO_RESPONSE_CODE, e.to_string()),
        };

        let code = match &failure {
            WorkerError::EmptyResult { .. } => EMPTY_LIST_CODE.to_string(),
            other => other.failure_code().to_string(),
        };

        if self.config.random_fallback {
            warn!(
                request_id = %ctx.request_id,
                shot_index = shot.index,
                code = %code,
                "Matching failed, falling back to random fill"
            );
            metrics::record_random_fallback(&code);
            return self
                .random
                .run(shot.index, resources, shot.tts_duration_secs(), rng)
                .inspect_err(|e| {
                    if e.is_shortage() {
                        metrics::record_duration_shortage("random_match");
                    }
                });
        }

        metrics::record_match_failed(&code);
        error!(
            request_id = %ctx.request_id,
            shot_index = shot.index,
            code = %code,
            error = %failure,
            "Text-video matching failed"
        );
        Err(failure)
    }

    fn build_request(&self, ctx: &MatchContext, shot: &ScriptShot, resources: &[ClipResource]) -> MatchRequest {
        MatchRequest {
            request_id: ctx.request_id.clone(),
            script: shot
                .narration
                .iter()
                .map(|seg| ScriptLine {
                    text: ctx.script_text(&seg.text),
                    start_time: seg.target_start_ms as f64 / 1000.0,
                    end_time: seg.target_end_ms as f64 / 1000.0,
                })
                .collect(),
            clip_resources: resources.to_vec(),
            need_asd: self.text_match.need_asd_for(&ctx.request_tag),
            first_industry_name: ctx.first_industry_name.clone(),
            second_industry_name: ctx.second_industry_name.clone(),
            source_type: ctx.request_tag.clone(),
        }
    }
}

fn model_result(shot_index: usize, response: &MatchResponse) -> RenderResult {
    let mut bgm_entries = Vec::new();
    let mut render_lines = Vec::with_capacity(response.clips_info.len());

    for line in &response.clips_info {
        let tts = line.tts_duration();
        let speed = if tts > 0.0 { line.video_clips_duration / tts } else { 1.0 };

        let mut entries = Vec::with_capacity(line.video_clips.len());
        for clip in &line.video_clips {
            bgm_entries.push(BgmResourceEntry {
                resource_id: clip.resource_id.clone(),
                offset: 0.0,
                duration: clip.duration(),
            });
            entries.push(RenderEntry::new(
                clip.video_idx.saturating_sub(1) as usize,
                clip.video_start_time,
                clip.video_end_time,
                speed,
            ));
        }
        render_lines.push(entries);
    }

    RenderResult {
        shot_index,
        match_type: MatchType::Model,
        bgm_entries,
        render_lines,
    }
}
