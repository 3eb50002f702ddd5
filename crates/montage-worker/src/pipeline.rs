//! End-to-end montage path for one request.

use std::time::Instant;

use montage_media::ClipValidityClassifier;
use montage_models::RenderEntry;
use tracing::Instrument;

use crate::classify::classify_all;
use crate::error::WorkerResult;
use crate::logging::RequestLogger;
use crate::matcher::TemporalMatcher;
use crate::metrics;
use crate::preparer::ClipResourcePreparer;
use crate::request::{MontageRequest, RenderPlan};
use crate::segmenter::ShotSegmenter;
use crate::timeline::MainTrackPlanner;

/// Runs segmentation, classification, preparation, matching and main track
/// layout in sequence.
pub struct MontagePipeline {
    segmenter: ShotSegmenter,
    classifier: ClipValidityClassifier,
    preparer: ClipResourcePreparer,
    matcher: TemporalMatcher,
}

impl MontagePipeline {
    pub fn new(
        segmenter: ShotSegmenter,
        classifier: ClipValidityClassifier,
        preparer: ClipResourcePreparer,
        matcher: TemporalMatcher,
    ) -> Self {
        Self {
            segmenter,
            classifier,
            preparer,
            matcher,
        }
    }

    pub async fn run(&self, request: &MontageRequest) -> WorkerResult<RenderPlan> {
        request.validate()?;
        let logger = RequestLogger::new(&request.request_id, "segment");
        let span = logger.create_span();
        self.run_stages(request, logger).instrument(span).await
    }

    async fn run_stages(&self, request: &MontageRequest, logger: RequestLogger) -> WorkerResult<RenderPlan> {
        logger.log_start(&format!("{} videos", request.videos.len()));
        let started = Instant::now();
        let clips = self.segmenter.segment_all(&request.videos).await;
        let clip_count: usize = clips.iter().map(Vec::len).sum();
        metrics::record_stage_duration("segment", started.elapsed().as_secs_f64());
        logger.log_completion(&format!("{} shot clips", clip_count));

        let logger = logger.for_stage("classify");
        let started = Instant::now();
        let annotated = classify_all(&self.classifier, &request.videos, &clips, &request.detections);
        logger.log_progress(&format!("{} videos annotated", annotated.len()));
        let resources = self.preparer.prepare(&annotated);
        metrics::record_stage_duration("classify", started.elapsed().as_secs_f64());
        logger.log_completion(&format!("{} clip resources", resources.len()));
        if resources.is_empty() {
            logger.log_warning("no usable clip resources");
        }

        let logger = logger.for_stage("match");
        let started = Instant::now();
        let shots = self.preparer.attach(&request.shots, &resources);
        logger.log_progress(&format!(
            "{} script shots against {} clip resources",
            shots.len(),
            resources.len()
        ));
        let mut rng = self.matcher.rng();
        let results = match self.matcher.match_script(&request.match_context(), &shots, &mut rng).await {
            Ok(results) => results,
            Err(e) => {
                logger.log_error(&e.to_string());
                return Err(e);
            }
        };
        metrics::record_stage_duration("match", started.elapsed().as_secs_f64());
        logger.log_completion(&format!("{} shots matched", results.len()));

        let render_lines: Vec<Vec<RenderEntry>> = results
            .iter()
            .flat_map(|r| r.render_lines.iter().cloned())
            .collect();
        let main_track = MainTrackPlanner::new(request.resolution).plan(&render_lines, &request.videos)?;
        logger
            .for_stage("main_track")
            .log_completion(&format!("{} items, {:.3}s", main_track.items.len(), main_track.duration));

        Ok(RenderPlan {
            request_id: request.request_id.clone(),
            clip_count,
            resource_count: resources.len(),
            results,
            main_track,
        })
    }
}
