use crate::{
    assets::FrameSource,
    error::{ReelError, ReelResult},
    model::StepDecl,
    sequence::FrameSequence,
    steps::{Step, resolve_step},
    transforms,
};

/// A static, ordered list of resolved steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

/// Result of one pipeline execution.
#[derive(Debug)]
pub struct PipelineRun {
    pub sequence: FrameSequence,
    /// Source failures the run recovered from, in step order.
    pub source_failures: Vec<ReelError>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Resolve declarations against the catalog. The first bad step fails construction.
    pub fn from_decls(decls: &[StepDecl]) -> ReelResult<Self> {
        let steps = decls
            .iter()
            .enumerate()
            .map(|(i, decl)| {
                resolve_step(decl).map_err(|e| match e {
                    ReelError::Validation(msg) => ReelError::validation(format!("step {i}: {msg}")),
                    other => other,
                })
            })
            .collect::<ReelResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Thread `initial` through every step in declared order.
    ///
    /// Source failures are logged, recorded in [`PipelineRun::source_failures`], and contribute
    /// zero frames. Any other failure aborts the run.
    #[tracing::instrument(skip_all, fields(steps = self.steps.len()))]
    pub fn run(
        &self,
        initial: FrameSequence,
        source: &mut dyn FrameSource,
    ) -> ReelResult<PipelineRun> {
        let mut sequence = initial;
        let mut source_failures = Vec::new();

        for (i, step) in self.steps.iter().enumerate() {
            tracing::info!(step = i, op = step.name(), args = %step, "applying step");
            sequence = match apply_step(sequence, step, source, &mut source_failures) {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!(step = i, op = step.name(), error = %e, "step failed");
                    return Err(e);
                }
            };
            tracing::debug!(step = i, frames = sequence.len(), "step done");
        }

        Ok(PipelineRun {
            sequence,
            source_failures,
        })
    }
}

/// Apply one step to `seq`, returning the sequence that replaces it.
pub fn apply_step(
    seq: FrameSequence,
    step: &Step,
    source: &mut dyn FrameSource,
    source_failures: &mut Vec<ReelError>,
) -> ReelResult<FrameSequence> {
    match step {
        Step::AppendVideo { path } => match source.decode_video(path) {
            Ok(frames) => {
                tracing::info!(
                    frames = frames.len(),
                    source = %path.display(),
                    "appended video frames"
                );
                Ok(seq.append(frames))
            }
            Err(e) => recover_source_failure(seq, e, source_failures),
        },
        Step::AppendImage { path } => match source.decode_image(path) {
            Ok(frame) => {
                tracing::info!(source = %path.display(), "appended image");
                Ok(seq.append([frame]))
            }
            Err(e) => recover_source_failure(seq, e, source_failures),
        },
        Step::Cut { start, count } => {
            let before = seq.len();
            let out = seq.cut(*start, *count)?;
            tracing::info!(
                start,
                count,
                removed = before - out.len(),
                remaining = out.len(),
                "cut frames"
            );
            Ok(out)
        }
        Step::Grayscale => transforms::grayscale(seq),
        Step::ToMultiChannel => transforms::to_multi_channel(seq),
        Step::Blur { kernel } => transforms::blur(seq, *kernel),
        Step::OverlayText {
            text,
            position,
            color,
        } => transforms::overlay_text(seq, text, *position, *color),
    }
}

fn recover_source_failure(
    seq: FrameSequence,
    err: ReelError,
    source_failures: &mut Vec<ReelError>,
) -> ReelResult<FrameSequence> {
    if !err.is_recoverable() {
        return Err(err);
    }
    tracing::warn!(error = %err, "source skipped");
    source_failures.push(err);
    Ok(seq)
}
