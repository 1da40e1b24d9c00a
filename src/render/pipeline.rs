use std::collections::VecDeque;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::PipelineOptions;
use crate::foundation::cancel::CancellationToken;
use crate::foundation::core::Frame;
use crate::foundation::error::{LoopsmithError, LoopsmithResult, Stage};
use crate::render::stream::FrameStream;
use crate::timeline::sync::Synchronizer;

/// Per-frame transform applied by [`FrameStream::for_each`].
///
/// A processor owns the frame it receives and returns the frame that continues downstream, either
/// the same one mutated in place or a replacement.
pub trait FrameProcessor: Send + Sync {
    /// Transform one frame.
    fn process(&self, frame: Frame, cancel: &CancellationToken) -> LoopsmithResult<Frame>;
}

impl<F> FrameProcessor for F
where
    F: Fn(Frame, &CancellationToken) -> LoopsmithResult<Frame> + Send + Sync,
{
    fn process(&self, frame: Frame, cancel: &CancellationToken) -> LoopsmithResult<Frame> {
        self(frame, cancel)
    }
}

/// Merges a synchronized pair into one frame; used by [`FrameStream::zip_merge`].
///
/// The merger owns both frames and drops the second once it has taken what it needs.
pub trait FrameMerger {
    /// Merge `b` into `a`.
    fn merge(&self, a: Frame, b: Frame, cancel: &CancellationToken) -> LoopsmithResult<Frame>;
}

impl<F> FrameMerger for F
where
    F: Fn(Frame, Frame, &CancellationToken) -> LoopsmithResult<Frame>,
{
    fn merge(&self, a: Frame, b: Frame, cancel: &CancellationToken) -> LoopsmithResult<Frame> {
        self(a, b, cancel)
    }
}

impl<'a> FrameStream<'a> {
    /// Apply `processor` to every frame.
    ///
    /// Frames are pulled in chunks of `options.chunk_size`. With `options.parallel` a chunk is
    /// processed on a rayon pool, so completions may come back in any order; each chunk is sorted
    /// by frame index before it is yielded, which keeps the output ascending as long as the input
    /// was.
    pub fn for_each<P>(
        self,
        processor: P,
        options: &PipelineOptions,
        cancel: &CancellationToken,
    ) -> FrameStream<'a>
    where
        P: FrameProcessor + 'a,
    {
        if let Err(e) = options.validate() {
            return FrameStream::new(std::iter::once(Err(e)));
        }
        let pool = if options.parallel {
            match build_thread_pool(options.threads) {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => return FrameStream::new(std::iter::once(Err(e))),
            }
        } else {
            None
        };
        FrameStream::new(ApplyStage {
            upstream: self,
            processor,
            cancel: cancel.clone(),
            chunk_size: normalized_chunk_size(options.chunk_size),
            pool,
            ready: VecDeque::new(),
            done: false,
        })
    }

    /// Pair this stream with another sequence through `sync` and merge each pair with `merger`.
    ///
    /// Synchronization runs on the first pull, since it needs both sequences in full.
    pub fn zip_merge<S, M>(self, sync: S, merger: M, cancel: &CancellationToken) -> FrameStream<'a>
    where
        S: Synchronizer + 'a,
        M: FrameMerger + 'a,
    {
        let cancel = cancel.clone();
        let mut pending = Some((self, sync));
        let mut pairs: Option<std::vec::IntoIter<(Frame, Frame)>> = None;
        FrameStream::new(std::iter::from_fn(move || {
            if let Some((first, sync)) = pending.take() {
                match sync.synchronize(first, &cancel) {
                    Ok(p) => pairs = Some(p.into_iter()),
                    Err(e) => return Some(Err(e)),
                }
            }
            let (a, b) = pairs.as_mut()?.next()?;
            if let Err(e) = cancel.check(Stage::Pipeline) {
                return Some(Err(e));
            }
            Some(merger.merge(a, b, &cancel))
        }))
    }
}

struct ApplyStage<'a, P> {
    upstream: FrameStream<'a>,
    processor: P,
    cancel: CancellationToken,
    chunk_size: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
    ready: VecDeque<Frame>,
    done: bool,
}

impl<P: FrameProcessor> ApplyStage<'_, P> {
    fn fill(&mut self) -> LoopsmithResult<()> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            self.cancel.check(Stage::Pipeline)?;
            match self.upstream.next() {
                Some(frame) => chunk.push(frame?),
                None => break,
            }
        }
        if chunk.is_empty() {
            self.done = true;
            return Ok(());
        }

        let processor = &self.processor;
        let cancel = &self.cancel;
        let results: Vec<LoopsmithResult<Frame>> = match self.pool.as_deref() {
            Some(pool) => pool.install(|| {
                chunk
                    .into_par_iter()
                    .map(|frame| {
                        cancel.check(Stage::Pipeline)?;
                        processor.process(frame, cancel)
                    })
                    .collect()
            }),
            None => chunk
                .into_iter()
                .map(|frame| processor.process(frame, cancel))
                .collect(),
        };

        let mut processed = results.into_iter().collect::<LoopsmithResult<Vec<Frame>>>()?;
        processed.sort_by_key(|f| f.index);
        self.ready.extend(processed);
        Ok(())
    }
}

impl<P: FrameProcessor> Iterator for ApplyStage<'_, P> {
    type Item = LoopsmithResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.ready.is_empty() {
            return None;
        }
        if let Err(e) = self.cancel.check(Stage::Pipeline) {
            self.done = true;
            self.ready.clear();
            return Some(Err(e));
        }
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Some(Ok(frame));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> LoopsmithResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LoopsmithError::upstream(Stage::Pipeline, e))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    if chunk_size == 0 { 1 } else { chunk_size }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
