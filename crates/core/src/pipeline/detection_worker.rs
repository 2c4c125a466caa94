//! Background face detection.
//!
//! Frames are handed to a pool of worker threads, each owning its own
//! detector. Results come back as [`DetectionCompletion`]s on a channel the
//! render thread selects on. Workers never see overlay state.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::detection_error::DetectionError;
use crate::detection::domain::face_detector::{DetectionRequest, FaceDetector};
use crate::detection::domain::face_observation::FaceObservation;
use crate::pipeline::pipeline_error::PipelineError;
use crate::shared::constants::DETECTION_QUEUE_PER_WORKER;
use crate::shared::frame::Frame;

pub struct DetectionJob {
    pub sequence: u64,
    pub frame: Frame,
    pub request: DetectionRequest,
}

#[derive(Debug)]
pub struct DetectionCompletion {
    pub sequence: u64,
    pub outcome: Result<Vec<FaceObservation>, DetectionError>,
    pub elapsed: Duration,
}

/// Cloneable, `Send` handle for queueing frames from any thread.
#[derive(Clone)]
pub struct DetectionSubmitter {
    job_tx: Sender<DetectionJob>,
    next_sequence: Arc<AtomicU64>,
    skipped: Arc<AtomicUsize>,
}

impl DetectionSubmitter {
    /// Queues `frame` without blocking. Returns its sequence number, or
    /// `None` when every worker is busy and the queue is full; the frame is
    /// then skipped rather than delaying capture.
    pub fn submit(&self, frame: Frame, request: DetectionRequest) -> Option<u64> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let job = DetectionJob {
            sequence,
            frame,
            request,
        };
        match self.job_tx.try_send(job) {
            Ok(()) => Some(sequence),
            Err(TrySendError::Full(_)) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Detection queue full, skipping generation {sequence}");
                None
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Detection workers have stopped");
                None
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
}

pub struct DetectionWorkerPool {
    submitter: Option<DetectionSubmitter>,
    completion_rx: Receiver<DetectionCompletion>,
    handles: Vec<JoinHandle<()>>,
}

impl DetectionWorkerPool {
    /// Starts one worker thread per detector.
    pub fn spawn(detectors: Vec<Box<dyn FaceDetector>>) -> Result<Self, PipelineError> {
        if detectors.is_empty() {
            return Err(PipelineError::NoDetectors);
        }

        let capacity = DETECTION_QUEUE_PER_WORKER * detectors.len();
        let (job_tx, job_rx) = crossbeam_channel::bounded::<DetectionJob>(capacity);
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();

        let handles = detectors
            .into_iter()
            .enumerate()
            .map(|(worker, detector)| {
                spawn_worker(worker, detector, job_rx.clone(), completion_tx.clone())
            })
            .collect::<Vec<_>>();
        log::debug!("Started {} detection worker(s)", handles.len());

        Ok(Self {
            submitter: Some(DetectionSubmitter {
                job_tx,
                next_sequence: Arc::new(AtomicU64::new(0)),
                skipped: Arc::new(AtomicUsize::new(0)),
            }),
            completion_rx,
            handles,
        })
    }

    pub fn submitter(&self) -> Option<DetectionSubmitter> {
        self.submitter.clone()
    }

    pub fn submit(&self, frame: Frame, request: DetectionRequest) -> Option<u64> {
        self.submitter.as_ref()?.submit(frame, request)
    }

    pub fn completions(&self) -> &Receiver<DetectionCompletion> {
        &self.completion_rx
    }

    /// Frames skipped so far because the queue was full.
    pub fn skipped(&self) -> usize {
        self.submitter.as_ref().map_or(0, |s| s.skipped())
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Stops accepting jobs and waits for in-flight detections to finish.
    pub fn shutdown(&mut self) -> Result<(), PipelineError> {
        self.submitter = None;
        let mut panicked = false;
        for handle in self.handles.drain(..) {
            panicked |= handle.join().is_err();
        }
        if panicked {
            Err(PipelineError::ThreadPanicked("detection worker"))
        } else {
            Ok(())
        }
    }
}

impl Drop for DetectionWorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("{e}");
        }
    }
}

fn spawn_worker(
    worker: usize,
    mut detector: Box<dyn FaceDetector>,
    job_rx: Receiver<DetectionJob>,
    completion_tx: Sender<DetectionCompletion>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in job_rx {
            let start = Instant::now();
            let outcome = detector.detect(&job.frame, &job.request);
            let completion = DetectionCompletion {
                sequence: job.sequence,
                outcome,
                elapsed: start.elapsed(),
            };
            if completion_tx.send(completion).is_err() {
                break;
            }
        }
        log::trace!("Detection worker {worker} exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::normalized_rect::NormalizedRect;
    use std::sync::Mutex;

    struct CountingDetector {
        faces: usize,
    }

    impl FaceDetector for CountingDetector {
        fn detect(
            &mut self,
            frame: &Frame,
            _request: &DetectionRequest,
        ) -> Result<Vec<FaceObservation>, DetectionError> {
            if frame.is_empty() {
                return Err(DetectionError::InvalidFrame);
            }
            Ok((0..self.faces)
                .map(|_| FaceObservation::new(NormalizedRect::new(0.1, 0.1, 0.2, 0.2), 0.9))
                .collect())
        }
    }

    /// Blocks every detection until the test releases the gate.
    struct GatedDetector {
        gate: Arc<Mutex<()>>,
    }

    impl FaceDetector for GatedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
            _request: &DetectionRequest,
        ) -> Result<Vec<FaceObservation>, DetectionError> {
            let _guard = self.gate.lock().unwrap();
            Ok(Vec::new())
        }
    }

    fn frame() -> Frame {
        Frame::filled(4, 4, [10, 20, 30], 0)
    }

    #[test]
    fn test_spawn_requires_a_detector() {
        assert!(matches!(
            DetectionWorkerPool::spawn(Vec::new()),
            Err(PipelineError::NoDetectors)
        ));
    }

    #[test]
    fn test_completion_carries_sequence_and_result() {
        let pool = DetectionWorkerPool::spawn(vec![Box::new(CountingDetector { faces: 2 })]).unwrap();
        let seq = pool.submit(frame(), DetectionRequest::faces()).unwrap();

        let completion = pool.completions().recv().unwrap();
        assert_eq!(completion.sequence, seq);
        assert_eq!(completion.outcome.unwrap().len(), 2);
    }

    #[test]
    fn test_detector_errors_are_delivered() {
        let pool = DetectionWorkerPool::spawn(vec![Box::new(CountingDetector { faces: 1 })]).unwrap();
        pool.submit(Frame::new(Vec::new(), 0, 0, 3, 0), DetectionRequest::faces());

        let completion = pool.completions().recv().unwrap();
        assert!(matches!(completion.outcome, Err(DetectionError::InvalidFrame)));
    }

    #[test]
    fn test_sequences_are_monotonic() {
        let pool = DetectionWorkerPool::spawn(vec![
            Box::new(CountingDetector { faces: 0 }),
            Box::new(CountingDetector { faces: 0 }),
        ])
        .unwrap();
        assert_eq!(pool.worker_count(), 2);

        let mut seqs = Vec::new();
        for _ in 0..3 {
            if let Some(s) = pool.submit(frame(), DetectionRequest::faces()) {
                seqs.push(s);
            }
            pool.completions().recv().unwrap();
        }
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_full_queue_skips_frames() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();
        let pool = DetectionWorkerPool::spawn(vec![Box::new(GatedDetector { gate: gate.clone() })])
            .unwrap();

        // One job in the blocked worker plus a full queue; the rest are skipped
        let total = DETECTION_QUEUE_PER_WORKER + 5;
        let accepted = (0..total)
            .filter_map(|_| pool.submit(frame(), DetectionRequest::faces()))
            .count();
        assert!(accepted <= DETECTION_QUEUE_PER_WORKER + 1);
        assert_eq!(pool.skipped(), total - accepted);

        drop(held);
        for _ in 0..accepted {
            pool.completions().recv().unwrap();
        }
    }

    #[test]
    fn test_submitter_works_from_another_thread() {
        let pool = DetectionWorkerPool::spawn(vec![Box::new(CountingDetector { faces: 1 })]).unwrap();
        let submitter = pool.submitter().unwrap();
        std::thread::spawn(move || submitter.submit(frame(), DetectionRequest::faces()))
            .join()
            .unwrap();
        assert!(pool.completions().recv().unwrap().outcome.is_ok());
    }

    #[test]
    fn test_shutdown_stops_submissions() {
        let mut pool =
            DetectionWorkerPool::spawn(vec![Box::new(CountingDetector { faces: 1 })]).unwrap();
        pool.shutdown().unwrap();
        assert!(pool.submit(frame(), DetectionRequest::faces()).is_none());
    }
}
