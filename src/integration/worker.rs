//! Detector running on its own thread so a slow call cannot stall a cycle.

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use tracing::{debug, warn};

use crate::error::DetectorError;
use crate::integration::detector::DetectionSource;
use crate::integration::frame::Frame;
use crate::tracker::Detection;

type Reply = Result<Vec<Detection>, DetectorError>;

struct Request {
    frame: Frame,
    deadline: Instant,
    reply: Sender<Reply>,
}

/// Owns a detector on a dedicated thread and bounds each call by a timeout.
///
/// At most one request waits behind the one being served; further calls
/// fail with [`DetectorError::Busy`]. Requests whose caller has already
/// timed out are skipped, and late replies are discarded.
pub struct DetectorWorker {
    name: String,
    timeout: Duration,
    requests: Option<Sender<Request>>,
    handle: Option<JoinHandle<()>>,
}

impl DetectorWorker {
    pub fn spawn<D>(name: impl Into<String>, detector: D, timeout: Duration) -> io::Result<Self>
    where
        D: DetectionSource + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = bounded::<Request>(1);
        let thread_name = format!("{name}-detector");
        let label = name.clone();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || serve(&label, detector, rx))?;

        Ok(Self {
            name,
            timeout,
            requests: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the detector on `frame`, waiting at most the configured timeout.
    pub fn detect(&self, frame: Frame) -> Result<Vec<Detection>, DetectorError> {
        let requests = self.requests.as_ref().ok_or(DetectorError::Disconnected)?;
        let (reply_tx, reply_rx) = bounded(1);
        let request = Request {
            frame,
            deadline: Instant::now() + self.timeout,
            reply: reply_tx,
        };
        requests.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => DetectorError::Busy,
            TrySendError::Disconnected(_) => DetectorError::Disconnected,
        })?;

        match reply_rx.recv_timeout(self.timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => Err(DetectorError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(DetectorError::Disconnected),
        }
    }

    /// Close the request queue and wait for the detector thread to finish
    /// its current call.
    pub fn shutdown(mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(detector = %self.name, "detector thread panicked");
            }
        }
    }
}

impl Drop for DetectorWorker {
    fn drop(&mut self) {
        // The thread exits on its own once the queue is closed; a detector
        // stuck in a call must not block the caller here.
        self.requests.take();
    }
}

impl fmt::Debug for DetectorWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorWorker")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn serve<D: DetectionSource>(name: &str, mut detector: D, requests: Receiver<Request>) {
    for request in requests {
        if Instant::now() >= request.deadline {
            debug!(detector = %name, "skipping request whose caller gave up");
            continue;
        }
        let started = Instant::now();
        let reply = detector
            .detect(&request.frame)
            .map_err(|err| DetectorError::Backend(err.to_string()));
        debug!(
            detector = %name,
            latency_ms = started.elapsed().as_millis() as u64,
            ok = reply.is_ok(),
            "detector call finished"
        );
        // The caller may have timed out and dropped its receiver.
        let _ = request.reply.send(reply);
    }
    debug!(detector = %name, "detector worker stopped");
}
