//! Background thread for text extraction, summarization and translation.
//!
//! The capabilities block on I/O, so they run on a dedicated thread. Requests
//! go in over one channel and completions come back over another; the owner
//! drains them with [`ProcessingWorker::take_one_result`] and applies them to
//! the store itself. Completions arrive in the order the jobs finish, which is
//! also the order they were submitted since the thread runs one job at a time.
//!
//! A capability that panics fails only its own job: the panic is caught on the
//! worker thread and reported as that job's error, and the thread carries on
//! with the queue.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::model::{DocumentId, SourceFile};
use crate::services::{
    ExtractionError, RegionRequest, SummarizationError, Summarizer, TextExtractor,
    TranslationError, Translator,
};

/// Identifies one submitted job.
pub type RequestId = u32;

/// Work sent to the background thread.
enum Job {
    Extract {
        doc_id: DocumentId,
        source: SourceFile,
    },
    ExtractRegion {
        doc_id: DocumentId,
        source: SourceFile,
        region: RegionRequest,
    },
    Summarize {
        doc_id: DocumentId,
        text: String,
    },
    Translate {
        text: String,
        target: String,
    },
}

/// Message sent to the worker thread.
enum ThreadMessage {
    Run(RequestId, Job),
    Shutdown,
}

/// Result of a finished job.
#[derive(Debug)]
pub enum Outcome {
    Extracted {
        doc_id: DocumentId,
        result: Result<String, ExtractionError>,
    },
    RegionExtracted {
        doc_id: DocumentId,
        result: Result<String, ExtractionError>,
    },
    Summarized {
        doc_id: DocumentId,
        result: Result<String, SummarizationError>,
    },
    Translated {
        target: String,
        result: Result<String, TranslationError>,
    },
}

/// A finished job tagged with the id returned when it was submitted.
#[derive(Debug)]
pub struct Completion {
    pub request_id: RequestId,
    pub outcome: Outcome,
}

/// The capabilities a worker thread calls into.
#[derive(Clone)]
pub struct Capabilities {
    pub extractor: Arc<dyn TextExtractor>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub translator: Option<Arc<dyn Translator>>,
}

impl Capabilities {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            extractor,
            summarizer: None,
            translator: None,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }
}

/// Owns the background processing thread.
pub struct ProcessingWorker {
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for completions from the background thread
    result_rx: Receiver<Completion>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    next_id: RequestId,
    pending: HashSet<RequestId>,
}

impl ProcessingWorker {
    /// Spawn the worker thread.
    pub fn spawn(capabilities: Capabilities) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<Completion>();

        let thread_handle = thread::Builder::new()
            .name("docmark-worker".to_string())
            .spawn(move || {
                log::info!("Processing worker thread started");
                Self::thread_loop(&capabilities, request_rx, result_tx);
                log::info!("Processing worker thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            next_id: 0,
            pending: HashSet::new(),
        })
    }

    fn thread_loop(
        capabilities: &Capabilities,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<Completion>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Run(request_id, job)) => {
                    let outcome = Self::run(capabilities, job);
                    if result_tx.send(Completion { request_id, outcome }).is_err() {
                        log::warn!("Result channel closed, worker thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, worker thread exiting");
                    break;
                }
            }
        }
    }

    fn run(capabilities: &Capabilities, job: Job) -> Outcome {
        match job {
            Job::Extract { doc_id, source } => {
                log::debug!("Extracting text for {} ({} bytes)", doc_id, source.bytes.len());
                let result = guarded(
                    "Text extraction",
                    || capabilities.extractor.extract_text(&source),
                    ExtractionError::Crashed,
                );
                Outcome::Extracted { doc_id, result }
            }
            Job::ExtractRegion {
                doc_id,
                source,
                region,
            } => {
                let result = guarded(
                    "Region extraction",
                    || capabilities.extractor.extract_region_text(&source, &region),
                    ExtractionError::Crashed,
                );
                Outcome::RegionExtracted { doc_id, result }
            }
            Job::Summarize { doc_id, text } => {
                let result = match &capabilities.summarizer {
                    Some(summarizer) => guarded(
                        "Summarization",
                        || summarizer.summarize(&text),
                        SummarizationError::Crashed,
                    ),
                    None => Err(SummarizationError::Unavailable),
                };
                Outcome::Summarized { doc_id, result }
            }
            Job::Translate { text, target } => {
                let result = match &capabilities.translator {
                    Some(translator) => guarded(
                        "Translation",
                        || translator.translate(&text, &target),
                        TranslationError::Crashed,
                    ),
                    None => Err(TranslationError::Unavailable),
                };
                Outcome::Translated { target, result }
            }
        }
    }

    fn submit(&mut self, job: Job) -> RequestId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        if self.request_tx.send(ThreadMessage::Run(id, job)).is_err() {
            log::error!("Failed to send request {}: worker channel closed", id);
        } else {
            self.pending.insert(id);
            log::debug!("Sent request {}", id);
        }
        id
    }

    /// Queue full-document text extraction.
    pub fn request_extraction(&mut self, doc_id: DocumentId, source: SourceFile) -> RequestId {
        self.submit(Job::Extract { doc_id, source })
    }

    /// Queue OCR of a region of an image document.
    pub fn request_region_text(
        &mut self,
        doc_id: DocumentId,
        source: SourceFile,
        region: RegionRequest,
    ) -> RequestId {
        self.submit(Job::ExtractRegion {
            doc_id,
            source,
            region,
        })
    }

    pub fn request_summary(&mut self, doc_id: DocumentId, text: String) -> RequestId {
        self.submit(Job::Summarize { doc_id, text })
    }

    pub fn request_translation(&mut self, text: String, target: String) -> RequestId {
        self.submit(Job::Translate { text, target })
    }

    /// Take one completed job, oldest first. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<Completion> {
        match self.result_rx.try_recv() {
            Ok(completion) => {
                self.pending.remove(&completion.request_id);
                Some(completion)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Worker thread disconnected");
                self.pending.clear();
                None
            }
        }
    }

    /// Wait up to `timeout` for the next completed job.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<Completion> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.pending.remove(&completion.request_id);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Worker thread disconnected");
                self.pending.clear();
                None
            }
        }
    }

    /// Number of submitted jobs whose completion has not been taken yet.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.pending.contains(&request_id)
    }
}

/// Run one capability call, turning a panic into `crashed(message)`.
fn guarded<T, E>(
    what: &str,
    call: impl FnOnce() -> Result<T, E>,
    crashed: impl FnOnce(String) -> E,
) -> Result<T, E> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("{} panicked: {}", what, message);
            Err(crashed(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Drop for ProcessingWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down processing worker");

        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Worker thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    struct EchoExtractor;

    impl TextExtractor for EchoExtractor {
        fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
            if source.name.starts_with("bad") {
                return Err(ExtractionError::Pdf("corrupt".to_string()));
            }
            Ok(format!("text of {}", source.name))
        }

        fn extract_region_text(
            &self,
            _source: &SourceFile,
            region: &RegionRequest,
        ) -> Result<String, ExtractionError> {
            Ok(format!("{}x{}", region.rect.width, region.rect.height))
        }
    }

    struct UpperSummarizer;

    impl Summarizer for UpperSummarizer {
        fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
            Ok(text.to_uppercase())
        }
    }

    /// Panics on files named `boom*`, echoes otherwise.
    struct FragileExtractor;

    impl TextExtractor for FragileExtractor {
        fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
            if source.name.starts_with("boom") {
                panic!("parser bug in {}", source.name);
            }
            Ok(format!("text of {}", source.name))
        }

        fn extract_region_text(
            &self,
            _source: &SourceFile,
            _region: &RegionRequest,
        ) -> Result<String, ExtractionError> {
            panic!("region parser bug");
        }
    }

    struct PanickingTranslator;

    impl Translator for PanickingTranslator {
        fn translate(&self, _text: &str, _target: &str) -> Result<String, TranslationError> {
            panic!("translator bug");
        }
    }

    fn source(name: &str) -> SourceFile {
        SourceFile::new(name, "application/pdf", vec![1, 2, 3])
    }

    fn worker() -> ProcessingWorker {
        let capabilities = Capabilities::new(Arc::new(EchoExtractor))
            .with_summarizer(Arc::new(UpperSummarizer));
        ProcessingWorker::spawn(capabilities).unwrap()
    }

    #[test]
    fn test_completions_arrive_in_submission_order() {
        let mut worker = worker();
        let doc = DocumentId::new(1);
        let first = worker.request_extraction(doc, source("a.pdf"));
        let second = worker.request_summary(doc, "brief".to_string());
        assert_eq!(worker.pending_count(), 2);

        let a = worker.wait_for_result(WAIT).unwrap();
        let b = worker.wait_for_result(WAIT).unwrap();
        assert_eq!(a.request_id, first);
        assert_eq!(b.request_id, second);
        assert!(matches!(
            a.outcome,
            Outcome::Extracted { result: Ok(ref t), .. } if t == "text of a.pdf"
        ));
        assert!(matches!(
            b.outcome,
            Outcome::Summarized { result: Ok(ref s), .. } if s == "BRIEF"
        ));
        assert_eq!(worker.pending_count(), 0);
    }

    #[test]
    fn test_extraction_failure_is_reported() {
        let mut worker = worker();
        worker.request_extraction(DocumentId::new(7), source("bad.pdf"));
        let completion = worker.wait_for_result(WAIT).unwrap();
        match completion.outcome {
            Outcome::Extracted { doc_id, result } => {
                assert_eq!(doc_id, DocumentId::new(7));
                assert!(result.is_err());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_missing_translator_reports_unavailable() {
        let mut worker = worker();
        let id = worker.request_translation("hello".to_string(), "hi".to_string());
        assert!(worker.is_pending(id));
        let completion = worker.wait_for_result(WAIT).unwrap();
        assert!(!worker.is_pending(id));
        assert!(matches!(
            completion.outcome,
            Outcome::Translated {
                result: Err(TranslationError::Unavailable),
                ..
            }
        ));
    }

    #[test]
    fn test_panicking_extractor_fails_only_its_job() {
        let capabilities = Capabilities::new(Arc::new(FragileExtractor))
            .with_translator(Arc::new(PanickingTranslator));
        let mut worker = ProcessingWorker::spawn(capabilities).unwrap();

        let boom = worker.request_extraction(DocumentId::new(1), source("boom.pdf"));
        let fine = worker.request_extraction(DocumentId::new(2), source("fine.pdf"));

        let first = worker.wait_for_result(WAIT).unwrap();
        assert_eq!(first.request_id, boom);
        match first.outcome {
            Outcome::Extracted {
                result: Err(ExtractionError::Crashed(message)),
                ..
            } => assert_eq!(message, "parser bug in boom.pdf"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let second = worker.wait_for_result(WAIT).unwrap();
        assert_eq!(second.request_id, fine);
        assert!(matches!(
            second.outcome,
            Outcome::Extracted { result: Ok(ref t), .. } if t == "text of fine.pdf"
        ));
        assert_eq!(worker.pending_count(), 0);
    }

    #[test]
    fn test_panics_in_other_jobs_are_reported() {
        let capabilities = Capabilities::new(Arc::new(FragileExtractor))
            .with_translator(Arc::new(PanickingTranslator));
        let mut worker = ProcessingWorker::spawn(capabilities).unwrap();

        let region = RegionRequest::new(crate::model::Rect::new(0.0, 0.0, 20.0, 20.0), 100.0, 100.0);
        worker.request_region_text(DocumentId::new(1), source("a.png"), region);
        worker.request_translation("hello".to_string(), "de".to_string());

        assert!(matches!(
            worker.wait_for_result(WAIT).unwrap().outcome,
            Outcome::RegionExtracted {
                result: Err(ExtractionError::Crashed(_)),
                ..
            }
        ));
        assert!(matches!(
            worker.wait_for_result(WAIT).unwrap().outcome,
            Outcome::Translated {
                result: Err(TranslationError::Crashed(ref m)),
                ..
            } if m == "translator bug"
        ));
    }

    #[test]
    fn test_take_one_result_is_non_blocking() {
        let mut worker = worker();
        assert!(worker.take_one_result().is_none());
    }
}
