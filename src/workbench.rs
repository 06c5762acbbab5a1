//! The workbench: a document store driven by a background processing worker.
//!
//! Capabilities never touch the store. Their results come back through
//! [`Workbench::pump`] and are applied as ordinary store mutations, so a result
//! for a document that was removed in the meantime is simply a no-op.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::constants::{DEFAULT_TRANSLATION_TARGET, EXTRACTION_ERROR_TEXT};
use crate::model::{DocumentId, Rect, SourceFile, is_supported_content_type};
use crate::services::{GeminiSummarizer, LibreTranslator, LocalExtractor, RegionRequest};
use crate::store::DocumentStore;
use crate::worker::{Capabilities, Completion, Outcome, ProcessingWorker, RequestId};

/// Something the user should hear about after a [`Workbench::pump`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkbenchEvent {
    /// Extraction finished and the text was stored
    TextExtracted { doc_id: DocumentId },
    /// Extraction failed; the placeholder text was stored
    ExtractionFailed { doc_id: DocumentId, message: String },
    SummaryReady { doc_id: DocumentId },
    SummaryFailed { doc_id: DocumentId, message: String },
    /// OCR of a selected region, not stored on the document
    RegionText { doc_id: DocumentId, text: String },
    RegionTextFailed { doc_id: DocumentId, message: String },
    /// Translated text, not stored on the document
    Translated { target: String, text: String },
    TranslationFailed { target: String, message: String },
}

/// Result of [`Workbench::add_files`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AddedFiles {
    /// Ids of the documents created, in input order
    pub added: Vec<DocumentId>,
    /// Names of files skipped because of their content type
    pub rejected: Vec<String>,
}

/// A [`DocumentStore`] whose documents are processed on a background worker.
///
/// Jobs are queued by [`add_files`](Self::add_files) and the `request_*`
/// methods; their results only reach the store when the owner calls
/// [`pump`](Self::pump) or [`run_until_idle`](Self::run_until_idle).
pub struct Workbench {
    store: DocumentStore,
    worker: ProcessingWorker,
    /// Language used by [`request_translation_default`](Self::request_translation_default)
    translation_target: String,
}

impl Workbench {
    pub fn new(store: DocumentStore, capabilities: Capabilities) -> std::io::Result<Self> {
        Ok(Self {
            store,
            worker: ProcessingWorker::spawn(capabilities)?,
            translation_target: DEFAULT_TRANSLATION_TARGET.to_string(),
        })
    }

    /// Use `target` for translations that do not name a language.
    pub fn with_translation_target(mut self, target: impl Into<String>) -> Self {
        self.translation_target = target.into();
        self
    }

    /// Build the store and the default capabilities from configuration.
    ///
    /// Summarization is left out when no API key is available.
    pub fn from_config(config: &AppConfig) -> std::io::Result<Self> {
        let store = DocumentStore::with_config(config.preferences.history_config());
        let mut capabilities = Capabilities::new(Arc::new(LocalExtractor::from_config(&config.ocr)));

        match GeminiSummarizer::from_config(&config.summarizer) {
            Ok(summarizer) => capabilities = capabilities.with_summarizer(Arc::new(summarizer)),
            Err(e) => log::warn!("Summaries disabled: {}", e),
        }
        match LibreTranslator::from_config(&config.translator) {
            Ok(translator) => capabilities = capabilities.with_translator(Arc::new(translator)),
            Err(e) => log::warn!("Translation disabled: {}", e),
        }

        Ok(Self::new(store, capabilities)?
            .with_translation_target(config.translator.default_target.clone()))
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Direct access for user edits (text, annotations, selection, undo).
    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    /// Add the supported files and queue text extraction for each.
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> AddedFiles {
        let (accepted, rejected): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|f| is_supported_content_type(&f.content_type));

        let rejected: Vec<String> = rejected
            .into_iter()
            .map(|f| {
                log::warn!("Skipping '{}': unsupported type {}", f.name, f.content_type);
                f.name
            })
            .collect();

        let sources = accepted.clone();
        let added = self.store.add_documents(accepted);
        for (doc_id, source) in added.iter().copied().zip(sources) {
            self.worker.request_extraction(doc_id, source);
        }

        AddedFiles { added, rejected }
    }

    /// Queue a summary of the document's current text.
    pub fn request_summary(&mut self, doc_id: DocumentId) -> Option<RequestId> {
        let text = self.store.document(doc_id)?.text.clone();
        Some(self.worker.request_summary(doc_id, text))
    }

    /// Queue OCR of a region of an image document.
    ///
    /// `rect` is in the coordinates of a preview displayed at
    /// `displayed_width` x `displayed_height`.
    pub fn request_region_text(
        &mut self,
        doc_id: DocumentId,
        rect: Rect,
        displayed_width: f32,
        displayed_height: f32,
    ) -> Option<RequestId> {
        let document = self.store.document(doc_id)?;
        if !document.is_image() {
            log::debug!("Region text requested on non-image {}", doc_id);
            return None;
        }
        let source = document.source.clone();
        let region = RegionRequest::new(rect, displayed_width, displayed_height);
        Some(self.worker.request_region_text(doc_id, source, region))
    }

    pub fn request_translation(
        &mut self,
        text: impl Into<String>,
        target: impl Into<String>,
    ) -> RequestId {
        self.worker.request_translation(text.into(), target.into())
    }

    /// Queue a translation into the configured default language.
    pub fn request_translation_default(&mut self, text: impl Into<String>) -> RequestId {
        let target = self.translation_target.clone();
        self.request_translation(text, target)
    }

    pub fn translation_target(&self) -> &str {
        &self.translation_target
    }

    /// True when no submitted job is outstanding.
    pub fn is_idle(&self) -> bool {
        self.worker.pending_count() == 0
    }

    /// Apply every completion that has arrived so far, in arrival order.
    pub fn pump(&mut self) -> Vec<WorkbenchEvent> {
        let mut events = Vec::new();
        while let Some(completion) = self.worker.take_one_result() {
            events.extend(self.apply(completion));
        }
        events
    }

    /// Block until every outstanding job has completed, applying results as
    /// they arrive. Stops early if nothing completes within `timeout`.
    pub fn run_until_idle(&mut self, timeout: Duration) -> Vec<WorkbenchEvent> {
        let mut events = Vec::new();
        while !self.is_idle() {
            match self.worker.wait_for_result(timeout) {
                Some(completion) => events.extend(self.apply(completion)),
                None => {
                    log::warn!(
                        "Gave up waiting with {} job(s) outstanding",
                        self.worker.pending_count()
                    );
                    break;
                }
            }
        }
        events
    }

    fn apply(&mut self, completion: Completion) -> Option<WorkbenchEvent> {
        match completion.outcome {
            Outcome::Extracted { doc_id, result } => {
                let (text, event) = match result {
                    Ok(text) => (text, WorkbenchEvent::TextExtracted { doc_id }),
                    Err(e) => {
                        log::error!("Error processing {}: {}", doc_id, e);
                        (
                            EXTRACTION_ERROR_TEXT.to_string(),
                            WorkbenchEvent::ExtractionFailed {
                                doc_id,
                                message: e.to_string(),
                            },
                        )
                    }
                };
                if self.store.update_text(doc_id, text) {
                    Some(event)
                } else {
                    log::debug!("Discarded extraction result for removed {}", doc_id);
                    None
                }
            }
            Outcome::Summarized { doc_id, result } => match result {
                Ok(summary) => {
                    if self.store.update_summary(doc_id, summary) {
                        Some(WorkbenchEvent::SummaryReady { doc_id })
                    } else {
                        log::debug!("Discarded summary for removed {}", doc_id);
                        None
                    }
                }
                Err(e) => {
                    log::warn!("Summary of {} failed: {}", doc_id, e);
                    Some(WorkbenchEvent::SummaryFailed {
                        doc_id,
                        message: e.to_string(),
                    })
                }
            },
            Outcome::RegionExtracted { doc_id, result } => Some(match result {
                Ok(text) => WorkbenchEvent::RegionText { doc_id, text },
                Err(e) => {
                    log::warn!("Region OCR on {} failed: {}", doc_id, e);
                    WorkbenchEvent::RegionTextFailed {
                        doc_id,
                        message: e.to_string(),
                    }
                }
            }),
            Outcome::Translated { target, result } => Some(match result {
                Ok(text) => WorkbenchEvent::Translated { target, text },
                Err(e) => {
                    log::warn!("Translation to {} failed: {}", target, e);
                    WorkbenchEvent::TranslationFailed {
                        target,
                        message: e.to_string(),
                    }
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        ExtractionError, SummarizationError, Summarizer, TextExtractor, TranslationError,
        Translator,
    };
    use std::sync::{Condvar, Mutex};

    const WAIT: Duration = Duration::from_secs(5);

    /// Extractor that returns the file bytes as text, failing on `bad*` names.
    struct BytesAsText;

    impl TextExtractor for BytesAsText {
        fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
            if source.name.starts_with("bad") {
                return Err(ExtractionError::Ocr("unreadable".to_string()));
            }
            Ok(String::from_utf8_lossy(&source.bytes).into_owned())
        }

        fn extract_region_text(
            &self,
            _source: &SourceFile,
            region: &RegionRequest,
        ) -> Result<String, ExtractionError> {
            Ok(format!("region {}", region.rect.width))
        }
    }

    /// Extractor that blocks until the test opens the gate.
    struct GatedExtractor {
        gate: Arc<(Mutex<bool>, Condvar)>,
    }

    impl TextExtractor for GatedExtractor {
        fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
            let (lock, cvar) = &*self.gate;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
            Ok(String::from_utf8_lossy(&source.bytes).into_owned())
        }

        fn extract_region_text(
            &self,
            _source: &SourceFile,
            _region: &RegionRequest,
        ) -> Result<String, ExtractionError> {
            Err(ExtractionError::EmptyRegion)
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _text: &str) -> Result<String, SummarizationError> {
            Err(SummarizationError::Quota)
        }
    }

    struct ShortSummarizer;

    impl Summarizer for ShortSummarizer {
        fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
            Ok(text.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
        }
    }

    /// Extractor with a parser bug on `boom*` files.
    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
            if source.name.starts_with("boom") {
                panic!("parser bug");
            }
            Ok(String::from_utf8_lossy(&source.bytes).into_owned())
        }

        fn extract_region_text(
            &self,
            _source: &SourceFile,
            _region: &RegionRequest,
        ) -> Result<String, ExtractionError> {
            Err(ExtractionError::EmptyRegion)
        }
    }

    struct ReverseTranslator;

    impl Translator for ReverseTranslator {
        fn translate(&self, text: &str, _target: &str) -> Result<String, TranslationError> {
            Ok(text.chars().rev().collect())
        }
    }

    fn pdf(name: &str, text: &str) -> SourceFile {
        SourceFile::new(name, "application/pdf", text.as_bytes().to_vec())
    }

    fn png(name: &str) -> SourceFile {
        SourceFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn workbench(capabilities: Capabilities) -> Workbench {
        Workbench::new(DocumentStore::new(), capabilities).unwrap()
    }

    #[test]
    fn test_add_files_extracts_text() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        let result = wb.add_files(vec![pdf("a.pdf", "alpha"), pdf("b.pdf", "beta")]);
        assert_eq!(result.added.len(), 2);
        assert!(result.rejected.is_empty());
        assert!(wb.store().documents().iter().all(|d| d.is_processing));

        let events = wb.run_until_idle(WAIT);
        assert_eq!(events.len(), 2);
        assert!(wb.is_idle());

        let docs = wb.store().documents();
        assert_eq!(docs[0].text, "alpha");
        assert_eq!(docs[1].text, "beta");
        assert!(docs.iter().all(|d| !d.is_processing));
        // One commit for the add, one per extraction
        assert_eq!(wb.store().undo_count(), 3);
    }

    #[test]
    fn test_unsupported_files_are_rejected() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        let result = wb.add_files(vec![
            SourceFile::new("notes.txt", "text/plain", b"x".to_vec()),
            pdf("a.pdf", "alpha"),
        ]);
        assert_eq!(result.rejected, vec!["notes.txt".to_string()]);
        assert_eq!(result.added.len(), 1);
        assert_eq!(wb.store().documents().len(), 1);
    }

    #[test]
    fn test_only_unsupported_files_commit_nothing() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        let result = wb.add_files(vec![SourceFile::new("a.txt", "text/plain", vec![])]);
        assert!(result.added.is_empty());
        assert!(!wb.store().can_undo());
        assert!(wb.is_idle());
    }

    #[test]
    fn test_extraction_failure_stores_placeholder() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        let id = wb.add_files(vec![pdf("bad.pdf", "")]).added[0];

        let events = wb.run_until_idle(WAIT);
        assert!(matches!(
            events.as_slice(),
            [WorkbenchEvent::ExtractionFailed { doc_id, .. }] if *doc_id == id
        ));
        let doc = wb.store().document(id).unwrap();
        assert_eq!(doc.text, EXTRACTION_ERROR_TEXT);
        assert!(!doc.is_processing);
    }

    #[test]
    fn test_extractor_panic_stores_placeholder_and_queue_continues() {
        let mut wb = workbench(Capabilities::new(Arc::new(PanickingExtractor)));
        let added = wb
            .add_files(vec![pdf("boom.pdf", "never read"), pdf("fine.pdf", "fine text")])
            .added;

        let events = wb.run_until_idle(WAIT);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            WorkbenchEvent::ExtractionFailed { doc_id, message }
                if *doc_id == added[0] && message.contains("parser bug")
        ));
        assert_eq!(events[1], WorkbenchEvent::TextExtracted { doc_id: added[1] });
        assert!(wb.is_idle());

        let boom = wb.store().document(added[0]).unwrap();
        assert_eq!(boom.text, EXTRACTION_ERROR_TEXT);
        assert!(!boom.is_processing);
        let fine = wb.store().document(added[1]).unwrap();
        assert_eq!(fine.text, "fine text");
        assert!(!fine.is_processing);
    }

    #[test]
    fn test_result_for_removed_document_is_discarded() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let extractor = GatedExtractor { gate: gate.clone() };
        let mut wb = workbench(Capabilities::new(Arc::new(extractor)));

        let id = wb.add_files(vec![pdf("a.pdf", "late")]).added[0];
        assert!(wb.store_mut().remove_document(id));
        let undo_before = wb.store().undo_count();

        {
            let (lock, cvar) = &*gate;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        let events = wb.run_until_idle(WAIT);
        assert!(events.is_empty());
        assert!(wb.store().documents().is_empty());
        assert_eq!(wb.store().undo_count(), undo_before);
    }

    #[test]
    fn test_summary_is_stored() {
        let capabilities =
            Capabilities::new(Arc::new(BytesAsText)).with_summarizer(Arc::new(ShortSummarizer));
        let mut wb = workbench(capabilities);
        let id = wb.add_files(vec![pdf("a.pdf", "one two three four")]).added[0];
        wb.run_until_idle(WAIT);

        assert!(wb.request_summary(id).is_some());
        let events = wb.run_until_idle(WAIT);
        assert_eq!(events, vec![WorkbenchEvent::SummaryReady { doc_id: id }]);
        assert_eq!(wb.store().document(id).unwrap().summary, "one two");
    }

    #[test]
    fn test_summary_failure_is_notice_only() {
        let capabilities =
            Capabilities::new(Arc::new(BytesAsText)).with_summarizer(Arc::new(FailingSummarizer));
        let mut wb = workbench(capabilities);
        let id = wb.add_files(vec![pdf("a.pdf", "text")]).added[0];
        wb.run_until_idle(WAIT);
        let undo_before = wb.store().undo_count();

        wb.request_summary(id);
        let events = wb.run_until_idle(WAIT);
        assert!(matches!(events.as_slice(), [WorkbenchEvent::SummaryFailed { .. }]));
        assert_eq!(wb.store().document(id).unwrap().summary, "");
        assert_eq!(wb.store().undo_count(), undo_before);
    }

    #[test]
    fn test_summary_of_unknown_document() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        assert!(wb.request_summary(DocumentId::new(99)).is_none());
    }

    #[test]
    fn test_region_text_is_transient() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        let added = wb.add_files(vec![png("scan.png"), pdf("a.pdf", "text")]).added;
        wb.run_until_idle(WAIT);
        let undo_before = wb.store().undo_count();

        let rect = Rect::new(0.0, 0.0, 25.0, 25.0);
        assert!(wb.request_region_text(added[1], rect, 100.0, 100.0).is_none());
        assert!(wb.request_region_text(added[0], rect, 100.0, 100.0).is_some());

        let events = wb.run_until_idle(WAIT);
        assert_eq!(
            events,
            vec![WorkbenchEvent::RegionText {
                doc_id: added[0],
                text: "region 25".to_string(),
            }]
        );
        assert_eq!(wb.store().undo_count(), undo_before);
    }

    #[test]
    fn test_translation() {
        let capabilities =
            Capabilities::new(Arc::new(BytesAsText)).with_translator(Arc::new(ReverseTranslator));
        let mut wb = workbench(capabilities);
        wb.request_translation("abc", "hi");
        let events = wb.run_until_idle(WAIT);
        assert_eq!(
            events,
            vec![WorkbenchEvent::Translated {
                target: "hi".to_string(),
                text: "cba".to_string(),
            }]
        );
    }

    #[test]
    fn test_translation_to_default_target() {
        let capabilities =
            Capabilities::new(Arc::new(BytesAsText)).with_translator(Arc::new(ReverseTranslator));
        let mut wb = workbench(capabilities);
        assert_eq!(wb.translation_target(), DEFAULT_TRANSLATION_TARGET);

        wb.request_translation_default("abc");
        let events = wb.run_until_idle(WAIT);
        assert_eq!(
            events,
            vec![WorkbenchEvent::Translated {
                target: DEFAULT_TRANSLATION_TARGET.to_string(),
                text: "cba".to_string(),
            }]
        );
    }

    #[test]
    fn test_configured_translation_target() {
        let mut config = AppConfig::new();
        config.translator.default_target = "de".to_string();
        let store = DocumentStore::with_config(config.preferences.history_config());
        let capabilities =
            Capabilities::new(Arc::new(BytesAsText)).with_translator(Arc::new(ReverseTranslator));
        let mut wb = Workbench::new(store, capabilities)
            .unwrap()
            .with_translation_target(config.translator.default_target.clone());

        wb.request_translation_default("xy");
        let events = wb.run_until_idle(WAIT);
        assert_eq!(
            events,
            vec![WorkbenchEvent::Translated {
                target: "de".to_string(),
                text: "yx".to_string(),
            }]
        );
    }

    #[test]
    fn test_translation_without_translator() {
        let mut wb = workbench(Capabilities::new(Arc::new(BytesAsText)));
        wb.request_translation("abc", "hi");
        let events = wb.run_until_idle(WAIT);
        assert!(matches!(
            events.as_slice(),
            [WorkbenchEvent::TranslationFailed { .. }]
        ));
    }
}
