use anyhow::Result;

use crate::gateway::ExtractionGateway;
use crate::models::{JobRecord, JobStatus};
use crate::resolver;
use crate::store::RecordStore;

/// One capture attempt's input, already reduced to the extraction path it
/// selects.
pub enum CaptureSource {
    UrlAdvanced { url: String },
    UrlBasic { url: String },
    Text { text: String, url: Option<String> },
    Image { base64: String },
}

/// Field changes collected from the edit command. Unset fields keep their
/// current value; `id` and `date_captured` can never be changed.
#[derive(Debug, Default)]
pub struct EditPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
}

impl EditPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.salary.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.status.is_none()
    }
}

/// Orchestrates capture, edit and delete against the record store. Capture
/// attempts are independent; the same URL captured twice yields two records.
pub struct App {
    store: RecordStore,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Run one capture attempt end to end: pick the extraction path, merge
    /// the result onto defaults, append and persist. Only the advanced-URL
    /// and image paths can fail.
    pub fn capture(
        &mut self,
        gateway: &dyn ExtractionGateway,
        source: CaptureSource,
    ) -> Result<JobRecord> {
        let (url, extracted) = match source {
            CaptureSource::UrlAdvanced { url } => {
                let extracted = gateway.extract_from_url_advanced(&url)?;
                (url, extracted)
            }
            CaptureSource::UrlBasic { url } => {
                let hint = resolver::identify_company(&url);
                let extracted = gateway.extract_from_url_basic(&url, hint.as_deref());
                (url, extracted)
            }
            CaptureSource::Text { text, url } => {
                let hint = url
                    .as_deref()
                    .and_then(|u| resolver::identify_company(u));
                let extracted = gateway.extract_text(&text, hint.as_deref());
                (url.unwrap_or_default(), extracted)
            }
            CaptureSource::Image { base64 } => {
                let extracted = gateway.extract_image(&base64)?;
                (String::new(), extracted)
            }
        };

        let record = JobRecord::from_extraction(&url, extracted);
        self.store.append(record.clone())?;
        Ok(record)
    }

    /// Apply a patch as a full-record replacement. Returns the edited record,
    /// or None when the id is unknown.
    pub fn edit(&mut self, id: &str, patch: EditPatch) -> Result<Option<JobRecord>> {
        let Some(existing) = self.store.find(id) else {
            return Ok(None);
        };
        let mut edited = existing.clone();
        if let Some(title) = patch.title {
            edited.title = title;
        }
        if let Some(company) = patch.company {
            edited.company = company;
        }
        if let Some(location) = patch.location {
            edited.location = location;
        }
        if let Some(salary) = patch.salary {
            edited.salary = salary;
        }
        if let Some(url) = patch.url {
            edited.url = url;
        }
        if let Some(description) = patch.description {
            edited.description = description;
        }
        if let Some(status) = patch.status {
            edited.status = status;
        }
        self.store.replace(edited.clone())?;
        Ok(Some(edited))
    }

    /// Irreversible; the caller is responsible for user confirmation.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        self.store.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionResult, DEFAULT_COMPANY, DEFAULT_TITLE};
    use crate::store::testing::MemoryStore;
    use anyhow::anyhow;
    use std::cell::RefCell;

    #[derive(Default)]
    struct StubGateway {
        result: ExtractionResult,
        fail_advanced: bool,
        fail_image: bool,
        last_hint: RefCell<Option<String>>,
    }

    impl ExtractionGateway for StubGateway {
        fn extract_from_url_advanced(&self, _url: &str) -> Result<ExtractionResult> {
            if self.fail_advanced {
                return Err(anyhow!("service unavailable"));
            }
            Ok(self.result.clone())
        }

        fn extract_from_url_basic(&self, _url: &str, hint: Option<&str>) -> ExtractionResult {
            *self.last_hint.borrow_mut() = hint.map(str::to_string);
            self.result.clone()
        }

        fn extract_text(&self, _text: &str, hint: Option<&str>) -> ExtractionResult {
            *self.last_hint.borrow_mut() = hint.map(str::to_string);
            self.result.clone()
        }

        fn extract_image(&self, _base64: &str) -> Result<ExtractionResult> {
            if self.fail_image {
                return Err(anyhow!("OCR failed"));
            }
            Ok(self.result.clone())
        }
    }

    fn app() -> App {
        App::new(RecordStore::load(Box::new(MemoryStore::new())).unwrap())
    }

    #[test]
    fn test_capture_with_empty_extraction_stores_defaults() {
        let mut app = app();
        let gateway = StubGateway::default();
        let record = app
            .capture(
                &gateway,
                CaptureSource::UrlAdvanced {
                    url: "https://example.com/j/1".to_string(),
                },
            )
            .unwrap();
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.company, DEFAULT_COMPANY);
        assert_eq!(record.url, "https://example.com/j/1");
        assert_eq!(record.status, JobStatus::Captured);
        assert_eq!(app.store().records().len(), 1);
    }

    #[test]
    fn test_advanced_failure_stores_nothing() {
        let mut app = app();
        let gateway = StubGateway {
            fail_advanced: true,
            ..Default::default()
        };
        let result = app.capture(
            &gateway,
            CaptureSource::UrlAdvanced {
                url: "https://example.com".to_string(),
            },
        );
        assert!(result.is_err());
        assert!(app.store().records().is_empty());
    }

    #[test]
    fn test_image_failure_propagates_and_stores_nothing() {
        let mut app = app();
        let gateway = StubGateway {
            fail_image: true,
            ..Default::default()
        };
        let result = app.capture(
            &gateway,
            CaptureSource::Image {
                base64: "aGVsbG8=".to_string(),
            },
        );
        assert!(result.is_err());
        assert!(app.store().records().is_empty());
    }

    #[test]
    fn test_basic_url_capture_passes_resolver_hint() {
        let mut app = app();
        let gateway = StubGateway::default();
        app.capture(
            &gateway,
            CaptureSource::UrlBasic {
                url: "https://careers.tencent.com/position/42".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            gateway.last_hint.borrow().as_deref(),
            Some("Tencent (腾讯)")
        );
    }

    #[test]
    fn test_text_capture_without_url_has_no_hint_and_empty_url() {
        let mut app = app();
        let gateway = StubGateway::default();
        let record = app
            .capture(
                &gateway,
                CaptureSource::Text {
                    text: "some pasted posting".to_string(),
                    url: None,
                },
            )
            .unwrap();
        assert_eq!(record.url, "");
        assert_eq!(gateway.last_hint.borrow().as_deref(), None);
    }

    #[test]
    fn test_same_url_captured_twice_yields_two_records() {
        let mut app = app();
        let gateway = StubGateway::default();
        let source = || CaptureSource::UrlBasic {
            url: "https://linkedin.com/jobs/view/7".to_string(),
        };
        let first = app.capture(&gateway, source()).unwrap();
        let second = app.capture(&gateway, source()).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(app.store().records().len(), 2);
    }

    #[test]
    fn test_edit_preserves_id_and_date_captured() {
        let mut app = app();
        let gateway = StubGateway::default();
        let original = app
            .capture(
                &gateway,
                CaptureSource::UrlBasic {
                    url: "https://example.com".to_string(),
                },
            )
            .unwrap();

        let patch = EditPatch {
            title: Some("Staff Engineer".to_string()),
            status: Some(JobStatus::Interview),
            ..Default::default()
        };
        let edited = app.edit(&original.id, patch).unwrap().unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.date_captured, original.date_captured);
        assert_eq!(edited.title, "Staff Engineer");
        assert_eq!(edited.status, JobStatus::Interview);
        assert_eq!(edited.company, original.company);
    }

    #[test]
    fn test_edit_unknown_id_returns_none() {
        let mut app = app();
        let result = app.edit("item_0_missing00", EditPatch::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_reports_found_and_not_found() {
        let mut app = app();
        let gateway = StubGateway::default();
        let record = app
            .capture(
                &gateway,
                CaptureSource::UrlBasic {
                    url: "https://example.com".to_string(),
                },
            )
            .unwrap();
        assert!(app.delete(&record.id).unwrap());
        assert!(!app.delete(&record.id).unwrap());
    }
}
