use qrlink_catalog::RecordStore;
use qrlink_redirector::Redirector;
use std::sync::Arc;

pub struct AppState<S> {
    records: RecordStore<S>,
    redirector: Arc<dyn Redirector>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            redirector: Arc::clone(&self.redirector),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(records: RecordStore<S>, redirector: Arc<dyn Redirector>) -> Self {
        Self {
            records,
            redirector,
        }
    }

    pub fn records(&self) -> &RecordStore<S> {
        &self.records
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }
}
