use deck_core::{Connection, Course, CourseId, HarvestConfig, HarvestRequest, Module};
use url::Url;

use crate::canvas::CanvasApi;
use crate::fetch::{FetchSettings, NoProgress, ProgressSink, ReqwestFetcher};
use crate::harvest::harvest;
use crate::output::open_sink;
use crate::{HarvestError, HarvestSummary};

/// Blocking facade over the engine. Owns a current-thread runtime, so every
/// request runs sequentially on the calling thread.
pub struct Session {
    runtime: tokio::runtime::Runtime,
    fetcher: ReqwestFetcher,
    base_url: Url,
    page_size: u32,
}

impl Session {
    pub fn new(connection: &Connection, settings: FetchSettings) -> Result<Self, HarvestError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HarvestError::Runtime)?;
        let fetcher = ReqwestFetcher::new(&settings, connection.token.clone())?;
        Ok(Self {
            runtime,
            fetcher,
            base_url: connection.base_url.clone(),
            page_size: settings.page_size,
        })
    }

    fn api(&self) -> CanvasApi<'_> {
        CanvasApi::new(&self.fetcher, &self.base_url, self.page_size)
    }

    pub fn courses(&self) -> Result<Vec<Course>, HarvestError> {
        let api = self.api();
        Ok(self.runtime.block_on(api.courses())?)
    }

    pub fn course(&self, course_id: CourseId) -> Result<Course, HarvestError> {
        let api = self.api();
        Ok(self.runtime.block_on(api.course(course_id))?)
    }

    pub fn modules(&self, course_id: CourseId) -> Result<Vec<Module>, HarvestError> {
        let api = self.api();
        Ok(self.runtime.block_on(api.modules(course_id))?)
    }

    pub fn harvest(
        &self,
        request: &HarvestRequest,
        progress: &dyn ProgressSink,
    ) -> Result<HarvestSummary, HarvestError> {
        let mut sink = open_sink(&request.output)?;
        let api = self.api();
        self.runtime
            .block_on(harvest(&api, request, sink.as_mut(), progress))
    }
}

/// One-call entry point: connects, runs the harvest and reports progress to
/// `progress` when given.
pub fn run(
    config: &HarvestConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<HarvestSummary, HarvestError> {
    let session = Session::new(&config.connection, FetchSettings::default())?;
    session.harvest(&config.request, progress.unwrap_or(&NoProgress))
}
