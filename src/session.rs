//! The viewer session: manifest, caches, the active view and the detail pane.
//!
//! A [`Session`] owns everything that lives for one loaded manifest. Views
//! switch only through [`Session::switch_to_view`]; the detail pane is a
//! sub-state on top (`Closed -> Loading -> Shown | Error`) entered through
//! [`Session::open_detail`] and left through [`Session::close_detail`].
//!
//! Fetch failures never escape as errors once the session is loaded. They
//! become inline error states the UI draws where the content would be.

use crate::config::ViewerConfig;
use crate::data::{EntityId, Row};
use crate::error::Result;
use crate::format::{render_auto_detail, render_detail, LinkTarget, RenderedDetail};
use crate::hierarchy::build_hierarchy;
use crate::manifest::{Manifest, PackageInfo, ViewDef, ViewKind};
use crate::search::{
    build_search_categories, perform_search, IndexState, SearchCategory, SearchIndex,
    SearchOutcome,
};
use crate::source::{
    auto_detail_path, detail_path, Annotation, AnnotationList, AnnotationType, NewAnnotation,
    QueryCache, QuerySource,
};
use crate::views::{ChartView, ItemState, TableView, TreeBrowser};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Content of the active tab.
#[derive(Debug)]
pub enum ViewContent {
    /// Collapsible hierarchy.
    Tree(TreeBrowser),
    /// Flat table.
    Table(TableView),
    /// Nested-table chart.
    Chart(ChartView),
    /// The view's rows could not be loaded.
    Error(String),
}

/// Which view is active.
#[derive(Debug, Default)]
pub enum ViewState {
    /// Nothing selected yet.
    #[default]
    NoView,
    /// A manifest view is shown.
    Active {
        /// View key.
        key: String,
        /// Render-ready content.
        content: ViewContent,
    },
}

impl ViewState {
    /// Key of the active view.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NoView => None,
            Self::Active { key, .. } => Some(key),
        }
    }

    /// Content of the active view.
    pub fn content(&self) -> Option<&ViewContent> {
        match self {
            Self::NoView => None,
            Self::Active { content, .. } => Some(content),
        }
    }

    /// Content of the active view, mutably.
    pub fn content_mut(&mut self) -> Option<&mut ViewContent> {
        match self {
            Self::NoView => None,
            Self::Active { content, .. } => Some(content),
        }
    }
}

/// A detail record on screen, with the annotation lists of its sections.
#[derive(Debug, Clone)]
pub struct DetailView {
    /// View key the record was opened with.
    pub view_key: String,
    /// Record id.
    pub id: EntityId,
    /// Rendered sections.
    pub rendered: RenderedDetail,
    annotations: HashMap<(String, EntityId), AnnotationList>,
}

impl DetailView {
    /// Annotation list of one entity, once requested.
    pub fn annotations(&self, entity_type: &str, id: &EntityId) -> Option<&AnnotationList> {
        self.annotations.get(&(entity_type.to_string(), id.clone()))
    }
}

/// Detail pane state.
#[derive(Debug, Clone, Default)]
pub enum DetailState {
    /// No detail open.
    #[default]
    Closed,
    /// Record fetch in flight.
    Loading {
        /// Requested view key.
        view_key: String,
        /// Requested id.
        id: EntityId,
    },
    /// Record loaded and rendered.
    Shown(DetailView),
    /// Record fetch failed.
    Error(String),
}

impl DetailState {
    /// True unless closed.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Category fetches for one index build, detached from the session so
/// they can run on another task.
#[derive(Debug)]
pub struct IndexJob {
    source: Arc<dyn QuerySource>,
    queries: Vec<String>,
}

/// Results of an [`IndexJob`].
#[derive(Debug)]
pub struct IndexBuild {
    fetched: Vec<(String, Result<Vec<Row>>)>,
}

impl IndexJob {
    /// Fetch every query concurrently and wait for all of them.
    pub async fn run(self) -> IndexBuild {
        let source = &self.source;
        let fetches = self.queries.iter().map(|query| async move {
            debug!("index fetch {}", query);
            (query.clone(), source.execute(query, &[]).await)
        });
        IndexBuild {
            fetched: join_all(fetches).await,
        }
    }
}

/// One loaded manifest and everything derived from it.
#[derive(Debug)]
pub struct Session {
    source: Arc<dyn QuerySource>,
    manifest: Manifest,
    package: Option<PackageInfo>,
    config: ViewerConfig,
    cache: QueryCache,
    categories: Vec<SearchCategory>,
    index: IndexState,
    view: ViewState,
    detail: DetailState,
}

impl Session {
    /// Load the manifest from a source and derive the search categories.
    pub async fn load(source: Arc<dyn QuerySource>, config: ViewerConfig) -> Result<Self> {
        let response = source.manifest().await?;
        let categories = build_search_categories(&response.manifest, config.search.default_limit);
        debug!(
            "manifest loaded: {} views, {} search categories",
            response.manifest.views.len(),
            categories.len()
        );
        Ok(Self {
            source,
            manifest: response.manifest,
            package: response.package,
            config,
            cache: QueryCache::new(),
            categories,
            index: IndexState::Empty,
            view: ViewState::NoView,
            detail: DetailState::Closed,
        })
    }

    /// The manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Package metadata.
    pub fn package(&self) -> Option<&PackageInfo> {
        self.package.as_ref()
    }

    /// Where the data comes from.
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Configuration.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// The query cache.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Search categories in manifest order.
    pub fn categories(&self) -> &[SearchCategory] {
        &self.categories
    }

    /// Search index state.
    pub fn index_state(&self) -> &IndexState {
        &self.index
    }

    /// Active view.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Active view, mutably (cursor movement, sorting, filtering).
    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Detail pane.
    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    /// Rows of a named query, fetched once per session.
    pub async fn fetch_query(&mut self, query: &str) -> Result<Arc<Vec<Row>>> {
        if let Some(rows) = self.cache.get(query) {
            debug!("query cache hit: {}", query);
            return Ok(rows);
        }
        debug!("fetching query {}", query);
        let rows = self.source.execute(query, &[]).await?;
        Ok(self.cache.insert(query, rows))
    }

    /// Activate a tab view. Returns false, leaving the state unchanged, when
    /// the key names no view or a detail view.
    pub async fn switch_to_view(&mut self, key: &str) -> bool {
        let Some(view) = self.manifest.view(key).filter(|v| !v.is_detail()).cloned() else {
            warn!("no tab view named '{}'", key);
            return false;
        };
        debug!("switching to view {}", key);
        let content = match self.build_content(&view).await {
            Ok(content) => content,
            Err(e) => {
                error!("loading view {} failed: {}", key, e);
                ViewContent::Error(format!("Error: {e}"))
            },
        };
        self.view = ViewState::Active {
            key: view.key,
            content,
        };
        true
    }

    async fn build_content(&mut self, view: &ViewDef) -> Result<ViewContent> {
        let Some(query) = view.source_query.as_deref() else {
            return Ok(ViewContent::Error(format!(
                "View '{}' has no source query",
                view.key
            )));
        };
        let rows = self.fetch_query(query).await?;
        Ok(match &view.kind {
            ViewKind::Tree { hierarchy, display } => ViewContent::Tree(TreeBrowser::new(
                build_hierarchy(&rows, hierarchy),
                hierarchy.clone(),
                display.clone(),
            )),
            ViewKind::NestedTable { hierarchy, display } => {
                ViewContent::Chart(ChartView::new(&rows, hierarchy, display))
            },
            ViewKind::Table => ViewContent::Table(TableView::new(view, rows)),
            ViewKind::Detail(_) => ViewContent::Error(format!("'{}' is a detail view", view.key)),
        })
    }

    /// Select the tree leaf under the cursor and load its items. Item
    /// queries depend on the leaf and are not cached.
    pub async fn select_tree_leaf(&mut self) -> bool {
        let Some(ViewContent::Tree(tree)) = self.view.content_mut() else {
            return false;
        };
        let Some(leaf) = tree.select_current() else {
            return false;
        };
        let query = tree.display().item_query.clone();
        let param = tree.display().item_param.clone();

        let state = match (query, param) {
            (Some(query), Some(param)) => {
                debug!("loading items of {} via {}", leaf.id, query);
                let params = [(param, leaf.id.to_string())];
                match self.source.execute(&query, &params).await {
                    Ok(rows) => ItemState::Loaded(rows),
                    Err(e) => {
                        error!("loading items of {} failed: {}", leaf.id, e);
                        ItemState::Failed(format!("Error loading items: {e}"))
                    },
                }
            },
            _ => ItemState::Failed("No item query defined".to_string()),
        };
        if let Some(ViewContent::Tree(tree)) = self.view.content_mut() {
            tree.set_items(&leaf.id, state);
        }
        true
    }

    /// Open a record in the detail pane.
    ///
    /// An unknown key ending in `_detail` shows a generic dump of the
    /// record from the table named by the key's prefix; any other unknown
    /// key, or a key naming a non-detail view, does nothing.
    pub async fn open_detail(&mut self, view_key: &str, id: &EntityId) {
        let (path, def) = match self.manifest.view(view_key) {
            Some(view) => match view.detail() {
                Some(def) => (detail_path(view_key, def.source.as_deref(), id), Some(def.clone())),
                None => {
                    debug!("'{}' is not a detail view", view_key);
                    return;
                },
            },
            None => match view_key.strip_suffix("_detail").filter(|t| !t.is_empty()) {
                Some(table) => (auto_detail_path(table, id), None),
                None => {
                    debug!("no detail view named '{}'", view_key);
                    return;
                },
            },
        };

        self.detail = DetailState::Loading {
            view_key: view_key.to_string(),
            id: id.clone(),
        };
        debug!("fetching detail {}", path);
        let data = match self.source.fetch_json(&path).await {
            Ok(data) => data,
            Err(e) => {
                error!("loading detail {} failed: {}", path, e);
                self.detail = DetailState::Error(format!("Error loading details: {e}"));
                return;
            },
        };
        let rendered = match &def {
            Some(def) => render_detail(def, &data),
            None => {
                let table = view_key.trim_end_matches("_detail");
                render_auto_detail(table, id, &data)
            },
        };
        self.detail = DetailState::Shown(DetailView {
            view_key: view_key.to_string(),
            id: id.clone(),
            rendered,
            annotations: HashMap::new(),
        });
        self.load_annotations().await;
    }

    /// Follow a link.
    pub async fn open_target(&mut self, target: &LinkTarget) {
        self.open_detail(&target.detail_view, &target.id).await;
    }

    /// Dismiss the detail pane.
    pub fn close_detail(&mut self) {
        self.detail = DetailState::Closed;
    }

    async fn load_annotations(&mut self) {
        let DetailState::Shown(detail) = &self.detail else {
            return;
        };
        let targets: BTreeSet<(String, EntityId)> = detail
            .rendered
            .annotation_targets()
            .map(|(t, id)| (t.to_string(), id.clone()))
            .collect();
        for (entity_type, id) in targets {
            self.set_annotations(&entity_type, &id, AnnotationList::Loading);
            let list = self.fetch_annotations(&entity_type, &id).await;
            self.set_annotations(&entity_type, &id, list);
        }
    }

    async fn fetch_annotations(&self, entity_type: &str, id: &EntityId) -> AnnotationList {
        match self.source.annotations(entity_type, id).await {
            Ok(items) => AnnotationList::Loaded(items),
            Err(e) => {
                error!("loading annotations of {} {} failed: {}", entity_type, id, e);
                AnnotationList::Failed("Error loading notes.".to_string())
            },
        }
    }

    fn set_annotations(&mut self, entity_type: &str, id: &EntityId, list: AnnotationList) {
        if let DetailState::Shown(detail) = &mut self.detail {
            detail
                .annotations
                .insert((entity_type.to_string(), id.clone()), list);
        }
    }

    /// Add an annotation and refresh the entity's list. Blank content is
    /// rejected without a request; a failed request leaves the list as it was.
    pub async fn add_annotation(
        &mut self,
        entity_type: &str,
        id: &EntityId,
        annotation_type: AnnotationType,
        content: &str,
        author: Option<&str>,
    ) -> Result<Annotation> {
        let request = NewAnnotation::new(entity_type, id, annotation_type, content, author)?;
        let created = match self.source.create_annotation(&request).await {
            Ok(created) => created,
            Err(e) => {
                error!("creating annotation on {} {} failed: {}", entity_type, id, e);
                return Err(e);
            },
        };
        let list = self.fetch_annotations(entity_type, id).await;
        self.set_annotations(entity_type, id, list);
        Ok(created)
    }

    /// Delete an annotation and refresh the entity's list. A failed request
    /// leaves the list as it was.
    pub async fn delete_annotation(
        &mut self,
        entity_type: &str,
        id: &EntityId,
        annotation_id: i64,
    ) -> Result<()> {
        if let Err(e) = self.source.delete_annotation(annotation_id).await {
            error!("deleting annotation {} failed: {}", annotation_id, e);
            return Err(e);
        }
        let list = self.fetch_annotations(entity_type, id).await;
        self.set_annotations(entity_type, id, list);
        Ok(())
    }

    /// Start building the search index. Returns `None` when a build is
    /// already running or done, so a second call is a no-op.
    pub fn begin_index_build(&mut self) -> Option<IndexJob> {
        if !matches!(self.index, IndexState::Empty) {
            return None;
        }
        self.index = IndexState::Building;
        let queries: BTreeSet<String> = self
            .categories
            .iter()
            .filter(|c| !self.cache.contains(&c.query))
            .map(|c| c.query.clone())
            .collect();
        Some(IndexJob {
            source: Arc::clone(&self.source),
            queries: queries.into_iter().collect(),
        })
    }

    /// Store fetched rows in the query cache and mark the index ready. A
    /// category whose query failed is indexed as empty.
    pub fn finish_index_build(&mut self, build: IndexBuild) {
        let mut failed = BTreeSet::new();
        for (query, result) in build.fetched {
            match result {
                Ok(rows) => {
                    self.cache.insert(&query, rows);
                },
                Err(e) => {
                    warn!("search index: query {} failed: {}", query, e);
                    failed.insert(query);
                },
            }
        }
        let mut index = SearchIndex::default();
        for category in &self.categories {
            match self.cache.get(&category.query) {
                Some(rows) => index.insert(category, &rows),
                None => {
                    if !failed.contains(&category.query) {
                        warn!("search index: no rows for {}", category.key);
                    }
                    index.insert_empty(category);
                },
            }
        }
        debug!("search index ready: {} rows", index.len());
        self.index = IndexState::Ready(index);
    }

    /// Forget a build whose job never reported back, so the next search
    /// can start another.
    pub fn abandon_index_build(&mut self) {
        if matches!(self.index, IndexState::Building) {
            warn!("search index build abandoned");
            self.index = IndexState::Empty;
        }
    }

    /// Build the search index in place, waiting for all category fetches.
    pub async fn preload_search_index(&mut self) {
        if let Some(job) = self.begin_index_build() {
            let build = job.run().await;
            self.finish_index_build(build);
        }
    }

    /// Run a search against the index.
    pub fn search(&self, query: &str) -> SearchOutcome {
        perform_search(query, &self.categories, &self.index, &self.config.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrataError;
    use crate::format::RenderedSection;
    use crate::manifest::ManifestResponse;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeSource {
        calls: Mutex<Vec<String>>,
        notes: Mutex<Vec<Annotation>>,
        fail_notes: bool,
    }

    impl FakeSource {
        fn calls(&self, query: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|q| *q == query).count()
        }
    }

    fn manifest() -> Value {
        json!({
            "manifest": {
                "default_view": "genera",
                "views": {
                    "taxonomy": {
                        "type": "hierarchy",
                        "display": "tree",
                        "source_query": "taxonomy",
                        "tree_display": {
                            "leaf_rank": "Family",
                            "item_query": "family_genera",
                            "item_param": "family_id"
                        }
                    },
                    "genera": {
                        "type": "table",
                        "title": "Genera",
                        "source_query": "genera",
                        "columns": [{"key": "name", "label": "Genus"}, {"key": "author"}],
                        "on_row_click": {"detail_view": "genus_detail", "id_key": "id"}
                    },
                    "formations": {
                        "type": "table",
                        "title": "Formations",
                        "source_query": "broken",
                        "columns": [{"key": "name"}]
                    },
                    "genus_detail": {
                        "type": "detail",
                        "source": "/api/genus/{id}",
                        "sections": [
                            {"title": "Basic", "type": "field_grid", "fields": [{"key": "name", "label": "Name"}]},
                            {"title": "Notes", "type": "annotations", "entity_type": "genus"}
                        ]
                    }
                }
            },
            "package": {"name": "trilobase", "version": "2.0"}
        })
    }

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[async_trait]
    impl QuerySource for FakeSource {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        async fn manifest(&self) -> Result<ManifestResponse> {
            ManifestResponse::from_value(manifest())
        }

        async fn execute(&self, query: &str, params: &[(String, String)]) -> Result<Vec<Row>> {
            self.calls.lock().unwrap().push(query.to_string());
            match query {
                "genera" => Ok(rows(json!([
                    {"id": 1, "name": "Apple", "author": "A"},
                    {"id": 2, "name": "Application", "author": "B"},
                    {"id": 3, "name": "Banana", "author": "C"}
                ]))),
                "taxonomy" => Ok(rows(json!([
                    {"id": 10, "name": "Agnostida", "rank": "Order", "parent_id": null},
                    {"id": 11, "name": "Agnostidae", "rank": "Family", "parent_id": 10}
                ]))),
                "family_genera" => {
                    assert_eq!(params, [("family_id".to_string(), "11".to_string())]);
                    Ok(rows(json!([{"id": 1, "name": "Apple"}])))
                },
                _ => Err(StrataError::query_not_found(query)),
            }
        }

        async fn fetch_json(&self, path: &str) -> Result<Value> {
            match path {
                "/api/genus/1" => Ok(json!({"id": 1, "name": "Apple"})),
                "/api/auto/detail/formation?id=4" => Ok(json!({"id": 4, "name": "Wheeler", "lithology": null})),
                _ => Err(StrataError::record_not_found(path)),
            }
        }

        async fn annotations(&self, entity_type: &str, id: &EntityId) -> Result<Vec<Annotation>> {
            if self.fail_notes {
                return Err(StrataError::record_not_found("/api/annotations"));
            }
            Ok(self
                .notes
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.entity_type == entity_type && EntityId::from_value(&a.entity_id).as_ref() == Some(id))
                .cloned()
                .collect())
        }

        async fn create_annotation(&self, request: &NewAnnotation) -> Result<Annotation> {
            let mut notes = self.notes.lock().unwrap();
            let created = Annotation {
                id: notes.len() as i64 + 1,
                entity_type: request.entity_type.clone(),
                entity_id: request.entity_id.clone(),
                annotation_type: request.annotation_type.to_string(),
                content: request.content.clone(),
                author: request.author.clone(),
                created_at: None,
            };
            notes.push(created.clone());
            Ok(created)
        }

        async fn delete_annotation(&self, id: i64) -> Result<()> {
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|a| a.id != id);
            if notes.len() == before {
                return Err(StrataError::record_not_found("/api/annotations"));
            }
            Ok(())
        }
    }

    async fn session() -> (Session, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        let session = Session::load(source.clone(), ViewerConfig::default()).await.unwrap();
        (session, source)
    }

    #[tokio::test]
    async fn queries_are_fetched_once() {
        let (mut session, source) = session().await;
        assert!(session.switch_to_view("genera").await);
        assert!(session.switch_to_view("taxonomy").await);
        assert!(session.switch_to_view("genera").await);
        assert_eq!(source.calls("genera"), 1);
        assert_eq!(session.cache().len(), 2);
    }

    #[tokio::test]
    async fn switching_to_unknown_or_detail_views_is_refused() {
        let (mut session, _) = session().await;
        assert!(!session.switch_to_view("nope").await);
        assert!(!session.switch_to_view("genus_detail").await);
        assert!(session.view().key().is_none());

        assert!(session.switch_to_view("formations").await);
        assert!(matches!(session.view().content(), Some(ViewContent::Error(msg)) if msg.contains("broken")));
    }

    #[tokio::test]
    async fn tree_leaf_items_are_loaded_with_the_leaf_id() {
        let (mut session, source) = session().await;
        session.switch_to_view("taxonomy").await;
        if let Some(ViewContent::Tree(tree)) = session.view_mut().content_mut() {
            tree.goto_node(&EntityId::from(11));
        }
        assert!(session.select_tree_leaf().await);
        assert!(session.select_tree_leaf().await);
        assert_eq!(source.calls("family_genera"), 2);
        let Some(ViewContent::Tree(tree)) = session.view().content() else {
            panic!("tree expected");
        };
        assert_eq!(tree.shown_items().len(), 1);
    }

    #[tokio::test]
    async fn detail_shows_sections_and_loads_annotations() {
        let (mut session, _) = session().await;
        session.open_detail("genus_detail", &EntityId::from(1)).await;
        let DetailState::Shown(detail) = session.detail() else {
            panic!("detail expected, got {:?}", session.detail());
        };
        assert_eq!(detail.rendered.title, "Apple");
        assert!(matches!(detail.rendered.sections[1], RenderedSection::Annotations { .. }));
        assert_eq!(
            detail.annotations("genus", &EntityId::from(1)),
            Some(&AnnotationList::Loaded(Vec::new()))
        );

        session.close_detail();
        assert!(!session.detail().is_open());
    }

    #[tokio::test]
    async fn failed_detail_fetch_is_an_inline_error() {
        let (mut session, _) = session().await;
        session.open_detail("genus_detail", &EntityId::from(99)).await;
        assert!(matches!(session.detail(), DetailState::Error(msg) if msg.starts_with("Error loading details:")));
    }

    #[tokio::test]
    async fn unknown_detail_keys_fall_back_or_do_nothing() {
        let (mut session, _) = session().await;
        session.open_detail("formation_detail", &EntityId::from(4)).await;
        let DetailState::Shown(detail) = session.detail() else {
            panic!("auto detail expected");
        };
        assert_eq!(detail.rendered.title, "Wheeler");

        session.close_detail();
        session.open_detail("mystery", &EntityId::from(4)).await;
        assert!(!session.detail().is_open());
        session.open_detail("genera", &EntityId::from(1)).await;
        assert!(!session.detail().is_open());
    }

    #[tokio::test]
    async fn annotations_can_be_added_and_deleted() {
        let (mut session, _) = session().await;
        let id = EntityId::from(1);
        session.open_detail("genus_detail", &id).await;

        assert!(session
            .add_annotation("genus", &id, AnnotationType::Note, "  ", None)
            .await
            .is_err());
        let created = session
            .add_annotation("genus", &id, AnnotationType::Note, "check year", None)
            .await
            .unwrap();
        let DetailState::Shown(detail) = session.detail() else {
            panic!("detail expected");
        };
        assert!(matches!(detail.annotations("genus", &id), Some(AnnotationList::Loaded(list)) if list.len() == 1));

        session.delete_annotation("genus", &id, created.id).await.unwrap();
        assert!(session.delete_annotation("genus", &id, created.id).await.is_err());
        let DetailState::Shown(detail) = session.detail() else {
            panic!("detail expected");
        };
        assert_eq!(detail.annotations("genus", &id), Some(&AnnotationList::Loaded(Vec::new())));
    }

    #[tokio::test]
    async fn failed_annotation_load_shows_message() {
        let source = Arc::new(FakeSource {
            fail_notes: true,
            ..FakeSource::default()
        });
        let mut session = Session::load(source, ViewerConfig::default()).await.unwrap();
        let id = EntityId::from(1);
        session.open_detail("genus_detail", &id).await;
        let DetailState::Shown(detail) = session.detail() else {
            panic!("detail expected");
        };
        assert_eq!(
            detail.annotations("genus", &id),
            Some(&AnnotationList::Failed("Error loading notes.".to_string()))
        );
    }

    #[tokio::test]
    async fn search_waits_for_index_and_ranks_prefix_matches() {
        let (mut session, source) = session().await;
        assert!(matches!(session.search("App"), SearchOutcome::NotReady));
        assert!(matches!(session.search("A"), SearchOutcome::Hidden));

        session.switch_to_view("genera").await;
        session.preload_search_index().await;
        session.preload_search_index().await;
        assert_eq!(source.calls("genera"), 1);
        assert_eq!(source.calls("broken"), 1);

        let SearchOutcome::Results(results) = session.search("App") else {
            panic!("results expected");
        };
        let names: Vec<String> = (0..results.entries.len()).map(|i| results.display_text(i)).collect();
        assert_eq!(names, ["Apple", "Application"]);
        assert_eq!(results.groups.len(), 1);
    }

    #[tokio::test]
    async fn index_build_is_one_shot() {
        let (mut session, _) = session().await;
        let job = session.begin_index_build().unwrap();
        assert!(session.begin_index_build().is_none());
        assert!(matches!(session.search("App"), SearchOutcome::NotReady));
        let build = job.run().await;
        session.finish_index_build(build);
        assert!(session.index_state().ready().is_some());
        assert!(session.begin_index_build().is_none());
    }
}
