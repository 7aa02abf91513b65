//! Application state and logic.

use std::time::Instant;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::clipboard::copy_current;
use crate::data::EntityId;
use crate::format::{LinkTarget, RenderedSection};
use crate::search::{SearchOutcome, SearchSession, SearchTicket};
use crate::session::{DetailState, DetailView, IndexBuild, Session, ViewContent};
use crate::source::{AnnotationList, AnnotationType};

/// Application theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Gruvbox dark theme.
    GruvboxDark,
    /// Gruvbox light theme.
    GruvboxLight,
}

impl Theme {
    /// Get the next theme in the cycle.
    pub fn next(self) -> Self {
        match self {
            Theme::GruvboxDark => Theme::GruvboxLight,
            Theme::GruvboxLight => Theme::GruvboxDark,
        }
    }

    /// Get the theme name.
    pub fn name(self) -> &'static str {
        match self {
            Theme::GruvboxDark => "Gruvbox Dark",
            Theme::GruvboxLight => "Gruvbox Light",
        }
    }
}

/// Which pane of a tree view has the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The tree itself (or the table/chart of other views).
    #[default]
    Main,
    /// The item list of the selected leaf.
    Items,
}

/// Something the detail cursor can land on.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailAction {
    /// Open another record.
    Open(LinkTarget),
    /// An existing annotation.
    Note {
        /// Annotated entity type.
        entity_type: String,
        /// Annotated entity id.
        entity_id: EntityId,
        /// Annotation id.
        annotation_id: i64,
    },
}

/// Actions of a shown detail, in the order they are drawn.
pub fn detail_actions(detail: &DetailView) -> Vec<DetailAction> {
    let mut actions = Vec::new();
    for section in &detail.rendered.sections {
        match section {
            RenderedSection::FieldGrid { rows, .. } => {
                for row in rows {
                    actions.extend(row.value.links().cloned().map(DetailAction::Open));
                }
            },
            RenderedSection::LinkedTable(table) => {
                for row in &table.rows {
                    actions.extend(row.row_click.clone().map(DetailAction::Open));
                    for cell in &row.cells {
                        actions.extend(cell.links().cloned().map(DetailAction::Open));
                    }
                }
            },
            RenderedSection::Annotations {
                entity_type,
                entity_id,
                ..
            } => {
                if let Some(AnnotationList::Loaded(items)) =
                    detail.annotations(entity_type, entity_id)
                {
                    actions.extend(items.iter().map(|a| DetailAction::Note {
                        entity_type: entity_type.clone(),
                        entity_id: entity_id.clone(),
                        annotation_id: a.id,
                    }));
                }
            },
            RenderedSection::TaggedList { .. } | RenderedSection::RawText { .. } => {},
        }
    }
    actions
}

/// A note being typed.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    /// Entity the note is about.
    pub entity_type: String,
    /// Entity id.
    pub entity_id: EntityId,
    /// Selected type.
    pub annotation_type: AnnotationType,
    /// Text so far.
    pub content: String,
}

/// Keyboard input mode.
#[derive(Debug, Clone, Default)]
pub enum InputMode {
    /// Keys are commands.
    #[default]
    Normal,
    /// Keys edit the table filter.
    Filter,
    /// Keys edit a note.
    Note(NoteDraft),
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// The loaded session.
    pub session: Session,
    /// Search box.
    pub search: SearchSession,
    /// Status message.
    pub status: String,
    /// Current theme.
    pub theme: Theme,
    /// Pane with the cursor.
    pub focus: Focus,
    /// Keyboard input mode.
    pub input: InputMode,
    /// Selected detail action.
    pub detail_cursor: usize,
    /// Detail pane scroll offset.
    pub detail_scroll: u16,
    /// Author recorded on new notes.
    pub author: Option<String>,
    runtime: Handle,
    index_task: Option<JoinHandle<IndexBuild>>,
}

impl App {
    /// Create the application around a loaded session.
    pub fn new(session: Session, runtime: Handle) -> Self {
        let status = match session.package() {
            Some(package) => format!("{} loaded", package.label()),
            None => format!("{} loaded", session.source_description()),
        };
        Self {
            session,
            search: SearchSession::new(),
            status,
            theme: Theme::GruvboxDark,
            focus: Focus::Main,
            input: InputMode::Normal,
            detail_cursor: 0,
            detail_scroll: 0,
            author: std::env::var("USER").ok().filter(|u| !u.is_empty()),
            runtime,
            index_task: None,
        }
    }

    /// Show the initial view and start building the search index.
    pub fn start(&mut self, view: Option<&str>) {
        let key = view
            .map(str::to_string)
            .or_else(|| self.session.manifest().initial_view().map(str::to_string));
        match key {
            Some(key) => self.switch_to_view(&key),
            None => self.status = "Manifest has no views".to_string(),
        }
        self.start_index_build();
    }

    /// Keys of the tab views, in manifest order.
    pub fn tab_keys(&self) -> Vec<String> {
        self.session
            .manifest()
            .tab_views()
            .map(|v| v.key.clone())
            .collect()
    }

    /// Activate a tab view.
    pub fn switch_to_view(&mut self, key: &str) {
        if self.runtime.block_on(self.session.switch_to_view(key)) {
            self.focus = Focus::Main;
            self.input = InputMode::Normal;
            self.status = match self.session.manifest().view(key) {
                Some(view) => view.title.clone(),
                None => key.to_string(),
            };
        } else {
            self.status = format!("No view named '{key}'");
        }
    }

    /// Move to the next or previous tab, wrapping around.
    pub fn cycle_tab(&mut self, delta: isize) {
        let keys = self.tab_keys();
        if keys.is_empty() {
            return;
        }
        let current = self
            .session
            .view()
            .key()
            .and_then(|k| keys.iter().position(|t| t == k))
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(keys.len() as isize) as usize;
        self.switch_to_view(&keys[next]);
    }

    /// Activate the tab at `index` (0-based).
    pub fn select_tab(&mut self, index: usize) {
        if let Some(key) = self.tab_keys().get(index).cloned() {
            self.switch_to_view(&key);
        }
    }

    /// Start the search index build on the runtime, once.
    pub fn start_index_build(&mut self) {
        if let Some(job) = self.session.begin_index_build() {
            debug!("starting search index build");
            self.index_task = Some(self.runtime.spawn(job.run()));
        }
    }

    /// Periodic work: collect a finished index build and run due searches.
    pub fn tick(&mut self, now: Instant) {
        if self.index_task.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(task) = self.index_task.take() {
                match self.runtime.block_on(task) {
                    Ok(build) => self.session.finish_index_build(build),
                    Err(e) => {
                        error!("search index task failed: {}", e);
                        self.session.abandon_index_build();
                    },
                }
            }
        }

        let debounce = self.session.config().search.debounce;
        if self.search.debounce_elapsed(debounce, now) {
            let ticket = self.search.begin();
            self.run_search(ticket, now);
        }
        if let Some(ticket) = self.search.due_retry(now) {
            self.run_search(ticket, now);
        }
    }

    fn run_search(&mut self, ticket: SearchTicket, now: Instant) {
        match self.session.search(self.search.buffer()) {
            SearchOutcome::Hidden => {
                self.search.accept(ticket, None);
            },
            SearchOutcome::NotReady => {
                self.start_index_build();
                let delay = self.session.config().search.retry_delay;
                self.search.defer(ticket, delay, now);
            },
            SearchOutcome::Results(results) => {
                self.search.accept(ticket, Some(results));
            },
        }
    }

    /// Open the highlighted search result.
    pub fn open_search_result(&mut self) {
        let target = self
            .search
            .results()
            .and_then(|r| r.highlight().and_then(|h| r.target(h)));
        match target {
            Some(target) => {
                self.search.cancel();
                self.open_target(&target);
            },
            None => self.status = "No result selected".to_string(),
        }
    }

    /// Expand the category of the highlighted result.
    pub fn show_more_results(&mut self) {
        if let Some(results) = self.search.results_mut() {
            let group = results
                .highlight()
                .and_then(|h| results.entries.get(h))
                .map(|e| e.category)
                .or_else(|| results.groups.iter().position(|g| g.more() > 0));
            if let Some(group) = group {
                results.show_more(group);
            }
        }
    }

    /// Open a record in the detail pane.
    pub fn open_target(&mut self, target: &LinkTarget) {
        self.runtime.block_on(self.session.open_target(target));
        self.detail_cursor = 0;
        self.detail_scroll = 0;
        self.status = match self.session.detail() {
            DetailState::Shown(detail) => detail.rendered.title.clone(),
            DetailState::Error(_) => "Error loading details".to_string(),
            _ => format!("No detail view '{}'", target.detail_view),
        };
    }

    /// Close the detail pane.
    pub fn close_detail(&mut self) {
        self.session.close_detail();
        self.input = InputMode::Normal;
        self.status = "Detail closed".to_string();
    }

    /// Actions of the open detail.
    pub fn detail_actions(&self) -> Vec<DetailAction> {
        match self.session.detail() {
            DetailState::Shown(detail) => detail_actions(detail),
            _ => Vec::new(),
        }
    }

    /// Move the detail cursor, wrapping around.
    pub fn move_detail_cursor(&mut self, delta: isize) {
        let len = self.detail_actions().len() as isize;
        if len > 0 {
            self.detail_cursor = (self.detail_cursor as isize + delta).rem_euclid(len) as usize;
        }
    }

    /// Follow the selected detail link.
    pub fn activate_detail(&mut self) {
        match self.detail_actions().get(self.detail_cursor) {
            Some(DetailAction::Open(target)) => {
                let target = target.clone();
                self.open_target(&target);
            },
            Some(DetailAction::Note { .. }) => {
                self.status = "x deletes the selected note".to_string();
            },
            None => {},
        }
    }

    /// Delete the selected note.
    pub fn delete_selected_note(&mut self) {
        let Some(DetailAction::Note {
            entity_type,
            entity_id,
            annotation_id,
        }) = self.detail_actions().get(self.detail_cursor).cloned()
        else {
            self.status = "No note selected".to_string();
            return;
        };
        let result = self.runtime.block_on(self.session.delete_annotation(
            &entity_type,
            &entity_id,
            annotation_id,
        ));
        self.status = match result {
            Ok(()) => "Note deleted".to_string(),
            Err(e) => format!("Delete failed: {e}"),
        };
        let len = self.detail_actions().len();
        self.detail_cursor = self.detail_cursor.min(len.saturating_sub(1));
    }

    /// Start typing a note on the open record.
    pub fn start_note(&mut self) {
        let target = match self.session.detail() {
            DetailState::Shown(detail) => detail
                .rendered
                .annotation_targets()
                .next()
                .map(|(t, id)| (t.to_string(), id.clone())),
            _ => None,
        };
        match target {
            Some((entity_type, entity_id)) => {
                self.input = InputMode::Note(NoteDraft {
                    entity_type,
                    entity_id,
                    annotation_type: AnnotationType::Note,
                    content: String::new(),
                });
            },
            None => self.status = "This record takes no notes".to_string(),
        }
    }

    /// Submit the note being typed.
    pub fn submit_note(&mut self) {
        let InputMode::Note(draft) = std::mem::take(&mut self.input) else {
            return;
        };
        let result = self.runtime.block_on(self.session.add_annotation(
            &draft.entity_type,
            &draft.entity_id,
            draft.annotation_type,
            &draft.content,
            self.author.as_deref(),
        ));
        match result {
            Ok(created) => self.status = format!("Added {}", created.annotation_type),
            Err(e) => {
                self.status = format!("Note not saved: {e}");
                self.input = InputMode::Note(draft);
            },
        }
    }

    /// Move the cursor of the active view down (or up, for negative `delta`).
    pub fn move_cursor(&mut self, delta: isize) {
        let focus = self.focus;
        match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) if focus == Focus::Items => tree.move_item_cursor(delta),
            Some(ViewContent::Tree(tree)) => {
                for _ in 0..delta.unsigned_abs() {
                    if delta > 0 {
                        tree.cursor_down();
                    } else {
                        tree.cursor_up();
                    }
                }
            },
            Some(ViewContent::Table(table)) => table.move_cursor(delta),
            Some(ViewContent::Chart(chart)) => chart.move_rows(delta),
            _ => {},
        }
    }

    /// Jump to the first row.
    pub fn goto_first(&mut self) {
        let focus = self.focus;
        match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) if focus == Focus::Items => {
                tree.move_item_cursor(isize::MIN / 2)
            },
            Some(ViewContent::Tree(tree)) => tree.goto_first(),
            Some(ViewContent::Table(table)) => table.goto_first(),
            Some(ViewContent::Chart(chart)) => chart.move_rows(isize::MIN / 2),
            _ => {},
        }
    }

    /// Jump to the last row.
    pub fn goto_last(&mut self) {
        let focus = self.focus;
        match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) if focus == Focus::Items => {
                tree.move_item_cursor(isize::MAX / 2)
            },
            Some(ViewContent::Tree(tree)) => tree.goto_last(),
            Some(ViewContent::Table(table)) => table.goto_last(),
            Some(ViewContent::Chart(chart)) => chart.move_rows(isize::MAX / 2),
            _ => {},
        }
    }

    /// Left: collapse in a tree, leave the item list, step left in a chart,
    /// pick the previous sort column in a table.
    pub fn move_left(&mut self) {
        if self.focus == Focus::Items {
            self.focus = Focus::Main;
            return;
        }
        match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) => tree.collapse_current(),
            Some(ViewContent::Table(table)) => table.next_sort_column(-1),
            Some(ViewContent::Chart(chart)) => chart.move_cols(-1),
            _ => {},
        }
    }

    /// Right: the mirror of [`App::move_left`].
    pub fn move_right(&mut self) {
        match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) if self.focus == Focus::Main => tree.expand_current(),
            Some(ViewContent::Table(table)) => table.next_sort_column(1),
            Some(ViewContent::Chart(chart)) => chart.move_cols(1),
            _ => {},
        }
    }

    /// Enter: select a tree leaf or toggle a branch, open the row or cell
    /// under the cursor elsewhere.
    pub fn activate(&mut self) {
        let focus = self.focus;
        let target = match self.session.view_mut().content_mut() {
            Some(ViewContent::Tree(tree)) if focus == Focus::Items => tree.current_item_target(),
            Some(ViewContent::Tree(tree)) => {
                let is_leaf = tree.current_node().is_some_and(|n| tree.is_leaf(n));
                if !is_leaf {
                    tree.toggle_current();
                    return;
                }
                if self.runtime.block_on(self.session.select_tree_leaf()) {
                    self.focus = Focus::Items;
                    if let Some(ViewContent::Tree(tree)) = self.session.view().content() {
                        self.status = tree.item_stats();
                    }
                }
                return;
            },
            Some(ViewContent::Table(table)) => table.current_target(),
            Some(ViewContent::Chart(chart)) => chart.current_cell().and_then(|c| c.target.clone()),
            _ => None,
        };
        match target {
            Some(target) => self.open_target(&target),
            None => self.status = "Nothing to open here".to_string(),
        }
    }

    /// Open the detail of the tree node under the cursor.
    pub fn node_info(&mut self) {
        let target = match self.session.view().content() {
            Some(ViewContent::Tree(tree)) => {
                tree.current_node().and_then(|n| tree.node_info_target(n))
            },
            _ => None,
        };
        match target {
            Some(target) => self.open_target(&target),
            None => self.status = "No details for this node".to_string(),
        }
    }

    /// Expand or collapse every branch of a tree.
    pub fn set_all_expanded(&mut self, expanded: bool) {
        if let Some(ViewContent::Tree(tree)) = self.session.view_mut().content_mut() {
            if expanded {
                tree.expand_all();
            } else {
                tree.collapse_all();
            }
        }
    }

    /// Flip the valid-only filter of the item list.
    pub fn toggle_valid_only(&mut self) {
        if let Some(ViewContent::Tree(tree)) = self.session.view_mut().content_mut() {
            if tree.has_valid_filter() {
                tree.toggle_valid_only();
                self.status = tree.item_stats();
            } else {
                self.status = "No valid filter for these items".to_string();
            }
        }
    }

    /// Sort a table by its selected sort column.
    pub fn toggle_sort(&mut self) {
        if let Some(ViewContent::Table(table)) = self.session.view_mut().content_mut() {
            table.toggle_selected_sort();
            if let Some(sort) = table.sort() {
                self.status = format!("Sorted by {} {:?}", sort.key, sort.direction);
            }
        }
    }

    /// Start editing the table filter.
    pub fn start_filter(&mut self) {
        match self.session.view().content() {
            Some(ViewContent::Table(table)) if table.is_searchable() => {
                self.input = InputMode::Filter;
            },
            _ => self.status = "This view has no filter".to_string(),
        }
    }

    /// Edit the table filter.
    pub fn edit_filter(&mut self, edit: impl FnOnce(&mut String)) {
        if let Some(ViewContent::Table(table)) = self.session.view_mut().content_mut() {
            let mut filter = table.filter().to_string();
            edit(&mut filter);
            table.set_filter(&filter);
            self.status = table.stats();
        }
    }

    /// Copy the open detail or the active view.
    pub fn copy(&mut self) {
        self.status = match copy_current(&self.session) {
            Ok(message) => message,
            Err(e) => format!("Copy failed: {e}"),
        };
    }

    /// Cycle to the next theme.
    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.status = format!("Theme: {}", self.theme.name());
    }
}
