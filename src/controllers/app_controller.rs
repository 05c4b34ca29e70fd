use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::controllers::interaction::{Begin, Completion, Notice, Panel, PostInteraction, PostView};
use crate::controllers::{account_controller, post_controller};
use crate::error::{ApiError, GramtuiError};
use crate::models::{Config, HttpClient, Post, PostStore, Session, SocialApi};
use crate::views::{tui, FeedList, FeedScreen};

const TICK: Duration = Duration::from_millis(100);
const PAGE: usize = 5;

/// Results coming back from spawned remote calls.
#[derive(Debug)]
pub enum AppEvent {
    Completed(Completion),
    /// A finished refresh; the store already holds the new feed.
    Feed(Result<usize, ApiError>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    api: Arc<dyn SocialApi>,
    store: PostStore,
    session: Session,
    feed: FeedList,
    interactions: HashMap<String, PostInteraction>,
    notice: Option<Notice>,
    status: String,
    cache_path: Option<PathBuf>,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(api: Arc<dyn SocialApi>, store: PostStore, session: Session) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = FeedList::with_len(store.len());
        Self {
            api,
            store,
            session,
            feed,
            interactions: HashMap::new(),
            notice: None,
            status: String::from("Feed"),
            cache_path: None,
            tx,
            rx,
        }
    }

    pub fn with_cache(mut self, cache_path: Option<PathBuf>) -> Self {
        self.cache_path = cache_path;
        self
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selected_post(&self) -> Option<Post> {
        let posts = self.store.snapshot();
        self.feed.selected().and_then(|i| posts.get(i).cloned())
    }

    pub fn interaction(&self, post_id: &str) -> Option<&PostInteraction> {
        self.interactions.get(post_id)
    }

    fn interaction_mut(&mut self, post_id: &str) -> &mut PostInteraction {
        self.interactions
            .entry(post_id.to_string())
            .or_insert_with(|| PostInteraction::new(post_id))
    }

    fn selected_panel(&self) -> Panel {
        self.selected_post()
            .and_then(|p| self.interactions.get(&p.id).map(PostInteraction::open_panel))
            .unwrap_or_default()
    }

    /// Starts a background feed fetch.
    pub fn refresh(&mut self) {
        self.status = String::from("Refreshing...");
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = post_controller::refresh_feed(api.as_ref(), &store).await;
            let _ = tx.send(AppEvent::Feed(result));
        });
    }

    /// Sends a request on its own task, or shows the refusal notice.
    fn dispatch(&mut self, begin: Begin) {
        match begin {
            Ok(Some(request)) => {
                let api = Arc::clone(&self.api);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let completion = request.send(api.as_ref()).await;
                    let _ = tx.send(AppEvent::Completed(completion));
                });
            }
            Ok(None) => {}
            Err(notice) => self.notice = Some(notice),
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Completed(completion) => {
                let post_id = completion.post_id().to_string();
                let store = self.store.clone();
                let mut state = self
                    .interactions
                    .remove(&post_id)
                    .unwrap_or_else(|| PostInteraction::new(post_id.as_str()));
                let notice = state.resolve(completion, &store, &mut self.session);
                if store.get(&post_id).is_some() {
                    self.interactions.insert(post_id, state);
                }
                self.notice = Some(notice);
                self.feed.clamp(self.store.len());
                self.persist();
            }
            AppEvent::Feed(Ok(count)) => {
                log::debug!("Feed refreshed with {} posts", count);
                self.status = String::from("Feed");
                let store = self.store.clone();
                self.interactions.retain(|id, _| store.get(id).is_some());
                self.feed.clamp(count);
                self.persist();
            }
            AppEvent::Feed(Err(e)) => {
                log::warn!("Error fetching posts: {}", e);
                self.status = String::from("Feed");
                self.notice = Some(Notice::Failure {
                    message: String::from("Failed to load posts"),
                    error: e.into(),
                });
            }
        }
    }

    fn persist(&self) {
        if let Some(path) = &self.cache_path {
            if let Err(e) = post_controller::persist_feed(&self.store, path) {
                log::warn!("Failed to write feed cache: {}", e);
            }
        }
    }

    /// Waits for the next finished background call and applies it.
    pub async fn process_next_event(&mut self) -> bool {
        match self.rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
        }
    }

    /// Any key press dismisses the current notice.
    pub fn handle_key(&mut self, code: KeyCode) -> Control {
        self.notice = None;
        let Some(post) = self.selected_post() else {
            return match code {
                KeyCode::Char('q') | KeyCode::Esc => Control::Quit,
                KeyCode::Char('r') => {
                    self.refresh();
                    Control::Continue
                }
                _ => Control::Continue,
            };
        };

        match self.selected_panel() {
            Panel::Comments => self.handle_comments_key(&post, code),
            Panel::Options => self.handle_options_key(&post, code),
            Panel::None => return self.handle_feed_key(&post, code),
        }
        Control::Continue
    }

    fn handle_feed_key(&mut self, post: &Post, code: KeyCode) -> Control {
        let len = self.store.len();
        let store = self.store.clone();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Down | KeyCode::Char('j') => self.feed.next(len),
            KeyCode::Up | KeyCode::Char('k') => self.feed.previous(len),
            KeyCode::Char('g') => self.feed.first(len),
            KeyCode::Char('G') => self.feed.last(len),
            KeyCode::PageDown => self.feed.jump_down(PAGE, len),
            KeyCode::PageUp => self.feed.jump_up(PAGE, len),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('l') => {
                let user = self.session.user().cloned();
                let begin = self.interaction_mut(&post.id).begin_toggle_like(&store, user.as_ref());
                self.dispatch(begin);
            }
            KeyCode::Char('L') | KeyCode::Enter => {
                let user = self.session.user().cloned();
                let begin = self.interaction_mut(&post.id).begin_double_tap_like(&store, user.as_ref());
                self.dispatch(begin);
            }
            KeyCode::Char('o') => self.interaction_mut(&post.id).toggle_panel(Panel::Options),
            KeyCode::Char('c') => self.interaction_mut(&post.id).toggle_panel(Panel::Comments),
            _ => {}
        }
        Control::Continue
    }

    fn handle_options_key(&mut self, post: &Post, code: KeyCode) {
        let store = self.store.clone();
        let user = self.session.user().cloned();
        match code {
            KeyCode::Esc | KeyCode::Char('o') => self.interaction_mut(&post.id).close_panel(),
            KeyCode::Char('c') => self.interaction_mut(&post.id).toggle_panel(Panel::Comments),
            KeyCode::Char('f') => {
                let begin = self.interaction_mut(&post.id).begin_toggle_follow(&store, user.as_ref());
                self.dispatch(begin);
            }
            KeyCode::Char('d') if crate::controllers::interaction::can_delete(post, user.as_ref()) => {
                let begin = self.interaction_mut(&post.id).begin_delete();
                self.dispatch(begin);
            }
            _ => {}
        }
    }

    fn handle_comments_key(&mut self, post: &Post, code: KeyCode) {
        let user = self.session.user().cloned();
        let state = self.interaction_mut(&post.id);
        match code {
            KeyCode::Esc => state.close_panel(),
            KeyCode::Backspace => state.pop_draft_char(),
            KeyCode::Char(c) => state.push_draft_char(c),
            KeyCode::Enter => {
                let begin = state.begin_submit_comment(user.as_ref());
                self.dispatch(begin);
            }
            _ => {}
        }
    }

    fn views(&self, posts: &[Post]) -> Vec<PostView> {
        let user = self.session.user();
        posts
            .iter()
            .map(|post| match self.interactions.get(&post.id) {
                Some(state) => state.view(post, user),
                None => PostInteraction::new(post.id.as_str()).view(post, user),
            })
            .collect()
    }

    pub fn draw<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), GramtuiError> {
        let posts = self.store.snapshot();
        let views = self.views(&posts);
        let screen = FeedScreen {
            posts: &posts,
            views: &views,
            user: self.session.user(),
            status: &self.status,
            notice: self.notice.as_ref(),
        };
        let list_state = &mut self.feed.state;
        terminal.draw(|f| tui::render_ui(f, &screen, list_state))?;
        Ok(())
    }
}

pub async fn start_app(client: HttpClient, config: Config) -> Result<(), GramtuiError> {
    let api: Arc<dyn SocialApi> = Arc::new(client);

    let session = account_controller::load_session(api.as_ref(), &config).await;
    let cache_path = match crate::models::cache::get_cache_file() {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Feed cache disabled: {}", e);
            None
        }
    };
    let store = post_controller::load_cached_feed(cache_path.as_deref());

    let mut app = App::new(api, store, session).with_cache(cache_path);
    app.refresh();

    let mut terminal = tui::setup_terminal()?;
    let res = run_app(&mut terminal, &mut app).await;
    tui::restore_terminal(&mut terminal)?;
    res
}

pub async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), GramtuiError> {
    loop {
        app.drain_events();
        app.draw(terminal)?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code) == Control::Quit {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Credential;
    use crate::models::client::{ApiResponse, MockSocialApi};
    use crate::models::User;
    use mockall::predicate::*;

    fn post(id: &str, author_id: &str) -> Post {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "author": { "_id": author_id, "username": author_id },
        }))
        .unwrap()
    }

    fn logged_in(user_id: &str) -> Session {
        let user = User {
            id: user_id.to_string(),
            username: user_id.to_string(),
            ..Default::default()
        };
        Session::new(user, Credential::new("tok"))
    }

    #[tokio::test]
    async fn like_key_round_trips_through_background_task() {
        let mut api = MockSocialApi::new();
        api.expect_set_like()
            .with(eq("p1"), eq(true))
            .times(1)
            .returning(|_, _| Ok(ApiResponse::ok("Post liked")));

        let store = PostStore::new(vec![post("p1", "u2"), post("p2", "u2")]);
        let mut app = App::new(Arc::new(api), store, logged_in("u1"));

        assert_eq!(app.handle_key(KeyCode::Char('l')), Control::Continue);
        assert!(app.interaction("p1").unwrap().is_busy());

        // Second press while in flight is dropped: the mock allows one call only.
        app.handle_key(KeyCode::Char('l'));

        assert!(app.process_next_event().await);
        assert!(app.store().get("p1").unwrap().is_liked_by("u1"));
        assert_eq!(app.notice(), Some(&Notice::Success("Post liked".to_string())));
        assert!(!app.interaction("p1").unwrap().is_busy());
    }

    #[tokio::test]
    async fn typing_goes_to_draft_while_comments_open() {
        let api = MockSocialApi::new();
        let store = PostStore::new(vec![post("p1", "u2"), post("p2", "u2")]);
        let mut app = App::new(Arc::new(api), store, logged_in("u1"));

        app.handle_key(KeyCode::Char('c'));
        for c in "hi j".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Backspace);

        let state = app.interaction("p1").unwrap();
        assert_eq!(state.open_panel(), Panel::Comments);
        assert_eq!(state.comment_draft(), "hi ");
        // 'j' was typed, not used to move.
        assert_eq!(app.selected_post().unwrap().id, "p1");

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.interaction("p1").unwrap().open_panel(), Panel::None);
        assert_eq!(app.handle_key(KeyCode::Char('q')), Control::Quit);
    }

    #[tokio::test]
    async fn delete_from_options_removes_post() {
        let mut api = MockSocialApi::new();
        api.expect_delete_post()
            .with(eq("p1"))
            .times(1)
            .returning(|_| Ok(ApiResponse::ok("Post deleted")));

        let store = PostStore::new(vec![post("p1", "u1"), post("p2", "u2")]);
        let mut app = App::new(Arc::new(api), store, logged_in("u1"));

        app.handle_key(KeyCode::Char('o'));
        app.handle_key(KeyCode::Char('d'));
        assert!(app.process_next_event().await);

        assert!(app.store().get("p1").is_none());
        assert!(app.interaction("p1").is_none());
        assert_eq!(app.selected_post().unwrap().id, "p2");
    }

    #[tokio::test]
    async fn delete_key_ignored_for_other_authors() {
        let api = MockSocialApi::new();
        let store = PostStore::new(vec![post("p1", "u2")]);
        let mut app = App::new(Arc::new(api), store, logged_in("u1"));

        app.handle_key(KeyCode::Char('o'));
        app.handle_key(KeyCode::Char('d'));

        assert!(!app.interaction("p1").unwrap().is_busy());
        assert_eq!(app.interaction("p1").unwrap().open_panel(), Panel::Options);
    }

    #[tokio::test]
    async fn anonymous_like_shows_notice() {
        let api = MockSocialApi::new();
        let store = PostStore::new(vec![post("p1", "u2")]);
        let mut app = App::new(Arc::new(api), store, Session::anonymous());

        app.handle_key(KeyCode::Char('l'));

        let notice = app.notice().unwrap();
        assert!(notice.is_failure());
        assert_eq!(notice.message(), "Please log in to like posts");
    }

    #[tokio::test]
    async fn refresh_replaces_feed_and_prunes_state() {
        let mut api = MockSocialApi::new();
        api.expect_get_posts()
            .times(1)
            .returning(|| Ok(vec![post("p2", "u2")]));

        let store = PostStore::new(vec![post("p1", "u2")]);
        let mut app = App::new(Arc::new(api), store, logged_in("u1"));
        app.handle_key(KeyCode::Char('o'));
        app.handle_key(KeyCode::Esc);
        assert!(app.interaction("p1").is_some());

        app.handle_key(KeyCode::Char('r'));
        assert!(app.process_next_event().await);

        assert!(app.interaction("p1").is_none());
        assert_eq!(app.selected_post().unwrap().id, "p2");
    }

    #[tokio::test]
    async fn notice_is_dismissed_by_next_key() {
        let api = MockSocialApi::new();
        let store = PostStore::new(vec![post("p1", "u2"), post("p2", "u2")]);
        let mut app = App::new(Arc::new(api), store, Session::anonymous());

        app.handle_key(KeyCode::Char('l'));
        assert!(app.notice().is_some());

        app.handle_key(KeyCode::Char('j'));
        assert!(app.notice().is_none());
        assert_eq!(app.selected_post().unwrap().id, "p2");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_feed_and_reports() {
        let mut api = MockSocialApi::new();
        api.expect_get_posts()
            .times(1)
            .returning(|| Err(ApiError::Remote("offline".to_string())));

        let store = PostStore::new(vec![post("p1", "u2")]);
        let mut app = App::new(Arc::new(api), store, Session::anonymous());

        app.handle_key(KeyCode::Char('r'));
        assert!(app.process_next_event().await);

        assert!(app.store().get("p1").is_some());
        assert_eq!(app.notice().unwrap().message(), "Failed to load posts");
    }
}
