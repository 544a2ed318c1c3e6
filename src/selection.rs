//! Lightbox selection and navigation.
//!
//! Which image (if any) is open in the lightbox is never stored; it is
//! derived from the navigation location by [`Selection::from_location`]. The
//! page generator uses that function for every page it renders, and
//! [`Navigator`] uses it after every transition, so a deep link and a
//! client-side transition to the same location always show the same thing.
//! The embedded browser script (`static/gallery.js`) implements the same
//! rules against `window.location` and `sessionStorage`.
//!
//! [`Navigator`] and [`History`] are the reference model of that script: the
//! generator never drives them, but their tests pin down the transitions the
//! script has to reproduce in the browser.
//!
//! ## Locations
//!
//! | Location | Selection |
//! |---|---|
//! | `/` | `Closed` |
//! | `/p/3/` or `/p/3` | `Open(3)` |
//! | `/?photoId=3` | `Open(3)` |
//! | `/p/99/` with 10 images | `Closed` (stale reference) |
//!
//! ## Transitions
//!
//! ```text
//!            open(id) / push /p/{id}/
//!   Closed ───────────────────────────▶ Open(id) ──┐ step / open(id')
//!      ▲                                   │  ▲    │ push /p/{id'}/
//!      │    close: remember id, push /     │  └────┘
//!      └───────────────────────────────────┘
//! ```
//!
//! ## Scroll restoration
//!
//! Closing remembers the image in a [`LastViewedStore`]. The next render in
//! the `Closed` state consumes it exactly once and, if the image still
//! exists, asks the gallery to scroll its thumbnail into view.

use crate::types::ImageList;

/// Query parameter carrying the selected image id.
pub const PHOTO_QUERY_PARAM: &str = "photoId";

/// Location of the gallery itself.
pub const GALLERY_LOCATION: &str = "/";

/// Permalink of one image. Loading it directly opens that image.
pub fn permalink(id: u32) -> String {
    format!("/p/{id}/")
}

/// The image id a location asks for, whether or not it exists.
///
/// The `/p/{id}` path form wins over a `photoId` query parameter. Anything
/// that isn't a plain non-negative integer selects nothing.
pub fn requested_id(location: &str) -> Option<u32> {
    let base = url::Url::parse("http://gallery.invalid/").ok()?;
    let url = base.join(location).ok()?;

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    if let (Some("p"), Some(id), None) = (segments.next(), segments.next(), segments.next()) {
        return parse_id(id);
    }

    url.query_pairs()
        .find(|(key, _)| key == PHOTO_QUERY_PARAM)
        .and_then(|(_, value)| parse_id(&value))
}

fn parse_id(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Closed,
    Open(u32),
}

impl Selection {
    /// Resolve a location against the current image list.
    ///
    /// An id that isn't in `images` resolves to `Closed`.
    pub fn from_location(location: &str, images: &ImageList) -> Self {
        match requested_id(location) {
            Some(id) if images.contains(id) => Selection::Open(id),
            Some(id) => {
                tracing::debug!(id, location, "stale selection reference");
                Selection::Closed
            }
            None => Selection::Closed,
        }
    }

    pub fn selected_id(&self) -> Option<u32> {
        match self {
            Selection::Open(id) => Some(*id),
            Selection::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Selection::Open(_))
    }
}

/// Client-local memory of the image the lightbox last showed.
pub trait LastViewedStore {
    fn remember(&mut self, id: u32);

    /// Return the remembered id and clear it.
    fn take(&mut self) -> Option<u32>;

    fn peek(&self) -> Option<u32>;
}

/// In-memory [`LastViewedStore`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    last_viewed: Option<u32>,
}

impl LastViewedStore for MemoryStore {
    fn remember(&mut self, id: u32) {
        self.last_viewed = Some(id);
    }

    fn take(&mut self) -> Option<u32> {
        self.last_viewed.take()
    }

    fn peek(&self) -> Option<u32> {
        self.last_viewed
    }
}

/// Browser-style session history: a list of locations and a cursor.
/// Pushing drops any forward entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn push(&mut self, location: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(location.into());
        self.cursor += 1;
    }

    /// Returns `false` when there is nothing to go back to.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Returns `false` when there is nothing to go forward to.
    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Side effect a render asks the gallery to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEffect {
    /// Scroll the thumbnail of this image to the vertical center.
    ScrollIntoView(u32),
}

/// The lightbox state machine over a history and a last-viewed store.
#[derive(Debug)]
pub struct Navigator<'a, S: LastViewedStore> {
    images: &'a ImageList,
    history: History,
    store: S,
}

impl<'a, S: LastViewedStore> Navigator<'a, S> {
    pub fn new(images: &'a ImageList, location: impl Into<String>, store: S) -> Self {
        Self {
            images,
            history: History::new(location),
            store,
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::from_location(self.history.current(), self.images)
    }

    pub fn location(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open `id` in the lightbox, from the grid or from another image.
    ///
    /// Ids not in the list are ignored.
    pub fn open(&mut self, id: u32) -> Selection {
        if self.images.contains(id) && self.selection() != Selection::Open(id) {
            self.history.push(permalink(id));
        }
        self.selection()
    }

    /// Move to the neighbouring image. A no-op at either end of the list or
    /// when the lightbox is closed.
    pub fn step(&mut self, direction: Direction) -> Selection {
        if let Selection::Open(id) = self.selection() {
            let (prev, next) = self.images.neighbors(id);
            let target = match direction {
                Direction::Previous => prev,
                Direction::Next => next,
            };
            if let Some(target) = target {
                self.history.push(permalink(target));
            }
        }
        self.selection()
    }

    /// Close the lightbox, remembering which image it showed.
    pub fn close(&mut self) -> Selection {
        if let Selection::Open(id) = self.selection() {
            self.store.remember(id);
            self.history.push(GALLERY_LOCATION);
        }
        self.selection()
    }

    /// Browser back button.
    pub fn back(&mut self) -> Selection {
        self.history.back();
        self.selection()
    }

    /// Browser forward button.
    pub fn forward(&mut self) -> Selection {
        self.history.forward();
        self.selection()
    }

    /// Called on every render of the gallery.
    ///
    /// While closed, consumes the remembered image; the effect is returned
    /// only if that image is still in the list.
    pub fn render(&mut self) -> Option<RenderEffect> {
        if self.selection().is_open() {
            return None;
        }
        let id = self.store.take()?;
        if self.images.contains(id) {
            Some(RenderEffect::ScrollIntoView(id))
        } else {
            tracing::debug!(id, "last viewed image no longer in catalog");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_list;

    // =========================================================================
    // Location parsing
    // =========================================================================

    #[test]
    fn gallery_root_selects_nothing() {
        assert_eq!(requested_id("/"), None);
        assert_eq!(requested_id(""), None);
    }

    #[test]
    fn permalink_path_selects_id() {
        assert_eq!(requested_id("/p/3/"), Some(3));
        assert_eq!(requested_id("/p/3"), Some(3));
        assert_eq!(requested_id(&permalink(12)), Some(12));
    }

    #[test]
    fn query_param_selects_id() {
        assert_eq!(requested_id("/?photoId=4"), Some(4));
        assert_eq!(requested_id("/?other=1&photoId=4"), Some(4));
    }

    #[test]
    fn path_wins_over_query() {
        assert_eq!(requested_id("/p/2/?photoId=7"), Some(2));
    }

    #[test]
    fn garbage_ids_select_nothing() {
        assert_eq!(requested_id("/p/abc/"), None);
        assert_eq!(requested_id("/p/-1/"), None);
        assert_eq!(requested_id("/?photoId=1.5"), None);
        assert_eq!(requested_id("/?photoId="), None);
        assert_eq!(requested_id("/p/1/extra"), None);
        assert_eq!(requested_id("/?photoId=99999999999"), None);
    }

    #[test]
    fn permalink_and_query_resolve_to_same_selection() {
        let images = sample_list(5);
        for id in 0..5 {
            assert_eq!(
                Selection::from_location(&permalink(id), &images),
                Selection::from_location(&format!("/?photoId={id}"), &images),
            );
        }
    }

    #[test]
    fn stale_id_resolves_closed() {
        let images = sample_list(3);
        assert_eq!(Selection::from_location("/p/3/", &images), Selection::Closed);
        assert_eq!(Selection::from_location("/p/2/", &images), Selection::Open(2));
    }

    // =========================================================================
    // History
    // =========================================================================

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = History::new("/");
        history.push("/p/1/");
        history.push("/p/2/");
        assert!(history.back());
        history.push("/p/5/");
        assert_eq!(history.current(), "/p/5/");
        assert!(!history.forward());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn back_stops_at_first_entry() {
        let mut history = History::new("/");
        assert!(!history.back());
        assert_eq!(history.current(), "/");
    }

    // =========================================================================
    // Navigator
    // =========================================================================

    #[test]
    fn open_then_close_round_trip() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());

        assert_eq!(nav.open(1), Selection::Open(1));
        assert_eq!(nav.location(), "/p/1/");
        assert_eq!(nav.close(), Selection::Closed);
        assert_eq!(nav.selection().selected_id(), None);
        assert_eq!(nav.store().peek(), Some(1));

        assert_eq!(nav.render(), Some(RenderEffect::ScrollIntoView(1)));
        assert_eq!(nav.store().peek(), None);
        assert_eq!(nav.render(), None);
    }

    #[test]
    fn opening_pushes_history() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        nav.open(2);
        assert_eq!(nav.history().len(), 2);
        assert_eq!(nav.back(), Selection::Closed);
        assert_eq!(nav.location(), "/");
        assert_eq!(nav.forward(), Selection::Open(2));
    }

    #[test]
    fn reopening_same_image_does_not_push() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        nav.open(2);
        nav.open(2);
        assert_eq!(nav.history().len(), 2);
    }

    #[test]
    fn step_moves_between_neighbours() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        nav.open(0);
        assert_eq!(nav.step(Direction::Previous), Selection::Open(0));
        assert_eq!(nav.step(Direction::Next), Selection::Open(1));
        assert_eq!(nav.step(Direction::Next), Selection::Open(2));
        assert_eq!(nav.step(Direction::Next), Selection::Open(2));
        assert_eq!(nav.location(), "/p/2/");
        // gallery, 0, 1, 2
        assert_eq!(nav.history().len(), 4);
    }

    #[test]
    fn step_while_closed_is_noop() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        assert_eq!(nav.step(Direction::Next), Selection::Closed);
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn close_after_stepping_remembers_last_image() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        nav.open(0);
        nav.step(Direction::Next);
        nav.close();
        assert_eq!(nav.render(), Some(RenderEffect::ScrollIntoView(1)));
    }

    #[test]
    fn render_while_open_keeps_store() {
        let images = sample_list(3);
        let mut store = MemoryStore::default();
        store.remember(2);
        let mut nav = Navigator::new(&images, "/p/0/", store);
        assert_eq!(nav.render(), None);
        assert_eq!(nav.store().peek(), Some(2));
    }

    #[test]
    fn deep_link_then_close_restores_scroll() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/p/2/", MemoryStore::default());
        assert_eq!(nav.selection(), Selection::Open(2));
        nav.close();
        assert_eq!(nav.location(), GALLERY_LOCATION);
        assert_eq!(nav.render(), Some(RenderEffect::ScrollIntoView(2)));
    }

    #[test]
    fn stale_last_viewed_is_cleared_without_effect() {
        // Remembered on a previous visit, the collection has since shrunk.
        let images = sample_list(2);
        let mut store = MemoryStore::default();
        store.remember(5);
        let mut nav = Navigator::new(&images, "/", store);

        assert_eq!(nav.render(), None);
        assert_eq!(nav.store().peek(), None);
    }

    #[test]
    fn open_unknown_id_is_ignored() {
        let images = sample_list(2);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        assert_eq!(nav.open(9), Selection::Closed);
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn back_after_close_reopens_lightbox() {
        let images = sample_list(3);
        let mut nav = Navigator::new(&images, "/", MemoryStore::default());
        nav.open(1);
        nav.close();
        assert_eq!(nav.back(), Selection::Open(1));
        // Still open, so the remembered id is not consumed yet.
        assert_eq!(nav.render(), None);
        assert_eq!(nav.store().peek(), Some(1));
    }
}
