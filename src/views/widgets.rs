use ratatui::widgets::ListState;

/// Selection cursor over the feed. The posts themselves live in the store,
/// so every move takes the current length.
#[derive(Debug, Default)]
pub struct FeedList {
    pub state: ListState,
}

impl FeedList {
    pub fn with_len(len: usize) -> FeedList {
        let mut state = ListState::default();
        // Start with the first item selected
        if len > 0 {
            state.select(Some(0));
        }
        FeedList { state }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    /// Keeps the selection inside the list after it shrank or grew.
    pub fn clamp(&mut self, len: usize) {
        let i = match (self.state.selected(), len) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(i);
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn first(&mut self, len: usize) {
        if len > 0 {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self, len: usize) {
        if len > 0 {
            self.state.select(Some(len - 1));
        }
    }

    pub fn jump_up(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(offset));
        self.state.select(Some(i));
    }

    pub fn jump_down(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + offset).min(len - 1));
        self.state.select(Some(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_stay_in_bounds() {
        let mut list = FeedList::with_len(3);
        list.previous(3);
        assert_eq!(list.selected(), Some(0));

        list.next(3);
        list.next(3);
        list.next(3);
        assert_eq!(list.selected(), Some(2));

        list.jump_up(10, 3);
        assert_eq!(list.selected(), Some(0));
        list.jump_down(10, 3);
        assert_eq!(list.selected(), Some(2));
    }

    #[test]
    fn clamp_follows_length_changes() {
        let mut list = FeedList::with_len(5);
        list.last(5);
        list.clamp(2);
        assert_eq!(list.selected(), Some(1));

        list.clamp(0);
        assert_eq!(list.selected(), None);

        list.clamp(4);
        assert_eq!(list.selected(), Some(0));
    }

    #[test]
    fn empty_list_has_no_selection() {
        let mut list = FeedList::with_len(0);
        list.next(0);
        list.first(0);
        assert_eq!(list.selected(), None);
    }
}
