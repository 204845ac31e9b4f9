use crate::models::{DateRange, History};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub show_completed: bool,
    pub show_missed: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_completed: true,
            show_missed: true,
        }
    }
}

/// Days inside `range` restricted to the visible prayers. Days left empty
/// are dropped, and kept days carry totals over the visible subset only.
pub fn filter_history(history: &History, range: &DateRange, visibility: Visibility) -> History {
    if range.start > range.end {
        return History::new();
    }
    history
        .range(range.start..=range.end)
        .filter_map(|(date, day)| {
            let view = day.retain_view(|p| {
                (p.completed && visibility.show_completed)
                    || (!p.completed && visibility.show_missed)
            });
            (!view.prayers().is_empty()).then_some((*date, view))
        })
        .collect()
}
