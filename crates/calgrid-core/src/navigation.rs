use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use tracing::debug;

use crate::datetime::{
  self,
  add_days,
  first_day_of_shifted_month,
  start_of_week
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  #[default]
  Month,
  Week
}

impl ViewMode {
  pub fn all() -> [Self; 2] {
    [Self::Month, Self::Week]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Month => "month",
      | Self::Week => "week"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "month" => Some(Self::Month),
      | "week" => Some(Self::Week),
      | _ => None
    }
  }
}

/// Anchor date plus active view. Every
/// transition is always enabled.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarNavigation {
  anchor: NaiveDate,
  view:   ViewMode
}

impl CalendarNavigation {
  pub fn new(
    anchor: NaiveDate,
    view: ViewMode
  ) -> Self {
    Self { anchor, view }
  }

  pub fn anchor(&self) -> NaiveDate {
    self.anchor
  }

  pub fn view(&self) -> ViewMode {
    self.view
  }

  pub fn set_anchor(
    &mut self,
    anchor: NaiveDate
  ) {
    self.anchor = anchor;
  }

  pub fn set_view(
    &mut self,
    view: ViewMode
  ) {
    debug!(view = view.as_key(), "set view");
    self.view = view;
  }

  pub fn next_month(&mut self) {
    self.anchor =
      first_day_of_shifted_month(
        self.anchor,
        1
      );
  }

  pub fn prev_month(&mut self) {
    self.anchor =
      first_day_of_shifted_month(
        self.anchor,
        -1
      );
  }

  pub fn next_week(&mut self) {
    self.anchor =
      add_days(self.anchor, 7);
  }

  pub fn prev_week(&mut self) {
    self.anchor =
      add_days(self.anchor, -7);
  }

  pub fn today(&mut self) {
    self.today_at(datetime::today());
  }

  pub fn today_at(
    &mut self,
    today: NaiveDate
  ) {
    self.anchor = today;
  }

  /// Month step in month view, 7-day
  /// step in week view.
  pub fn next(&mut self) {
    match self.view {
      | ViewMode::Month => {
        self.next_month()
      }
      | ViewMode::Week => {
        self.next_week()
      }
    }
    debug!(anchor = %self.anchor, "navigated forward");
  }

  pub fn prev(&mut self) {
    match self.view {
      | ViewMode::Month => {
        self.prev_month()
      }
      | ViewMode::Week => {
        self.prev_week()
      }
    }
    debug!(anchor = %self.anchor, "navigated back");
  }

  pub fn week_start(&self) -> NaiveDate {
    start_of_week(self.anchor)
  }

  pub fn title(&self) -> String {
    self
      .anchor
      .format("%B %Y")
      .to_string()
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum FocusKey {
  Left,
  Right,
  Up,
  Down,
  Enter,
  Other
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum FocusOutcome {
  Moved(NaiveDate),
  OpenCreate(NaiveDate)
}

/// Keyboard cursor over grid days.
#[derive(
  Debug, Clone, Copy, Default,
  PartialEq, Eq,
)]
pub struct DayFocus {
  focused: Option<NaiveDate>
}

impl DayFocus {
  pub fn focused(
    &self
  ) -> Option<NaiveDate> {
    self.focused
  }

  /// The first key press only places
  /// focus on `anchor`.
  pub fn handle_key(
    &mut self,
    key: FocusKey,
    anchor: NaiveDate
  ) -> FocusOutcome {
    let Some(current) = self.focused
    else {
      self.focused = Some(anchor);
      return FocusOutcome::Moved(
        anchor
      );
    };

    let next = match key {
      | FocusKey::Right => {
        add_days(current, 1)
      }
      | FocusKey::Left => {
        add_days(current, -1)
      }
      | FocusKey::Down => {
        add_days(current, 7)
      }
      | FocusKey::Up => {
        add_days(current, -7)
      }
      | FocusKey::Enter => {
        return FocusOutcome::OpenCreate(
          current
        );
      }
      | FocusKey::Other => current
    };

    self.focused = Some(next);
    FocusOutcome::Moved(next)
  }
}
