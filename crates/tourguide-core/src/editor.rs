//! Buffered preference editing
//!
//! The editor works on a copy of the preferences. Nothing reaches the session
//! until `commit` hands the whole draft back.

use crate::state::{Budget, TravelStyle, UserPreferences, INTEREST_OPTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    Budget,
    Style,
    Interests,
}

impl PreferenceField {
    pub fn all() -> [PreferenceField; 3] {
        [
            PreferenceField::Budget,
            PreferenceField::Style,
            PreferenceField::Interests,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            PreferenceField::Budget => "Budget",
            PreferenceField::Style => "Travel Style",
            PreferenceField::Interests => "Interests",
        }
    }

    fn option_count(&self) -> usize {
        match self {
            PreferenceField::Budget => Budget::all().len(),
            PreferenceField::Style => TravelStyle::all().len(),
            PreferenceField::Interests => INTEREST_OPTIONS.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceDraft {
    draft: UserPreferences,
    field: PreferenceField,
    option_idx: usize,
}

impl PreferenceDraft {
    pub fn new(current: &UserPreferences) -> Self {
        let mut editor = Self {
            draft: current.clone(),
            field: PreferenceField::Budget,
            option_idx: 0,
        };
        editor.option_idx = editor.chosen_index();
        editor
    }

    pub fn draft(&self) -> &UserPreferences {
        &self.draft
    }

    pub fn field(&self) -> PreferenceField {
        self.field
    }

    /// Highlighted option within the current field.
    pub fn option_idx(&self) -> usize {
        self.option_idx
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.draft.budget = budget;
    }

    pub fn set_travel_style(&mut self, style: TravelStyle) {
        self.draft.travel_style = style;
    }

    pub fn toggle_interest(&mut self, interest: &str) {
        self.draft.toggle_interest(interest);
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            PreferenceField::Budget => PreferenceField::Style,
            PreferenceField::Style => PreferenceField::Interests,
            PreferenceField::Interests => PreferenceField::Interests,
        };
        self.option_idx = self.chosen_index();
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            PreferenceField::Budget => PreferenceField::Budget,
            PreferenceField::Style => PreferenceField::Budget,
            PreferenceField::Interests => PreferenceField::Style,
        };
        self.option_idx = self.chosen_index();
    }

    pub fn next_option(&mut self) {
        let len = self.field.option_count();
        self.option_idx = (self.option_idx + 1).min(len - 1);
    }

    pub fn prev_option(&mut self) {
        self.option_idx = self.option_idx.saturating_sub(1);
    }

    /// Pick the highlighted budget/style, or toggle the highlighted interest.
    pub fn activate(&mut self) {
        match self.field {
            PreferenceField::Budget => {
                if let Some(&b) = Budget::all().get(self.option_idx) {
                    self.set_budget(b);
                }
            }
            PreferenceField::Style => {
                if let Some(&s) = TravelStyle::all().get(self.option_idx) {
                    self.set_travel_style(s);
                }
            }
            PreferenceField::Interests => {
                if let Some(interest) = INTEREST_OPTIONS.get(self.option_idx) {
                    self.toggle_interest(interest);
                }
            }
        }
    }

    pub fn commit(self) -> UserPreferences {
        self.draft
    }

    fn chosen_index(&self) -> usize {
        match self.field {
            PreferenceField::Budget => Budget::all()
                .iter()
                .position(|b| *b == self.draft.budget)
                .unwrap_or(0),
            PreferenceField::Style => TravelStyle::all()
                .iter()
                .position(|s| *s == self.draft.travel_style)
                .unwrap_or(0),
            PreferenceField::Interests => 0,
        }
    }
}
