//! Declarative field tables: one row per editable field, carrying its label, control and
//! placeholder rule. Styling is resolved from the row when a form is rendered.

pub const FIELD_CLASS: &str = "border-2 border-gray-300 rounded-lg w-full p-3 shadow-sm \
                               focus:outline-none focus:border-rose-500 focus:ring-rose-500";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text,
    TextArea,
    Date,
    Time,
    Email,
    Select,
}

impl Widget {
    /// Value of the `type` attribute, or the element name for non-`input` controls.
    pub fn input_type(self) -> &'static str {
        match self {
            Widget::Text => "text",
            Widget::TextArea => "textarea",
            Widget::Date => "date",
            Widget::Time => "time",
            Widget::Email => "email",
            Widget::Select => "select",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    /// Text put in front of the lower-cased label to form the placeholder.
    pub placeholder: Option<&'static str>,
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::Text, Some("Enter your"))
    }

    pub const fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::TextArea, Some("Enter your event"))
    }

    pub const fn email(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::Email, Some("Enter your"))
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::Date, None)
    }

    pub const fn time(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::Time, None)
    }

    pub const fn select(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Widget::Select, None)
    }

    const fn new(
        name: &'static str,
        label: &'static str,
        widget: Widget,
        placeholder: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            label,
            widget,
            required: true,
            placeholder,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn class(&self) -> &'static str {
        FIELD_CLASS
    }

    pub fn placeholder(&self) -> Option<String> {
        self.placeholder
            .map(|prefix| format!("{prefix} {}", self.label.to_lowercase()))
    }
}
