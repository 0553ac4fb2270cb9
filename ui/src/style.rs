//! Centralised colors, spacing and widget styles for the feed UI. New
//! components should build on these helpers so the application keeps a
//! consistent look.

use iced::theme;
use iced::widget::{button, container, text_input};
use iced::{Border, Color};

/// Application color palette.
pub struct Palette;

impl Palette {
    pub const PRIMARY: Color = Color { r: 0.13, g: 0.45, b: 0.85, a: 1.0 };
    pub const ON_PRIMARY: Color = Color::WHITE;
    pub const SURFACE: Color = Color { r: 0.98, g: 0.98, b: 0.98, a: 1.0 };
    pub const ON_SURFACE: Color = Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 };
    pub const ERROR: Color = Color { r: 0.80, g: 0.0, b: 0.0, a: 1.0 };
    pub const OVERLAY_BACKDROP: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.92 };
    pub const TOPBAR: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.55 };
    pub const SELECTED: Color = Color { r: 0.13, g: 0.45, b: 0.85, a: 0.35 };

    pub const SPACING: u16 = 16;
    pub const THUMB_SIZE: f32 = 150.0;
}

/// Style for primary action buttons.
pub fn button_primary() -> theme::Button {
    theme::Button::Custom(Box::new(Solid(Palette::PRIMARY)))
}

/// Style for destructive actions (delete).
pub fn button_danger() -> theme::Button {
    theme::Button::Custom(Box::new(Solid(Palette::ERROR)))
}

/// Borderless button wrapping a thumbnail; selected thumbnails get a
/// tinted outline.
pub fn button_thumb(selected: bool) -> theme::Button {
    theme::Button::Custom(Box::new(Thumb { selected }))
}

struct Solid(Color);

impl button::StyleSheet for Solid {
    type Style = iced::Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(self.0.into()),
            text_color: Palette::ON_PRIMARY,
            border: Border::with_radius(4.0),
            ..Default::default()
        }
    }
}

struct Thumb {
    selected: bool,
}

impl button::StyleSheet for Thumb {
    type Style = iced::Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: if self.selected {
                Some(Palette::SELECTED.into())
            } else {
                None
            },
            border: Border {
                color: if self.selected {
                    Palette::PRIMARY
                } else {
                    Color::TRANSPARENT
                },
                width: if self.selected { 2.0 } else { 0.0 },
                radius: 4.0.into(),
            },
            ..Default::default()
        }
    }
}

/// Basic text input styling.
pub fn text_input_basic() -> theme::TextInput {
    theme::TextInput::Custom(Box::new(TextInputBasic))
}

struct TextInputBasic;

impl text_input::StyleSheet for TextInputBasic {
    type Style = iced::Theme;

    fn active(&self, _style: &Self::Style) -> text_input::Appearance {
        text_input::Appearance {
            background: Palette::SURFACE.into(),
            border: Border {
                color: Palette::PRIMARY,
                width: 1.0,
                radius: 4.0.into(),
            },
            icon_color: Palette::ON_SURFACE,
        }
    }

    fn focused(&self, style: &Self::Style) -> text_input::Appearance {
        self.active(style)
    }

    fn disabled(&self, style: &Self::Style) -> text_input::Appearance {
        self.active(style)
    }

    fn placeholder_color(&self, _style: &Self::Style) -> Color {
        Color { a: 0.5, ..Palette::ON_SURFACE }
    }

    fn value_color(&self, _style: &Self::Style) -> Color {
        Palette::ON_SURFACE
    }

    fn disabled_color(&self, _style: &Self::Style) -> Color {
        Color { a: 0.5, ..Palette::ON_SURFACE }
    }

    fn selection_color(&self, _style: &Self::Style) -> Color {
        Palette::SELECTED
    }
}

/// Container style for dialog cards.
pub fn card() -> theme::Container {
    theme::Container::Custom(Box::new(|_theme: &iced::Theme| container::Appearance {
        background: Some(Palette::SURFACE.into()),
        text_color: Some(Palette::ON_SURFACE),
        border: Border {
            color: Palette::PRIMARY,
            width: 1.0,
            radius: 4.0.into(),
        },
        shadow: Default::default(),
    }))
}

/// Near-black backdrop for the single-photo overlay.
pub fn overlay_backdrop() -> theme::Container {
    theme::Container::Custom(Box::new(|_theme: &iced::Theme| container::Appearance {
        background: Some(Palette::OVERLAY_BACKDROP.into()),
        text_color: Some(Color::WHITE),
        ..Default::default()
    }))
}

/// Translucent strip for the overlay's top bar.
pub fn overlay_topbar() -> theme::Container {
    theme::Container::Custom(Box::new(|_theme: &iced::Theme| container::Appearance {
        background: Some(Palette::TOPBAR.into()),
        text_color: Some(Color::WHITE),
        ..Default::default()
    }))
}

/// Banner for surfaced errors.
pub fn error_banner() -> theme::Container {
    theme::Container::Custom(Box::new(|_theme: &iced::Theme| container::Appearance {
        background: Some(Color { a: 0.1, ..Palette::ERROR }.into()),
        text_color: Some(Palette::ERROR),
        border: Border {
            color: Palette::ERROR,
            width: 1.0,
            radius: 4.0.into(),
        },
        shadow: Default::default(),
    }))
}
