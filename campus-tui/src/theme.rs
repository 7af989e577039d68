//! SynthBrute theme and color utilities.

use campus_core::{PaymentStatus, StudentStatus};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct SynthBruteTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub tertiary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border_focus: Color,
}

impl SynthBruteTheme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            tertiary: Color::Rgb(255, 255, 0),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 255, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            text_muted: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

pub fn student_status_color(status: StudentStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        StudentStatus::Active => theme.primary,
        StudentStatus::Inactive => theme.text_dim,
        StudentStatus::Graduated => theme.success,
        StudentStatus::Suspended => theme.warning,
    }
}

pub fn payment_status_color(status: PaymentStatus, theme: &SynthBruteTheme) -> Color {
    match status {
        PaymentStatus::Pending => theme.warning,
        PaymentStatus::Completed => theme.success,
        PaymentStatus::Failed => theme.error,
        PaymentStatus::Refunded => theme.secondary,
    }
}

/// Color of the "loaded / total" gauge.
pub fn progress_color(percent: f32, theme: &SynthBruteTheme) -> Color {
    if percent >= 100.0 {
        theme.success
    } else if percent >= 50.0 {
        theme.primary
    } else {
        theme.primary_dim
    }
}
