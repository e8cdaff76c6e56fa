use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X13},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::Point,
    text::{Baseline, Text},
    Drawable,
};
use providers::Panel;

use crate::Frame;

const HEADING_GAP: i32 = 6;

/// Draws a panel into a blanked frame: small heading on top, large value
/// below. Drawing into the owned frame cannot fail.
pub fn panel(frame: &mut Frame, padding: u32, panel: &Panel) {
    let heading_style = MonoTextStyle::new(&FONT_6X13, BinaryColor::On);
    let value_style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

    let x = padding as i32;
    let mut y = padding as i32;
    if let Some(heading) = &panel.heading {
        let _ = Text::with_baseline(heading, Point::new(x, y), heading_style, Baseline::Top)
            .draw(frame);
        y += FONT_6X13.character_size.height as i32 + HEADING_GAP;
    } else {
        // A bare value (the clock) sits lower so it reads centered.
        y += 12;
    }
    let _ = Text::with_baseline(&panel.value, Point::new(x, y), value_style, Baseline::Top)
        .draw(frame);
}

/// Startup screen shown while waiting for the first broker connection.
pub fn waiting(frame: &mut Frame, padding: u32) {
    let small = MonoTextStyle::new(&FONT_6X13, BinaryColor::On);
    let big = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let x = padding as i32;
    let top = padding as i32;

    let _ = Text::with_baseline("Waiting for", Point::new(x, top), small, Baseline::Top).draw(frame);
    let _ = Text::with_baseline("MQTT", Point::new(x, top + 19), big, Baseline::Top).draw(frame);
    let _ = Text::with_baseline("Connection", Point::new(x, top + 46), small, Baseline::Top)
        .draw(frame);
}
