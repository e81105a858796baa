use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// One row of buttons, one per option. The option text is both the label and
/// the callback payload, so the payload is what gets scored.
pub(crate) fn options_keyboard(options: &[String]) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = options
        .iter()
        .map(|option| InlineKeyboardButton::callback(option.clone(), option.clone()))
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}
