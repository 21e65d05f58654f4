use ropey::Rope;
use tower_lsp_server::ls_types::Position;

/// Convert a character-offset into an LSP `Position`.
pub fn offset_to_position(offset: usize, rope: &Rope) -> Option<Position> {
    let line = rope.try_char_to_line(offset).ok()?;
    let first_char_of_line = rope.try_line_to_char(line).ok()?;
    let column = offset.saturating_sub(first_char_of_line);
    Some(Position::new(line as u32, column as u32))
}

/// Convert an LSP `Position` into a character-offset.
pub fn position_to_offset(position: Position, rope: &Rope) -> Option<usize> {
    let line_idx = position.line as usize;
    if line_idx >= rope.len_lines() {
        return None;
    }

    let line_start = rope.try_line_to_char(line_idx).ok()?;
    let column = position.character as usize;
    let line_slice = rope.line(line_idx);
    if column > line_slice.len_chars() {
        return None;
    }

    Some(line_start + column)
}

/// Convert an LSP `Position` into the byte-offset the template core expects.
pub fn position_to_byte(position: Position, rope: &Rope) -> Option<usize> {
    let chars = position_to_offset(position, rope)?;
    rope.try_char_to_byte(chars).ok()
}
