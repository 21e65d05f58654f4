//! Cursor-context analysis for wireview template tags.
//!
//! Everything here is a pure function of `(document, offset)`: the locator
//! finds the `{% ... %}` tag around a byte offset, the classifier names the
//! tag, and a per-kind analyzer inspects the text before the cursor to work
//! out which identifier is being typed. The resulting [`CursorContext`] is
//! the sole contract between this module and the completion, hover, and
//! definition providers.
//!
//! Malformed or half-typed input never produces an error. Every path that
//! fails to recognize something degrades to [`CursorPosition::Outside`],
//! since these queries run on every keystroke against documents that are
//! mid-edit more often than not.

/// A located `{% ... %}` span inside a template document.
///
/// `text` is exactly `document[start..end]`, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// The recognized wireview tag keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Component,
    ComponentBlock,
    On,
    Fill,
    RenderSlot,
}

impl TagKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TagKind::Component => "component",
            TagKind::ComponentBlock => "component_block",
            TagKind::On => "on",
            TagKind::Fill => "fill",
            TagKind::RenderSlot => "render_slot",
        }
    }
}

/// Which syntactic slot of a tag the cursor occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorPosition {
    ComponentName,
    AttributeName,
    AttributeValue,
    HandlerName,
    EventName,
    Modifier,
    SlotName,
    #[default]
    Outside,
}

/// The structured result of a single cursor query.
///
/// `position != Outside` implies `in_tag`. `current_value` holds the partial
/// text already typed at the cursor and is used by providers as a completion
/// filter prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CursorContext {
    pub in_tag: bool,
    pub tag_kind: Option<TagKind>,
    pub position: CursorPosition,
    pub component_name: Option<String>,
    pub attribute_name: Option<String>,
    pub event_name: Option<String>,
    pub current_value: Option<String>,
}

impl CursorContext {
    fn in_tag(kind: TagKind) -> Self {
        Self {
            in_tag: true,
            tag_kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Compute the cursor context for a byte `offset` within `document`.
///
/// This is the full pipeline: locate the enclosing tag, classify it, and run
/// the kind-specific analyzer. Offsets past the end of the document resolve
/// to the default (outside) context.
pub fn cursor_context(document: &str, offset: usize) -> CursorContext {
    let Some(tag) = locate_enclosing_tag(document, offset) else {
        return CursorContext::default();
    };
    let Some(kind) = classify(tag.text) else {
        return CursorContext::default();
    };
    let relative = floor_char_boundary(tag.text, offset - tag.start);
    match kind {
        TagKind::Component | TagKind::ComponentBlock => analyze_component(tag.text, relative, kind),
        TagKind::On => analyze_on(tag.text, relative, document, offset),
        TagKind::Fill => {
            let mut context = analyze_fill(tag.text, relative);
            context.component_name = find_parent_component(document, tag.start);
            context
        }
        TagKind::RenderSlot => analyze_render_slot(tag.text, relative),
    }
}

/// Scan `content` for the `{% ... %}` span containing `offset`.
///
/// Spans are matched left to right and do not nest: each `{%` pairs with the
/// nearest following `%}`. The offsets of both delimiter characters count as
/// inside, the offset one past the closing `}` does not. An unterminated
/// `{%` ends the scan with no match.
pub fn locate_enclosing_tag(content: &str, offset: usize) -> Option<Tag<'_>> {
    if offset > content.len() {
        return None;
    }
    let mut search = 0;
    while let Some(found) = content[search..].find("{%") {
        let start = search + found;
        if start > offset {
            return None;
        }
        let close = content[start + 2..].find("%}")?;
        let end = start + 2 + close + 2;
        if offset < end {
            return Some(Tag {
                text: &content[start..end],
                start,
                end,
            });
        }
        search = end;
    }
    None
}

/// Identify the tag kind from the first bareword after the opening delimiter.
///
/// Tolerates the `{%-` trim marker and leading whitespace. Anything other
/// than the five wireview keywords yields `None`, which callers treat exactly
/// like "outside any tag".
pub fn classify(tag_text: &str) -> Option<TagKind> {
    let rest = tag_text.strip_prefix("{%")?;
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    match leading_word(rest.trim_start()) {
        "component" => Some(TagKind::Component),
        "component_block" => Some(TagKind::ComponentBlock),
        "on" => Some(TagKind::On),
        "fill" => Some(TagKind::Fill),
        "render_slot" => Some(TagKind::RenderSlot),
        _ => None,
    }
}

/// Analyze a `component` or `component_block` tag.
///
/// Discriminates, in priority order: typing inside the name string, typing
/// an attribute value (a trailing unmatched `=` or an open value quote), and
/// typing an attribute key. The component name is populated from the full
/// tag text whenever a terminated name string exists, even when the cursor
/// has moved past it.
pub fn analyze_component(tag_text: &str, offset: usize, kind: TagKind) -> CursorContext {
    let mut context = CursorContext::in_tag(kind);
    let offset = floor_char_boundary(tag_text, offset);
    let prefix = &tag_text[..offset];
    context.component_name = terminated_name(tag_text, kind);

    let Some(rest) = after_keyword(prefix, kind) else {
        return context;
    };
    let body = rest.trim_start();
    if body.len() == rest.len() || body.is_empty() {
        return context;
    }
    let quote = body.chars().next().unwrap_or_default();
    if quote != '\'' && quote != '"' {
        return context;
    }
    let partial = &body[1..];
    let Some(close) = partial.find(['\'', '"']) else {
        // Name string still open: the cursor is inside the component name.
        context.position = CursorPosition::ComponentName;
        context.current_value = Some(partial.to_string());
        if context.component_name.is_none() && !partial.is_empty() {
            context.component_name = Some(partial.to_string());
        }
        return context;
    };

    let after_close = &partial[close + 1..];
    let tail = after_close.trim_start();
    if tail.len() == after_close.len() {
        // Closing quote not followed by whitespace: not in attribute
        // territory yet.
        return context;
    }
    analyze_attribute_tail(context, tail)
}

/// Classify the attribute section of a component tag prefix.
///
/// `tail` is everything after the whitespace that follows the closed name
/// string. A trailing unmatched `=` means a value is about to start, an open
/// value quote means the cursor is inside one, and anything else is an
/// attribute key in progress (possibly empty).
fn analyze_attribute_tail(mut context: CursorContext, tail: &str) -> CursorContext {
    if let Some(before_eq) = tail.trim_end().strip_suffix('=') {
        let name = trailing_word(before_eq.trim_end());
        if !name.is_empty() {
            context.position = CursorPosition::AttributeValue;
            context.attribute_name = Some(name.to_string());
            context.current_value = Some(String::new());
            return context;
        }
    }
    if let Some(quote_at) = tail.rfind(['\'', '"']) {
        let value = &tail[quote_at + 1..];
        if let Some(before_eq) = tail[..quote_at].trim_end().strip_suffix('=') {
            let name = trailing_word(before_eq.trim_end());
            if !name.is_empty() {
                context.position = CursorPosition::AttributeValue;
                context.attribute_name = Some(name.to_string());
                context.current_value = Some(value.to_string());
                return context;
            }
        }
    }
    context.position = CursorPosition::AttributeName;
    context.current_value = Some(trailing_word(tail).to_string());
    context
}

/// Analyze an `on` tag.
///
/// The first quoted string is the event (with dot-separated modifiers), the
/// second is the handler. The event name is carried even while unfinished;
/// the modifier/event split always takes the last dot as the boundary, so
/// only the segment after it is ever "in progress". Handler positions
/// resolve the enclosing component against the full document.
pub fn analyze_on(
    tag_text: &str,
    offset: usize,
    document: &str,
    absolute_offset: usize,
) -> CursorContext {
    let mut context = CursorContext::in_tag(TagKind::On);
    let offset = floor_char_boundary(tag_text, offset);
    let prefix = &tag_text[..offset];
    context.event_name = leading_event_name(tag_text);

    let Some(rest) = after_keyword(prefix, TagKind::On) else {
        return context;
    };
    let body = rest.trim_start();
    if body.len() == rest.len() || body.is_empty() {
        return context;
    }
    let quote = body.chars().next().unwrap_or_default();
    if quote != '\'' && quote != '"' {
        return context;
    }
    let inner = &body[1..];
    let Some(close) = inner.find(['\'', '"']) else {
        // Event string still open: typing an event name or a modifier.
        match inner.rfind('.') {
            Some(dot) => {
                context.position = CursorPosition::Modifier;
                context.current_value = Some(inner[dot + 1..].to_string());
            }
            None => {
                context.position = CursorPosition::EventName;
                context.current_value = Some(inner.to_string());
            }
        }
        return context;
    };

    // Event string closed. Both remaining checks anchor at the end of the
    // prefix; a quote ending the event string itself counts as the closing
    // quote they require.
    let after_close = &inner[close + 1..];

    // `['"]\s+['"]partial$` — the cursor is inside an open handler string.
    if let Some(quote_at) = after_close.rfind(['\'', '"']) {
        let partial = &after_close[quote_at + 1..];
        let before = &after_close[..quote_at];
        let trimmed = before.trim_end();
        let has_ws = trimmed.len() < before.len();
        if has_ws && (trimmed.is_empty() || trimmed.ends_with(['\'', '"'])) {
            context.position = CursorPosition::HandlerName;
            context.current_value = Some(partial.to_string());
            context.component_name = find_parent_component(document, absolute_offset);
            return context;
        }
    }

    // `['"]\s+$` — a closed string then whitespace: poised to start the
    // handler string.
    let trimmed = after_close.trim_end();
    if trimmed.len() < after_close.len() && (trimmed.is_empty() || trimmed.ends_with(['\'', '"'])) {
        context.position = CursorPosition::HandlerName;
        context.current_value = Some(String::new());
        context.component_name = find_parent_component(document, absolute_offset);
    }
    context
}

/// Analyze a `fill` tag. The caller attaches the enclosing component.
pub fn analyze_fill(tag_text: &str, offset: usize) -> CursorContext {
    analyze_slot_name(tag_text, offset, TagKind::Fill)
}

/// Analyze a `render_slot` tag. Carries no component association.
pub fn analyze_render_slot(tag_text: &str, offset: usize) -> CursorContext {
    analyze_slot_name(tag_text, offset, TagKind::RenderSlot)
}

/// Shared shape for `fill` and `render_slot`: a partial slot name right
/// after the keyword, either bare, single-quoted, or double-quoted. Bare is
/// checked first since slot names are commonly unquoted identifiers.
fn analyze_slot_name(tag_text: &str, offset: usize, kind: TagKind) -> CursorContext {
    let mut context = CursorContext::in_tag(kind);
    let offset = floor_char_boundary(tag_text, offset);
    let prefix = &tag_text[..offset];
    let Some(rest) = after_keyword(prefix, kind) else {
        return context;
    };
    let body = rest.trim_start();
    if body.len() == rest.len() {
        return context;
    }
    if body.bytes().all(is_word_byte) {
        context.position = CursorPosition::SlotName;
        context.current_value = Some(body.to_string());
        return context;
    }
    if let Some(inner) = body.strip_prefix('\'') {
        if !inner.contains('\'') {
            context.position = CursorPosition::SlotName;
            context.current_value = Some(inner.to_string());
        }
        return context;
    }
    if let Some(inner) = body.strip_prefix('"') {
        if !inner.contains('"') {
            context.position = CursorPosition::SlotName;
            context.current_value = Some(inner.to_string());
        }
        return context;
    }
    context
}

const BLOCK_OPEN: &str = "component_block";
const BLOCK_CLOSE: &str = "endcomponent_block";

/// Resolve the innermost `component_block` enclosing `offset`.
///
/// Walks `document[..offset]` once, consuming opening tags (which push their
/// captured name) and `endcomponent_block` occurrences (which pop) in
/// document order. Unmatched closes are ignored rather than treated as an
/// imbalance, tolerating documents that are mid-edit.
pub fn find_parent_component(document: &str, offset: usize) -> Option<String> {
    let end = floor_char_boundary(document, offset.min(document.len()));
    let text = &document[..end];
    let mut stack: Vec<String> = Vec::new();
    let mut pos = 0;
    loop {
        let open = next_block_open(text, pos);
        let close = text[pos..].find(BLOCK_CLOSE).map(|found| pos + found);
        match (open, close) {
            (Some((open_at, _, _)), Some(close_at)) if close_at < open_at => {
                stack.pop();
                pos = close_at + BLOCK_CLOSE.len();
            }
            (Some((_, name, resume)), _) => {
                stack.push(name);
                pos = resume;
            }
            (None, Some(close_at)) => {
                stack.pop();
                pos = close_at + BLOCK_CLOSE.len();
            }
            (None, None) => break,
        }
    }
    stack.pop()
}

/// Find the next `component_block '<name>'` opener at or after `pos`.
///
/// Returns the match position, the captured name, and the offset to resume
/// scanning from. Keyword occurrences without a quoted name (including the
/// one embedded in every `endcomponent_block`) are skipped.
fn next_block_open(text: &str, mut pos: usize) -> Option<(usize, String, usize)> {
    while let Some(found) = text[pos..].find(BLOCK_OPEN) {
        let at = pos + found;
        let rest = &text[at + BLOCK_OPEN.len()..];
        if let Some((name, consumed)) = quoted_name(rest) {
            return Some((at, name, at + BLOCK_OPEN.len() + consumed));
        }
        pos = at + BLOCK_OPEN.len();
    }
    None
}

/// Match whitespace followed by a terminated quoted name at the start of
/// `text`, returning the name and the number of bytes consumed.
fn quoted_name(text: &str) -> Option<(String, usize)> {
    let body = text.trim_start();
    let ws = text.len() - body.len();
    if ws == 0 {
        return None;
    }
    let quote = body.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let inner = &body[1..];
    let close = inner.find(['\'', '"'])?;
    if close == 0 {
        return None;
    }
    Some((inner[..close].to_string(), ws + 1 + close + 1))
}

/// Extract the terminated component name from a full tag text, if present.
fn terminated_name(tag_text: &str, kind: TagKind) -> Option<String> {
    let rest = after_keyword(tag_text, kind)?;
    let (name, _) = quoted_name(rest)?;
    Some(name)
}

/// Extract the carried event name from a full `on` tag text: the first
/// quoted string up to its first dot, quote, or end of the capture.
fn leading_event_name(tag_text: &str) -> Option<String> {
    let rest = after_keyword(tag_text, TagKind::On)?;
    let body = rest.trim_start();
    if body.len() == rest.len() {
        return None;
    }
    let quote = body.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let inner = &body[1..];
    let len = inner
        .bytes()
        .take_while(|b| *b != b'\'' && *b != b'"' && *b != b'.')
        .count();
    if len == 0 {
        return None;
    }
    Some(inner[..len].to_string())
}

/// Strip the opening delimiter, optional trim marker, and the expected
/// keyword from a tag prefix, returning the remainder.
fn after_keyword(text: &str, kind: TagKind) -> Option<&str> {
    let rest = text.strip_prefix("{%")?;
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    let rest = rest.trim_start();
    let keyword = leading_word(rest);
    if keyword != kind.keyword() {
        return None;
    }
    Some(&rest[keyword.len()..])
}

fn leading_word(text: &str) -> &str {
    let len = text.bytes().take_while(|b| is_word_byte(*b)).count();
    &text[..len]
}

fn trailing_word(text: &str) -> &str {
    let len = text.bytes().rev().take_while(|b| is_word_byte(*b)).count();
    &text[text.len() - len..]
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Largest char boundary at or below `index`, clamped to the text length.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_at(document: &str, needle: &str) -> CursorContext {
        let offset = document.find(needle).expect("needle in document") + needle.len();
        cursor_context(document, offset)
    }

    #[test]
    fn locator_matches_boundary_offsets_inclusively() {
        let document = "ab{% component 'X' %}cd";
        let open = document.find("{%").expect("open delimiter");
        let close = document.find("%}").expect("close delimiter") + 1;
        for offset in open..=close {
            let tag = locate_enclosing_tag(document, offset).expect("inside tag");
            assert_eq!(tag.text, "{% component 'X' %}");
            assert_eq!(tag.start, open);
        }
        assert!(
            locate_enclosing_tag(document, open - 1).is_none(),
            "offset one before the opening brace is outside"
        );
        assert!(
            locate_enclosing_tag(document, close + 1).is_none(),
            "offset one past the closing brace is outside"
        );
    }

    #[test]
    fn locator_returns_none_between_tags() {
        let document = "{% on 'x' 'y' %}--{% fill a %}";
        let gap = document.find("--").expect("gap") + 1;
        assert!(locate_enclosing_tag(document, gap).is_none());
    }

    #[test]
    fn locator_tag_text_matches_document_slice() {
        let document = "x{%- component_block 'A' %}y";
        let tag = locate_enclosing_tag(document, 5).expect("tag");
        assert_eq!(tag.text, &document[tag.start..tag.end]);
        assert!(tag.text.starts_with("{%") && tag.text.ends_with("%}"));
    }

    #[test]
    fn locator_degrades_gracefully_on_unterminated_tag() {
        let document = "text {% component 'X'";
        assert!(
            locate_enclosing_tag(document, document.len() - 1).is_none(),
            "unterminated tag must not match to end of document"
        );
    }

    #[test]
    fn locator_rejects_offsets_past_document_end() {
        assert!(locate_enclosing_tag("{% on 'x' %}", 999).is_none());
        assert!(locate_enclosing_tag("", 0).is_none());
    }

    #[test]
    fn classifier_recognizes_all_five_keywords() {
        let cases = [
            ("{% component 'X' %}", TagKind::Component),
            ("{% component_block 'X' %}", TagKind::ComponentBlock),
            ("{% on 'click' %}", TagKind::On),
            ("{% fill head %}", TagKind::Fill),
            ("{% render_slot 'head' %}", TagKind::RenderSlot),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text), Some(expected), "classifying {text}");
        }
    }

    #[test]
    fn classifier_tolerates_trim_marker() {
        assert_eq!(classify("{%- component 'X' %}"), Some(TagKind::Component));
        assert_eq!(classify("{%-on 'click' %}"), Some(TagKind::On));
    }

    #[test]
    fn classifier_rejects_unrecognized_keywords_without_panicking() {
        for text in ["{% if cond %}", "{% endcomponent_block %}", "{%", "{% %}", "{% 'x' %}"] {
            assert_eq!(classify(text), None, "classifying {text}");
        }
    }

    #[test]
    fn component_name_in_progress_single_quote() {
        let tag = "{% component 'Cou";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::ComponentName);
        assert_eq!(context.current_value.as_deref(), Some("Cou"));
        assert_eq!(context.component_name.as_deref(), Some("Cou"));
    }

    #[test]
    fn component_name_in_progress_double_quote() {
        let tag = "{% component_block \"Ca";
        let context = analyze_component(tag, tag.len(), TagKind::ComponentBlock);
        assert_eq!(context.position, CursorPosition::ComponentName);
        assert_eq!(context.current_value.as_deref(), Some("Ca"));
    }

    #[test]
    fn component_name_populated_when_cursor_mid_name() {
        let tag = "{% component 'Counter' %}";
        let offset = tag.find("nter").expect("mid-name");
        let context = analyze_component(tag, offset, TagKind::Component);
        assert_eq!(context.position, CursorPosition::ComponentName);
        assert_eq!(context.current_value.as_deref(), Some("Cou"));
        assert_eq!(
            context.component_name.as_deref(),
            Some("Counter"),
            "full name comes from the terminated string in the tag text"
        );
    }

    #[test]
    fn attribute_name_partial_word() {
        let tag = "{% component 'Counter' coun";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::AttributeName);
        assert_eq!(context.current_value.as_deref(), Some("coun"));
        assert_eq!(context.component_name.as_deref(), Some("Counter"));
    }

    #[test]
    fn attribute_value_after_bare_equals() {
        let tag = "{% component 'Counter' count=";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::AttributeValue);
        assert_eq!(context.attribute_name.as_deref(), Some("count"));
        assert_eq!(context.current_value.as_deref(), Some(""));
    }

    #[test]
    fn attribute_value_inside_open_quote() {
        let tag = "{% component 'Counter' label=\"He";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::AttributeValue);
        assert_eq!(context.attribute_name.as_deref(), Some("label"));
        assert_eq!(context.current_value.as_deref(), Some("He"));
    }

    #[test]
    fn attribute_name_after_completed_pair() {
        let tag = "{% component 'Counter' count=0 st";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::AttributeName);
        assert_eq!(context.current_value.as_deref(), Some("st"));
    }

    #[test]
    fn attribute_name_empty_after_whitespace() {
        let tag = "{% component 'Counter' count=0 ";
        let context = analyze_component(tag, tag.len(), TagKind::Component);
        assert_eq!(context.position, CursorPosition::AttributeName);
        assert_eq!(context.current_value.as_deref(), Some(""));
    }

    #[test]
    fn component_cursor_on_keyword_is_outside() {
        let tag = "{% component 'Counter' %}";
        let offset = tag.find("comp").expect("keyword") + 4;
        let context = analyze_component(tag, offset, TagKind::Component);
        assert_eq!(context.position, CursorPosition::Outside);
        assert!(context.in_tag);
        assert_eq!(context.component_name.as_deref(), Some("Counter"));
    }

    #[test]
    fn on_event_name_in_progress() {
        let tag = "{% on 'cli";
        let context = analyze_on(tag, tag.len(), tag, tag.len());
        assert_eq!(context.position, CursorPosition::EventName);
        assert_eq!(context.current_value.as_deref(), Some("cli"));
        assert_eq!(context.event_name.as_deref(), Some("cli"));
    }

    #[test]
    fn on_modifier_tie_break_prefers_last_dot() {
        let document = "{% on 'click.prevent.debounce' 'x' %}";
        let offset = document.find("debounce").expect("modifier") + "debounce".len();
        let context = cursor_context(document, offset);
        assert_eq!(context.position, CursorPosition::Modifier);
        assert_eq!(context.event_name.as_deref(), Some("click"));
        assert_eq!(
            context.current_value.as_deref(),
            Some("debounce"),
            "only the segment after the final dot is in progress"
        );
    }

    #[test]
    fn on_handler_name_open_string() {
        let document = "{% component_block 'Inner' %}{% on 'click' 'incr";
        let context = cursor_context(&format!("{document} %}}"), document.len());
        assert_eq!(context.position, CursorPosition::HandlerName);
        assert_eq!(context.current_value.as_deref(), Some("incr"));
        assert_eq!(context.component_name.as_deref(), Some("Inner"));
        assert_eq!(context.event_name.as_deref(), Some("click"));
    }

    #[test]
    fn on_handler_poised_after_closed_event_string() {
        let tag = "{% on 'click' ";
        let context = analyze_on(tag, tag.len(), tag, tag.len());
        assert_eq!(context.position, CursorPosition::HandlerName);
        assert_eq!(context.current_value.as_deref(), Some(""));
    }

    #[test]
    fn on_carries_event_name_when_position_outside() {
        let tag = "{% on 'click.stop' 'handler'";
        let context = analyze_on(tag, tag.len(), tag, tag.len());
        assert_eq!(context.position, CursorPosition::Outside);
        assert_eq!(context.event_name.as_deref(), Some("click"));
    }

    #[test]
    fn on_whitespace_after_closed_handler_string_reopens_handler_position() {
        let tag = "{% on 'click' 'handler' ";
        let context = analyze_on(tag, tag.len(), tag, tag.len());
        assert_eq!(context.position, CursorPosition::HandlerName);
        assert_eq!(context.current_value.as_deref(), Some(""));
    }

    #[test]
    fn on_cursor_before_event_string_is_outside() {
        let tag = "{% on 'click' 'handler' %}";
        let offset = tag.find('\'').expect("first quote");
        let context = analyze_on(tag, offset, tag, offset);
        assert_eq!(context.position, CursorPosition::Outside);
        assert_eq!(context.event_name.as_deref(), Some("click"));
    }

    #[test]
    fn parent_resolution_returns_innermost_block() {
        let document =
            "{% component_block 'Outer' %}{% component_block 'Inner' %}{% on 'click' 'h' %}";
        let offset = document.find("'h'").expect("handler") + 1;
        assert_eq!(
            find_parent_component(document, offset).as_deref(),
            Some("Inner")
        );
    }

    #[test]
    fn parent_resolution_pops_on_end_tag() {
        let document = "{% component_block 'Outer' %}{% component_block 'Inner' %}\
                        {% endcomponent_block %}{% on 'click' 'h' %}";
        let offset = document.find("'h'").expect("handler") + 1;
        assert_eq!(
            find_parent_component(document, offset).as_deref(),
            Some("Outer")
        );
    }

    #[test]
    fn parent_resolution_ignores_unmatched_closes() {
        let document = "{% endcomponent_block %}{% component_block 'A' %}text";
        assert_eq!(
            find_parent_component(document, document.len()).as_deref(),
            Some("A")
        );
    }

    #[test]
    fn parent_resolution_empty_outside_any_block() {
        assert_eq!(find_parent_component("plain text", 10), None);
        assert_eq!(
            find_parent_component("{% component_block 'A' %}{% endcomponent_block %}after", 54),
            None
        );
    }

    #[test]
    fn parent_resolution_skips_keyword_inside_end_tag() {
        // `endcomponent_block` contains the opener keyword as a substring;
        // it must count only as a close.
        let document = "{% component_block 'A' %}{% endcomponent_block 'A' %}x";
        assert_eq!(find_parent_component(document, document.len()), None);
    }

    #[test]
    fn fill_bare_and_quoted_slot_names_agree() {
        for tag in ["{% fill head", "{% fill 'head", "{% fill \"head"] {
            let context = analyze_fill(tag, tag.len());
            assert_eq!(context.position, CursorPosition::SlotName, "for {tag}");
            assert_eq!(context.current_value.as_deref(), Some("head"), "for {tag}");
        }
    }

    #[test]
    fn fill_empty_partial_after_keyword() {
        let tag = "{% fill ";
        let context = analyze_fill(tag, tag.len());
        assert_eq!(context.position, CursorPosition::SlotName);
        assert_eq!(context.current_value.as_deref(), Some(""));
    }

    #[test]
    fn fill_past_completed_name_is_outside() {
        let tag = "{% fill head extra";
        let context = analyze_fill(tag, tag.len());
        assert_eq!(context.position, CursorPosition::Outside);
    }

    #[test]
    fn render_slot_matches_without_component_association() {
        let document = "{% component_block 'Card' %}{% render_slot hea %}";
        let offset = document.find("hea").expect("slot") + 3;
        let context = cursor_context(document, offset);
        assert_eq!(context.position, CursorPosition::SlotName);
        assert_eq!(context.current_value.as_deref(), Some("hea"));
        assert_eq!(context.component_name, None);
    }

    #[test]
    fn fill_attaches_enclosing_component() {
        let document = "{% component_block 'Card' %}{% fill hea %}";
        let offset = document.find("hea").expect("slot") + 3;
        let context = cursor_context(document, offset);
        assert_eq!(context.position, CursorPosition::SlotName);
        assert_eq!(context.component_name.as_deref(), Some("Card"));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let document = "{% component_block 'Outer' %}{% on 'click.stop' 'run' %}";
        for offset in 0..=document.len() {
            let first = cursor_context(document, offset);
            let second = cursor_context(document, offset);
            assert_eq!(first, second, "context at offset {offset} must be stable");
        }
    }

    #[test]
    fn position_outside_implies_in_tag_invariant() {
        let document = "text {% component 'X' a=1 %} {% bogus %} {% fill f %} end";
        for offset in 0..=document.len() {
            let context = cursor_context(document, offset);
            if context.position != CursorPosition::Outside {
                assert!(
                    context.in_tag,
                    "non-outside position at offset {offset} must be inside a tag"
                );
            }
        }
    }

    #[test]
    fn unrecognized_tag_produces_default_context() {
        let document = "{% if user.is_authenticated %}";
        let context = cursor_context(document, 10);
        assert_eq!(context, CursorContext::default());
    }

    #[test]
    fn offsets_past_document_end_produce_default_context() {
        let context = cursor_context("{% on 'x' %}", 500);
        assert_eq!(context, CursorContext::default());
    }

    #[test]
    fn multibyte_document_does_not_panic() {
        let document = "héllo {% component 'Bädge' %} wörld";
        for offset in 0..=document.len() + 2 {
            let _ = cursor_context(document, offset);
        }
    }

    #[test]
    fn pipeline_attribute_contexts_match_analyzer() {
        let document = "{% component 'Counter' count=0 ste %}";
        let context = context_at(document, "ste");
        assert_eq!(context.position, CursorPosition::AttributeName);
        assert_eq!(context.current_value.as_deref(), Some("ste"));
        assert_eq!(context.tag_kind, Some(TagKind::Component));
    }
}
