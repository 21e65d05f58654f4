use crate::{
    metadata::{ComponentRegistry, SourceLocation},
    template::{CursorContext, CursorPosition},
};
use tower_lsp_server::ls_types::{Location, Position, Range, Uri};

/// Resolve the metadata source location a cursor context points at.
///
/// Component-ish positions jump to the component class; handler positions
/// jump to the method definition, falling back to the class when the
/// extractor did not record one.
pub fn lookup_definition(
    context: &CursorContext,
    registry: &ComponentRegistry,
) -> Option<SourceLocation> {
    let component = context
        .component_name
        .as_deref()
        .and_then(|name| registry.component(name));

    match context.position {
        CursorPosition::ComponentName
        | CursorPosition::AttributeName
        | CursorPosition::AttributeValue
        | CursorPosition::SlotName => component?.source.clone(),
        CursorPosition::HandlerName => {
            let component = component?;
            let name = context.current_value.as_deref()?;
            let method = component.methods.get(name)?;
            method.source.clone().or_else(|| component.source.clone())
        }
        CursorPosition::EventName | CursorPosition::Modifier | CursorPosition::Outside => None,
    }
}

/// Convert a metadata source location into an LSP `Location`.
pub fn location_for(source: &SourceLocation) -> Option<Location> {
    let uri: Uri = format!("file://{}", source.file).parse().ok()?;
    let line = source.line.saturating_sub(1);
    let position = Position::new(line, 0);
    Some(Location::new(uri, Range::new(position, position)))
}
