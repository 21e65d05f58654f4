use crate::{
    lsp::{
        WireviewLanguageServer,
        event_docs::event_doc,
        markdown::{MarkdownWriter, push_docs_section, signature_with_docs},
        position::position_to_byte,
    },
    metadata::{ComponentDef, ComponentRegistry},
    template::{CursorContext, CursorPosition, cursor_context},
};
use tower_lsp_server::{
    jsonrpc::Result,
    ls_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind},
};

pub fn hover(server: &WireviewLanguageServer, params: HoverParams) -> Result<Option<Hover>> {
    let response = (|| {
        if !server.hover_enabled() {
            return None;
        }
        let uri = params.text_document_position_params.text_document.uri;
        let uri_key = uri.to_string();
        let rope = server.document_map.get(&uri_key)?;
        let position = params.text_document_position_params.position;
        let offset = position_to_byte(position, &rope)?;
        let registry = server.registry();

        let text = rope.to_string();
        let context = cursor_context(&text, offset);
        let contents = hover_contents(&context, &registry)?;

        Some(Hover {
            contents,
            range: None,
        })
    })();

    Ok(response)
}

/// Render the documentation card for whatever identifier the cursor is on.
/// Returns `None` when there is nothing useful to show; that is never an
/// error condition.
pub fn hover_contents(
    context: &CursorContext,
    registry: &ComponentRegistry,
) -> Option<HoverContents> {
    let component = context
        .component_name
        .as_deref()
        .and_then(|name| registry.component(name));

    let value = match context.position {
        CursorPosition::ComponentName => component_card(component?),
        CursorPosition::AttributeName | CursorPosition::AttributeValue => {
            let component = component?;
            let name = context
                .attribute_name
                .as_deref()
                .or(context.current_value.as_deref())?;
            let field = component.fields.get(name)?;
            signature_with_docs(&field.signature(name), field.description.as_deref())?
        }
        CursorPosition::EventName => {
            let name = context
                .event_name
                .as_deref()
                .or(context.current_value.as_deref())?;
            signature_with_docs(&format!("event '{name}'"), event_doc(name))?
        }
        CursorPosition::Modifier => {
            let name = context.current_value.as_deref()?;
            let modifier = registry.modifier(name)?;
            signature_with_docs(&format!(".{name}"), modifier.description.as_deref())?
        }
        CursorPosition::HandlerName => {
            let component = component?;
            let name = context.current_value.as_deref()?;
            let method = component.methods.get(name)?;
            signature_with_docs(&method.signature(name), method.docstring.as_deref())?
        }
        CursorPosition::SlotName => {
            let name = context.current_value.as_deref()?;
            let slot = component
                .and_then(|component| component.slots.get(name))
                .or_else(|| {
                    registry
                        .all_slots()
                        .iter()
                        .find(|(slot_name, _)| slot_name == name)
                        .map(|(_, slot)| slot)
                })?;
            signature_with_docs(&slot.signature(name), slot.doc.as_deref())?
        }
        CursorPosition::Outside => return None,
    };

    Some(HoverContents::Markup(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    }))
}

fn component_card(component: &ComponentDef) -> String {
    let mut writer = MarkdownWriter::default();
    writer.push_signature(&format!("component '{}'", component.name));
    if let Some(fqn) = &component.fqn {
        writer.push_text(format!("`{fqn}`"));
    }
    push_docs_section(&mut writer, component.doc.as_deref());
    writer.finish().unwrap_or_default()
}
