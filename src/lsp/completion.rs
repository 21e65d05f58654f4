use crate::{
    lsp::{
        WireviewLanguageServer,
        event_docs::EVENTS,
        markdown::signature_with_docs,
        position::position_to_byte,
        tasks::{DocumentTaskKind, DocumentTaskToken},
    },
    metadata::{ComponentDef, ComponentRegistry},
    template::{CursorContext, CursorPosition, cursor_context},
};
#[cfg(feature = "tracing")]
use std::time::Instant;
use tower_lsp_server::{
    jsonrpc::Result,
    ls_types::{
        CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse, Documentation,
        MarkupContent, MarkupKind,
    },
};

#[cfg(feature = "tracing")]
struct PhaseTimer<'a> {
    uri: &'a str,
    phase: &'static str,
    start: Instant,
}

#[cfg(feature = "tracing")]
impl<'a> PhaseTimer<'a> {
    fn new(uri: &'a str, phase: &'static str) -> Self {
        tracing::trace!(target = "completion", uri = uri, phase = phase, "start");
        Self {
            uri,
            phase,
            start: Instant::now(),
        }
    }
}

#[cfg(feature = "tracing")]
impl<'a> Drop for PhaseTimer<'a> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::debug!(
            target = "completion",
            uri = self.uri,
            phase = self.phase,
            elapsed_us = elapsed.as_micros()
        );
    }
}

#[derive(Debug)]
enum CompletionBuildOutcome {
    Completed(Vec<CompletionItem>),
    Cancelled,
}

pub async fn completion(
    server: &WireviewLanguageServer,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    if !server.completion_enabled() {
        return Ok(None);
    }

    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    let uri_key = uri.to_string();

    let Some(rope) = server
        .document_map
        .get(&uri_key)
        .map(|doc| doc.value().clone())
    else {
        return Ok(None);
    };
    let Some(offset) = position_to_byte(position, &rope) else {
        return Ok(Some(CompletionResponse::Array(Vec::new())));
    };

    let registry = server.registry();
    let token = server.task_token(&uri_key, DocumentTaskKind::Completion);

    let text = rope.to_string();
    let context = {
        #[cfg(feature = "tracing")]
        let _context_timer = PhaseTimer::new(&uri_key, "cursor_context");
        cursor_context(&text, offset)
    };

    let items = {
        #[cfg(feature = "tracing")]
        let _build_timer = PhaseTimer::new(&uri_key, "build_completion_items");
        match build_completion_items_async(&context, &registry, token).await {
            CompletionBuildOutcome::Completed(items) => items,
            CompletionBuildOutcome::Cancelled => {
                #[cfg(feature = "tracing")]
                tracing::debug!(target = "completion", uri = %uri_key, "cancelled");
                Vec::new()
            }
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target = "completion",
        uri = %uri_key,
        ?context,
        completion_items = items.len()
    );

    Ok(Some(CompletionResponse::Array(items)))
}

async fn build_completion_items_async(
    context: &CursorContext,
    registry: &ComponentRegistry,
    token: DocumentTaskToken,
) -> CompletionBuildOutcome {
    if token.yield_and_check().await.is_err() {
        return CompletionBuildOutcome::Cancelled;
    }
    CompletionBuildOutcome::Completed(completion_items(context, registry))
}

/// Build the completion items for a cursor context. An `Outside` context
/// yields an empty list, never an error.
pub fn completion_items(context: &CursorContext, registry: &ComponentRegistry) -> Vec<CompletionItem> {
    let filter = context.current_value.as_deref().unwrap_or("");
    match context.position {
        CursorPosition::ComponentName => component_items(registry, filter),
        CursorPosition::AttributeName => attribute_name_items(context, registry, filter),
        CursorPosition::AttributeValue => attribute_value_items(context, registry),
        CursorPosition::EventName => event_items(filter),
        CursorPosition::Modifier => modifier_items(registry, filter),
        CursorPosition::HandlerName => handler_items(context, registry, filter),
        CursorPosition::SlotName => slot_items(context, registry, filter),
        CursorPosition::Outside => Vec::new(),
    }
}

fn component_items(registry: &ComponentRegistry, filter: &str) -> Vec<CompletionItem> {
    registry
        .components()
        .filter(|component| component.name.starts_with(filter))
        .map(|component| {
            build_completion_item(
                &component.name,
                CompletionItemKind::CLASS,
                component.fqn.as_deref(),
                component_docs(component),
            )
        })
        .collect()
}

fn component_docs(component: &ComponentDef) -> Option<String> {
    signature_with_docs(
        &format!("component '{}'", component.name),
        component.doc.as_deref(),
    )
}

fn attribute_name_items(
    context: &CursorContext,
    registry: &ComponentRegistry,
    filter: &str,
) -> Vec<CompletionItem> {
    let Some(component) = lookup_component(context, registry) else {
        return Vec::new();
    };
    component
        .fields
        .iter()
        .filter(|(name, _)| name.starts_with(filter))
        .map(|(name, field)| {
            build_completion_item(
                name,
                CompletionItemKind::FIELD,
                field.ty.as_deref(),
                signature_with_docs(&field.signature(name), field.description.as_deref()),
            )
        })
        .collect()
}

fn attribute_value_items(
    context: &CursorContext,
    registry: &ComponentRegistry,
) -> Vec<CompletionItem> {
    let Some(component) = lookup_component(context, registry) else {
        return Vec::new();
    };
    let Some(name) = context.attribute_name.as_deref() else {
        return Vec::new();
    };
    let Some(field) = component.fields.get(name) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    if let Some(default) = &field.default {
        items.push(build_completion_item(
            &default.to_string(),
            CompletionItemKind::VALUE,
            Some("default"),
            field.description.clone(),
        ));
    }
    if field.ty.as_deref() == Some("bool") {
        for literal in ["true", "false"] {
            if items.iter().all(|item| item.label != literal) {
                items.push(build_completion_item(
                    literal,
                    CompletionItemKind::VALUE,
                    field.ty.as_deref(),
                    None,
                ));
            }
        }
    }
    items
}

fn event_items(filter: &str) -> Vec<CompletionItem> {
    EVENTS
        .iter()
        .filter(|event| event.name.starts_with(filter))
        .map(|event| {
            build_completion_item(
                event.name,
                CompletionItemKind::EVENT,
                Some("browser event"),
                Some(event.doc.to_string()),
            )
        })
        .collect()
}

fn modifier_items(registry: &ComponentRegistry, filter: &str) -> Vec<CompletionItem> {
    registry
        .modifiers()
        .filter(|(name, _)| name.starts_with(filter))
        .map(|(name, modifier)| {
            let detail = if modifier.has_argument {
                "event modifier (takes an argument)"
            } else {
                "event modifier"
            };
            build_completion_item(
                name,
                CompletionItemKind::ENUM_MEMBER,
                Some(detail),
                modifier.description.clone(),
            )
        })
        .collect()
}

fn handler_items(
    context: &CursorContext,
    registry: &ComponentRegistry,
    filter: &str,
) -> Vec<CompletionItem> {
    let Some(component) = lookup_component(context, registry) else {
        return Vec::new();
    };
    component
        .methods
        .iter()
        .filter(|(name, _)| name.starts_with(filter))
        .map(|(name, method)| {
            let signature = method.signature(name);
            build_completion_item(
                name,
                CompletionItemKind::METHOD,
                Some(&signature),
                signature_with_docs(&signature, method.docstring.as_deref()),
            )
        })
        .collect()
}

fn slot_items(
    context: &CursorContext,
    registry: &ComponentRegistry,
    filter: &str,
) -> Vec<CompletionItem> {
    // `fill` resolves against the enclosing component; `render_slot` (and a
    // fill outside any block) falls back to the union of all known slots.
    if let Some(component) = lookup_component(context, registry) {
        return component
            .slots
            .iter()
            .filter(|(name, _)| name.starts_with(filter))
            .map(|(name, slot)| {
                build_completion_item(
                    name,
                    CompletionItemKind::PROPERTY,
                    Some("slot"),
                    signature_with_docs(&slot.signature(name), slot.doc.as_deref()),
                )
            })
            .collect();
    }
    registry
        .all_slots()
        .iter()
        .filter(|(name, _)| name.starts_with(filter))
        .map(|(name, slot)| {
            build_completion_item(
                name,
                CompletionItemKind::PROPERTY,
                Some("slot"),
                signature_with_docs(&slot.signature(name), slot.doc.as_deref()),
            )
        })
        .collect()
}

fn lookup_component<'a>(
    context: &CursorContext,
    registry: &'a ComponentRegistry,
) -> Option<&'a ComponentDef> {
    let name = context.component_name.as_deref()?;
    registry.component(name)
}

fn build_completion_item(
    label: &str,
    kind: CompletionItemKind,
    detail: Option<&str>,
    docs: Option<String>,
) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        detail: detail.map(|text| text.to_string()),
        documentation: docs.map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        ..CompletionItem::default()
    }
}

#[cfg(any(test, feature = "bench"))]
pub mod bench_support {
    use super::*;
    use anyhow::Result;

    pub struct CompletionBenchFixture {
        source: String,
        registry: ComponentRegistry,
    }

    impl CompletionBenchFixture {
        pub fn load(template: &str, metadata: &str) -> Result<Self> {
            let registry = ComponentRegistry::from_json_str(metadata)?;
            Ok(Self {
                source: template.to_string(),
                registry,
            })
        }

        /// Byte offset just past the first occurrence of `needle`.
        pub fn offset_after(&self, needle: &str) -> Option<usize> {
            Some(self.source.find(needle)? + needle.len())
        }

        pub fn context_at(&self, offset: usize) -> CursorContext {
            cursor_context(&self.source, offset)
        }

        pub fn completion_items_at(&self, offset: usize) -> usize {
            let context = cursor_context(&self.source, offset);
            completion_items(&context, &self.registry).len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::tasks::{DocumentTaskKind, DocumentTaskState};
    use crate::template::TagKind;

    const METADATA: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/metadata.json"
    ));

    fn registry() -> ComponentRegistry {
        ComponentRegistry::from_json_str(METADATA).expect("parse metadata fixture")
    }

    fn context_for(document: &str, needle: &str) -> CursorContext {
        let offset = document.find(needle).expect("needle") + needle.len();
        cursor_context(document, offset)
    }

    #[test]
    fn component_names_filter_by_typed_prefix() {
        let registry = registry();
        let context = context_for("{% component 'Ca %}", "'Ca");
        let items = completion_items(&context, &registry);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["Card"], "only prefix matches survive");
    }

    #[test]
    fn attribute_names_come_from_component_fields() {
        let registry = registry();
        let context = context_for("{% component 'Counter' co %}", "' co");
        let items = completion_items(&context, &registry);
        assert!(
            items.iter().any(|item| item.label == "count"),
            "field names should complete as attributes"
        );
        assert!(
            items.iter().all(|item| item.label.starts_with("co")),
            "prefix filter must hold"
        );
    }

    #[test]
    fn attribute_value_offers_field_default() {
        let registry = registry();
        let context = context_for("{% component 'Counter' count= %}", "count=");
        assert_eq!(context.position, CursorPosition::AttributeValue);
        let items = completion_items(&context, &registry);
        assert!(
            items.iter().any(|item| item.label == "0"),
            "default value should be offered"
        );
    }

    #[test]
    fn modifiers_complete_from_global_registry() {
        let registry = registry();
        let context = context_for("{% on 'click.de %}", ".de");
        assert_eq!(context.position, CursorPosition::Modifier);
        let items = completion_items(&context, &registry);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["debounce"]);
    }

    #[test]
    fn handler_names_resolve_through_parent_component() {
        let registry = registry();
        let document = "{% component_block 'Counter' %}{% on 'click' 'in %}";
        let context = context_for(document, "'in");
        assert_eq!(context.position, CursorPosition::HandlerName);
        assert_eq!(context.component_name.as_deref(), Some("Counter"));
        let items = completion_items(&context, &registry);
        assert!(
            items.iter().any(|item| item.label == "increment"),
            "methods of the enclosing component should complete"
        );
    }

    #[test]
    fn render_slot_falls_back_to_slot_union() {
        let registry = registry();
        let context = context_for("{% render_slot he %}", "t he");
        assert_eq!(context.position, CursorPosition::SlotName);
        assert_eq!(context.tag_kind, Some(TagKind::RenderSlot));
        let items = completion_items(&context, &registry);
        assert!(
            items.iter().any(|item| item.label == "header"),
            "slots from any component should be offered"
        );
    }

    #[test]
    fn outside_context_yields_no_items() {
        let registry = registry();
        let context = cursor_context("no tags here at all", 5);
        assert!(completion_items(&context, &registry).is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn superseded_token_cancels_build() {
        let registry = registry();
        let context = context_for("{% component 'Ca %}", "'Ca");
        let state = DocumentTaskState::default();
        let token = state.token(DocumentTaskKind::Completion);
        // A newer token supersedes the one the build is holding.
        let _newer = state.token(DocumentTaskKind::Completion);

        match build_completion_items_async(&context, &registry, token).await {
            CompletionBuildOutcome::Cancelled => {}
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}
