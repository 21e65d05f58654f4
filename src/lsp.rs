use crate::{
    lsp::{
        config::ServerConfig,
        navigation::{location_for, lookup_definition},
        position::{position_to_byte, position_to_offset},
        tasks::{DocumentTaskKind, DocumentTaskState, DocumentTaskToken},
    },
    metadata::ComponentRegistry,
    template::cursor_context,
};
use dashmap::DashMap;
use log::{debug, warn};
use rapidhash::fast::RandomState;
use ropey::Rope;
use std::sync::{Arc, RwLock};
use tower_lsp_server::{Client, LanguageServer, jsonrpc::Result, ls_types::*};

pub mod completion;
pub mod config;
pub mod event_docs;
pub mod hover;
pub mod markdown;
pub mod navigation;
pub mod position;
pub mod tasks;

use completion::completion;
use hover::hover;

#[derive(Debug)]
pub struct WireviewLanguageServer {
    pub client: Client,
    pub document_map: DashMap<String, Rope, RandomState>,
    task_map: DashMap<String, Arc<DocumentTaskState>, RandomState>,
    config: RwLock<ServerConfig>,
    registry: RwLock<Arc<ComponentRegistry>>,
}

impl WireviewLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document_map: DashMap::with_hasher(RandomState::new()),
            task_map: DashMap::with_hasher(RandomState::new()),
            config: RwLock::new(ServerConfig::default()),
            registry: RwLock::new(Arc::new(ComponentRegistry::default())),
        }
    }

    /// A cheap snapshot of the current metadata registry.
    pub fn registry(&self) -> Arc<ComponentRegistry> {
        self.registry
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_default()
    }

    pub fn set_registry(&self, registry: ComponentRegistry) {
        if let Ok(mut guard) = self.registry.write() {
            *guard = Arc::new(registry);
        }
    }

    pub fn completion_enabled(&self) -> bool {
        self.config
            .read()
            .map(|config| config.completion_enabled())
            .unwrap_or(true)
    }

    pub fn hover_enabled(&self) -> bool {
        self.config
            .read()
            .map(|config| config.hover_enabled())
            .unwrap_or(true)
    }

    pub fn task_token(&self, uri_key: &str, kind: DocumentTaskKind) -> DocumentTaskToken {
        let state = self
            .task_map
            .entry(uri_key.to_string())
            .or_insert_with(|| Arc::new(DocumentTaskState::default()));
        state.token(kind)
    }

    fn apply_settings(&self, settings: &serde_json::Value) {
        if let Ok(mut config) = self.config.write() {
            config.apply_settings(settings);
        }
        self.reload_registry();
    }

    /// Load the metadata document named by the configuration. A missing or
    /// malformed document degrades to an empty registry; completion simply
    /// has nothing to offer until the extractor runs again.
    fn reload_registry(&self) {
        let path = self
            .config
            .read()
            .ok()
            .and_then(|config| config.metadata_path().map(|path| path.to_path_buf()));
        let Some(path) = path else {
            return;
        };
        match ComponentRegistry::load_file(&path) {
            Ok(registry) => {
                debug!(
                    "loaded metadata for {} components from {}",
                    registry.len(),
                    path.display()
                );
                self.set_registry(registry);
            }
            Err(err) => {
                warn!("could not load metadata from {}: {err}", path.display());
                self.set_registry(ComponentRegistry::default());
            }
        }
    }

    async fn on_change(&self, params: &TextDocumentItem<'_>) {
        let uri_key = params.uri.to_string();
        let rope = Rope::from_str(params.text);
        self.document_map.insert(uri_key.clone(), rope);

        // The document moved out from under any in-flight queries.
        if let Some(state) = self.task_map.get(&uri_key) {
            state.cancel_all();
        }
    }
}

struct TextDocumentItem<'a> {
    uri: Uri,
    text: &'a str,
}

impl LanguageServer for WireviewLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            self.apply_settings(&options);
        }

        Ok(InitializeResult {
            server_info: None,
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        "'".to_string(),
                        "\"".to_string(),
                        ".".to_string(),
                        "=".to_string(),
                    ]),
                    ..Default::default()
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            #[cfg(feature = "proposed")]
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "wireview language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("file opened");
        self.on_change(&TextDocumentItem {
            uri: params.text_document.uri,
            text: &params.text_document.text,
        })
        .await
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let DidChangeTextDocumentParams {
            text_document,
            content_changes,
        } = params;

        let uri = text_document.uri;
        let uri_key = uri.to_string();
        let mut rope = self
            .document_map
            .get(&uri_key)
            .map(|doc| doc.value().clone())
            .unwrap_or_default();

        for change in content_changes {
            let Some(range) = change.range else {
                rope = Rope::from_str(&change.text);
                continue;
            };

            let mut start_offset =
                position_to_offset(range.start, &rope).unwrap_or_else(|| rope.len_chars());
            let mut end_offset = position_to_offset(range.end, &rope).unwrap_or(start_offset);

            let doc_len = rope.len_chars();
            start_offset = start_offset.min(doc_len);
            end_offset = end_offset.min(doc_len);

            if end_offset < start_offset {
                continue;
            }

            rope.remove(start_offset..end_offset);
            rope.insert(start_offset, &change.text);
        }

        let text = rope.to_string();

        self.on_change(&TextDocumentItem { uri, text: &text }).await
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(text) = params.text {
            let item = TextDocumentItem {
                uri: params.text_document.uri,
                text: &text,
            };
            self.on_change(&item).await;
        }
        debug!("file saved");
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri_key = params.text_document.uri.to_string();
        self.document_map.remove(&uri_key);
        self.task_map.remove(&uri_key);
        debug!("file closed");
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(&params.settings);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        completion(self, params).await
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        hover(self, params)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let response = (|| {
            let uri = params.text_document_position_params.text_document.uri;
            let uri_key = uri.to_string();
            let rope = self.document_map.get(&uri_key)?;
            let position = params.text_document_position_params.position;
            let offset = position_to_byte(position, &rope)?;
            let registry = self.registry();

            let text = rope.to_string();
            let context = cursor_context(&text, offset);
            let source = lookup_definition(&context, &registry)?;
            location_for(&source).map(GotoDefinitionResponse::Scalar)
        })();

        Ok(response)
    }
}
