use tower_lsp_server::{LspService, Server};
use wireview_language_server::WireviewLanguageServer;

#[tokio::main]
async fn main() {
    env_logger::init();
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(WireviewLanguageServer::new).finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}
