use crate::collection::{Collection, IndexBuilder, OperationIndex, ToolDescriptor};
use crate::errors::ToolError;
use crate::http::{HttpExecutor, HttpTransport, ReqwestTransport};
use crate::managers::curated::{CuratedHandler, CURATED_TOOLS};
use crate::managers::operation::OperationHandler;
use crate::mcp::catalog::ToolCatalog;
use crate::services::config::Config;
use crate::services::docs::ToolEntry;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub config: Config,
    pub logger: Logger,
    pub index: OperationIndex,
    pub http: Arc<HttpExecutor>,
    pub tool_executor: Arc<ToolExecutor>,
    pub catalog: Arc<ToolCatalog>,
    pub entries: Vec<ToolEntry>,
}

impl App {
    /// Loads the collection from disk and wires the real HTTP transport.
    /// A missing or malformed document is a precondition failure.
    pub fn initialize(config: Config, logger: Logger) -> Result<Self, ToolError> {
        let collection = Collection::load(&config.schema_path)?;
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        Ok(Self::from_collection(config, logger, &collection, transport))
    }

    pub fn from_collection(
        config: Config,
        logger: Logger,
        collection: &Collection,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let index = IndexBuilder::new(logger.clone()).build(collection, &config.filter);

        if !config.credentials.is_complete() {
            logger.warn_once(&format!(
                "Missing {}; tool calls will fail until Datadog credentials are set.",
                config.credentials.missing().join(" and ")
            ));
        }

        let http = Arc::new(
            HttpExecutor::new(transport, config.credentials.clone(), logger.clone())
                .with_site(&config.site, &config.subdomain)
                .with_defaults(config.request_policy()),
        );

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        let mut descriptors: Vec<ToolDescriptor> = index.tools().to_vec();
        let mut entries: Vec<ToolEntry> = index
            .operations()
            .iter()
            .map(ToolEntry::from_operation)
            .collect();
        for op in index.operations() {
            handlers.insert(
                op.name.clone(),
                Arc::new(OperationHandler::new(op.clone(), http.clone())),
            );
        }
        for tool in CURATED_TOOLS {
            if handlers.contains_key(tool.name) {
                logger.warn(
                    "Curated tool shadows a generated tool; keeping the generated one",
                    Some(&serde_json::json!({ "tool": tool.name })),
                );
                continue;
            }
            handlers.insert(
                tool.name.to_string(),
                Arc::new(CuratedHandler::new(tool, http.clone())),
            );
            descriptors.push(tool.descriptor());
            entries.push(ToolEntry::from_curated(tool));
        }

        logger.info_once(&format!("Registered {} tools.", handlers.len()));

        let catalog = Arc::new(ToolCatalog::new(descriptors, &logger));
        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Self {
            config,
            logger,
            index,
            http,
            tool_executor,
            catalog,
            entries,
        }
    }
}
