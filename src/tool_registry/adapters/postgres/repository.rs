//! `PostgreSQL` repository implementation for the server registry.

use super::{
    models::{McpServerRow, McpToolRow, NewMcpServerRow},
    schema::{mcp_servers, mcp_tools},
};
use crate::tool_registry::{
    domain::{
        BearerToken, McpEndpoint, McpServer, McpServerId, McpServerName, McpToolDefinition,
        McpToolId, McpToolRecord, PersistedMcpServerData,
    },
    ports::{McpServerRegistryError, McpServerRegistryRepository, McpServerRegistryResult},
};
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for registry adapters.
pub type McpServerPgPool = Pool<ConnectionManager<PgConnection>>;

const SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_mcp_gateway_tables/up.sql");

/// `PostgreSQL`-backed repository for servers and tool rows.
#[derive(Debug, Clone)]
pub struct PostgresMcpServerRegistry {
    pool: McpServerPgPool,
}

impl From<DieselError> for McpServerRegistryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresMcpServerRegistry {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: McpServerPgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool of at most `pool_size` connections to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::Persistence`] when the pool cannot
    /// establish its initial connections.
    pub fn connect(database_url: &str, pool_size: u32) -> McpServerRegistryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(McpServerRegistryError::persistence)?;
        Ok(Self::new(pool))
    }

    /// Creates the registry tables when they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerRegistryError::Persistence`] when the DDL fails.
    pub async fn ensure_schema(&self) -> McpServerRegistryResult<()> {
        self.run_blocking(|connection| {
            connection.batch_execute(SCHEMA_SQL)?;
            Ok(())
        })
        .await
    }

    async fn run_blocking<F, T>(&self, operation: F) -> McpServerRegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> McpServerRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(McpServerRegistryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(McpServerRegistryError::persistence)?
    }
}

#[async_trait]
impl McpServerRegistryRepository for PostgresMcpServerRegistry {
    async fn register(&self, server: &McpServer) -> McpServerRegistryResult<()> {
        let server_id = server.id();
        let server_name = server.name().clone();
        let new_row = to_new_row(server);

        self.run_blocking(move |connection| {
            diesel::insert_into(mcp_servers::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if has_constraint(info.as_ref(), "idx_mcp_servers_name") =>
                    {
                        McpServerRegistryError::DuplicateServerName(server_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        McpServerRegistryError::DuplicateServer(server_id)
                    }
                    _ => McpServerRegistryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, server_name: &McpServerName) -> McpServerRegistryResult<()> {
        let name = server_name.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, McpServerRegistryError, _>(|tx| {
                let server_id = mcp_servers::table
                    .filter(mcp_servers::name.eq(name.as_str()))
                    .select(mcp_servers::id)
                    .first::<uuid::Uuid>(tx)
                    .optional()?
                    .ok_or_else(|| McpServerRegistryError::ServerNotFound(name.clone()))?;

                diesel::delete(mcp_tools::table.filter(mcp_tools::server_id.eq(server_id)))
                    .execute(tx)?;
                diesel::delete(mcp_servers::table.filter(mcp_servers::id.eq(server_id)))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpServerRegistryResult<Option<McpServer>> {
        let name = server_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = mcp_servers::table
                .filter(mcp_servers::name.eq(&name))
                .select(McpServerRow::as_select())
                .first::<McpServerRow>(connection)
                .optional()?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn list_all(&self) -> McpServerRegistryResult<Vec<McpServer>> {
        self.run_blocking(move |connection| {
            let rows = mcp_servers::table
                .order(mcp_servers::name.asc())
                .select(McpServerRow::as_select())
                .load::<McpServerRow>(connection)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }

    async fn add_tool(&self, tool: &McpToolRecord) -> McpServerRegistryResult<()> {
        let server_id = tool.server_id();
        let tool_name = tool.name().to_owned();
        let row = to_tool_row(tool);

        self.run_blocking(move |connection| {
            diesel::insert_into(mcp_tools::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if has_constraint(info.as_ref(), "idx_mcp_tools_server_name") =>
                    {
                        McpServerRegistryError::DuplicateTool {
                            server_id,
                            tool_name: tool_name.clone(),
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        McpServerRegistryError::UnknownServer(server_id)
                    }
                    _ => McpServerRegistryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn remove_tool(
        &self,
        server_id: McpServerId,
        tool_name: &str,
    ) -> McpServerRegistryResult<()> {
        let name = tool_name.to_owned();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                mcp_tools::table
                    .filter(mcp_tools::server_id.eq(server_id.into_inner()))
                    .filter(mcp_tools::name.eq(&name)),
            )
            .execute(connection)?;

            if deleted == 0 {
                return Err(McpServerRegistryError::ToolNotFound {
                    server_id,
                    tool_name: name,
                });
            }
            Ok(())
        })
        .await
    }

    async fn list_tools(
        &self,
        server_id: McpServerId,
    ) -> McpServerRegistryResult<Vec<McpToolRecord>> {
        self.run_blocking(move |connection| {
            let rows = mcp_tools::table
                .filter(mcp_tools::server_id.eq(server_id.into_inner()))
                .order(mcp_tools::name.asc())
                .select(McpToolRow::as_select())
                .load::<McpToolRow>(connection)?;
            rows.into_iter().map(row_to_tool).collect()
        })
        .await
    }
}

fn to_new_row(server: &McpServer) -> NewMcpServerRow {
    NewMcpServerRow {
        id: server.id().into_inner(),
        name: server.name().as_str().to_owned(),
        endpoint: server.endpoint().as_str().to_owned(),
        bearer_token: server.bearer_token().map(|token| token.expose().to_owned()),
        description: server.description().to_owned(),
        created_at: server.created_at(),
    }
}

fn to_tool_row(tool: &McpToolRecord) -> McpToolRow {
    let definition = tool.definition();
    McpToolRow {
        id: tool.id().into_inner(),
        server_id: tool.server_id().into_inner(),
        name: definition.name().to_owned(),
        description: definition.description().to_owned(),
        input_schema: definition.input_schema().clone(),
        output_schema: definition.output_schema().cloned(),
        created_at: tool.created_at(),
    }
}

fn row_to_server(row: McpServerRow) -> McpServerRegistryResult<McpServer> {
    let McpServerRow {
        id,
        name,
        endpoint,
        bearer_token,
        description,
        created_at,
    } = row;

    let parsed_name =
        McpServerName::new(name).map_err(McpServerRegistryError::invalid_persisted_data)?;
    let parsed_endpoint =
        McpEndpoint::parse(endpoint).map_err(McpServerRegistryError::invalid_persisted_data)?;
    let parsed_token = bearer_token
        .map(BearerToken::new)
        .transpose()
        .map_err(McpServerRegistryError::invalid_persisted_data)?;

    Ok(McpServer::from_persisted(PersistedMcpServerData {
        id: McpServerId::from_uuid(id),
        name: parsed_name,
        endpoint: parsed_endpoint,
        bearer_token: parsed_token,
        description,
        created_at,
    }))
}

fn row_to_tool(row: McpToolRow) -> McpServerRegistryResult<McpToolRecord> {
    let McpToolRow {
        id,
        server_id,
        name,
        description,
        input_schema,
        output_schema,
        created_at,
    } = row;

    let base = McpToolDefinition::new(name, description, input_schema)
        .map_err(McpServerRegistryError::invalid_persisted_data)?;
    let definition = match output_schema {
        Some(schema) => base.with_output_schema(schema),
        None => base,
    };

    Ok(McpToolRecord::from_persisted(
        McpToolId::from_uuid(id),
        McpServerId::from_uuid(server_id),
        definition,
        created_at,
    ))
}

fn has_constraint(info: &dyn diesel::result::DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}
